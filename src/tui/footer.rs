use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::AppState;

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let narrow = area.width < crate::app::NARROW_WIDTH_THRESHOLD;

    let hints: &[(&str, &str)] = if state.is_editing() {
        &[("Enter", "apply"), ("Esc", "cancel")]
    } else if narrow {
        &[
            ("j/k", "nav"),
            ("n/p", "page"),
            ("1-4", "tab"),
            ("/", "filter"),
            ("q", "quit"),
        ]
    } else {
        &[
            ("↑↓/jk", "navigate"),
            ("n/p", "page"),
            ("Tab/1-4", "tab"),
            ("/", "filter"),
            ("⌫", "drop"),
            ("c", "clear"),
            ("t/J", "tag/job"),
            ("r", "refresh"),
            ("q", "quit"),
        ]
    };

    let mut spans: Vec<Span> = Vec::new();
    for (i, (key, desc)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
        spans.push(Span::styled(
            format!(" {desc}"),
            Style::default().fg(Color::DarkGray),
        ));
    }

    if state.runs.shows_pagination() {
        spans.push(Span::raw("  │ "));
        spans.push(Span::styled(
            pagination_label(
                state.runs.paginator().page_number(),
                state.runs.has_previous(),
                state.runs.has_next(),
            ),
            Style::default().fg(Color::White),
        ));
    }

    let footer = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(footer, area);
}

fn pagination_label(page: usize, has_previous: bool, has_next: bool) -> String {
    let prev = if has_previous { "‹" } else { " " };
    let next = if has_next { "›" } else { " " };
    format!("{prev} page {page} {next}")
}

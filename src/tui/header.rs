use crate::app::AppState;
use crate::filter::RunsTab;
use crate::tui::spinner;
use chrono::Local;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let narrow = area.width < crate::app::NARROW_WIDTH_THRESHOLD;
    let mut spans = vec![Span::styled(
        format!(" {} ", state.config.version_string),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    if !narrow {
        spans.push(Span::raw("│ "));
        spans.push(Span::styled(
            &state.config.endpoint,
            Style::default().fg(Color::White),
        ));
    }
    spans.push(Span::raw(" │"));

    let current = state.current_tab();
    for (i, tab) in RunsTab::TABS.iter().enumerate() {
        let label = format!(" {}:{} ", i + 1, tab.title());
        let style = if *tab == current {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(label, style));
    }

    let status = state.runs.view_status();
    if status.is_refreshing {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!("{}", spinner::frame(state.spinner_frame)),
            Style::default().fg(Color::Yellow),
        ));
    } else if state.next_refresh_in > 0 {
        spans.push(Span::styled(
            format!(" {}s", state.next_refresh_in),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let last_refreshed = state.runs.refresh_state().last_refreshed_at;
    if let Some(at) = last_refreshed.filter(|_| !narrow) {
        spans.push(Span::styled(
            format!(" updated {}", at.with_timezone(&Local).format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    if status.error.is_some() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            "!",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    f.render_widget(header, area);
}

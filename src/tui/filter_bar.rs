use crate::app::AppState;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

/// Locked status tags first (dimmed), then the editable tokens, then the editor.
pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let mut spans = vec![Span::styled(" Filter ", Style::default().fg(Color::DarkGray))];

    for token in state.runs.locked_tokens() {
        spans.push(Span::styled(
            format!("[{token}]"),
            Style::default().fg(Color::DarkGray),
        ));
        spans.push(Span::raw(" "));
    }
    for token in state.runs.editable_tokens() {
        spans.push(Span::styled(
            format!("[{token}]"),
            Style::default().fg(Color::Cyan),
        ));
        spans.push(Span::raw(" "));
    }

    if let Some(buf) = state.input_buffer() {
        spans.push(Span::styled(
            format!("/{buf}"),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
    } else if state.runs.tokens().is_empty() {
        spans.push(Span::styled(
            "none (press / to add kind:value)",
            Style::default().fg(Color::DarkGray),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

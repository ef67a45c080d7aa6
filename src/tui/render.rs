use crate::app::AppState;
use crate::tui::{filter_bar, footer, header, table};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

pub fn render(f: &mut Frame, state: &AppState) {
    let banner_height = if state.show_daemon_warning() { 1 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),             // header
            Constraint::Length(banner_height), // daemon banner
            Constraint::Length(1),             // filter bar
            Constraint::Min(1),                // table
            Constraint::Length(2),             // footer
        ])
        .split(f.area());

    header::render(f, chunks[0], state);
    if banner_height > 0 {
        render_daemon_banner(f, chunks[1]);
    }
    filter_bar::render(f, chunks[2], state);
    table::render(f, chunks[3], state);
    footer::render(f, chunks[4], state);

    if let Some(msg) = state.notice_message() {
        render_notice(f, msg);
    }
}

fn render_daemon_banner(f: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            " ⚠ The queued run coordinator is not healthy.",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            " Queued runs will not be launched; check daemon health.",
            Style::default().fg(Color::Yellow),
        ),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_notice(f: &mut Frame, msg: &str) {
    let area = f.area();
    if area.height <= 6 || area.width < 4 {
        return;
    }
    let notice_area = Rect {
        x: area.x + 1,
        y: area.y + area.height.saturating_sub(5),
        width: area.width.saturating_sub(2),
        height: 3,
    };
    let widget = Paragraph::new(msg.to_owned())
        .style(Style::default().fg(Color::Yellow))
        .block(
            Block::default()
                .title(" Notice ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(ratatui::widgets::Clear, notice_area);
    f.render_widget(widget, notice_area);
}

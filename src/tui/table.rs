use crate::app::{truncate, AppState, RunRecord, RunStatus};
use crate::classify::RunsError;
use crate::tui::spinner;
use chrono::Local;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

const ID_WIDTH: usize = 8;
const STATUS_WIDTH: usize = 11;
const STARTED_WIDTH: usize = 14;
const DURATION_WIDTH: usize = 8;

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let status = state.runs.view_status();

    // Errors replace the table; the filter bar above stays usable.
    if let Some(err) = status.error {
        render_error(f, area, err);
        return;
    }

    let runs = state.visible_runs();
    if runs.is_empty() {
        let msg = if status.has_data {
            "No runs".to_string()
        } else {
            format!("{} Loading runs…", spinner::frame(state.spinner_frame))
        };
        let para = Paragraph::new(msg).style(Style::default().fg(Color::DarkGray));
        f.render_widget(para, area);
        return;
    }

    let narrow = area.width < crate::app::NARROW_WIDTH_THRESHOLD;
    let inner_width = area.width as usize;
    let visible_height = area.height.saturating_sub(1) as usize;
    let scroll_offset = if state.selected >= visible_height {
        state.selected - visible_height + 1
    } else {
        0
    };

    let mut lines = vec![header_line(narrow, inner_width)];
    for (i, run) in runs
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_height)
    {
        lines.push(render_run_line(run, i == state.selected, narrow, inner_width));
    }

    f.render_widget(Paragraph::new(lines), area);
}

fn render_error(f: &mut Frame, area: Rect, err: &RunsError) {
    let mut lines = vec![
        Line::from(Span::styled(
            err.title(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::from(Span::raw(err.description().to_string())),
    ];
    if let RunsError::Unexpected { detail } = err {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            detail.clone(),
            Style::default().fg(Color::DarkGray),
        )));
    }
    let para = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(para, area);
}

pub(crate) fn status_icon(status: RunStatus) -> (&'static str, Color) {
    match status {
        RunStatus::Success => ("✓", Color::Green),
        RunStatus::Failure => ("✗", Color::Red),
        RunStatus::Canceled | RunStatus::Canceling => ("⊘", Color::Yellow),
        RunStatus::Started | RunStatus::Starting => ("⟳", Color::Yellow),
        RunStatus::Queued | RunStatus::NotStarted | RunStatus::Managed => {
            ("·", Color::Blue)
        }
        RunStatus::Unknown => ("?", Color::DarkGray),
    }
}

/// Width left for the job name once fixed columns (and tags, when wide) are placed.
fn job_width(narrow: bool, max_width: usize) -> usize {
    let fixed = 2 + ID_WIDTH + 1 + STATUS_WIDTH + 1 + STARTED_WIDTH + 1 + DURATION_WIDTH + 1;
    let available = max_width.saturating_sub(fixed);
    if narrow {
        available
    } else {
        available / 2
    }
}

fn header_line(narrow: bool, max_width: usize) -> Line<'static> {
    let job = job_width(narrow, max_width);
    let mut text = format!(
        "  {:<ID_WIDTH$} {:<STATUS_WIDTH$} {:<job$} {:<STARTED_WIDTH$} {:<DURATION_WIDTH$}",
        "RUN", "STATUS", "JOB", "STARTED", "DURATION"
    );
    if !narrow {
        text.push_str(" TAGS");
    }
    Line::from(Span::styled(
        text,
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    ))
}

fn pad(s: &str, width: usize) -> String {
    let s = truncate(s, width);
    let fill = width.saturating_sub(UnicodeWidthStr::width(s.as_str()));
    format!("{s}{}", " ".repeat(fill))
}

fn render_run_line(
    run: &RunRecord,
    is_selected: bool,
    narrow: bool,
    max_width: usize,
) -> Line<'static> {
    let (icon, icon_color) = status_icon(run.status);
    let job = job_width(narrow, max_width);
    let started = run
        .started_at()
        .map(|t| t.with_timezone(&Local).format("%b %d %H:%M").to_string())
        .unwrap_or_default();
    let duration = run.duration();

    let select_style = if is_selected {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };

    let mut spans = vec![
        Span::styled(format!("{icon} "), Style::default().fg(icon_color)),
        Span::styled(
            format!("{} ", pad(run.short_id(), ID_WIDTH)),
            select_style.fg(Color::Cyan),
        ),
        Span::styled(
            format!("{} ", pad(run.status.as_str(), STATUS_WIDTH)),
            Style::default().fg(icon_color),
        ),
        Span::styled(format!("{} ", pad(&run.pipeline_name, job)), select_style),
        Span::styled(
            format!("{} ", pad(&started, STARTED_WIDTH)),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            pad(&duration, DURATION_WIDTH),
            Style::default().fg(Color::DarkGray),
        ),
    ];

    if !narrow {
        let tags = run
            .user_tags()
            .map(|t| format!("{}={}", t.key, t.value))
            .collect::<Vec<_>>()
            .join(" ");
        let tag_width = max_width.saturating_sub(
            2 + ID_WIDTH + 1 + STATUS_WIDTH + 1 + job + 1 + STARTED_WIDTH + 1 + DURATION_WIDTH + 1,
        );
        spans.push(Span::styled(
            format!(" {}", truncate(&tags, tag_width)),
            Style::default().fg(Color::Blue),
        ));
    }

    Line::from(spans)
}

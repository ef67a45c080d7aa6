//! Run data model and UI state around the [`RunsController`].

use crate::classify::TransportError;
use crate::controller::{FetchTrigger, QueryRequest, RequestId, RunsController};
use crate::filter::{FilterToken, FilterTokenKind, RunsTab};
use crate::query::{DaemonStatus, RunsResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;

// ── Shared utility functions ──

/// Format a duration in seconds into a human-readable string (e.g. "2m 5s").
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Unicode-width-aware truncation with ellipsis.
/// Returns `""` when `max_width` is 0.
pub fn truncate(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthStr;
    if max_width == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for c in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if width + cw + 1 > max_width {
            result.push('\u{2026}');
            break;
        }
        result.push(c);
        width += cw;
    }
    result
}

fn timestamp(secs: Option<f64>) -> Option<DateTime<Utc>> {
    let secs = secs?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    let whole = secs.trunc() as i64;
    let nanos = (secs.fract() * 1e9) as u32;
    DateTime::<Utc>::from_timestamp(whole, nanos)
}

pub const SPINNER_FRAME_COUNT: usize = 10;
/// Below 80 cols the tag column is dropped.
pub const NARROW_WIDTH_THRESHOLD: u16 = 80;
/// Seconds a notice stays on screen.
pub const NOTICE_TTL_SECS: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Queued,
    NotStarted,
    Managed,
    Starting,
    Started,
    Success,
    Failure,
    Canceling,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::NotStarted => "NOT_STARTED",
            Self::Managed => "MANAGED",
            Self::Starting => "STARTING",
            Self::Started => "STARTED",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Canceling => "CANCELING",
            Self::Canceled => "CANCELED",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn is_finished(self) -> bool {
        matches!(self, Self::Success | Self::Failure | Self::Canceled)
    }
}

impl FromStr for RunStatus {
    type Err = ();

    /// Only statuses the server knows; `UNKNOWN` is not a valid filter value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUEUED" => Ok(Self::Queued),
            "NOT_STARTED" => Ok(Self::NotStarted),
            "MANAGED" => Ok(Self::Managed),
            "STARTING" => Ok(Self::Starting),
            "STARTED" => Ok(Self::Started),
            "SUCCESS" => Ok(Self::Success),
            "FAILURE" => Ok(Self::Failure),
            "CANCELING" => Ok(Self::Canceling),
            "CANCELED" => Ok(Self::Canceled),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunTag {
    pub key: String,
    pub value: String,
}

impl RunTag {
    pub fn to_filter_token(&self) -> FilterToken {
        FilterToken::new(FilterTokenKind::Tag, format!("{}={}", self.key, self.value))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    /// Row key, and the cursor value when this is the last row of a page.
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub pipeline_name: String,
    #[serde(default)]
    pub pipeline_snapshot_id: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub tags: Vec<RunTag>,
    /// Epoch seconds.
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub end_time: Option<f64>,
    #[serde(default)]
    pub update_time: Option<f64>,
}

impl RunRecord {
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(self.id.as_str())
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.start_time)
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.end_time)
    }

    /// Elapsed time; still running when there is no end time.
    pub fn duration(&self) -> String {
        match (self.started_at(), self.ended_at()) {
            (Some(start), Some(end)) => {
                format_duration(end.signed_duration_since(start).num_seconds())
            }
            (Some(start), None) => {
                format_duration(Utc::now().signed_duration_since(start).num_seconds())
            }
            _ => String::new(),
        }
    }

    /// Tags other than the system `dagster/` ones.
    pub fn user_tags(&self) -> impl Iterator<Item = &RunTag> {
        self.tags.iter().filter(|t| !t.key.starts_with("dagster/"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing a `kind:value` token.
    Editing(String),
}

/// Immutable configuration set at startup.
pub struct AppConfig {
    pub endpoint: String,
    pub page_size: usize,
    pub refresh_interval: u64,
    pub version_string: String,
}

pub struct AppState {
    pub config: AppConfig,
    pub runs: RunsController,

    // Table navigation
    pub selected: usize,
    pub input: InputMode,

    // Queued-tab banner
    pub daemon_status: Option<DaemonStatus>,
    daemon_fetch_pending: bool,

    // Refresh countdown shown in the header
    pub last_refresh_started: Option<Instant>,
    pub next_refresh_in: u64,

    // Transient UI
    pub notice: Option<(String, Instant)>,
    pub spinner_frame: usize,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(config: AppConfig, tokens: Vec<FilterToken>) -> Self {
        let runs = RunsController::new(tokens, config.page_size);
        Self {
            config,
            runs,
            selected: 0,
            input: InputMode::Normal,
            daemon_status: None,
            daemon_fetch_pending: false,
            last_refresh_started: None,
            next_refresh_in: 0,
            notice: None,
            spinner_frame: 0,
            should_quit: false,
        }
    }

    pub fn current_tab(&self) -> RunsTab {
        self.runs.current_tab()
    }

    pub fn visible_runs(&self) -> &[RunRecord] {
        self.runs
            .page()
            .map(|p| p.items.as_slice())
            .unwrap_or_default()
    }

    pub fn selected_run(&self) -> Option<&RunRecord> {
        self.visible_runs().get(self.selected)
    }

    pub fn move_selection_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        let len = self.visible_runs().len();
        if len > 0 && self.selected < len - 1 {
            self.selected += 1;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_runs().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    /// Feeds a query result to the controller and keeps the selection in range.
    pub fn apply_runs_result(
        &mut self,
        request_id: RequestId,
        result: Result<RunsResponse, TransportError>,
    ) -> Option<QueryRequest> {
        let follow_up = self.runs.on_response(request_id, result);
        self.clamp_selection();
        follow_up
    }

    /// New pages and new filters start with the first row selected.
    pub fn note_request_sent(&mut self, request: &QueryRequest) {
        if matches!(
            request.trigger,
            FetchTrigger::Navigation | FetchTrigger::FilterChange
        ) {
            self.selected = 0;
        }
    }

    /// Restarts the header countdown; called on each scheduler tick or reset.
    pub fn note_refresh_cycle(&mut self) {
        self.last_refresh_started = Some(Instant::now());
    }

    pub fn update_countdown(&mut self) {
        let elapsed = self
            .last_refresh_started
            .map_or(0, |t| t.elapsed().as_secs());
        self.next_refresh_in = self.config.refresh_interval.saturating_sub(elapsed);
    }

    // ── Filter editing ──

    pub fn is_editing(&self) -> bool {
        matches!(self.input, InputMode::Editing(_))
    }

    pub fn input_buffer(&self) -> Option<&str> {
        match &self.input {
            InputMode::Editing(buf) => Some(buf),
            InputMode::Normal => None,
        }
    }

    pub fn begin_filter_edit(&mut self) {
        self.input = InputMode::Editing(String::new());
    }

    pub fn cancel_filter_edit(&mut self) {
        self.input = InputMode::Normal;
    }

    pub fn input_push(&mut self, c: char) {
        if let InputMode::Editing(buf) = &mut self.input {
            buf.push(c);
        }
    }

    pub fn input_pop(&mut self) {
        if let InputMode::Editing(buf) = &mut self.input {
            buf.pop();
        }
    }

    /// Parses the edit buffer into a token and adds it. Kinds locked by the
    /// current tab are refused with a message; the editor stays open on errors.
    pub fn submit_filter_edit(&mut self) -> Result<Option<QueryRequest>, String> {
        let InputMode::Editing(buf) = &self.input else {
            return Ok(None);
        };
        if buf.trim().is_empty() {
            self.input = InputMode::Normal;
            return Ok(None);
        }
        let token: FilterToken = buf.parse().map_err(|e| format!("{e}"))?;
        if !self.runs.enabled_filter_kinds().contains(&token.kind) {
            return Err(format!(
                "{} filters are fixed by the {} tab",
                token.kind,
                self.current_tab().title()
            ));
        }
        self.input = InputMode::Normal;
        Ok(self.runs.add_token(token))
    }

    pub fn add_tag_filter_from_selection(&mut self) -> Option<QueryRequest> {
        let token = self.selected_run()?.user_tags().next()?.to_filter_token();
        self.runs.add_token(token)
    }

    pub fn add_job_filter_from_selection(&mut self) -> Option<QueryRequest> {
        let run = self.selected_run()?;
        if run.pipeline_name.is_empty() {
            return None;
        }
        let token = FilterToken::new(FilterTokenKind::Job, run.pipeline_name.clone());
        self.runs.add_token(token)
    }

    pub fn select_tab(&mut self, tab: RunsTab) -> Option<QueryRequest> {
        if tab != RunsTab::Queued {
            self.daemon_status = None;
        }
        self.runs.select_tab(tab)
    }

    /// Claims the single daemon status slot; `false` while a fetch is pending.
    pub fn begin_daemon_fetch(&mut self) -> bool {
        if self.daemon_fetch_pending {
            return false;
        }
        self.daemon_fetch_pending = true;
        true
    }

    /// Releases the slot. The status is kept only while the Queued tab is shown.
    pub fn apply_daemon_status(&mut self, result: Result<DaemonStatus, String>) {
        self.daemon_fetch_pending = false;
        match result {
            Ok(status) if self.current_tab() == RunsTab::Queued => {
                self.daemon_status = Some(status);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("daemon status query failed: {e}"),
        }
    }

    pub fn show_daemon_warning(&self) -> bool {
        self.current_tab() == RunsTab::Queued
            && self.daemon_status.is_some_and(DaemonStatus::needs_warning)
    }

    // ── Transient notices ──

    pub fn set_notice(&mut self, msg: String) {
        self.notice = Some((msg, Instant::now()));
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn prune_notice(&mut self) {
        if self
            .notice
            .as_ref()
            .is_some_and(|(_, at)| at.elapsed().as_secs() >= NOTICE_TTL_SECS)
        {
            self.notice = None;
        }
    }

    pub fn notice_message(&self) -> Option<&str> {
        self.notice.as_ref().map(|(m, _)| m.as_str())
    }

    pub fn advance_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAME_COUNT;
    }
}

#[cfg(test)]
pub(crate) fn test_run(id: &str) -> RunRecord {
    RunRecord {
        id: id.to_string(),
        status: RunStatus::Success,
        pipeline_name: "etl".to_string(),
        pipeline_snapshot_id: None,
        mode: Some("default".to_string()),
        tags: vec![],
        start_time: None,
        end_time: None,
        update_time: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::RunsResponse;

    fn config() -> AppConfig {
        AppConfig {
            endpoint: "http://localhost:3000".to_string(),
            page_size: 3,
            refresh_interval: 15,
            version_string: String::new(),
        }
    }

    fn loaded_state(tokens: Vec<FilterToken>, runs: Vec<RunRecord>) -> AppState {
        let mut state = AppState::new(config(), tokens);
        let req = state.runs.mount().unwrap();
        state.apply_runs_result(req.id, Ok(RunsResponse::Runs { results: runs }));
        state
    }

    fn tagged_run(id: &str) -> RunRecord {
        let mut run = test_run(id);
        run.tags = vec![
            RunTag {
                key: "dagster/schedule".to_string(),
                value: "nightly".to_string(),
            },
            RunTag {
                key: "team".to_string(),
                value: "data".to_string(),
            },
        ];
        run
    }

    #[test]
    fn format_duration_units() {
        assert_eq!(format_duration(5), "5s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(3720), "1h 2m");
        assert_eq!(format_duration(-3), "0s");
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate("pipeline", 20), "pipeline");
        assert_eq!(truncate("pipeline", 5), "pipe\u{2026}");
        assert_eq!(truncate("pipeline", 0), "");
    }

    #[test]
    fn run_record_deserializes_with_defaults() {
        let run: RunRecord = serde_json::from_str(
            r#"{"id": "abcdef0123", "status": "STARTED", "startTime": 1700000000.5}"#,
        )
        .unwrap();
        assert_eq!(run.status, RunStatus::Started);
        assert_eq!(run.short_id(), "abcdef01");
        assert!(run.tags.is_empty());
        assert_eq!(run.started_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn unknown_status_is_tolerated() {
        let run: RunRecord =
            serde_json::from_str(r#"{"id": "x", "status": "PAUSED"}"#).unwrap();
        assert_eq!(run.status, RunStatus::Unknown);
    }

    #[test]
    fn duration_of_finished_run() {
        let mut run = test_run("x");
        run.start_time = Some(100.0);
        run.end_time = Some(225.0);
        assert_eq!(run.duration(), "2m 5s");
    }

    #[test]
    fn selection_is_clamped_after_smaller_page() {
        let mut state = loaded_state(vec![], vec![test_run("a"), test_run("b"), test_run("c")]);
        state.move_selection_down();
        state.move_selection_down();
        state.move_selection_down();
        assert_eq!(state.selected, 2);

        let req = state.runs.refresh_tick().unwrap();
        state.apply_runs_result(
            req.id,
            Ok(RunsResponse::Runs {
                results: vec![test_run("a")],
            }),
        );
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn submit_adds_token_and_closes_editor() {
        let mut state = loaded_state(vec![], vec![test_run("a")]);
        state.begin_filter_edit();
        for c in "job:nightly".chars() {
            state.input_push(c);
        }
        let req = state.submit_filter_edit().unwrap().unwrap();
        assert_eq!(req.query.filter.pipeline_name.as_deref(), Some("nightly"));
        assert!(!state.is_editing());
    }

    #[test]
    fn submit_refuses_locked_status_kind() {
        let status = FilterToken::status(RunStatus::Queued);
        let mut state = loaded_state(vec![status], vec![test_run("a")]);
        state.begin_filter_edit();
        for c in "status:FAILURE".chars() {
            state.input_push(c);
        }
        let err = state.submit_filter_edit().unwrap_err();
        assert!(err.contains("Queued"));
        assert!(state.is_editing());
        assert_eq!(state.runs.tokens().len(), 1);
    }

    #[test]
    fn submit_reports_parse_errors() {
        let mut state = loaded_state(vec![], vec![]);
        state.begin_filter_edit();
        for c in "owner:me".chars() {
            state.input_push(c);
        }
        assert!(state.submit_filter_edit().unwrap_err().contains("owner"));
    }

    #[test]
    fn tag_from_selection_skips_system_tags() {
        let mut state = loaded_state(vec![], vec![tagged_run("a")]);
        let req = state.add_tag_filter_from_selection().unwrap();
        assert_eq!(req.query.filter.tags[0].key, "team");
        assert_eq!(
            state.runs.tokens(),
            &[FilterToken::new(FilterTokenKind::Tag, "team=data")]
        );
    }

    #[test]
    fn job_from_selection() {
        let mut state = loaded_state(vec![], vec![test_run("a")]);
        let req = state.add_job_filter_from_selection().unwrap();
        assert_eq!(req.query.filter.pipeline_name.as_deref(), Some("etl"));
    }

    #[test]
    fn daemon_warning_only_on_queued_tab() {
        let mut state = loaded_state(vec![], vec![]);
        state.daemon_status = Some(DaemonStatus {
            required: true,
            healthy: false,
        });
        assert!(!state.show_daemon_warning());
        state.select_tab(RunsTab::Queued);
        state.daemon_status = Some(DaemonStatus {
            required: true,
            healthy: false,
        });
        assert!(state.show_daemon_warning());
    }

    #[test]
    fn daemon_fetch_single_flight() {
        let mut state = loaded_state(vec![], vec![]);
        state.select_tab(RunsTab::Queued);
        assert!(state.begin_daemon_fetch());
        assert!(!state.begin_daemon_fetch());

        state.apply_daemon_status(Ok(DaemonStatus {
            required: true,
            healthy: false,
        }));
        assert!(state.show_daemon_warning());
        assert!(state.begin_daemon_fetch());

        state.apply_daemon_status(Err("timed out".to_string()));
        assert!(state.begin_daemon_fetch());
    }

    #[test]
    fn daemon_status_dropped_off_queued_tab() {
        let mut state = loaded_state(vec![], vec![]);
        assert!(state.begin_daemon_fetch());
        state.apply_daemon_status(Ok(DaemonStatus {
            required: true,
            healthy: false,
        }));
        assert_eq!(state.daemon_status, None);
    }

    #[test]
    fn notice_lifecycle() {
        let mut state = loaded_state(vec![], vec![]);
        state.set_notice("locked".to_string());
        assert_eq!(state.notice_message(), Some("locked"));
        state.prune_notice();
        assert_eq!(state.notice_message(), Some("locked"));
        state.clear_notice();
        assert_eq!(state.notice_message(), None);
    }

    #[test]
    fn spinner_wraps() {
        let mut state = loaded_state(vec![], vec![]);
        state.spinner_frame = SPINNER_FRAME_COUNT - 1;
        state.advance_spinner();
        assert_eq!(state.spinner_frame, 0);
    }
}

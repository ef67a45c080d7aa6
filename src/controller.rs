//! Query coordination for the run list: one (filter, cursor) tuple, one request
//! in flight at a time, and a mount lifecycle.
//!
//! Every operation that needs data returns the [`QueryRequest`] to send, or `None`.
//! The caller performs it and hands the result back through
//! [`RunsController::on_response`].
//!
//! Ordering rules:
//! - refresh ticks are skipped while any request is in flight;
//! - a filter, tab or page change while a request is in flight marks the in-flight
//!   response stale; when it arrives it is dropped and a single follow-up request
//!   for the current state is issued instead;
//! - after [`RunsController::unmount`] responses are ignored.

use crate::classify::{classify, RunsError, TransportError};
use crate::filter::{self, FilterToken, FilterTokenKind, RunsTab};
use crate::pagination::{CursorPaginator, Page};
use crate::query::{RunsFilter, RunsQuery, RunsResponse};
use crate::refresh::RefreshState;
use chrono::Utc;

pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTrigger {
    Initial,
    FilterChange,
    Navigation,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub id: RequestId,
    pub trigger: FetchTrigger,
    pub query: RunsQuery,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    id: RequestId,
    generation: u64,
}

/// What the view can show: data may be present while refreshing or errored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewStatus<'a> {
    pub has_data: bool,
    pub is_refreshing: bool,
    pub error: Option<&'a RunsError>,
}

pub struct RunsController {
    tokens: Vec<FilterToken>,
    paginator: CursorPaginator,
    refresh: RefreshState,
    page: Option<Page>,
    error: Option<RunsError>,
    /// Bumped by every user change that invalidates an in-flight response.
    generation: u64,
    next_id: RequestId,
    in_flight: Option<InFlight>,
    follow_up: Option<FetchTrigger>,
    mounted: bool,
}

impl RunsController {
    pub fn new(tokens: Vec<FilterToken>, page_size: usize) -> Self {
        Self {
            tokens: filter::dedup_tokens(tokens),
            paginator: CursorPaginator::new(page_size),
            refresh: RefreshState::default(),
            page: None,
            error: None,
            generation: 0,
            next_id: 1,
            in_flight: None,
            follow_up: None,
            mounted: false,
        }
    }

    pub fn mount(&mut self) -> Option<QueryRequest> {
        self.mounted = true;
        self.issue(FetchTrigger::Initial)
    }

    /// Drops any pending request; later responses are ignored.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.in_flight = None;
        self.follow_up = None;
        self.refresh.abandoned();
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    // ── Filter tokens ──

    pub fn tokens(&self) -> &[FilterToken] {
        &self.tokens
    }

    pub fn current_tab(&self) -> RunsTab {
        RunsTab::from_tokens(&self.tokens)
    }

    pub fn is_status_locked(&self) -> bool {
        self.current_tab().is_status_locked()
    }

    pub fn locked_tokens(&self) -> Vec<FilterToken> {
        if self.is_status_locked() {
            filter::partition(&self.tokens).0
        } else {
            Vec::new()
        }
    }

    pub fn editable_tokens(&self) -> Vec<FilterToken> {
        filter::effective_mutable_view(&self.tokens, self.is_status_locked())
    }

    pub fn enabled_filter_kinds(&self) -> Vec<FilterTokenKind> {
        filter::enabled_filter_kinds(self.is_status_locked())
    }

    pub fn query_filter(&self) -> RunsFilter {
        filter::derived_query_filter(&self.tokens)
    }

    /// Replaces the editable tokens; locked status tokens are kept.
    pub fn set_editable_tokens(&mut self, editable: &[FilterToken]) -> Option<QueryRequest> {
        let locked = self.is_status_locked();
        let (status, _) = filter::partition(&self.tokens);
        let merged = filter::apply_edit(editable, &status, locked);
        self.replace_tokens(merged)
    }

    /// Adds a token to the editable set unless an equal one is already there.
    pub fn add_token(&mut self, candidate: FilterToken) -> Option<QueryRequest> {
        let editable = self.editable_tokens();
        let updated = filter::add_token(&editable, candidate)?;
        self.set_editable_tokens(&updated)
    }

    pub fn remove_last_token(&mut self) -> Option<QueryRequest> {
        let mut editable = self.editable_tokens();
        editable.pop()?;
        self.set_editable_tokens(&editable)
    }

    pub fn clear_editable_tokens(&mut self) -> Option<QueryRequest> {
        self.set_editable_tokens(&[])
    }

    pub fn select_tab(&mut self, tab: RunsTab) -> Option<QueryRequest> {
        let tokens = filter::switch_tab(&self.tokens, tab);
        self.replace_tokens(tokens)
    }

    fn replace_tokens(&mut self, tokens: Vec<FilterToken>) -> Option<QueryRequest> {
        let tokens = filter::dedup_tokens(tokens);
        if tokens == self.tokens {
            return None;
        }
        self.tokens = tokens;
        // A new filter always starts from the first page.
        self.paginator.reset();
        self.generation += 1;
        self.issue(FetchTrigger::FilterChange)
    }

    // ── Pagination ──

    pub fn paginator(&self) -> &CursorPaginator {
        &self.paginator
    }

    pub fn has_next(&self) -> bool {
        self.paginator.has_next()
    }

    pub fn has_previous(&self) -> bool {
        self.paginator.has_previous()
    }

    pub fn next_page(&mut self) -> Option<QueryRequest> {
        if !self.paginator.go_to_next_page() {
            return None;
        }
        self.generation += 1;
        self.issue(FetchTrigger::Navigation)
    }

    pub fn previous_page(&mut self) -> Option<QueryRequest> {
        if !self.paginator.go_to_previous_page() {
            return None;
        }
        self.generation += 1;
        self.issue(FetchTrigger::Navigation)
    }

    // ── Refresh ──

    pub fn refresh_state(&self) -> &RefreshState {
        &self.refresh
    }

    pub fn is_request_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Re-issues the current query unless a request is already in flight.
    pub fn refresh_tick(&mut self) -> Option<QueryRequest> {
        if !self.mounted {
            return None;
        }
        if let Some(in_flight) = self.in_flight {
            tracing::debug!(request_id = in_flight.id, "refresh skipped: request in flight");
            return None;
        }
        self.issue(FetchTrigger::Refresh)
    }

    // ── Responses ──

    pub fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    pub fn error(&self) -> Option<&RunsError> {
        self.error.as_ref()
    }

    pub fn view_status(&self) -> ViewStatus<'_> {
        ViewStatus {
            has_data: self.page.is_some(),
            is_refreshing: self.in_flight.is_some(),
            error: self.error.as_ref(),
        }
    }

    /// Pagination controls are hidden while an error is shown or the page is empty.
    pub fn shows_pagination(&self) -> bool {
        self.error.is_none() && self.page.as_ref().is_some_and(|p| !p.items.is_empty())
    }

    pub fn on_response(
        &mut self,
        id: RequestId,
        result: Result<RunsResponse, TransportError>,
    ) -> Option<QueryRequest> {
        if !self.mounted {
            tracing::debug!(request_id = id, "response after unmount ignored");
            return None;
        }
        let in_flight = match self.in_flight {
            Some(f) if f.id == id => f,
            _ => {
                tracing::debug!(request_id = id, "response for unknown request ignored");
                return None;
            }
        };
        self.in_flight = None;

        if in_flight.generation != self.generation {
            tracing::debug!(request_id = id, "stale response dropped");
            self.refresh.abandoned();
            let trigger = self.follow_up.take().unwrap_or(FetchTrigger::Refresh);
            return self.issue(trigger);
        }
        self.follow_up = None;

        match classify(result, self.paginator.page_size()) {
            Ok(items) => {
                let page = self.paginator.complete(items);
                tracing::debug!(
                    request_id = id,
                    items = page.items.len(),
                    has_next = page.next_cursor.is_some(),
                    "page loaded"
                );
                self.page = Some(page);
                self.error = None;
                self.refresh.succeeded(Utc::now());
            }
            Err(err) => {
                tracing::warn!(request_id = id, error = %err, "run query failed");
                self.paginator.fail();
                self.error = Some(err.clone());
                self.refresh.failed(err);
            }
        }
        None
    }

    fn issue(&mut self, trigger: FetchTrigger) -> Option<QueryRequest> {
        if !self.mounted {
            return None;
        }
        if self.in_flight.is_some() {
            // Applied once the in-flight response comes back.
            self.follow_up = Some(trigger);
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.in_flight = Some(InFlight {
            id,
            generation: self.generation,
        });
        self.refresh.begin();
        let query = RunsQuery {
            filter: self.query_filter(),
            cursor: self.paginator.cursor().cloned(),
            limit: self.paginator.page_size(),
        };
        tracing::debug!(request_id = id, ?trigger, cursor = ?query.cursor, "issuing run query");
        Some(QueryRequest { id, trigger, query })
    }
}

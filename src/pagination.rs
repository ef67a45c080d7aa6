//! Cursor pagination with a back-stack of previous cursors.
//!
//! The endpoint has no "has more" flag: a full page (`len == page_size`) is taken
//! to mean there may be another one, and its last id becomes the next cursor.
//! When the total is an exact multiple of the page size, the final "next" page
//! comes back empty.

use crate::app::RunRecord;
use crate::query::Cursor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationState {
    /// First page, nothing fetched yet.
    Idle,
    Loading { pending: Option<Cursor> },
    Loaded { cursor: Option<Cursor> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<RunRecord>,
    pub next_cursor: Option<Cursor>,
}

/// Position before a navigation, restored if that navigation fails.
#[derive(Debug, Clone)]
struct Restore {
    state: PaginationState,
    history: Vec<Option<Cursor>>,
    next_cursor: Option<Cursor>,
}

#[derive(Debug, Clone)]
pub struct CursorPaginator {
    page_size: usize,
    state: PaginationState,
    history: Vec<Option<Cursor>>,
    next_cursor: Option<Cursor>,
    restore: Option<Restore>,
}

impl CursorPaginator {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            state: PaginationState::Idle,
            history: Vec::new(),
            next_cursor: None,
            restore: None,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    pub fn history(&self) -> &[Option<Cursor>] {
        &self.history
    }

    /// Cursor the next request should use: the pending one while loading.
    pub fn cursor(&self) -> Option<&Cursor> {
        match &self.state {
            PaginationState::Idle => None,
            PaginationState::Loading { pending } => pending.as_ref(),
            PaginationState::Loaded { cursor } => cursor.as_ref(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, PaginationState::Loading { .. })
    }

    pub fn has_next(&self) -> bool {
        matches!(self.state, PaginationState::Loaded { .. }) && self.next_cursor.is_some()
    }

    pub fn has_previous(&self) -> bool {
        matches!(self.state, PaginationState::Loaded { .. }) && !self.history.is_empty()
    }

    /// 1-based index of the page being shown (or loaded).
    pub fn page_number(&self) -> usize {
        self.history.len() + 1
    }

    /// Back to the first page. Used on every filter change.
    pub fn reset(&mut self) {
        self.state = PaginationState::Idle;
        self.history.clear();
        self.next_cursor = None;
        self.restore = None;
    }

    pub fn go_to_next_page(&mut self) -> bool {
        let (PaginationState::Loaded { cursor }, Some(next)) = (&self.state, &self.next_cursor)
        else {
            tracing::debug!("next page unavailable");
            return false;
        };
        let current = cursor.clone();
        let next = next.clone();
        self.save_restore();
        self.history.push(current);
        self.next_cursor = None;
        self.state = PaginationState::Loading { pending: Some(next) };
        true
    }

    pub fn go_to_previous_page(&mut self) -> bool {
        if !self.has_previous() {
            tracing::debug!("previous page unavailable");
            return false;
        }
        self.save_restore();
        let pending = self.history.pop().flatten();
        self.next_cursor = None;
        self.state = PaginationState::Loading { pending };
        true
    }

    /// Accepts a fetched page for the current cursor. Items beyond `page_size`
    /// are dropped.
    pub fn complete(&mut self, mut items: Vec<RunRecord>) -> Page {
        items.truncate(self.page_size);
        let next_cursor = if items.len() == self.page_size {
            items.last().map(|r| r.id.clone())
        } else {
            None
        };
        self.state = PaginationState::Loaded {
            cursor: self.cursor().cloned(),
        };
        self.next_cursor = next_cursor.clone();
        self.restore = None;
        Page { items, next_cursor }
    }

    /// A failed fetch leaves the last settled position in place.
    pub fn fail(&mut self) {
        if let Some(restore) = self.restore.take() {
            self.state = restore.state;
            self.history = restore.history;
            self.next_cursor = restore.next_cursor;
        } else if self.is_loading() {
            self.state = PaginationState::Idle;
        }
    }

    fn save_restore(&mut self) {
        self.restore = Some(Restore {
            state: self.state.clone(),
            history: self.history.clone(),
            next_cursor: self.next_cursor.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_run;

    fn runs(range: std::ops::RangeInclusive<u32>) -> Vec<RunRecord> {
        range.map(|i| test_run(&format!("run-{i}"))).collect()
    }

    #[test]
    fn starts_idle_on_first_page() {
        let p = CursorPaginator::new(25);
        assert_eq!(p.state(), &PaginationState::Idle);
        assert_eq!(p.cursor(), None);
        assert!(!p.has_next());
        assert!(!p.has_previous());
        assert_eq!(p.page_number(), 1);
    }

    #[test]
    fn full_page_has_next() {
        let mut p = CursorPaginator::new(3);
        let page = p.complete(runs(1..=3));
        assert_eq!(page.next_cursor.as_deref(), Some("run-3"));
        assert!(p.has_next());
    }

    #[test]
    fn short_page_has_no_next() {
        let mut p = CursorPaginator::new(3);
        let page = p.complete(runs(1..=2));
        assert_eq!(page.next_cursor, None);
        assert!(!p.has_next());
    }

    #[test]
    fn oversized_page_is_truncated() {
        let mut p = CursorPaginator::new(3);
        let page = p.complete(runs(1..=5));
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.next_cursor.as_deref(), Some("run-3"));
    }

    #[test]
    fn next_then_previous_walks_history() {
        let mut p = CursorPaginator::new(2);
        p.complete(runs(1..=2));
        assert!(p.go_to_next_page());
        assert_eq!(p.cursor().map(String::as_str), Some("run-2"));
        assert!(p.is_loading());
        assert_eq!(p.history(), &[None]);

        p.complete(runs(3..=4));
        assert!(p.has_previous());
        assert_eq!(p.page_number(), 2);

        assert!(p.go_to_previous_page());
        assert_eq!(p.cursor(), None);
        p.complete(runs(1..=2));
        assert!(!p.has_previous());
        assert!(p.has_next());
    }

    #[test]
    fn navigation_is_noop_when_unavailable() {
        let mut p = CursorPaginator::new(2);
        assert!(!p.go_to_next_page());
        assert!(!p.go_to_previous_page());
        p.complete(runs(1..=1));
        assert!(!p.go_to_next_page());
        assert_eq!(p.history(), &[] as &[Option<Cursor>]);
    }

    #[test]
    fn navigation_blocked_while_loading() {
        let mut p = CursorPaginator::new(2);
        p.complete(runs(1..=2));
        assert!(p.go_to_next_page());
        assert!(!p.go_to_next_page());
        assert!(!p.go_to_previous_page());
        assert_eq!(p.history().len(), 1);
    }

    #[test]
    fn failed_navigation_restores_position() {
        let mut p = CursorPaginator::new(2);
        p.complete(runs(1..=2));
        assert!(p.go_to_next_page());
        p.fail();
        assert_eq!(p.state(), &PaginationState::Loaded { cursor: None });
        assert!(p.history().is_empty());
        assert!(p.has_next());
        // retry works from the same position
        assert!(p.go_to_next_page());
        assert_eq!(p.cursor().map(String::as_str), Some("run-2"));
    }

    #[test]
    fn failed_refresh_keeps_loaded_position() {
        let mut p = CursorPaginator::new(2);
        p.complete(runs(1..=2));
        p.go_to_next_page();
        p.complete(runs(3..=4));
        p.fail();
        assert_eq!(
            p.state(),
            &PaginationState::Loaded {
                cursor: Some("run-2".to_string())
            }
        );
        assert_eq!(p.history(), &[None]);
    }

    #[test]
    fn reset_clears_everything() {
        let mut p = CursorPaginator::new(2);
        p.complete(runs(1..=2));
        p.go_to_next_page();
        p.complete(runs(3..=4));
        p.reset();
        assert_eq!(p.state(), &PaginationState::Idle);
        assert!(p.history().is_empty());
        assert_eq!(p.cursor(), None);
        assert!(!p.has_next());
    }

    #[test]
    fn zero_page_size_is_clamped() {
        assert_eq!(CursorPaginator::new(0).page_size(), 1);
    }
}

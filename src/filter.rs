//! Filter tokens, run-list tabs, and reconciliation of tab-locked status tokens
//! with the tokens the user edits.
//!
//! The persisted token set is always the full set. Tabs other than `All` own the
//! `status` tokens: the editor only ever sees [`effective_mutable_view`], and
//! [`apply_edit`] re-prepends the locked tokens so an edit can never drop them.
//! The query predicate is derived from the full set by [`derived_query_filter`].

use crate::app::RunStatus;
use crate::query::{RunsFilter, TagFilter};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterTokenKind {
    Id,
    Status,
    Pipeline,
    Job,
    SnapshotId,
    Tag,
}

impl FilterTokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Status => "status",
            Self::Pipeline => "pipeline",
            Self::Job => "job",
            Self::SnapshotId => "snapshotId",
            Self::Tag => "tag",
        }
    }
}

impl fmt::Display for FilterTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterTokenKind {
    type Err = TokenParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "status" => Ok(Self::Status),
            "pipeline" => Ok(Self::Pipeline),
            "job" => Ok(Self::Job),
            "snapshotId" => Ok(Self::SnapshotId),
            "tag" => Ok(Self::Tag),
            other => Err(TokenParseError::UnknownKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenParseError {
    #[error("expected kind:value, got '{0}'")]
    Malformed(String),
    #[error("unknown filter kind '{0}'")]
    UnknownKind(String),
}

/// A single `kind:value` constraint. Equality is equality of the canonical string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterToken {
    pub kind: FilterTokenKind,
    pub value: String,
}

impl FilterToken {
    pub fn new(kind: FilterTokenKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn status(status: RunStatus) -> Self {
        Self::new(FilterTokenKind::Status, status.as_str())
    }

    pub fn is_status(&self) -> bool {
        self.kind == FilterTokenKind::Status
    }

    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FilterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

impl FromStr for FilterToken {
    type Err = TokenParseError;

    /// Splits on the first `:` so tag values like `team=a:b` survive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, value) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| TokenParseError::Malformed(s.to_string()))?;
        let value = value.trim();
        if value.is_empty() {
            return Err(TokenParseError::Malformed(s.to_string()));
        }
        Ok(Self::new(kind.trim().parse()?, value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunsTab {
    All,
    Queued,
    InProgress,
    Done,
}

impl RunsTab {
    pub const TABS: [RunsTab; 4] = [Self::All, Self::Queued, Self::InProgress, Self::Done];

    pub fn title(self) -> &'static str {
        match self {
            Self::All => "All runs",
            Self::Queued => "Queued",
            Self::InProgress => "In progress",
            Self::Done => "Done",
        }
    }

    /// Fixed status predicate owned by the tab; empty for `All`.
    pub fn locked_statuses(self) -> &'static [RunStatus] {
        match self {
            Self::All => &[],
            Self::Queued => &[RunStatus::Queued],
            Self::InProgress => &[
                RunStatus::Starting,
                RunStatus::Started,
                RunStatus::Canceling,
            ],
            Self::Done => &[RunStatus::Success, RunStatus::Failure, RunStatus::Canceled],
        }
    }

    pub fn is_status_locked(self) -> bool {
        !self.locked_statuses().is_empty()
    }

    /// The tab whose predicate equals the set of status values in `tokens`.
    pub fn from_tokens(tokens: &[FilterToken]) -> Self {
        let values: std::collections::HashSet<&str> = tokens
            .iter()
            .filter(|t| t.is_status())
            .map(|t| t.value.as_str())
            .collect();
        Self::TABS
            .into_iter()
            .filter(|tab| tab.is_status_locked())
            .find(|tab| {
                let locked = tab.locked_statuses();
                locked.len() == values.len() && locked.iter().all(|s| values.contains(s.as_str()))
            })
            .unwrap_or(Self::All)
    }

    pub fn next(self) -> Self {
        let idx = Self::TABS.iter().position(|t| *t == self).unwrap_or(0);
        Self::TABS[(idx + 1) % Self::TABS.len()]
    }
}

impl FromStr for RunsTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "queued" => Ok(Self::Queued),
            "in-progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(format!(
                "unknown tab '{other}' (expected all, queued, in-progress or done)"
            )),
        }
    }
}

/// Splits into `(status, other)`, keeping relative order within each side.
pub fn partition(tokens: &[FilterToken]) -> (Vec<FilterToken>, Vec<FilterToken>) {
    tokens.iter().cloned().partition(FilterToken::is_status)
}

/// The tokens shown to the filter editor. Never contains status tokens while locked.
pub fn effective_mutable_view(tokens: &[FilterToken], status_locked: bool) -> Vec<FilterToken> {
    if status_locked {
        tokens.iter().filter(|t| !t.is_status()).cloned().collect()
    } else {
        tokens.to_vec()
    }
}

/// Merges an edit of the mutable view back into the full set.
pub fn apply_edit(
    new_editable: &[FilterToken],
    locked_status: &[FilterToken],
    status_locked: bool,
) -> Vec<FilterToken> {
    if status_locked {
        locked_status
            .iter()
            .chain(new_editable.iter().filter(|t| !t.is_status()))
            .cloned()
            .collect()
    } else {
        new_editable.to_vec()
    }
}

/// Returns `None` when a token with the same canonical form is already present,
/// so callers can skip a redundant refetch.
pub fn add_token(existing: &[FilterToken], candidate: FilterToken) -> Option<Vec<FilterToken>> {
    let canonical = candidate.canonical();
    if existing.iter().any(|t| t.canonical() == canonical) {
        return None;
    }
    let mut tokens = existing.to_vec();
    tokens.push(candidate);
    Some(tokens)
}

/// Drops later duplicates by canonical form.
pub fn dedup_tokens(tokens: Vec<FilterToken>) -> Vec<FilterToken> {
    let mut seen = std::collections::HashSet::new();
    tokens
        .into_iter()
        .filter(|t| seen.insert(t.canonical()))
        .collect()
}

/// Translates the full token set into the endpoint predicate.
pub fn derived_query_filter(tokens: &[FilterToken]) -> RunsFilter {
    let mut filter = RunsFilter::default();
    for token in tokens {
        match token.kind {
            FilterTokenKind::Id => filter.run_ids = vec![token.value.clone()],
            FilterTokenKind::Job | FilterTokenKind::Pipeline => {
                filter.pipeline_name = Some(token.value.clone());
            }
            FilterTokenKind::SnapshotId => filter.snapshot_id = Some(token.value.clone()),
            FilterTokenKind::Status => match token.value.parse::<RunStatus>() {
                Ok(status) if !filter.statuses.contains(&status) => filter.statuses.push(status),
                Ok(_) => {}
                Err(()) => tracing::debug!(value = %token.value, "ignoring unknown status token"),
            },
            FilterTokenKind::Tag => {
                let (key, value) = token
                    .value
                    .split_once('=')
                    .unwrap_or((token.value.as_str(), ""));
                filter.tags.push(TagFilter {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
        }
    }
    filter
}

pub fn enabled_filter_kinds(status_locked: bool) -> Vec<FilterTokenKind> {
    let mut kinds = vec![
        FilterTokenKind::Tag,
        FilterTokenKind::SnapshotId,
        FilterTokenKind::Id,
        FilterTokenKind::Job,
        FilterTokenKind::Pipeline,
    ];
    if !status_locked {
        kinds.push(FilterTokenKind::Status);
    }
    kinds
}

/// Replaces the status tokens with `tab`'s predicate, keeping everything else.
pub fn switch_tab(tokens: &[FilterToken], tab: RunsTab) -> Vec<FilterToken> {
    let (_, others) = partition(tokens);
    tab.locked_statuses()
        .iter()
        .map(|s| FilterToken::status(*s))
        .chain(others)
        .collect()
}

use crate::classify::TransportError;
use crate::filter::FilterToken;
use crate::query::{DaemonStatus, RunsQuery, RunsResponse};
use async_trait::async_trait;
use color_eyre::eyre::Result;

#[async_trait]
pub trait RunsTransport: Send + Sync {
    async fn fetch_runs(&self, query: &RunsQuery) -> Result<RunsResponse, TransportError>;
    async fn fetch_daemon_status(&self, daemon_type: &str)
        -> Result<DaemonStatus, TransportError>;
}

/// Where the filter tokens live between sessions. Loading never fails: anything
/// unreadable is dropped and the view starts from what remains.
pub trait FilterStore: Send + Sync {
    fn load(&self) -> Vec<FilterToken>;
    fn save(&self, tokens: &[FilterToken]) -> Result<()>;
}

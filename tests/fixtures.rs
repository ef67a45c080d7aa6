#![allow(dead_code)]

use async_trait::async_trait;
use runw::app::{AppConfig, AppState, RunRecord, RunStatus, RunTag};
use runw::classify::TransportError;
use runw::filter::FilterToken;
use runw::query::{DaemonStatus, RunsQuery, RunsResponse};
use runw::traits::RunsTransport;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn run_with_id(id: &str) -> RunRecord {
    RunRecord {
        id: id.to_string(),
        status: RunStatus::Success,
        pipeline_name: "etl".to_string(),
        pipeline_snapshot_id: Some("snap-1".to_string()),
        mode: Some("default".to_string()),
        tags: vec![RunTag {
            key: "team".to_string(),
            value: "data".to_string(),
        }],
        start_time: Some(1_700_000_000.0),
        end_time: Some(1_700_000_065.0),
        update_time: Some(1_700_000_065.0),
    }
}

pub fn run_with_status(id: &str, status: RunStatus) -> RunRecord {
    let mut run = run_with_id(id);
    run.status = status;
    run
}

pub fn run_for_job(id: &str, job: &str) -> RunRecord {
    let mut run = run_with_id(id);
    run.pipeline_name = job.to_string();
    run
}

/// `count` runs with ids `run-01`, `run-02`, ...
pub fn numbered_runs(count: usize) -> Vec<RunRecord> {
    (1..=count).map(|i| run_with_id(&format!("run-{i:02}"))).collect()
}

pub fn tok(s: &str) -> FilterToken {
    s.parse().unwrap()
}

pub fn test_config(page_size: usize) -> AppConfig {
    AppConfig {
        endpoint: "http://localhost:3000".to_string(),
        page_size,
        refresh_interval: 15,
        version_string: "runw v0.0.0+test".to_string(),
    }
}

pub fn make_state(tokens: Vec<FilterToken>, page_size: usize) -> AppState {
    AppState::new(test_config(page_size), tokens)
}

pub fn runs_page(runs: Vec<RunRecord>) -> Result<RunsResponse, TransportError> {
    Ok(RunsResponse::Runs { results: runs })
}

/// Serves a fixed run list the way the server pages it: filtered, then the
/// `limit` records after `cursor`.
pub struct DatasetTransport {
    runs: Vec<RunRecord>,
    daemon: DaemonStatus,
    calls: AtomicUsize,
}

impl DatasetTransport {
    pub fn new(runs: Vec<RunRecord>) -> Self {
        Self {
            runs,
            daemon: DaemonStatus {
                required: true,
                healthy: true,
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_daemon(mut self, daemon: DaemonStatus) -> Self {
        self.daemon = daemon;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RunsTransport for DatasetTransport {
    async fn fetch_runs(&self, query: &RunsQuery) -> Result<RunsResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let filter = &query.filter;
        let matching: Vec<&RunRecord> = self
            .runs
            .iter()
            .filter(|r| filter.statuses.is_empty() || filter.statuses.contains(&r.status))
            .filter(|r| {
                filter
                    .pipeline_name
                    .as_ref()
                    .map_or(true, |name| *name == r.pipeline_name)
            })
            .collect();
        let start = match &query.cursor {
            Some(cursor) => match matching.iter().position(|r| r.id == *cursor) {
                Some(idx) => idx + 1,
                None => return Err(TransportError::Status {
                    status: 400,
                    body: format!("unknown cursor {cursor}"),
                }),
            },
            None => 0,
        };
        let results = matching
            .into_iter()
            .skip(start)
            .take(query.limit)
            .cloned()
            .collect();
        Ok(RunsResponse::Runs { results })
    }

    async fn fetch_daemon_status(
        &self,
        _daemon_type: &str,
    ) -> Result<DaemonStatus, TransportError> {
        Ok(self.daemon)
    }
}

/// Replays queued responses in order and records every query it sees.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<RunsResponse, TransportError>>>,
    queries: Mutex<Vec<RunsQuery>>,
}

impl ScriptedTransport {
    pub fn push(&self, response: Result<RunsResponse, TransportError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn queries(&self) -> Vec<RunsQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl RunsTransport for ScriptedTransport {
    async fn fetch_runs(&self, query: &RunsQuery) -> Result<RunsResponse, TransportError> {
        self.queries.lock().unwrap().push(query.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no scripted response".to_string())))
    }

    async fn fetch_daemon_status(
        &self,
        _daemon_type: &str,
    ) -> Result<DaemonStatus, TransportError> {
        Err(TransportError::Network("not scripted".to_string()))
    }
}

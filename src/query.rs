//! Request and response shapes of the run query endpoint.

use crate::app::{RunRecord, RunStatus};
use serde::{Deserialize, Serialize};

pub type Cursor = String;

/// Daemon type whose health drives the queued-tab banner.
pub const QUEUED_RUN_COORDINATOR: &str = "QUEUED_RUN_COORDINATOR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagFilter {
    pub key: String,
    pub value: String,
}

/// Predicate sent to the endpoint. Empty fields are omitted from the wire form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunsFilter {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub run_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<RunStatus>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagFilter>,
}

impl RunsFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunsQuery {
    pub filter: RunsFilter,
    pub cursor: Option<Cursor>,
    pub limit: usize,
}

/// The `pipelineRunsOrError` union, discriminated by `__typename`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "__typename")]
pub enum RunsResponse {
    Runs {
        results: Vec<RunRecord>,
    },
    #[serde(rename = "InvalidPipelineRunsFilterError")]
    InvalidFilter { message: String },
    PythonError {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DaemonStatus {
    pub required: bool,
    pub healthy: bool,
}

impl DaemonStatus {
    pub fn needs_warning(self) -> bool {
        self.required && !self.healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_serializes_to_empty_object() {
        let json = serde_json::to_string(&RunsFilter::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn filter_uses_camel_case_and_status_names() {
        let filter = RunsFilter {
            pipeline_name: Some("etl".to_string()),
            statuses: vec![RunStatus::Queued, RunStatus::Started],
            ..RunsFilter::default()
        };
        let value = serde_json::to_value(&filter).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"pipelineName": "etl", "statuses": ["QUEUED", "STARTED"]})
        );
    }

    #[test]
    fn response_union_by_typename() {
        let resp: RunsResponse = serde_json::from_str(
            r#"{"__typename": "InvalidPipelineRunsFilterError", "message": "bad tag"}"#,
        )
        .unwrap();
        assert_eq!(
            resp,
            RunsResponse::InvalidFilter {
                message: "bad tag".to_string()
            }
        );
    }

    #[test]
    fn daemon_warning_only_when_required_and_unhealthy() {
        let s = |required, healthy| DaemonStatus { required, healthy };
        assert!(s(true, false).needs_warning());
        assert!(!s(true, true).needs_warning());
        assert!(!s(false, false).needs_warning());
    }
}

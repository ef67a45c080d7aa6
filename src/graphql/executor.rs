use super::parser;
use crate::classify::TransportError;
use crate::query::{DaemonStatus, RunsQuery, RunsResponse};
use crate::traits::RunsTransport;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

const RUNS_QUERY: &str = r"
query RunsRootQuery($limit: Int, $cursor: String, $filter: RunsFilter!) {
  pipelineRunsOrError(limit: $limit, cursor: $cursor, filter: $filter) {
    __typename
    ... on Runs {
      results {
        id
        status
        pipelineName
        pipelineSnapshotId
        mode
        tags { key value }
        startTime
        endTime
        updateTime
      }
    }
    ... on InvalidPipelineRunsFilterError { message }
    ... on PythonError { message }
  }
}";

const DAEMON_STATUS_QUERY: &str = r"
query DaemonStatusQuery($daemonType: String!) {
  instance {
    daemonHealth {
      daemonStatus(daemonType: $daemonType) { daemonType healthy required }
    }
  }
}";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphqlRequest<'a, V: Serialize> {
    query: &'a str,
    operation_name: &'a str,
    variables: V,
}

/// Posts queries to `<endpoint>/graphql`.
#[derive(Clone)]
pub struct GraphqlTransport {
    client: reqwest::Client,
    url: String,
}

impl GraphqlTransport {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("runw/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self {
            client,
            url: format!("{}/graphql", endpoint.trim_end_matches('/')),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post<V: Serialize + Send>(
        &self,
        operation_name: &str,
        query: &str,
        variables: V,
    ) -> Result<String, TransportError> {
        let body = GraphqlRequest {
            query,
            operation_name,
            variables,
        };
        tracing::debug!(url = %self.url, operation = operation_name, "graphql request");
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), body = %text, "graphql request rejected");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl RunsTransport for GraphqlTransport {
    async fn fetch_runs(&self, query: &RunsQuery) -> Result<RunsResponse, TransportError> {
        let body = self.post("RunsRootQuery", RUNS_QUERY, query).await?;
        parser::parse_runs_response(&body)
    }

    async fn fetch_daemon_status(
        &self,
        daemon_type: &str,
    ) -> Result<DaemonStatus, TransportError> {
        let body = self
            .post(
                "DaemonStatusQuery",
                DAEMON_STATUS_QUERY,
                json!({ "daemonType": daemon_type }),
            )
            .await?;
        parser::parse_daemon_status(&body)
    }
}

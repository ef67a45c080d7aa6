use crate::classify::TransportError;
use crate::query::{DaemonStatus, RunsResponse};
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunsData {
    pipeline_runs_or_error: RunsResponse,
}

#[derive(Deserialize)]
struct DaemonData {
    instance: Instance,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Instance {
    daemon_health: DaemonHealth,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DaemonHealth {
    daemon_status: DaemonStatus,
}

/// Top-level `errors` win over any partial `data`.
fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T, TransportError> {
    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))?;
    if !envelope.errors.is_empty() {
        let messages: Vec<_> = envelope.errors.into_iter().map(|e| e.message).collect();
        return Err(TransportError::GraphQl(messages.join("; ")));
    }
    envelope
        .data
        .ok_or_else(|| TransportError::Decode("response has no data".to_string()))
}

pub fn parse_runs_response(body: &str) -> Result<RunsResponse, TransportError> {
    parse_envelope::<RunsData>(body).map(|d| d.pipeline_runs_or_error)
}

pub fn parse_daemon_status(body: &str) -> Result<DaemonStatus, TransportError> {
    parse_envelope::<DaemonData>(body).map(|d| d.instance.daemon_health.daemon_status)
}

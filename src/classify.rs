//! Classification of endpoint results into a page or a displayable error.

use crate::app::RunRecord;
use crate::query::RunsResponse;

/// Failure of the request itself, before any application-level payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("GraphQL error: {0}")]
    GraphQl(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl TransportError {
    /// 400/422 mean the server rejected the request body before running the
    /// query, which at this boundary is almost always a bad filter.
    pub fn is_malformed_request(&self) -> bool {
        matches!(self, Self::Status { status: 400 | 422, .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunsError {
    #[error("Invalid run filters")]
    InvalidFilter,
    #[error("Query error: {message}")]
    Domain { message: String },
    #[error("Unexpected error: {detail}")]
    Unexpected { detail: String },
}

impl RunsError {
    pub fn title(&self) -> &'static str {
        match self {
            Self::InvalidFilter => "Invalid run filters",
            Self::Domain { .. } => "Query error",
            Self::Unexpected { .. } => "Unexpected error",
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::InvalidFilter => {
                "The specified run filters are not valid. Please check the filters and try again."
            }
            Self::Domain { message } => message,
            Self::Unexpected { .. } => {
                "An unexpected error occurred. Run with --verbose and check the debug log for details."
            }
        }
    }
}

/// Transport rejections are checked before the payload, and a structurally
/// successful response carrying an error variant is never a transport failure.
pub fn classify(
    result: Result<RunsResponse, TransportError>,
    page_size: usize,
) -> Result<Vec<RunRecord>, RunsError> {
    match result {
        Err(e) if e.is_malformed_request() => Err(RunsError::InvalidFilter),
        Ok(RunsResponse::InvalidFilter { message } | RunsResponse::PythonError { message }) => {
            Err(RunsError::Domain { message })
        }
        Err(e) => Err(RunsError::Unexpected {
            detail: e.to_string(),
        }),
        Ok(RunsResponse::Runs { mut results }) => {
            results.truncate(page_size);
            Ok(results)
        }
    }
}

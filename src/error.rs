//! Error types for the housing statistics library.

use std::time::Duration;

/// Failure fetching data for a single area.
///
/// Always recoverable at the granularity of that one area: the ward
/// comparison drops the ward, other areas are unaffected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("endpoint returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    /// HTTP status code, if the endpoint answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            FetchError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(err.to_string())
    }
}

/// Total failure of a required source for a top-level operation.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("{source_name} is unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },

    #[error("failed to read {path}: {err}")]
    Io {
        path: String,
        #[source]
        err: std::io::Error,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl SourceError {
    pub fn unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        SourceError::Unavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

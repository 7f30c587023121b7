use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum NetaError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("backend returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid analysis request: {0}")]
    InvalidRequest(String),

    #[error("analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("dataset not found: {0}")]
    DatasetNotFound(u64),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

/// Transport-level classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response was received.
    NetworkFailure,
    /// A response was received with a non-success status.
    HttpError { status: u16 },
    /// The body was not JSON or not the expected shape.
    DecodeFailure,
    Other,
}

impl ErrorKind {
    /// Whether an endpoint with a configured fallback resource retries against it.
    pub fn absorbed_by_fallback(self) -> bool {
        matches!(self, ErrorKind::NetworkFailure | ErrorKind::HttpError { .. })
    }
}

impl NetaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NetaError::Network(_) => ErrorKind::NetworkFailure,
            NetaError::HttpStatus { status, .. } => ErrorKind::HttpError { status: *status },
            NetaError::Decode(_) => ErrorKind::DecodeFailure,
            _ => ErrorKind::Other,
        }
    }

    pub(crate) fn decode(err: serde_json::Error) -> Self {
        NetaError::Decode(err.to_string())
    }
}

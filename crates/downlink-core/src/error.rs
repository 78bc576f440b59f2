//! Error types for Downlink.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Local validation, rejected before any request is issued
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    // Connection, timeout, or body-decoding failure
    #[error("Transport error: {0}")]
    Transport(String),

    // Non-2xx response from the backend
    #[error("HTTP {status} from {method} {endpoint}")]
    PipelineHttp {
        endpoint: String,
        method: String,
        status: u16,
    },

    // Job reached the failed state, carrying the server's message
    #[error("Job {job_id} failed: {message}")]
    ServerFailure { job_id: String, message: String },

    // A status poll observed a transition the job lifecycle forbids
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Short taxonomy tag attached to reported error events.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "validation",
            Error::Transport(_) => "transport",
            Error::PipelineHttp { .. } => "pipeline_http",
            Error::ServerFailure { .. } => "server_failure",
            Error::InvalidTransition { .. } => "invalid_transition",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
        }
    }

    /// Validation errors are surfaced to the user directly and never
    /// forwarded to the error sink.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, Error::Validation { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        let err = Error::PipelineHttp {
            endpoint: "/health".to_string(),
            method: "GET".to_string(),
            status: 503,
        };
        assert_eq!(err.kind(), "pipeline_http");
        assert_eq!(err.to_string(), "HTTP 503 from GET /health");
    }

    #[test]
    fn test_validation_not_reportable() {
        let err = Error::Validation {
            field: "file_id".to_string(),
            reason: "out of range".to_string(),
        };
        assert!(!err.is_reportable());
        assert!(Error::Transport("refused".to_string()).is_reportable());
    }
}

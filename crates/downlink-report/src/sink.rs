//! Error event sinks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),
}

/// One reportable failure with its correlation tags.
///
/// `tags` carries `trace_id` whenever a trace is active; pipeline
/// failures add `api_endpoint`, `api_method`, and `api_status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub kind: String,
    pub message: String,
    pub tags: BTreeMap<String, String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorEvent {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            tags: BTreeMap::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.tags.get("trace_id").map(String::as_str)
    }
}

/// Trait for error sinks.
///
/// Reporting is best-effort: implementations surface their own failures
/// through [`ReportError`], and callers log and drop those rather than
/// let a broken sink take down the pipeline.
#[async_trait]
pub trait ErrorSink: Send + Sync {
    async fn report(&self, event: &ErrorEvent) -> Result<(), ReportError>;
}

/// Sink that POSTs events as JSON to an HTTP collector endpoint.
pub struct WebhookSink {
    endpoint: String,
    client: reqwest::Client,
}

impl WebhookSink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ErrorSink for WebhookSink {
    async fn report(&self, event: &ErrorEvent) -> Result<(), ReportError> {
        debug!(endpoint = %self.endpoint, kind = %event.kind, "Delivering error event");

        let response = self.client.post(&self.endpoint).json(event).send().await?;
        if !response.status().is_success() {
            return Err(ReportError::DeliveryFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Sink that writes events to the process log.
///
/// The default when no collector endpoint is configured.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl ErrorSink for LogSink {
    async fn report(&self, event: &ErrorEvent) -> Result<(), ReportError> {
        error!(
            kind = %event.kind,
            tags = ?event.tags,
            "{}",
            event.message
        );
        Ok(())
    }
}

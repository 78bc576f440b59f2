//! Client configuration.

use downlink_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Delay between successful status polls, in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Backoff after a failed status poll, in milliseconds.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
    /// How often a dashboard refreshes the backend health card, seconds.
    #[serde(default = "default_health_refresh")]
    pub health_refresh_secs: u64,
    /// Collector endpoint for error events; log-only when unset.
    #[serde(default)]
    pub report_webhook: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    2_000
}

fn default_retry_backoff() -> u64 {
    5_000
}

fn default_health_refresh() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            poll_interval_ms: default_poll_interval(),
            retry_backoff_ms: default_retry_backoff(),
            health_refresh_secs: default_health_refresh(),
            report_webhook: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&contents).map_err(|e| Error::Config(e.to_string()))
    }
}

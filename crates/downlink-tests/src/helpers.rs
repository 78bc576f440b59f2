//! Test helper functions and utilities.

use async_trait::async_trait;
use downlink_client::{ApiClient, ClientConfig, JobPoller};
use downlink_report::{ErrorEvent, ErrorSink, ReportError};
use downlink_trace::TraceState;
use std::sync::{Arc, Mutex};

/// Sink that records every event it receives, for assertions.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ErrorEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ErrorEvent> {
        self.events.lock().expect("sink lock").clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("sink lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ErrorSink for RecordingSink {
    async fn report(&self, event: &ErrorEvent) -> Result<(), ReportError> {
        self.events.lock().expect("sink lock").push(event.clone());
        Ok(())
    }
}

/// Config pointed at a mock server, with millisecond-scale intervals so
/// the polling policy can be observed without real-time waits.
pub fn fast_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        base_url: base_url.to_string(),
        timeout_secs: 5,
        poll_interval_ms: 20,
        retry_backoff_ms: 60,
        ..ClientConfig::default()
    }
}

/// Build an API client against a mock server, returning the sink for
/// assertions.
pub fn test_client(config: &ClientConfig) -> (Arc<ApiClient>, Arc<RecordingSink>) {
    let sink = RecordingSink::new();
    let trace = Arc::new(TraceState::new());
    let api = ApiClient::new(config, trace, Arc::clone(&sink) as Arc<dyn ErrorSink>)
        .expect("client builds");
    (Arc::new(api), sink)
}

/// Build a poller (and its client and sink) against a mock server.
pub fn test_poller(config: &ClientConfig) -> (JobPoller, Arc<ApiClient>, Arc<RecordingSink>) {
    let (api, sink) = test_client(config);
    let poller = JobPoller::new(Arc::clone(&api), config);
    (poller, api, sink)
}

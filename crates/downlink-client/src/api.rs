//! HTTP client for the download backend.
//!
//! Every request carries the process trace identity's headers; every
//! failure is forwarded to the error sink with endpoint, method, and
//! status tags before being returned to the caller unchanged.

use crate::config::ClientConfig;
use downlink_core::job::{DownloadJob, FileAvailability, HealthReport, StartedJob};
use downlink_core::{Error, FileId, JobId, Result};
use downlink_report::{ErrorEvent, ErrorSink};
use downlink_trace::{TraceState, traced};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub struct ApiClient {
    client: Client,
    base_url: String,
    trace: Arc<TraceState>,
    sink: Arc<dyn ErrorSink>,
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        trace: Arc<TraceState>,
        sink: Arc<dyn ErrorSink>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            trace,
            sink,
        })
    }

    pub fn trace(&self) -> &TraceState {
        &self.trace
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);

        // Always-inject: the pipeline offers no override point for
        // these headers.
        for (name, value) in self.trace.outbound_headers() {
            req = req.header(name, value);
        }
        req
    }

    /// Send a request and decode its JSON body.
    ///
    /// Transport failures and non-2xx statuses are reported to the sink
    /// and returned unchanged; an error is never converted into a
    /// successful result.
    async fn execute<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        method: &str,
        endpoint: &str,
    ) -> Result<T> {
        let outcome = match req.send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    response
                        .json::<T>()
                        .await
                        .map_err(|e| Error::Transport(e.to_string()))
                } else {
                    Err(Error::PipelineHttp {
                        endpoint: endpoint.to_string(),
                        method: method.to_string(),
                        status: status.as_u16(),
                    })
                }
            }
            Err(e) => Err(Error::Transport(e.to_string())),
        };

        if let Err(ref err) = outcome {
            self.report_failure(err, method, endpoint).await;
        }
        outcome
    }

    async fn report_failure(&self, err: &Error, method: &str, endpoint: &str) {
        if !err.is_reportable() {
            return;
        }

        let mut event = ErrorEvent::new(err.kind(), err.to_string())
            .tag("api_endpoint", endpoint)
            .tag("api_method", method)
            .tag("trace_id", self.trace.trace_id());
        if let Error::PipelineHttp { status, .. } = err {
            event = event.tag("api_status", status.to_string());
        }

        if let Err(report_err) = self.sink.report(&event).await {
            warn!(error = %report_err, "Error sink delivery failed");
        }
    }

    /// Probe backend health.
    pub async fn health(&self) -> Result<HealthReport> {
        traced(&self.trace, "api.health", "http.client", async {
            self.execute(self.request(Method::GET, "/health"), "GET", "/health")
                .await
        })
        .await
    }

    /// Start a download job. Never retried; a failure here surfaces
    /// directly to the caller.
    pub async fn start_download(&self, file_id: FileId) -> Result<StartedJob> {
        traced(&self.trace, "api.start_download", "http.client", async {
            let req = self
                .request(Method::POST, "/v1/download/start")
                .json(&serde_json::json!({ "file_id": file_id }));
            self.execute(req, "POST", "/v1/download/start").await
        })
        .await
    }

    /// Fetch the latest status snapshot for a job.
    pub async fn job_status(&self, job_id: &JobId) -> Result<DownloadJob> {
        let path = format!("/v1/download/status/{job_id}");
        traced(&self.trace, "api.job_status", "http.client", async {
            self.execute(self.request(Method::GET, &path), "GET", &path)
                .await
        })
        .await
    }

    /// Check whether a file is available for download.
    ///
    /// With `telemetry_probe` set the backend deliberately fails the
    /// request, exercising the error-reporting path end to end.
    pub async fn check_file(
        &self,
        file_id: FileId,
        telemetry_probe: bool,
    ) -> Result<FileAvailability> {
        let path = if telemetry_probe {
            "/v1/download/check?sentry_test=true"
        } else {
            "/v1/download/check"
        };
        traced(&self.trace, "api.check_file", "http.client", async {
            let req = self
                .request(Method::POST, path)
                .json(&serde_json::json!({ "file_id": file_id }));
            self.execute(req, "POST", path).await
        })
        .await
    }
}

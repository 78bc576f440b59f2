//! Job polling loop and state machine.
//!
//! One task per job drives repeated status polls until a terminal state
//! is observed. Successful polls are spaced by the poll interval;
//! failed polls back off longer and retry indefinitely. Only a
//! server-reported terminal status or cancellation ends a loop.

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::tracker::JobTracker;
use downlink_core::events::JobEvent;
use downlink_core::job::{DownloadJob, JobStatus};
use downlink_core::{FileId, JobId, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::sleep;
use tracing::{debug, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 64;

pub struct JobPoller {
    api: Arc<ApiClient>,
    tracker: Arc<JobTracker>,
    poll_interval: Duration,
    retry_backoff: Duration,
    events: broadcast::Sender<JobEvent>,
}

impl JobPoller {
    pub fn new(api: Arc<ApiClient>, config: &ClientConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            api,
            tracker: Arc::new(JobTracker::new()),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            events,
        }
    }

    /// The shared snapshot store, for readers.
    pub fn tracker(&self) -> Arc<JobTracker> {
        Arc::clone(&self.tracker)
    }

    /// Subscribe to job lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    /// Start a download job and begin polling it.
    ///
    /// The start call is never retried: a failure surfaces to the
    /// caller and the job never enters the active set.
    pub async fn start(&self, file_id: FileId) -> Result<JobId> {
        let started = self.api.start_download(file_id).await?;
        let job_id = started.job_id.clone();
        info!(job_id = %job_id, file_id = %file_id, "Download job started");

        let start_time = chrono::Utc::now().timestamp_millis();
        self.tracker
            .insert(DownloadJob::queued(job_id.clone(), file_id, start_time))
            .await;
        let cancel_rx = self.tracker.admit(job_id.clone()).await;
        let _ = self.events.send(JobEvent::Started {
            job_id: job_id.clone(),
            file_id,
        });

        let poll_loop = PollLoop {
            api: Arc::clone(&self.api),
            tracker: Arc::clone(&self.tracker),
            events: self.events.clone(),
            poll_interval: self.poll_interval,
            retry_backoff: self.retry_backoff,
        };
        let loop_job_id = job_id.clone();
        tokio::spawn(async move {
            poll_loop.run(loop_job_id, cancel_rx).await;
        });

        Ok(job_id)
    }

    /// Stop polling a job without waiting for a terminal state.
    pub async fn cancel(&self, job_id: &JobId) -> bool {
        self.tracker.cancel(job_id).await
    }

    /// Stop every active poll loop.
    pub async fn shutdown(&self) {
        self.tracker.cancel_all().await;
    }
}

/// State threaded into one job's polling task.
struct PollLoop {
    api: Arc<ApiClient>,
    tracker: Arc<JobTracker>,
    events: broadcast::Sender<JobEvent>,
    poll_interval: Duration,
    retry_backoff: Duration,
}

impl PollLoop {
    /// Poll until a terminal status is observed or the job is
    /// cancelled. Polls for one job are strictly sequential; the next
    /// request is only issued once the previous outcome is known.
    async fn run(self, job_id: JobId, mut cancel: watch::Receiver<bool>) {
        let mut delay = self.poll_interval;
        let mut attempt: u32 = 0;

        loop {
            tokio::select! {
                _ = sleep(delay) => {}
                _ = cancel.changed() => {
                    self.cancelled(&job_id).await;
                    return;
                }
            }

            let outcome = tokio::select! {
                result = self.api.job_status(&job_id) => result,
                _ = cancel.changed() => {
                    self.cancelled(&job_id).await;
                    return;
                }
            };

            match outcome {
                Ok(snapshot) => {
                    attempt = 0;
                    delay = self.poll_interval;
                    if self.observe(&job_id, snapshot).await {
                        return;
                    }
                }
                Err(err) => {
                    // Transient failures never end the loop; back off
                    // and try again.
                    attempt += 1;
                    delay = self.retry_backoff;
                    debug!(
                        job_id = %job_id,
                        attempt,
                        error = %err,
                        "Status poll failed; backing off"
                    );
                    let _ = self.events.send(JobEvent::PollRetried {
                        job_id: job_id.clone(),
                        attempt,
                    });
                }
            }
        }
    }

    /// Record one status observation. Returns true when the loop must
    /// stop.
    async fn observe(&self, job_id: &JobId, snapshot: DownloadJob) -> bool {
        let status = snapshot.status;
        let progress = snapshot.progress;
        let result = snapshot.result.clone();
        let error = snapshot.error.clone();

        if let Err(err) = self.tracker.update(snapshot).await {
            warn!(job_id = %job_id, error = %err, "Dropping poll result");
            if self.tracker.finish(job_id).await {
                let _ = self.events.send(JobEvent::Failed {
                    job_id: job_id.clone(),
                    error: err.to_string(),
                });
            }
            return true;
        }

        let _ = self.events.send(JobEvent::StatusChanged {
            job_id: job_id.clone(),
            status,
            progress,
        });

        // Termination depends solely on status, never on progress.
        if !status.is_terminal() {
            return false;
        }

        // finish() is idempotent; a second terminal observation can
        // neither double-remove nor re-notify.
        if self.tracker.finish(job_id).await {
            match status {
                JobStatus::Completed => {
                    info!(job_id = %job_id, "Download completed");
                    let _ = self.events.send(JobEvent::Completed {
                        job_id: job_id.clone(),
                        result,
                    });
                }
                JobStatus::Failed => {
                    let message = error.unwrap_or_else(|| "unknown failure".to_string());
                    warn!(job_id = %job_id, error = %message, "Download failed");
                    let _ = self.events.send(JobEvent::Failed {
                        job_id: job_id.clone(),
                        error: message,
                    });
                }
                JobStatus::Queued | JobStatus::Processing => {}
            }
        }
        true
    }

    async fn cancelled(&self, job_id: &JobId) {
        if self.tracker.finish(job_id).await {
            info!(job_id = %job_id, "Polling cancelled");
        }
    }
}

//! Shared job state: latest snapshots plus the active-polling set.

use downlink_core::job::{DownloadJob, JobStatus};
use downlink_core::{Error, JobId, Result};
use std::collections::HashMap;
use tokio::sync::{RwLock, watch};

/// Latest known snapshot per job, plus the set of jobs still being
/// polled.
///
/// Snapshots are replaced wholesale so readers never observe a
/// partially updated record. Snapshots of finished jobs stay readable;
/// only the active entry is removed, and removal is idempotent.
#[derive(Default)]
pub struct JobTracker {
    jobs: RwLock<HashMap<JobId, DownloadJob>>,
    active: RwLock<HashMap<JobId, watch::Sender<bool>>>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest snapshot for a job, if one was ever recorded.
    pub async fn snapshot(&self, job_id: &JobId) -> Option<DownloadJob> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// Latest snapshot of every known job.
    pub async fn snapshots(&self) -> Vec<DownloadJob> {
        self.jobs.read().await.values().cloned().collect()
    }

    pub async fn is_active(&self, job_id: &JobId) -> bool {
        self.active.read().await.contains_key(job_id)
    }

    pub async fn active_count(&self) -> usize {
        self.active.read().await.len()
    }

    /// Signal a job's poll loop to stop. Idempotent; false when the job
    /// is not being polled.
    pub async fn cancel(&self, job_id: &JobId) -> bool {
        match self.active.read().await.get(job_id) {
            Some(tx) => tx.send(true).is_ok(),
            None => false,
        }
    }

    /// Signal every active poll loop to stop.
    pub async fn cancel_all(&self) {
        for tx in self.active.read().await.values() {
            let _ = tx.send(true);
        }
    }

    /// Admit a job to the active set, returning the cancellation
    /// receiver its poll loop watches.
    pub(crate) async fn admit(&self, job_id: JobId) -> watch::Receiver<bool> {
        let (tx, rx) = watch::channel(false);
        self.active.write().await.insert(job_id, tx);
        rx
    }

    /// Validate and record a new snapshot, replacing the previous one
    /// wholesale. The previous status must permit the transition.
    pub(crate) async fn update(&self, job: DownloadJob) -> Result<JobStatus> {
        let mut jobs = self.jobs.write().await;
        if let Some(previous) = jobs.get(&job.job_id) {
            if !previous.status.can_transition_to(job.status) {
                return Err(Error::InvalidTransition {
                    from: previous.status.to_string(),
                    to: job.status.to_string(),
                });
            }
        }
        let status = job.status;
        jobs.insert(job.job_id.clone(), job);
        Ok(status)
    }

    /// Record the initial snapshot for a freshly started job.
    pub(crate) async fn insert(&self, job: DownloadJob) {
        self.jobs.write().await.insert(job.job_id.clone(), job);
    }

    /// Remove a job from the active set. Returns false when it was
    /// already gone, so terminal observations notify at most once.
    pub(crate) async fn finish(&self, job_id: &JobId) -> bool {
        self.active.write().await.remove(job_id).is_some()
    }
}

//! Download job types and lifecycle.

use crate::ids::{FileId, JobId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a download job as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    ///
    /// The order is monotonic: Queued -> Processing -> {Completed, Failed}.
    /// A poll may observe the same status twice, and a fast job may skip
    /// Processing entirely. Terminal states permit no exit.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        match (self, next) {
            (a, b) if *a == b => true,
            (Queued, Processing | Completed | Failed) => true,
            (Processing, Completed | Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Payload attached to a completed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub file_id: FileId,
    pub status: JobStatus,
    #[serde(rename = "downloadUrl", skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(rename = "processingTimeMs")]
    pub processing_time_ms: u64,
    #[serde(default)]
    pub message: String,
}

/// One job's latest snapshot as returned by the status endpoint.
///
/// Field names follow the backend's wire format: camelCase for
/// job-tracking fields, snake_case for `file_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadJob {
    #[serde(rename = "jobId")]
    pub job_id: JobId,
    pub status: JobStatus,
    pub file_id: FileId,
    /// Epoch milliseconds.
    #[serde(rename = "startTime")]
    pub start_time: i64,
    #[serde(rename = "endTime", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(rename = "processingTimeMs", skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
    /// 0-100 while processing. Informational only; never drives the
    /// poll loop's termination.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    /// Present iff the job completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    /// Present iff the job failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DownloadJob {
    /// Initial snapshot for a job the backend just accepted.
    pub fn queued(job_id: JobId, file_id: FileId, start_time: i64) -> Self {
        Self {
            job_id,
            status: JobStatus::Queued,
            file_id,
            start_time,
            end_time: None,
            processing_time_ms: None,
            progress: None,
            result: None,
            error: None,
        }
    }
}

/// Response to a start request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartedJob {
    #[serde(rename = "jobId")]
    pub job_id: JobId,
    pub status: JobStatus,
    pub file_id: FileId,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "statusUrl", default)]
    pub status_url: String,
}

/// Response to an availability probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAvailability {
    pub file_id: FileId,
    pub available: bool,
    #[serde(rename = "s3Key", skip_serializing_if = "Option::is_none")]
    pub s3_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Backend health report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthState,
    pub checks: HealthChecks,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        matches!(self.status, HealthState::Healthy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthChecks {
    pub storage: CheckState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Ok,
    Error,
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckState::Ok => write!(f, "ok"),
            CheckState::Error => write!(f, "error"),
        }
    }
}

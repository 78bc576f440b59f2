//! Job lifecycle events emitted by the poller.

use crate::ids::{FileId, JobId};
use crate::job::{JobResult, JobStatus};
use serde::{Deserialize, Serialize};

/// Events published on the poller's broadcast channel.
///
/// Consumers (a dashboard, the CLI watch command) subscribe and render;
/// the poller never waits for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// The backend accepted a start request.
    Started { job_id: JobId, file_id: FileId },
    /// A status poll succeeded.
    StatusChanged {
        job_id: JobId,
        status: JobStatus,
        progress: Option<u8>,
    },
    /// A status poll failed and the loop is backing off.
    PollRetried { job_id: JobId, attempt: u32 },
    /// The job reached its terminal success state.
    Completed {
        job_id: JobId,
        result: Option<JobResult>,
    },
    /// The job reached its terminal failure state.
    Failed { job_id: JobId, error: String },
}

impl JobEvent {
    pub fn job_id(&self) -> &JobId {
        match self {
            JobEvent::Started { job_id, .. }
            | JobEvent::StatusChanged { job_id, .. }
            | JobEvent::PollRetried { job_id, .. }
            | JobEvent::Completed { job_id, .. }
            | JobEvent::Failed { job_id, .. } => job_id,
        }
    }
}

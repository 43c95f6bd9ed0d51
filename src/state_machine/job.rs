use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::JobStatus;

/// Snapshot of one job record owned by the service.
///
/// The client never mutates a snapshot's status; it re-fetches instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub job_type: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Present until the upload has been accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// A bare snapshot with only identity, type and status set.
    pub fn new(id: Uuid, job_type: impl Into<String>, status: JobStatus) -> Self {
        Self {
            id,
            job_type: job_type.into(),
            status,
            user_id: None,
            upload_token: None,
            data_size: None,
            claimed_by: None,
            error_code: None,
            error_message: None,
            created_at: None,
            updated_at: None,
            finished_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_failed(&self) -> bool {
        self.status == JobStatus::Failed
    }
}

/// Everything retrievable about a job once it has reached a terminal state.
///
/// Only `job` is guaranteed; output and logs are fetched best-effort and
/// are `None` when the service could not supply them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobResult {
    pub job: Job,
    pub output: Option<Vec<u8>>,
    pub logs: Option<String>,
}

impl JobResult {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            output: None,
            logs: None,
        }
    }

    /// Output bytes, empty when none were retrieved.
    pub fn output_bytes(&self) -> &[u8] {
        self.output.as_deref().unwrap_or_default()
    }

    /// Log text, empty when none was retrieved.
    pub fn logs_text(&self) -> &str {
        self.logs.as_deref().unwrap_or_default()
    }
}

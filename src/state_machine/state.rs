use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a job as reported by the service.
///
/// Jobs are expected to move: CREATED → LOADED → PENDING → CLAIMED →
/// PREPARING → PROCESSING → {FINISHED | FAILED}. Everything between
/// `Loaded` and the terminal pair is driven server-side and may be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Created,
    Loaded,
    Pending,
    Claimed,
    Preparing,
    Processing,
    Finished,
    Failed,
}

impl JobStatus {
    /// Every status in lifecycle order.
    pub const ALL: [JobStatus; 8] = [
        JobStatus::Created,
        JobStatus::Loaded,
        JobStatus::Pending,
        JobStatus::Claimed,
        JobStatus::Preparing,
        JobStatus::Processing,
        JobStatus::Finished,
        JobStatus::Failed,
    ];

    /// True only for `Finished` and `Failed`. The poller stops on exactly this set.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Failed)
    }

    /// Wire name, as used in query strings and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Created => "created",
            JobStatus::Loaded => "loaded",
            JobStatus::Pending => "pending",
            JobStatus::Claimed => "claimed",
            JobStatus::Preparing => "preparing",
            JobStatus::Processing => "processing",
            JobStatus::Finished => "finished",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown job status: {s}"))
    }
}

/// The client-side steps of one orchestrated workflow.
///
/// Each workflow flows through: CREATE → UPLOAD → SUBMIT → WAIT → ASSEMBLE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Create,
    Upload,
    Submit,
    Wait,
    Assemble,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Create => write!(f, "CREATE"),
            Stage::Upload => write!(f, "UPLOAD"),
            Stage::Submit => write!(f, "SUBMIT"),
            Stage::Wait => write!(f, "WAIT"),
            Stage::Assemble => write!(f, "ASSEMBLE"),
        }
    }
}

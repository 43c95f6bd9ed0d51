use std::path::PathBuf;

use thiserror::Error;

use crate::api::ServiceError;
use crate::state_machine::{JobResult, Stage};

/// Failures of an orchestrated workflow, labelled by the step that failed.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to open {}: {source}", .path.display())]
    ResourceOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create job: {0}")]
    Creation(#[source] ServiceError),

    #[error("failed to upload data: {0}")]
    Upload(#[source] ServiceError),

    #[error("failed to submit job: {0}")]
    Submission(#[source] ServiceError),

    #[error("failed to get job status: {0}")]
    StatusFetch(#[source] ServiceError),

    #[error("failed to get job status: unexpected response format: {0}")]
    MalformedResponse(String),

    #[error("failed to get job: {0}")]
    JobFetch(#[source] ServiceError),

    #[error("operation cancelled")]
    Cancelled,

    /// The job reached FAILED. `partial` holds whatever could still be
    /// retrieved about it.
    #[error("job failed{}", describe_failure(.code, .message))]
    RemoteFailure {
        code: Option<String>,
        message: Option<String>,
        partial: Option<Box<JobResult>>,
    },
}

fn describe_failure(code: &Option<String>, message: &Option<String>) -> String {
    match (code, message) {
        (_, Some(message)) => format!(": {message}"),
        (Some(code), None) => format!(" ({code})"),
        (None, None) => String::new(),
    }
}

impl JobError {
    /// The workflow stage this failure belongs to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            JobError::ResourceOpen { .. }
            | JobError::Cancelled
            | JobError::RemoteFailure { .. } => None,
            JobError::Creation(_) => Some(Stage::Create),
            JobError::Upload(_) => Some(Stage::Upload),
            JobError::Submission(_) => Some(Stage::Submit),
            JobError::StatusFetch(_) | JobError::MalformedResponse(_) => Some(Stage::Wait),
            JobError::JobFetch(_) => Some(Stage::Assemble),
        }
    }

    /// What was salvaged from a remotely failed job.
    pub fn partial_result(&self) -> Option<&JobResult> {
        match self {
            JobError::RemoteFailure { partial, .. } => partial.as_deref(),
            _ => None,
        }
    }

    pub fn into_partial_result(self) -> Option<JobResult> {
        match self {
            JobError::RemoteFailure { partial, .. } => partial.map(|p| *p),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, JobError::Cancelled)
    }
}

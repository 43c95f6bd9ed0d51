//! Request and response bodies for the BSUB.IO REST API.
//!
//! Job-bearing endpoints wrap their payload in an [`Envelope`]; the helpers
//! here unwrap it and reject bodies whose `data` is missing.

use serde::{Deserialize, Serialize};

use super::error::ServiceError;
use crate::state_machine::{Job, JobStatus};

/// Body of `POST /v1/jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobRequest {
    #[serde(rename = "type")]
    pub job_type: String,
}

/// Standard `{"data": ..., "success": ...}` wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    pub success: Option<bool>,
}

impl<T> Envelope<T> {
    /// The wrapped payload, or [`ServiceError::Malformed`] when absent.
    pub fn into_data(self) -> Result<T, ServiceError> {
        self.data
            .ok_or_else(|| ServiceError::Malformed("response has no data".into()))
    }
}

/// Body returned by the upload endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub data_size: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Filters for `GET /v1/jobs`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListJobsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
}

/// One page of jobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobList {
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub total: Option<i64>,
}

/// A server-side pipeline that can be named as a job type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingType {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `GET /v1/types`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypesResponse {
    #[serde(default)]
    pub types: Vec<ProcessingType>,
}

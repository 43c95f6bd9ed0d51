pub mod client;
pub mod error;
#[cfg(test)]
pub(crate) mod fake;
pub mod service;
pub mod types;

pub use client::{DEFAULT_BASE_URL, HttpJobService};
pub use error::ServiceError;
pub use service::JobService;
pub use types::{JobList, ListJobsParams, ProcessingType, UploadResponse};

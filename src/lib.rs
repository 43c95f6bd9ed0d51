//! Client library for the BSUB.IO job-processing service.
//!
//! A job goes through create → upload → submit → wait → assemble. The
//! [`JobOrchestrator`] drives that workflow over any [`JobService`];
//! [`HttpJobService`] is the REST implementation.

pub mod api;
pub mod assembler;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod poller;
pub mod state_machine;

pub use api::{HttpJobService, JobService, ServiceError};
pub use config::BsubConfig;
pub use error::JobError;
pub use orchestrator::{JobOrchestrator, Progress};
pub use poller::{DEFAULT_POLL_INTERVAL, cancel_after, wait_until_terminal};
pub use state_machine::{Job, JobResult, JobStatus, Stage};
pub use tokio_util::sync::CancellationToken;

use std::future::Future;

use uuid::Uuid;

use super::error::ServiceError;
use crate::state_machine::Job;

/// The remote operations the orchestrator is built on.
///
/// [`HttpJobService`](super::HttpJobService) talks to the real API; tests
/// substitute an in-memory fake. Implementations hold no per-workflow state
/// and must be safe to share between concurrently running workflows.
/// Each method returns `Err` whenever the service does not report success
/// for that operation.
pub trait JobService: Send + Sync {
    /// Registers a job of the given type. The snapshot carries the upload token.
    fn create_job(
        &self,
        job_type: &str,
    ) -> impl Future<Output = Result<Job, ServiceError>> + Send;

    /// Attaches the payload to a freshly created job.
    fn upload_data(
        &self,
        job_id: Uuid,
        token: &str,
        data: Vec<u8>,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Asks the service to start processing an uploaded job.
    fn submit_job(&self, job_id: Uuid) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Current snapshot of a job.
    fn get_job(&self, job_id: Uuid) -> impl Future<Output = Result<Job, ServiceError>> + Send;

    /// Primary output of a finished job.
    fn get_output(
        &self,
        job_id: Uuid,
    ) -> impl Future<Output = Result<Vec<u8>, ServiceError>> + Send;

    /// Processing logs of a job, in any state.
    fn get_logs(&self, job_id: Uuid) -> impl Future<Output = Result<String, ServiceError>> + Send;
}

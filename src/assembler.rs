//! Gathers a terminal job's snapshot, output and logs into a [`JobResult`].
//!
//! Only the snapshot fetch is mandatory. Output (fetched for FINISHED jobs
//! only) and logs (always fetched) degrade to `None` on any failure,
//! cancellation included: once the snapshot is in hand a result is returned.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::JobService;
use crate::error::JobError;
use crate::poller::cancellable;
use crate::state_machine::{JobResult, JobStatus};

pub async fn assemble_result<S: JobService>(
    service: &S,
    job_id: Uuid,
    cancel: &CancellationToken,
) -> Result<JobResult, JobError> {
    let job = cancellable(cancel, service.get_job(job_id))
        .await?
        .map_err(JobError::JobFetch)?;
    let mut result = JobResult::new(job);

    if result.job.status == JobStatus::Finished {
        match cancellable(cancel, service.get_output(job_id)).await {
            Ok(Ok(output)) => {
                debug!(%job_id, bytes = output.len(), "output retrieved");
                result.output = Some(output);
            }
            Ok(Err(e)) => warn!(%job_id, error = %e, "output unavailable"),
            Err(_) => warn!(%job_id, "output fetch cancelled"),
        }
    }

    match cancellable(cancel, service.get_logs(job_id)).await {
        Ok(Ok(logs)) => result.logs = Some(logs),
        Ok(Err(e)) => debug!(%job_id, error = %e, "logs unavailable"),
        Err(_) => debug!(%job_id, "logs fetch cancelled"),
    }

    Ok(result)
}

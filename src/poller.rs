//! Wait-until-terminal polling and the cancellation plumbing shared by every
//! workflow step.
//!
//! Polling runs at a fixed interval with no backoff. A snapshot that is
//! already terminal on the first fetch returns immediately.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::api::{JobService, ServiceError};
use crate::error::JobError;
use crate::state_machine::Job;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Runs `fut` unless `cancel` fires first.
pub(crate) async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, JobError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(JobError::Cancelled),
        output = fut => Ok(output),
    }
}

/// Cancels `token` once `after` has elapsed. Turns a token into a deadline.
pub fn cancel_after(token: &CancellationToken, after: Duration) -> JoinHandle<()> {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = sleep(after) => token.cancel(),
        }
    })
}

/// Fetches `job_id` every `interval` until its status is terminal.
pub async fn wait_until_terminal<S: JobService>(
    service: &S,
    job_id: Uuid,
    interval: Duration,
    cancel: &CancellationToken,
) -> Result<Job, JobError> {
    wait_until_terminal_with(service, job_id, interval, cancel, |_| {}).await
}

/// Like [`wait_until_terminal`], calling `on_update` with every non-terminal
/// snapshot before sleeping.
pub async fn wait_until_terminal_with<S, F>(
    service: &S,
    job_id: Uuid,
    interval: Duration,
    cancel: &CancellationToken,
    mut on_update: F,
) -> Result<Job, JobError>
where
    S: JobService,
    F: FnMut(&Job),
{
    let mut polls: u32 = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(JobError::Cancelled);
        }

        let job = match cancellable(cancel, service.get_job(job_id)).await? {
            Ok(job) => job,
            Err(ServiceError::Malformed(detail)) => return Err(JobError::MalformedResponse(detail)),
            Err(e) => return Err(JobError::StatusFetch(e)),
        };
        polls += 1;

        if job.is_terminal() {
            debug!(%job_id, status = %job.status, polls, "job reached terminal state");
            return Ok(job);
        }

        debug!(%job_id, status = %job.status, polls, "job still running");
        on_update(&job);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(JobError::Cancelled),
            _ = sleep(interval) => {}
        }
    }
}

use std::path::Path;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::{HttpJobService, JobService, ServiceError};
use crate::assembler::assemble_result;
use crate::config::BsubConfig;
use crate::error::JobError;
use crate::poller::{DEFAULT_POLL_INTERVAL, cancellable, wait_until_terminal_with};
use crate::state_machine::{Job, JobResult, Stage};

/// Progress notifications emitted while a workflow runs.
#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    /// The workflow is entering this stage.
    Stage(Stage),
    /// A non-terminal snapshot observed while waiting.
    Status(&'a Job),
}

/// Drives jobs through create → upload → submit → wait → assemble.
///
/// Holds no per-job state, so one orchestrator can run any number of
/// workflows concurrently; each call gets its own cancellation token.
#[derive(Debug, Clone)]
pub struct JobOrchestrator<S> {
    service: S,
    poll_interval: Duration,
}

impl JobOrchestrator<HttpJobService> {
    /// Orchestrator over the REST API described by `config`.
    pub fn from_config(config: &BsubConfig) -> Result<Self, ServiceError> {
        let service = HttpJobService::new(config)?;
        Ok(Self::new(service).with_poll_interval(config.poll_interval()))
    }
}

impl<S: JobService> JobOrchestrator<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Creates a job, uploads `data` with the issued token and submits it.
    ///
    /// Returns the snapshot from the create step: it identifies the job but
    /// its status is stale by the time this returns.
    pub async fn create_and_submit<R>(
        &self,
        job_type: &str,
        data: R,
        cancel: &CancellationToken,
    ) -> Result<Job, JobError>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.submit_inner(job_type, data, cancel, &mut |_: Progress<'_>| {})
            .await
    }

    /// [`create_and_submit`](Self::create_and_submit) with the contents of a local file.
    ///
    /// Fails with [`JobError::ResourceOpen`] before any remote call if the
    /// file cannot be opened.
    pub async fn create_and_submit_file(
        &self,
        job_type: &str,
        path: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> Result<Job, JobError> {
        let file = open(path.as_ref()).await?;
        self.create_and_submit(job_type, file, cancel).await
    }

    /// Runs the whole workflow and returns the assembled result.
    ///
    /// A job that ends FAILED yields [`JobError::RemoteFailure`] carrying the
    /// remote error and, when it could be fetched, a partial result.
    pub async fn process<R>(
        &self,
        job_type: &str,
        data: R,
        cancel: &CancellationToken,
    ) -> Result<JobResult, JobError>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.process_with(job_type, data, cancel, |_| {}).await
    }

    /// [`process`](Self::process) with the contents of a local file.
    pub async fn process_file(
        &self,
        job_type: &str,
        path: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> Result<JobResult, JobError> {
        self.process_file_with(job_type, path, cancel, |_| {}).await
    }

    /// [`process_file`](Self::process_file), reporting [`Progress`] along the way.
    pub async fn process_file_with<F>(
        &self,
        job_type: &str,
        path: impl AsRef<Path>,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> Result<JobResult, JobError>
    where
        F: FnMut(Progress<'_>) + Send,
    {
        let file = open(path.as_ref()).await?;
        self.process_with(job_type, file, cancel, on_progress).await
    }

    /// [`process`](Self::process), reporting [`Progress`] along the way.
    pub async fn process_with<R, F>(
        &self,
        job_type: &str,
        data: R,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<JobResult, JobError>
    where
        R: AsyncRead + Unpin + Send,
        F: FnMut(Progress<'_>) + Send,
    {
        let job = self
            .submit_inner(job_type, data, cancel, &mut on_progress)
            .await?;

        on_progress(Progress::Stage(Stage::Wait));
        let finished = wait_until_terminal_with(
            &self.service,
            job.id,
            self.poll_interval,
            cancel,
            |snapshot| on_progress(Progress::Status(snapshot)),
        )
        .await?;

        on_progress(Progress::Stage(Stage::Assemble));
        // A terminal snapshot is already in hand; cancellation from here on
        // only costs output and logs.
        let assembled = match assemble_result(&self.service, job.id, cancel).await {
            Err(JobError::Cancelled) => {
                warn!(job_id = %job.id, "cancelled after terminal status, keeping last snapshot");
                Ok(JobResult::new(finished.clone()))
            }
            other => other,
        };

        if finished.is_failed() {
            warn!(
                job_id = %job.id,
                code = finished.error_code.as_deref().unwrap_or("-"),
                "job failed remotely"
            );
            let partial = match assembled {
                Ok(result) => Some(Box::new(result)),
                Err(e) => {
                    debug!(job_id = %job.id, error = %e, "no partial result for failed job");
                    None
                }
            };
            return Err(JobError::RemoteFailure {
                code: finished.error_code,
                message: finished.error_message,
                partial,
            });
        }

        let result = assembled?;
        info!(job_id = %job.id, status = %result.job.status, "job complete");
        Ok(result)
    }

    /// Polls `job_id` at this orchestrator's interval until it is terminal.
    pub async fn wait_until_terminal(
        &self,
        job_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Job, JobError> {
        wait_until_terminal_with(&self.service, job_id, self.poll_interval, cancel, |_| {}).await
    }

    /// Collects snapshot, output and logs of `job_id`.
    pub async fn assemble_result(
        &self,
        job_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<JobResult, JobError> {
        assemble_result(&self.service, job_id, cancel).await
    }

    async fn submit_inner<R, F>(
        &self,
        job_type: &str,
        mut data: R,
        cancel: &CancellationToken,
        on_progress: &mut F,
    ) -> Result<Job, JobError>
    where
        R: AsyncRead + Unpin + Send,
        F: FnMut(Progress<'_>) + Send,
    {
        on_progress(Progress::Stage(Stage::Create));
        let job = cancellable(cancel, self.service.create_job(job_type))
            .await?
            .map_err(JobError::Creation)?;
        let token = job.upload_token.clone().ok_or_else(|| {
            JobError::Creation(ServiceError::Malformed("no upload token in response".into()))
        })?;
        info!(job_id = %job.id, job_type, "job created");

        on_progress(Progress::Stage(Stage::Upload));
        let mut payload = Vec::new();
        cancellable(cancel, data.read_to_end(&mut payload))
            .await?
            .map_err(|e| JobError::Upload(ServiceError::Io(e)))?;
        let size = payload.len();
        cancellable(cancel, self.service.upload_data(job.id, &token, payload))
            .await?
            .map_err(JobError::Upload)?;
        debug!(job_id = %job.id, size, "data uploaded");

        on_progress(Progress::Stage(Stage::Submit));
        cancellable(cancel, self.service.submit_job(job.id))
            .await?
            .map_err(JobError::Submission)?;
        info!(job_id = %job.id, "job submitted");

        Ok(job)
    }
}

async fn open(path: &Path) -> Result<File, JobError> {
    File::open(path).await.map_err(|source| JobError::ResourceOpen {
        path: path.to_path_buf(),
        source,
    })
}

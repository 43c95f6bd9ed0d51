//! In-memory [`JobService`] used by the unit tests.
//!
//! Simulates the service's job table behind a `RwLock` and records every
//! call so tests can assert on ordering and on the absence of calls.
//!
//! Job types with scripted behaviour:
//! - `test/linecount`: finishes on submit; output is the payload's line count.
//! - `test/slow`: advances PENDING → PROCESSING → FINISHED, one step per fetch.
//! - `test/stuck`: stays PROCESSING forever.
//! - `test/fail`: fails on submit with `PROCESSING_ERROR`.
//! - anything else: finishes on submit with `mock output`.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::error::ServiceError;
use super::service::JobService;
use crate::state_machine::{Job, JobStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Op {
    Create,
    Upload,
    Submit,
    GetJob,
    GetOutput,
    GetLogs,
}

struct StoredJob {
    job: Job,
    data: Vec<u8>,
    output: Option<Vec<u8>>,
}

#[derive(Default)]
pub(crate) struct FakeJobService {
    jobs: RwLock<HashMap<Uuid, StoredJob>>,
    calls: Mutex<Vec<Op>>,
    failing: HashSet<Op>,
    malformed: HashSet<Op>,
    logs_unavailable: bool,
    output_unavailable: bool,
}

impl FakeJobService {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every call to `op` answers with HTTP 500.
    pub(crate) fn failing(mut self, op: Op) -> Self {
        self.failing.insert(op);
        self
    }

    /// Every call to `op` answers 200 with a body missing its payload.
    pub(crate) fn malformed(mut self, op: Op) -> Self {
        self.malformed.insert(op);
        self
    }

    pub(crate) fn without_logs(mut self) -> Self {
        self.logs_unavailable = true;
        self
    }

    pub(crate) fn without_output(mut self) -> Self {
        self.output_unavailable = true;
        self
    }

    /// Seeds a job directly into the table.
    pub(crate) fn insert(&self, job: Job) -> Uuid {
        self.store(job, None)
    }

    /// Seeds a job whose output endpoint serves `output`.
    pub(crate) fn insert_with_output(&self, job: Job, output: &[u8]) -> Uuid {
        self.store(job, Some(output.to_vec()))
    }

    fn store(&self, job: Job, output: Option<Vec<u8>>) -> Uuid {
        let id = job.id;
        self.jobs.write().unwrap().insert(
            id,
            StoredJob {
                job,
                data: Vec::new(),
                output,
            },
        );
        id
    }

    pub(crate) fn calls(&self) -> Vec<Op> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, op: Op) -> usize {
        self.calls().iter().filter(|&&c| c == op).count()
    }

    pub(crate) fn job(&self, id: Uuid) -> Option<Job> {
        self.jobs.read().unwrap().get(&id).map(|s| s.job.clone())
    }

    pub(crate) fn uploaded(&self, id: Uuid) -> Option<Vec<u8>> {
        self.jobs.read().unwrap().get(&id).map(|s| s.data.clone())
    }

    /// Creates, uploads and submits a job, returning its id.
    pub(crate) async fn start(&self, job_type: &str, data: &[u8]) -> Uuid {
        let job = self.create_job(job_type).await.unwrap();
        let token = job.upload_token.clone().unwrap();
        self.upload_data(job.id, &token, data.to_vec()).await.unwrap();
        self.submit_job(job.id).await.unwrap();
        job.id
    }

    fn record(&self, op: Op) -> Result<(), ServiceError> {
        self.calls.lock().unwrap().push(op);
        if self.failing.contains(&op) {
            return Err(ServiceError::unexpected_status(500, "injected failure"));
        }
        if self.malformed.contains(&op) {
            return Err(ServiceError::Malformed("response has no data".into()));
        }
        Ok(())
    }
}

fn not_found(what: &str) -> ServiceError {
    ServiceError::unexpected_status(404, format!("{what} not found"))
}

/// Newline-delimited line count; a trailing partial line counts, a trailing
/// newline does not add one.
pub(crate) fn count_lines(data: &[u8]) -> usize {
    let newlines = data.iter().filter(|&&b| b == b'\n').count();
    match data.last() {
        Some(b'\n') | None => newlines,
        Some(_) => newlines + 1,
    }
}

fn finish(stored: &mut StoredJob, output: Vec<u8>) {
    let now = Utc::now();
    stored.job.status = JobStatus::Finished;
    stored.job.finished_at = Some(now);
    stored.job.updated_at = Some(now);
    stored.output = Some(output);
}

impl JobService for FakeJobService {
    async fn create_job(&self, job_type: &str) -> Result<Job, ServiceError> {
        self.record(Op::Create)?;
        let now = Utc::now();
        let mut job = Job::new(Uuid::new_v4(), job_type, JobStatus::Created);
        job.user_id = Some("test-user-id".into());
        job.upload_token = Some(Uuid::new_v4().to_string());
        job.data_size = Some(0);
        job.created_at = Some(now);
        job.updated_at = Some(now);
        self.insert(job.clone());
        Ok(job)
    }

    async fn upload_data(
        &self,
        job_id: Uuid,
        token: &str,
        data: Vec<u8>,
    ) -> Result<(), ServiceError> {
        self.record(Op::Upload)?;
        let mut jobs = self.jobs.write().unwrap();
        let stored = jobs.get_mut(&job_id).ok_or_else(|| not_found("Job"))?;
        if stored.job.status != JobStatus::Created
            || stored.job.upload_token.as_deref() != Some(token)
        {
            return Err(ServiceError::unexpected_status(403, "invalid upload token"));
        }
        stored.job.status = JobStatus::Loaded;
        stored.job.data_size = Some(data.len() as i64);
        stored.job.upload_token = None;
        stored.job.updated_at = Some(Utc::now());
        stored.data = data;
        Ok(())
    }

    async fn submit_job(&self, job_id: Uuid) -> Result<(), ServiceError> {
        self.record(Op::Submit)?;
        let mut jobs = self.jobs.write().unwrap();
        let stored = jobs.get_mut(&job_id).ok_or_else(|| not_found("Job"))?;
        if stored.job.status != JobStatus::Loaded {
            return Err(ServiceError::unexpected_status(409, "job has no data"));
        }
        stored.job.updated_at = Some(Utc::now());
        let job_type = stored.job.job_type.clone();
        match job_type.as_str() {
            "test/linecount" => {
                let lines = count_lines(&stored.data).to_string().into_bytes();
                finish(stored, lines);
            }
            "test/slow" => stored.job.status = JobStatus::Pending,
            "test/stuck" => stored.job.status = JobStatus::Processing,
            "test/fail" => {
                stored.job.status = JobStatus::Failed;
                stored.job.error_code = Some("PROCESSING_ERROR".into());
                stored.job.error_message = Some("Failed to process file".into());
                stored.job.finished_at = Some(Utc::now());
            }
            _ => finish(stored, b"mock output".to_vec()),
        }
        Ok(())
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        self.record(Op::GetJob)?;
        let mut jobs = self.jobs.write().unwrap();
        let stored = jobs.get_mut(&job_id).ok_or_else(|| not_found("Job"))?;
        if stored.job.job_type == "test/slow" {
            let status = stored.job.status;
            match status {
                JobStatus::Pending => stored.job.status = JobStatus::Processing,
                JobStatus::Processing => finish(stored, b"mock output".to_vec()),
                _ => {}
            }
        }
        Ok(stored.job.clone())
    }

    async fn get_output(&self, job_id: Uuid) -> Result<Vec<u8>, ServiceError> {
        self.record(Op::GetOutput)?;
        if self.output_unavailable {
            return Err(not_found("Output"));
        }
        let jobs = self.jobs.read().unwrap();
        jobs.get(&job_id)
            .filter(|s| s.job.status == JobStatus::Finished)
            .and_then(|s| s.output.clone())
            .ok_or_else(|| not_found("Output"))
    }

    async fn get_logs(&self, job_id: Uuid) -> Result<String, ServiceError> {
        self.record(Op::GetLogs)?;
        if self.logs_unavailable {
            return Err(not_found("Logs"));
        }
        let jobs = self.jobs.read().unwrap();
        let stored = jobs.get(&job_id).ok_or_else(|| not_found("Logs"))?;
        let job = &stored.job;
        Ok(match &job.error_message {
            Some(message) => format!("Processing {} job\nError: {message}", job.job_type),
            None => format!("Processing {} job\nCompleted successfully", job.job_type),
        })
    }
}

/// A [`FakeJobService`] that cancels `cancel` right after every successful
/// status fetch, so the token fires with a fresh snapshot in the caller's hands.
pub(crate) struct CancelOnFetch {
    pub(crate) inner: FakeJobService,
    pub(crate) cancel: CancellationToken,
}

impl JobService for CancelOnFetch {
    async fn create_job(&self, job_type: &str) -> Result<Job, ServiceError> {
        self.inner.create_job(job_type).await
    }

    async fn upload_data(
        &self,
        job_id: Uuid,
        token: &str,
        data: Vec<u8>,
    ) -> Result<(), ServiceError> {
        self.inner.upload_data(job_id, token, data).await
    }

    async fn submit_job(&self, job_id: Uuid) -> Result<(), ServiceError> {
        self.inner.submit_job(job_id).await
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        let job = self.inner.get_job(job_id).await?;
        self.cancel.cancel();
        Ok(job)
    }

    async fn get_output(&self, job_id: Uuid) -> Result<Vec<u8>, ServiceError> {
        self.inner.get_output(job_id).await
    }

    async fn get_logs(&self, job_id: Uuid) -> Result<String, ServiceError> {
        self.inner.get_logs(job_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_count_rules() {
        assert_eq!(count_lines(b""), 0);
        assert_eq!(count_lines(b"one"), 1);
        assert_eq!(count_lines(b"one\n"), 1);
        assert_eq!(count_lines(b"line1\nline2\nline3\nline4\nline5"), 5);
        assert_eq!(count_lines(b"line1\nline2\nline3\nline4\nline5\n"), 5);
        assert_eq!(count_lines(b"\n\n"), 2);
    }

    #[tokio::test]
    async fn upload_token_is_single_use() {
        let fake = FakeJobService::new();
        let job = fake.create_job("pandoc_md").await.unwrap();
        let token = job.upload_token.clone().unwrap();

        fake.upload_data(job.id, &token, b"data".to_vec()).await.unwrap();
        let err = fake
            .upload_data(job.id, &token, b"again".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UnexpectedStatus { status: 403, .. }));
        assert_eq!(fake.uploaded(job.id).unwrap(), b"data");
    }

    #[tokio::test]
    async fn slow_job_advances_per_fetch() {
        let fake = FakeJobService::new();
        let job = fake.create_job("test/slow").await.unwrap();
        let token = job.upload_token.clone().unwrap();
        fake.upload_data(job.id, &token, b"x".to_vec()).await.unwrap();
        fake.submit_job(job.id).await.unwrap();

        assert_eq!(fake.get_job(job.id).await.unwrap().status, JobStatus::Processing);
        assert_eq!(fake.get_job(job.id).await.unwrap().status, JobStatus::Finished);
        assert_eq!(fake.get_job(job.id).await.unwrap().status, JobStatus::Finished);
    }
}

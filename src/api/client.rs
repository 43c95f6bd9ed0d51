use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use super::error::ServiceError;
use super::service::JobService;
use super::types::{
    CreateJobRequest, Envelope, JobList, ListJobsParams, ProcessingType, TypesResponse,
    UploadResponse,
};
use crate::config::BsubConfig;
use crate::state_machine::Job;

pub const DEFAULT_BASE_URL: &str = "https://app.bsub.io";

/// [`JobService`] over the BSUB.IO REST API.
///
/// Cloning is cheap; clones share one connection pool and one credential.
#[derive(Debug, Clone)]
pub struct HttpJobService {
    client: Client,
    base_url: String,
}

impl HttpJobService {
    /// Builds a client that sends `Authorization: Bearer <api_key>` on every request.
    pub fn new(config: &BsubConfig) -> Result<Self, ServiceError> {
        if config.api_key.is_empty() {
            return Err(ServiceError::Config("API key is required".into()));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|e| ServiceError::Config(format!("invalid API key: {e}")))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let base_url = if config.base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            config.base_url.as_str()
        };
        Ok(Self::with_client(base_url, client))
    }

    /// Wraps a pre-configured `reqwest::Client`. Authentication is the caller's job.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Uploads `data` as the raw request body with the given content type.
    pub async fn upload_raw(
        &self,
        job_id: Uuid,
        token: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<UploadResponse, ServiceError> {
        let response = self
            .client
            .post(self.upload_url(job_id))
            .query(&[("token", token)])
            .header(CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;
        let response = expect_status(response, StatusCode::OK).await?;
        parse_json::<UploadResponse>(response).await
    }

    /// One page of the caller's jobs.
    pub async fn list_jobs(&self, params: &ListJobsParams) -> Result<JobList, ServiceError> {
        let response = self
            .client
            .get(format!("{}/v1/jobs", self.base_url))
            .query(params)
            .send()
            .await?;
        let response = expect_status(response, StatusCode::OK).await?;
        parse_json::<Envelope<JobList>>(response).await?.into_data()
    }

    /// Job types the service can run.
    pub async fn get_types(&self) -> Result<Vec<ProcessingType>, ServiceError> {
        let response = self
            .client
            .get(format!("{}/v1/types", self.base_url))
            .send()
            .await?;
        let response = expect_status(response, StatusCode::OK).await?;
        Ok(parse_json::<TypesResponse>(response).await?.types)
    }

    fn job_url(&self, job_id: Uuid) -> String {
        format!("{}/v1/jobs/{}", self.base_url, job_id)
    }

    fn upload_url(&self, job_id: Uuid) -> String {
        format!("{}/v1/upload/{}", self.base_url, job_id)
    }
}

impl JobService for HttpJobService {
    async fn create_job(&self, job_type: &str) -> Result<Job, ServiceError> {
        let response = self
            .client
            .post(format!("{}/v1/jobs", self.base_url))
            .json(&CreateJobRequest {
                job_type: job_type.to_string(),
            })
            .send()
            .await?;
        let response = expect_status(response, StatusCode::CREATED).await?;
        parse_json::<Envelope<Job>>(response).await?.into_data()
    }

    async fn upload_data(
        &self,
        job_id: Uuid,
        token: &str,
        data: Vec<u8>,
    ) -> Result<(), ServiceError> {
        let size = data.len();
        let part = Part::bytes(data)
            .file_name("upload")
            .mime_str("application/octet-stream")?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.upload_url(job_id))
            .query(&[("token", token)])
            .multipart(form)
            .send()
            .await?;
        expect_status(response, StatusCode::OK).await?;
        debug!(%job_id, size, "payload uploaded");
        Ok(())
    }

    async fn submit_job(&self, job_id: Uuid) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(format!("{}/submit", self.job_url(job_id)))
            .send()
            .await?;
        expect_status(response, StatusCode::OK).await?;
        Ok(())
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        let response = self.client.get(self.job_url(job_id)).send().await?;
        let response = expect_status(response, StatusCode::OK).await?;
        parse_json::<Envelope<Job>>(response).await?.into_data()
    }

    async fn get_output(&self, job_id: Uuid) -> Result<Vec<u8>, ServiceError> {
        let response = self
            .client
            .get(format!("{}/output", self.job_url(job_id)))
            .send()
            .await?;
        let response = expect_status(response, StatusCode::OK).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn get_logs(&self, job_id: Uuid) -> Result<String, ServiceError> {
        let response = self
            .client
            .get(format!("{}/logs", self.job_url(job_id)))
            .send()
            .await?;
        let response = expect_status(response, StatusCode::OK).await?;
        Ok(response.text().await?)
    }
}

/// Passes the response through only when it carries exactly `expected`.
async fn expect_status(response: Response, expected: StatusCode) -> Result<Response, ServiceError> {
    let status = response.status();
    if status == expected {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    Err(ServiceError::unexpected_status(status.as_u16(), message.trim()))
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ServiceError::Malformed(e.to_string()))
}

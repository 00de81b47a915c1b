//! HTTP media processing backend.

use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;

use super::MediaBackend;
use crate::TRACING_TARGET;
use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult};
use crate::job::{JobHandle, JobState, MediaOperation};

/// HTTP client for an assembly-style media processing service.
///
/// Operations are submitted as JSON to the service's `jobs` endpoint; the
/// response carries a job id and a status URL that is polled until the job
/// reaches a terminal state.
#[derive(Debug, Clone)]
pub struct HttpMediaBackend {
    http_client: Client,
    config: MediaConfig,
}

impl HttpMediaBackend {
    /// Creates a new backend with the given configuration.
    pub fn new(config: MediaConfig) -> MediaResult<Self> {
        let mut client_builder = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent());

        if let Some(api_key) = config.api_key() {
            let mut headers = reqwest::header::HeaderMap::new();
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| MediaError::Config(format!("invalid API key: {}", e)))?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
            client_builder = client_builder.default_headers(headers);
        }

        let http_client = client_builder.build()?;

        tracing::debug!(
            target: TRACING_TARGET,
            base_url = %config.base_url(),
            timeout = ?config.timeout(),
            "Media backend initialized"
        );

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Returns a reference to the client configuration.
    pub fn config(&self) -> &MediaConfig {
        &self.config
    }
}

/// Response to a job submission.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    id: String,
    status_url: String,
}

#[async_trait::async_trait]
impl MediaBackend for HttpMediaBackend {
    async fn fetch(&self, url: &str) -> MediaResult<Bytes> {
        let response = self.http_client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?)
    }

    async fn submit(&self, operation: &MediaOperation) -> MediaResult<JobHandle> {
        tracing::debug!(
            target: TRACING_TARGET,
            operation = operation.name(),
            "Submitting processing job"
        );

        let response = self
            .http_client
            .post(self.config.jobs_url()?)
            .json(operation)
            .send()
            .await?
            .error_for_status()?;

        let submitted: SubmitResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Backend(format!("malformed submit response: {}", e)))?;

        tracing::debug!(
            target: TRACING_TARGET,
            operation = operation.name(),
            job_id = %submitted.id,
            "Processing job accepted"
        );

        Ok(JobHandle {
            id: submitted.id,
            status_url: submitted.status_url,
        })
    }

    async fn status(&self, handle: &JobHandle) -> MediaResult<JobState> {
        let response = self
            .http_client
            .get(&handle.status_url)
            .send()
            .await?
            .error_for_status()?;

        response
            .json()
            .await
            .map_err(|e| MediaError::Backend(format!("malformed status response: {}", e)))
    }
}

//! REST client for the remote job service.
//!
//! Wraps the two endpoints every capability exposes (`POST /tasks/{kind}`
//! and `GET /tasks/{task_id}`) using [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;
use reelsmith_core::media_url::normalize_optional;
use serde::Deserialize;

use crate::capability::RemoteCapability;
use crate::job::{JobHandle, JobKind, JobQuery, JobStatus};

/// Timeout for a single submission request.
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for a single status query.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the remote job service.
#[derive(Clone)]
pub struct RemoteJobClient {
    client: reqwest::Client,
    base_url: String,
}

/// Response returned by `POST /tasks/{kind}` after queuing a job.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Response returned by `GET /tasks/{task_id}`.
#[derive(Debug, Default, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    audio_url: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    output: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Errors from the remote job REST layer.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Remote API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx response whose body did not match the contract.
    #[error("Malformed remote response: {0}")]
    MalformedResponse(String),
}

impl RemoteJobClient {
    /// Create a client for the service at `base_url`, e.g.
    /// `http://media-jobs:8080`. A trailing slash is ignored.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_status(&self, handle: &JobHandle) -> Result<StatusResponse, RemoteError> {
        let response = self
            .client
            .get(format!("{}/tasks/{}", self.base_url, handle.id))
            .timeout(QUERY_TIMEOUT)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`RemoteError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RemoteError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RemoteError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| RemoteError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl RemoteCapability for RemoteJobClient {
    async fn submit(
        &self,
        kind: JobKind,
        params: &serde_json::Value,
    ) -> Result<JobHandle, RemoteError> {
        let response = self
            .client
            .post(format!("{}/tasks/{}", self.base_url, kind.path()))
            .json(params)
            .timeout(SUBMIT_TIMEOUT)
            .send()
            .await?;

        let body: SubmitResponse = Self::parse_response(response).await?;
        let id = body
            .task_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| RemoteError::MalformedResponse("missing task_id".into()))?;

        tracing::debug!(
            kind = %kind,
            job_id = %id,
            status = body.status.as_deref().unwrap_or("unknown"),
            "Remote job submitted",
        );

        Ok(JobHandle { id, kind })
    }

    async fn query(&self, handle: &JobHandle) -> JobQuery {
        let body = match self.fetch_status(handle).await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(
                    kind = %handle.kind,
                    job_id = %handle.id,
                    error = %e,
                    "Status query failed, reporting unknown",
                );
                return JobQuery::unknown();
            }
        };

        let status = body
            .status
            .as_deref()
            .map(JobStatus::parse)
            .unwrap_or(JobStatus::Unknown);

        let raw_url = body
            .video_url
            .as_deref()
            .or(body.audio_url.as_deref())
            .or(body.image_url.as_deref());

        JobQuery {
            status,
            result_url: normalize_optional(raw_url),
            output: body.output.filter(|o| !o.is_null()),
            error: body.error.filter(|e| !e.trim().is_empty()),
        }
    }
}

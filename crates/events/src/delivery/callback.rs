//! Terminal-outcome callbacks to the downstream consumer.
//!
//! [`CallbackNotifier`] POSTs a form-encoded payload to the callback URL
//! carried by the task. Exactly one attempt is made; the outcome is
//! returned as a bool and logged, never raised.

use std::time::Duration;

use async_trait::async_trait;
use reelsmith_core::descriptor::TaskDescriptor;
use serde::Serialize;

/// Default timeout for a callback request.
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Default `User-Agent` sent with callbacks.
pub const DEFAULT_USER_AGENT: &str = concat!("reelsmith-worker/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Form fields sent when a run completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuccessPayload {
    pub video_url: String,
    pub video_id: String,
    pub chat_id: String,
    pub user_id: String,
    pub status: &'static str,
}

impl SuccessPayload {
    pub fn new(descriptor: &TaskDescriptor, video_url: impl Into<String>) -> Self {
        Self {
            video_url: video_url.into(),
            video_id: descriptor.content_id.clone(),
            chat_id: descriptor.conversation_id.clone().unwrap_or_default(),
            user_id: descriptor.owner_id.clone(),
            status: "completed",
        }
    }
}

/// Form fields sent when a run fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailurePayload {
    pub error: String,
    pub video_id: String,
    pub chat_id: String,
    pub user_id: String,
    pub status: &'static str,
}

impl FailurePayload {
    pub fn new(descriptor: &TaskDescriptor, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            video_id: descriptor.content_id.clone(),
            chat_id: descriptor.conversation_id.clone().unwrap_or_default(),
            user_id: descriptor.owner_id.clone(),
            status: "failed",
        }
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for callback delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The consumer returned a non-2xx status code.
    #[error("Callback returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Delivers the terminal outcome of a run. Implementations never panic
/// or error; they report whether the consumer accepted the notification.
#[async_trait]
pub trait TerminalNotifier: Send + Sync {
    async fn notify_success(&self, endpoint: &str, payload: &SuccessPayload) -> bool;

    async fn notify_failure(&self, endpoint: &str, payload: &FailurePayload) -> bool;
}

/// HTTP callback delivery, one attempt per outcome.
pub struct CallbackNotifier {
    client: reqwest::Client,
}

impl CallbackNotifier {
    /// Create a notifier with a bounded request timeout.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, CallbackError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Reuse an existing client; its timeout settings apply.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Execute a single POST request and check the response status.
    async fn try_send<P: Serialize + Sync>(&self, url: &str, payload: &P) -> Result<(), CallbackError> {
        let response = self.client.post(url).form(payload).send().await?;
        if !response.status().is_success() {
            return Err(CallbackError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }

    async fn deliver<P: Serialize + Sync>(&self, url: &str, outcome: &str, payload: &P) -> bool {
        match self.try_send(url, payload).await {
            Ok(()) => {
                tracing::info!(url, outcome, "Callback delivered");
                true
            }
            Err(e) => {
                tracing::error!(url, outcome, error = %e, "Callback delivery failed");
                false
            }
        }
    }
}

#[async_trait]
impl TerminalNotifier for CallbackNotifier {
    async fn notify_success(&self, endpoint: &str, payload: &SuccessPayload) -> bool {
        self.deliver(endpoint, "success", payload).await
    }

    async fn notify_failure(&self, endpoint: &str, payload: &FailurePayload) -> bool {
        self.deliver(endpoint, "failure", payload).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Concrete stage executors backed by remote capabilities.

use std::sync::Arc;
use std::time::Duration;

use reelsmith_remote::{FanOutCoordinator, JobKind, JobResult, PollLoop};

use crate::config::PipelineConfig;
use crate::stage::StageError;

pub mod assembly;
pub mod audio;
pub mod briefs;
pub mod scenes;

/// Shared handles every remote-backed executor needs.
#[derive(Clone)]
pub struct Toolkit {
    pub fanout: FanOutCoordinator,
    pub config: Arc<PipelineConfig>,
}

impl Toolkit {
    pub fn new(poll: PollLoop, config: Arc<PipelineConfig>) -> Self {
        let fanout = FanOutCoordinator::new(poll, config.poll_interval);
        Self { fanout, config }
    }

    pub fn poll(&self) -> &PollLoop {
        self.fanout.poll()
    }

    /// Submit one remote job and wait for it under `deadline`.
    pub async fn run_single(
        &self,
        kind: JobKind,
        params: serde_json::Value,
        deadline: Duration,
    ) -> Result<JobResult, StageError> {
        let poll = self.poll();
        let handle = poll.capability().submit(kind, &params).await?;
        tracing::debug!(kind = %kind, job_id = %handle.id, "Waiting for remote job");
        Ok(poll
            .await_terminal(&handle, self.config.poll_interval, deadline)
            .await?)
    }
}

/// The media URL of a finished job, or an error naming what was expected.
pub(crate) fn require_url(result: JobResult, what: &str) -> Result<String, StageError> {
    result
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| StageError::InvalidOutput(format!("{what} job returned no media URL")))
}

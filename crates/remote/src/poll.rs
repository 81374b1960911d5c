//! Fixed-interval polling of a remote job until it reaches a terminal
//! state or its deadline passes.

use std::sync::Arc;
use std::time::Duration;

use crate::capability::RemoteCapability;
use crate::clock::{Clock, TokioClock};
use crate::job::{JobHandle, JobResult, JobStatus};

/// Lower bound on the poll interval so a zero interval cannot spin.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Error text used when a job fails without saying why.
const UNKNOWN_FAILURE: &str = "remote job failed with unknown error";

/// Why [`PollLoop::await_terminal`] gave up.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PollError {
    /// The remote service reported the job as failed.
    #[error("Remote job {job_id} failed: {message}")]
    Failed { job_id: String, message: String },

    /// The deadline passed before the job reached a terminal state.
    #[error("Remote job {job_id} timed out after {}s ({checks} checks)", elapsed.as_secs())]
    Timeout {
        job_id: String,
        elapsed: Duration,
        checks: u32,
    },

    /// The job reported success but carried neither a URL nor output.
    #[error("Remote job {job_id} completed without a result")]
    EmptyResult { job_id: String },
}

/// Polls remote jobs through a [`RemoteCapability`].
#[derive(Clone)]
pub struct PollLoop {
    capability: Arc<dyn RemoteCapability>,
    clock: Arc<dyn Clock>,
}

impl PollLoop {
    pub fn new(capability: Arc<dyn RemoteCapability>) -> Self {
        Self::with_clock(capability, Arc::new(TokioClock))
    }

    pub fn with_clock(capability: Arc<dyn RemoteCapability>, clock: Arc<dyn Clock>) -> Self {
        Self { capability, clock }
    }

    pub fn capability(&self) -> &Arc<dyn RemoteCapability> {
        &self.capability
    }

    /// Query `handle` every `interval` until it succeeds, fails, or
    /// `deadline` elapses.
    ///
    /// `queued`, `running` and `unknown` all mean "keep waiting". The last
    /// sleep is shortened to the remaining budget, so the call returns no
    /// later than `deadline` plus one query round-trip. With
    /// [`RemoteJobClient`](crate::RemoteJobClient) a round-trip is capped
    /// by its query timeout.
    pub async fn await_terminal(
        &self,
        handle: &JobHandle,
        interval: Duration,
        deadline: Duration,
    ) -> Result<JobResult, PollError> {
        let interval = interval.max(MIN_POLL_INTERVAL);
        let started = self.clock.now();
        let mut checks = 0u32;

        loop {
            checks += 1;
            let query = self.capability.query(handle).await;

            match query.status {
                JobStatus::Success => {
                    if query.result_url.is_none() && query.output.is_none() {
                        return Err(PollError::EmptyResult {
                            job_id: handle.id.clone(),
                        });
                    }
                    tracing::debug!(
                        kind = %handle.kind,
                        job_id = %handle.id,
                        checks,
                        "Remote job succeeded",
                    );
                    return Ok(JobResult {
                        url: query.result_url,
                        output: query.output,
                    });
                }
                JobStatus::Failed => {
                    let message = query.error.unwrap_or_else(|| UNKNOWN_FAILURE.to_string());
                    tracing::warn!(
                        kind = %handle.kind,
                        job_id = %handle.id,
                        error = %message,
                        "Remote job failed",
                    );
                    return Err(PollError::Failed {
                        job_id: handle.id.clone(),
                        message,
                    });
                }
                JobStatus::Queued | JobStatus::Running | JobStatus::Unknown => {}
            }

            let elapsed = self.clock.now().duration_since(started);
            if elapsed >= deadline {
                tracing::warn!(
                    kind = %handle.kind,
                    job_id = %handle.id,
                    elapsed_secs = elapsed.as_secs(),
                    checks,
                    "Remote job timed out",
                );
                return Err(PollError::Timeout {
                    job_id: handle.id.clone(),
                    elapsed,
                    checks,
                });
            }

            self.clock.sleep(interval.min(deadline - elapsed)).await;
        }
    }
}

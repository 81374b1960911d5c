//! The pipeline state machine.
//!
//! A run moves `Pending -> Running(stage) -> Completed | Failed`. Required
//! stage failures end the run; optional ones apply the stage's fallback
//! and the run continues. Whatever happens, the terminal callback is sent
//! exactly once.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reelsmith_core::descriptor::TaskDescriptor;
use reelsmith_core::result::PipelineResult;
use reelsmith_events::{FailurePayload, SuccessPayload, TerminalNotifier};
use tokio::time::Instant;

use crate::context::RunContext;
use crate::progress::{ProgressReporter, ProgressTracker};
use crate::stage::{Stage, StageError, StageFailure, StagePolicy};

/// Default upper bound on a whole run.
pub const DEFAULT_RUN_DEADLINE: Duration = Duration::from_secs(1200);

/// Progress reported before the first stage starts.
const START_PERCENT: u8 = 5;

/// Progress reported while the terminal callback is sent.
const CALLBACK_PERCENT: u8 = 95;

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running { stage: &'static str },
    Completed,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Running { stage } => write!(f, "running({stage})"),
            Self::Completed => f.write_str("completed"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Runs descriptors through an ordered stage list.
pub struct PipelineEngine {
    stages: Vec<Stage>,
    progress: Arc<dyn ProgressReporter>,
    notifier: Arc<dyn TerminalNotifier>,
    run_deadline: Duration,
}

impl PipelineEngine {
    pub fn new(
        stages: Vec<Stage>,
        progress: Arc<dyn ProgressReporter>,
        notifier: Arc<dyn TerminalNotifier>,
    ) -> Self {
        Self {
            stages,
            progress,
            notifier,
            run_deadline: DEFAULT_RUN_DEADLINE,
        }
    }

    pub fn with_run_deadline(mut self, run_deadline: Duration) -> Self {
        self.run_deadline = run_deadline;
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name).collect()
    }

    /// Execute every stage for `descriptor` and deliver the outcome.
    ///
    /// Never returns an error: failures are folded into the returned
    /// [`PipelineResult`] and the failure callback.
    pub async fn run(&self, descriptor: TaskDescriptor) -> PipelineResult {
        let task_id = descriptor.task_id.clone();
        let mut tracker = ProgressTracker::new(self.progress.as_ref(), &task_id);
        let mut state = RunState::Pending;
        tracing::info!(task_id = %task_id, variant = descriptor.variant.as_str(), %state, "Pipeline run starting");

        tracker.report(START_PERCENT, "Starting").await;

        let started = Instant::now();
        let mut ctx = RunContext::new(descriptor);
        let mut failure: Option<StageFailure> = None;

        for stage in &self.stages {
            state = RunState::Running { stage: stage.name };
            tracing::debug!(task_id = %task_id, %state, "Stage starting");
            tracker.report(stage.percent, stage.label).await;

            let remaining = self.run_deadline.saturating_sub(started.elapsed());
            let outcome = if remaining.is_zero() {
                Err(StageError::DeadlineExceeded)
            } else {
                tokio::time::timeout(remaining, stage.executor.execute(&mut ctx))
                    .await
                    .unwrap_or(Err(StageError::DeadlineExceeded))
            };

            let Err(error) = outcome else {
                tracing::debug!(task_id = %task_id, stage = stage.name, "Stage finished");
                continue;
            };

            match stage.policy {
                StagePolicy::Required => {
                    tracing::error!(
                        task_id = %task_id,
                        stage = stage.name,
                        error = %error,
                        "Required stage failed, aborting run",
                    );
                    failure = Some(StageFailure {
                        stage: stage.name,
                        policy: stage.policy,
                        error,
                    });
                    break;
                }
                StagePolicy::Optional { fallback } => {
                    tracing::warn!(
                        task_id = %task_id,
                        stage = stage.name,
                        error = %error,
                        ?fallback,
                        "Optional stage failed, continuing with fallback",
                    );
                    ctx.apply_fallback(fallback);
                }
            }
        }

        let (descriptor, final_cut, artifacts) = ctx.into_parts();
        let mut result = match failure {
            Some(failure) => PipelineResult::failed(task_id.clone(), failure.to_string(), artifacts),
            None => PipelineResult::completed(task_id.clone(), final_cut.unwrap_or_default(), artifacts),
        };

        result.callback_delivered = self.deliver(&descriptor, &result, &mut tracker).await;

        state = if result.is_completed() {
            RunState::Completed
        } else {
            RunState::Failed
        };
        tracing::info!(
            task_id = %task_id,
            %state,
            callback_delivered = result.callback_delivered,
            artifacts = result.artifacts.len(),
            "Pipeline run finished",
        );
        result
    }

    /// Report terminal progress and send the one callback for this run.
    async fn deliver(
        &self,
        descriptor: &TaskDescriptor,
        result: &PipelineResult,
        tracker: &mut ProgressTracker<'_>,
    ) -> bool {
        let callback_url = descriptor.callback_url.as_str();
        if let Some(final_url) = result.final_url.as_deref().filter(|_| result.is_completed()) {
            tracker.report(CALLBACK_PERCENT, "Sending callback").await;
            let payload = SuccessPayload::new(descriptor, final_url);
            let delivered = self.notifier.notify_success(callback_url, &payload).await;
            tracker.report(100, "completed").await;
            delivered
        } else {
            let error = result.error.clone().unwrap_or_default();
            let last = tracker.last();
            tracker.report(last, format!("failed: {error}")).await;
            let payload = FailurePayload::new(descriptor, error);
            self.notifier.notify_failure(callback_url, &payload).await
        }
    }
}

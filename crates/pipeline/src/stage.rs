//! Stage descriptors and the executor seam.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reelsmith_core::error::CoreError;
use reelsmith_remote::{PollError, RemoteError};

use crate::context::RunContext;

/// Placeholder state applied when an optional stage fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Every scene goes without narration.
    SilentVoiceovers,
    /// No music track; mixing is skipped.
    NoMusic,
    /// The current cut stays as it was before the stage.
    KeepCurrentCut,
}

/// Whether a stage failure ends the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePolicy {
    Required,
    Optional { fallback: Fallback },
}

impl StagePolicy {
    pub fn is_required(self) -> bool {
        matches!(self, Self::Required)
    }
}

/// Why a stage did not produce its output.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// The stage ran but its output violated its contract.
    #[error("invalid output: {0}")]
    InvalidOutput(String),

    /// Too few items of a batch succeeded.
    #[error("only {succeeded} of {total} {what} succeeded (need {required})")]
    Shortfall {
        what: &'static str,
        succeeded: usize,
        required: usize,
        total: usize,
    },

    /// An earlier stage left nothing for this one to work on.
    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("submission failed: {0}")]
    Submit(#[from] RemoteError),

    #[error(transparent)]
    Poll(#[from] PollError),

    /// The run deadline passed while the stage was executing.
    #[error("run deadline exceeded")]
    DeadlineExceeded,
}

impl From<CoreError> for StageError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(msg) => Self::InvalidOutput(msg),
        }
    }
}

/// A stage failure as seen by the engine.
#[derive(Debug)]
pub struct StageFailure {
    pub stage: &'static str,
    pub policy: StagePolicy,
    pub error: StageError,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage '{}' failed: {}", self.stage, self.error)
    }
}

/// The work of one stage.
#[async_trait]
pub trait StageExecutor: Send + Sync {
    async fn execute(&self, ctx: &mut RunContext) -> Result<(), StageError>;
}

/// One entry of the engine's ordered stage list.
#[derive(Clone)]
pub struct Stage {
    pub name: &'static str,
    /// Progress label reported when the stage starts.
    pub label: &'static str,
    /// Progress percent reported when the stage starts.
    pub percent: u8,
    pub policy: StagePolicy,
    pub executor: Arc<dyn StageExecutor>,
}

impl Stage {
    pub fn required(
        name: &'static str,
        label: &'static str,
        percent: u8,
        executor: Arc<dyn StageExecutor>,
    ) -> Self {
        Self {
            name,
            label,
            percent,
            policy: StagePolicy::Required,
            executor,
        }
    }

    pub fn optional(
        name: &'static str,
        label: &'static str,
        percent: u8,
        fallback: Fallback,
        executor: Arc<dyn StageExecutor>,
    ) -> Self {
        Self {
            name,
            label,
            percent,
            policy: StagePolicy::Optional { fallback },
            executor,
        }
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("percent", &self.percent)
            .field("policy", &self.policy)
            .finish()
    }
}

//! Terminal record of a pipeline run.

use serde::{Deserialize, Serialize};

use crate::types::TaskId;

/// Outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// An intermediate artifact kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Stage that produced the artifact.
    pub stage: String,
    /// What the artifact is, e.g. `scene_3_image`.
    pub label: String,
    pub url: String,
}

/// Final outcome of a run plus every artifact produced along the way.
///
/// Built only through [`PipelineResult::completed`] and
/// [`PipelineResult::failed`], which keep `completed => final_url` and
/// `failed => error` true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub task_id: TaskId,
    pub status: RunStatus,
    pub final_url: Option<String>,
    pub error: Option<String>,
    pub artifacts: Vec<Artifact>,
    /// Whether the terminal callback was accepted by the consumer.
    pub callback_delivered: bool,
}

impl PipelineResult {
    /// A completed run. A blank `final_url` yields a failed result instead.
    pub fn completed(task_id: TaskId, final_url: String, artifacts: Vec<Artifact>) -> Self {
        if final_url.trim().is_empty() {
            return Self::failed(task_id, "pipeline finished without a final artifact", artifacts);
        }
        Self {
            task_id,
            status: RunStatus::Completed,
            final_url: Some(final_url),
            error: None,
            artifacts,
            callback_delivered: false,
        }
    }

    /// A failed run. A blank error is replaced with a generic description.
    pub fn failed(task_id: TaskId, error: impl Into<String>, artifacts: Vec<Artifact>) -> Self {
        let error = error.into();
        let error = if error.trim().is_empty() {
            "pipeline failed with an unspecified error".to_string()
        } else {
            error
        };
        Self {
            task_id,
            status: RunStatus::Failed,
            final_url: None,
            error: Some(error),
            artifacts,
            callback_delivered: false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Check the status/payload pairing.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            RunStatus::Completed => self.final_url.as_deref().is_some_and(|u| !u.is_empty()),
            RunStatus::Failed => self.error.as_deref().is_some_and(|e| !e.is_empty()),
        }
    }
}

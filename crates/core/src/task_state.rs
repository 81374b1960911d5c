//! Task-state records kept by the task store for status queries.

use serde::{Deserialize, Serialize};

use crate::descriptor::TaskDescriptor;
use crate::result::{PipelineResult, RunStatus};
use crate::types::{TaskId, Timestamp};

/// How long a task record survives after its last update.
pub const TASK_RETENTION_SECS: u64 = 3600;

/// Lifecycle of a queued task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl From<RunStatus> for TaskStatus {
    fn from(value: RunStatus) -> Self {
        match value {
            RunStatus::Completed => Self::Completed,
            RunStatus::Failed => Self::Failed,
        }
    }
}

/// Progress snapshot: percent complete plus a human-readable label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub percent: u8,
    pub label: String,
}

impl Progress {
    /// Clamp a raw percentage into `0..=100`.
    pub fn new(percent: u8, label: impl Into<String>) -> Self {
        Self {
            percent: percent.min(100),
            label: label.into(),
        }
    }
}

/// Everything known about a task, as returned by a status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub descriptor: TaskDescriptor,
    pub progress: Progress,
    pub result: Option<PipelineResult>,
    pub error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub expires_at: Timestamp,
}

/// Outcome of an enqueue call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The task was new and is now queued.
    Enqueued,
    /// A live record for this task id already exists; nothing changed.
    AlreadyPresent,
}

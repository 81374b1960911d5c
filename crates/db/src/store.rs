//! The task queue / task-state seam.

use async_trait::async_trait;
use reelsmith_core::descriptor::TaskDescriptor;
use reelsmith_core::result::PipelineResult;
use reelsmith_core::task_state::{EnqueueOutcome, Progress, TaskRecord, TaskStatus};
use serde::Serialize;

/// Errors from task-state persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No live record exists for the task id.
    #[error("Task not found: {task_id}")]
    NotFound { task_id: String },

    /// A stored row could not be decoded.
    #[error("Corrupt task record: {0}")]
    Corrupt(String),
}

/// Live task counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub queued: u64,
    pub running: u64,
    pub completed: u64,
    pub failed: u64,
}

impl TaskCounts {
    pub fn add(&mut self, status: TaskStatus, n: u64) {
        match status {
            TaskStatus::Queued => self.queued += n,
            TaskStatus::Running => self.running += n,
            TaskStatus::Completed => self.completed += n,
            TaskStatus::Failed => self.failed += n,
        }
    }

    pub fn total(&self) -> u64 {
        self.queued + self.running + self.completed + self.failed
    }
}

/// Shared task queue plus per-task state with bounded retention.
///
/// Records expire a fixed retention window after their last update. An
/// expired record behaves as if it never existed.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Queue a task. Idempotent on the task id: while a live record exists
    /// for the id, this is a no-op returning [`EnqueueOutcome::AlreadyPresent`].
    async fn enqueue(&self, descriptor: &TaskDescriptor) -> Result<EnqueueOutcome, StoreError>;

    /// Atomically move the oldest queued task to `running` and return it.
    async fn claim_next(&self) -> Result<Option<TaskDescriptor>, StoreError>;

    /// Overwrite the progress snapshot of a task.
    async fn record_progress(&self, task_id: &str, progress: &Progress) -> Result<(), StoreError>;

    /// Persist the terminal result of a run.
    async fn finish(&self, result: &PipelineResult) -> Result<(), StoreError>;

    /// Look up a live task record.
    async fn find(&self, task_id: &str) -> Result<Option<TaskRecord>, StoreError>;

    /// Count live records per status.
    async fn counts(&self) -> Result<TaskCounts, StoreError>;

    /// Delete expired records, returning how many were removed.
    async fn purge_expired(&self) -> Result<u64, StoreError>;
}

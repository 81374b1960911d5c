//! Row model for the `pipeline_tasks` table.

use reelsmith_core::descriptor::TaskDescriptor;
use reelsmith_core::result::PipelineResult;
use reelsmith_core::task_state::{Progress, TaskRecord};
use reelsmith_core::types::Timestamp;
use sqlx::FromRow;

use crate::models::status::{StatusId, TaskStatusId};
use crate::store::StoreError;

/// A row from the `pipeline_tasks` table.
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub task_id: String,
    pub status_id: StatusId,
    pub descriptor: serde_json::Value,
    pub brief_preview: String,
    pub progress_percent: i16,
    pub progress_label: String,
    pub result: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub claimed_at: Option<Timestamp>,
    pub expires_at: Timestamp,
}

impl TaskRow {
    /// Decode the JSONB columns into a [`TaskRecord`].
    pub fn into_record(self) -> Result<TaskRecord, StoreError> {
        let status = TaskStatusId::from_id(self.status_id).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "task {} has unknown status_id {}",
                self.task_id, self.status_id
            ))
        })?;
        let descriptor: TaskDescriptor = serde_json::from_value(self.descriptor)?;
        let result: Option<PipelineResult> = self.result.map(serde_json::from_value).transpose()?;

        Ok(TaskRecord {
            task_id: self.task_id,
            status: status.into(),
            descriptor,
            progress: Progress::new(
                self.progress_percent.clamp(0, 100) as u8,
                self.progress_label,
            ),
            result,
            error: self.error_message,
            created_at: self.created_at,
            updated_at: self.updated_at,
            expires_at: self.expires_at,
        })
    }
}

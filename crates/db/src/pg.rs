//! PostgreSQL-backed [`TaskStore`] over the `pipeline_tasks` table.
//!
//! Uses `INSERT ... ON CONFLICT` for idempotent enqueue and
//! `SELECT FOR UPDATE SKIP LOCKED` so concurrent workers never claim the
//! same task.

use std::time::Duration;

use async_trait::async_trait;
use reelsmith_core::descriptor::TaskDescriptor;
use reelsmith_core::result::PipelineResult;
use reelsmith_core::task_state::{
    EnqueueOutcome, Progress, TaskRecord, TaskStatus, TASK_RETENTION_SECS,
};

use crate::models::status::{StatusId, TaskStatusId};
use crate::models::task::TaskRow;
use crate::store::{StoreError, TaskCounts, TaskStore};
use crate::DbPool;

/// Column list for `pipeline_tasks` queries.
const COLUMNS: &str = "\
    task_id, status_id, descriptor, brief_preview, \
    progress_percent, progress_label, result, error_message, \
    created_at, updated_at, claimed_at, expires_at";

/// Task store persisted in PostgreSQL.
#[derive(Clone)]
pub struct PgTaskStore {
    pool: DbPool,
    retention: Duration,
}

impl PgTaskStore {
    /// Store with the default one-hour retention.
    pub fn new(pool: DbPool) -> Self {
        Self::with_retention(pool, Duration::from_secs(TASK_RETENTION_SECS))
    }

    pub fn with_retention(pool: DbPool, retention: Duration) -> Self {
        Self { pool, retention }
    }

    fn retention_secs(&self) -> f64 {
        self.retention.as_secs_f64()
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn enqueue(&self, descriptor: &TaskDescriptor) -> Result<EnqueueOutcome, StoreError> {
        let payload = serde_json::to_value(descriptor)?;
        // An expired row with the same id is replaced; a live one is left alone.
        let inserted: Option<String> = sqlx::query_scalar(
            "INSERT INTO pipeline_tasks \
                 (task_id, status_id, descriptor, brief_preview, expires_at) \
             VALUES ($1, $2, $3, $4, NOW() + make_interval(secs => $5)) \
             ON CONFLICT (task_id) DO UPDATE \
                 SET status_id = EXCLUDED.status_id, \
                     descriptor = EXCLUDED.descriptor, \
                     brief_preview = EXCLUDED.brief_preview, \
                     progress_percent = 0, \
                     progress_label = 'queued', \
                     result = NULL, \
                     error_message = NULL, \
                     created_at = NOW(), \
                     updated_at = NOW(), \
                     claimed_at = NULL, \
                     expires_at = EXCLUDED.expires_at \
                 WHERE pipeline_tasks.expires_at <= NOW() \
             RETURNING task_id",
        )
        .bind(&descriptor.task_id)
        .bind(TaskStatusId::Queued.id())
        .bind(&payload)
        .bind(descriptor.brief_preview())
        .bind(self.retention_secs())
        .fetch_optional(&self.pool)
        .await?;

        Ok(match inserted {
            Some(_) => EnqueueOutcome::Enqueued,
            None => {
                tracing::debug!(task_id = %descriptor.task_id, "Task already present, enqueue skipped");
                EnqueueOutcome::AlreadyPresent
            }
        })
    }

    async fn claim_next(&self) -> Result<Option<TaskDescriptor>, StoreError> {
        let query = format!(
            "UPDATE pipeline_tasks \
             SET status_id = $1, claimed_at = NOW(), updated_at = NOW(), \
                 expires_at = NOW() + make_interval(secs => $3) \
             WHERE task_id = ( \
                 SELECT task_id FROM pipeline_tasks \
                 WHERE status_id = $2 AND claimed_at IS NULL AND expires_at > NOW() \
                 ORDER BY created_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, TaskRow>(&query)
            .bind(TaskStatusId::Running.id())
            .bind(TaskStatusId::Queued.id())
            .bind(self.retention_secs())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(serde_json::from_value(row.descriptor)?)),
            None => Ok(None),
        }
    }

    async fn record_progress(&self, task_id: &str, progress: &Progress) -> Result<(), StoreError> {
        let updated = sqlx::query(
            "UPDATE pipeline_tasks \
             SET progress_percent = $2, progress_label = $3, updated_at = NOW(), \
                 expires_at = NOW() + make_interval(secs => $4) \
             WHERE task_id = $1 AND expires_at > NOW()",
        )
        .bind(task_id)
        .bind(i16::from(progress.percent))
        .bind(&progress.label)
        .bind(self.retention_secs())
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                task_id: task_id.to_string(),
            });
        }
        Ok(())
    }

    async fn finish(&self, result: &PipelineResult) -> Result<(), StoreError> {
        let status = TaskStatusId::from(TaskStatus::from(result.status));
        let payload = serde_json::to_value(result)?;
        let updated = sqlx::query(
            "UPDATE pipeline_tasks \
             SET status_id = $2, result = $3, error_message = $4, \
                 progress_percent = CASE WHEN $2 = $6 THEN 100 ELSE progress_percent END, \
                 progress_label = CASE WHEN $2 = $6 THEN 'completed' ELSE progress_label END, \
                 updated_at = NOW(), \
                 expires_at = NOW() + make_interval(secs => $5) \
             WHERE task_id = $1 AND expires_at > NOW()",
        )
        .bind(&result.task_id)
        .bind(status.id())
        .bind(&payload)
        .bind(result.error.as_deref())
        .bind(self.retention_secs())
        .bind(TaskStatusId::Completed.id())
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                task_id: result.task_id.clone(),
            });
        }
        Ok(())
    }

    async fn find(&self, task_id: &str) -> Result<Option<TaskRecord>, StoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM pipeline_tasks WHERE task_id = $1 AND expires_at > NOW()"
        );
        let row = sqlx::query_as::<_, TaskRow>(&query)
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TaskRow::into_record).transpose()
    }

    async fn counts(&self) -> Result<TaskCounts, StoreError> {
        let rows: Vec<(StatusId, i64)> = sqlx::query_as(
            "SELECT status_id, COUNT(*) FROM pipeline_tasks \
             WHERE expires_at > NOW() \
             GROUP BY status_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = TaskCounts::default();
        for (status_id, n) in rows {
            match TaskStatusId::from_id(status_id) {
                Some(status) => counts.add(status.into(), n.max(0) as u64),
                None => tracing::warn!(status_id, "Ignoring unknown task status in counts"),
            }
        }
        Ok(counts)
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let deleted = sqlx::query("DELETE FROM pipeline_tasks WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        Ok(deleted.rows_affected())
    }
}

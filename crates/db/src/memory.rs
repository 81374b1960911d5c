//! In-process [`TaskStore`] for tests and single-process deployments.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reelsmith_core::descriptor::TaskDescriptor;
use reelsmith_core::result::PipelineResult;
use reelsmith_core::task_state::{
    EnqueueOutcome, Progress, TaskRecord, TaskStatus, TASK_RETENTION_SECS,
};
use reelsmith_core::types::Timestamp;
use tokio::sync::Mutex;

use crate::store::{StoreError, TaskCounts, TaskStore};

#[derive(Default)]
struct Inner {
    records: HashMap<String, TaskRecord>,
    queue: VecDeque<String>,
}

impl Inner {
    /// Live record for `task_id`, dropping it first if it has expired.
    fn live_mut(&mut self, task_id: &str, now: Timestamp) -> Option<&mut TaskRecord> {
        if self
            .records
            .get(task_id)
            .is_some_and(|r| r.expires_at <= now)
        {
            self.records.remove(task_id);
        }
        self.records.get_mut(task_id)
    }
}

/// [`TaskStore`] backed by a mutex-guarded map and FIFO queue.
pub struct MemoryTaskStore {
    inner: Mutex<Inner>,
    retention: chrono::Duration,
}

impl MemoryTaskStore {
    /// Store with the default one-hour retention.
    pub fn new() -> Self {
        Self::with_retention(Duration::from_secs(TASK_RETENTION_SECS))
    }

    pub fn with_retention(retention: Duration) -> Self {
        let retention = chrono::Duration::from_std(retention)
            .unwrap_or_else(|_| chrono::Duration::seconds(TASK_RETENTION_SECS as i64));
        Self {
            inner: Mutex::new(Inner::default()),
            retention,
        }
    }
}

impl Default for MemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn enqueue(&self, descriptor: &TaskDescriptor) -> Result<EnqueueOutcome, StoreError> {
        let now = Utc::now();
        let mut inner = self.inner.lock().await;

        if inner.live_mut(&descriptor.task_id, now).is_some() {
            tracing::debug!(task_id = %descriptor.task_id, "Task already present, enqueue skipped");
            return Ok(EnqueueOutcome::AlreadyPresent);
        }

        let record = TaskRecord {
            task_id: descriptor.task_id.clone(),
            status: TaskStatus::Queued,
            descriptor: descriptor.clone(),
            progress: Progress::new(0, "queued"),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            expires_at: now + self.retention,
        };
        inner.records.insert(descriptor.task_id.clone(), record);
        inner.queue.push_back(descriptor.task_id.clone());
        Ok(EnqueueOutcome::Enqueued)
    }

    async fn claim_next(&self) -> Result<Option<TaskDescriptor>, StoreError> {
        let now = Utc::now();
        let retention = self.retention;
        let mut inner = self.inner.lock().await;

        while let Some(task_id) = inner.queue.pop_front() {
            if let Some(record) = inner.live_mut(&task_id, now) {
                if record.status == TaskStatus::Queued {
                    record.status = TaskStatus::Running;
                    record.updated_at = now;
                    record.expires_at = now + retention;
                    return Ok(Some(record.descriptor.clone()));
                }
            }
        }
        Ok(None)
    }

    async fn record_progress(&self, task_id: &str, progress: &Progress) -> Result<(), StoreError> {
        let now = Utc::now();
        let retention = self.retention;
        let mut inner = self.inner.lock().await;

        let record = inner
            .live_mut(task_id, now)
            .ok_or_else(|| StoreError::NotFound {
                task_id: task_id.to_string(),
            })?;
        record.progress = progress.clone();
        record.updated_at = now;
        record.expires_at = now + retention;
        Ok(())
    }

    async fn finish(&self, result: &PipelineResult) -> Result<(), StoreError> {
        let now = Utc::now();
        let retention = self.retention;
        let mut inner = self.inner.lock().await;

        let record = inner
            .live_mut(&result.task_id, now)
            .ok_or_else(|| StoreError::NotFound {
                task_id: result.task_id.clone(),
            })?;
        record.status = result.status.into();
        if result.is_completed() {
            record.progress = Progress::new(100, "completed");
        }
        record.error = result.error.clone();
        record.result = Some(result.clone());
        record.updated_at = now;
        record.expires_at = now + retention;
        Ok(())
    }

    async fn find(&self, task_id: &str) -> Result<Option<TaskRecord>, StoreError> {
        let now = Utc::now();
        let mut inner = self.inner.lock().await;
        Ok(inner.live_mut(task_id, now).map(|r| r.clone()))
    }

    async fn counts(&self) -> Result<TaskCounts, StoreError> {
        let now = Utc::now();
        let inner = self.inner.lock().await;
        let mut counts = TaskCounts::default();
        for record in inner.records.values().filter(|r| r.expires_at > now) {
            counts.add(record.status, 1);
        }
        Ok(counts)
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let now = Utc::now();
        let mut inner = self.inner.lock().await;
        let before = inner.records.len();
        inner.records.retain(|_, r| r.expires_at > now);
        let removed = (before - inner.records.len()) as u64;
        let Inner { records, queue } = &mut *inner;
        queue.retain(|id| records.contains_key(id));
        Ok(removed)
    }
}

//! Progress reporting. Reporting never fails a run: persistence errors are
//! logged and dropped.

use std::sync::Arc;

use async_trait::async_trait;
use reelsmith_core::task_state::Progress;
use reelsmith_db::TaskStore;

/// Fire-and-forget progress sink.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn report(&self, task_id: &str, progress: Progress);
}

/// Writes progress snapshots to the task store.
pub struct StoreProgressReporter {
    store: Arc<dyn TaskStore>,
}

impl StoreProgressReporter {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ProgressReporter for StoreProgressReporter {
    async fn report(&self, task_id: &str, progress: Progress) {
        tracing::info!(task_id, percent = progress.percent, label = %progress.label, "Progress");
        if let Err(e) = self.store.record_progress(task_id, &progress).await {
            tracing::warn!(task_id, error = %e, "Failed to persist progress");
        }
    }
}

/// Keeps reported percentages non-decreasing within one run.
pub(crate) struct ProgressTracker<'a> {
    reporter: &'a dyn ProgressReporter,
    task_id: &'a str,
    last: u8,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(reporter: &'a dyn ProgressReporter, task_id: &'a str) -> Self {
        Self {
            reporter,
            task_id,
            last: 0,
        }
    }

    pub(crate) fn last(&self) -> u8 {
        self.last
    }

    pub(crate) async fn report(&mut self, percent: u8, label: impl Into<String>) {
        let percent = percent.clamp(self.last, 100);
        self.last = percent;
        self.reporter
            .report(self.task_id, Progress::new(percent, label))
            .await;
    }
}

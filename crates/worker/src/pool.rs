//! Queue-draining worker pool.
//!
//! Spawns `workers` long-lived Tokio tasks that each claim the oldest
//! queued task with [`TaskStore::claim_next`], run it through the
//! [`PipelineEngine`] and persist the terminal result. A separate loop
//! purges expired task records.

use std::sync::Arc;
use std::time::Duration;

use reelsmith_core::result::PipelineResult;
use reelsmith_db::{StoreError, TaskStore};
use reelsmith_pipeline::PipelineEngine;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Default interval between queue checks for an idle worker.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default interval between expiry sweeps.
const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(300);

/// Shortest ticker period; `tokio::time::interval` rejects zero.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Fixed-size pool of pipeline workers sharing one task store.
#[derive(Clone)]
pub struct WorkerPool {
    store: Arc<dyn TaskStore>,
    engine: Arc<PipelineEngine>,
    workers: usize,
    poll_interval: Duration,
    purge_interval: Duration,
}

impl WorkerPool {
    pub fn new(store: Arc<dyn TaskStore>, engine: Arc<PipelineEngine>, workers: usize) -> Self {
        Self {
            store,
            engine,
            workers: workers.max(1),
            poll_interval: DEFAULT_POLL_INTERVAL,
            purge_interval: DEFAULT_PURGE_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(MIN_INTERVAL);
        self
    }

    pub fn with_purge_interval(mut self, purge_interval: Duration) -> Self {
        self.purge_interval = purge_interval.max(MIN_INTERVAL);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every worker until the cancellation token is triggered.
    ///
    /// Runs already in progress finish before their worker exits.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            workers = self.workers,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Worker pool started",
        );

        let mut set = JoinSet::new();
        for worker_id in 0..self.workers {
            let pool = self.clone();
            let cancel = cancel.clone();
            set.spawn(async move { pool.worker_loop(worker_id, cancel).await });
        }
        {
            let pool = self.clone();
            let cancel = cancel.clone();
            set.spawn(async move { pool.purge_loop(cancel).await });
        }

        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Worker task panicked");
            }
        }
        tracing::info!("Worker pool stopped");
    }

    /// Claim and run a single queued task.
    ///
    /// Returns `Ok(None)` when the queue is empty.
    pub async fn run_once(&self) -> Result<Option<PipelineResult>, StoreError> {
        let Some(descriptor) = self.store.claim_next().await? else {
            return Ok(None);
        };
        let task_id = descriptor.task_id.clone();
        tracing::info!(task_id = %task_id, "Task claimed");

        let result = self.engine.run(descriptor).await;

        if let Err(e) = self.store.finish(&result).await {
            tracing::error!(task_id = %task_id, error = %e, "Failed to persist task result");
        }
        Ok(Some(result))
    }

    async fn worker_loop(&self, worker_id: usize, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::debug!(worker_id, "Worker started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(worker_id, "Worker shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    // Drain the queue before waiting for the next tick.
                    while !cancel.is_cancelled() {
                        match self.run_once().await {
                            Ok(Some(result)) => {
                                tracing::info!(
                                    worker_id,
                                    task_id = %result.task_id,
                                    status = ?result.status,
                                    "Task finished",
                                );
                            }
                            Ok(None) => break,
                            Err(e) => {
                                tracing::error!(worker_id, error = %e, "Claim cycle failed");
                                break;
                            }
                        }
                    }
                }
            }
        }
    }

    async fn purge_loop(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.purge_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => match self.store.purge_expired().await {
                    Ok(0) => {}
                    Ok(removed) => tracing::info!(removed, "Purged expired task records"),
                    Err(e) => tracing::error!(error = %e, "Expiry sweep failed"),
                },
            }
        }
    }
}

//! Concurrent fan-out/fan-in over a batch of independent items.
//!
//! A batch runs in two phases:
//!
//! 1. **Submit**: every item is submitted concurrently. A failed submission
//!    leaves an empty slot for that item and does not affect the others.
//! 2. **Collect**: every submitted item is awaited concurrently under one
//!    shared group deadline. When the deadline passes, outstanding waits
//!    are dropped and whatever finished is returned.
//!
//! Results are always indexed by the item's original position, never by
//! completion order.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::Instant;

use crate::api::RemoteError;
use crate::job::{JobKind, JobResult};
use crate::poll::{PollError, PollLoop};

/// Per-item failure inside a remote batch.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    /// Nothing to submit for this item (e.g. an empty brief).
    #[error("nothing to submit")]
    Empty,

    #[error(transparent)]
    Submit(#[from] RemoteError),

    #[error(transparent)]
    Poll(#[from] PollError),
}

/// Index-ordered results of a fan-out.
#[derive(Debug)]
pub struct FanOutOutcome<T> {
    /// `slots[i]` holds item `i`'s result, or `None` if it failed,
    /// was never submitted, or was still running at the deadline.
    pub slots: Vec<Option<T>>,
    /// Whether the group deadline cut the collect phase short.
    pub timed_out: bool,
}

impl<T> FanOutOutcome<T> {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of populated slots.
    pub fn successes(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Indices of empty slots.
    pub fn missing(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.is_none().then_some(i))
            .collect()
    }
}

/// Runs batches of remote jobs through a shared [`PollLoop`].
#[derive(Clone)]
pub struct FanOutCoordinator {
    poll: PollLoop,
    interval: Duration,
}

impl FanOutCoordinator {
    /// `interval` is the poll interval used for every item's wait.
    pub fn new(poll: PollLoop, interval: Duration) -> Self {
        Self { poll, interval }
    }

    pub fn poll(&self) -> &PollLoop {
        &self.poll
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Generic two-phase fan-out.
    ///
    /// `submit_fn(i, item)` produces a handle; `collect_fn(i, handle)`
    /// turns it into a result. Both receive the original index. Errors
    /// from either are logged and leave slot `i` empty.
    pub async fn run_many<I, H, T, SubmitFn, SubmitFut, SubmitErr, CollectFn, CollectFut, CollectErr>(
        items: Vec<I>,
        submit_fn: SubmitFn,
        collect_fn: CollectFn,
        group_deadline: Duration,
    ) -> FanOutOutcome<T>
    where
        SubmitFn: Fn(usize, I) -> SubmitFut,
        SubmitFut: Future<Output = Result<H, SubmitErr>>,
        SubmitErr: Display,
        CollectFn: Fn(usize, H) -> CollectFut,
        CollectFut: Future<Output = Result<T, CollectErr>>,
        CollectErr: Display,
    {
        let total = items.len();
        let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();

        // -- Phase 1: submit ------------------------------------------------
        let submissions = futures::future::join_all(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| submit_fn(i, item)),
        )
        .await;

        let mut pending = FuturesUnordered::new();
        for (i, submission) in submissions.into_iter().enumerate() {
            match submission {
                Ok(handle) => {
                    let wait = collect_fn(i, handle);
                    pending.push(async move { (i, wait.await) });
                }
                Err(e) => {
                    tracing::warn!(item = i, error = %e, "Fan-out submission failed");
                }
            }
        }

        // -- Phase 2: collect -----------------------------------------------
        let deadline = Instant::now() + group_deadline;
        let mut timed_out = false;

        loop {
            match tokio::time::timeout_at(deadline, pending.next()).await {
                Ok(Some((i, Ok(value)))) => slots[i] = Some(value),
                Ok(Some((i, Err(e)))) => {
                    tracing::warn!(item = i, error = %e, "Fan-out item failed");
                }
                Ok(None) => break,
                Err(_) => {
                    timed_out = true;
                    tracing::warn!(
                        outstanding = pending.len(),
                        deadline_secs = group_deadline.as_secs(),
                        "Fan-out group deadline reached, returning partial results",
                    );
                    break;
                }
            }
        }

        let outcome = FanOutOutcome { slots, timed_out };
        tracing::debug!(
            total,
            succeeded = outcome.successes(),
            timed_out,
            "Fan-out finished",
        );
        outcome
    }

    /// Submit one remote job of `kind` per item and wait for all of them.
    ///
    /// A `None` entry means there is nothing to submit for that item; its
    /// slot stays empty. Each item's poll is bounded by `group_deadline`,
    /// as is the batch as a whole.
    pub async fn run_remote(
        &self,
        kind: JobKind,
        params: Vec<Option<serde_json::Value>>,
        group_deadline: Duration,
    ) -> FanOutOutcome<JobResult> {
        let capability = self.poll.capability();
        let poll = &self.poll;
        let interval = self.interval;

        Self::run_many(
            params,
            move |_, params| async move {
                let params = params.ok_or(ItemError::Empty)?;
                Ok::<_, ItemError>(capability.submit(kind, &params).await?)
            },
            move |_, handle| async move {
                poll.await_terminal(&handle, interval, group_deadline)
                    .await
                    .map_err(ItemError::from)
            },
            group_deadline,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn all_items_succeed_in_original_order() {
        let outcome = FanOutCoordinator::run_many(
            vec![50u64, 10, 40, 20, 30],
            |i, delay| async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok::<_, String>((i, delay))
            },
            |_, (i, delay)| async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok::<_, String>(format!("r{i}"))
            },
            Duration::from_secs(5),
        )
        .await;

        assert!(!outcome.timed_out);
        let values: Vec<_> = outcome.slots.into_iter().map(Option::unwrap).collect();
        assert_eq!(values, vec!["r0", "r1", "r2", "r3", "r4"]);
    }

    #[tokio::test]
    async fn submission_failures_leave_empty_slots() {
        let collected = AtomicUsize::new(0);
        let outcome = FanOutCoordinator::run_many(
            (0..6).collect::<Vec<usize>>(),
            |_, n| async move {
                if n % 3 == 0 {
                    Err(format!("submit {n} rejected"))
                } else {
                    Ok(n)
                }
            },
            |_, n| {
                collected.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, String>(n * 10) }
            },
            Duration::from_secs(5),
        )
        .await;

        assert_eq!(outcome.len(), 6);
        assert_eq!(outcome.successes(), 4);
        assert_eq!(outcome.missing(), vec![0, 3]);
        assert_eq!(outcome.slots[4], Some(40));
        assert_eq!(collected.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn group_deadline_returns_partial_results() {
        let outcome = FanOutCoordinator::run_many(
            (0..5).collect::<Vec<usize>>(),
            |i, _| async move { Ok::<_, String>(i) },
            |i, _| async move {
                let wait = if i == 3 { 1_000 } else { 30 + i as u64 * 10 };
                tokio::time::sleep(Duration::from_secs(wait)).await;
                Ok::<_, String>(format!("r{i}"))
            },
            Duration::from_secs(300),
        )
        .await;

        assert!(outcome.timed_out);
        assert_eq!(
            outcome.slots,
            vec![
                Some("r0".to_string()),
                Some("r1".to_string()),
                Some("r2".to_string()),
                None,
                Some("r4".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn collect_errors_are_isolated() {
        let outcome = FanOutCoordinator::run_many(
            vec!["a", "b", "c"],
            |_, s| async move { Ok::<_, String>(s) },
            |_, s| async move {
                if s == "b" {
                    Err("render failed".to_string())
                } else {
                    Ok(s.to_uppercase())
                }
            },
            Duration::from_secs(5),
        )
        .await;

        assert!(!outcome.timed_out);
        assert_eq!(
            outcome.slots,
            vec![Some("A".to_string()), None, Some("C".to_string())]
        );
    }

    #[tokio::test]
    async fn empty_batch_is_empty() {
        let outcome: FanOutOutcome<u8> = FanOutCoordinator::run_many(
            Vec::<u8>::new(),
            |_, n| async move { Ok::<_, String>(n) },
            |_, n| async move { Ok::<_, String>(n) },
            Duration::from_secs(1),
        )
        .await;
        assert!(outcome.is_empty());
        assert!(!outcome.timed_out);
    }
}

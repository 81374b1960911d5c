//! [`PgTaskStore`] against a real database: idempotent enqueue, expiry,
//! `SKIP LOCKED` claims and terminal results.

use std::collections::HashSet;

use assert_matches::assert_matches;
use reelsmith_core::aspect::AspectRatio;
use reelsmith_core::descriptor::TaskDescriptor;
use reelsmith_core::result::PipelineResult;
use reelsmith_core::task_state::{EnqueueOutcome, Progress, TaskStatus};
use reelsmith_core::variant::PipelineVariant;
use reelsmith_db::{PgTaskStore, StoreError, TaskStore};
use sqlx::PgPool;

fn descriptor(task_id: &str) -> TaskDescriptor {
    TaskDescriptor {
        task_id: task_id.into(),
        owner_id: "user-3".into(),
        owner_email: "owner@example.com".into(),
        owner_name: None,
        content_id: format!("video-{task_id}"),
        conversation_id: None,
        brief: "Lanterns drifting over a night market".into(),
        source_image_url: "https://cdn.example.com/lantern.png".into(),
        aspect_ratio: AspectRatio::Landscape,
        callback_url: "https://hooks.example.com/done".into(),
        variant: PipelineVariant::Standard,
    }
}

/// Push a row's expiry into the past.
async fn expire(pool: &PgPool, task_id: &str) {
    sqlx::query(
        "UPDATE pipeline_tasks SET expires_at = NOW() - INTERVAL '1 second' WHERE task_id = $1",
    )
    .bind(task_id)
    .execute(pool)
    .await
    .unwrap();
}

// ---------------------------------------------------------------------------
// Enqueue
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_enqueue_twice_is_already_present(pool: PgPool) {
    let store = PgTaskStore::new(pool);

    assert_eq!(store.enqueue(&descriptor("t-1")).await.unwrap(), EnqueueOutcome::Enqueued);
    assert_eq!(
        store.enqueue(&descriptor("t-1")).await.unwrap(),
        EnqueueOutcome::AlreadyPresent
    );

    let counts = store.counts().await.unwrap();
    assert_eq!(counts.queued, 1);
    assert_eq!(counts.total(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_enqueue_does_not_reset_a_running_task(pool: PgPool) {
    let store = PgTaskStore::new(pool);
    store.enqueue(&descriptor("t-1")).await.unwrap();
    store.claim_next().await.unwrap().expect("queued task");

    assert_eq!(
        store.enqueue(&descriptor("t-1")).await.unwrap(),
        EnqueueOutcome::AlreadyPresent
    );
    let record = store.find("t-1").await.unwrap().unwrap();
    assert_eq!(record.status, TaskStatus::Running);
    assert!(store.claim_next().await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_expired_task_can_be_enqueued_again(pool: PgPool) {
    let store = PgTaskStore::new(pool.clone());
    store.enqueue(&descriptor("t-1")).await.unwrap();
    store.claim_next().await.unwrap().expect("queued task");
    store
        .finish(&PipelineResult::failed("t-1".into(), "boom", Vec::new()))
        .await
        .unwrap();

    expire(&pool, "t-1").await;
    assert!(store.find("t-1").await.unwrap().is_none());

    assert_eq!(store.enqueue(&descriptor("t-1")).await.unwrap(), EnqueueOutcome::Enqueued);
    let record = store.find("t-1").await.unwrap().expect("fresh record");
    assert_eq!(record.status, TaskStatus::Queued);
    assert_eq!(record.progress.percent, 0);
    assert!(record.result.is_none());
    assert!(record.error.is_none());
    assert_eq!(
        store.claim_next().await.unwrap().map(|d| d.task_id).as_deref(),
        Some("t-1")
    );
}

// ---------------------------------------------------------------------------
// Claim
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_claims_come_back_in_fifo_order(pool: PgPool) {
    let store = PgTaskStore::new(pool);
    for id in ["a", "b", "c"] {
        store.enqueue(&descriptor(id)).await.unwrap();
    }

    let mut claimed = Vec::new();
    while let Some(d) = store.claim_next().await.unwrap() {
        claimed.push(d.task_id);
    }
    assert_eq!(claimed, ["a", "b", "c"]);
    assert_eq!(store.counts().await.unwrap().running, 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_claims_never_share_a_task(pool: PgPool) {
    let store = PgTaskStore::new(pool);
    for id in ["a", "b", "c", "d"] {
        store.enqueue(&descriptor(id)).await.unwrap();
    }

    let (r1, r2, r3, r4, r5) = tokio::join!(
        store.claim_next(),
        store.claim_next(),
        store.claim_next(),
        store.claim_next(),
        store.claim_next(),
    );
    let claimed: Vec<String> = [r1, r2, r3, r4, r5]
        .into_iter()
        .filter_map(|r| r.unwrap())
        .map(|d| d.task_id)
        .collect();

    let unique: HashSet<&String> = claimed.iter().collect();
    assert_eq!(unique.len(), claimed.len(), "a task was claimed twice: {claimed:?}");
    assert!(claimed.len() <= 4);

    // Whatever a claim skipped under contention is still claimable.
    let mut remaining = 0;
    while store.claim_next().await.unwrap().is_some() {
        remaining += 1;
    }
    assert_eq!(claimed.len() + remaining, 4);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_expired_task_is_not_claimed(pool: PgPool) {
    let store = PgTaskStore::new(pool.clone());
    store.enqueue(&descriptor("old")).await.unwrap();
    expire(&pool, "old").await;

    assert!(store.claim_next().await.unwrap().is_none());
    assert_eq!(store.purge_expired().await.unwrap(), 1);
    assert_eq!(store.counts().await.unwrap().total(), 0);
}

// ---------------------------------------------------------------------------
// Progress / finish
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_finish_completed_sets_full_progress(pool: PgPool) {
    let store = PgTaskStore::new(pool);
    store.enqueue(&descriptor("t-1")).await.unwrap();
    store.claim_next().await.unwrap().expect("queued task");
    store
        .record_progress("t-1", &Progress::new(50, "Animating scenes"))
        .await
        .unwrap();

    let result = PipelineResult::completed(
        "t-1".into(),
        "https://cdn.example.com/final.mp4".into(),
        Vec::new(),
    );
    store.finish(&result).await.unwrap();

    let record = store.find("t-1").await.unwrap().unwrap();
    assert_eq!(record.status, TaskStatus::Completed);
    assert_eq!(record.progress.percent, 100);
    assert_eq!(record.progress.label, "completed");
    assert_eq!(record.result, Some(result));
    assert!(record.error.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_finish_failed_keeps_last_progress(pool: PgPool) {
    let store = PgTaskStore::new(pool);
    store.enqueue(&descriptor("t-1")).await.unwrap();
    store.claim_next().await.unwrap().expect("queued task");
    store
        .record_progress("t-1", &Progress::new(25, "Generating images"))
        .await
        .unwrap();

    store
        .finish(&PipelineResult::failed(
            "t-1".into(),
            "stage 'images' failed",
            Vec::new(),
        ))
        .await
        .unwrap();

    let record = store.find("t-1").await.unwrap().unwrap();
    assert_eq!(record.status, TaskStatus::Failed);
    assert_eq!(record.progress.percent, 25);
    assert_eq!(record.error.as_deref(), Some("stage 'images' failed"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_updates_to_unknown_task_are_not_found(pool: PgPool) {
    let store = PgTaskStore::new(pool);

    assert_matches!(
        store.record_progress("ghost", &Progress::new(10, "x")).await,
        Err(StoreError::NotFound { ref task_id }) if task_id == "ghost"
    );
    assert_matches!(
        store
            .finish(&PipelineResult::failed("ghost".into(), "boom", Vec::new()))
            .await,
        Err(StoreError::NotFound { .. })
    );
}

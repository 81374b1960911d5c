use std::sync::Arc;

use reelsmith_db::{PgTaskStore, TaskStore};
use reelsmith_worker::config::WorkerConfig;
use reelsmith_worker::pool::WorkerPool;
use reelsmith_worker::runtime::build_engine;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "reelsmith_worker=debug,reelsmith_pipeline=debug,reelsmith_remote=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env()?;

    let db = reelsmith_db::create_pool(&config.database_url).await?;
    reelsmith_db::run_migrations(&db).await?;
    tracing::info!("Database migrations applied");

    let store: Arc<dyn TaskStore> = Arc::new(PgTaskStore::with_retention(db, config.task_retention));
    let engine = Arc::new(build_engine(&config, Arc::clone(&store))?);

    let pool = WorkerPool::new(store, engine, config.max_concurrent_tasks)
        .with_poll_interval(config.queue_poll_interval)
        .with_purge_interval(config.purge_interval);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
                cancel.cancel();
            }
        });
    }

    pool.run(cancel).await;
    Ok(())
}

//! Task queue and task-state persistence.
//!
//! [`TaskStore`] is the seam the worker and the progress reporter write
//! through. [`PgTaskStore`] backs it with PostgreSQL; [`MemoryTaskStore`]
//! keeps everything in process.

use sqlx::postgres::PgPoolOptions;

pub mod memory;
pub mod models;
pub mod pg;
pub mod store;

pub use memory::MemoryTaskStore;
pub use pg::PgTaskStore;
pub use store::{StoreError, TaskCounts, TaskStore};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Apply pending schema migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}

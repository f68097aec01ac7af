//! PostgreSQL persistence for Lectern.
//!
//! Connection pooling, embedded migrations, row models, zero-sized
//! repositories, and [`PgCourseStore`], the production implementation of
//! the lifecycle engine's `CourseStore`.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod pg_store;
pub mod repositories;

pub use pg_store::PgCourseStore;

/// Shared connection pool type.
pub type DbPool = sqlx::PgPool;

/// Maximum pooled connections.
const MAX_CONNECTIONS: u32 = 10;

/// How long to wait for a free connection before failing.
const ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// Connect to PostgreSQL and build a connection pool.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the migrations embedded from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

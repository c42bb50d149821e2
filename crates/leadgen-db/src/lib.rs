//! Database layer for the LeadGen intake service.
//!
//! Provides the durable job store (enqueue, claim, finish, requeue),
//! destination schema discovery, and the schema-adaptive lead writer.

pub mod error;
pub mod schema;
pub mod store;
pub mod writer;

pub use error::{DbError, DbResult};
pub use schema::{SchemaCache, TableSchema};
pub use store::{EnqueueOutcome, JobRecord, JobSource, JobStore};
pub use writer::{LeadSink, LeadWriter};

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a new database connection pool. `connect_timeout` bounds each
/// acquire so a hung database cannot stall a claim indefinitely.
pub async fn create_pool(database_url: &str, connect_timeout: Duration) -> DbResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(connect_timeout)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run database migrations.
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

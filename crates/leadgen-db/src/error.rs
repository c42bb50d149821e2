//! Database error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("idempotency key {key:?} was first used with a different payload")]
    IdempotencyConflict {
        key: String,
        /// Correlation id of the rejected call, not of the stored row.
        correlation_id: String,
    },

    #[error("destination schema error: {0}")]
    Schema(String),

    #[error("malformed job payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type DbResult<T> = std::result::Result<T, DbError>;

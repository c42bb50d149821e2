//! Application state.

use leadgen_db::JobStore;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub store: Arc<JobStore>,
    /// Deployment environment label, surfaced by /version.
    pub environment: String,
}

impl AppState {
    pub fn new(pool: PgPool, environment: impl Into<String>) -> Self {
        let store = Arc::new(JobStore::new(pool.clone()));
        Self {
            pool,
            store,
            environment: environment.into(),
        }
    }
}

//! API routes.

pub mod health;
pub mod intake;

use crate::AppState;
use axum::Router;

/// Build the main API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", intake::router())
        .merge(health::router())
        .with_state(state)
}

//! API error handling.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    /// Same idempotency key, different payload. Carries the correlation id
    /// of the rejected call.
    Conflict {
        message: String,
        correlation_id: String,
    },
    ServiceUnavailable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::Conflict {
                message,
                correlation_id,
            } => (
                StatusCode::CONFLICT,
                Json(json!({ "error": message, "correlation_id": correlation_id })),
            )
                .into_response(),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": msg }))).into_response()
            }
        }
    }
}

impl From<leadgen_db::DbError> for ApiError {
    fn from(err: leadgen_db::DbError) -> Self {
        match err {
            leadgen_db::DbError::IdempotencyConflict {
                ref correlation_id, ..
            } => ApiError::Conflict {
                message: err.to_string(),
                correlation_id: correlation_id.clone(),
            },
            leadgen_db::DbError::Database(_) => {
                ApiError::ServiceUnavailable("job store unavailable".to_string())
            }
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

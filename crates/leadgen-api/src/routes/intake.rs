//! Lead intake endpoint.

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Json;
use chrono::{DateTime, Utc};
use leadgen_core::{IntakeId, IntakeMeta};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new().route("/leads", post(accept_lead))
}

#[derive(Debug, Deserialize)]
pub struct IntakeRequest {
    /// The validated lead document. Schema validation is the caller's
    /// collaborator's concern; only basic shape is checked here.
    pub lead: Value,
    #[serde(default)]
    pub lead_source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IntakeAccepted {
    pub status: &'static str,
    pub intake_id: IntakeId,
    pub correlation_id: String,
    pub received_at_utc: DateTime<Utc>,
}

/// Accept one lead. Responds 202 only after the job row is durably
/// committed; duplicate submissions under the same idempotency key echo the
/// original identifiers.
async fn accept_lead(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<IntakeRequest>,
) -> Result<(StatusCode, Json<IntakeAccepted>), ApiError> {
    if let Err(reason) = validate_lead(&body.lead) {
        return Err(ApiError::BadRequest(reason.to_string()));
    }

    let idempotency_key = header_value(&headers, "Idempotency-Key");
    let request_id = header_value(&headers, "X-Request-Id");
    let lead_source = body.lead_source.unwrap_or_else(|| "unknown".to_string());

    let meta = IntakeMeta::stamp(request_id, lead_source);
    let outcome = state
        .store
        .enqueue(idempotency_key.as_deref(), meta, body.lead)
        .await?;

    let receipt = outcome.receipt().clone();
    info!(
        intake_id = %receipt.intake_id,
        correlation_id = %receipt.correlation_id,
        deduplicated = outcome.is_deduplicated(),
        "Accepted lead"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(IntakeAccepted {
            status: "accepted",
            intake_id: receipt.intake_id,
            correlation_id: receipt.correlation_id,
            received_at_utc: receipt.received_at_utc,
        }),
    ))
}

fn validate_lead(lead: &Value) -> Result<(), &'static str> {
    match lead.as_object() {
        Some(map) if !map.is_empty() => Ok(()),
        Some(_) => Err("lead must not be empty"),
        None => Err("lead must be a JSON object"),
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lead_must_be_a_non_empty_object() {
        assert!(validate_lead(&json!({"name": "Ada"})).is_ok());
        assert!(validate_lead(&json!({})).is_err());
        assert!(validate_lead(&json!("just a string")).is_err());
        assert!(validate_lead(&json!(null)).is_err());
    }

    #[test]
    fn header_values_are_trimmed_and_empty_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert("Idempotency-Key", "  abc  ".parse().unwrap());
        headers.insert("X-Request-Id", "   ".parse().unwrap());
        assert_eq!(
            header_value(&headers, "Idempotency-Key"),
            Some("abc".to_string())
        );
        assert_eq!(header_value(&headers, "X-Request-Id"), None);
        assert_eq!(header_value(&headers, "Missing"), None);
    }

    #[test]
    fn request_body_parses_with_optional_source() {
        let body: IntakeRequest =
            serde_json::from_value(json!({"lead": {"name": "Ada"}})).unwrap();
        assert!(body.lead_source.is_none());

        let body: IntakeRequest = serde_json::from_value(
            json!({"lead": {"name": "Ada"}, "lead_source": "landing-page"}),
        )
        .unwrap();
        assert_eq!(body.lead_source.as_deref(), Some("landing-page"));
    }

    #[test]
    fn accepted_response_shape() {
        let meta = IntakeMeta::stamp(Some("req-1".to_string()), "web");
        let receipt = meta.receipt();
        let response = IntakeAccepted {
            status: "accepted",
            intake_id: receipt.intake_id,
            correlation_id: receipt.correlation_id,
            received_at_utc: receipt.received_at_utc,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "accepted");
        assert_eq!(value["correlation_id"], "req-1");
        assert!(value["intake_id"].is_string());
        assert!(value["received_at_utc"].is_string());
    }
}

//! Intake metadata and the composite job payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::IntakeId;

/// Metadata stamped onto every accepted intake. Stored inside the job
/// payload's `meta` document and echoed back to the producer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeMeta {
    pub intake_id: IntakeId,
    /// Correlation id for this request. Caller-supplied or generated.
    pub request_id: String,
    pub received_at_utc: DateTime<Utc>,
    pub lead_source: String,
}

impl IntakeMeta {
    /// Stamp fresh metadata for a newly received intake.
    pub fn stamp(request_id: Option<String>, lead_source: impl Into<String>) -> Self {
        Self {
            intake_id: IntakeId::new(),
            request_id: request_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            received_at_utc: Utc::now(),
            lead_source: lead_source.into(),
        }
    }

    /// The acceptance receipt the producer boundary returns.
    pub fn receipt(&self) -> AcceptanceReceipt {
        AcceptanceReceipt {
            intake_id: self.intake_id,
            correlation_id: self.request_id.clone(),
            received_at_utc: self.received_at_utc,
        }
    }
}

/// The composite document persisted verbatim on a job row: the intake
/// metadata plus the original validated lead body. Never partially updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPayload {
    pub meta: IntakeMeta,
    pub lead: serde_json::Value,
}

impl JobPayload {
    pub fn new(meta: IntakeMeta, lead: serde_json::Value) -> Self {
        Self { meta, lead }
    }
}

/// Identifiers returned to the producer once a job is durably committed.
/// Retries under the same idempotency key echo the original receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptanceReceipt {
    pub intake_id: IntakeId,
    pub correlation_id: String,
    pub received_at_utc: DateTime<Utc>,
}

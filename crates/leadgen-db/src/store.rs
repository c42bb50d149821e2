//! Durable job store backing the intake outbox queue.
//!
//! Rows in `intake_jobs` are append-only: the enqueuer inserts them, the
//! dispatcher drives their status, and nothing ever deletes them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadgen_core::{AcceptanceReceipt, IntakeMeta, JobPayload, JobStatus, content_hash};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbError, DbResult};

/// A job row as persisted in `intake_jobs`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobRecord {
    pub id: Uuid,
    pub idempotency_key: Option<String>,
    pub payload: Value,
    pub status: String,
    pub attempt_count: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Decode the stored `{meta, lead}` document.
    pub fn parsed_payload(&self) -> DbResult<JobPayload> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

/// Result of an enqueue call. Both arms carry the receipt the producer
/// returns; `Deduplicated` echoes the identifiers of the original row.
#[derive(Debug, Clone)]
pub enum EnqueueOutcome {
    Inserted(AcceptanceReceipt),
    Deduplicated(AcceptanceReceipt),
}

impl EnqueueOutcome {
    pub fn receipt(&self) -> &AcceptanceReceipt {
        match self {
            EnqueueOutcome::Inserted(r) | EnqueueOutcome::Deduplicated(r) => r,
        }
    }

    pub fn is_deduplicated(&self) -> bool {
        matches!(self, EnqueueOutcome::Deduplicated(_))
    }
}

/// Hash of the request-determined content: the lead document and the source
/// tag. Server-minted identifiers (`intake_id`, `request_id`,
/// `received_at_utc`) are excluded so a retry of the same logical request
/// fingerprints identically.
pub fn request_fingerprint(lead: &Value, lead_source: &str) -> String {
    content_hash(&json!({ "lead": lead, "lead_source": lead_source }))
}

/// The claim/finish surface the dispatcher consumes.
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn claim(&self) -> DbResult<Option<JobRecord>>;
    async fn finish(
        &self,
        job_id: Uuid,
        status: JobStatus,
        last_error: Option<&str>,
    ) -> DbResult<()>;
}

/// The outbox queue over `intake_jobs`.
pub struct JobStore {
    pool: PgPool,
}

impl JobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Durably record one intake, deduplicating on the idempotency key.
    ///
    /// Without a key every call inserts a fresh row. With a key, uniqueness
    /// on `idempotency_key` arbitrates concurrent first calls: the loser of
    /// the insert race falls through to the duplicate path and either echoes
    /// the original receipt (same fingerprint) or is rejected with
    /// `IdempotencyConflict` (different fingerprint). Existing rows are
    /// never updated.
    pub async fn enqueue(
        &self,
        idempotency_key: Option<&str>,
        meta: IntakeMeta,
        lead: Value,
    ) -> DbResult<EnqueueOutcome> {
        let payload = JobPayload::new(meta, lead);
        let payload_value = serde_json::to_value(&payload)?;

        let Some(key) = idempotency_key else {
            self.insert_row(None, &payload_value).await?;
            return Ok(EnqueueOutcome::Inserted(payload.meta.receipt()));
        };

        if self.insert_row(Some(key), &payload_value).await? {
            return Ok(EnqueueOutcome::Inserted(payload.meta.receipt()));
        }

        let existing = sqlx::query_as::<_, JobRecord>(
            "SELECT * FROM intake_jobs WHERE idempotency_key = $1",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await?;

        resolve_existing(&existing, &payload, key)
    }

    /// Returns true when a row was inserted, false when the key already
    /// existed.
    async fn insert_row(&self, key: Option<&str>, payload: &Value) -> DbResult<bool> {
        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO intake_jobs (id, idempotency_key, payload, status, attempt_count, created_at, updated_at)
            VALUES ($1, $2, $3, 'queued', 0, NOW(), NOW())
            ON CONFLICT (idempotency_key) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(key)
        .bind(payload)
        .fetch_optional(&self.pool)
        .await?;
        Ok(inserted.is_some())
    }

    /// Claim the oldest queued job, if any.
    ///
    /// SKIP LOCKED lets concurrent workers pass over each other's rows
    /// instead of blocking. The claim transitions the row to `processing`
    /// and counts the attempt before any processing work begins, so a
    /// worker crash mid-job still consumes an attempt.
    pub async fn claim(&self) -> DbResult<Option<JobRecord>> {
        let job = sqlx::query_as::<_, JobRecord>(
            r#"
            UPDATE intake_jobs
            SET status = 'processing', attempt_count = attempt_count + 1, updated_at = NOW()
            WHERE id = (
                SELECT id FROM intake_jobs
                WHERE status = 'queued'
                ORDER BY created_at ASC
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            RETURNING *
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    /// Record a claimed job's terminal status. Success clears `last_error`.
    pub async fn finish(
        &self,
        job_id: Uuid,
        status: JobStatus,
        last_error: Option<&str>,
    ) -> DbResult<()> {
        sqlx::query(
            "UPDATE intake_jobs SET status = $1, last_error = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(status.as_str())
        .bind(last_error)
        .bind(job_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Put a failed job back in line for the dispatcher. This is the
    /// explicit operator-driven retry step; the claim query never
    /// re-selects `failed` rows on its own.
    pub async fn requeue(&self, job_id: Uuid) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE intake_jobs SET status = 'queued', updated_at = NOW() WHERE id = $1 AND status = 'failed'",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("failed job {job_id}")));
        }
        Ok(())
    }
}

/// Decide what a keyed enqueue that lost the insert race means. A resend of
/// the same logical request echoes the receipt recorded on the original row,
/// never the identifiers minted for this call; a different payload under the
/// same key is rejected, carrying this call's correlation id.
fn resolve_existing(
    existing: &JobRecord,
    incoming: &JobPayload,
    key: &str,
) -> DbResult<EnqueueOutcome> {
    let original = existing.parsed_payload()?;
    let stored = request_fingerprint(&original.lead, &original.meta.lead_source);
    let submitted = request_fingerprint(&incoming.lead, &incoming.meta.lead_source);
    if stored == submitted {
        Ok(EnqueueOutcome::Deduplicated(original.meta.receipt()))
    } else {
        Err(DbError::IdempotencyConflict {
            key: key.to_string(),
            correlation_id: incoming.meta.request_id.clone(),
        })
    }
}

#[async_trait]
impl JobSource for JobStore {
    async fn claim(&self) -> DbResult<Option<JobRecord>> {
        JobStore::claim(self).await
    }

    async fn finish(
        &self,
        job_id: Uuid,
        status: JobStatus,
        last_error: Option<&str>,
    ) -> DbResult<()> {
        JobStore::finish(self, job_id, status, last_error).await
    }
}

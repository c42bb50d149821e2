//! Core domain types for the LeadGen intake service.
//!
//! This crate contains:
//! - Intake identifiers and acceptance receipts
//! - The job status state machine and retry accounting
//! - Canonical JSON serialization and content hashing

pub mod canonical;
pub mod id;
pub mod intake;
pub mod job;

pub use canonical::{content_hash, to_canonical_string};
pub use id::IntakeId;
pub use intake::{AcceptanceReceipt, IntakeMeta, JobPayload};
pub use job::JobStatus;

//! HTTP intake API for the LeadGen service.
//!
//! The producer boundary: validates little, stamps intake metadata, and
//! hands the request to the durable job store. A 202 response means the job
//! row is committed, not that the lead has been materialized.

pub mod error;
pub mod routes;
pub mod state;

pub use state::AppState;

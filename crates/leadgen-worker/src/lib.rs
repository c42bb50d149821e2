//! Outbox dispatcher for the LeadGen intake service.
//!
//! Polls the job store, claims one queued job at a time, and drives it to a
//! terminal status through the schema-adaptive lead writer.

pub mod dispatcher;

pub use dispatcher::Dispatcher;

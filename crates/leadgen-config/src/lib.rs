//! Environment configuration for the LeadGen intake service.
//!
//! Both binaries read the same `LEADGEN_*` environment surface; the worker
//! additionally consumes the poll/retry knobs.

pub mod error;

pub use error::{ConfigError, ConfigResult};

use std::time::Duration;

/// Runtime settings shared by the API server and the worker.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Postgres connection string for the job store and destination table.
    pub database_url: String,
    /// Listen address for the API server.
    pub bind_addr: String,
    /// Destination table for materialized leads, optionally schema-qualified.
    pub leads_table: String,
    /// Fixed dispatcher poll interval.
    pub poll_interval: Duration,
    /// Attempt ceiling before a job is dead-lettered.
    pub max_attempts: i32,
    /// Bound on acquiring a database connection.
    pub connect_timeout: Duration,
    /// Deployment environment label, surfaced by /version.
    pub environment: String,
}

impl Settings {
    /// Load settings from process environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an injected lookup, so tests can supply their
    /// own environment.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("LEADGEN_DATABASE_URL")
            .ok_or_else(|| ConfigError::Missing("LEADGEN_DATABASE_URL".to_string()))?;

        let poll_seconds = parse_or(&lookup, "LEADGEN_WORKER_POLL_SECONDS", 0.5f64)?;
        if !poll_seconds.is_finite() || poll_seconds <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "LEADGEN_WORKER_POLL_SECONDS".to_string(),
                message: "must be a positive number of seconds".to_string(),
            });
        }
        let max_attempts = parse_or(&lookup, "LEADGEN_WORKER_MAX_ATTEMPTS", 10i32)?;
        if max_attempts < 1 {
            return Err(ConfigError::InvalidValue {
                field: "LEADGEN_WORKER_MAX_ATTEMPTS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        let connect_seconds = parse_or(&lookup, "LEADGEN_DB_CONNECT_SECONDS", 5u64)?;

        Ok(Self {
            database_url,
            bind_addr: lookup("LEADGEN_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            leads_table: lookup("LEADGEN_LEADS_TABLE").unwrap_or_else(|| "leads".to_string()),
            poll_interval: Duration::from_secs_f64(poll_seconds),
            max_attempts,
            connect_timeout: Duration::from_secs(connect_seconds),
            environment: lookup("LEADGEN_ENV").unwrap_or_else(|| "unknown".to_string()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> ConfigResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            field: key.to_string(),
            message: e.to_string(),
        }),
    }
}

//! Job status state machine.
//!
//! Transitions are owned by the dispatcher: `queued -> processing -> done`
//! on success, `-> failed` below the attempt ceiling, `-> dead` at or above
//! it. `failed` rows are not re-selected by the claim query; re-queueing a
//! failed job is an explicit operator step.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an intake job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[display("queued")]
    Queued,
    #[display("processing")]
    Processing,
    #[display("done")]
    Done,
    #[display("failed")]
    Failed,
    #[display("dead")]
    Dead,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
            JobStatus::Dead => "dead",
        }
    }

    /// Terminal status after a processing failure. Attempts are counted at
    /// claim time, so `attempt_count` already includes the claim that just
    /// failed.
    pub fn after_failure(attempt_count: i32, max_attempts: i32) -> JobStatus {
        if attempt_count >= max_attempts {
            JobStatus::Dead
        } else {
            JobStatus::Failed
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "processing" => Ok(JobStatus::Processing),
            "done" => Ok(JobStatus::Done),
            "failed" => Ok(JobStatus::Failed),
            "dead" => Ok(JobStatus::Dead),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_below_ceiling_is_retryable() {
        assert_eq!(JobStatus::after_failure(1, 10), JobStatus::Failed);
        assert_eq!(JobStatus::after_failure(9, 10), JobStatus::Failed);
    }

    #[test]
    fn failure_at_or_above_ceiling_is_dead() {
        assert_eq!(JobStatus::after_failure(10, 10), JobStatus::Dead);
        assert_eq!(JobStatus::after_failure(11, 10), JobStatus::Dead);
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            JobStatus::Queued,
            JobStatus::Processing,
            JobStatus::Done,
            JobStatus::Failed,
            JobStatus::Dead,
        ] {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
            assert_eq!(status.to_string(), status.as_str());
        }
    }
}

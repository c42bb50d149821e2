//! The dispatcher poll loop.

use std::sync::Arc;
use std::time::Duration;

use leadgen_core::JobStatus;
use leadgen_db::{JobRecord, JobSource, LeadSink};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Claims queued jobs and materializes them into the destination table.
///
/// Multiple dispatchers may run against the same job store: the claim query
/// uses SKIP LOCKED, so busy rows are passed over rather than waited on.
pub struct Dispatcher {
    store: Arc<dyn JobSource>,
    sink: Arc<dyn LeadSink>,
    poll_interval: Duration,
    max_attempts: i32,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn JobSource>,
        sink: Arc<dyn LeadSink>,
        poll_interval: Duration,
        max_attempts: i32,
    ) -> Self {
        Self {
            store,
            sink,
            poll_interval,
            max_attempts,
        }
    }

    /// Run the poll loop until the token is cancelled. Store errors are
    /// logged and followed by a backoff; the loop itself never gives up.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!("Starting dispatcher");

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            match self.store.claim().await {
                Ok(Some(job)) => {
                    self.process(job).await;
                }
                Ok(None) => {
                    self.idle(&shutdown, self.poll_interval).await;
                }
                Err(e) => {
                    warn!(error = %e, "Claim failed, backing off");
                    self.idle(&shutdown, self.poll_interval.max(Duration::from_secs(1)))
                        .await;
                }
            }
        }

        info!("Dispatcher stopped");
    }

    /// Drive one claimed job to a terminal status. The claim already
    /// committed `processing` and counted the attempt, so every outcome
    /// here is recorded against that attempt.
    async fn process(&self, job: JobRecord) {
        let result = match job.parsed_payload() {
            Ok(payload) => {
                info!(job_id = %job.id, intake_id = %payload.meta.intake_id, "Claimed job");
                self.sink.write(&payload.meta, &payload.lead).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                if let Err(e) = self.store.finish(job.id, JobStatus::Done, None).await {
                    error!(job_id = %job.id, error = %e, "Failed to mark job done");
                } else {
                    info!(job_id = %job.id, "Job done");
                }
            }
            Err(e) => {
                let status = JobStatus::after_failure(job.attempt_count, self.max_attempts);
                let message = e.to_string();
                if let Err(e) = self
                    .store
                    .finish(job.id, status, Some(message.as_str()))
                    .await
                {
                    error!(job_id = %job.id, error = %e, "Failed to record job failure");
                } else {
                    warn!(job_id = %job.id, status = %status, error = %message, "Job failed");
                }
            }
        }
    }

    async fn idle(&self, shutdown: &CancellationToken, duration: Duration) {
        tokio::select! {
            _ = shutdown.cancelled() => {}
            _ = sleep(duration) => {}
        }
    }
}

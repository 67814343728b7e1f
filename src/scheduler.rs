//! Periodic maintenance for the server process.

use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use tollgate_auth::SessionCleanup;
use tollgate_core::error::AppError;

/// Runs the expired-row sweep on a fixed interval.
pub struct SweepScheduler {
    scheduler: JobScheduler,
}

impl std::fmt::Debug for SweepScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepScheduler").finish()
    }
}

impl SweepScheduler {
    /// Create an idle scheduler.
    pub async fn new() -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;
        Ok(Self { scheduler })
    }

    /// Sweep expired sessions and reset tokens every `every`.
    ///
    /// A failed sweep is logged and retried on the next run.
    pub async fn register_sweep(
        &self,
        cleanup: Arc<SessionCleanup>,
        every: Duration,
    ) -> Result<(), AppError> {
        let job = CronJob::new_repeated_async(every, move |_uuid, _lock| {
            let cleanup = Arc::clone(&cleanup);
            Box::pin(async move {
                tracing::debug!("Running expired-row sweep");
                if let Err(e) = cleanup.sweep().await {
                    tracing::warn!(error = %e, "Expired-row sweep failed");
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create sweep schedule: {e}")))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add sweep schedule: {e}")))?;

        tracing::info!(interval_secs = every.as_secs(), "Registered: expired-row sweep");
        Ok(())
    }

    /// Start running registered jobs.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;
        tracing::info!("Scheduler started");
        Ok(())
    }

    /// Stop running jobs.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;
        tracing::info!("Scheduler shut down");
        Ok(())
    }
}

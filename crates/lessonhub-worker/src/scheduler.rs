//! Cron scheduler for the periodic expiration sweep.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use lessonhub_core::config::worker::WorkerConfig;
use lessonhub_core::error::AppError;
use lessonhub_service::ExpirationService;

/// Cron-based scheduler running the expiration sweep.
pub struct SweepScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// The service performing the sweep
    expiration: Arc<ExpirationService>,
    /// Worker configuration (cron expression)
    config: WorkerConfig,
}

impl std::fmt::Debug for SweepScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepScheduler").finish()
    }
}

impl SweepScheduler {
    /// Create a new sweep scheduler.
    pub async fn new(
        expiration: Arc<ExpirationService>,
        config: WorkerConfig,
    ) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            expiration,
            config,
        })
    }

    /// Register the expiration sweep at the configured cron schedule.
    pub async fn register_sweep(&self) -> Result<(), AppError> {
        let expiration = Arc::clone(&self.expiration);
        let job = CronJob::new_async(self.config.sweep_schedule.as_str(), move |_uuid, _lock| {
            let expiration = Arc::clone(&expiration);
            Box::pin(async move {
                tracing::debug!("Running expiration sweep");
                match expiration.process_expired().await {
                    Ok(report) if report.processed > 0 => {
                        tracing::info!(processed = report.processed, "Expiration sweep done");
                    }
                    Ok(_) => {
                        tracing::debug!("Expiration sweep found nothing to process");
                    }
                    Err(e) => {
                        tracing::error!("Expiration sweep failed: {}", e);
                    }
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create sweep schedule: {}", e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add sweep schedule: {}", e)))?;

        tracing::info!(schedule = %self.config.sweep_schedule, "Registered: expiration_sweep");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Sweep scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Sweep scheduler shut down");
        Ok(())
    }
}

//! Background job scheduler.
//!
//! Registers the recurring alert check on a [`JobScheduler`] at server
//! startup. Only one instance per deployment should have the scheduler
//! enabled; runs inside one process are already serialized by the
//! coordinator.

use std::sync::Arc;

use homealert_alerts::{AlertError, AlertRunCoordinator};
use homealert_core::AppConfig;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns `None` when `HOMEALERT_SCHEDULER_ENABLED` is off. Otherwise the
/// running [`JobScheduler`] handle must be kept alive for the lifetime of the
/// process; dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is rejected, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    coordinator: Arc<AlertRunCoordinator>,
    config: &AppConfig,
) -> Result<Option<JobScheduler>, JobSchedulerError> {
    if !config.scheduler_enabled {
        tracing::info!("scheduler: disabled by configuration");
        return Ok(None);
    }

    let scheduler = JobScheduler::new().await?;
    register_alert_job(
        &scheduler,
        pool,
        coordinator,
        &config.alert_cron,
        config.alert_hours_back,
    )
    .await?;
    scheduler.start().await?;
    Ok(Some(scheduler))
}

/// Register the recurring alert check on `cron` (six-field, UTC).
async fn register_alert_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    coordinator: Arc<AlertRunCoordinator>,
    cron: &str,
    hours_back: u32,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let coordinator = Arc::clone(&coordinator);

        Box::pin(async move {
            tracing::info!(hours_back, "scheduler: starting alert check");
            run_alert_job(&pool, &coordinator, hours_back).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, hours_back, "scheduler: alert check registered");
    Ok(())
}

async fn run_alert_job(pool: &PgPool, coordinator: &AlertRunCoordinator, hours_back: u32) {
    match homealert_alerts::run_recorded(pool, coordinator, "scheduler", hours_back).await {
        Ok(recorded) => {
            tracing::info!(
                run_id = %recorded.run_id,
                sent = recorded.summary.sent_count(),
                failed = recorded.summary.failed_count(),
                "scheduler: alert check complete"
            );
        }
        Err(AlertError::RunInProgress) => {
            tracing::warn!("scheduler: previous alert check still running; tick skipped");
        }
        Err(e) => {
            tracing::error!(error = %e, "scheduler: alert check failed");
        }
    }
}

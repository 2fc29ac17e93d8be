//! Runs the coordinator inside an `alert_runs` audit row.

use homealert_db::AlertRunCounts;
use sqlx::PgPool;
use uuid::Uuid;

use crate::coordinator::{validate_hours_back, AlertRunCoordinator, RunSummary};
use crate::error::{AlertError, StoreError};

/// A finished run together with the public id of its audit row.
#[derive(Debug, Clone)]
pub struct RecordedRun {
    pub run_id: Uuid,
    pub summary: RunSummary,
}

/// Creates a `queued` audit row, starts it, runs the coordinator, and marks
/// the row `succeeded` or `failed`.
///
/// No row is written for an out-of-range window or while another run holds
/// the coordinator's lock.
///
/// # Errors
///
/// Returns the coordinator's [`AlertError`] (after recording it on the row),
/// or [`AlertError::Store`] if the audit row itself cannot be written.
pub async fn run_recorded(
    pool: &PgPool,
    coordinator: &AlertRunCoordinator,
    trigger_source: &str,
    hours_back: u32,
) -> Result<RecordedRun, AlertError> {
    validate_hours_back(hours_back)?;
    let permit = coordinator.try_begin()?;

    let window = i32::try_from(hours_back).unwrap_or(i32::MAX);
    let run = homealert_db::create_alert_run(pool, trigger_source, window)
        .await
        .map_err(StoreError::from)?;
    homealert_db::start_alert_run(pool, run.id)
        .await
        .map_err(StoreError::from)?;

    match permit.run(hours_back).await {
        Ok(summary) => {
            let counts = AlertRunCounts {
                new_properties: saturating_i32(summary.new_properties_count),
                checked_searches: saturating_i32(summary.checked_searches),
                total_matches: saturating_i32(summary.total_matches),
                alerts_sent: saturating_i32(summary.sent_count()),
                alerts_failed: saturating_i32(summary.failed_count()),
            };
            homealert_db::complete_alert_run(pool, run.id, counts)
                .await
                .map_err(StoreError::from)?;
            Ok(RecordedRun {
                run_id: run.public_id,
                summary,
            })
        }
        Err(e) => {
            if let Err(record_err) = homealert_db::fail_alert_run(pool, run.id, &e.to_string()).await {
                tracing::error!(
                    run_id = %run.public_id,
                    error = %record_err,
                    "failed to mark alert run as failed"
                );
            }
            Err(e)
        }
    }
}

fn saturating_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_saturate_instead_of_wrapping() {
        assert_eq!(saturating_i32(7), 7);
        assert_eq!(saturating_i32(usize::MAX), i32::MAX);
    }
}

//! Database operations for `alert_runs`, the audit trail of scan-and-dispatch runs.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const ALERT_RUN_COLUMNS: &str = "id, public_id, trigger_source, hours_back, status, started_at, \
     completed_at, new_properties, checked_searches, total_matches, alerts_sent, alerts_failed, \
     error_message, created_at";

/// A row from the `alert_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AlertRunRow {
    pub id: i64,
    pub public_id: Uuid,
    /// `"scheduler"`, `"api"`, or `"cli"`.
    pub trigger_source: String,
    pub hours_back: i32,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub new_properties: i32,
    pub checked_searches: i32,
    pub total_matches: i32,
    pub alerts_sent: i32,
    pub alerts_failed: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Counters written when a run succeeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertRunCounts {
    pub new_properties: i32,
    pub checked_searches: i32,
    pub total_matches: i32,
    pub alerts_sent: i32,
    pub alerts_failed: i32,
}

/// Creates a new alert run in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_alert_run(
    pool: &PgPool,
    trigger_source: &str,
    hours_back: i32,
) -> Result<AlertRunRow, DbError> {
    let row = sqlx::query_as::<_, AlertRunRow>(&format!(
        "INSERT INTO alert_runs (public_id, trigger_source, hours_back, status) \
         VALUES ($1, $2, $3, 'queued') \
         RETURNING {ALERT_RUN_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(trigger_source)
    .bind(hours_back)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidAlertRunTransition`] if the run is not `queued`.
pub async fn start_alert_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE alert_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidAlertRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a run as `succeeded` and records its counters.
///
/// # Errors
///
/// Returns [`DbError::InvalidAlertRunTransition`] if the run is not `running`.
pub async fn complete_alert_run(
    pool: &PgPool,
    id: i64,
    counts: AlertRunCounts,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE alert_runs \
         SET status = 'succeeded', completed_at = NOW(), new_properties = $1, \
             checked_searches = $2, total_matches = $3, alerts_sent = $4, alerts_failed = $5 \
         WHERE id = $6 AND status = 'running'",
    )
    .bind(counts.new_properties)
    .bind(counts.checked_searches)
    .bind(counts.total_matches)
    .bind(counts.alerts_sent)
    .bind(counts.alerts_failed)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidAlertRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a run as `failed` with an error message.
///
/// # Errors
///
/// Returns [`DbError::InvalidAlertRunTransition`] if the run is not `running`.
pub async fn fail_alert_run(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE alert_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidAlertRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`.
pub async fn get_alert_run(pool: &PgPool, id: i64) -> Result<AlertRunRow, DbError> {
    let row = sqlx::query_as::<_, AlertRunRow>(&format!(
        "SELECT {ALERT_RUN_COLUMNS} FROM alert_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_alert_runs(pool: &PgPool, limit: i64) -> Result<Vec<AlertRunRow>, DbError> {
    let rows = sqlx::query_as::<_, AlertRunRow>(&format!(
        "SELECT {ALERT_RUN_COLUMNS} \
         FROM alert_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

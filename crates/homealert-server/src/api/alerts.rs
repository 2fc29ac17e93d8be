use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use homealert_alerts::RunSummary;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    map_alert_error, map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct CheckAlertsQuery {
    pub hours_back: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(super) struct CheckAlertsData {
    alert_run_id: Uuid,
    sent: usize,
    failed: usize,
    skipped: usize,
    #[serde(flatten)]
    summary: RunSummary,
}

#[derive(Debug, Deserialize)]
pub(super) struct AlertRunsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct AlertRunItem {
    alert_run_id: Uuid,
    trigger_source: String,
    hours_back: i32,
    status: String,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    new_properties: i32,
    checked_searches: i32,
    total_matches: i32,
    alerts_sent: i32,
    alerts_failed: i32,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<homealert_db::AlertRunRow> for AlertRunItem {
    fn from(row: homealert_db::AlertRunRow) -> Self {
        Self {
            alert_run_id: row.public_id,
            trigger_source: row.trigger_source,
            hours_back: row.hours_back,
            status: row.status,
            started_at: row.started_at,
            completed_at: row.completed_at,
            new_properties: row.new_properties,
            checked_searches: row.checked_searches,
            total_matches: row.total_matches,
            alerts_sent: row.alerts_sent,
            alerts_failed: row.alerts_failed,
            error_message: row.error_message,
            created_at: row.created_at,
        }
    }
}

/// Runs one scan-and-dispatch cycle synchronously and returns its summary.
pub(super) async fn check_alerts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CheckAlertsQuery>,
) -> Result<Json<ApiResponse<CheckAlertsData>>, ApiError> {
    let hours_back = query.hours_back.unwrap_or(state.default_hours_back);
    tracing::info!(hours_back, request_id = %req_id.0, "manual alert check requested");

    let recorded = homealert_alerts::run_recorded(&state.pool, &state.coordinator, "api", hours_back)
        .await
        .map_err(|e| map_alert_error(req_id.0.clone(), &e))?;

    let summary = recorded.summary;
    Ok(Json(ApiResponse {
        data: CheckAlertsData {
            alert_run_id: recorded.run_id,
            sent: summary.sent_count(),
            failed: summary.failed_count(),
            skipped: summary.skipped_count(),
            summary,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_alert_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<AlertRunsQuery>,
) -> Result<Json<ApiResponse<Vec<AlertRunItem>>>, ApiError> {
    let rows = homealert_db::list_alert_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(AlertRunItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_alerts_data_flattens_summary() {
        let now = Utc::now();
        let data = CheckAlertsData {
            alert_run_id: Uuid::nil(),
            sent: 0,
            failed: 0,
            skipped: 0,
            summary: RunSummary {
                matches: Vec::new(),
                total_matches: 0,
                matched_properties: 0,
                new_properties_count: 4,
                checked_searches: 2,
                skipped_over_quota: 1,
                delivery_outcomes: Vec::new(),
                started_at: now,
                finished_at: now,
            },
        };

        let json = serde_json::to_value(&data).expect("serialize");
        assert_eq!(json["new_properties_count"], 4);
        assert_eq!(json["checked_searches"], 2);
        assert_eq!(json["skipped_over_quota"], 1);
        assert!(json["delivery_outcomes"].is_array());
        assert!(json.get("summary").is_none());
    }
}

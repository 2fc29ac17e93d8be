use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use homealert_core::{
    AlertSettings, CoreError, PropertyRecord, SavedSearch, SavedSearchPatch, SearchCriteria,
    SearchOwner,
};
use homealert_db::NewSavedSearch;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    map_alert_error, map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct CreateSavedSearchRequest {
    pub user_email: String,
    pub user_name: String,
    pub user_phone: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub criteria: SearchCriteria,
    /// Product defaults (alerts on, daily, 5 per day) when omitted.
    pub alert_settings: Option<AlertSettings>,
}

impl CreateSavedSearchRequest {
    fn into_new_saved_search(self) -> NewSavedSearch {
        NewSavedSearch {
            owner: SearchOwner {
                email: homealert_core::normalize_email(&self.user_email),
                name: self.user_name.trim().to_string(),
                phone: non_blank(self.user_phone),
            },
            name: self.name.trim().to_string(),
            description: non_blank(self.description),
            criteria: self.criteria,
            alert_settings: self.alert_settings.unwrap_or_default(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validation_error(request_id: &str, error: &CoreError) -> ApiError {
    ApiError::new(request_id, "validation_error", error.to_string())
}

#[derive(Debug, Deserialize)]
pub(super) struct PreviewQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct PreviewData {
    saved_search_id: Uuid,
    total_matches: usize,
    properties: Vec<PropertyRecord>,
}

#[derive(Debug, Serialize)]
pub(super) struct DeactivatedData {
    saved_search_id: Uuid,
    is_active: bool,
}

/// POST /api/v1/saved-searches
pub(super) async fn create_saved_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateSavedSearchRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SavedSearch>>), ApiError> {
    let rid = &req_id.0;
    let new_search = body.into_new_saved_search();
    homealert_core::validate_search_fields(
        &new_search.owner,
        &new_search.name,
        new_search.description.as_deref(),
        &new_search.criteria,
        &new_search.alert_settings,
    )
    .map_err(|e| validation_error(rid, &e))?;

    let search = homealert_db::insert_saved_search(&state.pool, &new_search)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    tracing::info!(saved_search_id = %search.public_id, "saved search created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: search,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/v1/saved-searches/user/{email}
pub(super) async fn list_owner_saved_searches(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(email): Path<String>,
) -> Result<Json<ApiResponse<Vec<SavedSearch>>>, ApiError> {
    if email.trim().is_empty() {
        return Err(ApiError::new(&req_id.0, "bad_request", "user email is required"));
    }
    let searches = homealert_db::list_saved_searches_by_owner(&state.pool, &email)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: searches,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PUT /api/v1/saved-searches/{public_id}. Tracking fields in the body are
/// ignored.
pub(super) async fn update_saved_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(public_id): Path<Uuid>,
    Json(patch): Json<SavedSearchPatch>,
) -> Result<Json<ApiResponse<SavedSearch>>, ApiError> {
    let rid = &req_id.0;
    let mut search = homealert_db::get_saved_search_by_public_id(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    patch.apply_to(&mut search);
    homealert_core::validate_saved_search(&search).map_err(|e| validation_error(rid, &e))?;

    let updated = homealert_db::update_saved_search_details(&state.pool, &search)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    tracing::info!(saved_search_id = %public_id, "saved search updated");

    Ok(Json(ApiResponse {
        data: updated,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_saved_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(public_id): Path<Uuid>,
) -> Result<Json<ApiResponse<SavedSearch>>, ApiError> {
    let search = homealert_db::get_saved_search_by_public_id(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: search,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Soft delete: the row stays, alerts stop.
pub(super) async fn deactivate_saved_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(public_id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeactivatedData>>, ApiError> {
    homealert_db::deactivate_saved_search(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::info!(saved_search_id = %public_id, "saved search deactivated");

    Ok(Json(ApiResponse {
        data: DeactivatedData {
            saved_search_id: public_id,
            is_active: false,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Active listings that match the saved search right now, newest first.
pub(super) async fn preview_saved_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(public_id): Path<Uuid>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<ApiResponse<PreviewData>>, ApiError> {
    let limit = usize::try_from(normalize_limit(query.limit)).unwrap_or(1);
    let preview = homealert_alerts::preview_matches(
        state.store.as_ref(),
        state.store.as_ref(),
        public_id,
        limit,
    )
    .await
    .map_err(|e| map_alert_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: PreviewData {
            saved_search_id: preview.saved_search.public_id,
            total_matches: preview.total_matches,
            properties: preview.properties,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

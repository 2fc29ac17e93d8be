//! On-demand "which listings match this search" query over the full catalog.

use homealert_core::{matching, PropertyPrefilter, PropertyRecord, SavedSearch};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AlertError;
use crate::source::{PropertySource, SavedSearchStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchPreview {
    pub saved_search: SavedSearch,
    /// Matching listings, newest first, at most `limit` of them.
    pub properties: Vec<PropertyRecord>,
    /// Matches before the limit was applied.
    pub total_matches: usize,
}

/// Evaluates the saved search `public_id` against the active catalog.
///
/// Type and range clauses are pushed to the store; location and free-text
/// clauses are checked here, so the whole candidate set is held in memory.
///
/// # Errors
///
/// Returns [`AlertError::NotFound`] for an unknown id, or
/// [`AlertError::Store`] if a store call fails.
pub async fn preview_matches(
    properties: &dyn PropertySource,
    searches: &dyn SavedSearchStore,
    public_id: Uuid,
    limit: usize,
) -> Result<MatchPreview, AlertError> {
    let search = searches
        .find_by_public_id(public_id)
        .await?
        .ok_or(AlertError::NotFound(public_id))?;

    let prefilter = PropertyPrefilter::from_criteria(&search.criteria);
    let catalog = properties.find_active_candidates(&prefilter).await?;
    let matched = matching::filter_matches(&search.criteria, &catalog);
    let total_matches = matched.len();

    Ok(MatchPreview {
        properties: matched.into_iter().take(limit).cloned().collect(),
        total_matches,
        saved_search: search,
    })
}

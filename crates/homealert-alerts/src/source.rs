//! Seams to the listing catalog and the saved-search store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use homealert_core::{PropertyPrefilter, PropertyRecord, SavedSearch};
use uuid::Uuid;

use crate::error::StoreError;

/// Read-only access to listed properties.
#[async_trait]
pub trait PropertySource: Send + Sync {
    /// Active properties created at or after `created_after`, in a stable order.
    async fn find_active_since(
        &self,
        created_after: DateTime<Utc>,
    ) -> Result<Vec<PropertyRecord>, StoreError>;

    /// Active properties passing `prefilter`, newest first. May include rows
    /// that fail the full match predicate.
    async fn find_active_candidates(
        &self,
        prefilter: &PropertyPrefilter,
    ) -> Result<Vec<PropertyRecord>, StoreError>;
}

#[async_trait]
pub trait SavedSearchStore: Send + Sync {
    /// Searches that are active and have alerts switched on, in a stable order.
    async fn find_active_alertable(&self) -> Result<Vec<SavedSearch>, StoreError>;

    async fn find_by_public_id(&self, public_id: Uuid) -> Result<Option<SavedSearch>, StoreError>;

    /// Persists the tracking fields of `search`. Nothing else is written.
    async fn save_tracking(&self, search: &SavedSearch) -> Result<(), StoreError>;
}

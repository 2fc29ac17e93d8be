//! Postgres-backed implementations of the store seams.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use homealert_core::{PropertyPrefilter, PropertyRecord, SavedSearch};
use homealert_db::DbError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::source::{PropertySource, SavedSearchStore};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PropertySource for PgStore {
    async fn find_active_since(
        &self,
        created_after: DateTime<Utc>,
    ) -> Result<Vec<PropertyRecord>, StoreError> {
        Ok(homealert_db::list_active_properties_since(&self.pool, created_after).await?)
    }

    async fn find_active_candidates(
        &self,
        prefilter: &PropertyPrefilter,
    ) -> Result<Vec<PropertyRecord>, StoreError> {
        Ok(homealert_db::list_active_candidates(&self.pool, prefilter).await?)
    }
}

#[async_trait]
impl SavedSearchStore for PgStore {
    async fn find_active_alertable(&self) -> Result<Vec<SavedSearch>, StoreError> {
        Ok(homealert_db::list_alertable_saved_searches(&self.pool).await?)
    }

    async fn find_by_public_id(&self, public_id: Uuid) -> Result<Option<SavedSearch>, StoreError> {
        match homealert_db::get_saved_search_by_public_id(&self.pool, public_id).await {
            Ok(search) => Ok(Some(search)),
            Err(DbError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_tracking(&self, search: &SavedSearch) -> Result<(), StoreError> {
        Ok(homealert_db::update_alert_tracking(&self.pool, search).await?)
    }
}

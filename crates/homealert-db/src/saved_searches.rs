//! Database operations for `saved_searches`.
//!
//! Criteria and alert settings live in flat columns; [`SavedSearchRow`]
//! converts into the nested [`SavedSearch`] record the engine works with.

use chrono::{DateTime, NaiveDate, Utc};
use homealert_core::{
    normalize_email, AlertFrequency, AlertSettings, AlertTracking, PropertyType, SavedSearch,
    SearchCriteria, SearchOwner,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const SAVED_SEARCH_COLUMNS: &str = "id, public_id, user_email, user_name, user_phone, name, \
     description, county, constituency, ward, property_types, min_price, max_price, \
     min_bedrooms, max_bedrooms, min_bathrooms, max_bathrooms, search_term, alerts_active, \
     alert_frequency, max_alerts_per_day, last_alert_sent, total_alerts_sent, \
     alerts_sent_today, last_alert_reset_date, is_active, created_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `saved_searches` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SavedSearchRow {
    pub id: i64,
    pub public_id: Uuid,
    pub user_email: String,
    pub user_name: String,
    pub user_phone: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub county: Option<String>,
    pub constituency: Option<String>,
    pub ward: Option<String>,
    pub property_types: Vec<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_bedrooms: Option<i32>,
    pub max_bedrooms: Option<i32>,
    pub min_bathrooms: Option<i32>,
    pub max_bathrooms: Option<i32>,
    pub search_term: Option<String>,
    pub alerts_active: bool,
    pub alert_frequency: String,
    pub max_alerts_per_day: i32,
    pub last_alert_sent: Option<DateTime<Utc>>,
    pub total_alerts_sent: i32,
    pub alerts_sent_today: i32,
    pub last_alert_reset_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<SavedSearchRow> for SavedSearch {
    type Error = DbError;

    fn try_from(row: SavedSearchRow) -> Result<Self, Self::Error> {
        let invalid = |reason: String| DbError::InvalidRow {
            table: "saved_searches",
            id: row.id,
            reason,
        };

        let property_types = row
            .property_types
            .iter()
            .map(|tag| tag.parse::<PropertyType>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| invalid(e.to_string()))?;
        let frequency = row
            .alert_frequency
            .parse::<AlertFrequency>()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            id: row.id,
            public_id: row.public_id,
            owner: SearchOwner {
                email: row.user_email,
                name: row.user_name,
                phone: row.user_phone,
            },
            criteria: SearchCriteria {
                county: row.county,
                constituency: row.constituency,
                ward: row.ward,
                property_types,
                min_price: row.min_price,
                max_price: row.max_price,
                min_bedrooms: row.min_bedrooms,
                max_bedrooms: row.max_bedrooms,
                min_bathrooms: row.min_bathrooms,
                max_bathrooms: row.max_bathrooms,
                search_term: row.search_term,
            },
            alert_settings: AlertSettings {
                is_active: row.alerts_active,
                frequency,
                max_alerts_per_day: row.max_alerts_per_day,
            },
            name: row.name,
            description: row.description,
            is_active: row.is_active,
            tracking: AlertTracking {
                last_alert_sent: row.last_alert_sent,
                total_alerts_sent: row.total_alerts_sent,
                alerts_sent_today: row.alerts_sent_today,
                last_alert_reset_date: row.last_alert_reset_date,
            },
            created_at: row.created_at,
        })
    }
}

/// Input for [`insert_saved_search`].
#[derive(Debug, Clone)]
pub struct NewSavedSearch {
    pub owner: SearchOwner,
    pub name: String,
    pub description: Option<String>,
    pub criteria: SearchCriteria,
    pub alert_settings: AlertSettings,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns every saved search that is active and has alerts switched on,
/// oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidRow`]
/// if a stored type tag or frequency is not recognised.
pub async fn list_alertable_saved_searches(pool: &PgPool) -> Result<Vec<SavedSearch>, DbError> {
    let rows = sqlx::query_as::<_, SavedSearchRow>(&format!(
        "SELECT {SAVED_SEARCH_COLUMNS} \
         FROM saved_searches \
         WHERE is_active = true AND alerts_active = true \
         ORDER BY created_at ASC, id ASC"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(SavedSearch::try_from).collect()
}

/// Returns one owner's active saved searches, newest first. The email is
/// matched in its normalised form.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidRow`]
/// if a stored row cannot be decoded.
pub async fn list_saved_searches_by_owner(
    pool: &PgPool,
    user_email: &str,
) -> Result<Vec<SavedSearch>, DbError> {
    let rows = sqlx::query_as::<_, SavedSearchRow>(&format!(
        "SELECT {SAVED_SEARCH_COLUMNS} \
         FROM saved_searches \
         WHERE user_email = $1 AND is_active = true \
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(normalize_email(user_email))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(SavedSearch::try_from).collect()
}

/// Fetches a single saved search by its public id, active or not.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given id.
pub async fn get_saved_search_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<SavedSearch, DbError> {
    let row = sqlx::query_as::<_, SavedSearchRow>(&format!(
        "SELECT {SAVED_SEARCH_COLUMNS} FROM saved_searches WHERE public_id = $1"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    row.try_into()
}

/// Writes the alert-tracking columns of `search` back in one statement.
///
/// Only tracking columns are touched, so a concurrent edit of the criteria
/// is never overwritten.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the row no longer exists, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_alert_tracking(pool: &PgPool, search: &SavedSearch) -> Result<(), DbError> {
    let tracking = &search.tracking;
    let result = sqlx::query(
        "UPDATE saved_searches \
         SET last_alert_sent = $1, total_alerts_sent = $2, alerts_sent_today = $3, \
             last_alert_reset_date = $4, updated_at = NOW() \
         WHERE id = $5",
    )
    .bind(tracking.last_alert_sent)
    .bind(tracking.total_alerts_sent)
    .bind(tracking.alerts_sent_today)
    .bind(tracking.last_alert_reset_date)
    .bind(search.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Writes the editable columns of `search` (metadata, owner name and phone,
/// criteria, alert settings) and returns the stored row.
///
/// Tracking columns, the owner email, and `is_active` are never written, so a
/// run that is dispatching concurrently keeps its quota bookkeeping.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the row no longer exists,
/// [`DbError::DuplicateSearchName`] if the new name collides with another
/// active search of the same owner, or [`DbError::Sqlx`] on other failures.
pub async fn update_saved_search_details(
    pool: &PgPool,
    search: &SavedSearch,
) -> Result<SavedSearch, DbError> {
    let criteria = &search.criteria;
    let name = search.name.trim();

    let row = sqlx::query_as::<_, SavedSearchRow>(&format!(
        "UPDATE saved_searches \
         SET name = $1, description = $2, user_name = $3, user_phone = $4, \
             county = $5, constituency = $6, ward = $7, property_types = $8, \
             min_price = $9, max_price = $10, min_bedrooms = $11, max_bedrooms = $12, \
             min_bathrooms = $13, max_bathrooms = $14, search_term = $15, \
             alerts_active = $16, alert_frequency = $17, max_alerts_per_day = $18, \
             updated_at = NOW() \
         WHERE public_id = $19 \
         RETURNING {SAVED_SEARCH_COLUMNS}"
    ))
    .bind(name)
    .bind(search.description.as_deref())
    .bind(search.owner.name.trim())
    .bind(search.owner.phone.as_deref())
    .bind(criteria.county.as_deref())
    .bind(criteria.constituency.as_deref())
    .bind(criteria.ward.as_deref())
    .bind(type_tags(criteria))
    .bind(criteria.min_price)
    .bind(criteria.max_price)
    .bind(criteria.min_bedrooms)
    .bind(criteria.max_bedrooms)
    .bind(criteria.min_bathrooms)
    .bind(criteria.max_bathrooms)
    .bind(criteria.search_term.as_deref())
    .bind(search.alert_settings.is_active)
    .bind(search.alert_settings.frequency.as_str())
    .bind(search.alert_settings.max_alerts_per_day)
    .bind(search.public_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| duplicate_name_or(e, name))?
    .ok_or(DbError::NotFound)?;

    row.try_into()
}

/// Soft-deletes a saved search by clearing `is_active`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given id.
pub async fn deactivate_saved_search(pool: &PgPool, public_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE saved_searches SET is_active = false, updated_at = NOW() WHERE public_id = $1",
    )
    .bind(public_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Inserts a saved search with fresh tracking state and returns it.
///
/// # Errors
///
/// Returns [`DbError::DuplicateSearchName`] if the owner already has an
/// active search with this name, or [`DbError::Sqlx`] if the insert fails
/// (including check-constraint violations such as `max_alerts_per_day`
/// outside 1..=20).
pub async fn insert_saved_search(
    pool: &PgPool,
    search: &NewSavedSearch,
) -> Result<SavedSearch, DbError> {
    let criteria = &search.criteria;
    let name = search.name.trim();

    let row = sqlx::query_as::<_, SavedSearchRow>(&format!(
        "INSERT INTO saved_searches \
             (public_id, user_email, user_name, user_phone, name, description, \
              county, constituency, ward, property_types, min_price, max_price, \
              min_bedrooms, max_bedrooms, min_bathrooms, max_bathrooms, search_term, \
              alerts_active, alert_frequency, max_alerts_per_day) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                 $17, $18, $19, $20) \
         RETURNING {SAVED_SEARCH_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(normalize_email(&search.owner.email))
    .bind(search.owner.name.trim())
    .bind(search.owner.phone.as_deref())
    .bind(name)
    .bind(search.description.as_deref())
    .bind(criteria.county.as_deref())
    .bind(criteria.constituency.as_deref())
    .bind(criteria.ward.as_deref())
    .bind(type_tags(criteria))
    .bind(criteria.min_price)
    .bind(criteria.max_price)
    .bind(criteria.min_bedrooms)
    .bind(criteria.max_bedrooms)
    .bind(criteria.min_bathrooms)
    .bind(criteria.max_bathrooms)
    .bind(criteria.search_term.as_deref())
    .bind(search.alert_settings.is_active)
    .bind(search.alert_settings.frequency.as_str())
    .bind(search.alert_settings.max_alerts_per_day)
    .fetch_one(pool)
    .await
    .map_err(|e| duplicate_name_or(e, name))?;

    row.try_into()
}

fn type_tags(criteria: &SearchCriteria) -> Vec<&'static str> {
    criteria
        .property_types
        .iter()
        .map(|ty| ty.as_str())
        .collect()
}

/// Maps a hit on `idx_saved_searches_owner_active_name` to
/// [`DbError::DuplicateSearchName`].
fn duplicate_name_or(error: sqlx::Error, name: &str) -> DbError {
    if let sqlx::Error::Database(db_err) = &error {
        if db_err.code().as_deref() == Some("23505")
            && db_err.constraint() == Some("idx_saved_searches_owner_active_name")
        {
            return DbError::DuplicateSearchName {
                name: name.to_string(),
            };
        }
    }
    DbError::Sqlx(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_row() -> SavedSearchRow {
        SavedSearchRow {
            id: 3,
            public_id: Uuid::new_v4(),
            user_email: "otieno@example.com".to_string(),
            user_name: "Otieno".to_string(),
            user_phone: Some("+254700000000".to_string()),
            name: "Westlands apartments".to_string(),
            description: None,
            county: Some("Nairobi".to_string()),
            constituency: Some("Westlands".to_string()),
            ward: None,
            property_types: vec!["apartment".to_string(), "office".to_string()],
            min_price: None,
            max_price: Some(Decimal::new(80_000, 0)),
            min_bedrooms: Some(2),
            max_bedrooms: None,
            min_bathrooms: None,
            max_bathrooms: None,
            search_term: Some("parking".to_string()),
            alerts_active: true,
            alert_frequency: "weekly".to_string(),
            max_alerts_per_day: 3,
            last_alert_sent: None,
            total_alerts_sent: 4,
            alerts_sent_today: 1,
            last_alert_reset_date: NaiveDate::from_ymd_opt(2026, 5, 1),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn row_converts_into_nested_saved_search() {
        let row = make_row();
        let public_id = row.public_id;
        let search = SavedSearch::try_from(row).expect("convert");

        assert_eq!(search.public_id, public_id);
        assert_eq!(search.owner.email, "otieno@example.com");
        assert_eq!(search.criteria.constituency.as_deref(), Some("Westlands"));
        assert_eq!(
            search.criteria.property_types,
            vec![PropertyType::Apartment, PropertyType::Office]
        );
        assert_eq!(search.criteria.max_price, Some(Decimal::new(80_000, 0)));
        assert_eq!(search.alert_settings.frequency, AlertFrequency::Weekly);
        assert_eq!(search.alert_settings.max_alerts_per_day, 3);
        assert_eq!(search.tracking.total_alerts_sent, 4);
        assert_eq!(search.tracking.alerts_sent_today, 1);
        assert!(search.is_alertable());
    }

    #[test]
    fn unknown_property_type_is_reported_with_row_id() {
        let mut row = make_row();
        row.property_types.push("castle".to_string());
        let err = SavedSearch::try_from(row).unwrap_err();
        assert!(
            matches!(err, DbError::InvalidRow { id: 3, ref reason, .. } if reason.contains("castle")),
            "got: {err:?}"
        );
    }

    #[test]
    fn unknown_frequency_is_rejected() {
        let mut row = make_row();
        row.alert_frequency = "hourly".to_string();
        assert!(SavedSearch::try_from(row).is_err());
    }
}

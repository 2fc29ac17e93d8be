//! Read access to the `properties` listing table.

use chrono::{DateTime, Utc};
use homealert_core::{PropertyPrefilter, PropertyRecord};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const PROPERTY_COLUMNS: &str = "id, public_id, title, description, price, location, county, \
     constituency, ward, property_type, bedrooms, bathrooms, is_active, created_at";

/// A row from the `properties` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PropertyRow {
    pub id: i64,
    pub public_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub location: String,
    pub county: Option<String>,
    pub constituency: Option<String>,
    pub ward: Option<String>,
    pub property_type: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<PropertyRow> for PropertyRecord {
    fn from(row: PropertyRow) -> Self {
        Self {
            id: row.id,
            public_id: row.public_id,
            title: row.title,
            description: row.description,
            price: row.price,
            location: row.location,
            county: row.county,
            constituency: row.constituency,
            ward: row.ward,
            property_type: row.property_type,
            bedrooms: row.bedrooms,
            bathrooms: row.bathrooms,
            created_at: row.created_at,
            is_active: row.is_active,
        }
    }
}

/// Input for [`insert_property`].
#[derive(Debug, Clone)]
pub struct NewProperty {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub location: String,
    pub county: Option<String>,
    pub constituency: Option<String>,
    pub ward: Option<String>,
    pub property_type: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
}

/// Returns active properties created at or after `created_after`, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_properties_since(
    pool: &PgPool,
    created_after: DateTime<Utc>,
) -> Result<Vec<PropertyRecord>, DbError> {
    let rows = sqlx::query_as::<_, PropertyRow>(&format!(
        "SELECT {PROPERTY_COLUMNS} \
         FROM properties \
         WHERE is_active = true AND created_at >= $1 \
         ORDER BY created_at ASC, id ASC"
    ))
    .bind(created_after)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PropertyRecord::from).collect())
}

/// Returns active properties that pass `prefilter`, newest first.
///
/// Location and free-text clauses are not applied here; callers still run
/// [`homealert_core::matches`] over the result.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_candidates(
    pool: &PgPool,
    prefilter: &PropertyPrefilter,
) -> Result<Vec<PropertyRecord>, DbError> {
    let property_types: Vec<&str> = prefilter
        .property_types
        .iter()
        .map(|ty| ty.as_str())
        .collect();

    let rows = sqlx::query_as::<_, PropertyRow>(&format!(
        "SELECT {PROPERTY_COLUMNS} \
         FROM properties \
         WHERE is_active = true \
           AND (cardinality($1::text[]) = 0 OR property_type = ANY($1)) \
           AND ($2::numeric IS NULL OR price >= $2) \
           AND ($3::numeric IS NULL OR price <= $3) \
           AND ($4::int IS NULL OR bedrooms >= $4) \
           AND ($5::int IS NULL OR bedrooms <= $5) \
           AND ($6::int IS NULL OR bathrooms >= $6) \
           AND ($7::int IS NULL OR bathrooms <= $7) \
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(property_types)
    .bind(prefilter.min_price)
    .bind(prefilter.max_price)
    .bind(prefilter.min_bedrooms)
    .bind(prefilter.max_bedrooms)
    .bind(prefilter.min_bathrooms)
    .bind(prefilter.max_bathrooms)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PropertyRecord::from).collect())
}

/// Inserts a listing and returns it. Used by seeding and tests; listings are
/// otherwise owned by the catalog service.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_property(
    pool: &PgPool,
    property: &NewProperty,
) -> Result<PropertyRecord, DbError> {
    let row = sqlx::query_as::<_, PropertyRow>(&format!(
        "INSERT INTO properties \
             (public_id, title, description, price, location, county, constituency, ward, \
              property_type, bedrooms, bathrooms) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING {PROPERTY_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&property.title)
    .bind(&property.description)
    .bind(property.price)
    .bind(&property.location)
    .bind(property.county.as_deref())
    .bind(property.constituency.as_deref())
    .bind(property.ward.as_deref())
    .bind(&property.property_type)
    .bind(property.bedrooms)
    .bind(property.bathrooms)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A listed property as seen by the alert engine.
///
/// The engine never mutates these; they are read from the listing store and
/// handed to the predicate and the mail renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: i64,
    pub public_id: Uuid,
    pub title: String,
    pub description: String,
    /// Asking price in Kenyan shillings.
    pub price: Decimal,
    /// Free-form location line shown on the listing, e.g. `"Kilimani, Nairobi"`.
    pub location: String,
    pub county: Option<String>,
    pub constituency: Option<String>,
    pub ward: Option<String>,
    /// Type tag as stored on the listing (`"apartment"`, `"house"`, ...).
    pub property_type: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl PropertyRecord {
    /// Human-readable place line: `ward, constituency, county` when all three
    /// are known, otherwise the raw `location` string.
    #[must_use]
    pub fn display_location(&self) -> String {
        match (&self.ward, &self.constituency, &self.county) {
            (Some(ward), Some(constituency), Some(county)) => {
                format!("{ward}, {constituency}, {county}")
            }
            _ => self.location.clone(),
        }
    }
}

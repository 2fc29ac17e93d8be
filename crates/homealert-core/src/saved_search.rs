use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::CoreError;

pub const DEFAULT_MAX_ALERTS_PER_DAY: i32 = 5;
pub const MAX_ALERTS_PER_DAY_LIMIT: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Apartment,
    House,
    Land,
    Commercial,
    Office,
}

impl PropertyType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyType::Apartment => "apartment",
            PropertyType::House => "house",
            PropertyType::Land => "land",
            PropertyType::Commercial => "commercial",
            PropertyType::Office => "office",
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apartment" => Ok(PropertyType::Apartment),
            "house" => Ok(PropertyType::House),
            "land" => Ok(PropertyType::Land),
            "commercial" => Ok(PropertyType::Commercial),
            "office" => Ok(PropertyType::Office),
            other => Err(CoreError::InvalidPropertyType(other.to_string())),
        }
    }
}

/// How often the owner would like to hear about matches. Advisory only: the
/// engine enforces the per-day cap, not the cadence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertFrequency {
    Immediate,
    #[default]
    Daily,
    Weekly,
}

impl AlertFrequency {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AlertFrequency::Immediate => "immediate",
            AlertFrequency::Daily => "daily",
            AlertFrequency::Weekly => "weekly",
        }
    }
}

impl std::fmt::Display for AlertFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertFrequency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "immediate" => Ok(AlertFrequency::Immediate),
            "daily" => Ok(AlertFrequency::Daily),
            "weekly" => Ok(AlertFrequency::Weekly),
            other => Err(CoreError::InvalidAlertFrequency(other.to_string())),
        }
    }
}

/// Filters a saved search applies to listings. Every field is optional; an
/// empty value means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCriteria {
    pub county: Option<String>,
    pub constituency: Option<String>,
    pub ward: Option<String>,
    pub property_types: Vec<PropertyType>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_bedrooms: Option<i32>,
    pub max_bedrooms: Option<i32>,
    pub min_bathrooms: Option<i32>,
    pub max_bathrooms: Option<i32>,
    pub search_term: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSettings {
    pub is_active: bool,
    pub frequency: AlertFrequency,
    /// Daily send cap, 1..=20.
    pub max_alerts_per_day: i32,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            is_active: true,
            frequency: AlertFrequency::Daily,
            max_alerts_per_day: DEFAULT_MAX_ALERTS_PER_DAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOwner {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
}

/// Alert bookkeeping. Only the dispatcher writes these fields back to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertTracking {
    pub last_alert_sent: Option<DateTime<Utc>>,
    /// Lifetime count of delivered alerts. Never decremented.
    pub total_alerts_sent: i32,
    /// Alerts delivered since `last_alert_reset_date`.
    pub alerts_sent_today: i32,
    pub last_alert_reset_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSearch {
    pub id: i64,
    pub public_id: Uuid,
    pub owner: SearchOwner,
    pub criteria: SearchCriteria,
    pub alert_settings: AlertSettings,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub tracking: AlertTracking,
    pub created_at: DateTime<Utc>,
}

impl SavedSearch {
    /// Whether the scanner should consider this search at all.
    #[must_use]
    pub fn is_alertable(&self) -> bool {
        self.is_active && self.alert_settings.is_active
    }
}

/// Editable fields of a saved search. Absent fields keep their current value.
///
/// Tracking fields, the owner email, and `is_active` have no counterpart here,
/// so they are ignored if a request body carries them.
// Option<Option<T>>: outer None = keep, Some(None) = clear, Some(Some(v)) = set.
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SavedSearchPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub user_name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub user_phone: Option<Option<String>>,
    pub criteria: Option<SearchCriteria>,
    pub alert_settings: Option<AlertSettings>,
}

impl SavedSearchPatch {
    /// Writes the present fields onto `search`, trimming text.
    pub fn apply_to(self, search: &mut SavedSearch) {
        if let Some(name) = self.name {
            search.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            search.description = trimmed(description);
        }
        if let Some(user_name) = self.user_name {
            search.owner.name = user_name.trim().to_string();
        }
        if let Some(phone) = self.user_phone {
            search.owner.phone = trimmed(phone);
        }
        if let Some(criteria) = self.criteria {
            search.criteria = criteria;
        }
        if let Some(settings) = self.alert_settings {
            search.alert_settings = settings;
        }
    }
}

/// Maps a present field (including `null`) to `Some`, so `null` means "clear".
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_search() -> SavedSearch {
        SavedSearch {
            id: 7,
            public_id: Uuid::new_v4(),
            owner: SearchOwner {
                email: "njeri@example.com".to_string(),
                name: "Njeri".to_string(),
                phone: Some("+254711000000".to_string()),
            },
            criteria: SearchCriteria {
                county: Some("Kiambu".to_string()),
                ..SearchCriteria::default()
            },
            alert_settings: AlertSettings::default(),
            name: "Ruiru houses".to_string(),
            description: Some("near the bypass".to_string()),
            is_active: true,
            tracking: AlertTracking {
                last_alert_sent: None,
                total_alerts_sent: 9,
                alerts_sent_today: 2,
                last_alert_reset_date: NaiveDate::from_ymd_opt(2026, 10, 19),
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn patch_ignores_tracking_and_ownership_fields() {
        let patch: SavedSearchPatch = serde_json::from_str(
            r#"{
                "name": "  Ruiru maisonettes ",
                "alerts_sent_today": 0,
                "total_alerts_sent": 0,
                "last_alert_sent": "2026-10-19T08:00:00Z",
                "last_alert_reset_date": "2020-01-01",
                "user_email": "someone-else@example.com",
                "is_active": false
            }"#,
        )
        .expect("deserialize patch");

        let mut search = stored_search();
        let before = search.clone();
        patch.apply_to(&mut search);

        assert_eq!(search.name, "Ruiru maisonettes");
        assert_eq!(search.tracking, before.tracking);
        assert_eq!(search.owner.email, before.owner.email);
        assert!(search.is_active);
        assert_eq!(search.criteria, before.criteria);
    }

    #[test]
    fn patch_distinguishes_clear_from_keep() {
        let patch: SavedSearchPatch = serde_json::from_str(
            r#"{
                "description": null,
                "alert_settings": {"is_active": false, "frequency": "weekly", "max_alerts_per_day": 2}
            }"#,
        )
        .expect("deserialize patch");

        let mut search = stored_search();
        patch.apply_to(&mut search);

        assert_eq!(search.description, None);
        assert_eq!(search.owner.phone.as_deref(), Some("+254711000000"));
        assert!(!search.alert_settings.is_active);
        assert_eq!(search.alert_settings.frequency, AlertFrequency::Weekly);
        assert_eq!(search.alert_settings.max_alerts_per_day, 2);
    }

    #[test]
    fn property_type_round_trips_through_str() {
        for ty in [
            PropertyType::Apartment,
            PropertyType::House,
            PropertyType::Land,
            PropertyType::Commercial,
            PropertyType::Office,
        ] {
            assert_eq!(ty.as_str().parse::<PropertyType>().unwrap(), ty);
        }
    }

    #[test]
    fn property_type_rejects_unknown_tag() {
        let err = "castle".parse::<PropertyType>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidPropertyType(ref s) if s == "castle"));
    }

    #[test]
    fn alert_frequency_rejects_unknown_tag() {
        assert!("hourly".parse::<AlertFrequency>().is_err());
        assert_eq!(
            "weekly".parse::<AlertFrequency>().unwrap(),
            AlertFrequency::Weekly
        );
    }

    #[test]
    fn alert_settings_default_matches_product_defaults() {
        let settings = AlertSettings::default();
        assert!(settings.is_active);
        assert_eq!(settings.frequency, AlertFrequency::Daily);
        assert_eq!(settings.max_alerts_per_day, 5);
    }

    #[test]
    fn criteria_deserializes_from_partial_json() {
        let criteria: SearchCriteria = serde_json::from_str(
            r#"{"county":"Nairobi","property_types":["apartment","house"],"max_price":"60000"}"#,
        )
        .expect("deserialize criteria");
        assert_eq!(criteria.county.as_deref(), Some("Nairobi"));
        assert_eq!(
            criteria.property_types,
            vec![PropertyType::Apartment, PropertyType::House]
        );
        assert_eq!(criteria.max_price, Some(Decimal::new(60_000, 0)));
        assert!(criteria.min_price.is_none());
        assert!(criteria.search_term.is_none());
    }
}

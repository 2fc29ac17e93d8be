//! Field rules for saved searches, checked before anything is written.

use rust_decimal::Decimal;

use crate::saved_search::{
    AlertSettings, SavedSearch, SearchCriteria, SearchOwner, MAX_ALERTS_PER_DAY_LIMIT,
};
use crate::CoreError;

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Owner emails are stored trimmed and lowercased; lookups use the same form.
#[must_use]
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Checks owner, metadata, criteria and alert settings of a saved search.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] naming the first offending field.
pub fn validate_search_fields(
    owner: &SearchOwner,
    name: &str,
    description: Option<&str>,
    criteria: &SearchCriteria,
    settings: &AlertSettings,
) -> Result<(), CoreError> {
    validate_owner(owner)?;
    validate_name(name)?;
    if let Some(description) = description {
        if description.trim().chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(invalid(format!(
                "description must be at most {MAX_DESCRIPTION_CHARS} characters"
            )));
        }
    }
    validate_criteria(criteria)?;
    validate_alert_settings(settings)
}

/// [`validate_search_fields`] over a whole record.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] naming the first offending field.
pub fn validate_saved_search(search: &SavedSearch) -> Result<(), CoreError> {
    validate_search_fields(
        &search.owner,
        &search.name,
        search.description.as_deref(),
        &search.criteria,
        &search.alert_settings,
    )
}

fn validate_owner(owner: &SearchOwner) -> Result<(), CoreError> {
    let email = normalize_email(&owner.email);
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        return Err(invalid(format!("user_email '{}' is not a valid address", owner.email)));
    }
    if owner.name.trim().is_empty() {
        return Err(invalid("user_name is required".to_string()));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), CoreError> {
    let len = name.trim().chars().count();
    if len == 0 || len > MAX_NAME_CHARS {
        return Err(invalid(format!("name must be 1-{MAX_NAME_CHARS} characters")));
    }
    Ok(())
}

fn validate_criteria(criteria: &SearchCriteria) -> Result<(), CoreError> {
    let prices = [("min_price", criteria.min_price), ("max_price", criteria.max_price)];
    for (field, value) in prices {
        if value.is_some_and(|v| v < Decimal::ZERO) {
            return Err(invalid(format!("{field} must not be negative")));
        }
    }

    let counts = [
        ("min_bedrooms", criteria.min_bedrooms),
        ("max_bedrooms", criteria.max_bedrooms),
        ("min_bathrooms", criteria.min_bathrooms),
        ("max_bathrooms", criteria.max_bathrooms),
    ];
    for (field, value) in counts {
        if value.is_some_and(|v| v < 0) {
            return Err(invalid(format!("{field} must not be negative")));
        }
    }
    Ok(())
}

fn validate_alert_settings(settings: &AlertSettings) -> Result<(), CoreError> {
    if !(1..=MAX_ALERTS_PER_DAY_LIMIT).contains(&settings.max_alerts_per_day) {
        return Err(invalid(format!(
            "max_alerts_per_day must be between 1 and {MAX_ALERTS_PER_DAY_LIMIT}, got {}",
            settings.max_alerts_per_day
        )));
    }
    Ok(())
}

fn invalid(message: String) -> CoreError {
    CoreError::Validation(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> SearchOwner {
        SearchOwner {
            email: "Wanjiru@Example.com".to_string(),
            name: "Wanjiru".to_string(),
            phone: None,
        }
    }

    fn check(criteria: &SearchCriteria, settings: &AlertSettings) -> Result<(), CoreError> {
        validate_search_fields(&owner(), "Westlands flats", None, criteria, settings)
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Wanjiru@Example.COM "), "wanjiru@example.com");
    }

    #[test]
    fn defaults_are_valid() {
        assert!(check(&SearchCriteria::default(), &AlertSettings::default()).is_ok());
    }

    #[test]
    fn zero_bounds_are_allowed() {
        let criteria = SearchCriteria {
            min_price: Some(Decimal::ZERO),
            min_bedrooms: Some(0),
            ..SearchCriteria::default()
        };
        assert!(check(&criteria, &AlertSettings::default()).is_ok());
    }

    #[test]
    fn negative_bounds_are_rejected() {
        let criteria = SearchCriteria {
            max_bathrooms: Some(-1),
            ..SearchCriteria::default()
        };
        let err = check(&criteria, &AlertSettings::default()).unwrap_err();
        assert!(err.to_string().contains("max_bathrooms"), "got: {err}");

        let criteria = SearchCriteria {
            min_price: Some(Decimal::new(-5, 0)),
            ..SearchCriteria::default()
        };
        assert!(check(&criteria, &AlertSettings::default()).is_err());
    }

    #[test]
    fn daily_cap_must_be_within_range() {
        for cap in [0, 21] {
            let settings = AlertSettings {
                max_alerts_per_day: cap,
                ..AlertSettings::default()
            };
            assert!(
                matches!(check(&SearchCriteria::default(), &settings), Err(CoreError::Validation(_))),
                "cap {cap} should be rejected"
            );
        }
        let settings = AlertSettings {
            max_alerts_per_day: 20,
            ..AlertSettings::default()
        };
        assert!(check(&SearchCriteria::default(), &settings).is_ok());
    }

    #[test]
    fn name_and_owner_are_required() {
        let criteria = SearchCriteria::default();
        let settings = AlertSettings::default();
        assert!(validate_search_fields(&owner(), "   ", None, &criteria, &settings).is_err());
        assert!(
            validate_search_fields(&owner(), &"x".repeat(101), None, &criteria, &settings).is_err()
        );

        let nameless = SearchOwner {
            name: " ".to_string(),
            ..owner()
        };
        assert!(validate_search_fields(&nameless, "Flats", None, &criteria, &settings).is_err());

        let bad_email = SearchOwner {
            email: "wanjiru".to_string(),
            ..owner()
        };
        assert!(validate_search_fields(&bad_email, "Flats", None, &criteria, &settings).is_err());
    }

    #[test]
    fn long_description_is_rejected() {
        let long = "d".repeat(501);
        let err = validate_search_fields(
            &owner(),
            "Flats",
            Some(&long),
            &SearchCriteria::default(),
            &AlertSettings::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("description"), "got: {err}");
    }
}

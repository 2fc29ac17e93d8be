//! The saved-search match predicate.
//!
//! [`matches`] is a conjunction of independent clauses. A clause whose
//! criterion is absent always passes, so an empty [`SearchCriteria`] matches
//! every property.

use rust_decimal::Decimal;

use crate::property::PropertyRecord;
use crate::saved_search::{PropertyType, SearchCriteria};

/// Returns `true` when `property` satisfies every clause present in `criteria`.
///
/// Zero-valued numeric bounds (`min_bedrooms: Some(0)`, `max_price: Some(0)`)
/// are treated as absent rather than as a constraint of zero.
#[must_use]
pub fn matches(criteria: &SearchCriteria, property: &PropertyRecord) -> bool {
    location_matches(criteria.county.as_deref(), property.county.as_deref())
        && location_matches(
            criteria.constituency.as_deref(),
            property.constituency.as_deref(),
        )
        && location_matches(criteria.ward.as_deref(), property.ward.as_deref())
        && type_matches(&criteria.property_types, property)
        && within_bounds(
            property.price,
            nonzero_decimal(criteria.min_price),
            nonzero_decimal(criteria.max_price),
        )
        && within_bounds(
            property.bedrooms,
            nonzero(criteria.min_bedrooms),
            nonzero(criteria.max_bedrooms),
        )
        && within_bounds(
            property.bathrooms,
            nonzero(criteria.min_bathrooms),
            nonzero(criteria.max_bathrooms),
        )
        && term_matches(criteria.search_term.as_deref(), property)
}

/// Returns the properties that satisfy `criteria`, preserving input order.
#[must_use]
pub fn filter_matches<'a>(
    criteria: &SearchCriteria,
    properties: &'a [PropertyRecord],
) -> Vec<&'a PropertyRecord> {
    properties.iter().filter(|p| matches(criteria, p)).collect()
}

/// The type and numeric-range clauses of a [`SearchCriteria`], with zero
/// bounds already dropped.
///
/// These clauses compare exactly, so a store can evaluate them in its query
/// and hand [`matches`] a smaller candidate set. Every property that passes
/// [`matches`] also passes [`PropertyPrefilter::admits`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyPrefilter {
    pub property_types: Vec<PropertyType>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_bedrooms: Option<i32>,
    pub max_bedrooms: Option<i32>,
    pub min_bathrooms: Option<i32>,
    pub max_bathrooms: Option<i32>,
}

impl PropertyPrefilter {
    #[must_use]
    pub fn from_criteria(criteria: &SearchCriteria) -> Self {
        Self {
            property_types: criteria.property_types.clone(),
            min_price: nonzero_decimal(criteria.min_price),
            max_price: nonzero_decimal(criteria.max_price),
            min_bedrooms: nonzero(criteria.min_bedrooms),
            max_bedrooms: nonzero(criteria.max_bedrooms),
            min_bathrooms: nonzero(criteria.min_bathrooms),
            max_bathrooms: nonzero(criteria.max_bathrooms),
        }
    }

    #[must_use]
    pub fn admits(&self, property: &PropertyRecord) -> bool {
        type_matches(&self.property_types, property)
            && within_bounds(property.price, self.min_price, self.max_price)
            && within_bounds(property.bedrooms, self.min_bedrooms, self.max_bedrooms)
            && within_bounds(property.bathrooms, self.min_bathrooms, self.max_bathrooms)
    }
}

fn location_matches(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match (non_empty(wanted), non_empty(actual)) {
        (Some(wanted), Some(actual)) => wanted.to_lowercase() == actual.to_lowercase(),
        _ => true,
    }
}

fn type_matches(types: &[PropertyType], property: &PropertyRecord) -> bool {
    types.is_empty() || types.iter().any(|ty| ty.as_str() == property.property_type)
}

fn within_bounds<T: PartialOrd>(value: T, min: Option<T>, max: Option<T>) -> bool {
    if min.is_some_and(|min| value < min) {
        return false;
    }
    !max.is_some_and(|max| value > max)
}

fn term_matches(term: Option<&str>, property: &PropertyRecord) -> bool {
    let Some(term) = non_empty(term) else {
        return true;
    };
    let haystack = format!(
        "{} {} {}",
        property.title, property.description, property.location
    )
    .to_lowercase();
    haystack.contains(&term.to_lowercase())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn nonzero(bound: Option<i32>) -> Option<i32> {
    bound.filter(|b| *b != 0)
}

fn nonzero_decimal(bound: Option<Decimal>) -> Option<Decimal> {
    bound.filter(|b| !b.is_zero())
}

#[cfg(test)]
#[path = "matching_test.rs"]
mod tests;

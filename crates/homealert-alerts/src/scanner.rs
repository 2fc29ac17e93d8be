//! Pairs newly listed properties with the saved searches they satisfy.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use homealert_core::{matching, quota, PropertyRecord, SavedSearch};

use crate::error::AlertError;
use crate::source::{PropertySource, SavedSearchStore};

/// One saved search and the new listings it matched, in listing fetch order.
///
/// `search` carries any in-memory quota reset made during the scan; the
/// dispatcher persists it together with the send.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub search: SavedSearch,
    pub properties: Vec<PropertyRecord>,
}

impl MatchResult {
    #[must_use]
    pub fn match_count(&self) -> usize {
        self.properties.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    pub matches: Vec<MatchResult>,
    /// Active listings created inside the window.
    pub new_properties_count: usize,
    /// Alertable saved searches fetched. Zero when the window was empty.
    pub checked_searches: usize,
    /// Searches left out because today's budget was already spent.
    pub skipped_over_quota: usize,
}

impl ScanReport {
    /// Saved searches with at least one match.
    #[must_use]
    pub fn total_matches(&self) -> usize {
        self.matches.len()
    }

    /// Listing hits summed across every matched search.
    #[must_use]
    pub fn matched_properties(&self) -> usize {
        self.matches.iter().map(MatchResult::match_count).sum()
    }
}

pub struct MatchScanner {
    properties: Arc<dyn PropertySource>,
    searches: Arc<dyn SavedSearchStore>,
    quota_offset: FixedOffset,
}

impl MatchScanner {
    #[must_use]
    pub fn new(
        properties: Arc<dyn PropertySource>,
        searches: Arc<dyn SavedSearchStore>,
        quota_offset: FixedOffset,
    ) -> Self {
        Self {
            properties,
            searches,
            quota_offset,
        }
    }

    /// Matches listings created at or after `window_start` against every
    /// alertable saved search.
    ///
    /// Quota resets are applied to the in-memory copies only. Searches without
    /// budget are excluded from the report entirely.
    ///
    /// # Errors
    ///
    /// Returns [`AlertError::Store`] if either store cannot be read.
    pub async fn scan(
        &self,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<ScanReport, AlertError> {
        let properties = self.properties.find_active_since(window_start).await?;
        if properties.is_empty() {
            tracing::info!(window_start = %window_start, "no new properties in window");
            return Ok(ScanReport::default());
        }

        let searches = self.searches.find_active_alertable().await?;
        let local_now = now.with_timezone(&self.quota_offset);

        let mut report = ScanReport {
            new_properties_count: properties.len(),
            checked_searches: searches.len(),
            ..ScanReport::default()
        };

        for mut search in searches {
            quota::reset_if_new_day_at(&mut search, &local_now);
            if !quota::has_budget(&search) {
                tracing::debug!(
                    saved_search_id = %search.public_id,
                    sent_today = search.tracking.alerts_sent_today,
                    "daily alert limit reached; skipping search"
                );
                report.skipped_over_quota += 1;
                continue;
            }

            let matched: Vec<PropertyRecord> = matching::filter_matches(&search.criteria, &properties)
                .into_iter()
                .cloned()
                .collect();
            if matched.is_empty() {
                continue;
            }

            tracing::debug!(
                saved_search_id = %search.public_id,
                matches = matched.len(),
                "saved search matched new properties"
            );
            report.matches.push(MatchResult {
                search,
                properties: matched,
            });
        }

        tracing::info!(
            new_properties = report.new_properties_count,
            checked_searches = report.checked_searches,
            searches_matched = report.matches.len(),
            skipped_over_quota = report.skipped_over_quota,
            "scan complete"
        );
        Ok(report)
    }
}

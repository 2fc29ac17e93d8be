//! One scan-and-dispatch cycle.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use homealert_core::AppConfig;
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::dispatcher::{AlertDispatcher, DeliveryOutcome};
use crate::error::AlertError;
use crate::mailer::Mailer;
use crate::scanner::MatchScanner;
use crate::source::{PropertySource, SavedSearchStore};

/// Widest look-back window a run accepts (30 days).
pub const MAX_HOURS_BACK: u32 = 720;

/// Rejects look-back windows outside `1..=MAX_HOURS_BACK`.
///
/// # Errors
///
/// Returns [`AlertError::InvalidWindow`] for an out-of-range value.
pub fn validate_hours_back(hours_back: u32) -> Result<(), AlertError> {
    if hours_back == 0 || hours_back > MAX_HOURS_BACK {
        return Err(AlertError::InvalidWindow {
            got: hours_back,
            max: MAX_HOURS_BACK,
        });
    }
    Ok(())
}

/// Knobs the engine needs from application config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub frontend_base_url: String,
    pub send_timeout: Duration,
    /// Zone whose midnight resets daily quotas.
    pub quota_offset: FixedOffset,
}

impl EngineSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            frontend_base_url: config.mail.frontend_base_url.clone(),
            send_timeout: Duration::from_secs(config.mail.send_timeout_secs),
            quota_offset: config.quota_utc_offset,
        }
    }
}

/// Per-search line of a [`RunSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub saved_search_id: Uuid,
    pub saved_search_name: String,
    pub user_email: String,
    pub match_count: usize,
    pub property_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub matches: Vec<MatchSummary>,
    /// Number of saved searches that matched, one per [`MatchSummary`].
    pub total_matches: usize,
    pub matched_properties: usize,
    pub new_properties_count: usize,
    pub checked_searches: usize,
    pub skipped_over_quota: usize,
    pub delivery_outcomes: Vec<DeliveryOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::Sent { .. }))
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::Failed { .. }))
    }

    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::Skipped { .. }))
    }

    fn count(&self, pred: impl Fn(&DeliveryOutcome) -> bool) -> usize {
        self.delivery_outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Runs [`MatchScanner`] then [`AlertDispatcher`]. At most one run is in
/// flight per coordinator.
pub struct AlertRunCoordinator {
    scanner: MatchScanner,
    dispatcher: AlertDispatcher,
    run_lock: Mutex<()>,
}

impl AlertRunCoordinator {
    #[must_use]
    pub fn new(
        properties: Arc<dyn PropertySource>,
        searches: Arc<dyn SavedSearchStore>,
        mailer: Arc<dyn Mailer>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            scanner: MatchScanner::new(properties, Arc::clone(&searches), settings.quota_offset),
            dispatcher: AlertDispatcher::new(
                searches,
                mailer,
                settings.frontend_base_url,
                settings.send_timeout,
            ),
            run_lock: Mutex::new(()),
        }
    }

    /// Scans the last `hours_back` hours and sends alerts.
    ///
    /// # Errors
    ///
    /// See [`AlertRunCoordinator::run_at`].
    pub async fn run(&self, hours_back: u32) -> Result<RunSummary, AlertError> {
        self.run_at(hours_back, Utc::now()).await
    }

    /// [`AlertRunCoordinator::run`] with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns [`AlertError::InvalidWindow`] if `hours_back` is outside
    /// `1..=720`, [`AlertError::RunInProgress`] if another run holds the lock,
    /// or [`AlertError::Store`] if a store call fails.
    pub async fn run_at(
        &self,
        hours_back: u32,
        now: DateTime<Utc>,
    ) -> Result<RunSummary, AlertError> {
        validate_hours_back(hours_back)?;
        self.try_begin()?.run_at(hours_back, now).await
    }

    /// Claims the run lock without starting a run.
    ///
    /// # Errors
    ///
    /// Returns [`AlertError::RunInProgress`] if another run holds the lock.
    pub fn try_begin(&self) -> Result<RunPermit<'_>, AlertError> {
        let guard = self
            .run_lock
            .try_lock()
            .map_err(|_| AlertError::RunInProgress)?;
        Ok(RunPermit {
            coordinator: self,
            _guard: guard,
        })
    }
}

/// Exclusive right to run one cycle on an [`AlertRunCoordinator`]. The lock
/// is released when the permit is consumed or dropped.
pub struct RunPermit<'a> {
    coordinator: &'a AlertRunCoordinator,
    _guard: MutexGuard<'a, ()>,
}

impl RunPermit<'_> {
    /// # Errors
    ///
    /// See [`AlertRunCoordinator::run_at`].
    pub async fn run(self, hours_back: u32) -> Result<RunSummary, AlertError> {
        self.run_at(hours_back, Utc::now()).await
    }

    /// # Errors
    ///
    /// Returns [`AlertError::InvalidWindow`] or [`AlertError::Store`].
    pub async fn run_at(
        self,
        hours_back: u32,
        now: DateTime<Utc>,
    ) -> Result<RunSummary, AlertError> {
        validate_hours_back(hours_back)?;
        let AlertRunCoordinator {
            scanner,
            dispatcher,
            ..
        } = self.coordinator;

        let window_start = now - chrono::Duration::hours(i64::from(hours_back));
        tracing::info!(hours_back, window_start = %window_start, "alert run started");

        let report = scanner.scan(window_start, now).await?;
        let total_matches = report.total_matches();
        let matched_properties = report.matched_properties();
        let matches = report
            .matches
            .iter()
            .map(|m| MatchSummary {
                saved_search_id: m.search.public_id,
                saved_search_name: m.search.name.clone(),
                user_email: m.search.owner.email.clone(),
                match_count: m.match_count(),
                property_ids: m.properties.iter().map(|p| p.public_id).collect(),
            })
            .collect();

        let delivery_outcomes = dispatcher.dispatch(report.matches, now).await?;

        let summary = RunSummary {
            matches,
            total_matches,
            matched_properties,
            new_properties_count: report.new_properties_count,
            checked_searches: report.checked_searches,
            skipped_over_quota: report.skipped_over_quota,
            delivery_outcomes,
            started_at: now,
            finished_at: Utc::now(),
        };

        tracing::info!(
            new_properties = summary.new_properties_count,
            checked_searches = summary.checked_searches,
            total_matches = summary.total_matches,
            matched_properties = summary.matched_properties,
            sent = summary.sent_count(),
            failed = summary.failed_count(),
            skipped = summary.skipped_count(),
            "alert run complete"
        );
        Ok(summary)
    }
}

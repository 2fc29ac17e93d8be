//! Delivers one alert per match result and books it against the daily quota.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use homealert_core::{quota, AlertTracking};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AlertError, DeliveryError};
use crate::mailer::Mailer;
use crate::render::render_alert;
use crate::scanner::MatchResult;
use crate::source::SavedSearchStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    #[serde(rename = "daily-limit")]
    DailyLimit,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::DailyLimit => write!(f, "daily-limit"),
        }
    }
}

/// What happened to one match result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Sent {
        saved_search_id: Uuid,
        recipient: String,
        message_id: String,
        properties_count: usize,
    },
    Failed {
        saved_search_id: Uuid,
        recipient: String,
        error: String,
    },
    Skipped {
        saved_search_id: Uuid,
        recipient: String,
        reason: SkipReason,
    },
}

impl DeliveryOutcome {
    #[must_use]
    pub fn saved_search_id(&self) -> Uuid {
        match self {
            DeliveryOutcome::Sent {
                saved_search_id, ..
            }
            | DeliveryOutcome::Failed {
                saved_search_id, ..
            }
            | DeliveryOutcome::Skipped {
                saved_search_id, ..
            } => *saved_search_id,
        }
    }

    #[must_use]
    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryOutcome::Sent { .. })
    }
}

pub struct AlertDispatcher {
    searches: Arc<dyn SavedSearchStore>,
    mailer: Arc<dyn Mailer>,
    frontend_base_url: String,
    send_timeout: Duration,
}

impl AlertDispatcher {
    #[must_use]
    pub fn new(
        searches: Arc<dyn SavedSearchStore>,
        mailer: Arc<dyn Mailer>,
        frontend_base_url: impl Into<String>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            searches,
            mailer,
            frontend_base_url: frontend_base_url.into(),
            send_timeout,
        }
    }

    /// Sends one alert per result, in order.
    ///
    /// A failed or timed-out send is recorded and leaves the search's tracking
    /// untouched; later results are still processed. A successful send is
    /// booked with [`quota::record_sent`] and persisted before the next result.
    ///
    /// # Errors
    ///
    /// Returns [`AlertError::Store`] if tracking cannot be persisted after a
    /// send. Updates persisted before the failure are kept.
    pub async fn dispatch(
        &self,
        results: Vec<MatchResult>,
        now: DateTime<Utc>,
    ) -> Result<Vec<DeliveryOutcome>, AlertError> {
        let mut outcomes = Vec::with_capacity(results.len());
        // Latest tracking per search in this batch, so a repeated search sees earlier sends.
        let mut booked: HashMap<i64, AlertTracking> = HashMap::new();

        for MatchResult {
            mut search,
            properties,
        } in results
        {
            if let Some(tracking) = booked.get(&search.id) {
                search.tracking = tracking.clone();
            }
            let saved_search_id = search.public_id;
            let recipient = search.owner.email.clone();

            if !quota::has_budget(&search) {
                tracing::info!(
                    saved_search_id = %saved_search_id,
                    "daily alert limit reached; alert skipped"
                );
                outcomes.push(DeliveryOutcome::Skipped {
                    saved_search_id,
                    recipient,
                    reason: SkipReason::DailyLimit,
                });
                continue;
            }

            let email = render_alert(&search, &properties, &self.frontend_base_url);
            let sent = match tokio::time::timeout(self.send_timeout, self.mailer.send(&email)).await {
                Ok(result) => result,
                Err(_) => Err(DeliveryError::Timeout(self.send_timeout.as_secs())),
            };

            match sent {
                Ok(message_id) => {
                    quota::record_sent(&mut search, now);
                    self.searches.save_tracking(&search).await?;
                    booked.insert(search.id, search.tracking.clone());

                    tracing::info!(
                        saved_search_id = %saved_search_id,
                        transport = self.mailer.transport_name(),
                        message_id = %message_id,
                        properties = properties.len(),
                        "alert sent"
                    );
                    outcomes.push(DeliveryOutcome::Sent {
                        saved_search_id,
                        recipient,
                        message_id,
                        properties_count: properties.len(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        saved_search_id = %saved_search_id,
                        transport = self.mailer.transport_name(),
                        error = %e,
                        "alert delivery failed"
                    );
                    outcomes.push(DeliveryOutcome::Failed {
                        saved_search_id,
                        recipient,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_serialize_with_status_tag() {
        let id = Uuid::nil();
        let skipped = DeliveryOutcome::Skipped {
            saved_search_id: id,
            recipient: "a@example.com".to_string(),
            reason: SkipReason::DailyLimit,
        };
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "daily-limit");

        let sent = DeliveryOutcome::Sent {
            saved_search_id: id,
            recipient: "a@example.com".to_string(),
            message_id: "dev-mode-1".to_string(),
            properties_count: 3,
        };
        let json = serde_json::to_value(&sent).unwrap();
        assert_eq!(json["status"], "sent");
        assert_eq!(json["properties_count"], 3);
        assert_eq!(json["saved_search_id"], id.to_string());
    }

    #[test]
    fn outcome_exposes_search_id() {
        let id = Uuid::new_v4();
        let failed = DeliveryOutcome::Failed {
            saved_search_id: id,
            recipient: "a@example.com".to_string(),
            error: "boom".to_string(),
        };
        assert_eq!(failed.saved_search_id(), id);
        assert!(!failed.is_sent());
    }
}

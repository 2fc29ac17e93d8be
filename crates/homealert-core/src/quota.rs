//! Per-saved-search daily alert budget.
//!
//! The daily counter is reset lazily: callers run [`reset_if_new_day_at`]
//! before every budget check, and the calendar day is derived from the
//! timestamp they pass in. There is no background timer.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::saved_search::{AlertTracking, SavedSearch};

/// Zeroes `alerts_sent_today` when `today` is later than the last reset date.
///
/// Returns `true` when a reset happened. Calling this twice on the same day
/// is a no-op the second time.
pub fn reset_if_new_day(tracking: &mut AlertTracking, today: NaiveDate) -> bool {
    let stale = tracking
        .last_alert_reset_date
        .is_none_or(|last| last < today);

    if stale {
        tracking.alerts_sent_today = 0;
        tracking.last_alert_reset_date = Some(today);
    }
    stale
}

/// [`reset_if_new_day`] with the day taken from `now` in its own time zone.
///
/// Pass `now` already converted into the zone whose midnight should roll the
/// quota over.
pub fn reset_if_new_day_at<Tz: TimeZone>(search: &mut SavedSearch, now: &DateTime<Tz>) -> bool {
    reset_if_new_day(&mut search.tracking, now.date_naive())
}

/// Whether the search may receive another alert today.
///
/// A cap lowered below the current count simply reads as exhausted until the
/// next reset.
#[must_use]
pub fn has_budget(search: &SavedSearch) -> bool {
    search.tracking.alerts_sent_today < search.alert_settings.max_alerts_per_day
}

/// Alerts still allowed today, never negative.
#[must_use]
pub fn remaining_budget(search: &SavedSearch) -> i32 {
    (search.alert_settings.max_alerts_per_day - search.tracking.alerts_sent_today).max(0)
}

/// Books one delivered alert against the search.
pub fn record_sent(search: &mut SavedSearch, now: DateTime<Utc>) {
    let tracking = &mut search.tracking;
    tracking.alerts_sent_today = tracking.alerts_sent_today.saturating_add(1);
    tracking.total_alerts_sent = tracking.total_alerts_sent.saturating_add(1);
    tracking.last_alert_sent = Some(now);
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, FixedOffset};
    use uuid::Uuid;

    use super::*;
    use crate::saved_search::{AlertSettings, SearchCriteria, SearchOwner};

    fn make_search(max_per_day: i32, sent_today: i32) -> SavedSearch {
        SavedSearch {
            id: 7,
            public_id: Uuid::new_v4(),
            owner: SearchOwner {
                email: "wanjiru@example.com".to_string(),
                name: "Wanjiru".to_string(),
                phone: None,
            },
            criteria: SearchCriteria::default(),
            alert_settings: AlertSettings {
                max_alerts_per_day: max_per_day,
                ..AlertSettings::default()
            },
            name: "Kilimani flats".to_string(),
            description: None,
            is_active: true,
            tracking: AlertTracking {
                alerts_sent_today: sent_today,
                total_alerts_sent: sent_today,
                last_alert_reset_date: NaiveDate::from_ymd_opt(2026, 3, 14),
                last_alert_sent: None,
            },
            created_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn exhausted_budget_is_restored_after_midnight() {
        let mut search = make_search(2, 2);
        assert!(!has_budget(&search));

        assert!(reset_if_new_day(&mut search.tracking, date(2026, 3, 15)));
        assert_eq!(search.tracking.alerts_sent_today, 0);
        assert_eq!(search.tracking.last_alert_reset_date, Some(date(2026, 3, 15)));
        assert!(has_budget(&search));
        assert_eq!(search.tracking.total_alerts_sent, 2, "lifetime count kept");
    }

    #[test]
    fn reset_twice_on_same_day_is_noop() {
        let mut search = make_search(5, 3);
        assert!(reset_if_new_day(&mut search.tracking, date(2026, 3, 15)));
        search.tracking.alerts_sent_today = 1;
        let before = search.tracking.clone();

        assert!(!reset_if_new_day(&mut search.tracking, date(2026, 3, 15)));
        assert_eq!(search.tracking, before);
    }

    #[test]
    fn reset_on_same_day_keeps_count() {
        let mut search = make_search(5, 3);
        assert!(!reset_if_new_day(&mut search.tracking, date(2026, 3, 14)));
        assert_eq!(search.tracking.alerts_sent_today, 3);
    }

    #[test]
    fn missing_reset_date_always_resets() {
        let mut search = make_search(5, 4);
        search.tracking.last_alert_reset_date = None;
        assert!(reset_if_new_day(&mut search.tracking, date(2026, 3, 14)));
        assert_eq!(search.tracking.alerts_sent_today, 0);
    }

    #[test]
    fn reset_uses_the_callers_time_zone() {
        let mut search = make_search(5, 5);
        let nairobi = FixedOffset::east_opt(3 * 3600).unwrap();
        // 22:30 UTC on the 14th is already 01:30 on the 15th in Nairobi
        let utc_now = Utc.with_ymd_and_hms(2026, 3, 14, 22, 30, 0).unwrap();

        assert!(!reset_if_new_day_at(&mut search, &utc_now));
        assert!(reset_if_new_day_at(
            &mut search,
            &utc_now.with_timezone(&nairobi)
        ));
        assert_eq!(search.tracking.last_alert_reset_date, Some(date(2026, 3, 15)));
    }

    #[test]
    fn lowered_cap_reads_as_exhausted() {
        let mut search = make_search(5, 4);
        search.alert_settings.max_alerts_per_day = 2;
        assert!(!has_budget(&search));
        assert_eq!(remaining_budget(&search), 0);
    }

    #[test]
    fn record_sent_advances_counters() {
        let mut search = make_search(5, 1);
        let now = Utc::now();
        record_sent(&mut search, now);
        assert_eq!(search.tracking.alerts_sent_today, 2);
        assert_eq!(search.tracking.total_alerts_sent, 2);
        assert_eq!(search.tracking.last_alert_sent, Some(now));
        assert_eq!(remaining_budget(&search), 3);
    }

    #[test]
    fn budget_runs_out_after_max_sends() {
        let mut search = make_search(2, 0);
        let start = Utc::now();
        for i in 0..2 {
            assert!(has_budget(&search));
            record_sent(&mut search, start + Duration::minutes(i));
        }
        assert!(!has_budget(&search));
    }
}

use std::sync::Arc;

use chrono::{Duration, Utc};
use homealert_alerts::{
    validate_hours_back, AlertRunCoordinator, EngineSettings, MatchScanner, PgStore,
    PropertySource, SavedSearchStore,
};
use homealert_core::{quota, AppConfig};
use sqlx::PgPool;

/// Runs one recorded alert cycle and prints its summary as JSON.
pub(crate) async fn check(pool: &PgPool, config: &AppConfig, hours_back: u32) -> anyhow::Result<()> {
    let store = Arc::new(PgStore::new(pool.clone()));
    let properties: Arc<dyn PropertySource> = store.clone();
    let searches: Arc<dyn SavedSearchStore> = store;
    let mailer = homealert_alerts::build_mailer(&config.mail)?;
    let coordinator = AlertRunCoordinator::new(
        properties,
        searches,
        mailer,
        EngineSettings::from_app_config(config),
    );

    let recorded = homealert_alerts::run_recorded(pool, &coordinator, "cli", hours_back).await?;
    tracing::info!(run_id = %recorded.run_id, "alert run recorded");
    println!("{}", serde_json::to_string_pretty(&recorded.summary)?);
    Ok(())
}

/// Scans without dispatching. Quota resets stay in memory, so nothing is written.
pub(crate) async fn dry_run(
    pool: &PgPool,
    config: &AppConfig,
    hours_back: u32,
) -> anyhow::Result<()> {
    validate_hours_back(hours_back)?;
    let store = Arc::new(PgStore::new(pool.clone()));
    let scanner = MatchScanner::new(store.clone(), store, config.quota_utc_offset);

    let now = Utc::now();
    let report = scanner
        .scan(now - Duration::hours(i64::from(hours_back)), now)
        .await?;

    println!(
        "{} new properties, {} searches checked, {} over quota",
        report.new_properties_count, report.checked_searches, report.skipped_over_quota
    );
    for result in &report.matches {
        println!(
            "{}  {:<40}  {} match(es) -> {} ({} alert(s) left today)",
            result.search.public_id,
            result.search.name,
            result.match_count(),
            result.search.owner.email,
            quota::remaining_budget(&result.search)
        );
    }
    Ok(())
}

pub(crate) async fn list_runs(pool: &PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = homealert_db::list_alert_runs(pool, limit.clamp(1, 200)).await?;
    if runs.is_empty() {
        println!("no alert runs recorded");
        return Ok(());
    }
    for run in runs {
        println!(
            "{}  {:<9}  {:<9}  {:>3}h  sent={} failed={} matches={}  {}",
            run.public_id,
            run.status,
            run.trigger_source,
            run.hours_back,
            run.alerts_sent,
            run.alerts_failed,
            run.total_matches,
            run.created_at.format("%Y-%m-%d %H:%M:%S"),
        );
        if let Some(message) = run.error_message {
            println!("    error: {message}");
        }
    }
    Ok(())
}

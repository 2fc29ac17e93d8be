use homealert_alerts::PgStore;
use sqlx::PgPool;
use uuid::Uuid;

pub(crate) async fn show(pool: &PgPool, public_id: Uuid) -> anyhow::Result<()> {
    let search = homealert_db::get_saved_search_by_public_id(pool, public_id).await?;
    println!("{}", serde_json::to_string_pretty(&search)?);
    Ok(())
}

pub(crate) async fn list(pool: &PgPool, email: &str) -> anyhow::Result<()> {
    let searches = homealert_db::list_saved_searches_by_owner(pool, email).await?;
    if searches.is_empty() {
        println!("no active saved searches for {}", homealert_core::normalize_email(email));
        return Ok(());
    }
    for search in &searches {
        println!(
            "{}  {:<40}  alerts {}  {}/{} today",
            search.public_id,
            search.name,
            if search.alert_settings.is_active { "on" } else { "off" },
            search.tracking.alerts_sent_today,
            search.alert_settings.max_alerts_per_day
        );
    }
    Ok(())
}

pub(crate) async fn preview(pool: &PgPool, public_id: Uuid, limit: usize) -> anyhow::Result<()> {
    let store = PgStore::new(pool.clone());
    let preview = homealert_alerts::preview_matches(&store, &store, public_id, limit).await?;

    println!(
        "{} ({}): {} matching listing(s)",
        preview.saved_search.name, preview.saved_search.owner.email, preview.total_matches
    );
    for property in &preview.properties {
        println!(
            "{}  {:<40}  {:>12}  {}",
            property.public_id,
            property.title,
            property.price,
            property.display_location()
        );
    }
    Ok(())
}

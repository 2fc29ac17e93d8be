mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use homealert_alerts::{
    AlertRunCoordinator, EngineSettings, PgStore, PropertySource, SavedSearchStore,
};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(homealert_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = homealert_db::PoolConfig::from_app_config(&config);
    let pool = homealert_db::connect_pool(&config.database_url, pool_config).await?;
    homealert_db::run_migrations(&pool).await?;

    let store = Arc::new(PgStore::new(pool.clone()));
    let mailer = homealert_alerts::build_mailer(&config.mail)?;
    tracing::info!(
        transport = mailer.transport_name(),
        env = %config.env,
        "mail transport ready"
    );
    let properties: Arc<dyn PropertySource> = store.clone();
    let searches: Arc<dyn SavedSearchStore> = store.clone();
    let coordinator = Arc::new(AlertRunCoordinator::new(
        properties,
        searches,
        mailer,
        EngineSettings::from_app_config(&config),
    ));

    let _scheduler =
        scheduler::build_scheduler(pool.clone(), Arc::clone(&coordinator), &config).await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        homealert_core::Environment::Development
    ))?;
    let state = AppState {
        pool,
        store,
        coordinator,
        default_hours_back: config.alert_hours_back,
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "homealert-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}

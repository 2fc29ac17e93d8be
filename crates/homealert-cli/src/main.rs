mod alerts;
mod searches;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use homealert_core::AppConfig;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "homealert-cli")]
#[command(about = "HomeAlert saved-search alert engine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Run the match-and-alert cycle
    Alerts {
        #[command(subcommand)]
        command: AlertCommands,
    },
    /// Inspect saved searches
    Searches {
        #[command(subcommand)]
        command: SearchCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[derive(Debug, Subcommand)]
enum AlertCommands {
    /// Scan recent listings and mail matching saved searches
    Check {
        /// Look-back window in hours (defaults to HOMEALERT_ALERT_HOURS_BACK)
        #[arg(long)]
        hours_back: Option<u32>,
        /// Report matches without sending mail or touching quotas
        #[arg(long)]
        dry_run: bool,
    },
    /// Show recent alert runs
    Runs {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[derive(Debug, Subcommand)]
enum SearchCommands {
    /// Show a saved search
    Show { public_id: Uuid },
    /// List one owner's active saved searches, newest first
    List { email: String },
    /// List active listings that match a saved search, newest first
    Preview {
        public_id: Uuid,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("homealert-cli: use --help to list commands");
        return Ok(());
    };

    let config = Arc::new(homealert_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool = connect(&config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                homealert_db::health_check(&pool).await?;
                println!("database ok");
            }
            DbCommands::Migrate => {
                let applied = homealert_db::run_migrations(&pool).await?;
                println!("applied {applied} migration(s)");
            }
        },
        Commands::Alerts { command } => match command {
            AlertCommands::Check {
                hours_back,
                dry_run,
            } => {
                let hours_back = hours_back.unwrap_or(config.alert_hours_back);
                if dry_run {
                    alerts::dry_run(&pool, &config, hours_back).await?;
                } else {
                    alerts::check(&pool, &config, hours_back).await?;
                }
            }
            AlertCommands::Runs { limit } => alerts::list_runs(&pool, limit).await?,
        },
        Commands::Searches { command } => match command {
            SearchCommands::Show { public_id } => searches::show(&pool, public_id).await?,
            SearchCommands::List { email } => searches::list(&pool, &email).await?,
            SearchCommands::Preview { public_id, limit } => {
                searches::preview(&pool, public_id, limit).await?;
            }
        },
    }

    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool_config = homealert_db::PoolConfig::from_app_config(config);
    Ok(homealert_db::connect_pool(&config.database_url, pool_config).await?)
}

#[cfg(test)]
mod tests;

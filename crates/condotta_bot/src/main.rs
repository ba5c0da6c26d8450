//! Condotta bot binary.
//!
//! Wires the Postgres store, the Discord client, and a liveness endpoint
//! into one process.

mod api;
mod config;

use condotta_discord::CondottaBot;
use condotta_error::CondottaResult;
use condotta_store::{FactionRepository, establish_connection, run_migrations};
use config::BotConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Interval between cooldown cache sweeps.
const COOLDOWN_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> CondottaResult<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path =
        std::env::var("CONDOTTA_CONFIG").unwrap_or_else(|_| "condotta.toml".to_string());
    let config = if std::path::Path::new(&config_path).exists() {
        info!(path = %config_path, "Loading configuration");
        BotConfig::from_file(&config_path)?
    } else {
        info!("No configuration file found, using defaults");
        BotConfig::default()
    };

    let mut conn = establish_connection()?;
    run_migrations(&mut conn)?;
    let store = Arc::new(FactionRepository::new(conn));
    info!("Database ready");

    let token = std::env::var("DISCORD_TOKEN").map_err(|_| {
        condotta_error::ConfigError::new("DISCORD_TOKEN environment variable not set")
    })?;

    let mut bot = CondottaBot::new(
        token,
        store,
        config.economy.create_cost,
        Duration::from_secs(config.economy.award_cooldown_secs),
    )
    .await?;

    let port = config.api.port;
    tokio::spawn(async move {
        api::serve(port).await;
    });

    let services = Arc::clone(bot.services());
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(COOLDOWN_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let evicted = services.currency.evict_cooldowns().await;
            if evicted > 0 {
                debug!(evicted, "Swept elapsed award cooldowns");
            }
        }
    });

    if let Err(err) = bot.start().await {
        warn!(error = %err, "Bot stopped");
        return Err(err);
    }
    Ok(())
}

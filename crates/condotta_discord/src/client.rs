//! Discord client setup and lifecycle.

use crate::handler::CondottaHandler;
use crate::provisioner::DiscordProvisioner;
use crate::services::Services;
use condotta_core::FactionStore;
use condotta_error::{ConfigError, CondottaResult};
use serenity::Client;
use serenity::http::Http;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// The Condotta Discord bot.
///
/// Owns the Serenity client and the assembled engine; [`start`](Self::start)
/// blocks until the gateway connection ends.
pub struct CondottaBot<S> {
    client: Client,
    services: Arc<Services<S>>,
}

impl<S: FactionStore + 'static> CondottaBot<S> {
    /// Build the bot over a store.
    ///
    /// The provisioner gets its own HTTP client so command handlers and the
    /// engine can provision resources independently of the gateway.
    #[instrument(skip(token, store), fields(token_len = token.len()))]
    pub async fn new(
        token: String,
        store: Arc<S>,
        create_cost: i64,
        award_cooldown: Duration,
    ) -> CondottaResult<Self> {
        info!("Initializing Condotta Discord bot");

        let http = Arc::new(Http::new(&token));
        let provisioner = Arc::new(DiscordProvisioner::new(http));
        let services = Arc::new(Services::new(store, provisioner, create_cost, award_cooldown));

        let handler = CondottaHandler::new(Arc::clone(&services));
        let client = Client::builder(&token, CondottaHandler::<S>::intents())
            .event_handler(handler)
            .await
            .map_err(|e| ConfigError::new(format!("Failed to build Discord client: {e}")))?;

        info!("Serenity client built");
        Ok(Self { client, services })
    }

    /// Start the bot. Blocks until shutdown or a fatal gateway error.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> CondottaResult<()> {
        info!("Starting Discord bot");
        self.client
            .start()
            .await
            .map_err(|e| ConfigError::new(format!("Discord client error: {e}")))?;
        Ok(())
    }

    /// The assembled engine, for maintenance tasks outside the event loop.
    pub fn services(&self) -> &Arc<Services<S>> {
        &self.services
    }
}

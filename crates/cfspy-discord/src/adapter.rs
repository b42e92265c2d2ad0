use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serenity::model::gateway::GatewayIntents;
use serenity::Client;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use cfspy_core::CfspyConfig;
use cfspy_widget::ReactionHub;

use crate::error::DiscordError;
use crate::handler::CfspyHandler;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Discord adapter.
///
/// Wraps a serenity `Client` and drives the event loop until shutdown.
/// The reaction hub and the web client outlive every serenity client, so
/// widgets keep working across gateway reconnects.
pub struct DiscordAdapter {
    config: Arc<CfspyConfig>,
    hub: Arc<ReactionHub>,
    web: reqwest::Client,
    shutdown: CancellationToken,
}

impl DiscordAdapter {
    pub fn new(config: CfspyConfig, shutdown: CancellationToken) -> Self {
        Self {
            config: Arc::new(config),
            hub: Arc::new(ReactionHub::new()),
            web: reqwest::Client::new(),
            shutdown,
        }
    }

    /// Connect to Discord and keep reconnecting whenever the gateway drops.
    ///
    /// Returns `Ok(())` once `shutdown` fires, or [`DiscordError::NoToken`]
    /// right away if no token is configured.
    pub async fn run(self) -> Result<(), DiscordError> {
        if self.config.discord.bot_token.trim().is_empty() {
            return Err(DiscordError::NoToken);
        }

        let intents = GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILD_MESSAGE_REACTIONS
            | GatewayIntents::DIRECT_MESSAGE_REACTIONS;

        loop {
            let Some(mut client) = self.connect(intents).await else {
                return Ok(());
            };
            info!("Discord: gateway connecting");

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    client.shard_manager.shutdown_all().await;
                    info!("Discord: shut down");
                    return Ok(());
                }
                res = client.start() => match res {
                    Err(e) => warn!(error = %e, "Discord: gateway error, reconnecting in 5s"),
                    Ok(()) => info!("Discord: gateway stopped cleanly, reconnecting in 5s"),
                },
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => return Ok(()),
                _ = tokio::time::sleep(RECONNECT_DELAY) => {}
            }
        }
    }

    /// Build a client, retrying until it succeeds. `None` on shutdown.
    async fn connect(&self, intents: GatewayIntents) -> Option<Client> {
        loop {
            match self.build_client(intents).await {
                Ok(c) => return Some(c),
                Err(e) => error!(error = %e, "Discord: connect failed, retrying in 30s"),
            }
            tokio::select! {
                _ = self.shutdown.cancelled() => return None,
                _ = tokio::time::sleep(CONNECT_RETRY_DELAY) => {}
            }
        }
    }

    /// Build a fresh serenity `Client` with our event handler.
    async fn build_client(&self, intents: GatewayIntents) -> Result<Client, serenity::Error> {
        let handler = CfspyHandler {
            config: Arc::clone(&self.config),
            hub: Arc::clone(&self.hub),
            shutdown: self.shutdown.clone(),
            web: self.web.clone(),
            bot_id: OnceLock::new(),
        };

        Client::builder(&self.config.discord.bot_token, intents)
            .event_handler(handler)
            .await
    }
}

use eyre::Result;
use serenity::{Client, prelude::GatewayIntents};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tracing::info;

use repere_core::quiz::QuizEngine;
use repere_core::voice::VoiceLobby;
use repere_sheets::GoogleSheetsClient;
use repere_store::Stores;

pub mod commands;
pub mod config;
pub mod handlers;
pub mod replies;
pub mod scheduler;
pub mod sink;

/// State shared by the event handler and the background tasks.
pub struct BotState {
    pub config: config::BotConfig,
    pub stores: Stores,
    /// `None` when no Google credentials are configured.
    pub sheets: Option<GoogleSheetsClient>,
    pub quiz: Mutex<QuizEngine>,
    /// Wakes the quiz loop early after its configuration changed.
    pub quiz_wakeup: Notify,
    pub lobby: VoiceLobby,
}

impl BotState {
    pub fn new(config: config::BotConfig, stores: Stores, sheets: Option<GoogleSheetsClient>) -> Self {
        Self {
            config,
            stores,
            sheets,
            quiz: Mutex::new(QuizEngine::new()),
            quiz_wakeup: Notify::new(),
            lobby: VoiceLobby::new(),
        }
    }
}

pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_VOICE_STATES
}

/// Start the Discord bot and run until it disconnects.
pub async fn start_bot(state: BotState) -> Result<()> {
    info!("Starting Discord bot");

    let token = state.config.token.clone();
    let handler = handlers::Handler::new(Arc::new(state));

    let mut client = Client::builder(&token, intents()).event_handler(handler).await?;

    info!("Connecting to Discord...");
    client.start().await?;

    Ok(())
}

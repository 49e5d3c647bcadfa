use color_eyre::eyre::Result;
use dotenv::dotenv;
use repere_discord_bot::{BotState, config::BotConfig};
use repere_store::Stores;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = BotConfig::from_env()?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder().with_max_level(config.log_level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Repère Discord bot");

    let stores = Stores::open(
        &config.server_config_path,
        &config.quiz_config_path,
        &config.voice_config_path,
    )?;

    let sheets = match &config.google_credentials {
        Some(credentials) => Some(repere_sheets::connect(credentials, config.sheets_min_interval)?),
        None => {
            warn!("No Google service account configured, quiz automation is disabled");
            None
        }
    };

    // Start the Discord bot
    match repere_discord_bot::start_bot(BotState::new(config, stores, sheets)).await {
        Ok(_) => info!("Discord bot shut down gracefully"),
        Err(e) => error!("Discord bot error: {}", e),
    }

    Ok(())
}

use eyre::{Result, eyre};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

use repere_sheets::Credentials;

pub const DEFAULT_SERVER_CONFIG_PATH: &str = "server_config.json";
pub const DEFAULT_QUIZ_CONFIG_PATH: &str = "quiz_config.json";
pub const DEFAULT_VOICE_CONFIG_PATH: &str = "voice_creators.json";
pub const DEFAULT_SHEETS_MIN_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_ROLE_EXPIRY_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_STICKY_INTERVAL_SECS: u64 = 5;

/// Configuration for the Discord bot.
///
/// Everything except the token has a default, so a bare `.env` with
/// `DISCORD_TOKEN` starts a bot without quiz automation.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Discord bot token (required)
    pub token: String,
    /// Guild where commands are registered immediately during development
    pub test_guild_id: Option<u64>,
    pub server_config_path: PathBuf,
    pub quiz_config_path: PathBuf,
    pub voice_config_path: PathBuf,
    /// Service account used for Google Sheets; quiz automation is off without it
    pub google_credentials: Option<Credentials>,
    pub sheets_min_interval: Duration,
    pub role_expiry_interval: Duration,
    pub sticky_interval: Duration,
    /// Logging level, `info` unless `LOG_LEVEL` names another one
    pub log_level: Level,
}

impl BotConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let token = var("DISCORD_TOKEN").ok_or_else(|| eyre!("DISCORD_TOKEN environment variable not set"))?;

        let test_guild_id = var("DISCORD_TEST_GUILD_ID")
            .map(|id| {
                id.trim()
                    .parse::<u64>()
                    .map_err(|_| eyre!("DISCORD_TEST_GUILD_ID must be a valid u64"))
            })
            .transpose()?;

        let path = |key: &str, default: &str| PathBuf::from(var(key).unwrap_or_else(|| default.to_string()));

        let google_credentials = match (var("GOOGLE_SERVICE_ACCOUNT_JSON"), var("GOOGLE_SERVICE_ACCOUNT_FILE")) {
            (Some(json), _) => Some(Credentials::Json(json)),
            (None, Some(file)) => Some(Credentials::File(PathBuf::from(file))),
            (None, None) => None,
        };

        let number = |key: &str, default: u64| -> Result<u64> {
            var(key)
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .map_err(|_| eyre!("{key} must be a non-negative integer"))
                })
                .transpose()
                .map(|value| value.unwrap_or(default))
        };

        let role_expiry_secs = number("ROLE_EXPIRY_INTERVAL_SECS", DEFAULT_ROLE_EXPIRY_INTERVAL_SECS)?;
        let sticky_secs = number("STICKY_INTERVAL_SECS", DEFAULT_STICKY_INTERVAL_SECS)?;

        let log_level = match var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()).trim() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        Ok(Self {
            token,
            test_guild_id,
            server_config_path: path("SERVER_CONFIG_PATH", DEFAULT_SERVER_CONFIG_PATH),
            quiz_config_path: path("QUIZ_CONFIG_PATH", DEFAULT_QUIZ_CONFIG_PATH),
            voice_config_path: path("VOICE_CONFIG_PATH", DEFAULT_VOICE_CONFIG_PATH),
            google_credentials,
            sheets_min_interval: Duration::from_millis(number(
                "SHEETS_MIN_INTERVAL_MS",
                DEFAULT_SHEETS_MIN_INTERVAL_MS,
            )?),
            role_expiry_interval: Duration::from_secs(role_expiry_secs.max(1)),
            sticky_interval: Duration::from_secs(sticky_secs.max(1)),
            log_level,
        })
    }

    pub fn quiz_enabled(&self) -> bool {
        self.google_credentials.is_some()
    }
}

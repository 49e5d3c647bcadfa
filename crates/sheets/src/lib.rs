pub mod auth;
pub mod client;
pub mod error;
pub mod throttle;

use eyre::WrapErr;
use std::path::PathBuf;
use std::time::Duration;

pub use auth::ServiceAccountKey;
pub use client::GoogleSheetsClient;
pub use error::{SheetsError, SheetsResult};

/// Where the service-account key comes from.
#[derive(Debug, Clone)]
pub enum Credentials {
    Json(String),
    File(PathBuf),
}

impl Credentials {
    pub fn load(&self) -> SheetsResult<ServiceAccountKey> {
        match self {
            Credentials::Json(json) => ServiceAccountKey::from_json(json),
            Credentials::File(path) => ServiceAccountKey::from_file(path),
        }
    }
}

/// Builds a Sheets client that spaces its requests at least `min_interval` apart.
pub fn connect(credentials: &Credentials, min_interval: Duration) -> eyre::Result<GoogleSheetsClient> {
    let key = credentials
        .load()
        .wrap_err("Failed to load Google service account key")?;
    GoogleSheetsClient::new(key, min_interval).wrap_err("Failed to create Sheets client")
}

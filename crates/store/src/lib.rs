pub mod json;

pub use json::JsonStore;

use eyre::Result;
use std::path::Path;

use repere_core::models::quiz::QuizConfig;
use repere_core::models::server::ServerState;
use repere_core::models::voice::VoiceCreators;

/// Every document the bot persists.
pub struct Stores {
    pub server: JsonStore<ServerState>,
    pub quiz: JsonStore<QuizConfig>,
    pub voice: JsonStore<VoiceCreators>,
}

impl Stores {
    pub fn open(server: impl AsRef<Path>, quiz: impl AsRef<Path>, voice: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            server: JsonStore::open(server)?,
            quiz: JsonStore::open(quiz)?,
            voice: JsonStore::open(voice)?,
        })
    }
}

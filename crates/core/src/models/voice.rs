use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ChannelId, GuildId};

/// Where created channels are placed relative to their creator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelPosition {
    Before,
    #[default]
    After,
}

impl ChannelPosition {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "before" => Some(ChannelPosition::Before),
            "after" => Some(ChannelPosition::After),
            _ => None,
        }
    }
}

/// A "join to create" lobby channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceCreatorConfig {
    pub channel_id: ChannelId,
    pub template_name: String,
    #[serde(default)]
    pub position: ChannelPosition,
    #[serde(default)]
    pub user_limit: u32,
}

/// Lobby channels per guild, persisted as `voice_creators.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceCreators(BTreeMap<GuildId, BTreeMap<ChannelId, VoiceCreatorConfig>>);

impl VoiceCreators {
    pub fn get(&self, guild: GuildId, channel: ChannelId) -> Option<&VoiceCreatorConfig> {
        self.0.get(&guild)?.get(&channel)
    }

    pub fn list(&self, guild: GuildId) -> Vec<VoiceCreatorConfig> {
        self.0
            .get(&guild)
            .map(|creators| creators.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn channels(&self) -> Vec<(GuildId, ChannelId)> {
        self.0
            .iter()
            .flat_map(|(guild, creators)| creators.keys().map(move |channel| (*guild, *channel)))
            .collect()
    }

    pub fn insert(&mut self, guild: GuildId, config: VoiceCreatorConfig) {
        self.0.entry(guild).or_default().insert(config.channel_id, config);
    }

    pub fn remove(&mut self, guild: GuildId, channel: ChannelId) -> bool {
        let Some(creators) = self.0.get_mut(&guild) else {
            return false;
        };
        let removed = creators.remove(&channel).is_some();
        if creators.is_empty() {
            self.0.remove(&guild);
        }
        removed
    }

    /// Drops creators whose channel no longer exists; returns how many were dropped.
    pub fn retain_existing(&mut self, mut exists: impl FnMut(GuildId, ChannelId) -> bool) -> usize {
        let mut dropped = 0;
        for (guild, creators) in self.0.iter_mut() {
            let before = creators.len();
            creators.retain(|channel, _| exists(*guild, *channel));
            dropped += before - creators.len();
        }
        self.0.retain(|_, creators| !creators.is_empty());
        dropped
    }
}

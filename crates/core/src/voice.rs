//! Join-to-create voice channels.

use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, instrument, warn};

use crate::errors::CoreResult;
use crate::models::discord::MemberInfo;
use crate::models::voice::{VoiceCreatorConfig, VoiceCreators};
use crate::models::{ChannelId, GuildId};
use crate::ports::{NewVoiceChannel, StateStore, VoiceSink};

pub const MAX_CHANNEL_NAME_LEN: usize = 100;

const FALLBACK_CHANNEL_NAME: &str = "Voice";

/// Substitutes `{user}` and clamps the result to a valid channel name.
pub fn render_channel_name(template: &str, display_name: &str) -> String {
    let rendered = template.replace("{user}", display_name);
    let rendered = rendered.trim();
    if rendered.is_empty() {
        return FALLBACK_CHANNEL_NAME.to_string();
    }
    rendered.chars().take(MAX_CHANNEL_NAME_LEN).collect()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VoiceUpdate {
    pub created: Option<ChannelId>,
    pub deleted: Option<ChannelId>,
}

/// Tracks the channels created from lobbies until they empty out.
///
/// Created channels are not persisted: after a restart, leftovers have to be
/// removed by hand.
#[derive(Debug, Default)]
pub struct VoiceLobby {
    created: Mutex<BTreeMap<GuildId, BTreeSet<ChannelId>>>,
}

impl VoiceLobby {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_tracked(&self, guild: GuildId, channel: ChannelId) -> bool {
        self.created
            .lock()
            .get(&guild)
            .is_some_and(|channels| channels.contains(&channel))
    }

    pub fn tracked(&self, guild: GuildId) -> Vec<ChannelId> {
        self.created
            .lock()
            .get(&guild)
            .map(|channels| channels.iter().copied().collect())
            .unwrap_or_default()
    }

    fn track(&self, guild: GuildId, channel: ChannelId) {
        self.created.lock().entry(guild).or_default().insert(channel);
    }

    fn untrack(&self, guild: GuildId, channel: ChannelId) {
        let mut created = self.created.lock();
        if let Some(channels) = created.get_mut(&guild) {
            channels.remove(&channel);
            if channels.is_empty() {
                created.remove(&guild);
            }
        }
    }

    /// Reacts to a member moving between voice channels.
    ///
    /// Joining a lobby spawns a channel for the member; leaving a created
    /// channel that is now empty deletes it.
    #[instrument(skip(self, voice, creators, member), fields(member = %member.id))]
    pub async fn on_voice_update<V, S>(
        &self,
        voice: &V,
        creators: &S,
        guild: GuildId,
        member: &MemberInfo,
        left: Option<ChannelId>,
        joined: Option<ChannelId>,
    ) -> VoiceUpdate
    where
        V: VoiceSink,
        S: StateStore<VoiceCreators>,
    {
        let mut update = VoiceUpdate::default();

        if let Some(lobby) = joined {
            if let Some(config) = creators.read(|creators| creators.get(guild, lobby).cloned()) {
                update.created = self.spawn(voice, guild, member, &config).await;
            }
        }

        if let Some(channel) = left.filter(|channel| Some(*channel) != joined) {
            if self.is_tracked(guild, channel) && voice.channel_occupancy(guild, channel).await == 0 {
                match voice.delete_channel(channel).await {
                    Ok(()) => {
                        info!(%channel, "Deleted empty voice channel");
                        update.deleted = Some(channel);
                        self.untrack(guild, channel);
                    }
                    Err(error) if error.is_not_found() => self.untrack(guild, channel),
                    Err(error) => warn!(%channel, %error, "Failed to delete empty voice channel"),
                }
            }
        }

        update
    }

    async fn spawn<V: VoiceSink>(
        &self,
        voice: &V,
        guild: GuildId,
        member: &MemberInfo,
        config: &VoiceCreatorConfig,
    ) -> Option<ChannelId> {
        let request = NewVoiceChannel {
            name: render_channel_name(&config.template_name, &member.display_name),
            next_to: config.channel_id,
            position: config.position,
            user_limit: config.user_limit,
        };
        let channel = match voice.create_voice_channel(guild, &request).await {
            Ok(channel) => channel,
            Err(error) => {
                warn!(lobby = %config.channel_id, %error, "Failed to create voice channel");
                return None;
            }
        };
        self.track(guild, channel);
        info!(%channel, name = %request.name, "Created voice channel");

        if let Err(error) = voice.move_member(guild, member.id, channel).await {
            warn!(%channel, %error, "Failed to move member into new voice channel");
        }
        Some(channel)
    }
}

/// Forgets lobbies whose channel was deleted while the bot was away.
pub async fn prune_creators<V, S>(voice: &V, creators: &S) -> CoreResult<usize>
where
    V: VoiceSink,
    S: StateStore<VoiceCreators>,
{
    let mut missing = BTreeSet::new();
    for (guild, channel) in creators.read(VoiceCreators::channels) {
        if !voice.channel_exists(guild, channel).await {
            missing.insert((guild, channel));
        }
    }
    if missing.is_empty() {
        return Ok(0);
    }
    let dropped = creators.update(|creators| {
        creators.retain_existing(|guild, channel| !missing.contains(&(guild, channel)))
    })?;
    info!(dropped, "Pruned voice creators with deleted channels");
    Ok(dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_user_placeholder() {
        assert_eq!(render_channel_name("🔊 {user}", "Alice"), "🔊 Alice");
        assert_eq!(render_channel_name("Room", "Alice"), "Room");
    }

    #[test]
    fn clamps_names() {
        let long = "x".repeat(150);
        assert_eq!(render_channel_name("{user}", &long).chars().count(), MAX_CHANNEL_NAME_LEN);
        assert_eq!(render_channel_name("{user}", "  "), "Voice");
    }
}

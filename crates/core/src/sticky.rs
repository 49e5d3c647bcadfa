//! Keeps configured messages at the bottom of their channels.

use tracing::{debug, instrument, warn};

use crate::errors::CoreResult;
use crate::models::server::{ServerState, StickyMessageConfig};
use crate::models::{ChannelId, GuildId, MessageId};
use crate::ports::{ActionSink, StateStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickyAction {
    /// The sticky already is the latest message.
    Unchanged,
    Reposted(MessageId),
}

/// Checks every configured sticky message once.
///
/// Failures are logged per channel and do not stop the others.
#[instrument(skip_all)]
pub async fn maintain_all<A, S>(sink: &A, store: &S) -> usize
where
    A: ActionSink,
    S: StateStore<ServerState>,
{
    let mut reposted = 0;
    for (guild, channel, config) in store.read(ServerState::sticky_entries) {
        match maintain(sink, store, guild, channel, &config).await {
            Ok(StickyAction::Reposted(_)) => reposted += 1,
            Ok(StickyAction::Unchanged) => {}
            Err(error) => warn!(%guild, %channel, %error, "Failed to maintain sticky message"),
        }
    }
    reposted
}

/// Reposts the sticky message of one channel if something was posted after it.
pub async fn maintain<A, S>(
    sink: &A,
    store: &S,
    guild: GuildId,
    channel: ChannelId,
    config: &StickyMessageConfig,
) -> CoreResult<StickyAction>
where
    A: ActionSink,
    S: StateStore<ServerState>,
{
    let latest = sink.latest_message(channel).await?;
    if latest.is_some() && latest == config.last_message_id {
        return Ok(StickyAction::Unchanged);
    }

    if let Some(previous) = config.last_message_id {
        if let Err(error) = sink.delete_message(channel, previous).await {
            debug!(%channel, message = %previous, %error, "Old sticky message not deleted");
        }
    }

    let message = sink.send_message(channel, &config.content).await?;
    store.update(|state| state.update_sticky_message_id(guild, channel, message))?;
    debug!(%channel, %message, "Sticky message reposted");
    Ok(StickyAction::Reposted(message))
}

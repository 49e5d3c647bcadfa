//! serenity-backed implementation of the core action ports.

use async_trait::async_trait;
use serenity::cache::Cache;
use serenity::http::{Http, HttpError};
use serenity::model::ModelError;
use serenity::model::channel::ChannelType;
use serenity::model::guild::{Guild, Member};
use serenity::model::id as discord;
use serenity::model::permissions::Permissions;
use std::sync::Arc;
use tracing::debug;

use repere_core::errors::{ActionError, ActionResult};
use repere_core::models::discord::{GuildInfo, MemberInfo, PermissionIssue, RoleHierarchy};
use repere_core::models::voice::ChannelPosition;
use repere_core::models::{ChannelId, GuildId, MemberId, MessageId, RoleId};
use repere_core::ports::{ActionSink, NewVoiceChannel, VoiceSink};

const MEMBER_PAGE_SIZE: u64 = 1000;

/// Maps an HTTP status from Discord onto the action error kinds.
pub fn classify_status(status: u16, message: String) -> ActionError {
    match status {
        401 | 403 => ActionError::PermissionDenied(message),
        404 => ActionError::NotFound(message),
        429 => ActionError::RateLimited(message),
        _ => ActionError::Other(message),
    }
}

pub fn action_error(error: serenity::Error) -> ActionError {
    match &error {
        serenity::Error::Http(http_error) => {
            if let HttpError::UnsuccessfulRequest(response) = http_error.as_ref() {
                return classify_status(response.status_code.as_u16(), response.error.message.clone());
            }
        }
        serenity::Error::Model(ModelError::InvalidPermissions(missing)) => {
            return ActionError::PermissionDenied(format!("missing permissions: {missing:?}"));
        }
        _ => {}
    }
    ActionError::Other(error.to_string())
}

pub fn member_info(member: &Member) -> MemberInfo {
    MemberInfo {
        id: MemberId(member.user.id.0),
        name: member.user.name.clone(),
        display_name: member.display_name().into_owned(),
        roles: member.roles.iter().map(|role| RoleId(role.0)).collect(),
    }
}

fn hierarchy(guild: &Guild, bot: discord::UserId, role: RoleId) -> Option<RoleHierarchy> {
    let bot_member = guild.members.get(&bot)?;
    let mut permissions = guild
        .roles
        .get(&discord::RoleId(guild.id.0))
        .map(|everyone| everyone.permissions)
        .unwrap_or_else(Permissions::empty);
    let mut top = 0;
    for role_id in &bot_member.roles {
        if let Some(bot_role) = guild.roles.get(role_id) {
            permissions |= bot_role.permissions;
            top = top.max(bot_role.position);
        }
    }

    let target = guild.roles.get(&discord::RoleId(role.get()));
    Some(RoleHierarchy {
        bot_has_manage_roles: guild.owner_id == bot
            || permissions.contains(Permissions::MANAGE_ROLES)
            || permissions.contains(Permissions::ADMINISTRATOR),
        bot_top_position: top,
        target_position: target.map(|role| role.position),
        target_managed: target.is_some_and(|role| role.managed),
    })
}

/// Performs actions through the Discord HTTP API, reading from the gateway
/// cache where it can.
#[derive(Clone)]
pub struct DiscordSink {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl DiscordSink {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        Self { http, cache }
    }

    /// Cached members, if the cache holds every member of the guild.
    fn cached_members(&self, guild: GuildId) -> Option<Vec<MemberInfo>> {
        self.cache
            .guild_field(discord::GuildId(guild.get()), |guild| {
                (guild.members.len() as u64 >= guild.member_count)
                    .then(|| guild.members.values().map(member_info).collect::<Vec<_>>())
            })
            .flatten()
    }

    async fn fetch_members(&self, guild: GuildId) -> ActionResult<Vec<MemberInfo>> {
        let guild_id = discord::GuildId(guild.get());
        let mut members = Vec::new();
        let mut after = None;
        loop {
            let page = guild_id
                .members(&self.http, Some(MEMBER_PAGE_SIZE), after)
                .await
                .map_err(action_error)?;
            let full_page = page.len() as u64 == MEMBER_PAGE_SIZE;
            after = page.last().map(|member| member.user.id);
            members.extend(page.iter().map(member_info));
            if !full_page {
                break;
            }
        }
        debug!(%guild, count = members.len(), "Fetched guild members");
        Ok(members)
    }
}

#[async_trait]
impl ActionSink for DiscordSink {
    async fn guilds(&self) -> Vec<GuildInfo> {
        let mut guilds: Vec<GuildInfo> = self
            .cache
            .guilds()
            .into_iter()
            .filter_map(|id| {
                self.cache.guild_field(id, |guild| GuildInfo {
                    id: GuildId(guild.id.0),
                    name: guild.name.clone(),
                })
            })
            .collect();
        guilds.sort_by_key(|guild| guild.id);
        guilds
    }

    async fn members(&self, guild: GuildId) -> ActionResult<Vec<MemberInfo>> {
        let mut members = match self.cached_members(guild) {
            Some(members) => members,
            None => self.fetch_members(guild).await?,
        };
        members.sort_by_key(|member| member.id);
        Ok(members)
    }

    async fn member(&self, guild: GuildId, member: MemberId) -> ActionResult<Option<MemberInfo>> {
        if let Some(cached) = self
            .cache
            .member(discord::GuildId(guild.get()), discord::UserId(member.get()))
        {
            return Ok(Some(member_info(&cached)));
        }
        match self.http.get_member(guild.get(), member.get()).await {
            Ok(fetched) => Ok(Some(member_info(&fetched))),
            Err(error) => match action_error(error) {
                ActionError::NotFound(_) => Ok(None),
                other => Err(other),
            },
        }
    }

    async fn grant_role(&self, guild: GuildId, member: MemberId, role: RoleId, reason: &str) -> ActionResult<()> {
        self.http
            .add_member_role(guild.get(), member.get(), role.get(), Some(reason))
            .await
            .map_err(action_error)
    }

    async fn revoke_role(&self, guild: GuildId, member: MemberId, role: RoleId, reason: &str) -> ActionResult<()> {
        self.http
            .remove_member_role(guild.get(), member.get(), role.get(), Some(reason))
            .await
            .map_err(action_error)
    }

    async fn send_message(&self, channel: ChannelId, content: &str) -> ActionResult<MessageId> {
        let message = discord::ChannelId(channel.get())
            .say(&self.http, content)
            .await
            .map_err(action_error)?;
        Ok(MessageId(message.id.0))
    }

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> ActionResult<()> {
        discord::ChannelId(channel.get())
            .delete_message(&self.http, discord::MessageId(message.get()))
            .await
            .map_err(action_error)
    }

    async fn latest_message(&self, channel: ChannelId) -> ActionResult<Option<MessageId>> {
        let messages = discord::ChannelId(channel.get())
            .messages(&self.http, |retriever| retriever.limit(1))
            .await
            .map_err(action_error)?;
        Ok(messages.first().map(|message| MessageId(message.id.0)))
    }

    async fn diagnose_role_grant(&self, guild: GuildId, role: RoleId) -> Vec<PermissionIssue> {
        let bot = self.cache.current_user_id();
        self.cache
            .guild_field(discord::GuildId(guild.get()), |guild| hierarchy(guild, bot, role))
            .flatten()
            .map(|hierarchy| hierarchy.diagnose(role))
            .unwrap_or_default()
    }
}

#[async_trait]
impl VoiceSink for DiscordSink {
    async fn create_voice_channel(&self, guild: GuildId, request: &NewVoiceChannel) -> ActionResult<ChannelId> {
        let (category, creator_position) = self
            .cache
            .guild_channel(discord::ChannelId(request.next_to.get()))
            .map(|creator| (creator.parent_id, creator.position))
            .unwrap_or((None, 0));
        let position = match request.position {
            ChannelPosition::Before => creator_position.max(0),
            ChannelPosition::After => creator_position.max(0) + 1,
        } as u32;

        let channel = discord::GuildId(guild.get())
            .create_channel(&self.http, |channel| {
                channel.name(&request.name).kind(ChannelType::Voice).position(position);
                if let Some(category) = category {
                    channel.category(category);
                }
                if request.user_limit > 0 {
                    channel.user_limit(request.user_limit);
                }
                channel
            })
            .await
            .map_err(action_error)?;
        Ok(ChannelId(channel.id.0))
    }

    async fn move_member(&self, guild: GuildId, member: MemberId, channel: ChannelId) -> ActionResult<()> {
        discord::GuildId(guild.get())
            .move_member(&self.http, discord::UserId(member.get()), discord::ChannelId(channel.get()))
            .await
            .map(|_| ())
            .map_err(action_error)
    }

    async fn delete_channel(&self, channel: ChannelId) -> ActionResult<()> {
        discord::ChannelId(channel.get())
            .delete(&self.http)
            .await
            .map(|_| ())
            .map_err(action_error)
    }

    async fn channel_occupancy(&self, guild: GuildId, channel: ChannelId) -> usize {
        let channel = discord::ChannelId(channel.get());
        self.cache
            .guild_field(discord::GuildId(guild.get()), |guild| {
                guild
                    .voice_states
                    .values()
                    .filter(|state| state.channel_id == Some(channel))
                    .count()
            })
            .unwrap_or(0)
    }

    async fn channel_exists(&self, guild: GuildId, channel: ChannelId) -> bool {
        let channel = discord::ChannelId(channel.get());
        // An uncached guild says nothing about its channels.
        self.cache
            .guild_field(discord::GuildId(guild.get()), |guild| guild.channels.contains_key(&channel))
            .unwrap_or(true)
    }
}

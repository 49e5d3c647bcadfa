use eyre::Result;
use serenity::model::{
    application::interaction::application_command::ApplicationCommandInteraction, channel::ChannelType, id as discord,
};
use tracing::{info, warn};

use repere_core::locale::{self, Text};
use repere_core::models::voice::{ChannelPosition, VoiceCreatorConfig};
use repere_core::models::{ChannelId, GuildId};
use repere_core::ports::{StateStore, VoiceSink};
use repere_core::voice::MAX_CHANNEL_NAME_LEN;

use super::HandlerContext;
use super::options::CommandOptions;
use crate::commands::voice::{DEFAULT_CREATOR_NAME, DEFAULT_TEMPLATE};
use crate::replies;

pub const MAX_USER_LIMIT: u32 = 99;

/// Settings requested through `/setupvoice`, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSetup {
    pub template_name: String,
    pub creator_name: String,
    pub position: ChannelPosition,
    pub user_limit: u32,
}

fn valid_name(name: &str) -> bool {
    let length = name.chars().count();
    (1..=MAX_CHANNEL_NAME_LEN).contains(&length)
}

impl VoiceSetup {
    /// `None` when a name is empty or too long.
    pub fn from_options(options: &CommandOptions) -> Option<Self> {
        let template_name = options.string("template_name").unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());
        let creator_name = options.string("creator_name").unwrap_or_else(|| DEFAULT_CREATOR_NAME.to_string());
        if !valid_name(template_name.trim()) || !valid_name(creator_name.trim()) {
            return None;
        }
        let position = options
            .string("position")
            .and_then(|raw| ChannelPosition::parse(&raw))
            .unwrap_or_default();
        let user_limit = options
            .integer("user_limit")
            .map_or(0, |limit| limit.clamp(0, i64::from(MAX_USER_LIMIT)) as u32);

        Some(Self {
            template_name,
            creator_name,
            position,
            user_limit,
        })
    }
}

/// Handle the /setupvoice command
pub async fn handle_setupvoice_command(
    ctx: &HandlerContext,
    command: &ApplicationCommandInteraction,
    guild: GuildId,
) -> Result<()> {
    let language = ctx.language(guild);
    let options = CommandOptions::from_data(&command.data.options);
    let Some(setup) = VoiceSetup::from_options(&options) else {
        return ctx.reply(command, &locale::text(language, Text::VoiceInvalidName, &[])).await;
    };

    // The creator goes into the category of the channel the command was used in.
    let category = ctx
        .ctx
        .cache
        .guild_channel(command.channel_id)
        .and_then(|channel| channel.parent_id);
    let creator = discord::GuildId(guild.get())
        .create_channel(&ctx.ctx.http, |channel| {
            channel.name(&setup.creator_name).kind(ChannelType::Voice);
            if let Some(category) = category {
                channel.category(category);
            }
            channel
        })
        .await?;
    let channel = ChannelId(creator.id.0);

    ctx.state.stores.voice.update(|creators| {
        creators.insert(
            guild,
            VoiceCreatorConfig {
                channel_id: channel,
                template_name: setup.template_name.clone(),
                position: setup.position,
                user_limit: setup.user_limit,
            },
        )
    })?;
    info!(%guild, %channel, template = %setup.template_name, "Voice creator created");

    let limit = replies::limit_label(language, setup.user_limit);
    let text = locale::text(
        language,
        Text::VoiceSetup,
        &[
            ("channel", channel.mention().as_str()),
            ("template", setup.template_name.as_str()),
            ("location", replies::position_label(language, setup.position)),
            ("limit", limit.as_str()),
        ],
    );
    ctx.reply(command, &text).await
}

/// Handle the /removevoice command
pub async fn handle_removevoice_command(
    ctx: &HandlerContext,
    command: &ApplicationCommandInteraction,
    guild: GuildId,
) -> Result<()> {
    let language = ctx.language(guild);
    let options = CommandOptions::from_data(&command.data.options);
    let channel = options.required_channel("channel")?;

    let is_creator = ctx
        .state
        .stores
        .voice
        .read(|creators| creators.get(guild, channel).is_some());
    if !is_creator {
        return ctx.reply(command, &locale::text(language, Text::VoiceNotCreator, &[])).await;
    }

    if let Err(why) = ctx.sink().delete_channel(channel).await {
        warn!(%channel, "Failed to delete voice creator channel: {}", why);
    }
    ctx.state.stores.voice.update(|creators| creators.remove(guild, channel))?;
    info!(%guild, %channel, "Voice creator removed");
    ctx.reply(command, &locale::text(language, Text::VoiceRemoved, &[])).await
}

/// Handle the /listvoice command
pub async fn handle_listvoice_command(
    ctx: &HandlerContext,
    command: &ApplicationCommandInteraction,
    guild: GuildId,
) -> Result<()> {
    let language = ctx.language(guild);
    let creators = ctx.state.stores.voice.read(|creators| creators.list(guild));
    let text = if creators.is_empty() {
        locale::text(language, Text::VoiceNone, &[])
    } else {
        replies::voice_creators(language, &creators)
    };
    ctx.reply(command, &text).await
}

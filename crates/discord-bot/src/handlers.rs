use chrono::Utc;
use serenity::{
    async_trait,
    model::{
        application::{
            command::Command,
            interaction::{
                Interaction, InteractionResponseType, application_command::ApplicationCommandInteraction,
            },
        },
        gateway::Ready,
        guild::Member,
        voice::VoiceState,
    },
    prelude::*,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

use repere_core::autorole;
use repere_core::locale::{self, Language, Text};
use repere_core::models::{ChannelId, GuildId, MemberId};
use repere_core::ports::{ActionSink, StateStore};
use repere_core::quiz;
use repere_core::voice;

use crate::replies;
use crate::scheduler;
use crate::sink::{DiscordSink, member_info};
use crate::BotState;

pub mod config;
pub mod options;
pub mod quiz_commands;
pub mod voice_commands;

/// Main Discord handler that processes all events.
pub struct Handler {
    state: Arc<BotState>,
    tasks_started: AtomicBool,
}

impl Handler {
    pub fn new(state: Arc<BotState>) -> Self {
        Self {
            state,
            tasks_started: AtomicBool::new(false),
        }
    }

    async fn register_commands(&self, ctx: &Context) {
        // Guild commands show up immediately, global ones after a cache delay.
        if let Some(test_guild_id) = self.state.config.test_guild_id {
            let guild_id = serenity::model::id::GuildId(test_guild_id);
            match guild_id
                .set_application_commands(&ctx.http, |commands| crate::commands::register_commands(commands))
                .await
            {
                Ok(cmds) => info!(guild = test_guild_id, total = cmds.len(), "Guild commands registered"),
                Err(why) => error!("Error registering guild commands: {:?}", why),
            }
        }

        match Command::set_global_application_commands(&ctx.http, |commands| {
            crate::commands::register_commands(commands)
        })
        .await
        {
            Ok(cmds) => {
                info!(total = cmds.len(), "Global commands registered");
                for cmd in cmds {
                    debug!("Command registered: /{} - {}", cmd.name, cmd.description);
                }
            }
            Err(why) => error!("Error registering global commands: {:?}", why),
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    /// Handle ready events (when bot connects to Discord)
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);
        self.register_commands(&ctx).await;

        let sink = DiscordSink::new(ctx.http.clone(), ctx.cache.clone());

        // Ready fires again after every reconnect.
        if self.tasks_started.swap(true, Ordering::SeqCst) {
            return;
        }

        match voice::prune_creators(&sink, &self.state.stores.voice).await {
            Ok(0) => {}
            Ok(dropped) => info!(dropped, "Removed voice creators whose channel is gone"),
            Err(why) => warn!("Failed to prune voice creators: {}", why),
        }

        if let Some(sheets) = &self.state.sheets {
            let config = self.state.stores.quiz.snapshot();
            if let Err(why) = quiz::ensure_status_sheet(sheets, &config).await {
                warn!("Status sheet not ready: {}", why);
            }
        }

        scheduler::spawn_all(self.state.clone(), sink);
    }

    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        let sink = DiscordSink::new(ctx.http.clone(), ctx.cache.clone());
        let guild = GuildId(new_member.guild_id.0);
        let member = member_info(&new_member);

        match autorole::on_member_join(&sink, &self.state.stores.server, guild, &member, Utc::now()).await {
            Ok(report) => debug!(
                %guild,
                member = %member.id,
                granted = report.granted.len(),
                skipped = report.skipped_rejoin.len(),
                failed = report.failed.len(),
                "Join handled"
            ),
            Err(why) => error!(%guild, member = %member.id, "Error handling member join: {}", why),
        }
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let Some(guild_id) = new.guild_id else {
            return;
        };
        let left = old.and_then(|state| state.channel_id).map(|channel| ChannelId(channel.0));
        let joined = new.channel_id.map(|channel| ChannelId(channel.0));
        if left == joined {
            return;
        }

        let sink = DiscordSink::new(ctx.http.clone(), ctx.cache.clone());
        let guild = GuildId(guild_id.0);
        let member = match &new.member {
            Some(member) => member_info(member),
            None => match sink.member(guild, MemberId(new.user_id.0)).await {
                Ok(Some(member)) => member,
                Ok(None) => return,
                Err(why) => {
                    warn!(%guild, "Failed to look up member for voice update: {}", why);
                    return;
                }
            },
        };

        self.state
            .lobby
            .on_voice_update(&sink, &self.state.stores.voice, guild, &member, left, joined)
            .await;
    }

    /// Handle slash commands
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::ApplicationCommand(command) = interaction else {
            return;
        };
        info!("Received command: {}", command.data.name);

        let handler_ctx = HandlerContext {
            ctx: ctx.clone(),
            state: self.state.clone(),
        };

        let Some(guild) = command.guild_id.map(|guild| GuildId(guild.0)) else {
            let text = locale::text(Language::default(), Text::GuildOnly, &[]);
            if let Err(why) = handler_ctx.reply(&command, &text).await {
                error!("Failed to send response: {:?}", why);
            }
            return;
        };
        let language = handler_ctx.language(guild);

        if !is_admin(&command) {
            let text = locale::text(language, Text::AdminOnly, &[]);
            if let Err(why) = handler_ctx.reply_ephemeral(&command, &text).await {
                error!("Failed to send response: {:?}", why);
            }
            return;
        }

        let result = match command.data.name.as_str() {
            "config" => config::handle_config_command(&handler_ctx, &command, guild).await,
            "autorole" => config::handle_autorole_command(&handler_ctx, &command, guild).await,
            "setupvoice" => voice_commands::handle_setupvoice_command(&handler_ctx, &command, guild).await,
            "removevoice" => voice_commands::handle_removevoice_command(&handler_ctx, &command, guild).await,
            "listvoice" => voice_commands::handle_listvoice_command(&handler_ctx, &command, guild).await,
            "quiz" => quiz_commands::handle_quiz_command(&handler_ctx, &command, guild).await,
            "massgive" => quiz_commands::handle_massgive_command(&handler_ctx, &command, guild).await,
            "help" => handler_ctx.reply_ephemeral(&command, &replies::help(language)).await,
            _ => {
                error!("Unknown command: {}", command.data.name);
                Err(eyre::eyre!("Unknown command"))
            }
        };

        if let Err(e) = result {
            error!("Error handling command: {:?}", e);

            let text = locale::text(language, Text::CommandFailed, &[("error", e.to_string().as_str())]);
            if let Err(why) = handler_ctx.reply_ephemeral(&command, &text).await {
                error!("Failed to send error response: {:?}", why);
            }
        }
    }
}

fn is_admin(command: &ApplicationCommandInteraction) -> bool {
    command
        .member
        .as_ref()
        .and_then(|member| member.permissions)
        .is_some_and(|permissions| permissions.administrator())
}

/// Shared context for command handlers.
pub struct HandlerContext {
    pub ctx: Context,
    pub state: Arc<BotState>,
}

impl HandlerContext {
    pub fn sink(&self) -> DiscordSink {
        DiscordSink::new(self.ctx.http.clone(), self.ctx.cache.clone())
    }

    pub fn language(&self, guild: GuildId) -> Language {
        self.state.stores.server.read(|state| state.language(guild))
    }

    pub async fn reply(&self, command: &ApplicationCommandInteraction, content: &str) -> eyre::Result<()> {
        self.respond(command, content, false).await
    }

    pub async fn reply_ephemeral(&self, command: &ApplicationCommandInteraction, content: &str) -> eyre::Result<()> {
        self.respond(command, content, true).await
    }

    async fn respond(&self, command: &ApplicationCommandInteraction, content: &str, ephemeral: bool) -> eyre::Result<()> {
        let content = replies::truncate(content);
        command
            .create_interaction_response(&self.ctx.http, |r| {
                r.kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|m| m.content(content).ephemeral(ephemeral))
            })
            .await?;
        Ok(())
    }
}

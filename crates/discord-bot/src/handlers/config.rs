use chrono::Utc;
use eyre::Result;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use tracing::{debug, info};

use repere_core::locale::{self, Language, Text};
use repere_core::models::GuildId;
use repere_core::models::server::{AutoroleConfig, Trigger};
use repere_core::ports::{ActionSink, StateStore};

use super::HandlerContext;
use super::options::{CommandOptions, subcommand};
use crate::replies::{self, ExpiryListing};

/// An auto-role as requested through `/config autorole`.
///
/// `None` when the expiry is zero or negative.
pub fn autorole_from_options(options: &CommandOptions) -> Result<Option<AutoroleConfig>> {
    let role = options.required_role("role")?;
    let expiry_minutes = match options.integer("expiry_minutes") {
        None => None,
        Some(minutes) => match u32::try_from(minutes) {
            Ok(minutes) if minutes > 0 => Some(minutes),
            _ => return Ok(None),
        },
    };
    let trigger = options
        .string("trigger")
        .and_then(|raw| Trigger::parse(&raw))
        .unwrap_or_default();

    Ok(Some(AutoroleConfig {
        role_id: role,
        expiry_minutes,
        check_rejoin: options.boolean("check_rejoin").unwrap_or(false),
        trigger,
    }))
}

/// Handle the /config command
pub async fn handle_config_command(
    ctx: &HandlerContext,
    command: &ApplicationCommandInteraction,
    guild: GuildId,
) -> Result<()> {
    let (name, options) = subcommand(&command.data.options)?;
    let server = &ctx.state.stores.server;
    let language = ctx.language(guild);

    match name {
        "language" => {
            let code = options.required_string("language")?;
            let text = match Language::parse(&code) {
                Some(language) => {
                    server.update(|state| state.set_language(guild, language))?;
                    locale::text(language, Text::LanguageSet, &[])
                }
                None => locale::text(
                    language,
                    Text::LanguageInvalid,
                    &[("langs", Language::available().as_str())],
                ),
            };
            ctx.reply(command, &text).await
        }
        "autorole" => {
            let Some(config) = autorole_from_options(&options)? else {
                return ctx
                    .reply(command, &locale::text(language, Text::AutoroleInvalidExpiry, &[]))
                    .await;
            };
            let role = config.role_id.mention();
            let expiry = replies::expiry_label(language, &config);
            let rejoin = if config.check_rejoin { "✓" } else { "✗" };
            let text = locale::text(
                language,
                Text::AutoroleSaved,
                &[
                    ("role", role.as_str()),
                    ("trigger", config.trigger.as_str()),
                    ("expiry", expiry.as_str()),
                    ("rejoin", rejoin),
                ],
            );
            info!(%guild, role = %config.role_id, trigger = config.trigger.as_str(), "Auto-role saved");
            server.update(|state| state.add_autorole(guild, config))?;
            ctx.reply(command, &text).await
        }
        "remove_autorole" => {
            let role = options.role("role");
            let removed = server.update(|state| state.remove_autorole(guild, role))?;
            let key = if removed { Text::AutoroleRemoved } else { Text::AutoroleNone };
            ctx.reply(command, &locale::text(language, key, &[])).await
        }
        "autorole_logs" => {
            let channel = options.required_channel("channel")?;
            server.update(|state| state.set_autorole_log_channel(guild, channel))?;
            let text = locale::text(language, Text::AutoroleLogsSet, &[("channel", channel.mention().as_str())]);
            ctx.reply(command, &text).await
        }
        "sticky" => {
            let channel = options.required_channel("channel")?;
            let content = options.required_string("content")?;
            server.update(|state| state.set_sticky(guild, channel, content))?;
            let text = locale::text(language, Text::StickySet, &[("channel", channel.mention().as_str())]);
            ctx.reply(command, &text).await
        }
        "remove_sticky" => {
            let channel = options.required_channel("channel")?;
            let previous = server.read(|state| state.sticky(guild, channel).and_then(|sticky| sticky.last_message_id));
            let removed = server.update(|state| state.remove_sticky(guild, channel))?;
            if let Some(message) = previous {
                if let Err(why) = ctx.sink().delete_message(channel, message).await {
                    debug!(%channel, "Old sticky message not deleted: {}", why);
                }
            }
            let key = if removed { Text::StickyRemoved } else { Text::StickyMissing };
            ctx.reply(command, &locale::text(language, key, &[("channel", channel.mention().as_str())]))
                .await
        }
        _ => ctx.reply_ephemeral(command, "Unknown subcommand").await,
    }
}

/// Handle the /autorole command
pub async fn handle_autorole_command(
    ctx: &HandlerContext,
    command: &ApplicationCommandInteraction,
    guild: GuildId,
) -> Result<()> {
    let (name, _) = subcommand(&command.data.options)?;
    let server = &ctx.state.stores.server;
    let language = ctx.language(guild);
    let configs = server.read(|state| state.autoroles(guild).to_vec());

    if configs.is_empty() {
        return ctx
            .reply_ephemeral(command, &locale::text(language, Text::AutoroleNone, &[]))
            .await;
    }

    let text = match name {
        "list_configs" => replies::autorole_configs(language, &configs),
        "list_expiry" => {
            let members = ctx.sink().members(guild).await?;
            let now = Utc::now();
            let listings: Vec<ExpiryListing> = configs
                .iter()
                .filter(|config| config.expiry().is_some())
                .map(|config| ExpiryListing {
                    role: config.role_id,
                    members: members
                        .iter()
                        .filter(|member| member.has_role(config.role_id))
                        .map(|member| {
                            let left = server.read(|state| state.minutes_left(guild, config.role_id, member.id, now));
                            (member.display_name.clone(), left)
                        })
                        .collect(),
                })
                .collect();
            if listings.is_empty() {
                locale::text(language, Text::AutoroleNone, &[])
            } else {
                replies::expiry_list(language, &listings)
            }
        }
        "list_no_expiry" => {
            let members = ctx.sink().members(guild).await?;
            let listings: Vec<_> = configs
                .iter()
                .filter(|config| config.expiry().is_none())
                .map(|config| {
                    let holders = members
                        .iter()
                        .filter(|member| member.has_role(config.role_id))
                        .map(|member| member.display_name.clone())
                        .collect();
                    (config.role_id, holders)
                })
                .collect();
            if listings.is_empty() {
                locale::text(language, Text::AutoroleNone, &[])
            } else {
                replies::no_expiry_list(language, &listings)
            }
        }
        _ => "Unknown subcommand".to_string(),
    };

    ctx.reply_ephemeral(command, &text).await
}

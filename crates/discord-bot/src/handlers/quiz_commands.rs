use eyre::Result;
use serenity::model::application::interaction::{
    InteractionResponseType, application_command::ApplicationCommandInteraction,
};
use tracing::info;

use repere_core::errors::CoreError;
use repere_core::locale::{self, Text};
use repere_core::mass_grant::{GRANT_PAUSE, MassGrantScope, mass_grant};
use repere_core::matching::format_score;
use repere_core::models::quiz::{DEFAULT_CHECK_INTERVAL_SECS, QuizConfig};
use repere_core::models::{ChannelId, GuildId, RoleId};
use repere_core::ports::{StateStore, notify};
use repere_core::quiz::{self, QuizEngine};

use super::HandlerContext;
use super::options::{CommandOptions, subcommand};
use crate::commands::quiz::{MAX_CHECK_INTERVAL_SECS, MIN_CHECK_INTERVAL_SECS};
use crate::replies;

pub const DEFAULT_MIN_SCORE: i64 = 17;

/// Settings requested through `/quiz setup`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSetup {
    pub spreadsheet_id: String,
    pub waiting_role: RoleId,
    pub access_role: RoleId,
    pub min_score: f64,
    pub check_interval: u64,
    pub log_channel: Option<ChannelId>,
}

impl QuizSetup {
    pub fn from_options(options: &CommandOptions) -> Result<Self> {
        let spreadsheet_id = options.required_string("spreadsheet_id")?.trim().to_string();
        if spreadsheet_id.is_empty() {
            eyre::bail!("Missing spreadsheet_id parameter");
        }
        let check_interval = options
            .integer("check_interval")
            .map_or(DEFAULT_CHECK_INTERVAL_SECS, |secs| secs.max(0) as u64)
            .clamp(MIN_CHECK_INTERVAL_SECS, MAX_CHECK_INTERVAL_SECS);

        Ok(Self {
            spreadsheet_id,
            waiting_role: options.required_role("waiting_role")?,
            access_role: options.required_role("access_role")?,
            min_score: options.integer("min_score").unwrap_or(DEFAULT_MIN_SCORE) as f64,
            check_interval,
            log_channel: options.channel("log_channel"),
        })
    }

    /// Writes the settings into `config`; returns `true` when the
    /// spreadsheet changed, which invalidates the row cursor.
    pub fn apply(&self, config: &mut QuizConfig) -> bool {
        let changed = config.spreadsheet_id.as_deref() != Some(self.spreadsheet_id.as_str());
        config.spreadsheet_id = Some(self.spreadsheet_id.clone());
        config.waiting_role_id = Some(self.waiting_role);
        config.access_role_id = Some(self.access_role);
        config.min_score = self.min_score;
        config.check_interval = self.check_interval;
        config.check_interval_default = self.check_interval;
        config.log_channel_id = self.log_channel;
        if changed {
            config.last_processed_row = None;
        }
        changed
    }
}

/// Handle the /quiz command
pub async fn handle_quiz_command(
    ctx: &HandlerContext,
    command: &ApplicationCommandInteraction,
    guild: GuildId,
) -> Result<()> {
    let (name, options) = subcommand(&command.data.options)?;
    let language = ctx.language(guild);
    let store = &ctx.state.stores.quiz;

    match name {
        "setup" => {
            let setup = QuizSetup::from_options(&options)?;
            // Held until the engine is replaced so no pass runs against the old sheet in between.
            let mut engine = ctx.state.quiz.lock().await;
            let (changed, config) = store.update(|config| (setup.apply(config), config.clone()))?;
            if changed {
                *engine = QuizEngine::new();
            }
            drop(engine);
            ctx.state.quiz_wakeup.notify_one();
            info!(spreadsheet = %setup.spreadsheet_id, interval = setup.check_interval, "Quiz automation configured");

            let text = locale::text(
                language,
                Text::QuizSaved,
                &[
                    ("sheet", setup.spreadsheet_id.as_str()),
                    ("waiting", setup.waiting_role.mention().as_str()),
                    ("access", setup.access_role.mention().as_str()),
                    ("min", format_score(config.min_score).as_str()),
                    ("max", format_score(config.max_score).as_str()),
                    ("interval", setup.check_interval.to_string().as_str()),
                ],
            );
            notify(&ctx.sink(), config.log_channel_id, &text).await;
            ctx.reply(command, &text).await
        }
        "status" => {
            let config = store.snapshot();
            let status = ctx.state.quiz.lock().await.status(&config);
            let text = replies::quiz_status(language, &status, ctx.state.sheets.is_some());
            ctx.reply(command, &text).await
        }
        "test" => {
            let Some(sheets) = &ctx.state.sheets else {
                return ctx
                    .reply_ephemeral(command, &locale::text(language, Text::QuizDisabled, &[]))
                    .await;
            };
            let config = store.snapshot();
            if config.spreadsheet().is_none() {
                return ctx
                    .reply_ephemeral(command, &locale::text(language, Text::QuizNotConfigured, &[]))
                    .await;
            }
            let text = match quiz::preview_results(sheets, &config).await {
                Ok(submissions) => replies::quiz_preview(language, &submissions, config.max_score),
                Err(error) => locale::text(language, Text::CommandFailed, &[("error", error.to_string().as_str())]),
            };
            ctx.reply(command, &text).await
        }
        _ => ctx.reply_ephemeral(command, "Unknown subcommand").await,
    }
}

/// Handle the /massgive command
///
/// The grant can take a while on large servers, so the response is
/// deferred and edited once every member was handled.
pub async fn handle_massgive_command(
    ctx: &HandlerContext,
    command: &ApplicationCommandInteraction,
    guild: GuildId,
) -> Result<()> {
    let language = ctx.language(guild);
    let options = CommandOptions::from_data(&command.data.options);
    let role = options.required_role("target_role")?;
    let Some(scope) = MassGrantScope::from_options(options.boolean("everyone").unwrap_or(false), options.role("filter_role"))
    else {
        return ctx
            .reply_ephemeral(command, &locale::text(language, Text::MassGiveNeedsTarget, &[]))
            .await;
    };

    command
        .create_interaction_response(&ctx.ctx.http, |r| {
            r.kind(InteractionResponseType::DeferredChannelMessageWithSource)
        })
        .await?;

    let reason = format!("Mass grant by {}", command.user.name);
    let text = match mass_grant(&ctx.sink(), guild, role, scope, &reason, GRANT_PAUSE).await {
        Ok(report) if report.total == 0 => locale::text(language, Text::MassGiveNothingToDo, &[]),
        Ok(report) => replies::mass_grant_summary(language, role, &report),
        Err(error) => {
            let detail = match error {
                CoreError::Validation(issues) => issues,
                other => other.to_string(),
            };
            locale::text(language, Text::CommandFailed, &[("error", detail.as_str())])
        }
    };

    command
        .edit_original_interaction_response(&ctx.ctx.http, |response| response.content(replies::truncate(&text)))
        .await?;
    Ok(())
}

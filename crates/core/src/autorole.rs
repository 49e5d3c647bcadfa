//! Automatic role grants on member join and after quiz access.

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::errors::{ActionError, CoreResult};
use crate::locale::{self, Language, Text};
use crate::models::discord::MemberInfo;
use crate::models::server::{AutoroleConfig, ServerState, Trigger};
use crate::models::{ChannelId, GuildId, RoleId};
use crate::ports::{notify, ActionSink, StateStore};

/// What happened to each auto-role considered for one member.
#[derive(Debug, Default, PartialEq)]
pub struct GrantReport {
    pub granted: Vec<RoleId>,
    /// Skipped because the member had joined before.
    pub skipped_rejoin: Vec<RoleId>,
    /// Skipped because the member already holds the role.
    pub already_held: Vec<RoleId>,
    pub failed: Vec<(RoleId, ActionError)>,
}

/// Handles a member joining `guild`.
///
/// Every `on_join` auto-role is granted unless it asks to skip rejoins and
/// the member was seen joining before. The join itself is recorded after
/// the configs are evaluated, whatever their outcome.
#[instrument(skip(sink, store, member), fields(member = %member.id))]
pub async fn on_member_join<A, S>(
    sink: &A,
    store: &S,
    guild: GuildId,
    member: &MemberInfo,
    now: DateTime<Utc>,
) -> CoreResult<GrantReport>
where
    A: ActionSink,
    S: StateStore<ServerState>,
{
    let (configs, rejoined) = store.read(|state| {
        (
            state.autoroles_with_trigger(guild, Trigger::OnJoin),
            state.has_joined_before(guild, member.id),
        )
    });

    let mut report = GrantReport::default();
    for config in configs {
        if config.check_rejoin && rejoined {
            info!(role = %config.role_id, "Member rejoined, skipping auto-role");
            report.skipped_rejoin.push(config.role_id);
            continue;
        }
        grant(sink, store, guild, member, &config, now, &mut report).await?;
    }

    store.update(|state| state.record_join(guild, member.id))?;
    Ok(report)
}

/// Grants every auto-role of `guild` configured with `trigger` that the
/// member does not already hold.
#[instrument(skip(sink, store, member), fields(member = %member.id))]
pub async fn apply_trigger<A, S>(
    sink: &A,
    store: &S,
    guild: GuildId,
    member: &MemberInfo,
    trigger: Trigger,
    now: DateTime<Utc>,
) -> CoreResult<GrantReport>
where
    A: ActionSink,
    S: StateStore<ServerState>,
{
    let configs = store.read(|state| state.autoroles_with_trigger(guild, trigger));

    let mut report = GrantReport::default();
    for config in configs {
        if member.has_role(config.role_id) {
            report.already_held.push(config.role_id);
            continue;
        }
        grant(sink, store, guild, member, &config, now, &mut report).await?;
    }
    Ok(report)
}

async fn grant<A, S>(
    sink: &A,
    store: &S,
    guild: GuildId,
    member: &MemberInfo,
    config: &AutoroleConfig,
    now: DateTime<Utc>,
    report: &mut GrantReport,
) -> CoreResult<()>
where
    A: ActionSink,
    S: StateStore<ServerState>,
{
    let trigger = config.trigger.as_str();
    let reason = format!("Autorole ({trigger})");
    let (log_channel, language) = log_target(store, guild);

    match sink.grant_role(guild, member.id, config.role_id, &reason).await {
        Ok(()) => {
            if config.expiry().is_some() {
                store.update(|state| state.add_role_assignment(guild, config.role_id, member.id, now))?;
            }
            info!(role = %config.role_id, trigger, "Auto-role granted");
            let line = locale::text(
                language,
                Text::AutoroleGranted,
                &[
                    ("role", config.role_id.mention().as_str()),
                    ("member", member.id.mention().as_str()),
                    ("trigger", trigger),
                ],
            );
            notify(sink, log_channel, &line).await;
            report.granted.push(config.role_id);
        }
        Err(error) => {
            warn!(role = %config.role_id, trigger, %error, "Failed to grant auto-role");
            if error.is_permission() {
                for issue in sink.diagnose_role_grant(guild, config.role_id).await {
                    warn!(role = %config.role_id, %issue, "Role permission issue");
                }
            }
            let line = locale::text(
                language,
                Text::AutoroleGrantFailed,
                &[
                    ("role", config.role_id.mention().as_str()),
                    ("member", member.id.mention().as_str()),
                    ("trigger", trigger),
                    ("error", error.to_string().as_str()),
                ],
            );
            notify(sink, log_channel, &line).await;
            report.failed.push((config.role_id, error));
        }
    }
    Ok(())
}

pub(crate) fn log_target<S: StateStore<ServerState>>(store: &S, guild: GuildId) -> (Option<ChannelId>, Language) {
    store.read(|state| (state.autorole_log_channel(guild), state.language(guild)))
}

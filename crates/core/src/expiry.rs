//! Revocation of auto-roles whose expiry deadline has passed.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::autorole::log_target;
use crate::errors::CoreResult;
use crate::locale::{self, Text};
use crate::models::server::{ExpiredAssignment, ServerState};
use crate::ports::{notify, ActionSink, StateStore};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub revoked: usize,
    /// The member had left or no longer held the role.
    pub untracked: usize,
    pub failed: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.revoked + self.untracked + self.failed
    }
}

/// Revokes every expired auto-role and forgets its assignment.
///
/// The assignment record is removed even when the revoke fails, so a
/// missing permission is reported once per assignment instead of on every
/// sweep. A failed member lookup keeps the record for the next sweep.
#[instrument(skip_all)]
pub async fn sweep<A, S>(sink: &A, store: &S, now: DateTime<Utc>) -> CoreResult<SweepReport>
where
    A: ActionSink,
    S: StateStore<ServerState>,
{
    let expired = store.read(|state| state.expired_assignments(now));
    let mut report = SweepReport::default();

    for assignment in expired {
        if !revoke(sink, store, &assignment, &mut report).await {
            continue;
        }
        store.update(|state| {
            state.remove_role_assignment(assignment.guild_id, assignment.role_id, assignment.member_id)
        })?;
    }

    if report.total() > 0 {
        info!(
            revoked = report.revoked,
            untracked = report.untracked,
            failed = report.failed,
            "Role expiry sweep finished"
        );
    }
    Ok(report)
}

/// `false` when nothing was attempted and the assignment must be retried.
async fn revoke<A, S>(sink: &A, store: &S, assignment: &ExpiredAssignment, report: &mut SweepReport) -> bool
where
    A: ActionSink,
    S: StateStore<ServerState>,
{
    let ExpiredAssignment {
        guild_id,
        role_id,
        member_id,
    } = *assignment;

    let holds_role = match sink.member(guild_id, member_id).await {
        Ok(Some(member)) => member.has_role(role_id),
        Ok(None) => false,
        Err(error) => {
            warn!(guild = %guild_id, member = %member_id, %error, "Failed to look up member for expiry");
            report.failed += 1;
            return false;
        }
    };
    if !holds_role {
        debug!(guild = %guild_id, role = %role_id, member = %member_id, "Expired role no longer held");
        report.untracked += 1;
        return true;
    }

    let (log_channel, language) = log_target(store, guild_id);
    let role = role_id.mention();
    let member = member_id.mention();
    let line = match sink.revoke_role(guild_id, member_id, role_id, "Autorole expired").await {
        Ok(()) => {
            info!(guild = %guild_id, role = %role_id, member = %member_id, "Expired role revoked");
            report.revoked += 1;
            locale::text(language, Text::AutoroleRevoked, &[("role", role.as_str()), ("member", member.as_str())])
        }
        Err(error) => {
            warn!(guild = %guild_id, role = %role_id, member = %member_id, %error, "Failed to revoke expired role");
            report.failed += 1;
            let error = error.to_string();
            locale::text(
                language,
                Text::AutoroleRevokeFailed,
                &[("role", role.as_str()), ("member", member.as_str()), ("error", error.as_str())],
            )
        }
    };
    notify(sink, log_channel, &line).await;
    true
}

//! Granting one role to many members at once.

use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::errors::{CoreError, CoreResult};
use crate::models::discord::MemberInfo;
use crate::models::{GuildId, RoleId};
use crate::ports::ActionSink;

/// Spacing between two grants, keeps the bot under the platform rate limit.
pub const GRANT_PAUSE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MassGrantScope {
    Everyone,
    /// Only members holding this role.
    WithRole(RoleId),
}

impl MassGrantScope {
    /// `everyone` wins over a filter role; `None` when neither is given.
    pub fn from_options(everyone: bool, filter: Option<RoleId>) -> Option<Self> {
        if everyone {
            Some(MassGrantScope::Everyone)
        } else {
            filter.map(MassGrantScope::WithRole)
        }
    }

    pub fn includes(&self, member: &MemberInfo) -> bool {
        match self {
            MassGrantScope::Everyone => true,
            MassGrantScope::WithRole(role) => member.has_role(*role),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MassGrantReport {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
}

/// Members in `scope` that do not hold `role` yet.
pub fn candidates(members: &[MemberInfo], role: RoleId, scope: MassGrantScope) -> Vec<&MemberInfo> {
    members
        .iter()
        .filter(|member| scope.includes(member) && !member.has_role(role))
        .collect()
}

/// Grants `role` to every candidate, one at a time with `pause` in between.
#[instrument(skip(sink, reason))]
pub async fn mass_grant<A: ActionSink>(
    sink: &A,
    guild: GuildId,
    role: RoleId,
    scope: MassGrantScope,
    reason: &str,
    pause: Duration,
) -> CoreResult<MassGrantReport> {
    let issues = sink.diagnose_role_grant(guild, role).await;
    if !issues.is_empty() {
        let issues: Vec<String> = issues.iter().map(ToString::to_string).collect();
        return Err(CoreError::Validation(issues.join("; ")));
    }

    let members = sink.members(guild).await?;
    let targets = candidates(&members, role, scope);
    let mut report = MassGrantReport {
        total: targets.len(),
        ..Default::default()
    };

    for member in targets {
        match sink.grant_role(guild, member.id, role, reason).await {
            Ok(()) => report.success += 1,
            Err(error) => {
                warn!(member = %member.id, %error, "Mass grant failed for member");
                report.failed += 1;
            }
        }
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    info!(total = report.total, success = report.success, failed = report.failed, "Mass grant finished");
    Ok(report)
}

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{GuildId, MemberId, RoleId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildInfo {
    pub id: GuildId,
    pub name: String,
}

/// Snapshot of a guild member as seen by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    pub id: MemberId,
    /// Unique account handle.
    pub name: String,
    /// Server nickname, falling back to the global name or handle.
    pub display_name: String,
    pub roles: Vec<RoleId>,
}

impl MemberInfo {
    pub fn has_role(&self, role: RoleId) -> bool {
        self.roles.contains(&role)
    }
}

/// Reasons the bot may be unable to manage a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionIssue {
    MissingManageRoles,
    RoleNotFound(RoleId),
    /// The bot's highest role must sit above the role it manages.
    RoleAboveBot {
        role: RoleId,
        role_position: i64,
        bot_position: i64,
    },
    /// The role is managed by an integration and cannot be assigned.
    ManagedRole(RoleId),
}

impl fmt::Display for PermissionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionIssue::MissingManageRoles => {
                write!(f, "bot lacks the Manage Roles permission")
            }
            PermissionIssue::RoleNotFound(role) => write!(f, "role {role} does not exist"),
            PermissionIssue::RoleAboveBot {
                role,
                role_position,
                bot_position,
            } => write!(
                f,
                "role {role} (position {role_position}) is not below the bot's top role (position {bot_position})"
            ),
            PermissionIssue::ManagedRole(role) => {
                write!(f, "role {role} is managed by an integration")
            }
        }
    }
}

/// Everything needed to decide whether the bot can manage a role.
#[derive(Debug, Clone, Default)]
pub struct RoleHierarchy {
    pub bot_has_manage_roles: bool,
    pub bot_top_position: i64,
    pub target_position: Option<i64>,
    pub target_managed: bool,
}

impl RoleHierarchy {
    pub fn diagnose(&self, role: RoleId) -> Vec<PermissionIssue> {
        let mut issues = Vec::new();
        if !self.bot_has_manage_roles {
            issues.push(PermissionIssue::MissingManageRoles);
        }
        match self.target_position {
            None => issues.push(PermissionIssue::RoleNotFound(role)),
            Some(position) => {
                if position >= self.bot_top_position {
                    issues.push(PermissionIssue::RoleAboveBot {
                        role,
                        role_position: position,
                        bot_position: self.bot_top_position,
                    });
                }
                if self.target_managed {
                    issues.push(PermissionIssue::ManagedRole(role));
                }
            }
        }
        issues
    }
}

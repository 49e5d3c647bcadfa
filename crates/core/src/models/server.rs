//! Per-guild server configuration and the bookkeeping behind auto-roles.
//!
//! [`ServerState`] mirrors the `server_config.json` document. All access goes
//! through guild-scoped methods so handlers never touch the raw maps.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{ChannelId, GuildId, MemberId, MessageId, RoleId};
use crate::locale::Language;

/// When an auto-role is handed out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    #[default]
    OnJoin,
    OnQuizAccess,
}

impl Trigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Trigger::OnJoin => "on_join",
            Trigger::OnQuizAccess => "on_quiz_access",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "on_join" => Some(Trigger::OnJoin),
            "on_quiz_access" => Some(Trigger::OnQuizAccess),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoroleConfig {
    pub role_id: RoleId,
    #[serde(default)]
    pub expiry_minutes: Option<u32>,
    #[serde(default)]
    pub check_rejoin: bool,
    #[serde(default)]
    pub trigger: Trigger,
}

impl AutoroleConfig {
    pub fn new(role_id: RoleId) -> Self {
        Self {
            role_id,
            expiry_minutes: None,
            check_rejoin: false,
            trigger: Trigger::OnJoin,
        }
    }

    /// Zero is treated like no expiry at all.
    pub fn expiry(&self) -> Option<Duration> {
        self.expiry_minutes
            .filter(|minutes| *minutes > 0)
            .map(|minutes| Duration::minutes(i64::from(minutes)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickyMessageConfig {
    pub content: String,
    #[serde(default)]
    pub last_message_id: Option<MessageId>,
}

/// A role assignment whose expiry deadline has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExpiredAssignment {
    pub guild_id: GuildId,
    pub role_id: RoleId,
    pub member_id: MemberId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerState {
    #[serde(default, deserialize_with = "deserialize_autoroles")]
    autorole: BTreeMap<GuildId, Vec<AutoroleConfig>>,
    #[serde(default)]
    autorole_logs: BTreeMap<GuildId, ChannelId>,
    #[serde(default)]
    sticky_messages: BTreeMap<GuildId, BTreeMap<ChannelId, StickyMessageConfig>>,
    #[serde(default)]
    joined_members: BTreeMap<GuildId, BTreeSet<MemberId>>,
    #[serde(default, deserialize_with = "deserialize_assignment_dates")]
    role_assignment_dates: BTreeMap<GuildId, BTreeMap<RoleId, BTreeMap<MemberId, DateTime<Utc>>>>,
    #[serde(default)]
    languages: BTreeMap<GuildId, Language>,
}

impl ServerState {
    pub fn autoroles(&self, guild: GuildId) -> &[AutoroleConfig] {
        self.autorole.get(&guild).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn autoroles_with_trigger(&self, guild: GuildId, trigger: Trigger) -> Vec<AutoroleConfig> {
        self.autoroles(guild)
            .iter()
            .filter(|config| config.trigger == trigger)
            .cloned()
            .collect()
    }

    /// Adds a config, replacing any existing one for the same role.
    pub fn add_autorole(&mut self, guild: GuildId, config: AutoroleConfig) {
        let configs = self.autorole.entry(guild).or_default();
        configs.retain(|existing| existing.role_id != config.role_id);
        configs.push(config);
    }

    /// Removes one role's config, or every config of the guild when `role` is `None`.
    pub fn remove_autorole(&mut self, guild: GuildId, role: Option<RoleId>) -> bool {
        let Some(configs) = self.autorole.get_mut(&guild) else {
            return false;
        };
        let removed = match role {
            None => {
                configs.clear();
                true
            }
            Some(role) => {
                let before = configs.len();
                configs.retain(|config| config.role_id != role);
                configs.len() != before
            }
        };
        if configs.is_empty() {
            self.autorole.remove(&guild);
        }
        removed
    }

    pub fn autorole_log_channel(&self, guild: GuildId) -> Option<ChannelId> {
        self.autorole_logs.get(&guild).copied()
    }

    pub fn set_autorole_log_channel(&mut self, guild: GuildId, channel: ChannelId) {
        self.autorole_logs.insert(guild, channel);
    }

    pub fn language(&self, guild: GuildId) -> Language {
        self.languages.get(&guild).copied().unwrap_or_default()
    }

    pub fn set_language(&mut self, guild: GuildId, language: Language) {
        self.languages.insert(guild, language);
    }

    pub fn sticky(&self, guild: GuildId, channel: ChannelId) -> Option<&StickyMessageConfig> {
        self.sticky_messages.get(&guild)?.get(&channel)
    }

    /// Every configured sticky message, in guild then channel order.
    pub fn sticky_entries(&self) -> Vec<(GuildId, ChannelId, StickyMessageConfig)> {
        self.sticky_messages
            .iter()
            .flat_map(|(guild, channels)| {
                channels
                    .iter()
                    .map(move |(channel, config)| (*guild, *channel, config.clone()))
            })
            .collect()
    }

    pub fn set_sticky(&mut self, guild: GuildId, channel: ChannelId, content: impl Into<String>) {
        self.sticky_messages.entry(guild).or_default().insert(
            channel,
            StickyMessageConfig {
                content: content.into(),
                last_message_id: None,
            },
        );
    }

    pub fn remove_sticky(&mut self, guild: GuildId, channel: ChannelId) -> bool {
        let Some(channels) = self.sticky_messages.get_mut(&guild) else {
            return false;
        };
        let removed = channels.remove(&channel).is_some();
        if channels.is_empty() {
            self.sticky_messages.remove(&guild);
        }
        removed
    }

    /// Records the id of the freshly posted sticky. No-op if the sticky was removed meanwhile.
    pub fn update_sticky_message_id(&mut self, guild: GuildId, channel: ChannelId, message: MessageId) {
        if let Some(config) = self
            .sticky_messages
            .get_mut(&guild)
            .and_then(|channels| channels.get_mut(&channel))
        {
            config.last_message_id = Some(message);
        }
    }

    pub fn has_joined_before(&self, guild: GuildId, member: MemberId) -> bool {
        self.joined_members
            .get(&guild)
            .is_some_and(|members| members.contains(&member))
    }

    /// Returns `true` when this is the first recorded join.
    pub fn record_join(&mut self, guild: GuildId, member: MemberId) -> bool {
        self.joined_members.entry(guild).or_default().insert(member)
    }

    pub fn role_assignment(&self, guild: GuildId, role: RoleId, member: MemberId) -> Option<DateTime<Utc>> {
        self.role_assignment_dates
            .get(&guild)?
            .get(&role)?
            .get(&member)
            .copied()
    }

    /// Records (or refreshes) when `role` was granted to `member`.
    pub fn add_role_assignment(&mut self, guild: GuildId, role: RoleId, member: MemberId, at: DateTime<Utc>) {
        self.role_assignment_dates
            .entry(guild)
            .or_default()
            .entry(role)
            .or_default()
            .insert(member, at);
    }

    pub fn remove_role_assignment(&mut self, guild: GuildId, role: RoleId, member: MemberId) -> bool {
        let Some(roles) = self.role_assignment_dates.get_mut(&guild) else {
            return false;
        };
        let Some(members) = roles.get_mut(&role) else {
            return false;
        };
        let removed = members.remove(&member).is_some();
        if members.is_empty() {
            roles.remove(&role);
        }
        if roles.is_empty() {
            self.role_assignment_dates.remove(&guild);
        }
        removed
    }

    pub fn assignment_count(&self) -> usize {
        self.role_assignment_dates
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    /// Every tracked assignment whose deadline `assigned_at + expiry` is at or before `now`.
    pub fn expired_assignments(&self, now: DateTime<Utc>) -> Vec<ExpiredAssignment> {
        let mut expired = Vec::new();
        for (guild, configs) in &self.autorole {
            for config in configs {
                let Some(expiry) = config.expiry() else {
                    continue;
                };
                let cutoff = now - expiry;
                let Some(members) = self
                    .role_assignment_dates
                    .get(guild)
                    .and_then(|roles| roles.get(&config.role_id))
                else {
                    continue;
                };
                expired.extend(
                    members
                        .iter()
                        .filter(|(_, assigned_at)| **assigned_at <= cutoff)
                        .map(|(member, _)| ExpiredAssignment {
                            guild_id: *guild,
                            role_id: config.role_id,
                            member_id: *member,
                        }),
                );
            }
        }
        expired
    }

    /// Whole minutes left before `role` expires for `member`, floored at zero.
    ///
    /// `None` when the role has no expiry or no assignment is tracked.
    pub fn minutes_left(&self, guild: GuildId, role: RoleId, member: MemberId, now: DateTime<Utc>) -> Option<i64> {
        let expiry = self
            .autoroles(guild)
            .iter()
            .find(|config| config.role_id == role)?
            .expiry()?;
        let assigned_at = self.role_assignment(guild, role, member)?;
        Some((assigned_at + expiry - now).num_minutes().max(0))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<AutoroleConfig>),
    One(AutoroleConfig),
}

// Early files stored a single config object per guild.
fn deserialize_autoroles<'de, D>(deserializer: D) -> Result<BTreeMap<GuildId, Vec<AutoroleConfig>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<GuildId, OneOrMany>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(guild, configs)| match configs {
            OneOrMany::Many(configs) => (guild, configs),
            OneOrMany::One(config) => (guild, vec![config]),
        })
        .filter(|(_, configs)| !configs.is_empty())
        .collect())
}

fn deserialize_assignment_dates<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<GuildId, BTreeMap<RoleId, BTreeMap<MemberId, DateTime<Utc>>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<GuildId, BTreeMap<RoleId, BTreeMap<MemberId, String>>>::deserialize(deserializer)?;
    let mut parsed = BTreeMap::new();
    for (guild, roles) in raw {
        let mut parsed_roles = BTreeMap::new();
        for (role, members) in roles {
            let mut parsed_members = BTreeMap::new();
            for (member, raw) in members {
                let at = parse_timestamp(&raw).ok_or_else(|| {
                    <D::Error as serde::de::Error>::custom(format!("invalid timestamp `{raw}`"))
                })?;
                parsed_members.insert(member, at);
            }
            parsed_roles.insert(role, parsed_members);
        }
        parsed.insert(guild, parsed_roles);
    }
    Ok(parsed)
}

/// Accepts RFC 3339 as well as offset-less ISO-8601, which is read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

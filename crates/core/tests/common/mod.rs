#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};

use repere_core::errors::{ActionError, ActionResult, CoreError, CoreResult};
use repere_core::models::discord::{GuildInfo, MemberInfo, PermissionIssue};
use repere_core::models::{ChannelId, GuildId, MemberId, MessageId, RoleId};
use repere_core::ports::{ActionSink, SheetGateway, SheetRange, SheetRow};

pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
}

pub fn member(id: u64, name: &str, roles: &[RoleId]) -> MemberInfo {
    MemberInfo {
        id: MemberId(id),
        name: name.to_string(),
        display_name: name.to_string(),
        roles: roles.to_vec(),
    }
}

#[derive(Default)]
struct DiscordState {
    guilds: Vec<GuildInfo>,
    members: BTreeMap<GuildId, BTreeMap<MemberId, MemberInfo>>,
    denied_roles: BTreeSet<RoleId>,
    grants: Vec<(GuildId, MemberId, RoleId)>,
    revokes: Vec<(GuildId, MemberId, RoleId)>,
    sent: Vec<(ChannelId, String)>,
    next_message: u64,
}

/// In-memory stand-in for the chat platform.
#[derive(Default)]
pub struct FakeDiscord {
    state: Mutex<DiscordState>,
}

impl FakeDiscord {
    pub fn with_guild(self, id: u64, name: &str) -> Self {
        self.state.lock().guilds.push(GuildInfo {
            id: GuildId(id),
            name: name.to_string(),
        });
        self
    }

    pub fn with_member(self, guild: u64, member: MemberInfo) -> Self {
        self.add_member(GuildId(guild), member);
        self
    }

    pub fn add_member(&self, guild: GuildId, member: MemberInfo) {
        self.state.lock().members.entry(guild).or_default().insert(member.id, member);
    }

    pub fn remove_member(&self, guild: GuildId, member: MemberId) {
        if let Some(members) = self.state.lock().members.get_mut(&guild) {
            members.remove(&member);
        }
    }

    pub fn deny_role(&self, role: RoleId) {
        self.state.lock().denied_roles.insert(role);
    }

    pub fn holds(&self, guild: GuildId, member: MemberId, role: RoleId) -> bool {
        self.state
            .lock()
            .members
            .get(&guild)
            .and_then(|members| members.get(&member))
            .is_some_and(|member| member.has_role(role))
    }

    pub fn grants(&self) -> Vec<(GuildId, MemberId, RoleId)> {
        self.state.lock().grants.clone()
    }

    pub fn grants_of(&self, role: RoleId) -> usize {
        self.state.lock().grants.iter().filter(|(_, _, r)| *r == role).count()
    }

    pub fn revokes(&self) -> Vec<(GuildId, MemberId, RoleId)> {
        self.state.lock().revokes.clone()
    }

    pub fn sent(&self) -> Vec<(ChannelId, String)> {
        self.state.lock().sent.clone()
    }
}

#[async_trait]
impl ActionSink for FakeDiscord {
    async fn guilds(&self) -> Vec<GuildInfo> {
        self.state.lock().guilds.clone()
    }

    async fn members(&self, guild: GuildId) -> ActionResult<Vec<MemberInfo>> {
        Ok(self
            .state
            .lock()
            .members
            .get(&guild)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn member(&self, guild: GuildId, member: MemberId) -> ActionResult<Option<MemberInfo>> {
        Ok(self
            .state
            .lock()
            .members
            .get(&guild)
            .and_then(|members| members.get(&member))
            .cloned())
    }

    async fn grant_role(&self, guild: GuildId, member: MemberId, role: RoleId, _reason: &str) -> ActionResult<()> {
        let mut state = self.state.lock();
        if state.denied_roles.contains(&role) {
            return Err(ActionError::PermissionDenied("Missing Permissions".to_string()));
        }
        let record = state
            .members
            .get_mut(&guild)
            .and_then(|members| members.get_mut(&member))
            .ok_or_else(|| ActionError::NotFound("Unknown Member".to_string()))?;
        if !record.roles.contains(&role) {
            record.roles.push(role);
        }
        state.grants.push((guild, member, role));
        Ok(())
    }

    async fn revoke_role(&self, guild: GuildId, member: MemberId, role: RoleId, _reason: &str) -> ActionResult<()> {
        let mut state = self.state.lock();
        if state.denied_roles.contains(&role) {
            return Err(ActionError::PermissionDenied("Missing Permissions".to_string()));
        }
        if let Some(record) = state.members.get_mut(&guild).and_then(|members| members.get_mut(&member)) {
            record.roles.retain(|held| *held != role);
        }
        state.revokes.push((guild, member, role));
        Ok(())
    }

    async fn send_message(&self, channel: ChannelId, content: &str) -> ActionResult<MessageId> {
        let mut state = self.state.lock();
        state.next_message += 1;
        state.sent.push((channel, content.to_string()));
        Ok(MessageId(1000 + state.next_message))
    }

    async fn delete_message(&self, _channel: ChannelId, _message: MessageId) -> ActionResult<()> {
        Ok(())
    }

    async fn latest_message(&self, _channel: ChannelId) -> ActionResult<Option<MessageId>> {
        Ok(None)
    }

    async fn diagnose_role_grant(&self, _guild: GuildId, role: RoleId) -> Vec<PermissionIssue> {
        if self.state.lock().denied_roles.contains(&role) {
            vec![PermissionIssue::MissingManageRoles]
        } else {
            Vec::new()
        }
    }
}

#[derive(Default)]
struct SheetState {
    data: Vec<SheetRow>,
    status: Option<Vec<SheetRow>>,
    reads: Vec<String>,
    fail_reads: bool,
}

/// Spreadsheet with one data sheet and an optional status sheet.
#[derive(Default)]
pub struct FakeSheet {
    state: Mutex<SheetState>,
}

impl FakeSheet {
    /// Data sheet with a header row followed by `(score, pseudo)` rows.
    pub fn with_rows(rows: &[(&str, &str)]) -> Self {
        let sheet = FakeSheet::default();
        {
            let mut state = sheet.state.lock();
            state.data.push(vec!["Horodateur".into(), "Score".into(), "Pseudo".into()]);
            for (score, pseudo) in rows {
                state
                    .data
                    .push(vec!["2024-05-01 10:00:00".into(), score.to_string(), pseudo.to_string()]);
            }
        }
        sheet
    }

    pub fn with_status_rows(self, count: usize) -> Self {
        {
            let mut state = self.state.lock();
            let status = state.status.get_or_insert_with(Vec::new);
            status.push(vec!["Timestamp".into()]);
            for index in 0..count {
                status.push(vec![format!("old {index}")]);
            }
        }
        self
    }

    pub fn push_row(&self, score: &str, pseudo: &str) {
        self.state
            .lock()
            .data
            .push(vec!["2024-05-01 10:00:00".into(), score.to_string(), pseudo.to_string()]);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    /// Status rows appended after the header.
    pub fn status_rows(&self) -> Vec<SheetRow> {
        self.state
            .lock()
            .status
            .as_ref()
            .map(|rows| rows.iter().skip(1).cloned().collect())
            .unwrap_or_default()
    }

    pub fn reads(&self) -> Vec<String> {
        self.state.lock().reads.clone()
    }
}

#[async_trait]
impl SheetGateway for FakeSheet {
    async fn read_rows(&self, _spreadsheet_id: &str, range: &SheetRange) -> CoreResult<Vec<SheetRow>> {
        let mut state = self.state.lock();
        if state.fail_reads {
            return Err(CoreError::gateway("503 Service Unavailable", true));
        }
        state.reads.push(range.to_a1());
        let rows = match range.rows {
            Some((first, last)) => state
                .data
                .iter()
                .skip(first - 1)
                .take(last + 1 - first)
                .cloned()
                .collect(),
            None => state.data.clone(),
        };
        Ok(rows)
    }

    async fn append_row(&self, _spreadsheet_id: &str, _sheet_title: &str, values: &[String]) -> CoreResult<()> {
        self.state
            .lock()
            .status
            .get_or_insert_with(Vec::new)
            .push(values.to_vec());
        Ok(())
    }

    async fn ensure_sheet_exists(&self, _spreadsheet_id: &str, _title: &str, headers: &[String]) -> CoreResult<bool> {
        let mut state = self.state.lock();
        if state.status.is_none() {
            state.status = Some(vec![headers.to_vec()]);
        }
        Ok(true)
    }

    async fn row_count(&self, _spreadsheet_id: &str, sheet_title: Option<&str>) -> CoreResult<usize> {
        let state = self.state.lock();
        if state.fail_reads {
            return Err(CoreError::gateway("503 Service Unavailable", true));
        }
        Ok(match sheet_title {
            None => state.data.len(),
            Some(_) => state.status.as_ref().map_or(0, Vec::len),
        })
    }
}

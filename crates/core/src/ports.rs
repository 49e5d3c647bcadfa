//! Interfaces to everything outside the core: durable state, the chat
//! platform and the spreadsheet service.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::errors::{ActionResult, CoreResult};
use crate::matching::resolve_member;
use crate::models::discord::{GuildInfo, MemberInfo, PermissionIssue};
use crate::models::voice::ChannelPosition;
use crate::models::{ChannelId, GuildId, MemberId, MessageId, RoleId};

/// Durable home of a state document.
///
/// Mutations go through [`StateStore::update`]; implementations persist the
/// whole document before returning. Closures must not block.
pub trait StateStore<T>: Send + Sync {
    fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R;

    fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> CoreResult<R>;

    fn snapshot(&self) -> T
    where
        T: Clone,
    {
        self.read(T::clone)
    }
}

/// Store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore<T> {
    state: RwLock<T>,
}

impl<T> MemoryStore<T> {
    pub fn new(state: T) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }
}

impl<T: Send + Sync> StateStore<T> for MemoryStore<T> {
    fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.read())
    }

    fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> CoreResult<R> {
        Ok(f(&mut self.state.write()))
    }
}

/// Side effects on the chat platform.
#[async_trait]
pub trait ActionSink: Send + Sync {
    /// Guilds the bot is currently part of.
    async fn guilds(&self) -> Vec<GuildInfo>;

    /// All members of a guild, ordered by member id.
    async fn members(&self, guild: GuildId) -> ActionResult<Vec<MemberInfo>>;

    /// `Ok(None)` when the member has left the guild.
    async fn member(&self, guild: GuildId, member: MemberId) -> ActionResult<Option<MemberInfo>>;

    async fn find_member(&self, guild: GuildId, identity: &str) -> ActionResult<Option<MemberInfo>> {
        let members = self.members(guild).await?;
        Ok(resolve_member(&members, identity).cloned())
    }

    async fn grant_role(&self, guild: GuildId, member: MemberId, role: RoleId, reason: &str) -> ActionResult<()>;

    async fn revoke_role(&self, guild: GuildId, member: MemberId, role: RoleId, reason: &str) -> ActionResult<()>;

    async fn send_message(&self, channel: ChannelId, content: &str) -> ActionResult<MessageId>;

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> ActionResult<()>;

    /// Id of the most recent message in a channel, `None` if it is empty.
    async fn latest_message(&self, channel: ChannelId) -> ActionResult<Option<MessageId>>;

    /// Explains why granting `role` may fail. Used for operator diagnostics only.
    async fn diagnose_role_grant(&self, _guild: GuildId, _role: RoleId) -> Vec<PermissionIssue> {
        Vec::new()
    }
}

/// Posts an operator notification, logging instead of failing.
pub async fn notify<A: ActionSink + ?Sized>(sink: &A, channel: Option<ChannelId>, content: &str) {
    let Some(channel) = channel else {
        return;
    };
    if let Err(error) = sink.send_message(channel, content).await {
        tracing::warn!(%channel, %error, "Failed to post to log channel");
    }
}

/// A rectangular A1 range of a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRange {
    /// `None` targets the first sheet of the spreadsheet.
    pub sheet: Option<String>,
    pub first_column: char,
    pub last_column: char,
    /// 1-based rows; both `None` selects whole columns.
    pub rows: Option<(usize, usize)>,
}

impl SheetRange {
    pub fn columns(sheet: Option<&str>, first_column: char, last_column: char) -> Self {
        Self {
            sheet: sheet.map(str::to_string),
            first_column,
            last_column,
            rows: None,
        }
    }

    pub fn with_rows(mut self, first: usize, last: usize) -> Self {
        self.rows = Some((first, last.max(first)));
        self
    }

    /// Renders the range in A1 notation, quoting the sheet title.
    pub fn to_a1(&self) -> String {
        let cells = match self.rows {
            Some((first, last)) => format!("{}{first}:{}{last}", self.first_column, self.last_column),
            None => format!("{}:{}", self.first_column, self.last_column),
        };
        match &self.sheet {
            Some(title) => format!("'{}'!{cells}", title.replace('\'', "''")),
            None => cells,
        }
    }
}

pub type SheetRow = Vec<String>;

/// Rate-limited access to the spreadsheet holding quiz submissions.
#[async_trait]
pub trait SheetGateway: Send + Sync {
    async fn read_rows(&self, spreadsheet_id: &str, range: &SheetRange) -> CoreResult<Vec<SheetRow>>;

    async fn append_row(&self, spreadsheet_id: &str, sheet_title: &str, values: &[String]) -> CoreResult<()>;

    /// Creates the sheet with a header row when missing. `Ok(true)` once it exists.
    async fn ensure_sheet_exists(&self, spreadsheet_id: &str, title: &str, headers: &[String]) -> CoreResult<bool>;

    /// Number of non-empty rows, header included. `None` counts the first sheet.
    async fn row_count(&self, spreadsheet_id: &str, sheet_title: Option<&str>) -> CoreResult<usize>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVoiceChannel {
    pub name: String,
    pub next_to: ChannelId,
    pub position: ChannelPosition,
    pub user_limit: u32,
}

/// Voice channel management on the chat platform.
#[async_trait]
pub trait VoiceSink: Send + Sync {
    async fn create_voice_channel(&self, guild: GuildId, request: &NewVoiceChannel) -> ActionResult<ChannelId>;

    async fn move_member(&self, guild: GuildId, member: MemberId, channel: ChannelId) -> ActionResult<()>;

    async fn delete_channel(&self, channel: ChannelId) -> ActionResult<()>;

    /// Members currently connected to a voice channel.
    async fn channel_occupancy(&self, guild: GuildId, channel: ChannelId) -> usize;

    async fn channel_exists(&self, guild: GuildId, channel: ChannelId) -> bool;
}

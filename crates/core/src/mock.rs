//! Mock implementations of the platform ports.

use async_trait::async_trait;
use mockall::mock;

use crate::errors::ActionResult;
use crate::models::discord::{GuildInfo, MemberInfo, PermissionIssue};
use crate::models::{ChannelId, GuildId, MemberId, MessageId, RoleId};
use crate::ports::{ActionSink, NewVoiceChannel, VoiceSink};

mock! {
    pub Sink {}

    #[async_trait]
    impl ActionSink for Sink {
        async fn guilds(&self) -> Vec<GuildInfo>;
        async fn members(&self, guild: GuildId) -> ActionResult<Vec<MemberInfo>>;
        async fn member(&self, guild: GuildId, member: MemberId) -> ActionResult<Option<MemberInfo>>;
        async fn grant_role(&self, guild: GuildId, member: MemberId, role: RoleId, reason: &str) -> ActionResult<()>;
        async fn revoke_role(&self, guild: GuildId, member: MemberId, role: RoleId, reason: &str) -> ActionResult<()>;
        async fn send_message(&self, channel: ChannelId, content: &str) -> ActionResult<MessageId>;
        async fn delete_message(&self, channel: ChannelId, message: MessageId) -> ActionResult<()>;
        async fn latest_message(&self, channel: ChannelId) -> ActionResult<Option<MessageId>>;
        async fn diagnose_role_grant(&self, guild: GuildId, role: RoleId) -> Vec<PermissionIssue>;
    }
}

mock! {
    pub Voice {}

    #[async_trait]
    impl VoiceSink for Voice {
        async fn create_voice_channel(&self, guild: GuildId, request: &NewVoiceChannel) -> ActionResult<ChannelId>;
        async fn move_member(&self, guild: GuildId, member: MemberId, channel: ChannelId) -> ActionResult<()>;
        async fn delete_channel(&self, channel: ChannelId) -> ActionResult<()>;
        async fn channel_occupancy(&self, guild: GuildId, channel: ChannelId) -> usize;
        async fn channel_exists(&self, guild: GuildId, channel: ChannelId) -> bool;
    }
}

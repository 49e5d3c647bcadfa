pub mod discord;
pub mod ids;
pub mod quiz;
pub mod server;
pub mod voice;

pub use ids::{ChannelId, GuildId, MemberId, MessageId, RoleId};

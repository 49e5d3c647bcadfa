use mockall::predicate::{always, eq};
use pretty_assertions::assert_eq;

use repere_core::errors::ActionError;
use repere_core::mock::MockSink;
use repere_core::models::server::ServerState;
use repere_core::models::{ChannelId, GuildId, MessageId};
use repere_core::ports::{MemoryStore, StateStore};
use repere_core::sticky::{maintain, maintain_all, StickyAction};

const GUILD: GuildId = GuildId(1);
const CHANNEL: ChannelId = ChannelId(5);

fn store(last_message_id: Option<MessageId>) -> MemoryStore<ServerState> {
    let mut state = ServerState::default();
    state.set_sticky(GUILD, CHANNEL, "📌 Read the rules");
    if let Some(message) = last_message_id {
        state.update_sticky_message_id(GUILD, CHANNEL, message);
    }
    MemoryStore::new(state)
}

fn config(store: &MemoryStore<ServerState>) -> repere_core::models::server::StickyMessageConfig {
    store.read(|s| s.sticky(GUILD, CHANNEL).cloned()).unwrap()
}

#[tokio::test]
async fn test_sticky_already_last_is_left_alone() {
    let store = store(Some(MessageId(9)));
    let mut sink = MockSink::new();
    sink.expect_latest_message()
        .with(eq(CHANNEL))
        .times(1)
        .returning(|_| Ok(Some(MessageId(9))));

    let action = maintain(&sink, &store, GUILD, CHANNEL, &config(&store)).await.unwrap();

    assert_eq!(action, StickyAction::Unchanged);
    assert_eq!(config(&store).last_message_id, Some(MessageId(9)));
}

#[tokio::test]
async fn test_displaced_sticky_is_reposted_once() {
    let store = store(Some(MessageId(9)));
    let mut sink = MockSink::new();
    sink.expect_latest_message()
        .times(1)
        .returning(|_| Ok(Some(MessageId(12))));
    sink.expect_delete_message()
        .with(eq(CHANNEL), eq(MessageId(9)))
        .times(1)
        .returning(|_, _| Ok(()));
    sink.expect_send_message()
        .withf(|channel, content| *channel == CHANNEL && content.contains("Read the rules"))
        .times(1)
        .returning(|_, _| Ok(MessageId(13)));

    let action = maintain(&sink, &store, GUILD, CHANNEL, &config(&store)).await.unwrap();

    assert_eq!(action, StickyAction::Reposted(MessageId(13)));
    assert_eq!(config(&store).last_message_id, Some(MessageId(13)));
}

#[tokio::test]
async fn test_empty_channel_gets_first_sticky() {
    let store = store(None);
    let mut sink = MockSink::new();
    sink.expect_latest_message().times(1).returning(|_| Ok(None));
    sink.expect_send_message()
        .with(eq(CHANNEL), always())
        .times(1)
        .returning(|_, _| Ok(MessageId(20)));

    let action = maintain(&sink, &store, GUILD, CHANNEL, &config(&store)).await.unwrap();

    assert_eq!(action, StickyAction::Reposted(MessageId(20)));
}

#[tokio::test]
async fn test_missing_old_sticky_does_not_block_repost() {
    let store = store(Some(MessageId(9)));
    let mut sink = MockSink::new();
    sink.expect_latest_message()
        .returning(|_| Ok(Some(MessageId(12))));
    sink.expect_delete_message()
        .times(1)
        .returning(|_, _| Err(ActionError::NotFound("Unknown Message".to_string())));
    sink.expect_send_message()
        .times(1)
        .returning(|_, _| Ok(MessageId(14)));

    let action = maintain(&sink, &store, GUILD, CHANNEL, &config(&store)).await.unwrap();

    assert_eq!(action, StickyAction::Reposted(MessageId(14)));
}

#[tokio::test]
async fn test_one_failing_channel_does_not_stop_the_others() {
    let store = store(Some(MessageId(9)));
    store
        .update(|state| {
            state.set_sticky(GUILD, ChannelId(6), "Welcome");
            state.update_sticky_message_id(GUILD, ChannelId(6), MessageId(30));
        })
        .unwrap();
    let mut sink = MockSink::new();
    sink.expect_latest_message().times(2).returning(|channel| {
        if channel == CHANNEL {
            Err(ActionError::PermissionDenied("Missing Access".to_string()))
        } else {
            Ok(Some(MessageId(31)))
        }
    });
    sink.expect_delete_message()
        .with(eq(ChannelId(6)), eq(MessageId(30)))
        .times(1)
        .returning(|_, _| Ok(()));
    sink.expect_send_message()
        .with(eq(ChannelId(6)), always())
        .times(1)
        .returning(|_, _| Ok(MessageId(32)));

    let reposted = maintain_all(&sink, &store).await;

    assert_eq!(reposted, 1);
    assert_eq!(
        store.read(|s| s.sticky(GUILD, ChannelId(6)).and_then(|c| c.last_message_id)),
        Some(MessageId(32))
    );
}

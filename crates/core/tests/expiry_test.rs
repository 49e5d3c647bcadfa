mod common;

use common::{at, member, FakeDiscord};
use pretty_assertions::assert_eq;
use rstest::rstest;

use repere_core::errors::ActionError;
use repere_core::expiry::{sweep, SweepReport};
use repere_core::mock::MockSink;
use repere_core::models::server::{AutoroleConfig, ServerState};
use repere_core::models::{ChannelId, GuildId, MemberId, RoleId};
use repere_core::ports::{MemoryStore, StateStore};

const GUILD: GuildId = GuildId(1);
const ROLE: RoleId = RoleId(10);
const MEMBER: MemberId = MemberId(100);

fn store_with_assignment(expiry_minutes: u32) -> MemoryStore<ServerState> {
    let mut state = ServerState::default();
    state.add_autorole(
        GUILD,
        AutoroleConfig {
            expiry_minutes: Some(expiry_minutes),
            ..AutoroleConfig::new(ROLE)
        },
    );
    state.add_role_assignment(GUILD, ROLE, MEMBER, at(0));
    MemoryStore::new(state)
}

#[rstest]
#[case(0, false)]
#[case(59, false)]
#[case(60, true)]
#[case(61, true)]
#[tokio::test]
async fn test_revokes_only_after_deadline(#[case] minutes: i64, #[case] revoked: bool) {
    let discord = FakeDiscord::default().with_member(1, member(100, "alice", &[ROLE]));
    let store = store_with_assignment(60);

    let report = sweep(&discord, &store, at(minutes)).await.unwrap();

    assert_eq!(report.revoked, usize::from(revoked));
    assert_eq!(discord.holds(GUILD, MEMBER, ROLE), !revoked);
    assert_eq!(store.read(|s| s.role_assignment(GUILD, ROLE, MEMBER).is_some()), !revoked);
}

#[tokio::test]
async fn test_failed_revoke_still_forgets_assignment() {
    let discord = FakeDiscord::default().with_member(1, member(100, "alice", &[ROLE]));
    discord.deny_role(ROLE);
    let store = store_with_assignment(30);

    let report = sweep(&discord, &store, at(45)).await.unwrap();

    assert_eq!(
        report,
        SweepReport {
            revoked: 0,
            untracked: 0,
            failed: 1
        }
    );
    assert!(discord.holds(GUILD, MEMBER, ROLE));
    assert_eq!(store.read(ServerState::assignment_count), 0);
}

#[tokio::test]
async fn test_failed_member_lookup_keeps_assignment_for_next_sweep() {
    let mut sink = MockSink::new();
    sink.expect_member()
        .times(1)
        .returning(|_, _| Err(ActionError::RateLimited("You are being rate limited".to_string())));
    sink.expect_revoke_role().times(0);
    let store = store_with_assignment(60);

    let report = sweep(&sink, &store, at(61)).await.unwrap();

    assert_eq!(
        report,
        SweepReport {
            revoked: 0,
            untracked: 0,
            failed: 1
        }
    );
    assert!(store.read(|s| s.role_assignment(GUILD, ROLE, MEMBER).is_some()));

    let discord = FakeDiscord::default().with_member(1, member(100, "alice", &[ROLE]));
    let report = sweep(&discord, &store, at(62)).await.unwrap();

    assert_eq!(report.revoked, 1);
    assert!(!discord.holds(GUILD, MEMBER, ROLE));
    assert_eq!(store.read(ServerState::assignment_count), 0);
}

#[tokio::test]
async fn test_member_who_left_is_untracked_without_revoke() {
    let discord = FakeDiscord::default();
    let store = store_with_assignment(30);

    let report = sweep(&discord, &store, at(45)).await.unwrap();

    assert_eq!(report.untracked, 1);
    assert!(discord.revokes().is_empty());
    assert_eq!(store.read(ServerState::assignment_count), 0);
}

#[tokio::test]
async fn test_roles_expire_independently() {
    let short = RoleId(11);
    let discord = FakeDiscord::default().with_member(1, member(100, "alice", &[ROLE, short]));
    let store = store_with_assignment(120);
    store
        .update(|state| {
            state.add_autorole(
                GUILD,
                AutoroleConfig {
                    expiry_minutes: Some(10),
                    ..AutoroleConfig::new(short)
                },
            );
            state.add_role_assignment(GUILD, short, MEMBER, at(0));
        })
        .unwrap();

    sweep(&discord, &store, at(15)).await.unwrap();

    assert_eq!(discord.revokes(), vec![(GUILD, MEMBER, short)]);
    assert!(discord.holds(GUILD, MEMBER, ROLE));
    assert_eq!(store.read(|s| s.role_assignment(GUILD, ROLE, MEMBER)), Some(at(0)));
}

#[tokio::test]
async fn test_revoke_is_reported_to_log_channel() {
    let discord = FakeDiscord::default().with_member(1, member(100, "alice", &[ROLE]));
    let store = store_with_assignment(5);
    store
        .update(|state| state.set_autorole_log_channel(GUILD, ChannelId(77)))
        .unwrap();

    sweep(&discord, &store, at(5)).await.unwrap();

    let sent = discord.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, ChannelId(77));
    assert!(sent[0].1.contains("<@&10>"));
    assert!(sent[0].1.contains("<@100>"));
}

#[tokio::test]
async fn test_nothing_expired_is_a_no_op() {
    let discord = FakeDiscord::default().with_member(1, member(100, "alice", &[ROLE]));
    let store = MemoryStore::new(ServerState::default());

    let report = sweep(&discord, &store, at(1_000)).await.unwrap();

    assert_eq!(report, SweepReport::default());
    assert!(discord.sent().is_empty());
}

mod common;

use common::{at, member, FakeDiscord};
use pretty_assertions::assert_eq;

use repere_core::autorole::{apply_trigger, on_member_join};
use repere_core::expiry::sweep;
use repere_core::models::server::{AutoroleConfig, ServerState, Trigger};
use repere_core::models::{ChannelId, GuildId, MemberId, RoleId};
use repere_core::ports::{MemoryStore, StateStore};

const GUILD: GuildId = GuildId(1);
const ROLE: RoleId = RoleId(10);

fn store_with(config: AutoroleConfig) -> MemoryStore<ServerState> {
    let mut state = ServerState::default();
    state.add_autorole(GUILD, config);
    MemoryStore::new(state)
}

#[tokio::test]
async fn test_rejoin_then_expiry_scenario() {
    let store = store_with(AutoroleConfig {
        expiry_minutes: Some(60),
        check_rejoin: true,
        ..AutoroleConfig::new(ROLE)
    });
    let m = member(100, "marie", &[]);
    let discord = FakeDiscord::default().with_member(1, m.clone());

    // First join: role granted and tracked.
    let report = on_member_join(&discord, &store, GUILD, &m, at(0)).await.unwrap();
    assert_eq!(report.granted, vec![ROLE]);
    assert!(store.read(|s| s.has_joined_before(GUILD, m.id)));
    assert_eq!(store.read(|s| s.role_assignment(GUILD, ROLE, m.id)), Some(at(0)));

    // Leave and rejoin ten minutes later: skipped, clock untouched.
    discord.remove_member(GUILD, m.id);
    discord.add_member(GUILD, m.clone());
    let report = on_member_join(&discord, &store, GUILD, &m, at(10)).await.unwrap();
    assert_eq!(report.skipped_rejoin, vec![ROLE]);
    assert_eq!(discord.grants().len(), 1);
    assert_eq!(store.read(|s| s.role_assignment(GUILD, ROLE, m.id)), Some(at(0)));

    // The member lost the role when leaving; give it back to see the sweep revoke it.
    discord.remove_member(GUILD, m.id);
    discord.add_member(GUILD, member(100, "marie", &[ROLE]));
    sweep(&discord, &store, at(61)).await.unwrap();

    assert_eq!(discord.revokes(), vec![(GUILD, m.id, ROLE)]);
    assert_eq!(store.read(|s| s.role_assignment(GUILD, ROLE, m.id)), None);
}

#[tokio::test]
async fn test_rejoin_without_check_grants_again() {
    let store = store_with(AutoroleConfig::new(ROLE));
    let m = member(100, "marie", &[]);
    let discord = FakeDiscord::default().with_member(1, m.clone());

    on_member_join(&discord, &store, GUILD, &m, at(0)).await.unwrap();
    on_member_join(&discord, &store, GUILD, &m, at(5)).await.unwrap();

    assert_eq!(discord.grants_of(ROLE), 2);
    // No expiry, nothing to track.
    assert_eq!(store.read(ServerState::assignment_count), 0);
}

#[tokio::test]
async fn test_failed_grant_still_records_join() {
    let store = store_with(AutoroleConfig {
        expiry_minutes: Some(60),
        check_rejoin: true,
        ..AutoroleConfig::new(ROLE)
    });
    store
        .update(|state| state.set_autorole_log_channel(GUILD, ChannelId(9)))
        .unwrap();
    let m = member(100, "marie", &[]);
    let discord = FakeDiscord::default().with_member(1, m.clone());
    discord.deny_role(ROLE);

    let report = on_member_join(&discord, &store, GUILD, &m, at(0)).await.unwrap();

    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].1.is_permission());
    assert!(store.read(|s| s.has_joined_before(GUILD, m.id)));
    assert_eq!(store.read(ServerState::assignment_count), 0);
    let sent = discord.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.starts_with("❌"));
}

#[tokio::test]
async fn test_join_ignores_quiz_access_configs() {
    let store = store_with(AutoroleConfig {
        trigger: Trigger::OnQuizAccess,
        ..AutoroleConfig::new(ROLE)
    });
    let m = member(100, "marie", &[]);
    let discord = FakeDiscord::default().with_member(1, m.clone());

    let report = on_member_join(&discord, &store, GUILD, &m, at(0)).await.unwrap();

    assert!(report.granted.is_empty());
    assert!(store.read(|s| s.has_joined_before(GUILD, m.id)));
}

#[tokio::test]
async fn test_trigger_skips_roles_already_held() {
    let other = RoleId(11);
    let store = store_with(AutoroleConfig {
        trigger: Trigger::OnQuizAccess,
        expiry_minutes: Some(30),
        ..AutoroleConfig::new(ROLE)
    });
    store
        .update(|state| {
            state.add_autorole(
                GUILD,
                AutoroleConfig {
                    trigger: Trigger::OnQuizAccess,
                    ..AutoroleConfig::new(other)
                },
            )
        })
        .unwrap();
    let m = member(100, "marie", &[other]);
    let discord = FakeDiscord::default().with_member(1, m.clone());

    let report = apply_trigger(&discord, &store, GUILD, &m, Trigger::OnQuizAccess, at(3))
        .await
        .unwrap();

    assert_eq!(report.granted, vec![ROLE]);
    assert_eq!(report.already_held, vec![other]);
    assert_eq!(store.read(|s| s.role_assignment(GUILD, ROLE, MemberId(100))), Some(at(3)));
}

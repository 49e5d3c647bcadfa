use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use repere_core::models::quiz::QuizConfig;
use repere_core::models::server::{AutoroleConfig, ServerState};
use repere_core::models::{GuildId, MemberId, RoleId};
use repere_core::ports::StateStore;
use repere_store::{JsonStore, Stores};

#[fixture]
fn dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[rstest]
fn test_server_state_survives_restart(dir: TempDir) {
    let path = dir.path().join("server_config.json");
    let assigned_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    {
        let store = JsonStore::<ServerState>::open(&path).unwrap();
        store
            .update(|state| {
                state.add_autorole(
                    GuildId(1),
                    AutoroleConfig {
                        expiry_minutes: Some(60),
                        ..AutoroleConfig::new(RoleId(10))
                    },
                );
                state.add_role_assignment(GuildId(1), RoleId(10), MemberId(7), assigned_at);
                state.record_join(GuildId(1), MemberId(7));
            })
            .unwrap();
    }

    let reopened = JsonStore::<ServerState>::open(&path).unwrap();
    assert_eq!(
        reopened.read(|s| s.role_assignment(GuildId(1), RoleId(10), MemberId(7))),
        Some(assigned_at)
    );
    assert!(reopened.read(|s| s.has_joined_before(GuildId(1), MemberId(7))));
}

#[rstest]
fn test_quiz_cursor_is_persisted(dir: TempDir) {
    let path = dir.path().join("quiz_config.json");
    let store = JsonStore::<QuizConfig>::open(&path).unwrap();

    store.update(|config| config.last_processed_row = Some(42)).unwrap();

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["last_processed_row"], 42);
    assert_eq!(raw["status_sheet_title"], "Statut - Roles");
}

#[rstest]
fn test_open_all_documents(dir: TempDir) {
    let stores = Stores::open(
        dir.path().join("server_config.json"),
        dir.path().join("quiz_config.json"),
        dir.path().join("voice_creators.json"),
    )
    .unwrap();

    assert_eq!(stores.quiz.read(|c| c.min_score), 17.0);
    assert_eq!(stores.voice.read(|v| v.channels().len()), 0);
}

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use repere_core::locale::Language;
use repere_core::models::quiz::QuizConfig;
use repere_core::models::server::{AutoroleConfig, ServerState, Trigger};
use repere_core::models::voice::{ChannelPosition, VoiceCreators};
use repere_core::models::{ChannelId, GuildId, MemberId, MessageId, RoleId};
use serde_json::{from_str, to_string};

const GUILD: GuildId = GuildId(111);

#[test]
fn test_server_state_reads_legacy_document() {
    let json = r#"{
        "autorole": {
            "111": {"role_id": 10, "expiry_minutes": 60, "check_rejoin": true}
        },
        "autorole_logs": {"111": 500},
        "sticky_messages": {
            "111": {"42": {"content": "Read the rules", "last_message_id": 9001}}
        },
        "joined_members": {"111": [7, 8]},
        "role_assignment_dates": {
            "111": {"10": {"7": "2024-05-01T12:00:00.000000"}}
        }
    }"#;

    let state: ServerState = from_str(json).expect("Failed to parse server config");

    assert_eq!(
        state.autoroles(GUILD),
        &[AutoroleConfig {
            role_id: RoleId(10),
            expiry_minutes: Some(60),
            check_rejoin: true,
            trigger: Trigger::OnJoin,
        }]
    );
    assert_eq!(state.autorole_log_channel(GUILD), Some(ChannelId(500)));
    assert_eq!(
        state.sticky(GUILD, ChannelId(42)).and_then(|s| s.last_message_id),
        Some(MessageId(9001))
    );
    assert!(state.has_joined_before(GUILD, MemberId(8)));
    assert_eq!(
        state.role_assignment(GUILD, RoleId(10), MemberId(7)),
        Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    );
    assert_eq!(state.language(GUILD), Language::En);
}

#[test]
fn test_server_state_round_trips() {
    let mut state = ServerState::default();
    state.add_autorole(
        GUILD,
        AutoroleConfig {
            trigger: Trigger::OnQuizAccess,
            ..AutoroleConfig::new(RoleId(20))
        },
    );
    state.add_role_assignment(GUILD, RoleId(20), MemberId(3), Utc::now());
    state.set_language(GUILD, Language::Fr);

    let json = to_string(&state).expect("Failed to serialize server config");
    assert!(json.contains(r#""trigger":"on_quiz_access""#));

    let parsed: ServerState = from_str(&json).expect("Failed to parse server config");
    assert_eq!(parsed, state);
}

#[test]
fn test_rejects_garbage_timestamps() {
    let json = r#"{"role_assignment_dates": {"1": {"2": {"3": "soon"}}}}"#;
    assert!(from_str::<ServerState>(json).is_err());
}

#[test]
fn test_quiz_config_defaults() {
    let config: QuizConfig = from_str(r#"{"spreadsheet_id": "", "min_score": 15}"#).unwrap();

    assert_eq!(config.spreadsheet(), None);
    assert_eq!(config.min_score, 15.0);
    assert_eq!(config.max_score, 20.0);
    assert_eq!(config.status_sheet_title, "Statut - Roles");
    assert_eq!(config.check_interval, 60);
    assert_eq!(config.last_processed_row, None);
    assert_eq!(config.roles(), None);
}

#[test]
fn test_quiz_config_keeps_cursor() {
    let config: QuizConfig = from_str(
        r#"{"spreadsheet_id": "abc", "waiting_role_id": 1, "access_role_id": 2, "last_processed_row": 12}"#,
    )
    .unwrap();

    assert_eq!(config.spreadsheet(), Some("abc"));
    assert_eq!(config.roles(), Some((RoleId(1), RoleId(2))));
    assert_eq!(config.last_processed_row, Some(12));
}

#[test]
fn test_voice_creators_document() {
    let json = r#"{"111": {"900": {"channel_id": 900, "template_name": "🔊 {user}", "position": "before", "user_limit": 4}}}"#;
    let mut creators: VoiceCreators = from_str(json).unwrap();

    let config = creators.get(GUILD, ChannelId(900)).cloned().unwrap();
    assert_eq!(config.position, ChannelPosition::Before);
    assert_eq!(config.user_limit, 4);
    assert_eq!(creators.channels(), vec![(GUILD, ChannelId(900))]);

    assert_eq!(creators.retain_existing(|_, _| false), 1);
    assert_eq!(creators, VoiceCreators::default());
}

use pretty_assertions::assert_eq;
use rstest::rstest;

use repere_core::locale::Language;
use repere_core::mass_grant::MassGrantReport;
use repere_core::models::RoleId;
use repere_core::models::server::{AutoroleConfig, Trigger};
use repere_core::quiz::{QuizStatus, Submission};
use repere_discord_bot::replies::{self, ExpiryListing, MAX_LISTED, MESSAGE_LIMIT};

#[test]
fn test_truncate_keeps_short_content() {
    assert_eq!(replies::truncate("hello"), "hello");
}

#[test]
fn test_truncate_cuts_on_char_boundary() {
    let long = "é".repeat(MESSAGE_LIMIT + 10);
    let cut = replies::truncate(&long);

    assert_eq!(cut.chars().count(), MESSAGE_LIMIT);
    assert!(cut.ends_with('…'));
}

#[rstest]
#[case(Some(30), "30 min")]
#[case(None, "none")]
#[case(Some(0), "none")]
fn test_expiry_label(#[case] expiry_minutes: Option<u32>, #[case] expected: &str) {
    let config = AutoroleConfig {
        role_id: RoleId(1),
        expiry_minutes,
        check_rejoin: false,
        trigger: Trigger::OnJoin,
    };
    assert_eq!(replies::expiry_label(Language::En, &config), expected);
}

#[test]
fn test_autorole_configs_lists_every_role() {
    let configs = vec![
        AutoroleConfig {
            role_id: RoleId(1),
            expiry_minutes: Some(60),
            check_rejoin: true,
            trigger: Trigger::OnJoin,
        },
        AutoroleConfig {
            role_id: RoleId(2),
            expiry_minutes: None,
            check_rejoin: false,
            trigger: Trigger::OnQuizAccess,
        },
    ];
    let text = replies::autorole_configs(Language::En, &configs);

    assert!(text.contains("<@&1>: trigger on_join, expiry 60 min, skip rejoins yes"));
    assert!(text.contains("<@&2>: trigger on_quiz_access, expiry none, skip rejoins no"));
}

#[test]
fn test_expiry_list_summarises_long_lists() {
    let members = (0..MAX_LISTED + 3)
        .map(|index| (format!("member{index}"), Some(index as i64)))
        .collect();
    let text = replies::expiry_list(
        Language::En,
        &[ExpiryListing {
            role: RoleId(5),
            members,
        }],
    );

    assert!(text.starts_with("Members with <@&5>:"));
    assert!(text.contains("• member0: 0 min left"));
    assert!(!text.contains(&format!("member{MAX_LISTED}:")));
    assert!(text.ends_with("… and 3 more"));
}

#[test]
fn test_expiry_list_untracked_member() {
    let text = replies::expiry_list(
        Language::Fr,
        &[ExpiryListing {
            role: RoleId(5),
            members: vec![("alice".to_string(), None)],
        }],
    );
    assert!(text.contains("• alice: non suivi"));
}

#[test]
fn test_no_expiry_list() {
    let text = replies::no_expiry_list(
        Language::En,
        &[(RoleId(1), vec!["alice".to_string()]), (RoleId(2), Vec::new())],
    );

    assert_eq!(text, "Role <@&1> (no expiry):\n• alice\n\nRole <@&2>: no member");
}

fn status() -> QuizStatus {
    QuizStatus {
        spreadsheet_id: Some("sheet-1".to_string()),
        check_interval: 60,
        min_score: 17.0,
        max_score: 20.0,
        waiting_role_id: Some(RoleId(1)),
        access_role_id: None,
        processed_rows: 3,
        last_processed_row: Some(12),
        last_seen_data_rows: None,
    }
}

#[test]
fn test_quiz_status_active() {
    let text = replies::quiz_status(Language::En, &status(), true);

    assert!(text.contains("Status: ✅ Active"));
    assert!(text.contains("Spreadsheet: sheet-1"));
    assert!(text.contains("Minimum score: 17.0/20.0"));
    assert!(text.contains("Waiting role: <@&1>"));
    assert!(text.contains("Access role: not set"));
    assert!(text.contains("Last processed row: 12"));
    assert!(!text.contains("Rows in sheet"));
}

#[test]
fn test_quiz_status_inactive_without_credentials() {
    let text = replies::quiz_status(Language::En, &status(), false);
    assert!(text.contains("Status: ❌ Inactive"));
}

#[test]
fn test_quiz_preview_shows_first_rows() {
    let submissions: Vec<Submission> = (0..7)
        .map(|index| Submission {
            row: index + 2,
            pseudo: format!("player{index}"),
            score: 18.5,
        })
        .collect();
    let text = replies::quiz_preview(Language::En, &submissions, 20.0);

    assert!(text.contains("Results found: 7"));
    assert!(text.contains("• player0: 18.5/20.0"));
    assert!(!text.contains("player5"));
    assert!(text.ends_with("… and 2 more"));
}

#[test]
fn test_mass_grant_summary() {
    let report = MassGrantReport {
        total: 10,
        success: 9,
        failed: 1,
    };
    assert_eq!(
        replies::mass_grant_summary(Language::En, RoleId(4), &report),
        "Mass grant of <@&4>: 10 targeted, 9 succeeded, 1 failed"
    );
}

#[rstest]
#[case(Language::En, "/massgive")]
#[case(Language::Fr, "Salons vocaux")]
fn test_help_is_localised(#[case] language: Language, #[case] needle: &str) {
    let text = replies::help(language);
    assert!(text.contains(needle));
    assert!(text.chars().count() <= MESSAGE_LIMIT);
}

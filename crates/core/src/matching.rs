//! Reading free-text spreadsheet cells: scores and member identities.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::discord::MemberInfo;

fn score_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+(?:[.,]\d+)?)").expect("score pattern compiles"))
}

/// Extracts the first number of a score cell.
///
/// Both `.` and `,` are accepted as decimal separator, so `"18/20"` reads as
/// 18 and `"17,5"` as 17.5. Cells without digits score zero.
pub fn parse_score(raw: &str) -> f64 {
    score_pattern()
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .and_then(|number| number.as_str().replace(',', ".").parse().ok())
        .unwrap_or(0.0)
}

/// Formats a score the way the status sheet shows it: always one decimal.
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.1}")
    } else {
        score.to_string()
    }
}

/// Finds the member a spreadsheet identity refers to.
///
/// Tries, in order: exact handle, case-insensitive display name, then
/// case-insensitive substring of the handle. Within each tier the first
/// member of `members` wins.
pub fn resolve_member<'a>(members: &'a [MemberInfo], identity: &str) -> Option<&'a MemberInfo> {
    let identity = identity.trim();
    if identity.is_empty() {
        return None;
    }
    let lowered = identity.to_lowercase();

    members
        .iter()
        .find(|member| member.name == identity)
        .or_else(|| {
            members
                .iter()
                .find(|member| member.display_name.to_lowercase() == lowered)
        })
        .or_else(|| {
            members
                .iter()
                .find(|member| member.name.to_lowercase().contains(&lowered))
        })
}

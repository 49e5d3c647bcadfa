use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

use super::{ChannelId, RoleId};
use crate::locale::Language;

pub const DEFAULT_STATUS_SHEET_TITLE: &str = "Statut - Roles";
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;
/// Polling cadence while a backlog of submissions is drained.
pub const FAST_CHECK_INTERVAL_SECS: u64 = 5;

/// Process-wide quiz automation settings, persisted as `quiz_config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    #[serde(deserialize_with = "deserialize_spreadsheet_id")]
    pub spreadsheet_id: Option<String>,
    pub status_sheet_title: String,
    pub min_score: f64,
    pub max_score: f64,
    pub waiting_role_id: Option<RoleId>,
    pub access_role_id: Option<RoleId>,
    pub log_channel_id: Option<ChannelId>,
    /// Effective polling interval in seconds; shortened while draining a backlog.
    pub check_interval: u64,
    /// Interval chosen by an administrator.
    pub check_interval_default: u64,
    /// Last data row the engine attempted. Persisted so restarts skip re-reading the status sheet.
    pub last_processed_row: Option<usize>,
    pub status_language: Language,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            status_sheet_title: DEFAULT_STATUS_SHEET_TITLE.to_string(),
            min_score: 17.0,
            max_score: 20.0,
            waiting_role_id: None,
            access_role_id: None,
            log_channel_id: None,
            check_interval: DEFAULT_CHECK_INTERVAL_SECS,
            check_interval_default: DEFAULT_CHECK_INTERVAL_SECS,
            last_processed_row: None,
            status_language: Language::En,
        }
    }
}

impl QuizConfig {
    pub fn spreadsheet(&self) -> Option<&str> {
        self.spreadsheet_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Both roles, if configured.
    pub fn roles(&self) -> Option<(RoleId, RoleId)> {
        Some((self.waiting_role_id?, self.access_role_id?))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.check_interval.max(1))
    }

    pub fn default_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_default.max(1))
    }
}

fn deserialize_spreadsheet_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|id| !id.trim().is_empty()))
}

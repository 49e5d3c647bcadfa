//! Quiz reconciliation: turns spreadsheet submissions into access roles.
//!
//! Submissions live in the first sheet of the configured spreadsheet, one
//! per row, with the score in column B and the member identity in column C.
//! Row 1 is a header. Each pass reads a small window of new rows after the
//! cursor, decides an outcome per guild, grants the access role when the
//! member qualifies and appends one status row per outcome to the status
//! sheet.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};

use crate::autorole;
use crate::errors::CoreResult;
use crate::locale::Language;
use crate::matching::{format_score, parse_score};
use crate::models::discord::{GuildInfo, MemberInfo};
use crate::models::quiz::{QuizConfig, FAST_CHECK_INTERVAL_SECS};
use crate::models::server::{ServerState, Trigger};
use crate::models::RoleId;
use crate::ports::{notify, ActionSink, SheetGateway, SheetRange, StateStore};

/// Rows read per pass.
pub const BATCH_SIZE: usize = 5;

/// Pending rows above which the engine polls at the fast cadence.
pub const FAST_BACKLOG_THRESHOLD: usize = 5;

pub const STATUS_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const STATUS_HEADERS: [&str; 9] = [
    "Timestamp",
    "Guild ID",
    "Guild Name",
    "Pseudo (Sheet)",
    "User ID",
    "User Name",
    "Note",
    "Result",
    "Details",
];

/// Final state of one row for one guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusDetail {
    MemberNotFound,
    RolesNotConfigured,
    MissingWaitingRole,
    ScoreTooLow,
    FailedToAddRole,
    RoleGranted,
    EmptyRow,
}

impl StatusDetail {
    pub fn is_success(self) -> bool {
        self == StatusDetail::RoleGranted
    }

    pub fn icon(self) -> &'static str {
        if self.is_success() { "✅" } else { "❌" }
    }

    pub fn label(self, language: Language) -> &'static str {
        use StatusDetail::*;
        match (language, self) {
            (Language::En, MemberNotFound) => "Member not found",
            (Language::En, RolesNotConfigured) => "Roles not configured",
            (Language::En, MissingWaitingRole) => "Missing waiting role",
            (Language::En, ScoreTooLow) => "Score too low",
            (Language::En, FailedToAddRole) => "Failed to add role",
            (Language::En, RoleGranted) => "Role granted",
            (Language::En, EmptyRow) => "Empty or invalid row",
            (Language::Fr, MemberNotFound) => "Membre introuvable",
            (Language::Fr, RolesNotConfigured) => "Rôles non configurés",
            (Language::Fr, MissingWaitingRole) => "Rôle d'attente manquant",
            (Language::Fr, ScoreTooLow) => "Score insuffisant",
            (Language::Fr, FailedToAddRole) => "Échec lors de l'attribution du rôle",
            (Language::Fr, RoleGranted) => "Rôle attribué",
            (Language::Fr, EmptyRow) => "Ligne vide ou invalide",
        }
    }
}

/// One submission as read from the data sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// 1-based row index in the data sheet.
    pub row: usize,
    pub pseudo: String,
    pub score: f64,
}

impl Submission {
    /// Reads columns A..C of a row; missing cells read as empty.
    pub fn from_cells(row: usize, cells: &[String]) -> Self {
        let score = cells.get(1).map(|raw| parse_score(raw)).unwrap_or(0.0);
        let pseudo = cells.get(2).map(|raw| raw.trim().to_string()).unwrap_or_default();
        Self { row, pseudo, score }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowOutcome {
    pub submission: Submission,
    pub guild: GuildInfo,
    pub member: Option<MemberInfo>,
    pub detail: StatusDetail,
}

impl RowOutcome {
    /// The row appended to the status sheet.
    pub fn status_row(&self, at: DateTime<Utc>, language: Language) -> Vec<String> {
        vec![
            at.format(STATUS_TIMESTAMP_FORMAT).to_string(),
            self.guild.id.to_string(),
            self.guild.name.clone(),
            self.submission.pseudo.clone(),
            self.member.as_ref().map(|m| m.id.to_string()).unwrap_or_default(),
            self.member.as_ref().map(|m| m.name.clone()).unwrap_or_default(),
            format_score(self.submission.score),
            self.detail.icon().to_string(),
            self.detail.label(language).to_string(),
        ]
    }

    fn log_line(&self, config: &QuizConfig) -> String {
        let who = match &self.member {
            Some(member) => format!("{} ({})", member.id.mention(), self.submission.pseudo),
            None => format!("`{}`", self.submission.pseudo),
        };
        format!(
            "{} {} [{}] row {}: {} ({}/{})",
            self.detail.icon(),
            who,
            self.guild.name,
            self.submission.row,
            self.detail.label(config.status_language),
            format_score(self.submission.score),
            format_score(config.max_score),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PassReport {
    NotConfigured,
    /// No row past the cursor.
    Idle,
    Processed(Vec<RowOutcome>),
}

/// Snapshot for the `/quiz status` command.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizStatus {
    pub spreadsheet_id: Option<String>,
    pub check_interval: u64,
    pub min_score: f64,
    pub max_score: f64,
    pub waiting_role_id: Option<RoleId>,
    pub access_role_id: Option<RoleId>,
    pub processed_rows: usize,
    pub last_processed_row: Option<usize>,
    pub last_seen_data_rows: Option<usize>,
}

/// Reconciliation cursor and the rows already granted in this process.
#[derive(Debug, Default)]
pub struct QuizEngine {
    last_seen_data_rows: Option<usize>,
    last_processed_row: Option<usize>,
    processed_rows: BTreeSet<usize>,
}

impl QuizEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_processed_row(&self) -> Option<usize> {
        self.last_processed_row
    }

    pub fn is_processed(&self, row: usize) -> bool {
        self.processed_rows.contains(&row)
    }

    /// Moves the cursor back so the next pass re-reads rows after `row`.
    /// Rows already granted stay skipped.
    pub fn rewind_to(&mut self, row: usize) {
        self.last_processed_row = Some(row.max(1));
    }

    pub fn status(&self, config: &QuizConfig) -> QuizStatus {
        QuizStatus {
            spreadsheet_id: config.spreadsheet_id.clone(),
            check_interval: config.check_interval,
            min_score: config.min_score,
            max_score: config.max_score,
            waiting_role_id: config.waiting_role_id,
            access_role_id: config.access_role_id,
            processed_rows: self.processed_rows.len(),
            last_processed_row: self.last_processed_row,
            last_seen_data_rows: self.last_seen_data_rows,
        }
    }

    /// Runs one reconciliation pass.
    ///
    /// Gateway errors abort the pass; rows handled before the error keep
    /// their effects and the next pass resumes from the persisted cursor.
    #[instrument(skip_all)]
    pub async fn run_pass<G, A, S, Q>(
        &mut self,
        gateway: &G,
        sink: &A,
        server: &S,
        quiz: &Q,
        now: DateTime<Utc>,
    ) -> CoreResult<PassReport>
    where
        G: SheetGateway,
        A: ActionSink,
        S: StateStore<ServerState>,
        Q: StateStore<QuizConfig>,
    {
        let config = quiz.snapshot();
        let Some(spreadsheet) = config.spreadsheet().map(str::to_string) else {
            return Ok(PassReport::NotConfigured);
        };

        let last_processed = match self.last_processed_row {
            Some(row) => row,
            None => {
                let row = match config.last_processed_row {
                    Some(row) => row.max(1),
                    None => {
                        ensure_status_sheet(gateway, &config).await?;
                        let status_rows = gateway
                            .row_count(&spreadsheet, Some(&config.status_sheet_title))
                            .await?;
                        status_rows.max(1)
                    }
                };
                info!(row, "Quiz cursor initialised");
                self.last_processed_row = Some(row);
                row
            }
        };

        let data_rows = gateway.row_count(&spreadsheet, None).await?;
        self.last_seen_data_rows = Some(data_rows);

        let backlog = data_rows.saturating_sub(last_processed);
        let interval = if backlog > FAST_BACKLOG_THRESHOLD {
            FAST_CHECK_INTERVAL_SECS
        } else {
            config.check_interval_default
        };
        if interval != config.check_interval {
            debug!(backlog, interval, "Adjusting quiz check interval");
            quiz.update(|config| config.check_interval = interval)?;
        }

        if backlog == 0 {
            return Ok(PassReport::Idle);
        }

        let first = last_processed + 1;
        let last = (first + BATCH_SIZE - 1).min(data_rows);
        let range = SheetRange::columns(None, 'A', 'C').with_rows(first, last);
        let rows = gateway.read_rows(&spreadsheet, &range).await?;
        let guilds = sink.guilds().await;

        let mut outcomes = Vec::new();
        for (offset, cells) in rows.iter().enumerate() {
            let submission = Submission::from_cells(first + offset, cells);
            if !self.is_processed(submission.row) {
                for guild in &guilds {
                    if let Some(outcome) = self
                        .process_row(sink, server, &config, guild, &submission, now)
                        .await?
                    {
                        record(gateway, sink, &config, &outcome, now).await;
                        outcomes.push(outcome);
                    }
                }
            }
            if !self.advance(quiz, &spreadsheet, submission.row)? {
                info!(row = submission.row, "Spreadsheet changed during the pass, stopping");
                break;
            }
        }

        Ok(PassReport::Processed(outcomes))
    }

    /// Moves the cursor past `row`. The cursor is only persisted while
    /// `spreadsheet` is still the configured one; `false` otherwise.
    fn advance<Q: StateStore<QuizConfig>>(&mut self, quiz: &Q, spreadsheet: &str, row: usize) -> CoreResult<bool> {
        let row = self.last_processed_row.map_or(row, |last| last.max(row));
        self.last_processed_row = Some(row);
        let current = quiz.update(|config| {
            let current = config.spreadsheet() == Some(spreadsheet);
            if current {
                config.last_processed_row = Some(row);
            }
            current
        })?;
        Ok(current)
    }

    /// Decides the outcome of one submission for one guild. `None` when the
    /// row was already granted in another guild during this pass.
    async fn process_row<A, S>(
        &mut self,
        sink: &A,
        server: &S,
        config: &QuizConfig,
        guild: &GuildInfo,
        submission: &Submission,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<RowOutcome>>
    where
        A: ActionSink,
        S: StateStore<ServerState>,
    {
        if self.is_processed(submission.row) {
            return Ok(None);
        }

        let outcome = |member: Option<MemberInfo>, detail| RowOutcome {
            submission: submission.clone(),
            guild: guild.clone(),
            member,
            detail,
        };

        if submission.pseudo.is_empty() {
            return Ok(Some(outcome(None, StatusDetail::EmptyRow)));
        }

        let Some(member) = sink.find_member(guild.id, &submission.pseudo).await? else {
            return Ok(Some(outcome(None, StatusDetail::MemberNotFound)));
        };
        let Some((waiting_role, access_role)) = config.roles() else {
            return Ok(Some(outcome(Some(member), StatusDetail::RolesNotConfigured)));
        };
        if !member.has_role(waiting_role) {
            return Ok(Some(outcome(Some(member), StatusDetail::MissingWaitingRole)));
        }
        if submission.score < config.min_score {
            return Ok(Some(outcome(Some(member), StatusDetail::ScoreTooLow)));
        }

        let reason = format!("Quiz passed ({}/{})", format_score(submission.score), format_score(config.max_score));
        if let Err(error) = sink.grant_role(guild.id, member.id, access_role, &reason).await {
            warn!(guild = %guild.id, member = %member.id, %error, "Failed to grant quiz access role");
            if error.is_permission() {
                for issue in sink.diagnose_role_grant(guild.id, access_role).await {
                    warn!(role = %access_role, %issue, "Role permission issue");
                }
            }
            return Ok(Some(outcome(Some(member), StatusDetail::FailedToAddRole)));
        }

        info!(guild = %guild.id, member = %member.id, row = submission.row, "Quiz access granted");
        self.processed_rows.insert(submission.row);
        if let Err(error) =
            autorole::apply_trigger(sink, server, guild.id, &member, Trigger::OnQuizAccess, now).await
        {
            warn!(guild = %guild.id, member = %member.id, %error, "Quiz access auto-roles not applied");
        }
        Ok(Some(outcome(Some(member), StatusDetail::RoleGranted)))
    }
}

/// Creates the status sheet with its header row if it is missing.
pub async fn ensure_status_sheet<G: SheetGateway>(gateway: &G, config: &QuizConfig) -> CoreResult<bool> {
    let Some(spreadsheet) = config.spreadsheet() else {
        return Ok(false);
    };
    let headers: Vec<String> = STATUS_HEADERS.iter().map(|header| header.to_string()).collect();
    gateway
        .ensure_sheet_exists(spreadsheet, &config.status_sheet_title, &headers)
        .await
}

/// Reads every submission of the data sheet, skipping the header and rows
/// without an identity.
pub async fn preview_results<G: SheetGateway>(gateway: &G, config: &QuizConfig) -> CoreResult<Vec<Submission>> {
    let Some(spreadsheet) = config.spreadsheet() else {
        return Ok(Vec::new());
    };
    let rows = gateway
        .read_rows(spreadsheet, &SheetRange::columns(None, 'A', 'C'))
        .await?;
    Ok(rows
        .iter()
        .enumerate()
        .skip(1)
        .map(|(index, cells)| Submission::from_cells(index + 1, cells))
        .filter(|submission| !submission.pseudo.is_empty())
        .collect())
}

// Status sheet and log channel are best effort: a failed append must not
// replay the grant.
async fn record<G, A>(gateway: &G, sink: &A, config: &QuizConfig, outcome: &RowOutcome, now: DateTime<Utc>)
where
    G: SheetGateway,
    A: ActionSink,
{
    notify(sink, config.log_channel_id, &outcome.log_line(config)).await;

    let Some(spreadsheet) = config.spreadsheet() else {
        return;
    };
    match ensure_status_sheet(gateway, config).await {
        Ok(true) => {}
        Ok(false) => return,
        Err(error) => {
            warn!(%error, "Status sheet unavailable");
            return;
        }
    }
    let values = outcome.status_row(now, config.status_language);
    if let Err(error) = gateway
        .append_row(spreadsheet, &config.status_sheet_title, &values)
        .await
    {
        warn!(row = outcome.submission.row, %error, "Failed to append status row");
    }
}

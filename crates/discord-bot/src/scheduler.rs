//! Background loops started once the gateway is ready.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use repere_core::expiry;
use repere_core::locale::{self, Text};
use repere_core::ports::{StateStore, notify};
use repere_core::quiz::PassReport;
use repere_core::sticky;
use repere_sheets::GoogleSheetsClient;

use crate::BotState;
use crate::sink::DiscordSink;

/// Spawns the role expiry, sticky message and quiz loops.
pub fn spawn_all(state: Arc<BotState>, sink: DiscordSink) {
    tokio::spawn(expiry_loop(state.clone(), sink.clone()));
    tokio::spawn(sticky_loop(state.clone(), sink.clone()));

    if state.sheets.is_some() {
        tokio::spawn(quiz_loop(state, sink));
    } else {
        info!("Google Sheets not configured, quiz automation disabled");
    }
}

fn ticker(period: Duration) -> time::Interval {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn expiry_loop(state: Arc<BotState>, sink: DiscordSink) {
    let period = state.config.role_expiry_interval;
    info!(?period, "Role expiry task started");
    let mut interval = ticker(period);
    loop {
        interval.tick().await;
        match expiry::sweep(&sink, &state.stores.server, Utc::now()).await {
            Ok(report) if report.total() > 0 => info!(
                revoked = report.revoked,
                untracked = report.untracked,
                failed = report.failed,
                "Expired roles handled"
            ),
            Ok(_) => {}
            Err(e) => error!(error = ?e, "Role expiry sweep failed"),
        }
    }
}

async fn sticky_loop(state: Arc<BotState>, sink: DiscordSink) {
    let period = state.config.sticky_interval;
    info!(?period, "Sticky message task started");
    let mut interval = ticker(period);
    loop {
        interval.tick().await;
        let reposted = sticky::maintain_all(&sink, &state.stores.server).await;
        if reposted > 0 {
            debug!(reposted, "Sticky messages reposted");
        }
    }
}

/// Runs reconciliation passes back to back, sleeping for the interval the
/// last pass left in the quiz configuration. `/quiz setup` cuts the sleep
/// short.
async fn quiz_loop(state: Arc<BotState>, sink: DiscordSink) {
    let Some(sheets) = &state.sheets else {
        return;
    };
    info!("Quiz task started");
    loop {
        run_quiz_pass(&state, sheets, &sink).await;

        let delay = state.stores.quiz.read(|config| config.interval());
        tokio::select! {
            _ = time::sleep(delay) => {}
            _ = state.quiz_wakeup.notified() => debug!("Quiz task woken by a configuration change"),
        }
    }
}

async fn run_quiz_pass(state: &BotState, sheets: &GoogleSheetsClient, sink: &DiscordSink) {
    let mut engine = state.quiz.lock().await;
    match engine
        .run_pass(sheets, sink, &state.stores.server, &state.stores.quiz, Utc::now())
        .await
    {
        Ok(PassReport::NotConfigured) => debug!("Quiz not configured, skipping pass"),
        Ok(PassReport::Idle) => debug!("No new quiz submissions"),
        Ok(PassReport::Processed(outcomes)) => {
            let granted = outcomes.iter().filter(|outcome| outcome.detail.is_success()).count();
            info!(outcomes = outcomes.len(), granted, "Quiz submissions processed");
        }
        Err(e) => {
            warn!(error = %e, "Quiz results check failed");
            let config = state.stores.quiz.snapshot();
            let text = locale::text(
                config.status_language,
                Text::QuizCheckFailed,
                &[("error", e.to_string().as_str())],
            );
            notify(sink, config.log_channel_id, &text).await;
        }
    }
}

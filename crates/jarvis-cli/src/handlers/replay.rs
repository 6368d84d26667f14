//! `replay` command handler.
//!
//! Feeds a JSONL log of backend notifications through the session exactly as
//! the voice pipeline would have published them, then prints the resulting
//! snapshot.

use std::path::Path;

use anyhow::{Context, Result};
use jarvis_session::ReconcileOutcome;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// One line of a replay log.
#[derive(Debug, Deserialize)]
pub struct ReplayLine {
    pub event: String,
    #[serde(default)]
    pub payload: Value,
}

/// Counts of reconciliation outcomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub applied: usize,
    pub persisted_only: usize,
    pub dropped: usize,
}

impl Tally {
    fn record(&mut self, outcome: &ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Applied => self.applied += 1,
            ReconcileOutcome::PersistedOnly => self.persisted_only += 1,
            ReconcileOutcome::Dropped(_) => self.dropped += 1,
        }
    }
}

/// Parse a replay log. Blank lines and `#` comments are skipped.
pub fn parse_log(contents: &str) -> Result<Vec<ReplayLine>, CliError> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line)
                .map_err(|e| CliError::Arguments(format!("line {}: {e}", index + 1)))
        })
        .collect()
}

/// Publish and reconcile every line, returning the outcome tally.
pub async fn replay(ctx: &mut CliContext, lines: Vec<ReplayLine>, trace: bool) -> Tally {
    let publisher = ctx.publisher();
    let mut tally = Tally::default();

    for (index, line) in lines.into_iter().enumerate() {
        if !publisher.publish_wire(&line.event, line.payload) {
            tally.dropped += 1;
            if trace {
                println!("{:>4} {:<28} undecodable", index + 1, line.event);
            }
            continue;
        }
        for outcome in ctx.drain().await {
            tally.record(&outcome);
            if trace {
                println!("{:>4} {:<28} {outcome:?}", index + 1, line.event);
            }
        }
    }
    tally
}

pub async fn execute(ctx: &mut CliContext, file: &Path, trace: bool) -> Result<()> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let lines = parse_log(&contents)?;
    info!(file = %file.display(), lines = lines.len(), "Replaying notifications");

    let tally = replay(ctx, lines, trace).await;
    println!(
        "applied {}, persisted to previous conversation {}, dropped {}",
        tally.applied, tally.persisted_only, tally.dropped
    );
    println!("{}", serde_json::to_string_pretty(&ctx.session.snapshot())?);
    Ok(())
}

//! `carrier-registry reprocess`: throttled replay of historical calls.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::display::{action_failure, action_success, output, CommandOutput, DetailView};
use crate::cli::input::read_call_records;
use crate::cli::progress::{create_progress_bar, replay_message};
use crate::domain::models::Config;
use crate::services::{ReplayItem, ReplaySummary};

#[derive(Args, Debug)]
pub struct ReprocessArgs {
    /// File of call records (JSON array or JSON Lines); `-` for stdin
    pub file: PathBuf,

    /// Organization for records that do not carry one
    #[arg(long)]
    pub org: Option<Uuid>,

    /// Pause between calls in milliseconds (overrides reprocess.delay_ms)
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Only replay the first N records
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ReprocessOutput {
    pub summary: ReplaySummary,
}

impl CommandOutput for ReprocessOutput {
    fn to_human(&self) -> String {
        let s = &self.summary;
        let headline = if s.failed == 0 {
            action_success(&format!("Replayed {} call(s)", s.processed))
        } else {
            action_failure(&format!("Replayed {} call(s) with {} failure(s)", s.processed, s.failed))
        };
        let detail = DetailView::new("Replay summary")
            .field("Created", s.created)
            .field("Updated", s.updated)
            .field("Skipped", s.skipped)
            .field("Conflicts", s.conflicts)
            .field("Failed", s.failed)
            .render();
        format!("{headline}\n{detail}")
    }
}

pub async fn execute(args: ReprocessArgs, mut config: Config, json_mode: bool) -> Result<()> {
    let mut records = read_call_records(&args.file)?;
    if let Some(limit) = args.limit {
        records.truncate(limit);
    }
    let items = records
        .into_iter()
        .map(|record| record.into_item(args.org))
        .collect::<Result<Vec<ReplayItem>>>()
        .context("Invalid call record")?;

    if let Some(delay_ms) = args.delay_ms {
        config.reprocess.delay_ms = delay_ms;
    }
    let delay = Duration::from_millis(config.reprocess.delay_ms);
    let ctx = AppContext::open(config).await?;
    let coordinator = ctx.coordinator()?.with_replay_delay(delay);

    let progress = create_progress_bar(items.len() as u64, json_mode);
    let summary = coordinator
        .replay_with_progress(items, |running| {
            progress.inc(1);
            progress.set_message(replay_message(running));
        })
        .await;
    progress.finish_and_clear();

    output(&ReprocessOutput { summary }, json_mode);
    Ok(())
}

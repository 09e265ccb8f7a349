//! `carrier-registry ingest`: run call extractions through the linkage pipeline.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::display::{action_failure, action_success, list_table, output, short_id, CommandOutput};
use crate::cli::input::read_call_records;
use crate::domain::errors::DomainError;
use crate::domain::models::Config;
use crate::services::CallLinkageResult;

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// File of call records (JSON object, array or JSON Lines); `-` for stdin
    pub file: PathBuf,

    /// Organization for records that do not carry one
    #[arg(long)]
    pub org: Option<Uuid>,

    /// Link every record to this load instead of any load in the record
    #[arg(long)]
    pub load: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    Created,
    Updated,
    Skipped,
    Conflict,
    Failed,
}

impl IngestStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Skipped => "skipped",
            Self::Conflict => "conflict",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IngestedCall {
    pub call_id: Uuid,
    pub status: IngestStatus,
    pub result: Option<CallLinkageResult>,
    pub message: Option<String>,
}

impl IngestedCall {
    fn from_outcome(call_id: Uuid, outcome: Result<Option<CallLinkageResult>, DomainError>) -> Self {
        match outcome {
            Ok(Some(result)) => Self {
                call_id,
                status: if result.is_new {
                    IngestStatus::Created
                } else {
                    IngestStatus::Updated
                },
                result: Some(result),
                message: None,
            },
            Ok(None) => Self {
                call_id,
                status: IngestStatus::Skipped,
                result: None,
                message: Some("no carrier information in call".to_string()),
            },
            Err(e) => Self {
                call_id,
                status: match e {
                    DomainError::ValidationFailed(_) => IngestStatus::Skipped,
                    DomainError::IdentityConflict { .. } => IngestStatus::Conflict,
                    _ => IngestStatus::Failed,
                },
                result: None,
                message: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IngestOutput {
    pub calls: Vec<IngestedCall>,
}

impl CommandOutput for IngestOutput {
    fn to_human(&self) -> String {
        if self.calls.is_empty() {
            return "No call records found.".to_string();
        }
        let mut table = list_table(&["call", "status", "carrier", "confidence", "score", "risk", "note"]);
        for call in &self.calls {
            let result = call.result.as_ref();
            table.add_row(vec![
                short_id(&call.call_id),
                call.status.as_str().to_string(),
                result.map_or_else(|| "-".to_string(), |r| short_id(&r.carrier_id)),
                result.map_or_else(|| "-".to_string(), |r| r.confidence.to_string()),
                result
                    .and_then(|r| r.statistics.as_ref())
                    .map_or_else(|| "-".to_string(), |s| s.performance_score.to_string()),
                result
                    .and_then(|r| r.verification.as_ref())
                    .map_or_else(|| "-".to_string(), |v| v.risk_level.as_str().to_string()),
                call.message.clone().unwrap_or_else(|| {
                    if result.is_some_and(|r| r.needs_review) {
                        "needs review".to_string()
                    } else {
                        String::new()
                    }
                }),
            ]);
        }

        let failed = self
            .calls
            .iter()
            .filter(|c| c.status == IngestStatus::Failed)
            .count();
        let headline = if failed == 0 {
            action_success(&format!("Processed {} call(s)", self.calls.len()))
        } else {
            action_failure(&format!("Processed {} call(s), {failed} failed", self.calls.len()))
        };
        format!("{headline}\n{table}")
    }
}

pub async fn execute(args: IngestArgs, config: Config, json_mode: bool) -> Result<()> {
    let records = read_call_records(&args.file)?;
    let ctx = AppContext::open(config).await?;
    let coordinator = ctx.coordinator()?;

    let mut calls = Vec::with_capacity(records.len());
    for record in records {
        let mut item = record.into_item(args.org).context("Invalid call record")?;
        if args.load.is_some() {
            item.load_id = args.load;
        }
        let call_id = item.context.call_id;
        let outcome = coordinator
            .process_call(&item.extraction, item.context, item.load_id)
            .await;
        calls.push(IngestedCall::from_outcome(call_id, outcome));
    }

    output(&IngestOutput { calls }, json_mode);
    Ok(())
}

//! Call records read by `ingest` and `reprocess`.
//!
//! A file holds one JSON record, a JSON array of records, or one record per
//! line (JSON Lines). `-` reads standard input.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use uuid::Uuid;

use crate::domain::models::{CallContext, CallExtraction};
use crate::services::ReplayItem;

/// One stored call with its extraction.
#[derive(Debug, Clone, Deserialize)]
pub struct CallRecord {
    /// Generated when absent, which makes replays of the same file non-idempotent
    /// for the interaction log.
    pub call_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    pub call_date: Option<DateTime<Utc>>,
    pub load_id: Option<Uuid>,
    pub extraction: CallExtraction,
}

impl CallRecord {
    /// Call context, falling back to `default_org` and the current time.
    pub fn into_item(self, default_org: Option<Uuid>) -> Result<ReplayItem> {
        let organization_id = self
            .organization_id
            .or(default_org)
            .context("call record has no organization_id and no --org was given")?;
        let context = CallContext {
            call_id: self.call_id.unwrap_or_else(Uuid::new_v4),
            organization_id,
            call_date: self.call_date.unwrap_or_else(Utc::now),
        };
        Ok(ReplayItem {
            extraction: self.extraction,
            context,
            load_id: self.load_id,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordDocument {
    Many(Vec<CallRecord>),
    One(Box<CallRecord>),
}

/// Parse call records from text in any of the accepted layouts.
pub fn parse_call_records(text: &str) -> Result<Vec<CallRecord>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if let Ok(document) = serde_json::from_str::<RecordDocument>(trimmed) {
        return Ok(match document {
            RecordDocument::Many(records) => records,
            RecordDocument::One(record) => vec![*record],
        });
    }

    trimmed
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).with_context(|| format!("invalid call record on line {}", index + 1))
        })
        .collect()
}

/// Read call records from a file path, or stdin when the path is `-`.
pub fn read_call_records(path: &Path) -> Result<Vec<CallRecord>> {
    let text = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read call records from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
    };
    parse_call_records(&text)
}

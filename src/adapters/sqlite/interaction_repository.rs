//! `SQLite` implementation of the call interaction log.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{format_datetime, parse_datetime, parse_optional_uuid, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{CarrierCallInteraction, InteractionKind};
use crate::domain::ports::InteractionLog;

#[derive(Clone)]
pub struct SqliteInteractionLog {
    pool: SqlitePool,
}

impl SqliteInteractionLog {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InteractionLog for SqliteInteractionLog {
    async fn record_carrier_call_interaction(&self, interaction: &CarrierCallInteraction) -> DomainResult<bool> {
        let result = sqlx::query(
            r#"INSERT OR IGNORE INTO carrier_call_interactions
               (id, organization_id, carrier_id, call_id, load_id, kind, confidence, note, occurred_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(interaction.id.to_string())
        .bind(interaction.organization_id.to_string())
        .bind(interaction.carrier_id.to_string())
        .bind(interaction.call_id.to_string())
        .bind(interaction.load_id.map(|id| id.to_string()))
        .bind(interaction.kind.as_str())
        .bind(i64::from(interaction.confidence))
        .bind(&interaction.note)
        .bind(format_datetime(interaction.occurred_at))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_carrier(&self, carrier_id: Uuid) -> DomainResult<Vec<CarrierCallInteraction>> {
        let rows: Vec<InteractionRow> = sqlx::query_as(
            r#"SELECT id, organization_id, carrier_id, call_id, load_id, kind, confidence, note, occurred_at
               FROM carrier_call_interactions WHERE carrier_id = ? ORDER BY occurred_at DESC"#,
        )
        .bind(carrier_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct InteractionRow {
    id: String,
    organization_id: String,
    carrier_id: String,
    call_id: String,
    load_id: Option<String>,
    kind: String,
    confidence: i64,
    note: Option<String>,
    occurred_at: String,
}

impl TryFrom<InteractionRow> for CarrierCallInteraction {
    type Error = DomainError;

    fn try_from(row: InteractionRow) -> Result<Self, Self::Error> {
        let kind = InteractionKind::from_str(&row.kind)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid interaction kind: {}", row.kind)))?;

        Ok(Self {
            id: parse_uuid(&row.id)?,
            organization_id: parse_uuid(&row.organization_id)?,
            carrier_id: parse_uuid(&row.carrier_id)?,
            call_id: parse_uuid(&row.call_id)?,
            load_id: parse_optional_uuid(row.load_id)?,
            kind,
            confidence: u8::try_from(row.confidence.clamp(0, 100)).unwrap_or_default(),
            note: row.note,
            occurred_at: parse_datetime(&row.occurred_at)?,
        })
    }
}

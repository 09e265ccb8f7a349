//! `SQLite` implementation of the verification cache.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::{format_datetime, parse_datetime};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AuthorityQuery, RiskLevel, VerificationRecord};
use crate::domain::ports::VerificationRepository;

const VERIFICATION_COLUMNS: &str =
    "cache_key, mc_number, dot_number, snapshot, risk_level, risk_score, warnings, verified_at, expires_at";

#[derive(Clone)]
pub struct SqliteVerificationRepository {
    pool: SqlitePool,
}

impl SqliteVerificationRepository {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationRepository for SqliteVerificationRepository {
    async fn find(&self, query: &AuthorityQuery) -> DomainResult<Option<VerificationRecord>> {
        let row: Option<VerificationRow> = sqlx::query_as(&format!(
            "SELECT {VERIFICATION_COLUMNS} FROM carrier_verifications WHERE cache_key = ?"
        ))
        .bind(query.cache_key())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn upsert(&self, record: &VerificationRecord) -> DomainResult<()> {
        let snapshot_json = serde_json::to_string(&record.snapshot)?;
        let warnings_json = serde_json::to_string(&record.warnings)?;

        sqlx::query(
            r#"INSERT INTO carrier_verifications
               (cache_key, mc_number, dot_number, snapshot, risk_level, risk_score, warnings, verified_at, expires_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(cache_key) DO UPDATE SET
                 mc_number = excluded.mc_number,
                 dot_number = excluded.dot_number,
                 snapshot = excluded.snapshot,
                 risk_level = excluded.risk_level,
                 risk_score = excluded.risk_score,
                 warnings = excluded.warnings,
                 verified_at = excluded.verified_at,
                 expires_at = excluded.expires_at"#,
        )
        .bind(&record.cache_key)
        .bind(&record.mc_number)
        .bind(&record.dot_number)
        .bind(&snapshot_json)
        .bind(record.risk_level.as_str())
        .bind(i64::from(record.risk_score))
        .bind(&warnings_json)
        .bind(format_datetime(record.verified_at))
        .bind(format_datetime(record.expires_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_expired(&self, now: DateTime<Utc>, limit: u32) -> DomainResult<Vec<VerificationRecord>> {
        let rows: Vec<VerificationRow> = sqlx::query_as(&format!(
            "SELECT {VERIFICATION_COLUMNS} FROM carrier_verifications WHERE expires_at <= ? ORDER BY expires_at ASC LIMIT ?"
        ))
        .bind(format_datetime(now))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM carrier_verifications WHERE expires_at <= ?")
            .bind(format_datetime(now))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[derive(sqlx::FromRow)]
struct VerificationRow {
    cache_key: String,
    mc_number: Option<String>,
    dot_number: Option<String>,
    snapshot: String,
    risk_level: String,
    risk_score: i64,
    warnings: String,
    verified_at: String,
    expires_at: String,
}

impl TryFrom<VerificationRow> for VerificationRecord {
    type Error = DomainError;

    fn try_from(row: VerificationRow) -> Result<Self, Self::Error> {
        let risk_level = RiskLevel::from_str(&row.risk_level)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid risk level: {}", row.risk_level)))?;

        Ok(Self {
            cache_key: row.cache_key,
            mc_number: row.mc_number,
            dot_number: row.dot_number,
            snapshot: serde_json::from_str(&row.snapshot)?,
            risk_level,
            risk_score: u8::try_from(row.risk_score.clamp(0, 100)).unwrap_or_default(),
            warnings: serde_json::from_str(&row.warnings)?,
            verified_at: parse_datetime(&row.verified_at)?,
            expires_at: parse_datetime(&row.expires_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::models::{AuthoritySnapshot, OperatingStatus, RiskWarning, Severity};
    use chrono::Duration;

    fn record(number: &str, verified_at: DateTime<Utc>) -> VerificationRecord {
        let query = AuthorityQuery::Mc(number.to_string());
        VerificationRecord {
            cache_key: query.cache_key(),
            mc_number: Some(number.to_string()),
            dot_number: None,
            snapshot: AuthoritySnapshot {
                source: "test".to_string(),
                legal_name: Some("Acme Freight".to_string()),
                operating_status: OperatingStatus::Authorized,
                ..Default::default()
            },
            risk_level: RiskLevel::Medium,
            risk_score: 65,
            warnings: vec![RiskWarning::new(Severity::Warning, "young_authority", "Authority is 60 days old")],
            verified_at,
            expires_at: verified_at + Duration::hours(24),
        }
    }

    async fn setup_test_repo() -> SqliteVerificationRepository {
        SqliteVerificationRepository::new(create_migrated_test_pool().await.unwrap())
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_cache_key() {
        let repo = setup_test_repo().await;
        let now = Utc::now();
        repo.upsert(&record("778899", now - Duration::hours(30))).await.unwrap();

        let mut fresh = record("778899", now);
        fresh.risk_score = 90;
        fresh.risk_level = RiskLevel::Low;
        repo.upsert(&fresh).await.unwrap();

        let found = repo.find(&AuthorityQuery::Mc("778899".to_string())).await.unwrap().unwrap();
        assert_eq!(found.risk_score, 90);
        assert_eq!(found.snapshot.legal_name.as_deref(), Some("Acme Freight"));
        assert_eq!(found.warnings.len(), 1);
        assert!(found.is_fresh(now));

        assert!(repo.find(&AuthorityQuery::Dot("778899".to_string())).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_listing_and_purge() {
        let repo = setup_test_repo().await;
        let now = Utc::now();
        repo.upsert(&record("111111", now - Duration::hours(48))).await.unwrap();
        repo.upsert(&record("222222", now - Duration::hours(25))).await.unwrap();
        repo.upsert(&record("333333", now)).await.unwrap();

        let expired = repo.list_expired(now, 10).await.unwrap();
        let keys: Vec<_> = expired.iter().map(|r| r.cache_key.as_str()).collect();
        assert_eq!(keys, vec!["MC:111111", "MC:222222"]);
        assert_eq!(repo.list_expired(now, 1).await.unwrap().len(), 1);

        assert_eq!(repo.purge_expired(now).await.unwrap(), 2);
        assert!(repo.find(&AuthorityQuery::Mc("333333".to_string())).await.unwrap().is_some());
    }
}

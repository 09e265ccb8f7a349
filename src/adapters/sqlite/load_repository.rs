//! `SQLite` implementation of the `LoadRepository`.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{format_datetime, format_optional_datetime, parse_datetime, parse_optional_datetime, parse_optional_uuid, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{LoadCarrierLink, LoadRecord, LoadStatus};
use crate::domain::ports::LoadRepository;

const LOAD_COLUMNS: &str = "id, organization_id, load_number, status, carrier_id, rate_to_carrier, quoted_rate, \
    margin, equipment_type, origin_state, destination_state, delivery_date, actual_delivery_date, \
    driver_name, driver_phone, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteLoadRepository {
    pool: SqlitePool,
}

impl SqliteLoadRepository {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoadRepository for SqliteLoadRepository {
    async fn create(&self, load: &LoadRecord) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO loads (id, organization_id, load_number, status, carrier_id, rate_to_carrier,
               quoted_rate, margin, equipment_type, origin_state, destination_state, delivery_date,
               actual_delivery_date, driver_name, driver_phone, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(load.id.to_string())
        .bind(load.organization_id.to_string())
        .bind(&load.load_number)
        .bind(load.status.as_str())
        .bind(load.carrier_id.map(|id| id.to_string()))
        .bind(load.rate_to_carrier)
        .bind(load.quoted_rate)
        .bind(load.margin)
        .bind(&load.equipment_type)
        .bind(&load.origin_state)
        .bind(&load.destination_state)
        .bind(format_optional_datetime(load.delivery_date))
        .bind(format_optional_datetime(load.actual_delivery_date))
        .bind(&load.driver_name)
        .bind(&load.driver_phone)
        .bind(format_datetime(load.created_at))
        .bind(format_datetime(load.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<LoadRecord>> {
        let row: Option<LoadRow> = sqlx::query_as(&format!("SELECT {LOAD_COLUMNS} FROM loads WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_load_number(&self, organization_id: Uuid, load_number: &str) -> DomainResult<Option<LoadRecord>> {
        let row: Option<LoadRow> = sqlx::query_as(&format!(
            "SELECT {LOAD_COLUMNS} FROM loads WHERE organization_id = ? AND load_number = ? ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(organization_id.to_string())
        .bind(load_number.trim())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_load_history(&self, carrier_id: Uuid) -> DomainResult<Vec<LoadRecord>> {
        let rows: Vec<LoadRow> = sqlx::query_as(&format!(
            "SELECT {LOAD_COLUMNS} FROM loads WHERE carrier_id = ? ORDER BY created_at ASC, id ASC"
        ))
        .bind(carrier_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_carrier_link(&self, load_id: Uuid, carrier_id: Uuid, link: &LoadCarrierLink) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE loads SET carrier_id = ?,
               quoted_rate = COALESCE(?, quoted_rate),
               rate_to_carrier = COALESCE(rate_to_carrier, ?),
               driver_name = COALESCE(?, driver_name),
               driver_phone = COALESCE(?, driver_phone),
               updated_at = ?
               WHERE id = ?"#,
        )
        .bind(carrier_id.to_string())
        .bind(link.quoted_rate)
        .bind(link.quoted_rate)
        .bind(&link.driver_name)
        .bind(&link.driver_phone)
        .bind(format_datetime(chrono::Utc::now()))
        .bind(load_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::LoadNotFound(load_id.to_string()));
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct LoadRow {
    id: String,
    organization_id: String,
    load_number: Option<String>,
    status: String,
    carrier_id: Option<String>,
    rate_to_carrier: Option<f64>,
    quoted_rate: Option<f64>,
    margin: Option<f64>,
    equipment_type: Option<String>,
    origin_state: Option<String>,
    destination_state: Option<String>,
    delivery_date: Option<String>,
    actual_delivery_date: Option<String>,
    driver_name: Option<String>,
    driver_phone: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<LoadRow> for LoadRecord {
    type Error = DomainError;

    fn try_from(row: LoadRow) -> Result<Self, Self::Error> {
        let status = LoadStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid load status: {}", row.status)))?;

        Ok(Self {
            id: parse_uuid(&row.id)?,
            organization_id: parse_uuid(&row.organization_id)?,
            load_number: row.load_number,
            status,
            carrier_id: parse_optional_uuid(row.carrier_id)?,
            rate_to_carrier: row.rate_to_carrier,
            quoted_rate: row.quoted_rate,
            margin: row.margin,
            equipment_type: row.equipment_type,
            origin_state: row.origin_state,
            destination_state: row.destination_state,
            delivery_date: parse_optional_datetime(row.delivery_date)?,
            actual_delivery_date: parse_optional_datetime(row.actual_delivery_date)?,
            driver_name: row.driver_name,
            driver_phone: row.driver_phone,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteCarrierRepository};
    use crate::domain::models::CarrierEntity;
    use crate::domain::ports::CarrierRepository;
    use chrono::{Duration, Utc};

    async fn setup() -> (SqliteLoadRepository, CarrierEntity) {
        let pool = create_migrated_test_pool().await.unwrap();
        let carriers = SqliteCarrierRepository::new(pool.clone());
        let carrier = CarrierEntity::new(Uuid::new_v4());
        carriers.create(&carrier).await.unwrap();
        (SqliteLoadRepository::new(pool), carrier)
    }

    #[tokio::test]
    async fn test_history_is_oldest_first() {
        let (repo, carrier) = setup().await;
        let now = Utc::now();

        for (offset, status) in [(2, LoadStatus::Delivered), (5, LoadStatus::Cancelled), (1, LoadStatus::Booked)] {
            let mut load = LoadRecord::new(carrier.organization_id, status);
            load.carrier_id = Some(carrier.id);
            load.created_at = now - Duration::days(offset);
            repo.create(&load).await.unwrap();
        }
        repo.create(&LoadRecord::new(carrier.organization_id, LoadStatus::Available)).await.unwrap();

        let history = repo.list_load_history(carrier.id).await.unwrap();
        let statuses: Vec<_> = history.iter().map(|l| l.status).collect();
        assert_eq!(statuses, vec![LoadStatus::Cancelled, LoadStatus::Delivered, LoadStatus::Booked]);
    }

    #[tokio::test]
    async fn test_link_keeps_existing_rate_to_carrier() {
        let (repo, carrier) = setup().await;
        let mut load = LoadRecord::new(carrier.organization_id, LoadStatus::Available);
        load.load_number = Some("L-1001".to_string());
        load.rate_to_carrier = Some(1500.0);
        repo.create(&load).await.unwrap();

        let link = LoadCarrierLink {
            quoted_rate: Some(1750.0),
            driver_name: Some("Sam".to_string()),
            driver_phone: None,
        };
        repo.update_carrier_link(load.id, carrier.id, &link).await.unwrap();

        let linked = repo.find_by_load_number(carrier.organization_id, "L-1001").await.unwrap().unwrap();
        assert_eq!(linked.carrier_id, Some(carrier.id));
        assert_eq!(linked.quoted_rate, Some(1750.0));
        assert_eq!(linked.rate_to_carrier, Some(1500.0));
        assert_eq!(linked.driver_name.as_deref(), Some("Sam"));
    }

    #[tokio::test]
    async fn test_link_fills_missing_rate_to_carrier() {
        let (repo, carrier) = setup().await;
        let load = LoadRecord::new(carrier.organization_id, LoadStatus::Available);
        repo.create(&load).await.unwrap();

        let link = LoadCarrierLink { quoted_rate: Some(2100.0), ..Default::default() };
        repo.update_carrier_link(load.id, carrier.id, &link).await.unwrap();

        let linked = repo.get(load.id).await.unwrap().unwrap();
        assert_eq!(linked.rate_to_carrier, Some(2100.0));
    }

    #[tokio::test]
    async fn test_link_missing_load() {
        let (repo, carrier) = setup().await;
        let result = repo.update_carrier_link(Uuid::new_v4(), carrier.id, &LoadCarrierLink::default()).await;
        assert!(matches!(result, Err(DomainError::LoadNotFound(_))));
    }
}

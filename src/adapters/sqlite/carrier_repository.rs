//! `SQLite` implementation of the `CarrierRepository`.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{
    format_datetime, format_optional_datetime, map_unique_violation, parse_datetime, parse_json_or_default,
    parse_optional_datetime, parse_uuid,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    phone_digits, AuthorityQuery, CarrierEntity, CarrierStats, CarrierStatus, PhoneMatchMode,
};
use crate::domain::ports::{CarrierFilter, CarrierRepository};

const CARRIER_COLUMNS: &str = "id, organization_id, company_name, mc_number, dot_number, \
    dispatcher_name, dispatcher_phone, dispatcher_email, alternate_phone, driver_name, driver_phone, \
    address, city, state, zip, equipment_types, preferred_lanes, total_loads, completed_loads, \
    on_time_percentage, average_rate, lifetime_revenue, performance_score, first_contact_date, \
    last_contact_date, last_used_date, status, auto_created, needs_review, created_at, updated_at";

/// Most recently contacted carrier first; never-contacted rows last.
const RECENCY_ORDER: &str = "ORDER BY last_contact_date IS NULL, last_contact_date DESC, created_at DESC";

#[derive(Clone)]
pub struct SqliteCarrierRepository {
    pool: SqlitePool,
}

impl SqliteCarrierRepository {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn optional_digits(phone: Option<&String>) -> Option<String> {
    phone.map(|p| phone_digits(p)).filter(|d| !d.is_empty())
}

#[async_trait]
impl CarrierRepository for SqliteCarrierRepository {
    async fn create(&self, carrier: &CarrierEntity) -> DomainResult<()> {
        let equipment_json = serde_json::to_string(&carrier.equipment_types)?;
        let lanes_json = serde_json::to_string(&carrier.preferred_lanes)?;

        sqlx::query(
            r#"INSERT INTO carriers (id, organization_id, company_name, mc_number, dot_number,
               dispatcher_name, dispatcher_phone, dispatcher_phone_digits, dispatcher_email,
               alternate_phone, alternate_phone_digits, driver_name, driver_phone,
               address, city, state, zip, equipment_types, preferred_lanes,
               total_loads, completed_loads, on_time_percentage, average_rate, lifetime_revenue, performance_score,
               first_contact_date, last_contact_date, last_used_date, status, auto_created, needs_review,
               created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(carrier.id.to_string())
        .bind(carrier.organization_id.to_string())
        .bind(&carrier.company_name)
        .bind(&carrier.mc_number)
        .bind(&carrier.dot_number)
        .bind(&carrier.dispatcher_name)
        .bind(&carrier.dispatcher_phone)
        .bind(optional_digits(carrier.dispatcher_phone.as_ref()))
        .bind(&carrier.dispatcher_email)
        .bind(&carrier.alternate_phone)
        .bind(optional_digits(carrier.alternate_phone.as_ref()))
        .bind(&carrier.driver_name)
        .bind(&carrier.driver_phone)
        .bind(&carrier.address)
        .bind(&carrier.city)
        .bind(&carrier.state)
        .bind(&carrier.zip)
        .bind(&equipment_json)
        .bind(&lanes_json)
        .bind(i64::from(carrier.stats.total_loads))
        .bind(i64::from(carrier.stats.completed_loads))
        .bind(carrier.stats.on_time_percentage)
        .bind(carrier.stats.average_rate)
        .bind(carrier.stats.lifetime_revenue)
        .bind(i64::from(carrier.stats.performance_score))
        .bind(format_optional_datetime(carrier.first_contact_date))
        .bind(format_optional_datetime(carrier.last_contact_date))
        .bind(format_optional_datetime(carrier.last_used_date))
        .bind(carrier.status.as_str())
        .bind(carrier.auto_created)
        .bind(carrier.needs_review)
        .bind(format_datetime(carrier.created_at))
        .bind(format_datetime(carrier.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "carrier", carrier.mc_number.as_deref().unwrap_or_default()))?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<CarrierEntity>> {
        let row: Option<CarrierRow> = sqlx::query_as(&format!("SELECT {CARRIER_COLUMNS} FROM carriers WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_authority_number(
        &self,
        organization_id: Uuid,
        query: &AuthorityQuery,
    ) -> DomainResult<Option<CarrierEntity>> {
        let column = match query {
            AuthorityQuery::Mc(_) => "mc_number",
            AuthorityQuery::Dot(_) => "dot_number",
        };
        let sql = format!(
            "SELECT {CARRIER_COLUMNS} FROM carriers WHERE organization_id = ? AND {column} = ? {RECENCY_ORDER} LIMIT 1"
        );

        let row: Option<CarrierRow> = sqlx::query_as(&sql)
            .bind(organization_id.to_string())
            .bind(query.number())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_phone(
        &self,
        organization_id: Uuid,
        digits: &str,
        mode: PhoneMatchMode,
    ) -> DomainResult<Option<CarrierEntity>> {
        if digits.is_empty() {
            return Ok(None);
        }

        let predicate = match mode {
            PhoneMatchMode::Contains => {
                "(instr(dispatcher_phone_digits, ?2) > 0 OR instr(alternate_phone_digits, ?2) > 0)"
            }
            PhoneMatchMode::Exact => "(dispatcher_phone_digits = ?2 OR alternate_phone_digits = ?2)",
        };
        let sql = format!(
            "SELECT {CARRIER_COLUMNS} FROM carriers WHERE organization_id = ?1 AND {predicate} {RECENCY_ORDER} LIMIT 1"
        );

        let row: Option<CarrierRow> = sqlx::query_as(&sql)
            .bind(organization_id.to_string())
            .bind(digits)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update(&self, carrier: &CarrierEntity) -> DomainResult<()> {
        let equipment_json = serde_json::to_string(&carrier.equipment_types)?;
        let lanes_json = serde_json::to_string(&carrier.preferred_lanes)?;

        let result = sqlx::query(
            r#"UPDATE carriers SET company_name = ?, mc_number = ?, dot_number = ?,
               dispatcher_name = ?, dispatcher_phone = ?, dispatcher_phone_digits = ?, dispatcher_email = ?,
               alternate_phone = ?, alternate_phone_digits = ?, driver_name = ?, driver_phone = ?,
               address = ?, city = ?, state = ?, zip = ?, equipment_types = ?, preferred_lanes = ?,
               first_contact_date = ?, last_contact_date = ?, last_used_date = ?,
               status = ?, auto_created = ?, needs_review = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&carrier.company_name)
        .bind(&carrier.mc_number)
        .bind(&carrier.dot_number)
        .bind(&carrier.dispatcher_name)
        .bind(&carrier.dispatcher_phone)
        .bind(optional_digits(carrier.dispatcher_phone.as_ref()))
        .bind(&carrier.dispatcher_email)
        .bind(&carrier.alternate_phone)
        .bind(optional_digits(carrier.alternate_phone.as_ref()))
        .bind(&carrier.driver_name)
        .bind(&carrier.driver_phone)
        .bind(&carrier.address)
        .bind(&carrier.city)
        .bind(&carrier.state)
        .bind(&carrier.zip)
        .bind(&equipment_json)
        .bind(&lanes_json)
        .bind(format_optional_datetime(carrier.first_contact_date))
        .bind(format_optional_datetime(carrier.last_contact_date))
        .bind(format_optional_datetime(carrier.last_used_date))
        .bind(carrier.status.as_str())
        .bind(carrier.auto_created)
        .bind(carrier.needs_review)
        .bind(format_datetime(carrier.updated_at))
        .bind(carrier.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "carrier", carrier.mc_number.as_deref().unwrap_or_default()))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::CarrierNotFound(carrier.id));
        }

        Ok(())
    }

    async fn update_statistics(&self, carrier_id: Uuid, stats: &CarrierStats) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE carriers SET total_loads = ?, completed_loads = ?, on_time_percentage = ?,
               average_rate = ?, lifetime_revenue = ?, performance_score = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(i64::from(stats.total_loads))
        .bind(i64::from(stats.completed_loads))
        .bind(stats.on_time_percentage)
        .bind(stats.average_rate)
        .bind(stats.lifetime_revenue)
        .bind(i64::from(stats.performance_score))
        .bind(format_datetime(chrono::Utc::now()))
        .bind(carrier_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::CarrierNotFound(carrier_id));
        }

        Ok(())
    }

    async fn list(&self, filter: CarrierFilter) -> DomainResult<Vec<CarrierEntity>> {
        let mut query = format!("SELECT {CARRIER_COLUMNS} FROM carriers WHERE 1=1");
        let mut bindings: Vec<String> = Vec::new();

        if let Some(organization_id) = &filter.organization_id {
            query.push_str(" AND organization_id = ?");
            bindings.push(organization_id.to_string());
        }

        if let Some(status) = &filter.status {
            query.push_str(" AND status = ?");
            bindings.push(status.as_str().to_string());
        }

        if let Some(needs_review) = filter.needs_review {
            query.push_str(if needs_review { " AND needs_review = 1" } else { " AND needs_review = 0" });
        }

        if let Some(name) = &filter.name_contains {
            query.push_str(" AND lower(company_name) LIKE ?");
            bindings.push(format!("%{}%", name.to_lowercase()));
        }

        query.push_str(" ORDER BY created_at DESC");

        let mut q = sqlx::query_as::<_, CarrierRow>(&query);
        for binding in &bindings {
            q = q.bind(binding);
        }

        let rows: Vec<CarrierRow> = q.fetch_all(&self.pool).await?;
        let carriers = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<CarrierEntity>, _>>()?;

        // Equipment lives in a JSON column; filter in code.
        let limit = filter.limit.map_or(usize::MAX, |l| l as usize);
        Ok(carriers
            .into_iter()
            .filter(|c| filter.equipment.map_or(true, |eq| c.equipment_types.contains(&eq)))
            .take(limit)
            .collect())
    }
}

#[derive(sqlx::FromRow)]
struct CarrierRow {
    id: String,
    organization_id: String,
    company_name: Option<String>,
    mc_number: Option<String>,
    dot_number: Option<String>,
    dispatcher_name: Option<String>,
    dispatcher_phone: Option<String>,
    dispatcher_email: Option<String>,
    alternate_phone: Option<String>,
    driver_name: Option<String>,
    driver_phone: Option<String>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip: Option<String>,
    equipment_types: Option<String>,
    preferred_lanes: Option<String>,
    total_loads: i64,
    completed_loads: i64,
    on_time_percentage: f64,
    average_rate: Option<f64>,
    lifetime_revenue: f64,
    performance_score: i64,
    first_contact_date: Option<String>,
    last_contact_date: Option<String>,
    last_used_date: Option<String>,
    status: String,
    auto_created: bool,
    needs_review: bool,
    created_at: String,
    updated_at: String,
}

impl TryFrom<CarrierRow> for CarrierEntity {
    type Error = DomainError;

    fn try_from(row: CarrierRow) -> Result<Self, Self::Error> {
        let status = CarrierStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid carrier status: {}", row.status)))?;

        Ok(Self {
            id: parse_uuid(&row.id)?,
            organization_id: parse_uuid(&row.organization_id)?,
            company_name: row.company_name,
            mc_number: row.mc_number,
            dot_number: row.dot_number,
            dispatcher_name: row.dispatcher_name,
            dispatcher_phone: row.dispatcher_phone,
            dispatcher_email: row.dispatcher_email,
            alternate_phone: row.alternate_phone,
            driver_name: row.driver_name,
            driver_phone: row.driver_phone,
            address: row.address,
            city: row.city,
            state: row.state,
            zip: row.zip,
            equipment_types: parse_json_or_default(row.equipment_types)?,
            preferred_lanes: parse_json_or_default(row.preferred_lanes)?,
            stats: CarrierStats {
                total_loads: u32::try_from(row.total_loads).unwrap_or_default(),
                completed_loads: u32::try_from(row.completed_loads).unwrap_or_default(),
                on_time_percentage: row.on_time_percentage,
                average_rate: row.average_rate,
                lifetime_revenue: row.lifetime_revenue,
                performance_score: u8::try_from(row.performance_score.clamp(0, 100)).unwrap_or_default(),
            },
            first_contact_date: parse_optional_datetime(row.first_contact_date)?,
            last_contact_date: parse_optional_datetime(row.last_contact_date)?,
            last_used_date: parse_optional_datetime(row.last_used_date)?,
            status,
            auto_created: row.auto_created,
            needs_review: row.needs_review,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

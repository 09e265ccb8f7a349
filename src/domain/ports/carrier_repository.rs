//! Carrier repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AuthorityQuery, CarrierEntity, CarrierStats, CarrierStatus, EquipmentType, PhoneMatchMode,
};

/// Filter criteria for listing carriers.
#[derive(Debug, Clone, Default)]
pub struct CarrierFilter {
    pub organization_id: Option<Uuid>,
    pub status: Option<CarrierStatus>,
    pub equipment: Option<EquipmentType>,
    pub needs_review: Option<bool>,
    /// Case-insensitive substring of the company name.
    pub name_contains: Option<String>,
    pub limit: Option<u32>,
}

/// Repository interface for carrier persistence.
#[async_trait]
pub trait CarrierRepository: Send + Sync {
    /// Insert a new carrier.
    ///
    /// Fails with `DuplicateKey` when the organization already has a carrier
    /// with the same MC number.
    async fn create(&self, carrier: &CarrierEntity) -> DomainResult<()>;

    /// Get a carrier by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<CarrierEntity>>;

    /// Exact match on the normalized MC or DOT number within one organization.
    async fn find_by_authority_number(
        &self,
        organization_id: Uuid,
        query: &AuthorityQuery,
    ) -> DomainResult<Option<CarrierEntity>>;

    /// Phone lookup on the dispatcher phone's digits.
    ///
    /// `digits` is already normalized. When several carriers match, the most
    /// recently contacted one wins.
    async fn find_by_phone(
        &self,
        organization_id: Uuid,
        digits: &str,
        mode: PhoneMatchMode,
    ) -> DomainResult<Option<CarrierEntity>>;

    /// Replace every mutable column of an existing carrier.
    async fn update(&self, carrier: &CarrierEntity) -> DomainResult<()>;

    /// Overwrite only the cached statistics columns.
    async fn update_statistics(&self, carrier_id: Uuid, stats: &CarrierStats) -> DomainResult<()>;

    /// List carriers with optional filters.
    async fn list(&self, filter: CarrierFilter) -> DomainResult<Vec<CarrierEntity>>;
}

//! Load repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{LoadCarrierLink, LoadRecord};

/// Read/write access to loads, limited to what the carrier registry needs.
#[async_trait]
pub trait LoadRepository: Send + Sync {
    async fn create(&self, load: &LoadRecord) -> DomainResult<()>;

    async fn get(&self, id: Uuid) -> DomainResult<Option<LoadRecord>>;

    async fn find_by_load_number(
        &self,
        organization_id: Uuid,
        load_number: &str,
    ) -> DomainResult<Option<LoadRecord>>;

    /// Every load assigned to the carrier, oldest first.
    async fn list_load_history(&self, carrier_id: Uuid) -> DomainResult<Vec<LoadRecord>>;

    /// Assign the carrier to the load and write the quoted details.
    ///
    /// `rate_to_carrier` is only filled when the load does not have one yet.
    async fn update_carrier_link(
        &self,
        load_id: Uuid,
        carrier_id: Uuid,
        link: &LoadCarrierLink,
    ) -> DomainResult<()>;
}

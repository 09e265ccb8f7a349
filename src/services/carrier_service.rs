//! Carrier directory: lookups, listing and status changes.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{CarrierCallInteraction, CarrierEntity, CarrierStatus};
use crate::domain::ports::{CarrierFilter, CarrierRepository, InteractionLog};

pub struct CarrierService {
    carriers: Arc<dyn CarrierRepository>,
    interactions: Arc<dyn InteractionLog>,
}

impl CarrierService {
    pub fn new(carriers: Arc<dyn CarrierRepository>, interactions: Arc<dyn InteractionLog>) -> Self {
        Self {
            carriers,
            interactions,
        }
    }

    /// Get a carrier, failing with `CarrierNotFound` when it does not exist.
    pub async fn get_carrier(&self, id: Uuid) -> DomainResult<CarrierEntity> {
        self.carriers
            .get(id)
            .await?
            .ok_or(DomainError::CarrierNotFound(id))
    }

    pub async fn list_carriers(&self, filter: CarrierFilter) -> DomainResult<Vec<CarrierEntity>> {
        self.carriers.list(filter).await
    }

    /// Calls that touched the carrier, most recent first.
    pub async fn interactions(&self, id: Uuid) -> DomainResult<Vec<CarrierCallInteraction>> {
        self.interactions.list_for_carrier(id).await
    }

    /// Move a carrier to a new status. Carriers are never deleted; blacklisting
    /// and deactivation are the only ways out of the active pool.
    #[instrument(skip(self), fields(status = new_status.as_str()), err)]
    pub async fn transition_status(&self, id: Uuid, new_status: CarrierStatus) -> DomainResult<CarrierEntity> {
        let mut carrier = self.get_carrier(id).await?;
        let from = carrier.status;

        carrier
            .transition_to(new_status)
            .map_err(|_| DomainError::InvalidStateTransition {
                from: from.as_str().to_string(),
                to: new_status.as_str().to_string(),
            })?;

        self.carriers.update(&carrier).await?;
        info!(carrier_id = %id, from = from.as_str(), "carrier status changed");
        Ok(carrier)
    }
}

//! Call interaction log port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::CarrierCallInteraction;

#[async_trait]
pub trait InteractionLog: Send + Sync {
    /// Append an interaction. A second record for the same
    /// `(call_id, carrier_id)` pair is ignored; returns whether a row was written.
    async fn record_carrier_call_interaction(
        &self,
        interaction: &CarrierCallInteraction,
    ) -> DomainResult<bool>;

    /// Interactions for one carrier, newest first.
    async fn list_for_carrier(&self, carrier_id: Uuid) -> DomainResult<Vec<CarrierCallInteraction>>;
}

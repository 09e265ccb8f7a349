//! Field-level rules for combining a candidate with an existing carrier.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::domain::models::{phone_digits, CarrierCandidate, CarrierEntity, CarrierStats};

/// Whether the merge produced a new record or refined an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeKind {
    Created,
    Updated,
}

/// A candidate authority number that was dropped because the carrier already has one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IgnoredAuthority {
    pub field: &'static str,
    pub existing: String,
    pub incoming: String,
}

/// Entity to persist plus how it was derived.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub carrier: CarrierEntity,
    pub kind: MergeKind,
    pub ignored_authority: Vec<IgnoredAuthority>,
}

impl MergeOutcome {
    pub const fn is_new(&self) -> bool {
        matches!(self.kind, MergeKind::Created)
    }
}

fn non_empty(value: Option<&String>) -> Option<&String> {
    value.filter(|v| !v.trim().is_empty())
}

fn later(a: Option<DateTime<Utc>>, b: DateTime<Utc>) -> Option<DateTime<Utc>> {
    Some(a.map_or(b, |a| a.max(b)))
}

fn earlier(a: Option<DateTime<Utc>>, b: DateTime<Utc>) -> Option<DateTime<Utc>> {
    Some(a.map_or(b, |a| a.min(b)))
}

/// Create-or-update rules.
///
/// Authority numbers are write-once, sets are unioned, contact scalars only
/// overwrite with non-empty values and the address only moves as a whole.
#[derive(Debug, Clone)]
pub struct MergePolicy {
    review_confidence_threshold: u8,
}

impl MergePolicy {
    /// Carriers created from candidates below `review_confidence_threshold` are flagged for review.
    pub const fn new(review_confidence_threshold: u8) -> Self {
        Self {
            review_confidence_threshold,
        }
    }

    pub fn merge(
        &self,
        existing: Option<CarrierEntity>,
        candidate: &CarrierCandidate,
        now: DateTime<Utc>,
    ) -> MergeOutcome {
        match existing {
            None => MergeOutcome {
                carrier: self.create(candidate, now),
                kind: MergeKind::Created,
                ignored_authority: Vec::new(),
            },
            Some(carrier) => {
                let (carrier, ignored_authority) = Self::update(carrier, candidate, now);
                MergeOutcome {
                    carrier,
                    kind: MergeKind::Updated,
                    ignored_authority,
                }
            }
        }
    }

    fn create(&self, candidate: &CarrierCandidate, now: DateTime<Utc>) -> CarrierEntity {
        let call_date = candidate.context.call_date;
        let mut carrier = CarrierEntity::new(candidate.context.organization_id);

        carrier.company_name = non_empty(candidate.company_name.as_ref()).cloned();
        carrier.mc_number = candidate.mc_number.clone();
        carrier.dot_number = candidate.dot_number.clone();
        carrier.dispatcher_name = non_empty(candidate.contact_name.as_ref()).cloned();
        carrier.dispatcher_phone = non_empty(candidate.phone.as_ref()).cloned();
        carrier.dispatcher_email = non_empty(candidate.email.as_ref()).cloned();
        carrier.driver_name = non_empty(candidate.driver_name.as_ref()).cloned();
        carrier.driver_phone = non_empty(candidate.driver_phone.as_ref()).cloned();
        carrier.address = non_empty(candidate.address.as_ref()).cloned();
        carrier.city = non_empty(candidate.city.as_ref()).cloned();
        carrier.state = non_empty(candidate.state.as_ref()).cloned();
        carrier.zip = non_empty(candidate.zip.as_ref()).cloned();
        carrier.equipment_types = candidate.equipment_types.clone();
        carrier.preferred_lanes = candidate.preferred_lanes.clone();
        carrier.stats = CarrierStats::default();
        carrier.first_contact_date = Some(call_date);
        carrier.last_contact_date = Some(call_date);
        carrier.last_used_date = Some(call_date);
        carrier.auto_created = true;
        carrier.needs_review = candidate.confidence < self.review_confidence_threshold;
        carrier.created_at = now;
        carrier.updated_at = now;
        carrier
    }

    fn update(
        mut carrier: CarrierEntity,
        candidate: &CarrierCandidate,
        now: DateTime<Utc>,
    ) -> (CarrierEntity, Vec<IgnoredAuthority>) {
        let call_date = candidate.context.call_date;
        let mut ignored = Vec::new();

        for (field, slot, incoming) in [
            ("mc_number", &mut carrier.mc_number, &candidate.mc_number),
            ("dot_number", &mut carrier.dot_number, &candidate.dot_number),
        ] {
            let Some(value) = incoming else { continue };
            if slot.is_none() {
                *slot = Some(value.clone());
            } else if let Some(current) = slot.as_ref().filter(|current| *current != value) {
                info!(
                    carrier_id = %carrier.id,
                    field,
                    existing = %current,
                    incoming = %value,
                    "Ignoring differing authority number on existing carrier"
                );
                ignored.push(IgnoredAuthority {
                    field,
                    existing: current.clone(),
                    incoming: value.clone(),
                });
            }
        }

        if carrier.company_name.is_none() {
            carrier.company_name = non_empty(candidate.company_name.as_ref()).cloned();
        }

        for (slot, incoming) in [
            (&mut carrier.dispatcher_name, &candidate.contact_name),
            (&mut carrier.dispatcher_email, &candidate.email),
            (&mut carrier.driver_name, &candidate.driver_name),
            (&mut carrier.driver_phone, &candidate.driver_phone),
        ] {
            if let Some(value) = non_empty(incoming.as_ref()) {
                *slot = Some(value.clone());
            }
        }

        if let Some(phone) = non_empty(candidate.phone.as_ref()) {
            let digits = phone_digits(phone);
            let known = [&carrier.dispatcher_phone, &carrier.alternate_phone]
                .iter()
                .any(|p| p.as_deref().is_some_and(|p| phone_digits(p) == digits));
            if carrier.dispatcher_phone.is_none() {
                carrier.dispatcher_phone = Some(phone.clone());
            } else if !known && carrier.alternate_phone.is_none() {
                carrier.alternate_phone = Some(phone.clone());
            }
        }

        if candidate.has_complete_address() {
            carrier.address = candidate.address.clone();
            carrier.city = candidate.city.clone();
            carrier.state = candidate.state.clone();
            if let Some(zip) = non_empty(candidate.zip.as_ref()) {
                carrier.zip = Some(zip.clone());
            }
        }

        carrier.equipment_types.extend(candidate.equipment_types.iter().copied());
        carrier.preferred_lanes.extend(candidate.preferred_lanes.iter().cloned());

        carrier.first_contact_date = earlier(carrier.first_contact_date, call_date);
        carrier.last_contact_date = later(carrier.last_contact_date, call_date);
        carrier.last_used_date = later(carrier.last_used_date, call_date);
        carrier.updated_at = now;

        (carrier, ignored)
    }
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self::new(40)
    }
}

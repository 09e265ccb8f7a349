//! Carrier candidate: the strict, ephemeral output of extraction normalization.
//!
//! A candidate is produced once per call, consumed by identity resolution
//! and merging, and never persisted as-is.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::carrier::{normalize_authority_number, phone_digits, EquipmentType, Lane};

/// Where a candidate field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOrigin {
    /// Stated in a structured extraction block.
    Explicit,
    /// Recovered by pattern scan or keyword lookup over free text.
    Inferred,
}

/// Candidate fields that carry provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateField {
    CompanyName,
    McNumber,
    DotNumber,
    ContactName,
    Phone,
    Email,
    DriverName,
    DriverPhone,
    Address,
    State,
    EquipmentTypes,
    PreferredLanes,
    QuotedRate,
    AvailableDate,
}

/// Call provenance attached to every candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub call_id: Uuid,
    pub organization_id: Uuid,
    pub call_date: DateTime<Utc>,
}

impl CallContext {
    pub fn new(organization_id: Uuid, call_date: DateTime<Utc>) -> Self {
        Self {
            call_id: Uuid::new_v4(),
            organization_id,
            call_date,
        }
    }
}

/// Proposed update to a carrier record, derived from one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierCandidate {
    pub context: CallContext,
    pub company_name: Option<String>,
    pub mc_number: Option<String>,
    pub dot_number: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub equipment_types: BTreeSet<EquipmentType>,
    pub preferred_lanes: BTreeSet<Lane>,
    pub quoted_rate: Option<f64>,
    pub available_date: Option<NaiveDate>,
    /// Load id taken from the call's reference numbers, when present.
    pub load_id: Option<Uuid>,
    /// Load number taken from the call's reference numbers, when present.
    pub load_number: Option<String>,
    pub origins: BTreeMap<CandidateField, FieldOrigin>,
    /// Advisory 0-100 completeness score.
    pub confidence: u8,
}

impl CarrierCandidate {
    /// An empty candidate for the given call.
    pub fn new(context: CallContext) -> Self {
        Self {
            context,
            company_name: None,
            mc_number: None,
            dot_number: None,
            contact_name: None,
            phone: None,
            email: None,
            driver_name: None,
            driver_phone: None,
            address: None,
            city: None,
            state: None,
            zip: None,
            equipment_types: BTreeSet::new(),
            preferred_lanes: BTreeSet::new(),
            quoted_rate: None,
            available_date: None,
            load_id: None,
            load_number: None,
            origins: BTreeMap::new(),
            confidence: 0,
        }
    }

    pub fn with_company_name(mut self, name: impl Into<String>) -> Self {
        self.company_name = Some(name.into());
        self.origins.insert(CandidateField::CompanyName, FieldOrigin::Explicit);
        self
    }

    /// Set the MC number, normalized to digits.
    pub fn with_mc_number(mut self, mc: &str) -> Self {
        self.mc_number = normalize_authority_number(mc);
        if self.mc_number.is_some() {
            self.origins.insert(CandidateField::McNumber, FieldOrigin::Explicit);
        }
        self
    }

    /// Set the DOT number, normalized to digits.
    pub fn with_dot_number(mut self, dot: &str) -> Self {
        self.dot_number = normalize_authority_number(dot);
        if self.dot_number.is_some() {
            self.origins.insert(CandidateField::DotNumber, FieldOrigin::Explicit);
        }
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self.origins.insert(CandidateField::Phone, FieldOrigin::Explicit);
        self
    }

    pub fn with_contact_name(mut self, name: impl Into<String>) -> Self {
        self.contact_name = Some(name.into());
        self.origins.insert(CandidateField::ContactName, FieldOrigin::Explicit);
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self.origins.insert(CandidateField::Email, FieldOrigin::Explicit);
        self
    }

    pub fn with_equipment(mut self, equipment: EquipmentType) -> Self {
        self.equipment_types.insert(equipment);
        self.origins.insert(CandidateField::EquipmentTypes, FieldOrigin::Explicit);
        self
    }

    pub fn with_lane(mut self, lane: Lane) -> Self {
        self.preferred_lanes.insert(lane);
        self.origins.insert(CandidateField::PreferredLanes, FieldOrigin::Explicit);
        self
    }

    pub fn with_address(
        mut self,
        address: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        self.address = Some(address.into());
        self.city = Some(city.into());
        self.state = Some(state.into());
        self.origins.insert(CandidateField::Address, FieldOrigin::Explicit);
        self.origins.insert(CandidateField::State, FieldOrigin::Explicit);
        self
    }

    pub fn with_quoted_rate(mut self, rate: f64) -> Self {
        self.quoted_rate = Some(rate);
        self.origins.insert(CandidateField::QuotedRate, FieldOrigin::Explicit);
        self
    }

    pub fn with_load_id(mut self, load_id: Uuid) -> Self {
        self.load_id = Some(load_id);
        self
    }

    /// True when identity resolution can find this candidate again: an MC or
    /// DOT number, or a phone of at least `min_phone_digits` digits.
    ///
    /// A company name alone is not a key, so replaying the call would create
    /// a second carrier.
    pub fn has_resolvable_key(&self, min_phone_digits: usize) -> bool {
        let has_authority = [&self.mc_number, &self.dot_number]
            .iter()
            .any(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()));
        has_authority
            || self
                .phone
                .as_deref()
                .is_some_and(|p| phone_digits(p).len() >= min_phone_digits)
    }

    /// True when street, city and state are all present.
    pub fn has_complete_address(&self) -> bool {
        [&self.address, &self.city, &self.state]
            .iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }

    pub fn origin_of(&self, field: CandidateField) -> Option<FieldOrigin> {
        self.origins.get(&field).copied()
    }
}

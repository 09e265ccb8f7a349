//! Turns a loose call extraction into a strict `CarrierCandidate`.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::models::{
    CallContext, CallExtraction, CandidateField, CarrierCandidate, EquipmentType, FieldOrigin, Lane, LooseScalar,
};
use crate::domain::ports::CandidateExtractor;
use crate::services::pattern_extractor::RegexCandidateExtractor;

/// Weight of each present field in the confidence score. Sums to 100.
const CONFIDENCE_WEIGHTS: &[(CandidateField, u32)] = &[
    (CandidateField::McNumber, 30),
    (CandidateField::CompanyName, 20),
    (CandidateField::Phone, 15),
    (CandidateField::ContactName, 10),
    (CandidateField::State, 5),
    (CandidateField::QuotedRate, 10),
    (CandidateField::Email, 3),
    (CandidateField::Address, 3),
    (CandidateField::EquipmentTypes, 2),
    (CandidateField::PreferredLanes, 2),
];

fn present(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Advisory 0-100 completeness score.
///
/// The authority weight counts when either the MC or the DOT number is known.
pub fn confidence_score(candidate: &CarrierCandidate) -> u8 {
    let total: u32 = CONFIDENCE_WEIGHTS.iter().map(|(_, w)| w).sum();
    let earned: u32 = CONFIDENCE_WEIGHTS
        .iter()
        .filter(|(field, _)| match field {
            CandidateField::McNumber => {
                present(candidate.mc_number.as_ref()) || present(candidate.dot_number.as_ref())
            }
            CandidateField::CompanyName => present(candidate.company_name.as_ref()),
            CandidateField::Phone => present(candidate.phone.as_ref()),
            CandidateField::ContactName => present(candidate.contact_name.as_ref()),
            CandidateField::State => present(candidate.state.as_ref()),
            CandidateField::QuotedRate => candidate.quoted_rate.is_some(),
            CandidateField::Email => present(candidate.email.as_ref()),
            CandidateField::Address => present(candidate.address.as_ref()),
            CandidateField::EquipmentTypes => !candidate.equipment_types.is_empty(),
            CandidateField::PreferredLanes => !candidate.preferred_lanes.is_empty(),
            _ => false,
        })
        .map(|(_, w)| w)
        .sum();

    ((f64::from(earned) / f64::from(total)) * 100.0).round() as u8
}

fn scalar(value: Option<&LooseScalar>) -> Option<String> {
    value.and_then(LooseScalar::as_text)
}

/// Builds candidates from structured blocks first, then lets the
/// extractor fill gaps from free text.
pub struct ExtractionNormalizer {
    extractor: Arc<dyn CandidateExtractor>,
}

impl ExtractionNormalizer {
    pub fn new(extractor: Arc<dyn CandidateExtractor>) -> Self {
        Self { extractor }
    }

    /// Normalize one call extraction.
    ///
    /// Returns `None` when the call is not carrier related: its `call_type`
    /// names another kind of call and it has no `carrier_information` block.
    /// Free-text numbers on such calls belong to shippers or customers.
    pub fn normalize(&self, extraction: &CallExtraction, context: CallContext) -> Option<CarrierCandidate> {
        let carrier_call = extraction
            .call_type
            .as_deref()
            .map_or(true, |t| t.to_lowercase().contains("carrier"));
        if !carrier_call && extraction.carrier_information.is_none() {
            tracing::debug!(call_id = %context.call_id, call_type = ?extraction.call_type, "Call is not carrier related");
            return None;
        }

        let mut candidate = CarrierCandidate::new(context);

        if let Some(info) = &extraction.carrier_information {
            let explicit = [
                (CandidateField::CompanyName, scalar(info.company_name.as_ref())),
                (CandidateField::ContactName, scalar(info.contact_name.as_ref())),
                (CandidateField::Phone, scalar(info.phone.as_ref())),
                (CandidateField::Email, scalar(info.email.as_ref()).map(|e| e.to_lowercase())),
                (CandidateField::DriverName, scalar(info.driver_name.as_ref())),
                (CandidateField::DriverPhone, scalar(info.driver_phone.as_ref())),
                (CandidateField::Address, scalar(info.address.as_ref())),
                (CandidateField::State, scalar(info.state.as_ref()).map(|s| s.to_uppercase())),
            ];
            for (field, value) in explicit {
                set_explicit(&mut candidate, field, value);
            }
            candidate.city = scalar(info.city.as_ref());
            candidate.zip = scalar(info.zip.as_ref());

            if let Some(mc) = scalar(info.mc_number.as_ref()) {
                candidate = candidate.with_mc_number(&mc);
            }
            if let Some(dot) = scalar(info.dot_number.as_ref()) {
                candidate = candidate.with_dot_number(&dot);
            }

            for mention in info.equipment_types.iter().flat_map(|list| list.iter()) {
                if let Some(equipment) = EquipmentType::from_mention(mention) {
                    candidate = candidate.with_equipment(equipment);
                }
            }

            candidate.available_date = info.availability_date.as_ref().and_then(LooseScalar::as_date);
            if candidate.available_date.is_some() {
                candidate.origins.insert(CandidateField::AvailableDate, FieldOrigin::Explicit);
            }
        }

        if let Some(refs) = &extraction.reference_numbers {
            if candidate.mc_number.is_none() {
                if let Some(mc) = scalar(refs.mc_number.as_ref()) {
                    candidate = candidate.with_mc_number(&mc);
                }
            }
            if candidate.dot_number.is_none() {
                if let Some(dot) = scalar(refs.dot_number.as_ref()) {
                    candidate = candidate.with_dot_number(&dot);
                }
            }
            if let Some(load_ref) = scalar(refs.load_id.as_ref()) {
                match Uuid::parse_str(&load_ref) {
                    Ok(load_id) => candidate.load_id = Some(load_id),
                    Err(_) => candidate.load_number = Some(load_ref),
                }
            }
            if candidate.load_number.is_none() {
                candidate.load_number = scalar(refs.load_number.as_ref());
            }
        }

        if let Some(route) = &extraction.route_details {
            let origin = scalar(route.origin_state.as_ref());
            let destination = scalar(route.destination_state.as_ref());
            if let (Some(o), Some(d)) = (origin, destination) {
                if let Some(lane) = Lane::new(&o, &d) {
                    candidate = candidate.with_lane(lane);
                }
            }
            if let Some(equipment) = scalar(route.equipment_type.as_ref()).and_then(|e| EquipmentType::from_mention(&e)) {
                candidate = candidate.with_equipment(equipment);
            }
        }

        if let Some(rate) = extraction
            .pricing
            .as_ref()
            .and_then(|p| p.quoted_rate.as_ref())
            .and_then(LooseScalar::as_f64)
            .filter(|r| *r > 0.0)
        {
            candidate = candidate.with_quoted_rate(rate);
        }

        self.extractor.enrich(&mut candidate, extraction);
        candidate.confidence = confidence_score(&candidate);
        Some(candidate)
    }
}

impl Default for ExtractionNormalizer {
    fn default() -> Self {
        Self::new(Arc::new(RegexCandidateExtractor::new()))
    }
}

fn set_explicit(candidate: &mut CarrierCandidate, field: CandidateField, value: Option<String>) {
    let Some(value) = value else { return };
    let slot = match field {
        CandidateField::CompanyName => &mut candidate.company_name,
        CandidateField::ContactName => &mut candidate.contact_name,
        CandidateField::Phone => &mut candidate.phone,
        CandidateField::Email => &mut candidate.email,
        CandidateField::DriverName => &mut candidate.driver_name,
        CandidateField::DriverPhone => &mut candidate.driver_phone,
        CandidateField::Address => &mut candidate.address,
        CandidateField::State => &mut candidate.state,
        _ => return,
    };
    *slot = Some(value);
    candidate.origins.insert(field, FieldOrigin::Explicit);
}

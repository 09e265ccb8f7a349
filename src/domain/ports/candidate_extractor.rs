//! Free-text candidate extraction port.

use crate::domain::models::{CallExtraction, CarrierCandidate};

/// Recovers carrier signals from the unstructured parts of a call extraction.
///
/// Implementations only fill scalar fields the candidate does not already
/// have; set-valued fields (equipment, lanes) are extended.
pub trait CandidateExtractor: Send + Sync {
    fn enrich(&self, candidate: &mut CarrierCandidate, extraction: &CallExtraction);
}

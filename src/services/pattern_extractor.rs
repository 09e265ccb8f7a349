//! Regex and keyword based candidate enrichment.

use regex::Regex;

use crate::domain::models::{
    normalize_authority_number, CallExtraction, CandidateField, CarrierCandidate, FieldOrigin, Lane,
    EQUIPMENT_SYNONYMS,
};
use crate::domain::ports::CandidateExtractor;

/// Scans key points and action items for authority numbers, phone and
/// email; summary and key points for equipment keywords; key points for
/// `XX to YY` lanes. The first match wins for scalar fields.
#[derive(Clone)]
pub struct RegexCandidateExtractor {
    mc_pattern: Regex,
    dot_pattern: Regex,
    phone_pattern: Regex,
    email_pattern: Regex,
    lane_pattern: Regex,
}

impl RegexCandidateExtractor {
    pub fn new() -> Self {
        let compile = |pattern: &str| Regex::new(pattern).expect("extraction pattern is valid");
        Self {
            // 5-7 digits after an MC token
            mc_pattern: compile(r"(?i)\bMC[\s#:\-]*(\d{5,7})\b"),
            // 6-8 digits after a DOT / USDOT token
            dot_pattern: compile(r"(?i)\b(?:US)?DOT[\s#:\-]*(\d{6,8})\b"),
            phone_pattern: compile(r"(?:^|[^\d])((?:\+?1[\s.\-]?)?\(?\d{3}\)?[\s.\-]?\d{3}[\s.\-]?\d{4})(?:[^\d]|$)"),
            email_pattern: compile(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}"),
            // State codes are uppercase in transcripts; lowercase "to" keeps prose out.
            lane_pattern: compile(r"\b([A-Z]{2})\s*(?:->|-|to|TO)\s*([A-Z]{2})\b"),
        }
    }

    fn first_capture<'a>(pattern: &Regex, texts: &[&'a str]) -> Option<&'a str> {
        texts
            .iter()
            .find_map(|text| pattern.captures(text).and_then(|caps| caps.get(1)).map(|m| m.as_str()))
    }

    /// Canonical equipment types mentioned anywhere in `text`.
    pub fn scan_equipment(text: &str) -> impl Iterator<Item = crate::domain::models::EquipmentType> + '_ {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let joined = format!(" {} ", words.join(" "));
        EQUIPMENT_SYNONYMS
            .iter()
            .filter(move |(keyword, _)| joined.contains(&format!(" {keyword} ")))
            .map(|(_, equipment)| *equipment)
    }

    /// Valid `XX-YY` lanes mentioned in `text`.
    pub fn scan_lanes<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Lane> + 'a {
        self.lane_pattern
            .captures_iter(text)
            .filter_map(|caps| Lane::new(&caps[1], &caps[2]))
    }
}

impl Default for RegexCandidateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn fill(candidate: &mut CarrierCandidate, field: CandidateField, value: Option<String>) {
    let Some(value) = value else { return };
    let slot = match field {
        CandidateField::McNumber => &mut candidate.mc_number,
        CandidateField::DotNumber => &mut candidate.dot_number,
        CandidateField::Phone => &mut candidate.phone,
        CandidateField::Email => &mut candidate.email,
        _ => return,
    };
    if slot.is_none() {
        *slot = Some(value);
        candidate.origins.insert(field, FieldOrigin::Inferred);
    }
}

impl CandidateExtractor for RegexCandidateExtractor {
    fn enrich(&self, candidate: &mut CarrierCandidate, extraction: &CallExtraction) {
        let free_text: Vec<&str> = extraction.free_text().collect();

        fill(
            candidate,
            CandidateField::McNumber,
            Self::first_capture(&self.mc_pattern, &free_text).and_then(normalize_authority_number),
        );
        fill(
            candidate,
            CandidateField::DotNumber,
            Self::first_capture(&self.dot_pattern, &free_text).and_then(normalize_authority_number),
        );
        fill(
            candidate,
            CandidateField::Phone,
            Self::first_capture(&self.phone_pattern, &free_text).map(|p| p.trim().to_string()),
        );
        fill(
            candidate,
            CandidateField::Email,
            free_text
                .iter()
                .find_map(|text| self.email_pattern.find(text))
                .map(|m| m.as_str().to_lowercase()),
        );

        let key_points: Vec<&str> = extraction.key_points.iter().flat_map(|k| k.iter()).collect();

        let equipment_text = extraction.summary.iter().map(String::as_str).chain(key_points.iter().copied());
        let mut equipment_found = false;
        for text in equipment_text {
            for equipment in Self::scan_equipment(text) {
                equipment_found |= candidate.equipment_types.insert(equipment);
            }
        }
        if equipment_found {
            candidate
                .origins
                .entry(CandidateField::EquipmentTypes)
                .or_insert(FieldOrigin::Inferred);
        }

        let mut lanes_found = false;
        for text in &key_points {
            for lane in self.scan_lanes(text) {
                lanes_found |= candidate.preferred_lanes.insert(lane);
            }
        }
        if lanes_found {
            candidate
                .origins
                .entry(CandidateField::PreferredLanes)
                .or_insert(FieldOrigin::Inferred);
        }
    }
}

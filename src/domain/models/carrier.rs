//! Carrier domain model.
//!
//! A carrier is the durable registry record for a trucking company. It is
//! created from the first call that mentions it (or by manual entry) and is
//! refined by every later call. Carriers are never hard-deleted; they move
//! between statuses instead.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::statistics::ZERO_HISTORY_PERFORMANCE_SCORE;

/// Two-letter codes accepted as lane endpoints (50 states plus DC).
pub const US_STATE_CODES: [&str; 51] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM",
    "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA",
    "WV", "WI", "WY",
];

/// Returns true when `code` is a known US state (or DC) abbreviation.
pub fn is_state_code(code: &str) -> bool {
    US_STATE_CODES.contains(&code)
}

/// Strip everything but ASCII digits from a phone number.
pub fn phone_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Normalize an MC or DOT number to its digits (`"MC-778899"` -> `"778899"`).
///
/// Returns `None` when no digits remain.
pub fn normalize_authority_number(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Trailer / equipment classes a carrier can run.
///
/// Ordering follows declaration order, which keeps equipment sets stable
/// when they are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EquipmentType {
    #[serde(rename = "Dry Van")]
    DryVan,
    #[serde(rename = "Reefer")]
    Reefer,
    #[serde(rename = "Flatbed")]
    Flatbed,
    #[serde(rename = "Step Deck")]
    StepDeck,
    #[serde(rename = "Lowboy")]
    Lowboy,
    #[serde(rename = "Conestoga")]
    Conestoga,
    #[serde(rename = "Tanker")]
    Tanker,
    #[serde(rename = "Power Only")]
    PowerOnly,
    #[serde(rename = "Hotshot")]
    Hotshot,
    #[serde(rename = "Box Truck")]
    BoxTruck,
}

/// Keyword table mapping spoken equipment mentions to their canonical type.
///
/// Multi-word phrases come before the single words they contain.
pub const EQUIPMENT_SYNONYMS: &[(&str, EquipmentType)] = &[
    ("dry van", EquipmentType::DryVan),
    ("van", EquipmentType::DryVan),
    ("reefer", EquipmentType::Reefer),
    ("refrigerated", EquipmentType::Reefer),
    ("temp controlled", EquipmentType::Reefer),
    ("flatbed", EquipmentType::Flatbed),
    ("flat bed", EquipmentType::Flatbed),
    ("step deck", EquipmentType::StepDeck),
    ("stepdeck", EquipmentType::StepDeck),
    ("drop deck", EquipmentType::StepDeck),
    ("lowboy", EquipmentType::Lowboy),
    ("low boy", EquipmentType::Lowboy),
    ("rgn", EquipmentType::Lowboy),
    ("conestoga", EquipmentType::Conestoga),
    ("tanker", EquipmentType::Tanker),
    ("power only", EquipmentType::PowerOnly),
    ("hotshot", EquipmentType::Hotshot),
    ("hot shot", EquipmentType::Hotshot),
    ("box truck", EquipmentType::BoxTruck),
    ("straight truck", EquipmentType::BoxTruck),
];

impl EquipmentType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DryVan => "Dry Van",
            Self::Reefer => "Reefer",
            Self::Flatbed => "Flatbed",
            Self::StepDeck => "Step Deck",
            Self::Lowboy => "Lowboy",
            Self::Conestoga => "Conestoga",
            Self::Tanker => "Tanker",
            Self::PowerOnly => "Power Only",
            Self::Hotshot => "Hotshot",
            Self::BoxTruck => "Box Truck",
        }
    }

    /// Map a single mention ("refrigerated", "Dry Van", "53' van") onto a type.
    ///
    /// The whole mention is lowercased and compared against the synonym
    /// table; a mention that merely contains a synonym as a word also maps.
    pub fn from_mention(mention: &str) -> Option<Self> {
        let lowered = mention.trim().to_lowercase();
        if lowered.is_empty() {
            return None;
        }
        if let Some((_, ty)) = EQUIPMENT_SYNONYMS.iter().find(|(kw, _)| *kw == lowered) {
            return Some(*ty);
        }
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let joined = format!(" {} ", words.join(" "));
        EQUIPMENT_SYNONYMS
            .iter()
            .find(|(kw, _)| joined.contains(&format!(" {kw} ")))
            .map(|(_, ty)| *ty)
    }
}

impl fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A preferred lane, rendered as `"XX-YY"` (origin state, destination state).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lane(String);

impl Lane {
    /// Build a lane from two state codes. Codes are uppercased; unknown codes
    /// and same-state pairs are rejected.
    pub fn new(origin: &str, destination: &str) -> Option<Self> {
        let origin = origin.trim().to_uppercase();
        let destination = destination.trim().to_uppercase();
        if origin == destination || !is_state_code(&origin) || !is_state_code(&destination) {
            return None;
        }
        Some(Self(format!("{origin}-{destination}")))
    }

    /// Parse an `"XX-YY"` token.
    pub fn parse(token: &str) -> Option<Self> {
        let (origin, destination) = token.split_once('-')?;
        Self::new(origin, destination)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CarrierStatus {
    #[default]
    Active,
    Blacklisted,
    Inactive,
}

impl CarrierStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Blacklisted => "blacklisted",
            Self::Inactive => "inactive",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "blacklisted" => Some(Self::Blacklisted),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }

    /// Blacklisting is reachable from any other status; leaving the
    /// blacklist is an explicit reinstatement back to active.
    pub fn can_transition_to(&self, new_status: Self) -> bool {
        matches!(
            (self, new_status),
            (Self::Active, Self::Inactive)
                | (Self::Inactive, Self::Active)
                | (Self::Active | Self::Inactive, Self::Blacklisted)
                | (Self::Blacklisted, Self::Active)
        )
    }
}

/// Rolling statistics cached on the carrier row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierStats {
    pub total_loads: u32,
    pub completed_loads: u32,
    pub on_time_percentage: f64,
    pub average_rate: Option<f64>,
    pub lifetime_revenue: f64,
    pub performance_score: u8,
}

impl Default for CarrierStats {
    fn default() -> Self {
        Self {
            total_loads: 0,
            completed_loads: 0,
            on_time_percentage: 100.0,
            average_rate: None,
            lifetime_revenue: 0.0,
            performance_score: ZERO_HISTORY_PERFORMANCE_SCORE,
        }
    }
}

/// Durable carrier record, scoped to one organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierEntity {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub company_name: Option<String>,
    /// Write-once: never cleared or replaced by a merge.
    pub mc_number: Option<String>,
    /// Write-once: never cleared or replaced by a merge.
    pub dot_number: Option<String>,
    pub dispatcher_name: Option<String>,
    pub dispatcher_phone: Option<String>,
    pub dispatcher_email: Option<String>,
    pub alternate_phone: Option<String>,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub equipment_types: BTreeSet<EquipmentType>,
    pub preferred_lanes: BTreeSet<Lane>,
    pub stats: CarrierStats,
    pub first_contact_date: Option<DateTime<Utc>>,
    pub last_contact_date: Option<DateTime<Utc>>,
    pub last_used_date: Option<DateTime<Utc>>,
    pub status: CarrierStatus,
    /// Created by the pipeline without human review.
    pub auto_created: bool,
    pub needs_review: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CarrierEntity {
    /// A blank active carrier for the given organization.
    pub fn new(organization_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            company_name: None,
            mc_number: None,
            dot_number: None,
            dispatcher_name: None,
            dispatcher_phone: None,
            dispatcher_email: None,
            alternate_phone: None,
            driver_name: None,
            driver_phone: None,
            address: None,
            city: None,
            state: None,
            zip: None,
            equipment_types: BTreeSet::new(),
            preferred_lanes: BTreeSet::new(),
            stats: CarrierStats::default(),
            first_contact_date: None,
            last_contact_date: None,
            last_used_date: None,
            status: CarrierStatus::Active,
            auto_created: false,
            needs_review: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Name for display: company name, else the best authority number.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.company_name {
            return name.clone();
        }
        match (&self.mc_number, &self.dot_number) {
            (Some(mc), _) => format!("MC {mc}"),
            (None, Some(dot)) => format!("DOT {dot}"),
            (None, None) => format!("Unnamed carrier {}", &self.id.to_string()[..8]),
        }
    }

    /// Move to a new status, enforcing the allowed transitions.
    pub fn transition_to(&mut self, new_status: CarrierStatus) -> Result<(), String> {
        if !self.status.can_transition_to(new_status) {
            return Err(format!(
                "cannot move carrier from {} to {}",
                self.status.as_str(),
                new_status.as_str()
            ));
        }
        self.status = new_status;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_authority_number() {
        assert_eq!(normalize_authority_number("MC-778899").as_deref(), Some("778899"));
        assert_eq!(normalize_authority_number(" 0123456 ").as_deref(), Some("0123456"));
        assert_eq!(normalize_authority_number("MC"), None);
    }

    #[test]
    fn test_phone_digits() {
        assert_eq!(phone_digits("(555) 201-3456"), "5552013456");
        assert_eq!(phone_digits("ext."), "");
    }

    #[test]
    fn test_equipment_from_mention() {
        assert_eq!(EquipmentType::from_mention("Dry Van"), Some(EquipmentType::DryVan));
        assert_eq!(EquipmentType::from_mention("refrigerated"), Some(EquipmentType::Reefer));
        assert_eq!(EquipmentType::from_mention("53' van"), Some(EquipmentType::DryVan));
        assert_eq!(EquipmentType::from_mention("advance"), None);
        assert_eq!(EquipmentType::from_mention(""), None);
    }

    #[test]
    fn test_equipment_serializes_as_label() {
        let json = serde_json::to_string(&EquipmentType::PowerOnly).unwrap();
        assert_eq!(json, "\"Power Only\"");
    }

    #[test]
    fn test_lane_validation() {
        assert_eq!(Lane::new("tx", "ca").map(|l| l.to_string()).as_deref(), Some("TX-CA"));
        assert!(Lane::new("TX", "TX").is_none());
        assert!(Lane::new("XX", "CA").is_none());
        assert_eq!(Lane::parse("GA-FL").map(|l| l.to_string()).as_deref(), Some("GA-FL"));
        assert!(Lane::parse("GAFL").is_none());
    }

    #[test]
    fn test_status_transitions() {
        assert!(CarrierStatus::Active.can_transition_to(CarrierStatus::Blacklisted));
        assert!(CarrierStatus::Inactive.can_transition_to(CarrierStatus::Blacklisted));
        assert!(CarrierStatus::Blacklisted.can_transition_to(CarrierStatus::Active));
        assert!(!CarrierStatus::Blacklisted.can_transition_to(CarrierStatus::Inactive));
        assert!(!CarrierStatus::Active.can_transition_to(CarrierStatus::Active));
    }

    #[test]
    fn test_new_carrier_defaults() {
        let carrier = CarrierEntity::new(Uuid::new_v4());
        assert_eq!(carrier.stats.total_loads, 0);
        assert!((carrier.stats.on_time_percentage - 100.0).abs() < f64::EPSILON);
        assert_eq!(carrier.stats.performance_score, 70);
        assert_eq!(carrier.status, CarrierStatus::Active);
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut carrier = CarrierEntity::new(Uuid::new_v4());
        carrier.dot_number = Some("1234567".to_string());
        assert_eq!(carrier.display_name(), "DOT 1234567");
        carrier.mc_number = Some("778899".to_string());
        assert_eq!(carrier.display_name(), "MC 778899");
        carrier.company_name = Some("Acme Freight".to_string());
        assert_eq!(carrier.display_name(), "Acme Freight");
    }
}

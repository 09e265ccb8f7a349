//! Loose shape of an upstream call extraction.
//!
//! The language-model pipeline produces best-effort JSON: any field may be
//! missing, scalars may arrive as numbers or strings, and list fields may be
//! a single string. This module absorbs that variability; nothing outside the
//! extraction normalizer sees these types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Parse `YYYY-MM-DD` (optionally followed by a time) or `MM/DD/YYYY`.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    trimmed
        .get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
        .or_else(|| NaiveDate::parse_from_str(trimmed, "%m/%d/%Y").ok())
}

/// A text field that may be a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextList {
    One(String),
    Many(Vec<String>),
}

impl Default for TextList {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl TextList {
    /// Iterate non-empty entries.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            Self::One(s) => Box::new(std::iter::once(s.as_str()).filter(|s| !s.trim().is_empty())),
            Self::Many(items) => Box::new(
                items
                    .iter()
                    .map(String::as_str)
                    .filter(|s| !s.trim().is_empty()),
            ),
        }
    }
}

/// A scalar that may be serialized as a string or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseScalar {
    Text(String),
    Number(serde_json::Number),
}

impl LooseScalar {
    /// Trimmed textual form; `None` when blank.
    pub fn as_text(&self) -> Option<String> {
        let text = match self {
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => n.to_string(),
        };
        if text.is_empty() || text.eq_ignore_ascii_case("null") || text.eq_ignore_ascii_case("n/a")
        {
            None
        } else {
            Some(text)
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        self.as_text().as_deref().and_then(parse_calendar_date)
    }

    /// Numeric form, tolerating currency formatting such as `"$1,850.00"`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::Text(s) => {
                let cleaned: String = s
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                    .collect();
                cleaned.parse::<f64>().ok()
            }
        }
    }
}

/// Carrier details stated explicitly during the call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarrierInformation {
    #[serde(alias = "carrier_name", alias = "name")]
    pub company_name: Option<LooseScalar>,
    #[serde(alias = "mc")]
    pub mc_number: Option<LooseScalar>,
    #[serde(alias = "dot", alias = "usdot")]
    pub dot_number: Option<LooseScalar>,
    #[serde(alias = "dispatcher_name")]
    pub contact_name: Option<LooseScalar>,
    #[serde(alias = "dispatcher_phone", alias = "phone_number")]
    pub phone: Option<LooseScalar>,
    #[serde(alias = "dispatcher_email")]
    pub email: Option<LooseScalar>,
    pub driver_name: Option<LooseScalar>,
    pub driver_phone: Option<LooseScalar>,
    pub address: Option<LooseScalar>,
    pub city: Option<LooseScalar>,
    pub state: Option<LooseScalar>,
    pub zip: Option<LooseScalar>,
    #[serde(alias = "equipment", alias = "equipment_type")]
    pub equipment_types: Option<TextList>,
    #[serde(alias = "availability", alias = "available_date")]
    pub availability_date: Option<LooseScalar>,
}

/// Route details mentioned on the call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteDetails {
    pub origin_city: Option<LooseScalar>,
    pub origin_state: Option<LooseScalar>,
    pub destination_city: Option<LooseScalar>,
    pub destination_state: Option<LooseScalar>,
    pub equipment_type: Option<LooseScalar>,
}

/// Pricing discussed on the call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pricing {
    #[serde(alias = "carrier_rate", alias = "rate")]
    pub quoted_rate: Option<LooseScalar>,
    pub rate_per_mile: Option<LooseScalar>,
}

/// Reference numbers mentioned on the call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceNumbers {
    pub load_id: Option<LooseScalar>,
    #[serde(alias = "load_reference")]
    pub load_number: Option<LooseScalar>,
    pub mc_number: Option<LooseScalar>,
    pub dot_number: Option<LooseScalar>,
}

/// A freight-call extraction, as produced upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallExtraction {
    pub call_type: Option<String>,
    pub summary: Option<String>,
    pub key_points: Option<TextList>,
    pub action_items: Option<TextList>,
    pub carrier_information: Option<CarrierInformation>,
    pub route_details: Option<RouteDetails>,
    pub pricing: Option<Pricing>,
    pub reference_numbers: Option<ReferenceNumbers>,
}

impl CallExtraction {
    /// Free-text fields scanned for patterns, key points before action items.
    pub fn free_text(&self) -> impl Iterator<Item = &str> {
        self.key_points
            .iter()
            .flat_map(TextList::iter)
            .chain(self.action_items.iter().flat_map(TextList::iter))
    }
}

//! Load records, as far as the carrier registry reads and writes them.
//!
//! Loads are owned by the surrounding TMS; the registry reads their history
//! for statistics and writes back only the carrier link and quoted details.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Load lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    #[default]
    Available,
    Booked,
    Dispatched,
    InTransit,
    Delivered,
    Completed,
    Cancelled,
}

impl LoadStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Booked => "booked",
            Self::Dispatched => "dispatched",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "available" | "open" => Some(Self::Available),
            "booked" | "covered" => Some(Self::Booked),
            "dispatched" => Some(Self::Dispatched),
            "in_transit" => Some(Self::InTransit),
            "delivered" => Some(Self::Delivered),
            "completed" => Some(Self::Completed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Delivered or completed: the freight reached its destination.
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Delivered | Self::Completed)
    }
}

/// A load as read from the load table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRecord {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub load_number: Option<String>,
    pub status: LoadStatus,
    pub carrier_id: Option<Uuid>,
    pub rate_to_carrier: Option<f64>,
    pub quoted_rate: Option<f64>,
    pub margin: Option<f64>,
    pub equipment_type: Option<String>,
    pub origin_state: Option<String>,
    pub destination_state: Option<String>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub actual_delivery_date: Option<DateTime<Utc>>,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoadRecord {
    pub fn new(organization_id: Uuid, status: LoadStatus) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            load_number: None,
            status,
            carrier_id: None,
            rate_to_carrier: None,
            quoted_rate: None,
            margin: None,
            equipment_type: None,
            origin_state: None,
            destination_state: None,
            delivery_date: None,
            actual_delivery_date: None,
            driver_name: None,
            driver_phone: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// `"XX-YY"` lane key when both states are known.
    pub fn lane_key(&self) -> Option<String> {
        match (&self.origin_state, &self.destination_state) {
            (Some(o), Some(d)) if !o.trim().is_empty() && !d.trim().is_empty() => Some(format!(
                "{}-{}",
                o.trim().to_uppercase(),
                d.trim().to_uppercase()
            )),
            _ => None,
        }
    }

    /// A finished load is on time unless both dates are known and the
    /// actual delivery is later than scheduled.
    pub fn delivered_on_time(&self) -> bool {
        match (self.actual_delivery_date, self.delivery_date) {
            (Some(actual), Some(scheduled)) => actual <= scheduled,
            _ => true,
        }
    }
}

/// Details written onto a load when a carrier is linked to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadCarrierLink {
    pub quoted_rate: Option<f64>,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_on_time_defaults_when_dates_missing() {
        let mut load = LoadRecord::new(Uuid::new_v4(), LoadStatus::Delivered);
        assert!(load.delivered_on_time());
        load.delivery_date = Some(Utc::now());
        assert!(load.delivered_on_time());
    }

    #[test]
    fn test_late_delivery() {
        let mut load = LoadRecord::new(Uuid::new_v4(), LoadStatus::Completed);
        let scheduled = Utc::now();
        load.delivery_date = Some(scheduled);
        load.actual_delivery_date = Some(scheduled + Duration::hours(3));
        assert!(!load.delivered_on_time());
        load.actual_delivery_date = Some(scheduled);
        assert!(load.delivered_on_time());
    }

    #[test]
    fn test_status_parsing_accepts_variants() {
        assert_eq!(LoadStatus::from_str("Canceled"), Some(LoadStatus::Cancelled));
        assert_eq!(LoadStatus::from_str("in-transit"), Some(LoadStatus::InTransit));
        assert_eq!(LoadStatus::from_str("lost"), None);
    }

    #[test]
    fn test_lane_key() {
        let mut load = LoadRecord::new(Uuid::new_v4(), LoadStatus::Booked);
        assert_eq!(load.lane_key(), None);
        load.origin_state = Some("tx".to_string());
        load.destination_state = Some("CA".to_string());
        assert_eq!(load.lane_key().as_deref(), Some("TX-CA"));
    }
}

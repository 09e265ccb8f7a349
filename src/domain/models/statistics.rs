//! Carrier performance statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::carrier::CarrierStats;

/// Score reported for a carrier with no load history, in place of the blend.
///
/// The blend of neutral signals with no experience is 90, which would rank an
/// unknown carrier above most proven ones.
pub const ZERO_HISTORY_PERFORMANCE_SCORE: u8 = 70;

const ON_TIME_WEIGHT: f64 = 0.4;
const COMPLETION_WEIGHT: f64 = 0.3;
const CANCELLATION_WEIGHT: f64 = 0.2;
const EXPERIENCE_WEIGHT: f64 = 0.1;

/// Cancellations are penalised ten times their raw rate.
const CANCELLATION_MULTIPLIER: f64 = 10.0;

/// Each load adds two experience points, saturating at 50 loads.
const EXPERIENCE_POINTS_PER_LOAD: f64 = 2.0;

/// Blend the four performance signals into a 0-100 score.
///
/// `on_time_pct`, `completion_pct` and `cancellation_pct` are percentages in
/// 0..=100. The result is rounded and clamped to 0..=100.
pub fn performance_score(
    on_time_pct: f64,
    completion_pct: f64,
    cancellation_pct: f64,
    total_loads: u32,
) -> u8 {
    let cancellation_term = CANCELLATION_MULTIPLIER.mul_add(-cancellation_pct, 100.0).max(0.0);
    let experience_term = (f64::from(total_loads) * EXPERIENCE_POINTS_PER_LOAD).min(100.0);

    let score = ON_TIME_WEIGHT * on_time_pct
        + COMPLETION_WEIGHT * completion_pct
        + CANCELLATION_WEIGHT * cancellation_term
        + EXPERIENCE_WEIGHT * experience_term;

    score.round().clamp(0.0, 100.0) as u8
}

/// A `{key, count}` frequency pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyCount {
    pub key: String,
    pub count: u32,
}

/// Everything the statistics engine derives from one carrier's load history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierStatisticsSnapshot {
    pub carrier_id: Uuid,
    pub total_loads: u32,
    pub completed_loads: u32,
    pub cancelled_loads: u32,
    pub delivered_loads: u32,
    pub on_time_percentage: f64,
    pub completion_rate: f64,
    pub cancellation_rate: f64,
    pub average_rate: Option<f64>,
    pub lifetime_revenue: f64,
    pub average_margin: Option<f64>,
    pub top_equipment: Vec<FrequencyCount>,
    pub top_lanes: Vec<FrequencyCount>,
    pub performance_score: u8,
    pub computed_at: DateTime<Utc>,
}

impl CarrierStatisticsSnapshot {
    /// The subset cached on the carrier row.
    pub fn cached_stats(&self) -> CarrierStats {
        CarrierStats {
            total_loads: self.total_loads,
            completed_loads: self.completed_loads,
            on_time_percentage: self.on_time_percentage,
            average_rate: self.average_rate,
            lifetime_revenue: self.lifetime_revenue,
            performance_score: self.performance_score,
        }
    }
}

//! Derives performance statistics from a carrier's load history.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    performance_score, CarrierStatisticsSnapshot, EquipmentType, FrequencyCount, LoadRecord, LoadStatus,
    ZERO_HISTORY_PERFORMANCE_SCORE,
};
use crate::domain::ports::{CarrierRepository, LoadRepository};

const TOP_EQUIPMENT: usize = 3;
const TOP_LANES: usize = 5;

fn percentage(part: u32, whole: u32) -> f64 {
    f64::from(part) / f64::from(whole) * 100.0
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Count keys and keep the `limit` most frequent, ties in first-seen order.
fn top_by_frequency(keys: impl Iterator<Item = String>, limit: usize) -> Vec<FrequencyCount> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, u32> = HashMap::new();
    for key in keys {
        let count = counts.entry(key.clone()).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += 1;
    }

    let mut ranked: Vec<FrequencyCount> = order
        .into_iter()
        .map(|key| {
            let count = counts.get(&key).copied().unwrap_or_default();
            FrequencyCount { key, count }
        })
        .collect();
    // sort_by is stable, so equal counts keep first-seen order
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}

/// Canonical equipment label, falling back to the raw trimmed value.
fn equipment_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(
        EquipmentType::from_mention(trimmed)
            .map_or_else(|| trimmed.to_string(), |e| e.as_str().to_string()),
    )
}

/// Pure statistics over a load history.
pub fn compute_statistics(
    carrier_id: Uuid,
    loads: &[LoadRecord],
    computed_at: DateTime<Utc>,
) -> CarrierStatisticsSnapshot {
    let total_loads = loads.len() as u32;
    let completed_loads = loads.iter().filter(|l| l.status.is_finished()).count() as u32;
    let cancelled_loads = loads.iter().filter(|l| l.status == LoadStatus::Cancelled).count() as u32;
    let delivered_loads = loads.iter().filter(|l| l.status == LoadStatus::Delivered).count() as u32;

    let finished: Vec<&LoadRecord> = loads.iter().filter(|l| l.status.is_finished()).collect();
    let on_time_percentage = if finished.is_empty() {
        100.0
    } else {
        let on_time = finished.iter().filter(|l| l.delivered_on_time()).count() as u32;
        percentage(on_time, finished.len() as u32)
    };

    let (completion_rate, cancellation_rate) = if total_loads == 0 {
        (100.0, 0.0)
    } else {
        (
            percentage(completed_loads, total_loads),
            percentage(cancelled_loads, total_loads),
        )
    };

    let rates: Vec<f64> = loads.iter().filter_map(|l| l.rate_to_carrier).collect();
    let margins: Vec<f64> = loads.iter().filter_map(|l| l.margin).collect();

    let top_equipment = top_by_frequency(
        loads
            .iter()
            .filter_map(|l| l.equipment_type.as_deref().and_then(equipment_key)),
        TOP_EQUIPMENT,
    );
    let top_lanes = top_by_frequency(loads.iter().filter_map(LoadRecord::lane_key), TOP_LANES);

    CarrierStatisticsSnapshot {
        carrier_id,
        total_loads,
        completed_loads,
        cancelled_loads,
        delivered_loads,
        on_time_percentage,
        completion_rate,
        cancellation_rate,
        average_rate: mean(&rates),
        lifetime_revenue: rates.iter().sum(),
        average_margin: mean(&margins),
        top_equipment,
        top_lanes,
        performance_score: if total_loads == 0 {
            ZERO_HISTORY_PERFORMANCE_SCORE
        } else {
            performance_score(on_time_percentage, completion_rate, cancellation_rate, total_loads)
        },
        computed_at,
    }
}

/// Recomputes and caches carrier statistics.
///
/// Recomputation is an overwrite of the cached columns, so running it twice
/// over the same history is harmless.
pub struct StatisticsEngine {
    carriers: Arc<dyn CarrierRepository>,
    loads: Arc<dyn LoadRepository>,
}

impl StatisticsEngine {
    pub fn new(carriers: Arc<dyn CarrierRepository>, loads: Arc<dyn LoadRepository>) -> Self {
        Self { carriers, loads }
    }

    /// Compute from the current load history without writing anything.
    pub async fn snapshot(&self, carrier_id: Uuid) -> DomainResult<CarrierStatisticsSnapshot> {
        let history = self
            .loads
            .list_load_history(carrier_id)
            .await
            .map_err(|e| DomainError::StatisticsUnavailable {
                carrier_id,
                reason: e.to_string(),
            })?;
        Ok(compute_statistics(carrier_id, &history, Utc::now()))
    }

    /// Compute and persist the cached statistics columns.
    ///
    /// A failed history read returns `StatisticsUnavailable` and leaves the
    /// previously cached values untouched.
    #[instrument(skip(self), err)]
    pub async fn recompute(&self, carrier_id: Uuid) -> DomainResult<CarrierStatisticsSnapshot> {
        let snapshot = self.snapshot(carrier_id).await.inspect_err(|e| {
            warn!(carrier_id = %carrier_id, error = %e, "Keeping cached statistics");
        })?;
        self.carriers
            .update_statistics(carrier_id, &snapshot.cached_stats())
            .await?;
        Ok(snapshot)
    }
}

//! Criterion benchmarks for the pure scoring paths.
//!
//! - `compute_statistics` over 10, 100 and 1000 loads
//! - `RiskAssessor::assess` on a clean and a flagged snapshot

use chrono::{Duration, NaiveDate, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use uuid::Uuid;

use carrier_registry::domain::models::{
    AuthoritySnapshot, LoadRecord, LoadStatus, OperatingStatus, SafetyRating,
};
use carrier_registry::services::{compute_statistics, RiskAssessor};

const STATES: [&str; 6] = ["TX", "CA", "IL", "GA", "OH", "AZ"];
const EQUIPMENT: [&str; 4] = ["Dry Van", "reefer", "Flatbed", "53' van"];

/// Mixed history: mostly completed, some late, some cancelled.
fn make_history(count: usize) -> Vec<LoadRecord> {
    let org = Uuid::new_v4();
    let scheduled = Utc::now();
    (0..count)
        .map(|i| {
            let status = match i % 10 {
                0 => LoadStatus::Cancelled,
                1 => LoadStatus::InTransit,
                2 | 3 => LoadStatus::Delivered,
                _ => LoadStatus::Completed,
            };
            let mut load = LoadRecord::new(org, status);
            load.load_number = Some(format!("LD-{i:05}"));
            load.rate_to_carrier = Some(1200.0 + (i % 17) as f64 * 75.0);
            load.margin = Some(150.0 + (i % 5) as f64 * 20.0);
            load.equipment_type = Some(EQUIPMENT[i % EQUIPMENT.len()].to_string());
            load.origin_state = Some(STATES[i % STATES.len()].to_string());
            load.destination_state = Some(STATES[(i * 7 + 1) % STATES.len()].to_string());
            load.delivery_date = Some(scheduled);
            load.actual_delivery_date = Some(scheduled + Duration::hours((i % 7) as i64 - 4));
            load
        })
        .collect()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default()
}

fn clean_snapshot() -> AuthoritySnapshot {
    AuthoritySnapshot {
        source: "bench".to_string(),
        operating_status: OperatingStatus::Authorized,
        safety_rating: Some(SafetyRating::Satisfactory),
        liability_insurance_on_file: Some(1000),
        liability_insurance_required: Some(750),
        cargo_insurance_on_file: Some(100),
        authority_granted_on: Some(today() - Duration::days(2000)),
        record_updated_on: Some(today() - Duration::days(60)),
        vehicle_oos_rate: Some(8.0),
        vehicle_oos_national_average: Some(20.72),
        driver_oos_rate: Some(1.5),
        driver_oos_national_average: Some(5.51),
        total_crashes: Some(1),
        fatal_crashes: Some(0),
        ..AuthoritySnapshot::default()
    }
}

fn flagged_snapshot() -> AuthoritySnapshot {
    AuthoritySnapshot {
        operating_status: OperatingStatus::OutOfService,
        out_of_service_date: Some(today() - Duration::days(10)),
        safety_rating: Some(SafetyRating::Conditional),
        liability_insurance_on_file: Some(300),
        cargo_insurance_on_file: Some(0),
        authority_granted_on: Some(today() - Duration::days(30)),
        record_updated_on: Some(today() - Duration::days(900)),
        vehicle_oos_rate: Some(41.0),
        driver_oos_rate: Some(12.0),
        total_crashes: Some(9),
        fatal_crashes: Some(1),
        ..clean_snapshot()
    }
}

fn bench_compute_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_statistics");
    let carrier_id = Uuid::new_v4();
    let now = Utc::now();

    for size in [10usize, 100, 1000] {
        let history = make_history(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &history, |b, loads| {
            b.iter(|| compute_statistics(black_box(carrier_id), black_box(loads), now));
        });
    }

    group.finish();
}

fn bench_risk_assessment(c: &mut Criterion) {
    let mut group = c.benchmark_group("risk_assess");
    let assessor = RiskAssessor::default();
    let day = today();

    let clean = clean_snapshot();
    group.bench_function("clean", |b| {
        b.iter(|| assessor.assess(black_box(&clean), day));
    });

    let flagged = flagged_snapshot();
    group.bench_function("flagged", |b| {
        b.iter(|| assessor.assess(black_box(&flagged), day));
    });

    group.finish();
}

criterion_group!(benches, bench_compute_statistics, bench_risk_assessment);
criterion_main!(benches);

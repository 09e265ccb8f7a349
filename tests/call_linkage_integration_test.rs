//! End-to-end call linkage scenarios against a migrated `SQLite` registry.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use carrier_registry::domain::errors::{DomainError, DomainResult};
use carrier_registry::domain::models::{
    CarrierEntity, CarrierStats, EquipmentType, IdentityConfig, InteractionKind, LinkageConfig, LoadCarrierLink,
    LoadRecord, LoadStatus,
};
use carrier_registry::domain::ports::{CarrierFilter, CarrierRepository, InteractionLog, LoadRepository};
use carrier_registry::services::CallLinkageCoordinator;
use common::{carrier_call, context, TestRegistry};
use serde_json::json;
use uuid::Uuid;

async fn carriers_in(registry: &TestRegistry, org: Uuid) -> Vec<CarrierEntity> {
    registry
        .carriers
        .list(CarrierFilter {
            organization_id: Some(org),
            ..CarrierFilter::default()
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_new_carrier_from_empty_registry() {
    let registry = TestRegistry::in_memory().await;
    let coordinator = registry.coordinator();
    let org = Uuid::new_v4();

    let extraction = carrier_call(json!({
        "mc_number": "MC-778899",
        "company_name": "Acme Freight",
        "phone": "555-201-3456",
    }));
    let result = coordinator
        .process_call(&extraction, context(org), None)
        .await
        .unwrap()
        .unwrap();

    assert!(result.is_new);
    let carrier = registry.carriers.get(result.carrier_id).await.unwrap().unwrap();
    assert!(carrier.auto_created);
    assert_eq!(carrier.mc_number.as_deref(), Some("778899"));
    assert_eq!(carrier.stats.total_loads, 0);
    assert_eq!(carrier.stats.performance_score, 70);
    assert_eq!(result.statistics.unwrap().performance_score, 70);
}

#[tokio::test]
async fn test_same_candidate_twice_creates_one_carrier() {
    let registry = TestRegistry::in_memory().await;
    let coordinator = registry.coordinator();
    let org = Uuid::new_v4();
    let extraction = carrier_call(json!({"mc_number": "MC-778899", "company_name": "Acme Freight"}));

    let first = coordinator.process_call(&extraction, context(org), None).await.unwrap().unwrap();
    let second = coordinator.process_call(&extraction, context(org), None).await.unwrap().unwrap();

    assert!(first.is_new);
    assert!(!second.is_new);
    assert_eq!(first.carrier_id, second.carrier_id);
    assert_eq!(carriers_in(&registry, org).await.len(), 1);
}

#[tokio::test]
async fn test_phone_match_unions_equipment_and_keeps_mc() {
    let registry = TestRegistry::in_memory().await;
    let coordinator = registry.coordinator();
    let org = Uuid::new_v4();

    let first = carrier_call(json!({
        "mc_number": "MC-778899",
        "company_name": "Acme Freight",
        "phone": "555-201-3456",
        "equipment_types": ["Dry Van"],
    }));
    let created = coordinator.process_call(&first, context(org), None).await.unwrap().unwrap();

    let by_phone = carrier_call(json!({"phone": "5552013456", "equipment_types": ["Reefer"]}));
    let updated = coordinator.process_call(&by_phone, context(org), None).await.unwrap().unwrap();
    assert_eq!(updated.carrier_id, created.carrier_id);
    assert!(!updated.is_new);

    let carrier = registry.carriers.get(created.carrier_id).await.unwrap().unwrap();
    assert_eq!(carrier.mc_number.as_deref(), Some("778899"));
    assert_eq!(
        carrier.equipment_types.iter().copied().collect::<Vec<_>>(),
        vec![EquipmentType::DryVan, EquipmentType::Reefer]
    );

    // Applying the same candidate again does not grow the set.
    coordinator.process_call(&by_phone, context(org), None).await.unwrap();
    let carrier = registry.carriers.get(created.carrier_id).await.unwrap().unwrap();
    assert_eq!(carrier.equipment_types.len(), 2);
}

#[tokio::test]
async fn test_authority_numbers_are_write_once() {
    let registry = TestRegistry::in_memory().await;
    let coordinator = registry.coordinator();
    let org = Uuid::new_v4();

    let first = carrier_call(json!({"mc_number": "123456", "dot_number": "1111111"}));
    let created = coordinator.process_call(&first, context(org), None).await.unwrap().unwrap();

    let second = carrier_call(json!({"mc_number": "123456", "dot_number": "2222222"}));
    coordinator.process_call(&second, context(org), None).await.unwrap();

    let carrier = registry.carriers.get(created.carrier_id).await.unwrap().unwrap();
    assert_eq!(carrier.dot_number.as_deref(), Some("1111111"));

    let interactions = registry.interactions.list_for_carrier(created.carrier_id).await.unwrap();
    let noted = interactions.iter().find(|i| i.kind == InteractionKind::Updated).unwrap();
    assert!(noted.note.as_deref().unwrap().contains("2222222"));
}

#[tokio::test]
async fn test_phone_conflict_is_surfaced_and_logged() {
    let registry = TestRegistry::in_memory().await;
    let coordinator = registry.coordinator();
    let org = Uuid::new_v4();

    let first = carrier_call(json!({"mc_number": "111111", "phone": "555-201-3456"}));
    let existing = coordinator.process_call(&first, context(org), None).await.unwrap().unwrap();

    let clash = carrier_call(json!({"mc_number": "222222", "phone": "(555) 201-3456"}));
    let err = coordinator.process_call(&clash, context(org), None).await.unwrap_err();
    assert!(matches!(err, DomainError::IdentityConflict { phone_match, .. } if phone_match == existing.carrier_id));

    assert_eq!(carriers_in(&registry, org).await.len(), 1);
    let interactions = registry.interactions.list_for_carrier(existing.carrier_id).await.unwrap();
    assert!(interactions.iter().any(|i| i.kind == InteractionKind::Conflict));
}

#[tokio::test]
async fn test_concurrent_creates_resolve_to_one_carrier() {
    let registry = TestRegistry::on_disk().await;
    let left = registry.coordinator();
    let right = registry.coordinator();
    let org = Uuid::new_v4();

    let a = carrier_call(json!({"mc_number": "MC-445566", "company_name": "Race Freight", "equipment_types": "flatbed"}));
    let b = carrier_call(json!({"mc_number": "445566", "phone": "555-777-1212", "equipment_types": "reefer"}));

    let (ra, rb) = tokio::join!(
        left.process_call(&a, context(org), None),
        right.process_call(&b, context(org), None),
    );
    let ra = ra.unwrap().unwrap();
    let rb = rb.unwrap().unwrap();

    assert_eq!(ra.carrier_id, rb.carrier_id);
    assert_eq!(usize::from(ra.is_new) + usize::from(rb.is_new), 1);

    let carriers = carriers_in(&registry, org).await;
    assert_eq!(carriers.len(), 1);
    let carrier = &carriers[0];
    assert_eq!(carrier.company_name.as_deref(), Some("Race Freight"));
    assert_eq!(carrier.dispatcher_phone.as_deref(), Some("555-777-1212"));
    assert!(carrier.equipment_types.contains(&EquipmentType::Flatbed));
    assert!(carrier.equipment_types.contains(&EquipmentType::Reefer));
}

/// Load repository whose history reads always fail.
struct BrokenHistory {
    inner: Arc<dyn LoadRepository>,
}

#[async_trait]
impl LoadRepository for BrokenHistory {
    async fn create(&self, load: &LoadRecord) -> DomainResult<()> {
        self.inner.create(load).await
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<LoadRecord>> {
        self.inner.get(id).await
    }

    async fn find_by_load_number(&self, organization_id: Uuid, load_number: &str) -> DomainResult<Option<LoadRecord>> {
        self.inner.find_by_load_number(organization_id, load_number).await
    }

    async fn list_load_history(&self, _carrier_id: Uuid) -> DomainResult<Vec<LoadRecord>> {
        Err(DomainError::DatabaseError("history table unavailable".to_string()))
    }

    async fn update_carrier_link(&self, load_id: Uuid, carrier_id: Uuid, link: &LoadCarrierLink) -> DomainResult<()> {
        self.inner.update_carrier_link(load_id, carrier_id, link).await
    }
}

#[tokio::test]
async fn test_statistics_failure_keeps_cached_values() {
    let registry = TestRegistry::in_memory().await;
    let org = Uuid::new_v4();

    let mut carrier = CarrierEntity::new(org);
    carrier.mc_number = Some("334455".to_string());
    registry.carriers.create(&carrier).await.unwrap();
    let cached = CarrierStats {
        total_loads: 12,
        completed_loads: 11,
        on_time_percentage: 90.0,
        average_rate: Some(2100.0),
        lifetime_revenue: 23_100.0,
        performance_score: 88,
    };
    registry.carriers.update_statistics(carrier.id, &cached).await.unwrap();

    let coordinator = CallLinkageCoordinator::new(
        registry.carriers.clone(),
        Arc::new(BrokenHistory {
            inner: registry.loads.clone(),
        }),
        registry.interactions.clone(),
        IdentityConfig::default(),
        &LinkageConfig::default(),
    );
    let extraction = carrier_call(json!({"mc_number": "MC 334455", "contact_name": "Dana"}));
    let result = coordinator.process_call(&extraction, context(org), None).await.unwrap().unwrap();

    assert!(!result.is_new);
    assert!(result.statistics.is_none());
    let stored = registry.carriers.get(carrier.id).await.unwrap().unwrap();
    assert_eq!(stored.stats, cached);
    assert_eq!(stored.dispatcher_name.as_deref(), Some("Dana"));
}

#[tokio::test]
async fn test_statistics_follow_linked_loads() {
    let registry = TestRegistry::in_memory().await;
    let coordinator = registry.coordinator();
    let org = Uuid::new_v4();

    let mut delivered = LoadRecord::new(org, LoadStatus::Delivered);
    delivered.rate_to_carrier = Some(2000.0);
    registry.loads.create(&delivered).await.unwrap();
    let mut booked = LoadRecord::new(org, LoadStatus::Booked);
    booked.load_number = Some("LD-1042".to_string());
    registry.loads.create(&booked).await.unwrap();

    let first = carrier_call(json!({"mc_number": "556677"}));
    let result = coordinator
        .process_call(&first, context(org), Some(delivered.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.load_id, Some(delivered.id));
    assert_eq!(result.statistics.as_ref().unwrap().total_loads, 1);

    let mut second: carrier_registry::domain::models::CallExtraction = carrier_call(json!({"mc_number": "556677"}));
    second.reference_numbers = Some(serde_json::from_value(json!({"load_number": "LD-1042"})).unwrap());
    second.pricing = Some(serde_json::from_value(json!({"quoted_rate": "$1,850"})).unwrap());
    let result = coordinator.process_call(&second, context(org), None).await.unwrap().unwrap();

    assert_eq!(result.load_id, Some(booked.id));
    let stats = result.statistics.unwrap();
    assert_eq!(stats.total_loads, 2);
    let load = registry.loads.get(booked.id).await.unwrap().unwrap();
    assert_eq!(load.carrier_id, Some(result.carrier_id));
    assert_eq!(load.quoted_rate, Some(1850.0));
}

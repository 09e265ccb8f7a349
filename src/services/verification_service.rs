//! Cached authority verification with risk scoring.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AuthorityQuery, VerificationFailure, VerificationOutcome, VerificationRecord,
};
use crate::domain::ports::{AuthorityLookup, AuthoritySource, CarrierRepository, VerificationRepository};
use crate::services::risk_assessor::RiskAssessor;

/// Counts from one pass over expired cache entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub examined: usize,
    pub refreshed: usize,
    pub not_found: usize,
    pub failed: usize,
}

/// Read the cache, check its TTL, else fetch, score and write back.
///
/// Source failures never escape: they become an unverified, HIGH risk outcome.
/// Not-found results are not cached.
pub struct VerificationService {
    cache: Arc<dyn VerificationRepository>,
    source: Arc<dyn AuthoritySource>,
    carriers: Arc<dyn CarrierRepository>,
    assessor: RiskAssessor,
    ttl: Duration,
    refresh_delay: std::time::Duration,
}

impl VerificationService {
    pub fn new(
        cache: Arc<dyn VerificationRepository>,
        source: Arc<dyn AuthoritySource>,
        carriers: Arc<dyn CarrierRepository>,
        assessor: RiskAssessor,
        ttl: Duration,
    ) -> Self {
        Self {
            cache,
            source,
            carriers,
            assessor,
            ttl,
            refresh_delay: std::time::Duration::ZERO,
        }
    }

    /// Pause between lookups in [`Self::refresh_expired`].
    #[must_use]
    pub fn with_refresh_delay(mut self, delay: std::time::Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    /// Verify by MC and/or DOT number; MC is preferred when both are given.
    ///
    /// Fails only when neither number is usable.
    #[instrument(skip(self), err)]
    pub async fn verify_carrier(
        &self,
        mc_number: Option<&str>,
        dot_number: Option<&str>,
        force_refresh: bool,
    ) -> DomainResult<VerificationOutcome> {
        let query = AuthorityQuery::from_numbers(mc_number, dot_number).ok_or_else(|| {
            DomainError::ValidationFailed("an MC or DOT number is required for verification".to_string())
        })?;
        let now = Utc::now();

        if !force_refresh {
            match self.cache.find(&query).await {
                Ok(Some(record)) if record.is_fresh(now) => {
                    debug!(cache_key = %record.cache_key, "Verification cache hit");
                    return Ok(VerificationOutcome::from_record(record, true));
                }
                Ok(Some(record)) => {
                    debug!(cache_key = %record.cache_key, expired_at = %record.expires_at, "Cached verification expired");
                }
                Ok(None) => {}
                Err(e) => warn!(cache_key = %query.cache_key(), error = %e, "Verification cache read failed"),
            }
        }

        Ok(self.fetch(&query, now).await)
    }

    /// Verify a registered carrier using its stored authority numbers.
    #[instrument(skip(self), err)]
    pub async fn verify_registered_carrier(
        &self,
        carrier_id: Uuid,
        force_refresh: bool,
    ) -> DomainResult<VerificationOutcome> {
        let carrier = self
            .carriers
            .get(carrier_id)
            .await?
            .ok_or(DomainError::CarrierNotFound(carrier_id))?;
        self.verify_carrier(
            carrier.mc_number.as_deref(),
            carrier.dot_number.as_deref(),
            force_refresh,
        )
        .await
    }

    /// Re-verify up to `limit` expired cache entries, oldest expiry first.
    #[instrument(skip(self), err)]
    pub async fn refresh_expired(&self, limit: u32) -> DomainResult<RefreshSummary> {
        let expired = self.cache.list_expired(Utc::now(), limit).await?;
        let mut summary = RefreshSummary::default();

        for (index, record) in expired.iter().enumerate() {
            if index > 0 && !self.refresh_delay.is_zero() {
                tokio::time::sleep(self.refresh_delay).await;
            }
            summary.examined += 1;

            let Some(query) = AuthorityQuery::from_cache_key(&record.cache_key) else {
                warn!(cache_key = %record.cache_key, "Skipping unreadable cache key");
                summary.failed += 1;
                continue;
            };

            let outcome = self.fetch(&query, Utc::now()).await;
            match outcome.failure {
                None => summary.refreshed += 1,
                Some(VerificationFailure::NotFound) => summary.not_found += 1,
                Some(VerificationFailure::Unavailable(_)) => summary.failed += 1,
            }
        }

        info!(
            examined = summary.examined,
            refreshed = summary.refreshed,
            failed = summary.failed,
            "Expired verifications refreshed"
        );
        Ok(summary)
    }

    /// Delete expired cache entries.
    pub async fn purge_expired(&self) -> DomainResult<u64> {
        let removed = self.cache.purge_expired(Utc::now()).await?;
        info!(removed, "Purged expired verifications");
        Ok(removed)
    }

    async fn fetch(&self, query: &AuthorityQuery, now: DateTime<Utc>) -> VerificationOutcome {
        match self.source.lookup(query).await {
            Ok(AuthorityLookup::Found(snapshot)) => {
                let assessment = self.assessor.assess(&snapshot, now.date_naive());
                let (mc_number, dot_number) = match query {
                    AuthorityQuery::Mc(n) => (Some(n.clone()), snapshot.dot_number.clone()),
                    AuthorityQuery::Dot(n) => (snapshot.mc_number.clone(), Some(n.clone())),
                };
                let record = VerificationRecord {
                    cache_key: query.cache_key(),
                    mc_number,
                    dot_number,
                    snapshot,
                    risk_level: assessment.risk_level,
                    risk_score: assessment.risk_score,
                    warnings: assessment.warnings,
                    verified_at: now,
                    expires_at: now + self.ttl,
                };

                if let Err(e) = self.cache.upsert(&record).await {
                    warn!(cache_key = %record.cache_key, error = %e, "Failed to cache verification");
                }
                info!(
                    cache_key = %record.cache_key,
                    source = %record.snapshot.source,
                    risk_level = record.risk_level.as_str(),
                    risk_score = record.risk_score,
                    "Carrier verified"
                );
                VerificationOutcome::from_record(record, false)
            }
            Ok(AuthorityLookup::NotFound) => {
                info!(query = %query, "No authority record found");
                VerificationOutcome::unverified(
                    VerificationFailure::NotFound,
                    format!("No authority record found for {query}"),
                    now,
                )
            }
            Err(e) => {
                warn!(query = %query, error = %e, "Authority lookup failed");
                VerificationOutcome::unverified(
                    VerificationFailure::Unavailable(e.to_string()),
                    format!("Unable to verify {query}: {e}"),
                    now,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteCarrierRepository, SqliteVerificationRepository};
    use crate::domain::models::{AuthoritySnapshot, CarrierEntity, OperatingStatus, RiskLevel};
    use crate::domain::ports::SourceError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeSource {
        result: Mutex<Result<AuthorityLookup, SourceError>>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(result: Result<AuthorityLookup, SourceError>) -> Arc<Self> {
            Arc::new(Self {
                result: Mutex::new(result),
                calls: AtomicUsize::new(0),
            })
        }

        fn set(&self, result: Result<AuthorityLookup, SourceError>) {
            *self.result.lock().unwrap() = result;
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AuthoritySource for FakeSource {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn lookup(&self, _query: &AuthorityQuery) -> Result<AuthorityLookup, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.lock().unwrap().clone()
        }
    }

    fn authorized() -> AuthorityLookup {
        AuthorityLookup::Found(AuthoritySnapshot {
            source: "fake".to_string(),
            legal_name: Some("ACME FREIGHT LLC".to_string()),
            dot_number: Some("1234567".to_string()),
            operating_status: OperatingStatus::Authorized,
            liability_insurance_on_file: Some(1000),
            cargo_insurance_on_file: Some(100),
            ..AuthoritySnapshot::default()
        })
    }

    struct Harness {
        service: VerificationService,
        source: Arc<FakeSource>,
        cache: Arc<SqliteVerificationRepository>,
        carriers: Arc<SqliteCarrierRepository>,
    }

    async fn harness(result: Result<AuthorityLookup, SourceError>) -> Harness {
        let pool = create_migrated_test_pool().await.unwrap();
        let cache = Arc::new(SqliteVerificationRepository::new(pool.clone()));
        let carriers = Arc::new(SqliteCarrierRepository::new(pool));
        let source = FakeSource::new(result);
        let service = VerificationService::new(
            cache.clone(),
            source.clone(),
            carriers.clone(),
            RiskAssessor::default(),
            Duration::hours(24),
        );
        Harness {
            service,
            source,
            cache,
            carriers,
        }
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let h = harness(Ok(authorized())).await;

        let first = h.service.verify_carrier(Some("MC-778899"), None, false).await.unwrap();
        assert!(first.verified);
        assert!(!first.cached);
        assert_eq!(first.risk_level, RiskLevel::Low);

        let second = h.service.verify_carrier(Some("778899"), None, false).await.unwrap();
        assert!(second.cached);
        assert_eq!(h.source.calls(), 1);

        let forced = h.service.verify_carrier(Some("778899"), None, true).await.unwrap();
        assert!(!forced.cached);
        assert_eq!(h.source.calls(), 2);
    }

    #[tokio::test]
    async fn test_expired_record_is_a_miss() {
        let h = harness(Ok(authorized())).await;
        let now = Utc::now();
        h.cache
            .upsert(&VerificationRecord {
                cache_key: "MC:778899".to_string(),
                mc_number: Some("778899".to_string()),
                dot_number: None,
                snapshot: AuthoritySnapshot::default(),
                risk_level: RiskLevel::High,
                risk_score: 10,
                warnings: vec![],
                verified_at: now - Duration::hours(24),
                expires_at: now - Duration::seconds(1),
            })
            .await
            .unwrap();

        let outcome = h.service.verify_carrier(Some("778899"), None, false).await.unwrap();
        assert!(!outcome.cached);
        assert_eq!(outcome.risk_score, 100);
        assert_eq!(h.source.calls(), 1);
    }

    #[tokio::test]
    async fn test_not_found_is_reported_and_not_cached() {
        let h = harness(Ok(AuthorityLookup::NotFound)).await;
        let outcome = h.service.verify_carrier(None, Some("7654321"), false).await.unwrap();
        assert!(!outcome.verified);
        assert_eq!(outcome.failure, Some(VerificationFailure::NotFound));
        assert_eq!(outcome.risk_level, RiskLevel::High);

        let query = AuthorityQuery::Dot("7654321".to_string());
        assert!(h.cache.find(&query).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_source_failure_downgrades_to_unverified() {
        let h = harness(Err(SourceError::Timeout)).await;
        let outcome = h.service.verify_carrier(Some("778899"), None, false).await.unwrap();
        assert!(!outcome.verified);
        assert_eq!(outcome.risk_score, 0);
        assert!(matches!(outcome.failure, Some(VerificationFailure::Unavailable(_))));
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_numbers_is_validation_error() {
        let h = harness(Ok(authorized())).await;
        let result = h.service.verify_carrier(Some("MC"), None, false).await;
        assert!(matches!(result, Err(DomainError::ValidationFailed(_))));
    }

    #[tokio::test]
    async fn test_registered_carrier_uses_stored_numbers() {
        let h = harness(Ok(authorized())).await;
        let mut carrier = CarrierEntity::new(Uuid::new_v4());
        carrier.dot_number = Some("1234567".to_string());
        h.carriers.create(&carrier).await.unwrap();

        let outcome = h.service.verify_registered_carrier(carrier.id, false).await.unwrap();
        assert!(outcome.verified);
        let cached = h.cache.find(&AuthorityQuery::Dot("1234567".to_string())).await.unwrap();
        assert!(cached.is_some());

        let missing = h.service.verify_registered_carrier(Uuid::new_v4(), false).await;
        assert!(matches!(missing, Err(DomainError::CarrierNotFound(_))));
    }

    #[tokio::test]
    async fn test_refresh_expired() {
        let h = harness(Ok(authorized())).await;
        h.service.verify_carrier(Some("111111"), None, false).await.unwrap();
        h.service.verify_carrier(Some("222222"), None, false).await.unwrap();

        // Expire both entries by rewriting them
        for key in ["111111", "222222"] {
            let query = AuthorityQuery::Mc(key.to_string());
            let mut record = h.cache.find(&query).await.unwrap().unwrap();
            record.expires_at = Utc::now() - Duration::minutes(1);
            h.cache.upsert(&record).await.unwrap();
        }

        h.source.set(Ok(AuthorityLookup::NotFound));
        let summary = h.service.refresh_expired(10).await.unwrap();
        assert_eq!(summary.examined, 2);
        assert_eq!(summary.not_found, 2);

        assert_eq!(h.service.purge_expired().await.unwrap(), 2);
    }
}

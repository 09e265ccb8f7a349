//! Per-call orchestration: normalize, resolve, merge, link, recompute, log.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AuthorityQuery, CallContext, CallExtraction, CarrierCallInteraction, CarrierCandidate,
    CarrierStatisticsSnapshot, IdentityConfig, InteractionKind, LinkageConfig, LoadCarrierLink,
    VerificationOutcome,
};
use crate::domain::ports::{CandidateExtractor, CarrierRepository, InteractionLog, LoadRepository};
use crate::services::extraction_normalizer::{confidence_score, ExtractionNormalizer};
use crate::services::identity_resolver::IdentityResolver;
use crate::services::merge_policy::{MergeKind, MergeOutcome, MergePolicy};
use crate::services::statistics_engine::StatisticsEngine;
use crate::services::verification_service::VerificationService;

/// What one call did to the registry.
#[derive(Debug, Clone, Serialize)]
pub struct CallLinkageResult {
    pub carrier_id: Uuid,
    pub is_new: bool,
    /// Load the carrier was linked to, when linking succeeded.
    pub load_id: Option<Uuid>,
    pub confidence: u8,
    pub needs_review: bool,
    /// `None` when recomputation failed; cached values were kept.
    pub statistics: Option<CarrierStatisticsSnapshot>,
    pub verification: Option<VerificationOutcome>,
}

/// One historical call to replay.
#[derive(Debug, Clone)]
pub struct ReplayItem {
    pub extraction: CallExtraction,
    pub context: CallContext,
    pub load_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub conflicts: usize,
    pub failed: usize,
}

/// Wires the pipeline together for each incoming call.
///
/// The steps after the carrier write are independent: a failed load link or
/// statistics run is logged and the carrier stays committed. Every step is an
/// overwrite or an ignored duplicate, so re-running a call converges.
pub struct CallLinkageCoordinator {
    normalizer: ExtractionNormalizer,
    resolver: IdentityResolver,
    merge: MergePolicy,
    carriers: Arc<dyn CarrierRepository>,
    loads: Arc<dyn LoadRepository>,
    interactions: Arc<dyn InteractionLog>,
    statistics: StatisticsEngine,
    verification: Option<Arc<VerificationService>>,
    verify_on_link: bool,
    min_phone_digits: usize,
    replay_delay: std::time::Duration,
}

impl CallLinkageCoordinator {
    pub fn new(
        carriers: Arc<dyn CarrierRepository>,
        loads: Arc<dyn LoadRepository>,
        interactions: Arc<dyn InteractionLog>,
        identity: IdentityConfig,
        linkage: &LinkageConfig,
    ) -> Self {
        Self {
            normalizer: ExtractionNormalizer::default(),
            min_phone_digits: identity.min_phone_digits,
            resolver: IdentityResolver::new(carriers.clone(), identity),
            merge: MergePolicy::new(linkage.review_confidence_threshold),
            statistics: StatisticsEngine::new(carriers.clone(), loads.clone()),
            carriers,
            loads,
            interactions,
            verification: None,
            verify_on_link: linkage.verify_on_link,
            replay_delay: std::time::Duration::ZERO,
        }
    }

    /// Verification service used when `verify_on_link` is enabled.
    #[must_use]
    pub fn with_verification(mut self, verification: Arc<VerificationService>) -> Self {
        self.verification = Some(verification);
        self
    }

    /// Replace the free-text pattern extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn CandidateExtractor>) -> Self {
        self.normalizer = ExtractionNormalizer::new(extractor);
        self
    }

    /// Pause between items during [`Self::replay`].
    #[must_use]
    pub fn with_replay_delay(mut self, delay: std::time::Duration) -> Self {
        self.replay_delay = delay;
        self
    }

    /// Run the full pipeline for one call extraction.
    ///
    /// Returns `Ok(None)` when the call carries no carrier signal.
    #[instrument(skip(self, extraction, context), fields(call_id = %context.call_id), err)]
    pub async fn process_call(
        &self,
        extraction: &CallExtraction,
        context: CallContext,
        load_id: Option<Uuid>,
    ) -> DomainResult<Option<CallLinkageResult>> {
        let Some(candidate) = self.normalizer.normalize(extraction, context) else {
            return Ok(None);
        };
        self.resolve_and_persist(candidate, load_id).await.map(Some)
    }

    /// Resolve a candidate to a carrier, persist it and run the follow-up steps.
    #[instrument(skip(self, candidate), fields(call_id = %candidate.context.call_id), err)]
    pub async fn resolve_and_persist(
        &self,
        mut candidate: CarrierCandidate,
        load_id: Option<Uuid>,
    ) -> DomainResult<CallLinkageResult> {
        if !candidate.has_resolvable_key(self.min_phone_digits) {
            return Err(DomainError::ValidationFailed(format!(
                "candidate has no MC number, DOT number or phone of at least {} digits",
                self.min_phone_digits
            )));
        }
        candidate.confidence = confidence_score(&candidate);

        let resolved = match self.resolver.resolve(&candidate).await {
            Ok(resolved) => resolved,
            Err(err) => {
                if let DomainError::IdentityConflict { phone_match, .. } = &err {
                    self.record_conflict(*phone_match, &candidate, &err).await;
                }
                return Err(err);
            }
        };
        if let Some(resolved) = &resolved {
            debug!(carrier_id = %resolved.carrier.id, strategy = %resolved.strategy, "Candidate resolved");
        }

        let outcome = self.merge.merge(resolved.map(|r| r.carrier), &candidate, Utc::now());
        let outcome = self.persist(outcome, &candidate).await?;
        let carrier_id = outcome.carrier.id;

        let linked_load = self.link_load(carrier_id, &candidate, load_id).await;

        let statistics = match self.statistics.recompute(carrier_id).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(carrier_id = %carrier_id, error = %e, "Statistics recomputation failed");
                None
            }
        };

        let note = (!outcome.ignored_authority.is_empty()).then(|| {
            outcome
                .ignored_authority
                .iter()
                .map(|i| format!("ignored {} {} (kept {})", i.field, i.incoming, i.existing))
                .collect::<Vec<_>>()
                .join("; ")
        });
        let interaction = CarrierCallInteraction {
            id: Uuid::new_v4(),
            organization_id: candidate.context.organization_id,
            carrier_id,
            call_id: candidate.context.call_id,
            load_id: linked_load,
            kind: match outcome.kind {
                MergeKind::Created => InteractionKind::Created,
                MergeKind::Updated => InteractionKind::Updated,
            },
            confidence: candidate.confidence,
            note,
            occurred_at: candidate.context.call_date,
        };
        if !self.interactions.record_carrier_call_interaction(&interaction).await? {
            debug!(carrier_id = %carrier_id, "Call already recorded for carrier");
        }

        let verification = self.verify_after_link(&outcome).await;

        info!(
            carrier_id = %carrier_id,
            is_new = outcome.is_new(),
            confidence = candidate.confidence,
            load_id = ?linked_load,
            "Call linked to carrier"
        );

        Ok(CallLinkageResult {
            carrier_id,
            is_new: outcome.is_new(),
            load_id: linked_load,
            confidence: candidate.confidence,
            needs_review: outcome.carrier.needs_review,
            statistics,
            verification,
        })
    }

    /// Recompute and cache statistics for one carrier.
    pub async fn recompute_statistics(&self, carrier_id: Uuid) -> DomainResult<CarrierStatisticsSnapshot> {
        self.statistics.recompute(carrier_id).await
    }

    /// Replay historical calls one after another with a fixed pause.
    pub async fn replay(&self, items: Vec<ReplayItem>) -> ReplaySummary {
        self.replay_with_progress(items, |_| {}).await
    }

    /// As [`Self::replay`], calling `on_item` with the running summary after each call.
    pub async fn replay_with_progress<F>(&self, items: Vec<ReplayItem>, mut on_item: F) -> ReplaySummary
    where
        F: FnMut(&ReplaySummary),
    {
        let mut summary = ReplaySummary::default();
        for (index, item) in items.into_iter().enumerate() {
            if index > 0 && !self.replay_delay.is_zero() {
                tokio::time::sleep(self.replay_delay).await;
            }
            let call_id = item.context.call_id;
            summary.processed += 1;
            match self.process_call(&item.extraction, item.context, item.load_id).await {
                Ok(Some(result)) if result.is_new => summary.created += 1,
                Ok(Some(_)) => summary.updated += 1,
                Ok(None) | Err(DomainError::ValidationFailed(_)) => summary.skipped += 1,
                Err(DomainError::IdentityConflict { .. }) => summary.conflicts += 1,
                Err(e) => {
                    warn!(call_id = %call_id, error = %e, "Replay item failed");
                    summary.failed += 1;
                }
            }
            on_item(&summary);
        }
        info!(
            processed = summary.processed,
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped,
            conflicts = summary.conflicts,
            failed = summary.failed,
            "Replay finished"
        );
        summary
    }

    /// Write the merged carrier; a lost create race is retried as an update.
    async fn persist(&self, outcome: MergeOutcome, candidate: &CarrierCandidate) -> DomainResult<MergeOutcome> {
        if outcome.kind == MergeKind::Updated {
            self.carriers.update(&outcome.carrier).await?;
            return Ok(outcome);
        }

        match self.carriers.create(&outcome.carrier).await {
            Ok(()) => Ok(outcome),
            Err(err @ DomainError::DuplicateKey { .. }) => {
                let Some(mc) = candidate.mc_number.clone() else {
                    return Err(err);
                };
                let existing = self
                    .carriers
                    .find_by_authority_number(candidate.context.organization_id, &AuthorityQuery::Mc(mc.clone()))
                    .await?
                    .ok_or(err)?;
                info!(carrier_id = %existing.id, mc_number = %mc, "Concurrent create detected; merging into existing carrier");
                let retried = self.merge.merge(Some(existing), candidate, Utc::now());
                self.carriers.update(&retried.carrier).await?;
                Ok(retried)
            }
            Err(err) => Err(err),
        }
    }

    /// Link the carrier to the supplied or discovered load. Failures are logged only.
    async fn link_load(&self, carrier_id: Uuid, candidate: &CarrierCandidate, load_id: Option<Uuid>) -> Option<Uuid> {
        let load_id = match load_id.or(candidate.load_id) {
            Some(id) => id,
            None => {
                let number = candidate.load_number.as_deref()?;
                match self
                    .loads
                    .find_by_load_number(candidate.context.organization_id, number)
                    .await
                {
                    Ok(Some(load)) => load.id,
                    Ok(None) => {
                        debug!(load_number = %number, "Referenced load number not found");
                        return None;
                    }
                    Err(e) => {
                        warn!(load_number = %number, error = %e, "Load lookup failed");
                        return None;
                    }
                }
            }
        };

        let link = LoadCarrierLink {
            quoted_rate: candidate.quoted_rate,
            driver_name: candidate.driver_name.clone(),
            driver_phone: candidate.driver_phone.clone(),
        };
        match self.loads.update_carrier_link(load_id, carrier_id, &link).await {
            Ok(()) => Some(load_id),
            Err(e) => {
                warn!(carrier_id = %carrier_id, load_id = %load_id, error = %e, "Load linkage failed; carrier kept");
                None
            }
        }
    }

    async fn record_conflict(&self, carrier_id: Uuid, candidate: &CarrierCandidate, err: &DomainError) {
        let interaction = CarrierCallInteraction {
            id: Uuid::new_v4(),
            organization_id: candidate.context.organization_id,
            carrier_id,
            call_id: candidate.context.call_id,
            load_id: candidate.load_id,
            kind: InteractionKind::Conflict,
            confidence: candidate.confidence,
            note: Some(err.to_string()),
            occurred_at: candidate.context.call_date,
        };
        if let Err(e) = self.interactions.record_carrier_call_interaction(&interaction).await {
            warn!(carrier_id = %carrier_id, error = %e, "Failed to record identity conflict");
        }
    }

    async fn verify_after_link(&self, outcome: &MergeOutcome) -> Option<VerificationOutcome> {
        if !self.verify_on_link {
            return None;
        }
        let verification = self.verification.as_ref()?;
        let carrier = &outcome.carrier;
        if carrier.mc_number.is_none() && carrier.dot_number.is_none() {
            return None;
        }
        match verification
            .verify_carrier(carrier.mc_number.as_deref(), carrier.dot_number.as_deref(), false)
            .await
        {
            Ok(result) => Some(result),
            Err(e) => {
                debug!(carrier_id = %carrier.id, error = %e, "Skipping verification after link");
                None
            }
        }
    }
}

//! Finds the existing carrier a candidate refers to, if any.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{phone_digits, AuthorityQuery, CarrierCandidate, CarrierEntity, IdentityConfig};
use crate::domain::ports::CarrierRepository;

/// Which key produced the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    McNumber,
    DotNumber,
    Phone,
}

impl MatchStrategy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::McNumber => "mc_number",
            Self::DotNumber => "dot_number",
            Self::Phone => "phone",
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An existing carrier together with the strategy that found it.
#[derive(Debug, Clone)]
pub struct ResolvedCarrier {
    pub carrier: CarrierEntity,
    pub strategy: MatchStrategy,
}

/// Strictly ordered key lookup; the first strategy that hits wins.
///
/// 1. Exact MC number.
/// 2. Exact DOT number, unless both sides carry different MC numbers.
/// 3. Normalized phone against the primary or alternate phone.
///
/// A phone hit on a carrier whose MC differs from the candidate's is a
/// conflict and is returned as [`DomainError::IdentityConflict`], never merged.
pub struct IdentityResolver {
    carriers: Arc<dyn CarrierRepository>,
    config: IdentityConfig,
}

impl IdentityResolver {
    pub fn new(carriers: Arc<dyn CarrierRepository>, config: IdentityConfig) -> Self {
        Self { carriers, config }
    }

    #[instrument(skip(self, candidate), fields(call_id = %candidate.context.call_id), err)]
    pub async fn resolve(&self, candidate: &CarrierCandidate) -> DomainResult<Option<ResolvedCarrier>> {
        let org = candidate.context.organization_id;

        if let Some(mc) = &candidate.mc_number {
            let query = AuthorityQuery::Mc(mc.clone());
            if let Some(carrier) = self.carriers.find_by_authority_number(org, &query).await? {
                debug!(carrier_id = %carrier.id, mc_number = %mc, "Matched carrier by MC number");
                return Ok(Some(ResolvedCarrier {
                    carrier,
                    strategy: MatchStrategy::McNumber,
                }));
            }
        }

        if let Some(dot) = &candidate.dot_number {
            let query = AuthorityQuery::Dot(dot.clone());
            if let Some(carrier) = self.carriers.find_by_authority_number(org, &query).await? {
                if carrier.mc_number.is_some() && candidate.mc_number.is_some() {
                    debug!(
                        carrier_id = %carrier.id,
                        dot_number = %dot,
                        "DOT matched a carrier registered under another MC number; not merging"
                    );
                } else {
                    debug!(carrier_id = %carrier.id, dot_number = %dot, "Matched carrier by DOT number");
                    return Ok(Some(ResolvedCarrier {
                        carrier,
                        strategy: MatchStrategy::DotNumber,
                    }));
                }
            }
        }

        let Some(digits) = candidate
            .phone
            .as_deref()
            .map(phone_digits)
            .filter(|d| d.len() >= self.config.min_phone_digits)
        else {
            return Ok(None);
        };

        let Some(carrier) = self
            .carriers
            .find_by_phone(org, &digits, self.config.phone_match)
            .await?
        else {
            return Ok(None);
        };

        if let (Some(candidate_mc), Some(existing_mc)) = (&candidate.mc_number, &carrier.mc_number) {
            if candidate_mc != existing_mc {
                warn!(
                    carrier_id = %carrier.id,
                    candidate_mc = %candidate_mc,
                    existing_mc = %existing_mc,
                    "Phone matched a carrier with a different MC number"
                );
                return Err(DomainError::IdentityConflict {
                    phone_match: carrier.id,
                    candidate_mc: candidate_mc.clone(),
                    existing_mc: existing_mc.clone(),
                });
            }
        }

        debug!(carrier_id = %carrier.id, "Matched carrier by phone");
        Ok(Some(ResolvedCarrier {
            carrier,
            strategy: MatchStrategy::Phone,
        }))
    }
}

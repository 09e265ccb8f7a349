//! Primary-then-secondary authority lookup.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{shared_rate_limiter, QcApiClient, SnapshotPageClient};
use crate::domain::models::{AuthorityQuery, VerificationConfig};
use crate::domain::ports::{AuthorityLookup, AuthoritySource, SourceError};

/// Queries the primary source and falls back to the secondary on failure.
///
/// A definitive not-found from the primary is returned as-is; only transport
/// errors, timeouts, non-2xx statuses and unreadable bodies trigger the
/// fallback hop.
pub struct FallbackAuthorityClient {
    primary: Arc<dyn AuthoritySource>,
    secondary: Option<Arc<dyn AuthoritySource>>,
}

impl FallbackAuthorityClient {
    pub fn new(primary: Arc<dyn AuthoritySource>, secondary: Option<Arc<dyn AuthoritySource>>) -> Self {
        Self { primary, secondary }
    }

    /// Wire the HTTP sources from configuration, sharing one rate limiter.
    pub fn from_config(config: &VerificationConfig) -> Result<Self, SourceError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let limiter = shared_rate_limiter(config.requests_per_second);

        let primary = QcApiClient::new(&config.primary_base_url, config.web_key.clone(), timeout, limiter.clone())?;
        let secondary = if config.secondary_enabled {
            let client = SnapshotPageClient::new(&config.secondary_base_url, timeout, limiter)?;
            Some(Arc::new(client) as Arc<dyn AuthoritySource>)
        } else {
            None
        };

        Ok(Self::new(Arc::new(primary), secondary))
    }
}

#[async_trait]
impl AuthoritySource for FallbackAuthorityClient {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn lookup(&self, query: &AuthorityQuery) -> Result<AuthorityLookup, SourceError> {
        let primary_error = match self.primary.lookup(query).await {
            Ok(lookup) => return Ok(lookup),
            Err(e) => e,
        };

        let Some(secondary) = &self.secondary else {
            tracing::warn!(source = self.primary.name(), query = %query, error = %primary_error, "Authority lookup failed, no fallback configured");
            return Err(primary_error);
        };

        tracing::warn!(
            source = self.primary.name(),
            fallback = secondary.name(),
            query = %query,
            error = %primary_error,
            "Primary authority source failed, trying fallback"
        );

        secondary.lookup(query).await.inspect_err(|e| {
            tracing::warn!(source = secondary.name(), query = %query, error = %e, "Fallback authority source failed");
        })
    }
}

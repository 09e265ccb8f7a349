//! Verification cache port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::DomainResult;
use crate::domain::models::{AuthorityQuery, VerificationRecord};

/// Persistent cache of verification results keyed by MC or DOT number.
#[async_trait]
pub trait VerificationRepository: Send + Sync {
    /// Cached record for the query, fresh or not.
    async fn find(&self, query: &AuthorityQuery) -> DomainResult<Option<VerificationRecord>>;

    /// Insert or replace the record for its cache key.
    async fn upsert(&self, record: &VerificationRecord) -> DomainResult<()>;

    /// Records whose `expires_at` is at or before `now`, oldest expiry first.
    async fn list_expired(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> DomainResult<Vec<VerificationRecord>>;

    /// Delete expired records; returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> DomainResult<u64>;
}

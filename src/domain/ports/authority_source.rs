//! External regulatory authority source port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::{AuthorityQuery, AuthoritySnapshot};

/// What a single source returned for a lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthorityLookup {
    Found(AuthoritySnapshot),
    /// The source answered and has no record for the number.
    NotFound,
}

/// Transport-level failure of one source. Never carries request URLs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("unreadable response: {0}")]
    Parse(String),
}

/// One source of carrier authority data.
#[async_trait]
pub trait AuthoritySource: Send + Sync {
    /// Short name recorded in snapshots and logs.
    fn name(&self) -> &'static str;

    async fn lookup(&self, query: &AuthorityQuery) -> Result<AuthorityLookup, SourceError>;
}

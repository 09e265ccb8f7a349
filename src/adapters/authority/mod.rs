//! HTTP adapters for the regulatory authority sources.
//!
//! `qc_api` is the structured JSON source, `snapshot_page` the text-scraped
//! fallback, and `fallback` chains the two behind a single lookup.

pub mod fallback;
pub mod qc_api;
pub mod snapshot_page;

pub use fallback::FallbackAuthorityClient;
pub use qc_api::QcApiClient;
pub use snapshot_page::SnapshotPageClient;

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

use crate::domain::ports::SourceError;

const USER_AGENT: &str = concat!("carrier-registry/", env!("CARGO_PKG_VERSION"));

/// Limiter shared by both sources so a fallback hop counts against the same budget.
pub fn shared_rate_limiter(requests_per_second: u32) -> Arc<DefaultDirectRateLimiter> {
    let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_second(rate)))
}

/// Build a client with the request and connect timeouts applied.
pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(5)))
        .build()
        .map_err(classify_error)
}

/// Classify a reqwest error. The URL is dropped first since it carries the web key.
pub(crate) fn classify_error(err: reqwest::Error) -> SourceError {
    let err = err.without_url();
    if err.is_timeout() {
        SourceError::Timeout
    } else if err.is_decode() {
        SourceError::Parse(err.to_string())
    } else {
        SourceError::Transport(err.to_string())
    }
}

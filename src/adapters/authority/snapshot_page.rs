//! Fallback authority source: the public company snapshot page.
//!
//! The page is HTML meant for people, so fields are recovered by stripping
//! markup and matching `Label: value` patterns. Anything the patterns miss
//! stays unset.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::DefaultDirectRateLimiter;
use regex::Regex;

use super::{build_http_client, classify_error};
use crate::domain::models::{
    normalize_authority_number, parse_calendar_date, AuthorityQuery, AuthoritySnapshot, OperatingStatus, SafetyRating,
};
use crate::domain::ports::{AuthorityLookup, AuthoritySource, SourceError};

pub const SOURCE_NAME: &str = "snapshot_page";

/// Labels that can follow a free-text field on the page. A field value runs
/// up to the next of these or the end of the text.
const FIELD_END: &str = concat!(
    r"(?:Entity Type:|Operating (?:Authority )?Status:|Out of Service Date:|Legal Name:|DBA Name:",
    r"|Physical Address:|Mailing Address:|Phone:|USDOT Number:|State Carrier ID Number:",
    r"|MC/MX/FF Number\(s\):|DUNS Number:|Power Units:|Drivers:|MCS-150 Form Date:|MCS-150 Mileage",
    r"|Operation Classification:|Carrier Operation:|Cargo Carried:|Rating Date:|Review Date:|Rating:",
    r"|For Licensing|$)",
);

/// Label patterns over the tag-stripped page text.
#[derive(Clone)]
struct SnapshotPatterns {
    tags: Regex,
    whitespace: Regex,
    not_found: Regex,
    legal_name: Regex,
    dba_name: Regex,
    operating_status: Regex,
    oos_date: Regex,
    dot_number: Regex,
    mc_number: Regex,
    phone: Regex,
    physical_address: Regex,
    power_units: Regex,
    drivers: Regex,
    mcs150_date: Regex,
    rating: Regex,
    rating_date: Regex,
}

impl SnapshotPatterns {
    fn new() -> Self {
        let label = |pattern: &str| Regex::new(pattern).expect("snapshot pattern is valid");
        let field = |name: &str| label(&format!(r"(?i){name}:\s*(.*?)\s*{FIELD_END}"));
        Self {
            tags: label(r"(?s)<[^>]*>"),
            whitespace: label(r"\s+"),
            not_found: label(r"(?i)record not found|no records matching"),
            legal_name: field("Legal Name"),
            dba_name: field("DBA Name"),
            operating_status: field("Operating (?:Authority )?Status"),
            oos_date: label(r"(?i)Out of Service Date:\s*(\d{2}/\d{2}/\d{4})"),
            dot_number: label(r"(?i)USDOT Number:\s*(\d{1,8})"),
            mc_number: label(r"(?i)MC/MX/FF Number\(s\):\s*MC-?(\d{1,7})"),
            phone: label(r"(?i)Phone:\s*(\(?\d{3}\)?[\s\-.]?\d{3}[\s\-.]?\d{4})"),
            physical_address: field("Physical Address"),
            power_units: label(r"(?i)Power Units:\s*([\d,]+)"),
            drivers: label(r"(?i)Drivers:\s*([\d,]+)"),
            mcs150_date: label(r"(?i)MCS-150 Form Date:\s*(\d{2}/\d{2}/\d{4})"),
            rating: label(r"(?i)\bRating:\s*(Satisfactory|Conditional|Unsatisfactory|None|Not Rated)"),
            rating_date: label(r"(?i)Rating Date:\s*(\d{2}/\d{2}/\d{4})"),
        }
    }

    fn to_text(&self, html: &str) -> String {
        let stripped = self.tags.replace_all(html, " ");
        let decoded = stripped.replace("&nbsp;", " ").replace("&amp;", "&").replace("&#39;", "'");
        self.whitespace.replace_all(&decoded, " ").trim().to_string()
    }

    fn capture(pattern: &Regex, text: &str) -> Option<String> {
        pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("none"))
    }

    fn count(pattern: &Regex, text: &str) -> Option<u32> {
        Self::capture(pattern, text).and_then(|raw| raw.replace(',', "").parse().ok())
    }

    /// `None` when the page says the number is not registered.
    fn parse(&self, html: &str, query: &AuthorityQuery) -> Option<AuthoritySnapshot> {
        let text = self.to_text(html);
        if self.not_found.is_match(&text) {
            return None;
        }

        let status_text = Self::capture(&self.operating_status, &text);
        let oos_date = Self::capture(&self.oos_date, &text).and_then(|d| parse_calendar_date(&d));
        let operating_status = match status_text.as_deref().map(OperatingStatus::from_text) {
            Some(OperatingStatus::NotAuthorized) if oos_date.is_some() => OperatingStatus::OutOfService,
            Some(status) => status,
            None => OperatingStatus::Unregistered,
        };

        let mc_number = Self::capture(&self.mc_number, &text)
            .and_then(|n| normalize_authority_number(&n))
            .or_else(|| match query {
                AuthorityQuery::Mc(n) => Some(n.clone()),
                AuthorityQuery::Dot(_) => None,
            });

        Some(AuthoritySnapshot {
            source: SOURCE_NAME.to_string(),
            legal_name: Self::capture(&self.legal_name, &text),
            dba_name: Self::capture(&self.dba_name, &text),
            mc_number,
            dot_number: Self::capture(&self.dot_number, &text),
            operating_status,
            out_of_service_date: oos_date,
            safety_rating: Self::capture(&self.rating, &text).and_then(|r| SafetyRating::parse(&r)),
            safety_rating_date: Self::capture(&self.rating_date, &text).and_then(|d| parse_calendar_date(&d)),
            record_updated_on: Self::capture(&self.mcs150_date, &text).and_then(|d| parse_calendar_date(&d)),
            power_units: Self::count(&self.power_units, &text),
            drivers: Self::count(&self.drivers, &text),
            phone: Self::capture(&self.phone, &text),
            physical_address: Self::capture(&self.physical_address, &text),
            ..AuthoritySnapshot::default()
        })
    }
}

/// Client for the snapshot page.
pub struct SnapshotPageClient {
    http: reqwest::Client,
    base_url: String,
    patterns: SnapshotPatterns,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl SnapshotPageClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        rate_limiter: Arc<DefaultDirectRateLimiter>,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            http: build_http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            patterns: SnapshotPatterns::new(),
            rate_limiter,
        })
    }
}

#[async_trait]
impl AuthoritySource for SnapshotPageClient {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn lookup(&self, query: &AuthorityQuery) -> Result<AuthorityLookup, SourceError> {
        self.rate_limiter.until_ready().await;

        let query_param = match query {
            AuthorityQuery::Mc(_) => "MC_MX",
            AuthorityQuery::Dot(_) => "USDOT",
        };

        tracing::debug!(source = SOURCE_NAME, query = %query, "Fetching snapshot page");
        let response = self
            .http
            .get(format!("{}/query.asp", self.base_url))
            .query(&[
                ("searchtype", "ANY"),
                ("query_type", "queryCarrierSnapshot"),
                ("query_param", query_param),
                ("query_string", query.number()),
            ])
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(AuthorityLookup::NotFound);
        }
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let html = response.text().await.map_err(classify_error)?;
        Ok(self
            .patterns
            .parse(&html, query)
            .map_or(AuthorityLookup::NotFound, AuthorityLookup::Found))
    }
}

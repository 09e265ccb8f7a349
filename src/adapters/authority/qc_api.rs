//! Structured JSON authority source.
//!
//! Lookups are `GET {base}/carriers/docket-number/{mc}` for MC numbers and
//! `GET {base}/carriers/{dot}` for DOT numbers, authenticated with a
//! `webKey` query parameter. The carrier payload sits under `content`,
//! either directly or as the first element of a list; a missing or empty
//! `content` means the number is not registered.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::DefaultDirectRateLimiter;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{build_http_client, classify_error};
use crate::domain::models::{
    normalize_authority_number, parse_calendar_date, AuthorityQuery, AuthoritySnapshot, LooseScalar,
    OperatingStatus, SafetyRating,
};
use crate::domain::ports::{AuthorityLookup, AuthoritySource, SourceError};

pub const SOURCE_NAME: &str = "qc_api";

/// National average out-of-service rates used when the payload omits them.
const DEFAULT_VEHICLE_OOS_NATIONAL_AVERAGE: f64 = 20.72;
const DEFAULT_DRIVER_OOS_NATIONAL_AVERAGE: f64 = 5.51;

#[derive(Debug, Deserialize)]
struct QcEnvelope {
    content: Option<QcContent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QcContent {
    Many(Vec<QcCarrierWrapper>),
    One(QcCarrierWrapper),
}

impl QcContent {
    fn into_carrier(self) -> Option<QcCarrier> {
        match self {
            Self::Many(items) => items.into_iter().find_map(|w| w.carrier),
            Self::One(wrapper) => wrapper.carrier,
        }
    }
}

#[derive(Debug, Deserialize)]
struct QcCarrierWrapper {
    carrier: Option<QcCarrier>,
}

/// Carrier payload. Every field is optional and loosely typed.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct QcCarrier {
    legal_name: Option<LooseScalar>,
    dba_name: Option<LooseScalar>,
    dot_number: Option<LooseScalar>,
    docket_number: Option<LooseScalar>,
    allowed_to_operate: Option<LooseScalar>,
    status_code: Option<LooseScalar>,
    oos_date: Option<LooseScalar>,
    safety_rating: Option<LooseScalar>,
    safety_rating_date: Option<LooseScalar>,
    bipd_insurance_on_file: Option<LooseScalar>,
    bipd_insurance_required: Option<LooseScalar>,
    bipd_required_amount: Option<LooseScalar>,
    cargo_insurance_on_file: Option<LooseScalar>,
    authority_grant_date: Option<LooseScalar>,
    mcs150_form_date: Option<LooseScalar>,
    vehicle_oos_rate: Option<LooseScalar>,
    vehicle_oos_rate_national_average: Option<LooseScalar>,
    driver_oos_rate: Option<LooseScalar>,
    driver_oos_rate_national_average: Option<LooseScalar>,
    crash_total: Option<LooseScalar>,
    fatal_crash: Option<LooseScalar>,
    inj_crash: Option<LooseScalar>,
    total_power_units: Option<LooseScalar>,
    total_drivers: Option<LooseScalar>,
    telephone: Option<LooseScalar>,
    phy_street: Option<LooseScalar>,
    phy_city: Option<LooseScalar>,
    phy_state: Option<LooseScalar>,
    phy_zipcode: Option<LooseScalar>,
}

fn text(field: Option<&LooseScalar>) -> Option<String> {
    field.and_then(LooseScalar::as_text)
}

fn number(field: Option<&LooseScalar>) -> Option<f64> {
    field.and_then(LooseScalar::as_f64)
}

fn count(field: Option<&LooseScalar>) -> Option<u32> {
    number(field).filter(|n| *n >= 0.0).map(|n| n.round() as u32)
}

impl QcCarrier {
    fn operating_status(&self) -> OperatingStatus {
        let allowed = text(self.allowed_to_operate.as_ref()).map(|s| s.to_uppercase());
        let status_code = text(self.status_code.as_ref()).map(|s| s.to_uppercase());
        let placed_oos = text(self.oos_date.as_ref()).and_then(|d| parse_calendar_date(&d)).is_some();

        match (allowed.as_deref(), status_code.as_deref()) {
            (_, Some("S")) => OperatingStatus::Suspended,
            (Some("N"), _) if placed_oos => OperatingStatus::OutOfService,
            (Some("N"), _) => OperatingStatus::NotAuthorized,
            (Some("Y"), _) => OperatingStatus::Authorized,
            (Some(other), _) => OperatingStatus::from_text(other),
            (None, _) => OperatingStatus::Unregistered,
        }
    }

    fn into_snapshot(self, query: &AuthorityQuery) -> AuthoritySnapshot {
        let mc_number = text(self.docket_number.as_ref())
            .and_then(|d| normalize_authority_number(&d))
            .or_else(|| match query {
                AuthorityQuery::Mc(n) => Some(n.clone()),
                AuthorityQuery::Dot(_) => None,
            });
        let physical_address = [
            self.phy_street.as_ref(),
            self.phy_city.as_ref(),
            self.phy_state.as_ref(),
            self.phy_zipcode.as_ref(),
        ]
        .into_iter()
        .filter_map(text)
        .collect::<Vec<_>>();

        AuthoritySnapshot {
            source: SOURCE_NAME.to_string(),
            operating_status: self.operating_status(),
            legal_name: text(self.legal_name.as_ref()),
            dba_name: text(self.dba_name.as_ref()),
            mc_number,
            dot_number: text(self.dot_number.as_ref()).and_then(|d| normalize_authority_number(&d)),
            out_of_service_date: text(self.oos_date.as_ref()).and_then(|d| parse_calendar_date(&d)),
            safety_rating: text(self.safety_rating.as_ref()).and_then(|r| SafetyRating::parse(&r)),
            safety_rating_date: text(self.safety_rating_date.as_ref()).and_then(|d| parse_calendar_date(&d)),
            liability_insurance_on_file: count(self.bipd_insurance_on_file.as_ref()),
            liability_insurance_required: count(
                self.bipd_insurance_required
                    .as_ref()
                    .or(self.bipd_required_amount.as_ref()),
            ),
            cargo_insurance_on_file: count(self.cargo_insurance_on_file.as_ref()),
            authority_granted_on: text(self.authority_grant_date.as_ref()).and_then(|d| parse_calendar_date(&d)),
            record_updated_on: text(self.mcs150_form_date.as_ref()).and_then(|d| parse_calendar_date(&d)),
            vehicle_oos_rate: number(self.vehicle_oos_rate.as_ref()),
            vehicle_oos_national_average: number(self.vehicle_oos_rate_national_average.as_ref())
                .or(Some(DEFAULT_VEHICLE_OOS_NATIONAL_AVERAGE)),
            driver_oos_rate: number(self.driver_oos_rate.as_ref()),
            driver_oos_national_average: number(self.driver_oos_rate_national_average.as_ref())
                .or(Some(DEFAULT_DRIVER_OOS_NATIONAL_AVERAGE)),
            total_crashes: count(self.crash_total.as_ref()),
            fatal_crashes: count(self.fatal_crash.as_ref()),
            injury_crashes: count(self.inj_crash.as_ref()),
            power_units: count(self.total_power_units.as_ref()),
            drivers: count(self.total_drivers.as_ref()),
            phone: text(self.telephone.as_ref()),
            physical_address: if physical_address.is_empty() {
                None
            } else {
                Some(physical_address.join(", "))
            },
        }
    }
}

/// Client for the structured authority API.
pub struct QcApiClient {
    http: reqwest::Client,
    base_url: String,
    web_key: Option<String>,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl QcApiClient {
    pub fn new(
        base_url: impl Into<String>,
        web_key: Option<String>,
        timeout: Duration,
        rate_limiter: Arc<DefaultDirectRateLimiter>,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            http: build_http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            web_key,
            rate_limiter,
        })
    }

    fn lookup_url(&self, query: &AuthorityQuery) -> String {
        match query {
            AuthorityQuery::Mc(n) => format!("{}/carriers/docket-number/{n}", self.base_url),
            AuthorityQuery::Dot(n) => format!("{}/carriers/{n}", self.base_url),
        }
    }
}

#[async_trait]
impl AuthoritySource for QcApiClient {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn lookup(&self, query: &AuthorityQuery) -> Result<AuthorityLookup, SourceError> {
        self.rate_limiter.until_ready().await;

        let mut request = self.http.get(self.lookup_url(query));
        if let Some(key) = &self.web_key {
            request = request.query(&[("webKey", key)]);
        }

        tracing::debug!(source = SOURCE_NAME, query = %query, "Querying authority API");
        let response = request.send().await.map_err(classify_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(AuthorityLookup::NotFound);
        }
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(classify_error)?;
        let envelope: QcEnvelope =
            serde_json::from_str(&body).map_err(|e| SourceError::Parse(e.to_string()))?;

        match envelope.content.and_then(QcContent::into_carrier) {
            Some(carrier) => Ok(AuthorityLookup::Found(carrier.into_snapshot(query))),
            None => Ok(AuthorityLookup::NotFound),
        }
    }
}

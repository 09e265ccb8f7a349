//! Regulatory authority data, risk assessment results and the verification cache record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::carrier::normalize_authority_number;

/// Normalized operating authority status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OperatingStatus {
    #[serde(rename = "AUTHORIZED")]
    Authorized,
    #[serde(rename = "NOT AUTHORIZED")]
    NotAuthorized,
    #[serde(rename = "OUT OF SERVICE")]
    OutOfService,
    #[serde(rename = "SUSPENDED")]
    Suspended,
    #[default]
    #[serde(rename = "UNREGISTERED")]
    Unregistered,
}

impl OperatingStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Authorized => "AUTHORIZED",
            Self::NotAuthorized => "NOT AUTHORIZED",
            Self::OutOfService => "OUT OF SERVICE",
            Self::Suspended => "SUSPENDED",
            Self::Unregistered => "UNREGISTERED",
        }
    }

    /// Classify free status text by keyword.
    ///
    /// Negative phrases are checked before "AUTHORIZED" since they contain it;
    /// text with no known keyword is `Unregistered`.
    pub fn from_text(text: &str) -> Self {
        let upper = text.to_uppercase();
        if upper.contains("OUT OF SERVICE") || upper.contains("OUT-OF-SERVICE") {
            Self::OutOfService
        } else if upper.contains("NOT AUTHORIZED") || upper.contains("UNAUTHORIZED") {
            Self::NotAuthorized
        } else if upper.contains("SUSPEND") {
            Self::Suspended
        } else if upper.contains("AUTHORIZED") {
            Self::Authorized
        } else {
            Self::Unregistered
        }
    }
}

/// Regulator safety rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyRating {
    Satisfactory,
    Conditional,
    Unsatisfactory,
    NotRated,
}

impl SafetyRating {
    /// Parse a rating code (`S`, `C`, `U`, `N`) or word.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "S" | "SATISFACTORY" => Some(Self::Satisfactory),
            "C" | "CONDITIONAL" => Some(Self::Conditional),
            "U" | "UNSATISFACTORY" => Some(Self::Unsatisfactory),
            "N" | "NOT RATED" | "NONE" | "UNRATED" => Some(Self::NotRated),
            _ => None,
        }
    }
}

/// Which kind of authority number a lookup is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorityQuery {
    Mc(String),
    Dot(String),
}

impl AuthorityQuery {
    /// Prefer the MC number; fall back to DOT. Numbers are normalized to digits.
    pub fn from_numbers(mc_number: Option<&str>, dot_number: Option<&str>) -> Option<Self> {
        mc_number
            .and_then(normalize_authority_number)
            .map(Self::Mc)
            .or_else(|| dot_number.and_then(normalize_authority_number).map(Self::Dot))
    }

    pub fn number(&self) -> &str {
        match self {
            Self::Mc(n) | Self::Dot(n) => n,
        }
    }

    /// Inverse of [`Self::cache_key`].
    pub fn from_cache_key(key: &str) -> Option<Self> {
        let (kind, number) = key.split_once(':')?;
        let number = normalize_authority_number(number)?;
        match kind {
            "MC" => Some(Self::Mc(number)),
            "DOT" => Some(Self::Dot(number)),
            _ => None,
        }
    }

    /// Cache key, e.g. `MC:778899`.
    pub fn cache_key(&self) -> String {
        match self {
            Self::Mc(n) => format!("MC:{n}"),
            Self::Dot(n) => format!("DOT:{n}"),
        }
    }
}

impl std::fmt::Display for AuthorityQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mc(n) => write!(f, "MC {n}"),
            Self::Dot(n) => write!(f, "DOT {n}"),
        }
    }
}

/// Normalized regulatory snapshot for one carrier.
///
/// Fields a source did not report stay `None`; only the operating status
/// is always populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthoritySnapshot {
    /// Name of the source that produced the snapshot.
    pub source: String,
    pub legal_name: Option<String>,
    pub dba_name: Option<String>,
    pub mc_number: Option<String>,
    pub dot_number: Option<String>,
    pub operating_status: OperatingStatus,
    pub out_of_service_date: Option<NaiveDate>,
    pub safety_rating: Option<SafetyRating>,
    pub safety_rating_date: Option<NaiveDate>,
    /// Liability (BIPD) coverage on file, in thousands of dollars.
    pub liability_insurance_on_file: Option<u32>,
    /// Liability (BIPD) coverage required, in thousands of dollars.
    pub liability_insurance_required: Option<u32>,
    /// Cargo coverage on file, in thousands of dollars.
    pub cargo_insurance_on_file: Option<u32>,
    pub authority_granted_on: Option<NaiveDate>,
    /// Date of the last census / record update (MCS-150).
    pub record_updated_on: Option<NaiveDate>,
    pub vehicle_oos_rate: Option<f64>,
    pub vehicle_oos_national_average: Option<f64>,
    pub driver_oos_rate: Option<f64>,
    pub driver_oos_national_average: Option<f64>,
    pub total_crashes: Option<u32>,
    pub fatal_crashes: Option<u32>,
    pub injury_crashes: Option<u32>,
    pub power_units: Option<u32>,
    pub drivers: Option<u32>,
    pub phone: Option<String>,
    pub physical_address: Option<String>,
}

/// Coarse risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// `>= 80` is LOW, `>= 50` is MEDIUM, anything else HIGH.
    pub const fn from_score(score: u8) -> Self {
        if score >= 80 {
            Self::Low
        } else if score >= 50 {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            _ => None,
        }
    }
}

/// Warning severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// A human-readable, severity-tagged finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskWarning {
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

impl RiskWarning {
    pub fn new(severity: Severity, code: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Output of the risk assessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub risk_score: u8,
    pub warnings: Vec<RiskWarning>,
}

/// Cached verification result, keyed by MC or DOT number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub cache_key: String,
    pub mc_number: Option<String>,
    pub dot_number: Option<String>,
    pub snapshot: AuthoritySnapshot,
    pub risk_level: RiskLevel,
    pub risk_score: u8,
    pub warnings: Vec<RiskWarning>,
    pub verified_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl VerificationRecord {
    /// A record past `expires_at` counts as absent.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Why a verification did not produce authority data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum VerificationFailure {
    NotFound,
    Unavailable(String),
}

/// Result of `verify_carrier`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub verified: bool,
    pub data: Option<AuthoritySnapshot>,
    pub risk_level: RiskLevel,
    pub risk_score: u8,
    pub warnings: Vec<RiskWarning>,
    pub cached: bool,
    pub verified_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub failure: Option<VerificationFailure>,
}

impl VerificationOutcome {
    pub fn from_record(record: VerificationRecord, cached: bool) -> Self {
        Self {
            verified: true,
            data: Some(record.snapshot),
            risk_level: record.risk_level,
            risk_score: record.risk_score,
            warnings: record.warnings,
            cached,
            verified_at: record.verified_at,
            expires_at: Some(record.expires_at),
            failure: None,
        }
    }

    /// Unverified result: HIGH risk, score 0, a single critical warning.
    pub fn unverified(failure: VerificationFailure, message: String, now: DateTime<Utc>) -> Self {
        let code = match failure {
            VerificationFailure::NotFound => "not_found",
            VerificationFailure::Unavailable(_) => "unable_to_verify",
        };
        Self {
            verified: false,
            data: None,
            risk_level: RiskLevel::High,
            risk_score: 0,
            warnings: vec![RiskWarning::new(Severity::Critical, code, message)],
            cached: false,
            verified_at: now,
            expires_at: None,
            failure: Some(failure),
        }
    }
}

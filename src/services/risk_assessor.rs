//! Scores an authority snapshot into a risk tier with warnings.

use chrono::NaiveDate;

use crate::domain::models::{
    AuthoritySnapshot, OperatingStatus, RiskAssessment, RiskLevel, RiskWarning, SafetyRating, Severity,
};

/// Minimum liability coverage for general freight, in thousands of dollars.
pub const DEFAULT_LIABILITY_REQUIRED: u32 = 750;

const NEW_AUTHORITY_DAYS: i64 = 90;
const YOUNG_AUTHORITY_DAYS: i64 = 180;
const STALE_RECORD_DAYS: i64 = 730;
const VEHICLE_OOS_LIMIT: f64 = 30.0;
const DRIVER_OOS_LIMIT: f64 = 10.0;
const CRASH_COUNT_LIMIT: u32 = 5;

/// Running score floored at zero, plus the warnings raised along the way.
struct Tally {
    score: u8,
    warnings: Vec<RiskWarning>,
}

impl Tally {
    fn penalize(&mut self, points: u8, severity: Severity, code: &str, message: impl Into<String>) {
        self.score = self.score.saturating_sub(points);
        self.warnings.push(RiskWarning::new(severity, code, message));
    }
}

/// Subtracts fixed penalties from 100 for each triggered condition.
#[derive(Debug, Clone)]
pub struct RiskAssessor {
    liability_required: u32,
}

impl RiskAssessor {
    /// `liability_required` applies when the snapshot does not state its own requirement.
    pub const fn new(liability_required: u32) -> Self {
        Self { liability_required }
    }

    pub fn assess(&self, snapshot: &AuthoritySnapshot, today: NaiveDate) -> RiskAssessment {
        let mut tally = Tally {
            score: 100,
            warnings: Vec::new(),
        };

        if snapshot.operating_status != OperatingStatus::Authorized {
            tally.penalize(
                50,
                Severity::Critical,
                "not_authorized",
                format!("Operating status is {}", snapshot.operating_status.as_str()),
            );
        }

        if snapshot.operating_status == OperatingStatus::OutOfService || snapshot.out_of_service_date.is_some() {
            let message = snapshot.out_of_service_date.map_or_else(
                || "Carrier is placed out of service".to_string(),
                |date| format!("Carrier placed out of service on {date}"),
            );
            tally.penalize(40, Severity::Critical, "out_of_service", message);
        }

        match snapshot.safety_rating {
            Some(SafetyRating::Unsatisfactory) => {
                tally.penalize(35, Severity::Critical, "unsatisfactory_rating", "Safety rating is Unsatisfactory");
            }
            Some(SafetyRating::Conditional) => {
                tally.penalize(20, Severity::Warning, "conditional_rating", "Safety rating is Conditional");
            }
            _ => {}
        }

        let required = snapshot
            .liability_insurance_required
            .filter(|r| *r > 0)
            .unwrap_or(self.liability_required);
        match snapshot.liability_insurance_on_file {
            None | Some(0) => {
                tally.penalize(30, Severity::Critical, "liability_insurance", "No liability insurance on file");
            }
            Some(on_file) if on_file < required => tally.penalize(
                30,
                Severity::Critical,
                "liability_insurance",
                format!("Liability coverage ${on_file}K is below the required ${required}K"),
            ),
            Some(_) => {}
        }

        match snapshot.cargo_insurance_on_file {
            None | Some(0) => {
                tally.penalize(15, Severity::Warning, "cargo_insurance", "No cargo insurance on file");
            }
            Some(_) => {}
        }

        if let Some(granted) = snapshot.authority_granted_on {
            let age = (today - granted).num_days();
            if age < NEW_AUTHORITY_DAYS {
                tally.penalize(
                    15,
                    Severity::Warning,
                    "new_authority",
                    format!("Authority granted {age} days ago"),
                );
            } else if age < YOUNG_AUTHORITY_DAYS {
                tally.penalize(5, Severity::Info, "recent_authority", format!("Authority granted {age} days ago"));
            }
        }

        if let Some(updated) = snapshot.record_updated_on {
            let age = (today - updated).num_days();
            if age > STALE_RECORD_DAYS {
                tally.penalize(
                    10,
                    Severity::Warning,
                    "stale_record",
                    format!("Registration record last updated {updated} ({age} days ago)"),
                );
            }
        }

        if let Some(rate) = snapshot.vehicle_oos_rate {
            if rate > VEHICLE_OOS_LIMIT {
                tally.penalize(15, Severity::Warning, "vehicle_oos_rate", format!("Vehicle out-of-service rate {rate:.1}%"));
            } else if snapshot.vehicle_oos_national_average.is_some_and(|avg| rate > avg) {
                tally.penalize(
                    5,
                    Severity::Info,
                    "vehicle_oos_above_average",
                    format!("Vehicle out-of-service rate {rate:.1}% is above the national average"),
                );
            }
        }

        if let Some(rate) = snapshot.driver_oos_rate {
            if rate > DRIVER_OOS_LIMIT {
                tally.penalize(15, Severity::Warning, "driver_oos_rate", format!("Driver out-of-service rate {rate:.1}%"));
            } else if snapshot.driver_oos_national_average.is_some_and(|avg| rate > avg) {
                tally.penalize(
                    5,
                    Severity::Info,
                    "driver_oos_above_average",
                    format!("Driver out-of-service rate {rate:.1}% is above the national average"),
                );
            }
        }

        if let Some(fatal) = snapshot.fatal_crashes.filter(|n| *n > 0) {
            tally.penalize(20, Severity::Critical, "fatal_crash", format!("{fatal} fatal crash(es) on record"));
        }

        if let Some(total) = snapshot.total_crashes.filter(|n| *n > CRASH_COUNT_LIMIT) {
            tally.penalize(10, Severity::Warning, "crash_count", format!("{total} crashes on record"));
        }

        RiskAssessment {
            risk_level: RiskLevel::from_score(tally.score),
            risk_score: tally.score,
            warnings: tally.warnings,
        }
    }
}

impl Default for RiskAssessor {
    fn default() -> Self {
        Self::new(DEFAULT_LIABILITY_REQUIRED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    /// Authorized carrier with nothing to flag.
    fn clean() -> AuthoritySnapshot {
        AuthoritySnapshot {
            source: "test".to_string(),
            operating_status: OperatingStatus::Authorized,
            safety_rating: Some(SafetyRating::Satisfactory),
            liability_insurance_on_file: Some(1000),
            liability_insurance_required: Some(750),
            cargo_insurance_on_file: Some(100),
            authority_granted_on: Some(today() - Duration::days(2000)),
            record_updated_on: Some(today() - Duration::days(100)),
            vehicle_oos_rate: Some(10.0),
            vehicle_oos_national_average: Some(20.72),
            driver_oos_rate: Some(2.0),
            driver_oos_national_average: Some(5.51),
            total_crashes: Some(1),
            fatal_crashes: Some(0),
            ..AuthoritySnapshot::default()
        }
    }

    fn assess(snapshot: &AuthoritySnapshot) -> RiskAssessment {
        RiskAssessor::default().assess(snapshot, today())
    }

    #[test]
    fn test_clean_carrier_is_low_risk() {
        let result = assess(&clean());
        assert_eq!(result.risk_score, 100);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_exactly_eighty_is_low() {
        let snapshot = AuthoritySnapshot {
            safety_rating: Some(SafetyRating::Conditional),
            ..clean()
        };
        let result = assess(&snapshot);
        assert_eq!(result.risk_score, 80);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert_eq!(result.warnings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_seventy_five_is_medium() {
        let snapshot = AuthoritySnapshot {
            cargo_insurance_on_file: Some(0),
            record_updated_on: Some(today() - Duration::days(800)),
            ..clean()
        };
        let result = assess(&snapshot);
        assert_eq!(result.risk_score, 75);
        assert_eq!(result.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_exactly_fifty_is_medium_and_forty_five_is_high() {
        let snapshot = AuthoritySnapshot {
            operating_status: OperatingStatus::NotAuthorized,
            ..clean()
        };
        let result = assess(&snapshot);
        assert_eq!(result.risk_score, 50);
        assert_eq!(result.risk_level, RiskLevel::Medium);

        let snapshot = AuthoritySnapshot {
            operating_status: OperatingStatus::NotAuthorized,
            authority_granted_on: Some(today() - Duration::days(120)),
            ..clean()
        };
        let result = assess(&snapshot);
        assert_eq!(result.risk_score, 45);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_score_floors_at_zero() {
        let snapshot = AuthoritySnapshot {
            operating_status: OperatingStatus::OutOfService,
            out_of_service_date: Some(today() - Duration::days(3)),
            safety_rating: Some(SafetyRating::Unsatisfactory),
            liability_insurance_on_file: Some(0),
            fatal_crashes: Some(2),
            total_crashes: Some(9),
            ..clean()
        };
        let result = assess(&snapshot);
        assert_eq!(result.risk_score, 0);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(
            result.warnings.iter().filter(|w| w.severity == Severity::Critical).count(),
            5
        );
    }

    #[test]
    fn test_liability_below_required() {
        let snapshot = AuthoritySnapshot {
            liability_insurance_on_file: Some(500),
            liability_insurance_required: None,
            ..clean()
        };
        let result = assess(&snapshot);
        assert_eq!(result.risk_score, 70);
        assert_eq!(result.warnings[0].code, "liability_insurance");
    }

    #[test]
    fn test_unreported_insurance_counts_as_missing() {
        let snapshot = AuthoritySnapshot {
            liability_insurance_on_file: None,
            cargo_insurance_on_file: None,
            ..clean()
        };
        let result = assess(&snapshot);
        assert_eq!(result.risk_score, 55);
        assert_eq!(result.risk_level, RiskLevel::Medium);
        let severities: Vec<_> = result.warnings.iter().map(|w| (w.code.as_str(), w.severity)).collect();
        assert_eq!(
            severities,
            vec![("liability_insurance", Severity::Critical), ("cargo_insurance", Severity::Warning)]
        );
    }

    #[test]
    fn test_authority_age_bands() {
        let young = AuthoritySnapshot {
            authority_granted_on: Some(today() - Duration::days(30)),
            ..clean()
        };
        assert_eq!(assess(&young).risk_score, 85);

        let settling = AuthoritySnapshot {
            authority_granted_on: Some(today() - Duration::days(90)),
            ..clean()
        };
        assert_eq!(assess(&settling).risk_score, 95);
    }

    #[test]
    fn test_oos_rates() {
        let snapshot = AuthoritySnapshot {
            vehicle_oos_rate: Some(35.0),
            driver_oos_rate: Some(7.0),
            ..clean()
        };
        // -15 over the vehicle limit, -5 above the driver national average
        assert_eq!(assess(&snapshot).risk_score, 80);
    }

    #[test]
    fn test_minimal_snapshot_from_text_source() {
        let snapshot = AuthoritySnapshot {
            source: "snapshot_page".to_string(),
            operating_status: OperatingStatus::Authorized,
            legal_name: Some("ACME FREIGHT LLC".to_string()),
            ..AuthoritySnapshot::default()
        };
        let result = assess(&snapshot);
        // no insurance figures on the page
        assert_eq!(result.risk_score, 55);
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert!(result.warnings.iter().any(|w| w.code == "liability_insurance"));
    }
}

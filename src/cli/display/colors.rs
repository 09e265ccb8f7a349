//! Status, risk and severity color mapping for CLI output.
//!
//! `console` disables styling when stdout is not a terminal or `NO_COLOR` is set.

use console::{style, StyledObject};

use crate::domain::models::{CarrierStatus, RiskLevel, Severity};

/// Green for active, red for blacklisted, dim for inactive.
pub fn colorize_status(status: CarrierStatus) -> StyledObject<&'static str> {
    let text = status.as_str();
    match status {
        CarrierStatus::Active => style(text).green().bold(),
        CarrierStatus::Blacklisted => style(text).red().bold(),
        CarrierStatus::Inactive => style(text).dim(),
    }
}

pub fn colorize_risk(level: RiskLevel) -> StyledObject<&'static str> {
    let text = level.as_str();
    match level {
        RiskLevel::Low => style(text).green().bold(),
        RiskLevel::Medium => style(text).yellow().bold(),
        RiskLevel::High => style(text).red().bold(),
    }
}

pub fn colorize_severity(severity: Severity) -> StyledObject<&'static str> {
    match severity {
        Severity::Info => style("INFO").cyan(),
        Severity::Warning => style("WARNING").yellow(),
        Severity::Critical => style("CRITICAL").red().bold(),
    }
}

/// Performance score: green from 80, yellow from 50, red below.
pub fn colorize_score(score: u8) -> StyledObject<u8> {
    match score {
        80..=u8::MAX => style(score).green(),
        50..=79 => style(score).yellow(),
        _ => style(score).red(),
    }
}

/// Styled label for detail views (bold + dimmed colon).
pub fn label(name: &str) -> String {
    format!("{}{}", style(name).bold(), style(":").dim())
}

/// Section header with underline.
pub fn section_header(title: &str) -> String {
    format!("\n{}", style(title).bold().underlined())
}

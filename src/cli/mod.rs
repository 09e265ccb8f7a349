//! Command-line interface.

pub mod commands;
pub mod context;
pub mod display;
pub mod input;
pub mod progress;
pub mod types;

pub use types::{Cli, Commands};

use crate::domain::errors::DomainError;

/// Print a failed command's error and exit non-zero.
///
/// In JSON mode the error is written to stdout as `{"error": ..., "kind": ...}`
/// so scripted callers always get a parseable document.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let kind = err.downcast_ref::<DomainError>().map_or("error", error_kind);
    if json_mode {
        let body = serde_json::json!({
            "error": format!("{err:#}"),
            "kind": kind,
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{}", display::action_failure(&format!("{err:#}")));
    }
    std::process::exit(1);
}

const fn error_kind(err: &DomainError) -> &'static str {
    match err {
        DomainError::ValidationFailed(_) => "validation_failed",
        DomainError::IdentityConflict { .. } => "identity_conflict",
        DomainError::DuplicateKey { .. } => "duplicate_key",
        DomainError::ExternalService(_) => "external_service",
        DomainError::AuthorityNotFound(_) => "authority_not_found",
        DomainError::StatisticsUnavailable { .. } => "statistics_unavailable",
        DomainError::CarrierNotFound(_) => "carrier_not_found",
        DomainError::LoadNotFound(_) => "load_not_found",
        DomainError::InvalidStateTransition { .. } => "invalid_state_transition",
        DomainError::DatabaseError(_) => "database_error",
        DomainError::SerializationError(_) => "serialization_error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind() {
        assert_eq!(error_kind(&DomainError::CarrierNotFound(uuid::Uuid::nil())), "carrier_not_found");
        assert_eq!(
            error_kind(&DomainError::InvalidStateTransition {
                from: "blacklisted".to_string(),
                to: "inactive".to_string(),
            }),
            "invalid_state_transition"
        );
    }
}

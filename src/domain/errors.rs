//! Domain errors for the carrier registry.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors that can occur in the carrier registry.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The input carried no usable identifying signal; nothing is persisted.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// A phone number matched a carrier whose MC number disagrees with the candidate's.
    #[error(
        "Identity conflict: phone matched carrier {phone_match} (MC {existing_mc}) but candidate carries MC {candidate_mc}"
    )]
    IdentityConflict {
        phone_match: Uuid,
        candidate_mc: String,
        existing_mc: String,
    },

    /// A unique key (MC number) already exists; raised by concurrent creates.
    #[error("Duplicate key: {entity} {key} already exists")]
    DuplicateKey { entity: String, key: String },

    /// Both authority sources failed.
    #[error("External service failure: {0}")]
    ExternalService(String),

    /// The authority source has no record for the requested number.
    #[error("No authority record found for {0}")]
    AuthorityNotFound(String),

    /// Load history could not be read; cached statistics were left untouched.
    #[error("Statistics unavailable for carrier {carrier_id}: {reason}")]
    StatisticsUnavailable { carrier_id: Uuid, reason: String },

    #[error("Carrier not found: {0}")]
    CarrierNotFound(Uuid),

    #[error("Load not found: {0}")]
    LoadNotFound(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DomainError {
    /// Errors that upstream callers may retry without corrupting state.
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DuplicateKey { .. }
                | Self::ExternalService(_)
                | Self::StatisticsUnavailable { .. }
                | Self::DatabaseError(_)
        )
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

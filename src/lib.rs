//! Carrier Registry - carrier identity resolution, statistics and risk assessment
//!
//! Turns freight-call extractions into durable carrier records: candidates are
//! normalized from loose extraction payloads, resolved against existing
//! carriers by MC number, DOT number or phone, merged field by field, linked to
//! loads, and scored from their load history. Carriers can be verified against
//! the regulatory authority, with results cached and risk-scored.
//!
//! # Architecture
//!
//! Hexagonal layout:
//!
//! - **Domain Layer** (`domain`): models, errors and port traits
//! - **Adapters** (`adapters`): `SQLite` persistence and authority HTTP sources
//! - **Service Layer** (`services`): the resolution, merge, statistics,
//!   verification and linkage pipeline
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use carrier_registry::adapters::sqlite::*;
//! use carrier_registry::services::CallLinkageCoordinator;
//!
//! let pool = initialize_database(&DatabaseConfig::default()).await?;
//! let coordinator = CallLinkageCoordinator::new(
//!     Arc::new(SqliteCarrierRepository::new(pool.clone())),
//!     Arc::new(SqliteLoadRepository::new(pool.clone())),
//!     Arc::new(SqliteInteractionLog::new(pool)),
//!     IdentityConfig::default(),
//!     &LinkageConfig::default(),
//! );
//! let result = coordinator.process_call(&extraction, context, None).await?;
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    CallContext, CallExtraction, CarrierCandidate, CarrierEntity, CarrierStatisticsSnapshot, Config,
    RiskAssessment, RiskLevel, VerificationOutcome,
};
pub use domain::ports::{
    AuthoritySource, CandidateExtractor, CarrierRepository, InteractionLog, LoadRepository,
    VerificationRepository,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    CallLinkageCoordinator, CallLinkageResult, ExtractionNormalizer, IdentityResolver, MergePolicy,
    RiskAssessor, StatisticsEngine, VerificationService,
};

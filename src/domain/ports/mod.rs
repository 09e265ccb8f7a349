//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that adapters must implement:
//! - CarrierRepository: carrier persistence and identity lookups
//! - LoadRepository: load history reads and carrier link writes
//! - InteractionLog: append-only call/carrier interaction log
//! - VerificationRepository: cache of authority verification results
//! - AuthoritySource: one external regulatory data source
//! - CandidateExtractor: free-text signal recovery
//!
//! These traits keep the services independent of `SQLite` and HTTP.

pub mod authority_source;
pub mod candidate_extractor;
pub mod carrier_repository;
pub mod interaction_log;
pub mod load_repository;
pub mod verification_repository;

pub use authority_source::{AuthorityLookup, AuthoritySource, SourceError};
pub use candidate_extractor::CandidateExtractor;
pub use carrier_repository::{CarrierFilter, CarrierRepository};
pub use interaction_log::InteractionLog;
pub use load_repository::LoadRepository;
pub use verification_repository::VerificationRepository;

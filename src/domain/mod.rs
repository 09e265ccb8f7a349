//! Domain layer for the carrier registry
//!
//! This module contains the carrier data model, the error taxonomy, and the
//! port traits that persistence and authority adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};

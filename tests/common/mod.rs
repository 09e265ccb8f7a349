//! Common test utilities for integration tests
//!
//! Provides a migrated registry on an in-memory or file-backed database and
//! helpers for building call extractions.

#![allow(dead_code)]

use std::sync::Arc;

use carrier_registry::adapters::sqlite::{
    create_migrated_test_pool, initialize_database, SqliteCarrierRepository, SqliteInteractionLog,
    SqliteLoadRepository, SqliteVerificationRepository,
};
use carrier_registry::domain::models::{CallContext, CallExtraction, DatabaseConfig, IdentityConfig, LinkageConfig};
use carrier_registry::services::CallLinkageCoordinator;
use chrono::Utc;
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

/// Repositories sharing one migrated pool.
pub struct TestRegistry {
    pub pool: SqlitePool,
    pub carriers: Arc<SqliteCarrierRepository>,
    pub loads: Arc<SqliteLoadRepository>,
    pub interactions: Arc<SqliteInteractionLog>,
    pub verifications: Arc<SqliteVerificationRepository>,
    /// Keeps a file-backed database alive for the test's duration.
    _dir: Option<TempDir>,
}

impl TestRegistry {
    /// In-memory database.
    pub async fn in_memory() -> Self {
        let pool = create_migrated_test_pool().await.expect("Failed to create test pool");
        Self::from_pool(pool, None)
    }

    /// File-backed database with several connections, for concurrency tests.
    pub async fn on_disk() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = DatabaseConfig {
            path: dir.path().join("registry.db").display().to_string(),
            max_connections: 4,
        };
        let pool = initialize_database(&config).await.expect("Failed to initialize database");
        Self::from_pool(pool, Some(dir))
    }

    fn from_pool(pool: SqlitePool, dir: Option<TempDir>) -> Self {
        Self {
            carriers: Arc::new(SqliteCarrierRepository::new(pool.clone())),
            loads: Arc::new(SqliteLoadRepository::new(pool.clone())),
            interactions: Arc::new(SqliteInteractionLog::new(pool.clone())),
            verifications: Arc::new(SqliteVerificationRepository::new(pool.clone())),
            pool,
            _dir: dir,
        }
    }

    pub fn coordinator(&self) -> CallLinkageCoordinator {
        CallLinkageCoordinator::new(
            self.carriers.clone(),
            self.loads.clone(),
            self.interactions.clone(),
            IdentityConfig::default(),
            &LinkageConfig::default(),
        )
    }
}

/// A carrier call extraction with the given `carrier_information` block.
pub fn carrier_call(carrier_information: serde_json::Value) -> CallExtraction {
    serde_json::from_value(serde_json::json!({
        "call_type": "carrier_call",
        "summary": "Carrier called about an open load",
        "carrier_information": carrier_information,
    }))
    .expect("valid extraction")
}

pub fn context(organization_id: Uuid) -> CallContext {
    CallContext::new(organization_id, Utc::now())
}

/// Setup test logging
///
/// Initializes a tracing subscriber writing to the test output.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

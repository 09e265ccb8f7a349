//! Process-scoped wiring: one pool, one set of repositories, services built
//! on demand from the loaded configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::adapters::authority::FallbackAuthorityClient;
use crate::adapters::sqlite::{
    initialize_database, SqliteCarrierRepository, SqliteInteractionLog, SqliteLoadRepository,
    SqliteVerificationRepository,
};
use crate::domain::models::Config;
use crate::services::{CallLinkageCoordinator, CarrierService, RiskAssessor, StatisticsEngine, VerificationService};

pub struct AppContext {
    pub config: Config,
    pub pool: SqlitePool,
    pub carriers: Arc<SqliteCarrierRepository>,
    pub loads: Arc<SqliteLoadRepository>,
    pub interactions: Arc<SqliteInteractionLog>,
    pub verifications: Arc<SqliteVerificationRepository>,
}

impl AppContext {
    /// Open the configured database and apply pending migrations.
    pub async fn open(config: Config) -> Result<Self> {
        let pool = initialize_database(&config.database)
            .await
            .with_context(|| {
                format!(
                    "Failed to open database at {}. Run 'carrier-registry init' first.",
                    config.database.path
                )
            })?;
        Ok(Self::from_pool(config, pool))
    }

    pub fn from_pool(config: Config, pool: SqlitePool) -> Self {
        Self {
            carriers: Arc::new(SqliteCarrierRepository::new(pool.clone())),
            loads: Arc::new(SqliteLoadRepository::new(pool.clone())),
            interactions: Arc::new(SqliteInteractionLog::new(pool.clone())),
            verifications: Arc::new(SqliteVerificationRepository::new(pool.clone())),
            config,
            pool,
        }
    }

    pub fn carrier_service(&self) -> CarrierService {
        CarrierService::new(self.carriers.clone(), self.interactions.clone())
    }

    pub fn statistics_engine(&self) -> StatisticsEngine {
        StatisticsEngine::new(self.carriers.clone(), self.loads.clone())
    }

    /// Verification against the live authority sources.
    pub fn verification_service(&self) -> Result<VerificationService> {
        let verification = &self.config.verification;
        let source = FallbackAuthorityClient::from_config(verification)
            .context("Failed to build authority HTTP clients")?;
        let ttl = chrono::Duration::hours(i64::from(verification.cache_ttl_hours));

        Ok(VerificationService::new(
            self.verifications.clone(),
            Arc::new(source),
            self.carriers.clone(),
            RiskAssessor::default(),
            ttl,
        )
        .with_refresh_delay(self.replay_delay()))
    }

    /// The call-linkage pipeline; verification is attached only when
    /// `linkage.verify_on_link` is set.
    pub fn coordinator(&self) -> Result<CallLinkageCoordinator> {
        let mut coordinator = CallLinkageCoordinator::new(
            self.carriers.clone(),
            self.loads.clone(),
            self.interactions.clone(),
            self.config.identity.clone(),
            &self.config.linkage,
        )
        .with_replay_delay(self.replay_delay());

        if self.config.linkage.verify_on_link {
            coordinator = coordinator.with_verification(Arc::new(self.verification_service()?));
        }
        Ok(coordinator)
    }

    fn replay_delay(&self) -> Duration {
        Duration::from_millis(self.config.reprocess.delay_ms)
    }
}

use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project-local directory holding configuration and the default database.
pub const CONFIG_DIR: &str = ".carrier-registry";

/// Prefix of environment overrides; `__` separates nested keys.
pub const ENV_PREFIX: &str = "CARRIER_REGISTRY_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid verification timeout: {0}s. Must be between 1 and 60")]
    InvalidTimeout(u64),

    #[error("Invalid cache_ttl_hours: {0}. Must be at least 1")]
    InvalidCacheTtl(u32),

    #[error("Invalid requests_per_second: {0}. Must be positive")]
    InvalidRateLimit(u32),

    #[error("Invalid min_phone_digits: {0}. Must be at least 4")]
    InvalidMinPhoneDigits(usize),

    #[error("Invalid review_confidence_threshold: {0}. Must be at most 100")]
    InvalidReviewThreshold(u8),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration relative to the working directory
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .carrier-registry/config.yaml (project config, created by init)
    /// 3. .carrier-registry/local.yaml (local overrides, optional)
    /// 4. Environment variables (CARRIER_REGISTRY_* prefix)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(Path::new("."))
    }

    /// Same precedence as [`Self::load`], rooted at `root`.
    pub fn load_from_dir(root: &Path) -> Result<Config> {
        let dir = root.join(CONFIG_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        let verification = &config.verification;
        if !(1..=60).contains(&verification.timeout_secs) {
            return Err(ConfigError::InvalidTimeout(verification.timeout_secs));
        }
        if verification.cache_ttl_hours == 0 {
            return Err(ConfigError::InvalidCacheTtl(verification.cache_ttl_hours));
        }
        if verification.requests_per_second == 0 {
            return Err(ConfigError::InvalidRateLimit(verification.requests_per_second));
        }
        for (name, url) in [
            ("primary_base_url", &verification.primary_base_url),
            ("secondary_base_url", &verification.secondary_base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::ValidationFailed(format!(
                    "verification.{name} must be an http(s) URL, got '{url}'"
                )));
            }
        }

        if config.identity.min_phone_digits < 4 {
            return Err(ConfigError::InvalidMinPhoneDigits(config.identity.min_phone_digits));
        }
        if config.linkage.review_confidence_threshold > 100 {
            return Err(ConfigError::InvalidReviewThreshold(
                config.linkage.review_confidence_threshold,
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::PhoneMatchMode;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.path, ".carrier-registry/registry.db");
        assert_eq!(config.verification.timeout_secs, 12);
        assert_eq!(config.verification.cache_ttl_hours, 24);
        assert_eq!(config.identity.phone_match, PhoneMatchMode::Contains);
        assert_eq!(config.linkage.review_confidence_threshold, 40);
        assert_eq!(config.reprocess.delay_ms, 250);
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
database:
  path: /custom/registry.db
  max_connections: 3
logging:
  level: debug
  format: json
identity:
  phone_match: exact
verification:
  web_key: abc123
  timeout_secs: 10
";
        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");
        assert_eq!(config.database.path, "/custom/registry.db");
        assert_eq!(config.database.max_connections, 3);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.identity.phone_match, PhoneMatchMode::Exact);
        assert_eq!(config.identity.min_phone_digits, 7);
        assert_eq!(config.verification.web_key.as_deref(), Some("abc123"));
        assert!(config.verification.secondary_enabled);
        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "verbose"),
            other => panic!("Expected InvalidLogLevel, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidLogFormat(_)
        ));
    }

    #[test]
    fn test_validate_empty_database_path() {
        let mut config = Config::default();
        config.database.path = "  ".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::EmptyDatabasePath
        ));
    }

    #[test]
    fn test_validate_zero_max_connections() {
        let mut config = Config::default();
        config.database.max_connections = 0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMaxConnections(0)
        ));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let mut config = Config::default();
        config.verification.timeout_secs = 0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidTimeout(0)
        ));
        config.verification.timeout_secs = 61;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidTimeout(61)
        ));
    }

    #[test]
    fn test_validate_zero_ttl_and_rate() {
        let mut config = Config::default();
        config.verification.cache_ttl_hours = 0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidCacheTtl(0)
        ));

        let mut config = Config::default();
        config.verification.requests_per_second = 0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidRateLimit(0)
        ));
    }

    #[test]
    fn test_validate_short_phone_digits() {
        let mut config = Config::default();
        config.identity.min_phone_digits = 3;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMinPhoneDigits(3)
        ));
    }

    #[test]
    fn test_validate_bad_url() {
        let mut config = Config::default();
        config.verification.primary_base_url = "ftp://example.com".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::ValidationFailed(_)
        ));
    }

    #[test]
    fn test_hierarchical_merging() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join(CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("config.yaml"),
            "logging:\n  level: info\n  format: json\nreprocess:\n  delay_ms: 500\n",
        )
        .unwrap();
        fs::write(dir.join("local.yaml"), "logging:\n  level: debug\n").unwrap();

        let config = temp_env::with_vars(
            [
                ("CARRIER_REGISTRY_REPROCESS__DELAY_MS", Some("10")),
                ("CARRIER_REGISTRY_IDENTITY__PHONE_MATCH", Some("exact")),
            ],
            || ConfigLoader::load_from_dir(root.path()),
        )
        .unwrap();

        assert_eq!(config.logging.level, "debug", "local.yaml should win over config.yaml");
        assert_eq!(config.logging.format, "json", "Base value should persist when not overridden");
        assert_eq!(config.reprocess.delay_ms, 10, "Environment should win over files");
        assert_eq!(config.identity.phone_match, PhoneMatchMode::Exact);
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let root = tempfile::tempdir().unwrap();
        let config = ConfigLoader::load_from_file(root.path().join("absent.yaml")).unwrap();
        assert_eq!(config.verification.requests_per_second, 5);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("config.yaml");
        fs::write(&path, "verification:\n  timeout_secs: 500\n").unwrap();
        let err = ConfigLoader::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }
}

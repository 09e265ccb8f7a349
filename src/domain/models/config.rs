use serde::{Deserialize, Serialize};

/// Main configuration structure for the carrier registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// External authority verification configuration
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Identity resolution configuration
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Call linkage configuration
    #[serde(default)]
    pub linkage: LinkageConfig,

    /// Historical replay configuration
    #[serde(default)]
    pub reprocess: ReprocessConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".carrier-registry/registry.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,

    /// Number of days to retain logs
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

const fn default_retention_days() -> u32 {
    30
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
            retention_days: default_retention_days(),
        }
    }
}

/// Authority verification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VerificationConfig {
    /// Base URL of the structured authority API
    #[serde(default = "default_primary_base_url")]
    pub primary_base_url: String,

    /// Base URL of the company snapshot page used as fallback
    #[serde(default = "default_secondary_base_url")]
    pub secondary_base_url: String,

    /// Web key for the structured API
    #[serde(default)]
    pub web_key: Option<String>,

    /// Whether to fall back to the snapshot page
    #[serde(default = "default_true")]
    pub secondary_enabled: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Lifetime of cached verification results in hours
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u32,

    /// Outbound requests per second across both sources
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

fn default_primary_base_url() -> String {
    "https://mobile.fmcsa.dot.gov/qc/services".to_string()
}

fn default_secondary_base_url() -> String {
    "https://safer.fmcsa.dot.gov".to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_timeout_secs() -> u64 {
    12
}

const fn default_cache_ttl_hours() -> u32 {
    24
}

const fn default_requests_per_second() -> u32 {
    5
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            primary_base_url: default_primary_base_url(),
            secondary_base_url: default_secondary_base_url(),
            web_key: None,
            secondary_enabled: default_true(),
            timeout_secs: default_timeout_secs(),
            cache_ttl_hours: default_cache_ttl_hours(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

/// How the phone strategy compares normalized numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhoneMatchMode {
    /// Candidate digits appear anywhere in the stored digits.
    #[default]
    Contains,
    /// Candidate digits equal the stored digits.
    Exact,
}

/// Identity resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IdentityConfig {
    #[serde(default)]
    pub phone_match: PhoneMatchMode,

    /// Shorter normalized phones are not used for matching
    #[serde(default = "default_min_phone_digits")]
    pub min_phone_digits: usize,
}

const fn default_min_phone_digits() -> usize {
    7
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            phone_match: PhoneMatchMode::default(),
            min_phone_digits: default_min_phone_digits(),
        }
    }
}

/// Call linkage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LinkageConfig {
    /// New carriers below this confidence are flagged for review
    #[serde(default = "default_review_confidence_threshold")]
    pub review_confidence_threshold: u8,

    /// Verify authority after each linkage
    #[serde(default)]
    pub verify_on_link: bool,
}

const fn default_review_confidence_threshold() -> u8 {
    40
}

impl Default for LinkageConfig {
    fn default() -> Self {
        Self {
            review_confidence_threshold: default_review_confidence_threshold(),
            verify_on_link: false,
        }
    }
}

/// Historical replay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReprocessConfig {
    /// Pause between replayed items in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

const fn default_delay_ms() -> u64 {
    250
}

impl Default for ReprocessConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
        }
    }
}

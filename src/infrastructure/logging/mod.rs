//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON or pretty formatting
//! - Rolling file output with retention cleanup

pub mod config;
pub mod logger;
pub mod retention;

pub use config::{LogConfig, LogFormat, RotationPolicy};
pub use logger::{LoggerImpl, LOG_FILE_PREFIX};
pub use retention::LogRetention;

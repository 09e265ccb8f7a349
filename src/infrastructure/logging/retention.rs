//! Retention cleanup for rolled log files
//!
//! `tracing-appender` rolls files as `<prefix>.<date>`; nothing prunes them,
//! so files older than the retention window are removed at startup.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::path::Path;
use tracing::{debug, info, warn};

/// Deletes rolled log files older than `retention_days`
#[derive(Debug, Clone)]
pub struct LogRetention {
    retention_days: u32,
}

impl LogRetention {
    pub const fn new(retention_days: u32) -> Self {
        Self { retention_days }
    }

    /// Remove files in `log_dir` whose name starts with `prefix` and whose
    /// modification time is before the retention cutoff
    ///
    /// # Returns
    /// Number of files deleted
    pub async fn cleanup_old_logs(&self, log_dir: impl AsRef<Path>, prefix: &str) -> Result<usize> {
        let log_dir = log_dir.as_ref();

        if !log_dir.exists() {
            warn!(path = %log_dir.display(), "log directory does not exist");
            return Ok(0);
        }

        let cutoff = Utc::now() - Duration::days(i64::from(self.retention_days));
        let mut deleted_count = 0;

        let mut entries = tokio::fs::read_dir(log_dir)
            .await
            .context("failed to read log directory")?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .context("failed to read directory entry")?
        {
            let path = entry.path();
            let is_log = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix));
            if !is_log {
                continue;
            }

            let metadata = tokio::fs::metadata(&path)
                .await
                .context("failed to get file metadata")?;
            let modified: DateTime<Utc> = metadata
                .modified()
                .context("failed to get file modification time")?
                .into();

            if modified < cutoff {
                tokio::fs::remove_file(&path)
                    .await
                    .context("failed to delete old log file")?;
                debug!(path = %path.display(), "deleted old log file");
                deleted_count += 1;
            }
        }

        if deleted_count > 0 {
            info!(count = deleted_count, "cleaned up old log files");
        }

        Ok(deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::time::{sleep, Duration as TokioDuration};

    #[tokio::test]
    async fn test_cleanup_deletes_expired_files() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("registry.log.2024-01-01"), b"old").unwrap();
        std::fs::write(temp_dir.path().join("registry.log.2024-01-02"), b"old").unwrap();

        let retention = LogRetention::new(0);
        sleep(TokioDuration::from_millis(20)).await;

        let deleted = retention.cleanup_old_logs(temp_dir.path(), "registry.log").await.unwrap();
        assert_eq!(deleted, 2);
    }

    #[tokio::test]
    async fn test_cleanup_ignores_other_files() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("registry.db"), b"data").unwrap();
        std::fs::write(temp_dir.path().join("registry.log.2024-01-01"), b"log").unwrap();

        let retention = LogRetention::new(0);
        sleep(TokioDuration::from_millis(20)).await;
        retention.cleanup_old_logs(temp_dir.path(), "registry.log").await.unwrap();

        assert!(temp_dir.path().join("registry.db").exists());
        assert!(!temp_dir.path().join("registry.log.2024-01-01").exists());
    }

    #[tokio::test]
    async fn test_recent_files_are_kept() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("registry.log.today"), b"log").unwrap();

        let retention = LogRetention::new(30);
        let deleted = retention.cleanup_old_logs(temp_dir.path(), "registry.log").await.unwrap();
        assert_eq!(deleted, 0);
    }

    #[tokio::test]
    async fn test_cleanup_handles_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let retention = LogRetention::new(30);
        let result = retention
            .cleanup_old_logs(temp_dir.path().join("nonexistent"), "registry.log")
            .await;
        assert_eq!(result.unwrap(), 0);
    }
}

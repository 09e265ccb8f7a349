//! Implementation of the `carrier-registry init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tokio::fs;

use crate::adapters::sqlite::initialize_database;
use crate::cli::display::{output, CommandOutput};
use crate::domain::models::{Config, DatabaseConfig};
use crate::infrastructure::config::CONFIG_DIR;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite config.yaml with defaults even if it exists
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub initialized_path: PathBuf,
    pub directories_created: Vec<String>,
    pub config_written: bool,
    pub database_path: PathBuf,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if !self.directories_created.is_empty() {
            lines.push("\nCreated directories:".to_string());
            for dir in &self.directories_created {
                lines.push(format!("  - {dir}"));
            }
        }
        if self.config_written {
            lines.push(format!("\nWrote {CONFIG_DIR}/config.yaml"));
        }
        lines.push(format!("Database ready at {}", self.database_path.display()));
        lines.join("\n")
    }
}

/// Create the config directory, write defaults and migrate the database.
///
/// The database is never removed; `--force` only rewrites the config file.
pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let target_path = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(&args.path)
    };

    let config_dir = target_path.join(CONFIG_DIR);
    let mut directories_created = vec![];
    for dir in [config_dir.clone(), config_dir.join("logs")] {
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let relative = dir
                .strip_prefix(&target_path)
                .unwrap_or(&dir)
                .to_string_lossy()
                .to_string();
            directories_created.push(relative);
        }
    }

    let config_path = config_dir.join("config.yaml");
    let config_written = if args.force || !config_path.exists() {
        let yaml = serde_yaml::to_string(&Config::default()).context("Failed to serialize default config")?;
        fs::write(&config_path, yaml)
            .await
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        true
    } else {
        false
    };

    let defaults = Config::default();
    let database_path = target_path.join(&defaults.database.path);
    let database = DatabaseConfig {
        path: database_path.display().to_string(),
        ..defaults.database
    };
    let pool = initialize_database(&database)
        .await
        .context("Failed to initialize database")?;
    pool.close().await;

    let message = if directories_created.is_empty() && !config_written {
        "Already initialized; database migrations are up to date.".to_string()
    } else {
        "Carrier registry initialized.".to_string()
    };

    output(
        &InitOutput {
            success: true,
            message,
            initialized_path: target_path,
            directories_created,
            config_written,
            database_path,
        },
        json_mode,
    );
    Ok(())
}

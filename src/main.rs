//! Carrier registry CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;

use carrier_registry::cli::commands::{carrier, ingest, init, reprocess, verify};
use carrier_registry::cli::{handle_error, Cli, Commands};
use carrier_registry::domain::models::Config;
use carrier_registry::infrastructure::config::ConfigLoader;
use carrier_registry::infrastructure::logging::{LogConfig, LogRetention, LoggerImpl, LOG_FILE_PREFIX};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(err, json);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    let _logger = init_logging(&config).await?;

    match cli.command {
        Commands::Init(args) => init::execute(args, cli.json).await,
        Commands::Ingest(args) => ingest::execute(args, config, cli.json).await,
        Commands::Reprocess(args) => reprocess::execute(args, config, cli.json).await,
        Commands::Carrier(args) => carrier::execute(args, config, cli.json).await,
        Commands::Verify(args) => verify::execute(args, config, cli.json).await,
        Commands::VerifyRefresh(args) => verify::execute_refresh(args, config, cli.json).await,
        Commands::VerifyPurge(args) => verify::execute_purge(args, config, cli.json).await,
    }
}

/// Install the subscriber and prune rolled files past retention.
async fn init_logging(config: &Config) -> Result<LoggerImpl> {
    let log_config = LogConfig::try_from(&config.logging)?;
    let logger = LoggerImpl::init(&log_config).context("Failed to initialize logging")?;

    if let Some(dir) = &log_config.log_dir {
        let retention = LogRetention::new(log_config.retention_days);
        if let Err(e) = retention.cleanup_old_logs(dir, LOG_FILE_PREFIX).await {
            tracing::warn!(error = %e, "log retention cleanup failed");
        }
    }
    Ok(logger)
}

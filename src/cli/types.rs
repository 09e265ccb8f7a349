//! CLI type definitions
//!
//! Top-level clap structures. Each subcommand's arguments live with its
//! implementation under `commands`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::{
    carrier::CarrierArgs, ingest::IngestArgs, init::InitArgs, reprocess::ReprocessArgs,
    verify::{VerifyArgs, VerifyPurgeArgs, VerifyRefreshArgs},
};

#[derive(Parser, Debug)]
#[command(name = "carrier-registry")]
#[command(about = "Carrier identity resolution, statistics and authority risk scoring", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .carrier-registry/config.yaml layering)
    #[arg(short, long, global = true, env = "CARRIER_REGISTRY_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the configuration directory, default config and database
    Init(InitArgs),

    /// Run call extractions through the carrier linkage pipeline
    Ingest(IngestArgs),

    /// Replay historical calls with throttling and a summary
    Reprocess(ReprocessArgs),

    /// Carrier directory commands
    Carrier(CarrierArgs),

    /// Verify a carrier against the regulatory authority
    Verify(VerifyArgs),

    /// Re-verify expired cache entries
    VerifyRefresh(VerifyRefreshArgs),

    /// Delete expired verification cache entries
    VerifyPurge(VerifyPurgeArgs),
}

//! CLI command implementations.

pub mod carrier;
pub mod ingest;
pub mod init;
pub mod reprocess;
pub mod verify;

//! Adapters: `SQLite` persistence and the external authority sources.

pub mod authority;
pub mod sqlite;

//! Database facade for Tessera
//!
//! This crate ties the lower layers together:
//! - DatabaseConfig: engine choice and durability, from `tessera.toml`
//! - Database: owns one storage engine and hands out transactions
//! - Scoped transactions: `view` (read-only) and `update` (commit on
//!   success, roll back on error), with optional retry on conflict

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;

pub use database::config::{DatabaseConfig, EngineKind, CONFIG_FILE_NAME};
pub use database::{Database, RetryConfig};

//! Durability layer for Tessera
//!
//! This crate handles everything that touches disk:
//!
//! - WAL: append-only log with one record per committed transaction
//! - Entry framing with CRC32 checksums
//! - Durability modes: Always, Standard (default)
//! - Torn-tail repair when a log is reopened

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoding;
pub mod mode;
pub mod wal;

pub use encoding::{decode_entry, encode_entry};
pub use mode::DurabilityMode;
pub use wal::{CommitRecord, Mutation, Wal};

//! Storage layer for Tessera
//!
//! This crate implements the pluggable transactional key-value store that
//! tables are built on:
//! - `Engine` / `Transaction`: the storage abstraction, as trait objects
//! - `Snapshot`: copy-on-write committed state shared by every engine
//! - Write-write conflict validation at commit (first committer wins)
//! - `MemoryEngine`: nothing survives the process
//! - `LogEngine`: the same state machine behind a write-ahead log
//!
//! Every transaction reads the snapshot published when it began plus its
//! own uncommitted writes. Commits are serialized; readers never block.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod log;
pub mod memory;
pub mod state;
pub mod traits;
pub mod transaction;
pub mod validation;

pub use log::LogEngine;
pub use memory::MemoryEngine;
pub use state::{Bucket, Snapshot};
pub use traits::{Cancellable, Engine, Entries, Entry, Transaction};
pub use transaction::{KvTransaction, StoreCore};
pub use validation::{validate_transaction, ConflictType, Read, ReadSet, ValidationResult};

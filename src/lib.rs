//! Tessera - embedded record store with composable readers
//!
//! Records are ordered sets of typed, named fields. They live in tables
//! (buckets of a transactional key-value engine) and are consumed through
//! [`Reader`]s: lazy, immutable pipelines that filter, map, count, group and
//! concatenate record streams.
//!
//! # Quick Start
//!
//! ```
//! use tessera::{Database, Field, FieldBuffer, Table};
//!
//! let db = Database::ephemeral();
//! db.update(|txn| {
//!     let people = Table::create(txn, "people")?;
//!     for (i, name) in ["ann", "bob", "cid"].iter().enumerate() {
//!         let rec = FieldBuffer::from_fields([
//!             Field::int64("id", i as i64),
//!             Field::string("name", *name),
//!         ])?;
//!         people.insert(txn, &rec)?;
//!     }
//!     Ok(())
//! })?;
//!
//! let adults = db.view(|txn| {
//!     let people = Table::open(txn, "people")?;
//!     people
//!         .reader(txn)
//!         .filter(|r| Ok(r.field("id")?.as_int64()? > 0))
//!         .count()
//! })?;
//! assert_eq!(adults, 2);
//! # Ok::<(), tessera::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `tessera-core`: fields, values, records and their wire encoding
//! - `tessera-durability`: write-ahead log
//! - `tessera-storage`: storage engine trait, memory and log engines
//! - `tessera-table`: tables, record stores, readers and groups
//! - `tessera-engine`: database handle and configuration

pub use tessera_core::{
    decode_record, encode_record, CancelToken, EncodedRecord, Error, Field, FieldBuffer,
    FieldType, Record, Result, Value,
};
pub use tessera_durability::DurabilityMode;
pub use tessera_engine::{Database, DatabaseConfig, EngineKind, RetryConfig};
pub use tessera_storage::{Engine, LogEngine, MemoryEngine, Transaction};
pub use tessera_table::{GroupReader, Reader, RecordBuffer, RecordStore, Table, TableStore};

//! Record streams for Tessera
//!
//! This crate turns stored bytes into records and records into composable
//! streams:
//! - RecordStore: anything that can visit records in a defined order
//! - RecordBuffer: owned, in-memory record store
//! - Reader: lazy, immutable stream with a sticky error
//! - GroupReader: a Reader partitioned by a field's decoded value
//! - TableStore / Table: records kept in a storage engine bucket
//!
//! Operators never panic on bad data. The first failure becomes the
//! Reader's error and every Reader derived from it carries the same error.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod group;
pub mod reader;
pub mod store;
pub mod table;

pub use group::GroupReader;
pub use reader::Reader;
pub use store::{RecordBuffer, RecordStore};
pub use table::{Table, TableStore};

//! Core types for Tessera
//!
//! This crate defines the foundational types used throughout the system:
//! - FieldType: Type tag for field data
//! - Value: Decoded form of a field
//! - Field: Named, typed, encoded scalar
//! - Record: Ordered collection of uniquely-named fields (trait + FieldBuffer)
//! - codec: Order-preserving binary encodings for every field type
//! - encoding: Byte layout of a whole record (EncodedRecord, encode_record)
//! - CancelToken: Cooperative cancellation flag for long scans
//! - Error: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cancel;
pub mod codec;
pub mod encoding;
pub mod error;
pub mod field;
pub mod record;
pub mod types;
pub mod value;

pub use cancel::CancelToken;
pub use encoding::{decode_record, encode_record, EncodedRecord};
pub use error::{Error, Result};
pub use field::Field;
pub use record::{FieldBuffer, Record};
pub use types::FieldType;
pub use value::Value;

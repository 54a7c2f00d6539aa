//! Error types for Tessera
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! `Error` is `Clone`: a failed reader hands the same error to every reader
//! derived from it, so non-cloneable payloads (I/O errors, user callback
//! errors) are kept behind an `Arc`.

use crate::types::FieldType;
use std::error::Error as StdError;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for Tessera operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error raised by a user-supplied predicate, transform or visitor
pub type UserError = Arc<dyn StdError + Send + Sync>;

/// Error types for Tessera
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Record has no field with this name
    #[error("field not found: {0}")]
    FieldNotFound(String),

    /// Record already has a field with this name
    #[error("duplicate field: {0}")]
    DuplicateField(String),

    /// Field was read as a type other than the one it was stored with
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Type requested by the caller
        expected: FieldType,
        /// Type the field was stored with
        actual: FieldType,
    },

    /// Fewer bytes present than the type requires
    #[error("truncated {field_type} data: need {expected} bytes, have {actual}")]
    Truncated {
        /// Type being decoded
        field_type: FieldType,
        /// Bytes required
        expected: usize,
        /// Bytes present
        actual: usize,
    },

    /// Bytes present but not a valid encoding
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Transaction lost a write-write race at commit time
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// Operation stopped by a cancellation token
    #[error("operation cancelled")]
    Cancelled,

    /// Failure returned by a user callback, wrapped verbatim
    #[error(transparent)]
    User(UserError),

    /// Bucket does not exist
    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    /// Bucket already exists
    #[error("bucket already exists: {0}")]
    BucketExists(String),

    /// Key not found in bucket
    #[error("key not found: {0:?}")]
    KeyNotFound(Vec<u8>),

    /// Another engine instance holds the database directory
    #[error("database at '{0}' is already in use by another process")]
    DatabaseLocked(String),

    /// Write attempted through a read-only transaction
    #[error("transaction is read-only")]
    ReadOnlyTransaction,

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Data corruption detected
    #[error("data corruption: {0}")]
    Corruption(String),

    /// Log entry cut short (partial write at end of file)
    #[error("incomplete entry at offset {offset}: have {have} bytes, need {needed}")]
    IncompleteEntry {
        /// File offset of the entry
        offset: u64,
        /// Bytes available
        have: usize,
        /// Bytes required
        needed: usize,
    },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Wrap a callback failure
    ///
    /// The wrapped error keeps its own message and is reachable through
    /// [`Error::user_error`].
    pub fn user<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Error::User(Arc::from(err.into()))
    }

    /// The wrapped callback error, if this is a `User` error
    pub fn user_error(&self) -> Option<&UserError> {
        match self {
            Error::User(e) => Some(e),
            _ => None,
        }
    }

    /// Check if this error came from a cancellation token
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Check if this error is a commit conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

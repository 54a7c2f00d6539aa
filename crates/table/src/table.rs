//! Tables: records kept in a storage engine bucket
//!
//! A table is a bucket whose values are encoded records. Keys are assigned
//! by a per-table sequence, so a scan returns records in insertion order.
//!
//! ## Layout
//!
//! ```text
//! bucket <name>                key = u64 BE sequence, value = encoded record
//! bucket __tessera_sequences   key = table name,      value = u64 BE last key
//! ```

use tessera_core::cancel::CancelToken;
use tessera_core::encoding::{decode_record, encode_record, EncodedRecord};
use tessera_core::error::{Error, Result};
use tessera_core::record::{FieldBuffer, Record};
use tessera_storage::Transaction;
use tracing::debug;

use crate::reader::Reader;
use crate::store::{RecordStore, Visit};

/// Bucket holding every table's key sequence
pub const SEQUENCE_BUCKET: &str = "__tessera_sequences";

/// Records of one bucket, read through a transaction
///
/// Values are decoded lazily as fields are read; a malformed value surfaces
/// as an error from the record access that hits it.
pub struct TableStore<'a> {
    txn: &'a dyn Transaction,
    bucket: String,
    prefix: Vec<u8>,
    cancel: Option<CancelToken>,
}

impl<'a> TableStore<'a> {
    /// Every record in `bucket`
    pub fn new(txn: &'a dyn Transaction, bucket: impl Into<String>) -> Self {
        Self {
            txn,
            bucket: bucket.into(),
            prefix: Vec::new(),
            cancel: None,
        }
    }

    /// Only records whose key starts with `prefix`
    pub fn with_prefix(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Stop with `Cancelled` once `cancel` fires
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

impl RecordStore for TableStore<'_> {
    fn for_each(&self, visit: &mut Visit<'_>) -> Result<()> {
        let entries = match &self.cancel {
            Some(cancel) => self.txn.iterate_until(&self.bucket, &self.prefix, cancel)?,
            None => self.txn.iterate(&self.bucket, &self.prefix)?,
        };
        for entry in entries {
            let (_, value) = entry?;
            visit(&EncodedRecord::new(&value))?;
        }
        Ok(())
    }
}

/// Handle to a named table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
}

impl Table {
    /// Create a table
    ///
    /// Fails with `BucketExists` if the name is taken.
    pub fn create(txn: &mut dyn Transaction, name: &str) -> Result<Table> {
        if name == SEQUENCE_BUCKET {
            return Err(Error::BucketExists(name.to_string()));
        }
        txn.create_bucket(name)?;
        if !txn.has_bucket(SEQUENCE_BUCKET) {
            txn.create_bucket(SEQUENCE_BUCKET)?;
        }
        txn.put(SEQUENCE_BUCKET, name.as_bytes(), &0u64.to_be_bytes())?;
        debug!(target: "tessera::table", table = name, "Created table");
        Ok(Table {
            name: name.to_string(),
        })
    }

    /// Open an existing table
    ///
    /// Fails with `BucketNotFound` if there is no such table.
    pub fn open(txn: &dyn Transaction, name: &str) -> Result<Table> {
        if name == SEQUENCE_BUCKET || !txn.has_bucket(name) {
            return Err(Error::BucketNotFound(name.to_string()));
        }
        Ok(Table {
            name: name.to_string(),
        })
    }

    /// Remove a table and all its records
    pub fn drop_table(txn: &mut dyn Transaction, name: &str) -> Result<()> {
        let table = Table::open(txn, name)?;
        txn.drop_bucket(&table.name)?;
        txn.delete(SEQUENCE_BUCKET, table.name.as_bytes())?;
        debug!(target: "tessera::table", table = name, "Dropped table");
        Ok(())
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a record, returning its key
    pub fn insert(&self, txn: &mut dyn Transaction, record: &dyn Record) -> Result<Vec<u8>> {
        let encoded = encode_record(record)?;
        let key = self.next_key(txn)?;
        txn.put(&self.name, &key, &encoded)?;
        Ok(key)
    }

    /// Replace the record stored under `key`
    ///
    /// Fails with `KeyNotFound` if there is none.
    pub fn replace(&self, txn: &mut dyn Transaction, key: &[u8], record: &dyn Record) -> Result<()> {
        if txn.get(&self.name, key)?.is_none() {
            return Err(Error::KeyNotFound(key.to_vec()));
        }
        txn.put(&self.name, key, &encode_record(record)?)
    }

    /// Read the record stored under `key`
    ///
    /// Fails with `KeyNotFound` if there is none.
    pub fn get(&self, txn: &dyn Transaction, key: &[u8]) -> Result<FieldBuffer> {
        match txn.get(&self.name, key)? {
            Some(bytes) => decode_record(&bytes),
            None => Err(Error::KeyNotFound(key.to_vec())),
        }
    }

    /// Remove the record stored under `key`
    pub fn delete(&self, txn: &mut dyn Transaction, key: &[u8]) -> Result<()> {
        txn.delete(&self.name, key)
    }

    /// Record store over this table
    pub fn store<'a>(&self, txn: &'a dyn Transaction) -> TableStore<'a> {
        TableStore::new(txn, self.name.clone())
    }

    /// Reader over every record, in insertion order
    pub fn reader<'a>(&self, txn: &'a dyn Transaction) -> Reader<'a> {
        Reader::new(self.store(txn))
    }

    /// Like [`reader`](Table::reader), stopping with `Cancelled` once
    /// `cancel` fires
    pub fn reader_until<'a>(&self, txn: &'a dyn Transaction, cancel: &CancelToken) -> Reader<'a> {
        Reader::new(self.store(txn).with_cancel(cancel.clone()))
    }

    fn next_key(&self, txn: &mut dyn Transaction) -> Result<Vec<u8>> {
        let last = match txn.get(SEQUENCE_BUCKET, self.name.as_bytes())? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    Error::Corruption(format!("sequence of table '{}' is {} bytes", self.name, bytes.len()))
                })?;
                u64::from_be_bytes(raw)
            }
            None => return Err(Error::BucketNotFound(self.name.clone())),
        };
        let next = last + 1;
        txn.put(SEQUENCE_BUCKET, self.name.as_bytes(), &next.to_be_bytes())?;
        Ok(next.to_be_bytes().to_vec())
    }
}

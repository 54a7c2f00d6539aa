//! Committed store state
//!
//! A [`Snapshot`] is an immutable point-in-time view of every bucket. The
//! engine publishes snapshots behind an `Arc`; a transaction keeps the one
//! that was current when it began.
//!
//! # Copy-on-write
//!
//! Buckets are held as `Arc<Bucket>`, so cloning a snapshot copies only the
//! bucket table. Writing through [`Snapshot::apply`] clones a bucket the
//! first time it is touched (`Arc::make_mut`) and shares the rest.
//!
//! # Versions
//!
//! Every committed transaction gets the next version. Each key remembers the
//! version that last wrote it and each bucket remembers the version that
//! created it and the last version that changed it. Conflict validation
//! compares these between two snapshots.

use std::collections::BTreeMap;
use std::sync::Arc;

use tessera_core::error::{Error, Result};
use tessera_durability::Mutation;

/// A stored value and the version that wrote it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Value bytes
    pub value: Vec<u8>,
    /// Commit version of the last write
    pub version: u64,
}

/// A named, independently keyed byte store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    created: u64,
    modified: u64,
    entries: BTreeMap<Vec<u8>, Slot>,
}

impl Bucket {
    fn new(version: u64) -> Self {
        Self {
            created: version,
            modified: version,
            entries: BTreeMap::new(),
        }
    }

    /// Version that created this bucket
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Last version that changed this bucket or any of its keys
    pub fn modified(&self) -> u64 {
        self.modified
    }

    /// Look up a key
    pub fn get(&self, key: &[u8]) -> Option<&Slot> {
        self.entries.get(key)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the bucket has no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose key starts with `prefix`, in key order
    pub fn scan_prefix(&self, prefix: &[u8]) -> impl Iterator<Item = (&Vec<u8>, &Slot)> + '_ {
        let prefix = prefix.to_vec();
        self.entries
            .range(prefix.clone()..)
            .take_while(move |(k, _)| k.starts_with(&prefix))
    }
}

/// Immutable view of every bucket at one version
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    version: u64,
    buckets: BTreeMap<String, Arc<Bucket>>,
}

impl Snapshot {
    /// Empty store at version 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Version of the last commit included in this snapshot
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Look up a bucket
    pub fn bucket(&self, name: &str) -> Option<&Arc<Bucket>> {
        self.buckets.get(name)
    }

    /// Look up a bucket, failing with `BucketNotFound`
    pub fn require_bucket(&self, name: &str) -> Result<&Arc<Bucket>> {
        self.buckets
            .get(name)
            .ok_or_else(|| Error::BucketNotFound(name.to_string()))
    }

    /// Bucket names in order
    pub fn bucket_names(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Apply one mutation, stamping it with `version`
    ///
    /// # Errors
    ///
    /// - `BucketExists` when creating a bucket that exists
    /// - `BucketNotFound` when touching a bucket that does not
    /// - `KeyNotFound` when deleting an absent key
    pub fn apply(&mut self, mutation: &Mutation, version: u64) -> Result<()> {
        match mutation {
            Mutation::CreateBucket { bucket } => {
                if self.buckets.contains_key(bucket) {
                    return Err(Error::BucketExists(bucket.clone()));
                }
                self.buckets
                    .insert(bucket.clone(), Arc::new(Bucket::new(version)));
            }
            Mutation::DropBucket { bucket } => {
                if self.buckets.remove(bucket).is_none() {
                    return Err(Error::BucketNotFound(bucket.clone()));
                }
            }
            Mutation::Put { bucket, key, value } => {
                let b = self.bucket_mut(bucket)?;
                b.entries.insert(
                    key.clone(),
                    Slot {
                        value: value.clone(),
                        version,
                    },
                );
                b.modified = version;
            }
            Mutation::Delete { bucket, key } => {
                let b = self.bucket_mut(bucket)?;
                if b.entries.remove(key).is_none() {
                    return Err(Error::KeyNotFound(key.clone()));
                }
                b.modified = version;
            }
        }
        Ok(())
    }

    fn bucket_mut(&mut self, name: &str) -> Result<&mut Bucket> {
        self.buckets
            .get_mut(name)
            .map(Arc::make_mut)
            .ok_or_else(|| Error::BucketNotFound(name.to_string()))
    }
}

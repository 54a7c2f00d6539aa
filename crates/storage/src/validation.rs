//! Commit-time conflict detection
//!
//! Rules:
//! - First committer wins: a writing transaction conflicts when something it
//!   wrote OR read was changed by a commit made after it began, so committed
//!   read-write transactions are serializable in commit order
//! - A read-only transaction never conflicts and records no reads
//! - A bucket-level write (create/drop) conflicts with any change to that
//!   bucket; a key-level write conflicts with a change to that key or with
//!   the bucket being dropped or recreated
//! - A key read conflicts like a key write; a prefix scan conflicts with any
//!   key under the prefix being written, inserted or deleted; a bucket
//!   existence check conflicts with the bucket being created or dropped

use std::collections::BTreeSet;
use std::sync::Arc;

use tessera_durability::Mutation;

use crate::state::{Bucket, Snapshot};

/// Something a writing transaction observed, re-checked at commit
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Read {
    /// Whether a bucket exists
    Bucket {
        /// Bucket name
        bucket: String,
    },
    /// One key
    Key {
        /// Bucket name
        bucket: String,
        /// Key bytes
        key: Vec<u8>,
    },
    /// Every key starting with a prefix
    Prefix {
        /// Bucket name
        bucket: String,
        /// Key prefix (empty = whole bucket)
        prefix: Vec<u8>,
    },
}

/// Reads of one transaction, deduplicated
pub type ReadSet = BTreeSet<Read>;

/// Types of conflicts that can occur during transaction validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictType {
    /// A bucket written by the transaction was created, dropped or modified
    /// since the transaction began
    BucketChanged {
        /// Bucket name
        bucket: String,
    },

    /// A key written by the transaction was written or deleted since the
    /// transaction began
    KeyChanged {
        /// Bucket name
        bucket: String,
        /// Key bytes
        key: Vec<u8>,
        /// Version of the key when the transaction began (0 = absent)
        base_version: u64,
        /// Version of the key now (0 = absent)
        current_version: u64,
    },

    /// A key read by the transaction was written or deleted since the
    /// transaction began
    ReadChanged {
        /// Bucket name
        bucket: String,
        /// Key bytes
        key: Vec<u8>,
        /// Version of the key when the transaction began (0 = absent)
        base_version: u64,
        /// Version of the key now (0 = absent)
        current_version: u64,
    },

    /// A key under a scanned prefix was written, inserted or deleted since
    /// the transaction began
    PrefixChanged {
        /// Bucket name
        bucket: String,
        /// Scanned prefix
        prefix: Vec<u8>,
    },
}

impl std::fmt::Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictType::BucketChanged { bucket } => {
                write!(f, "bucket '{}' changed concurrently", bucket)
            }
            ConflictType::KeyChanged {
                bucket,
                key,
                base_version,
                current_version,
            } => write!(
                f,
                "key {:?} in bucket '{}' changed concurrently (version {} -> {})",
                String::from_utf8_lossy(key),
                bucket,
                base_version,
                current_version
            ),
            ConflictType::ReadChanged {
                bucket,
                key,
                base_version,
                current_version,
            } => write!(
                f,
                "key {:?} in bucket '{}' read at version {} was changed to version {}",
                String::from_utf8_lossy(key),
                bucket,
                base_version,
                current_version
            ),
            ConflictType::PrefixChanged { bucket, prefix } => write!(
                f,
                "keys under prefix {:?} in bucket '{}' changed concurrently",
                String::from_utf8_lossy(prefix),
                bucket
            ),
        }
    }
}

/// Result of transaction validation
///
/// Accumulates all conflicts found during validation.
/// A transaction commits only if is_valid() returns true.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// All conflicts detected during validation
    pub conflicts: Vec<ConflictType>,
}

impl ValidationResult {
    /// Create a successful validation result (no conflicts)
    pub fn ok() -> Self {
        Self::default()
    }

    /// Create a validation result with a single conflict
    pub fn conflict(conflict: ConflictType) -> Self {
        ValidationResult {
            conflicts: vec![conflict],
        }
    }

    /// Check if validation passed (no conflicts)
    pub fn is_valid(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Merge another validation result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.conflicts.extend(other.conflicts);
    }

    /// Get the number of conflicts
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    /// One-line description of every conflict
    pub fn describe(&self) -> String {
        self.conflicts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validate a transaction's reads and writes against the state it is
/// committing into
///
/// `base` is the snapshot the transaction began from, `current` the latest
/// published snapshot. Each bucket and key write is reported at most once.
pub fn validate_transaction(
    base: &Snapshot,
    current: &Snapshot,
    reads: &ReadSet,
    pending: &[Mutation],
) -> ValidationResult {
    let mut result = ValidationResult::ok();
    if base.version() == current.version() {
        return result;
    }

    for read in reads {
        result.merge(validate_read(base, current, read));
    }

    let mut seen_buckets: Vec<&str> = Vec::new();
    let mut seen_keys: Vec<(&str, &[u8])> = Vec::new();

    for mutation in pending {
        match mutation {
            Mutation::CreateBucket { bucket } | Mutation::DropBucket { bucket } => {
                if seen_buckets.contains(&bucket.as_str()) {
                    continue;
                }
                seen_buckets.push(bucket.as_str());
                result.merge(validate_bucket(base, current, bucket));
            }
            Mutation::Put { bucket, key, .. } | Mutation::Delete { bucket, key } => {
                if seen_keys.contains(&(bucket.as_str(), key.as_slice())) {
                    continue;
                }
                seen_keys.push((bucket.as_str(), key.as_slice()));
                result.merge(validate_key(base, current, bucket, key));
            }
        }
    }

    result
}

fn validate_read(base: &Snapshot, current: &Snapshot, read: &Read) -> ValidationResult {
    match read {
        Read::Bucket { bucket } => {
            if created(base.bucket(bucket)) != created(current.bucket(bucket)) {
                bucket_changed(bucket)
            } else {
                ValidationResult::ok()
            }
        }
        Read::Key { bucket, key } => {
            let (base_bucket, current_bucket) = (base.bucket(bucket), current.bucket(bucket));
            if created(base_bucket) != created(current_bucket) {
                return bucket_changed(bucket);
            }
            let base_version = key_version(base_bucket, key);
            let current_version = key_version(current_bucket, key);
            if base_version != current_version {
                return ValidationResult::conflict(ConflictType::ReadChanged {
                    bucket: bucket.clone(),
                    key: key.clone(),
                    base_version,
                    current_version,
                });
            }
            ValidationResult::ok()
        }
        Read::Prefix { bucket, prefix } => validate_prefix(base, current, bucket, prefix),
    }
}

/// Prefix scan: no key under `prefix` may be newer than `base`, and none
/// may have disappeared
fn validate_prefix(
    base: &Snapshot,
    current: &Snapshot,
    bucket: &str,
    prefix: &[u8],
) -> ValidationResult {
    let (base_bucket, current_bucket) = (base.bucket(bucket), current.bucket(bucket));
    if created(base_bucket) != created(current_bucket) {
        return bucket_changed(bucket);
    }
    let (Some(before), Some(now)) = (base_bucket, current_bucket) else {
        return ValidationResult::ok();
    };
    if before.modified() == now.modified() {
        return ValidationResult::ok();
    }

    // Keys present now with a version no newer than base were untouched,
    // so equal counts mean nothing under the prefix was deleted.
    let mut unchanged = 0usize;
    for (_, slot) in now.scan_prefix(prefix) {
        if slot.version > base.version() {
            return prefix_changed(bucket, prefix);
        }
        unchanged += 1;
    }
    if unchanged != before.scan_prefix(prefix).count() {
        return prefix_changed(bucket, prefix);
    }
    ValidationResult::ok()
}

fn bucket_changed(bucket: &str) -> ValidationResult {
    ValidationResult::conflict(ConflictType::BucketChanged {
        bucket: bucket.to_string(),
    })
}

fn prefix_changed(bucket: &str, prefix: &[u8]) -> ValidationResult {
    ValidationResult::conflict(ConflictType::PrefixChanged {
        bucket: bucket.to_string(),
        prefix: prefix.to_vec(),
    })
}

/// Bucket-level write: any change to the bucket conflicts
fn validate_bucket(base: &Snapshot, current: &Snapshot, bucket: &str) -> ValidationResult {
    let changed = match (base.bucket(bucket), current.bucket(bucket)) {
        (None, None) => false,
        (Some(a), Some(b)) => a.created() != b.created() || a.modified() != b.modified(),
        _ => true,
    };
    if changed {
        ValidationResult::conflict(ConflictType::BucketChanged {
            bucket: bucket.to_string(),
        })
    } else {
        ValidationResult::ok()
    }
}

/// Key-level write: the key's version or the bucket's identity changed
fn validate_key(base: &Snapshot, current: &Snapshot, bucket: &str, key: &[u8]) -> ValidationResult {
    let (base_bucket, current_bucket) = (base.bucket(bucket), current.bucket(bucket));
    if created(base_bucket) != created(current_bucket) {
        return ValidationResult::conflict(ConflictType::BucketChanged {
            bucket: bucket.to_string(),
        });
    }

    let base_version = key_version(base_bucket, key);
    let current_version = key_version(current_bucket, key);
    if base_version != current_version {
        return ValidationResult::conflict(ConflictType::KeyChanged {
            bucket: bucket.to_string(),
            key: key.to_vec(),
            base_version,
            current_version,
        });
    }
    ValidationResult::ok()
}

fn created(bucket: Option<&Arc<Bucket>>) -> Option<u64> {
    bucket.map(|b| b.created())
}

fn key_version(bucket: Option<&Arc<Bucket>>, key: &[u8]) -> u64 {
    bucket
        .and_then(|b| b.get(key))
        .map(|slot| slot.version)
        .unwrap_or(0)
}

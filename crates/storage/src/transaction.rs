//! Transactions over shared snapshot state
//!
//! [`StoreCore`] owns the published snapshot, the commit lock and the
//! optional write-ahead log. Both engines wrap one.
//!
//! ## Commit sequence
//!
//! 1. Take the commit lock (serializes commits, never held by readers)
//! 2. Validate the read and write sets against the latest snapshot
//! 3. Allocate the next version and apply the writes to a copy
//! 4. Append the commit record to the WAL (durability point)
//! 5. Publish the new snapshot
//!
//! A failure before step 5 leaves the published state untouched.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tessera_core::error::{Error, Result};
use tessera_durability::{CommitRecord, Mutation, Wal};
use tracing::{debug, error, warn};

use crate::state::Snapshot;
use crate::traits::{Entries, Entry, Transaction};
use crate::validation::{validate_transaction, Read, ReadSet};

/// Shared state behind an engine
pub struct StoreCore {
    state: RwLock<Arc<Snapshot>>,
    commit_lock: Mutex<Option<Wal>>,
    next_txn_id: AtomicU64,
}

impl StoreCore {
    /// Create a core publishing `snapshot`
    ///
    /// With a `wal`, every commit is appended to it before it is published.
    pub fn new(snapshot: Snapshot, wal: Option<Wal>, next_txn_id: u64) -> Self {
        Self {
            state: RwLock::new(Arc::new(snapshot)),
            commit_lock: Mutex::new(wal),
            next_txn_id: AtomicU64::new(next_txn_id),
        }
    }

    /// The latest published snapshot
    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.state.read())
    }

    /// Start a transaction on the latest snapshot
    pub fn begin(&self, writable: bool) -> KvTransaction<'_> {
        let txn_id = self.next_txn_id.fetch_add(1, Ordering::Relaxed);
        let base = self.current();
        debug!(
            target: "tessera::txn",
            txn_id,
            version = base.version(),
            writable,
            "Transaction started"
        );
        KvTransaction {
            core: self,
            txn_id,
            writable,
            base,
            working: None,
            pending: Vec::new(),
            reads: Mutex::new(ReadSet::new()),
            done: false,
        }
    }

    /// Force the WAL, if any, to disk
    pub fn fsync(&self) -> Result<()> {
        match self.commit_lock.lock().as_mut() {
            Some(wal) => wal.fsync(),
            None => Ok(()),
        }
    }

    fn commit(
        &self,
        txn_id: u64,
        base: &Snapshot,
        reads: &ReadSet,
        pending: Vec<Mutation>,
    ) -> Result<u64> {
        let mut wal = self.commit_lock.lock();
        let current = self.current();

        let validation = validate_transaction(base, &current, reads, &pending);
        if !validation.is_valid() {
            warn!(
                target: "tessera::txn",
                txn_id,
                conflicts = validation.conflict_count(),
                "Commit rejected: {}",
                validation.describe()
            );
            return Err(Error::Conflict(validation.describe()));
        }

        let version = current.version() + 1;
        let mut next = Snapshot::clone(&current);
        for mutation in &pending {
            next.apply(mutation, version)?;
        }
        next.set_version(version);

        if let Some(wal) = wal.as_mut() {
            let record = CommitRecord {
                txn_id,
                version,
                mutations: pending,
            };
            if let Err(e) = wal.append(&record) {
                error!(
                    target: "tessera::txn",
                    txn_id,
                    version,
                    error = %e,
                    "WAL append failed, commit abandoned"
                );
                return Err(e);
            }
        }

        *self.state.write() = Arc::new(next);
        Ok(version)
    }
}

/// A transaction on a [`StoreCore`]
///
/// Reads see the snapshot taken at begin plus this transaction's own
/// writes. Writes are applied to a private copy and recorded; nothing is
/// shared until commit. A writable transaction also records what it read,
/// and its commit fails if any of that changed underneath it.
pub struct KvTransaction<'e> {
    core: &'e StoreCore,
    txn_id: u64,
    writable: bool,
    base: Arc<Snapshot>,
    working: Option<Snapshot>,
    pending: Vec<Mutation>,
    reads: Mutex<ReadSet>,
    done: bool,
}

impl KvTransaction<'_> {
    /// Transaction identifier
    pub fn id(&self) -> u64 {
        self.txn_id
    }

    /// Number of writes buffered so far
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn view(&self) -> &Snapshot {
        self.working.as_ref().unwrap_or(self.base.as_ref())
    }

    /// Record a read for commit-time validation
    fn observe(&self, read: Read) {
        if self.writable {
            self.reads.lock().insert(read);
        }
    }

    fn write(&mut self, mutation: Mutation) -> Result<()> {
        if !self.writable {
            return Err(Error::ReadOnlyTransaction);
        }
        let version = self.base.version() + 1;
        let base = &self.base;
        let working = self.working.get_or_insert_with(|| Snapshot::clone(base));
        working.apply(&mutation, version)?;
        self.pending.push(mutation);
        Ok(())
    }
}

impl Transaction for KvTransaction<'_> {
    fn writable(&self) -> bool {
        self.writable
    }

    fn create_bucket(&mut self, name: &str) -> Result<()> {
        self.write(Mutation::CreateBucket {
            bucket: name.to_string(),
        })
    }

    fn drop_bucket(&mut self, name: &str) -> Result<()> {
        self.write(Mutation::DropBucket {
            bucket: name.to_string(),
        })
    }

    fn has_bucket(&self, name: &str) -> bool {
        self.observe(Read::Bucket {
            bucket: name.to_string(),
        });
        self.view().bucket(name).is_some()
    }

    fn get(&self, bucket: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.observe(Read::Key {
            bucket: bucket.to_string(),
            key: key.to_vec(),
        });
        let bucket = self.view().require_bucket(bucket)?;
        Ok(bucket.get(key).map(|slot| slot.value.clone()))
    }

    fn put(&mut self, bucket: &str, key: &[u8], value: &[u8]) -> Result<()> {
        self.write(Mutation::Put {
            bucket: bucket.to_string(),
            key: key.to_vec(),
            value: value.to_vec(),
        })
    }

    fn delete(&mut self, bucket: &str, key: &[u8]) -> Result<()> {
        self.write(Mutation::Delete {
            bucket: bucket.to_string(),
            key: key.to_vec(),
        })
    }

    fn iterate<'a>(&'a self, bucket: &str, prefix: &[u8]) -> Result<Entries<'a>> {
        self.observe(Read::Prefix {
            bucket: bucket.to_string(),
            prefix: prefix.to_vec(),
        });
        let bucket = self.view().require_bucket(bucket)?;
        let entries = bucket
            .scan_prefix(prefix)
            .map(|(k, slot)| -> Result<Entry> { Ok((k.clone(), slot.value.clone())) });
        Ok(Box::new(entries))
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        self.done = true;
        if !self.writable || self.pending.is_empty() {
            debug!(target: "tessera::txn", txn_id = self.txn_id, "Transaction released");
            return Ok(());
        }

        let pending = std::mem::take(&mut self.pending);
        let reads = std::mem::take(self.reads.get_mut());
        let writes = pending.len();
        let version = self
            .core
            .commit(self.txn_id, &self.base, &reads, pending)?;
        debug!(
            target: "tessera::txn",
            txn_id = self.txn_id,
            version,
            reads = reads.len(),
            writes,
            "Transaction committed"
        );
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> Result<()> {
        self.done = true;
        debug!(
            target: "tessera::txn",
            txn_id = self.txn_id,
            discarded = self.pending.len(),
            "Transaction rolled back"
        );
        Ok(())
    }
}

impl Drop for KvTransaction<'_> {
    fn drop(&mut self) {
        if !self.done {
            debug!(
                target: "tessera::txn",
                txn_id = self.txn_id,
                discarded = self.pending.len(),
                "Transaction dropped without commit, rolled back"
            );
        }
    }
}

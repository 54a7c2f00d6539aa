//! WAL-backed engine
//!
//! Same state machine as [`MemoryEngine`](crate::MemoryEngine), plus a
//! write-ahead log in the database directory. Opening the directory replays
//! the log; each commit is appended before it is published.
//!
//! ## Directory layout
//!
//! ```text
//! <dir>/
//!   tessera.lock   exclusive lock held while the engine is open
//!   tessera.wal    commit log
//! ```

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use tessera_core::error::{Error, Result};
use tessera_durability::{DurabilityMode, Wal};
use tracing::debug;

use crate::state::Snapshot;
use crate::traits::{Engine, Transaction};
use crate::transaction::StoreCore;

/// WAL file name inside the database directory
pub const WAL_FILE: &str = "tessera.wal";

/// Lock file name inside the database directory
pub const LOCK_FILE: &str = "tessera.lock";

/// Engine that survives reopen
pub struct LogEngine {
    core: StoreCore,
    dir: PathBuf,
    _lock_file: File,
}

impl LogEngine {
    /// Open or create a database directory
    ///
    /// # Errors
    ///
    /// - `DatabaseLocked` if another engine holds the directory
    /// - `Corruption` if the log is damaged before its last entry, or its
    ///   entries do not replay cleanly
    /// - `Io` on file errors
    pub fn open<P: AsRef<Path>>(dir: P, mode: DurabilityMode) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(dir.join(LOCK_FILE))?;
        fs2::FileExt::try_lock_exclusive(&lock_file)
            .map_err(|_| Error::DatabaseLocked(dir.display().to_string()))?;

        let mut wal = Wal::open(dir.join(WAL_FILE), mode)?;
        let records = wal.replay()?;

        let mut snapshot = Snapshot::new();
        let mut max_txn_id = 0;
        for record in &records {
            if record.version <= snapshot.version() {
                return Err(Error::Corruption(format!(
                    "commit version {} follows version {}",
                    record.version,
                    snapshot.version()
                )));
            }
            for mutation in &record.mutations {
                snapshot.apply(mutation, record.version).map_err(|e| {
                    Error::Corruption(format!(
                        "replaying commit version {}: {}",
                        record.version, e
                    ))
                })?;
            }
            snapshot.set_version(record.version);
            max_txn_id = max_txn_id.max(record.txn_id);
        }

        debug!(
            target: "tessera::storage",
            path = %dir.display(),
            commits = records.len(),
            version = snapshot.version(),
            mode = mode.description(),
            "Opened log engine"
        );

        Ok(Self {
            core: StoreCore::new(snapshot, Some(wal), max_txn_id + 1),
            dir,
            _lock_file: lock_file,
        })
    }

    /// Database directory
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Force every appended commit to disk
    pub fn flush(&self) -> Result<()> {
        self.core.fsync()
    }

    /// Shared state, for inspection
    pub fn core(&self) -> &StoreCore {
        &self.core
    }
}

impl Engine for LogEngine {
    fn begin(&self, writable: bool) -> Result<Box<dyn Transaction + '_>> {
        Ok(Box::new(self.core.begin(writable)))
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

//! Write-ahead log
//!
//! One [`CommitRecord`] is appended per committed transaction, holding every
//! mutation of that transaction and its commit version. A transaction is
//! durable once its record is in the log; replaying the log in order
//! rebuilds the committed state.
//!
//! ## File Operations
//!
//! - `Wal::open()` - Open or create the log, cutting off a torn tail
//! - `Wal::append()` - Write a framed record, fsync per durability mode
//! - `Wal::replay()` - Decode every record from the beginning
//! - `Wal::fsync()` - Force sync to disk

use crate::encoding::{decode_entry, encode_entry};
use crate::mode::DurabilityMode;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tessera_core::error::{Error, Result};
use tracing::{debug, warn};

/// A single change applied by a committed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    /// Bucket created
    CreateBucket {
        /// Bucket name
        bucket: String,
    },
    /// Bucket dropped with all its keys
    DropBucket {
        /// Bucket name
        bucket: String,
    },
    /// Key written
    Put {
        /// Bucket name
        bucket: String,
        /// Key bytes
        key: Vec<u8>,
        /// Value bytes
        value: Vec<u8>,
    },
    /// Key removed
    Delete {
        /// Bucket name
        bucket: String,
        /// Key bytes
        key: Vec<u8>,
    },
}

/// Everything one transaction committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Transaction identifier
    pub txn_id: u64,
    /// Commit version assigned to every mutation
    pub version: u64,
    /// Mutations in application order
    pub mutations: Vec<Mutation>,
}

/// Write-ahead log file
///
/// Not internally synchronized; the owning engine serializes appends
/// under its commit lock.
pub struct Wal {
    path: PathBuf,
    writer: BufWriter<File>,
    size: u64,
    durability_mode: DurabilityMode,
    last_fsync: Instant,
    commits_since_fsync: usize,
    /// Set when a failed append could not be rolled back
    poisoned: Option<String>,
    #[cfg(test)]
    fail_syncs: usize,
}

impl Wal {
    /// Open existing WAL or create a new one
    ///
    /// Creates parent directories if needed. If the last entry was only
    /// partially written (crash mid-append) it is cut off so new appends
    /// start on a clean boundary.
    ///
    /// # Errors
    ///
    /// Returns `Corruption` if an entry in the middle of the log fails its
    /// checksum, and `Io` on file errors.
    pub fn open<P: AsRef<Path>>(path: P, durability_mode: DurabilityMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;

        let contents = read_file(&path)?;
        let (records, valid_len) = scan(&contents)?;
        if valid_len < contents.len() {
            warn!(
                path = %path.display(),
                valid_len,
                torn_bytes = contents.len() - valid_len,
                "Truncating torn WAL tail"
            );
            file.set_len(valid_len as u64)?;
            file.sync_all()?;
        }
        debug!(path = %path.display(), records = records.len(), "Opened WAL");

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            size: valid_len as u64,
            durability_mode,
            last_fsync: Instant::now(),
            commits_since_fsync: 0,
            poisoned: None,
            #[cfg(test)]
            fail_syncs: 0,
        })
    }

    /// Append a commit record
    ///
    /// The record is always handed to the OS before returning. fsync follows
    /// the durability mode:
    /// - Always: fsync after every record
    /// - Standard: fsync after `batch_size` records OR `interval_ms` elapsed
    ///
    /// Returns the offset the record was written at. On error the file is
    /// cut back to that offset, so a failed append never reappears on
    /// replay. If that cut fails too the log refuses every later append.
    pub fn append(&mut self, record: &CommitRecord) -> Result<u64> {
        if let Some(reason) = &self.poisoned {
            return Err(Error::Corruption(format!(
                "{}: log is unusable after a failed append: {}",
                self.path.display(),
                reason
            )));
        }

        let offset = self.size;
        let encoded = encode_entry(record)?;

        if let Err(e) = self.write_frame(&encoded) {
            warn!(
                path = %self.path.display(),
                offset,
                error = %e,
                "WAL append failed, rolling back partial entry"
            );
            if let Err(rewind) = self.rewind(offset) {
                self.poisoned = Some(rewind.to_string());
            }
            return Err(e);
        }

        self.size += encoded.len() as u64;
        Ok(offset)
    }

    fn write_frame(&mut self, encoded: &[u8]) -> Result<()> {
        self.writer.write_all(encoded)?;
        self.writer.flush()?;

        if self.durability_mode.requires_immediate_fsync() {
            return self.fsync();
        }
        if let DurabilityMode::Standard {
            interval_ms,
            batch_size,
        } = self.durability_mode
        {
            self.commits_since_fsync += 1;
            if self.commits_since_fsync >= batch_size
                || self.last_fsync.elapsed() >= Duration::from_millis(interval_ms)
            {
                self.fsync()?;
            }
        }
        Ok(())
    }

    /// Drop everything past `offset`, including bytes still buffered
    fn rewind(&mut self, offset: u64) -> Result<()> {
        let file = self.writer.get_ref().try_clone()?;
        let stale = std::mem::replace(&mut self.writer, BufWriter::new(file));
        // into_parts hands back the buffer without writing it
        let _ = stale.into_parts();

        let file = self.writer.get_ref();
        file.set_len(offset)?;
        file.sync_all()?;
        self.size = offset;
        Ok(())
    }

    /// Decode every record from the beginning of the log
    pub fn replay(&mut self) -> Result<Vec<CommitRecord>> {
        self.writer.flush()?;
        let contents = read_file(&self.path)?;
        let (records, valid_len) = scan(&contents)?;
        if valid_len != contents.len() {
            return Err(Error::Corruption(format!(
                "{}: trailing {} bytes after last entry",
                self.path.display(),
                contents.len() - valid_len
            )));
        }
        Ok(records)
    }

    /// Force sync to disk (flush + fsync)
    pub fn fsync(&mut self) -> Result<()> {
        self.writer.flush()?;
        #[cfg(test)]
        if self.fail_syncs > 0 {
            self.fail_syncs -= 1;
            let e = std::io::Error::new(std::io::ErrorKind::Other, "injected sync failure");
            return Err(e.into());
        }
        self.writer.get_ref().sync_all()?;
        self.last_fsync = Instant::now();
        self.commits_since_fsync = 0;
        Ok(())
    }

    /// Current file size (offset of the next append)
    pub fn size(&self) -> u64 {
        self.size
    }

    /// File path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durability mode
    pub fn durability_mode(&self) -> DurabilityMode {
        self.durability_mode
    }
}

impl Drop for Wal {
    fn drop(&mut self) {
        if let Err(e) = self.fsync() {
            warn!(path = %self.path.display(), error = %e, "Final WAL fsync failed");
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let mut contents = Vec::new();
    File::open(path)?.read_to_end(&mut contents)?;
    Ok(contents)
}

/// Decode records until the end of `buf`
///
/// Returns the records and the length of the valid prefix. Only the last
/// entry may be damaged: a partial entry, or a damaged one running exactly
/// to the end, is a torn tail and ends the valid prefix. Damage with an
/// intact entry anywhere after it is corruption, never a tail to cut off.
fn scan(buf: &[u8]) -> Result<(Vec<CommitRecord>, usize)> {
    let mut records = Vec::new();
    let mut offset = 0usize;

    while offset < buf.len() {
        match decode_entry(&buf[offset..], offset as u64) {
            Ok((record, consumed)) => {
                records.push(record);
                offset += consumed;
            }
            Err(Error::IncompleteEntry { .. }) => {
                if let Some(next) = entry_after(buf, offset) {
                    return Err(Error::Corruption(format!(
                        "offset {}: entry length runs past end of log, but an entry decodes at offset {}",
                        offset, next
                    )));
                }
                break;
            }
            Err(Error::Corruption(msg)) => {
                if frame_end(&buf[offset..]) == Some(buf.len() - offset)
                    && entry_after(buf, offset).is_none()
                {
                    break;
                }
                return Err(Error::Corruption(msg));
            }
            Err(e) => return Err(e),
        }
    }

    Ok((records, offset))
}

fn frame_end(buf: &[u8]) -> Option<usize> {
    let len: [u8; 4] = buf.get(..4)?.try_into().ok()?;
    Some(4 + u32::from_le_bytes(len) as usize)
}

/// Offset of the first intact entry starting after `offset`
fn entry_after(buf: &[u8], offset: usize) -> Option<usize> {
    (offset + 1..buf.len()).find(|&at| decode_entry(&buf[at..], at as u64).is_ok())
}

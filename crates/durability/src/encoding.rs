//! WAL entry encoding and decoding
//!
//! ## Entry Format
//!
//! ```text
//! [length: u32][type: u8][payload: bytes][crc32: u32]
//! ```
//!
//! - **length**: size of type + payload + crc (NOT including length itself)
//! - **type**: entry type tag (1 = Commit)
//! - **payload**: bincode-serialized [`CommitRecord`]
//! - **crc32**: CRC32 over \[type\]\[payload\]
//!
//! Integers are little-endian.

use crate::wal::CommitRecord;
use crc32fast::Hasher;
use tessera_core::error::{Error, Result};

/// Commit record type tag
const TYPE_COMMIT: u8 = 1;

/// Smallest valid frame body: type(1) + crc(4)
const MIN_BODY_LEN: usize = 5;

/// Encode a commit record to a framed entry
pub fn encode_entry(record: &CommitRecord) -> Result<Vec<u8>> {
    let payload = bincode::serialize(record)?;

    let total_len = 1 + payload.len() + 4;
    let frame_len = u32::try_from(total_len)
        .map_err(|_| Error::Serialization(format!("entry too large: {} bytes", total_len)))?;

    let mut buf = Vec::with_capacity(4 + total_len);
    buf.extend_from_slice(&frame_len.to_le_bytes());
    buf.push(TYPE_COMMIT);
    buf.extend_from_slice(&payload);

    let mut hasher = Hasher::new();
    hasher.update(&[TYPE_COMMIT]);
    hasher.update(&payload);
    buf.extend_from_slice(&hasher.finalize().to_le_bytes());

    Ok(buf)
}

/// Decode one framed entry from the start of `buf`
///
/// Returns the record and the number of bytes consumed. `offset` is the
/// file offset of `buf[0]`, used in error messages.
///
/// # Errors
///
/// - `IncompleteEntry` when `buf` ends before the frame does (partial write)
/// - `Corruption` on a bad length, CRC mismatch, unknown type tag, or a
///   payload that does not deserialize
pub fn decode_entry(buf: &[u8], offset: u64) -> Result<(CommitRecord, usize)> {
    if buf.len() < 4 {
        return Err(Error::IncompleteEntry {
            offset,
            have: buf.len(),
            needed: 4,
        });
    }
    let mut len_buf = [0u8; 4];
    len_buf.copy_from_slice(&buf[..4]);
    let total_len = u32::from_le_bytes(len_buf) as usize;

    if total_len < MIN_BODY_LEN {
        return Err(Error::Corruption(format!(
            "offset {}: invalid entry length {} (minimum is {})",
            offset, total_len, MIN_BODY_LEN
        )));
    }

    if buf.len() < 4 + total_len {
        return Err(Error::IncompleteEntry {
            offset,
            have: buf.len(),
            needed: 4 + total_len,
        });
    }

    let body = &buf[4..4 + total_len];
    let (type_tag, rest) = (body[0], &body[1..]);
    let (payload, crc_bytes) = rest.split_at(rest.len() - 4);

    let mut crc_buf = [0u8; 4];
    crc_buf.copy_from_slice(crc_bytes);
    let expected_crc = u32::from_le_bytes(crc_buf);

    let mut hasher = Hasher::new();
    hasher.update(&[type_tag]);
    hasher.update(payload);
    let actual_crc = hasher.finalize();

    if actual_crc != expected_crc {
        return Err(Error::Corruption(format!(
            "offset {}: CRC mismatch: expected {:08x}, got {:08x}",
            offset, expected_crc, actual_crc
        )));
    }

    if type_tag != TYPE_COMMIT {
        return Err(Error::Corruption(format!(
            "offset {}: unknown entry type {}",
            offset, type_tag
        )));
    }

    let record: CommitRecord = bincode::deserialize(payload).map_err(|e| {
        Error::Corruption(format!("offset {}: deserialization failed: {}", offset, e))
    })?;

    Ok((record, 4 + total_len))
}

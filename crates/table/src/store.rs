//! Record sources
//!
//! A [`RecordStore`] visits its records in a defined order, as many times
//! as asked. [`RecordBuffer`] is the in-memory one: records are deep-copied
//! in, so callers may reuse their own buffers.

use std::sync::Arc;

use tessera_core::error::Result;
use tessera_core::record::{FieldBuffer, Record};

/// Visitor passed to [`RecordStore::for_each`]
pub type Visit<'v> = dyn FnMut(&dyn Record) -> Result<()> + 'v;

/// A restartable source of records
pub trait RecordStore: Send + Sync {
    /// Visit every record in order
    ///
    /// Stops at and returns the first error from `visit` or from reading
    /// the source.
    fn for_each(&self, visit: &mut Visit<'_>) -> Result<()>;
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn for_each(&self, visit: &mut Visit<'_>) -> Result<()> {
        (**self).for_each(visit)
    }
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn for_each(&self, visit: &mut Visit<'_>) -> Result<()> {
        (**self).for_each(visit)
    }
}

/// Owned sequence of records
///
/// A buffer must not be mutated while a Reader built on it is iterating;
/// handing it to [`Reader::new`](crate::Reader::new) moves it, which
/// enforces that.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBuffer {
    records: Vec<FieldBuffer>,
}

impl RecordBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `n` records
    pub fn with_capacity(n: usize) -> Self {
        Self {
            records: Vec::with_capacity(n),
        }
    }

    /// Copy `record`'s fields into a new record at the end
    ///
    /// # Errors
    ///
    /// Propagates any error from iterating `record` (for example, a
    /// malformed encoding); the buffer is unchanged in that case.
    pub fn add(&mut self, record: &dyn Record) -> Result<()> {
        self.records.push(FieldBuffer::from_record(record)?);
        Ok(())
    }

    /// Append an owned record
    pub fn push(&mut self, record: FieldBuffer) {
        self.records.push(record);
    }

    /// Get a record by position
    pub fn get(&self, index: usize) -> Option<&FieldBuffer> {
        self.records.get(index)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over records in order
    pub fn iter(&self) -> std::slice::Iter<'_, FieldBuffer> {
        self.records.iter()
    }
}

impl RecordStore for RecordBuffer {
    fn for_each(&self, visit: &mut Visit<'_>) -> Result<()> {
        for record in &self.records {
            visit(record)?;
        }
        Ok(())
    }
}

impl From<Vec<FieldBuffer>> for RecordBuffer {
    fn from(records: Vec<FieldBuffer>) -> Self {
        Self { records }
    }
}

impl FromIterator<FieldBuffer> for RecordBuffer {
    fn from_iter<I: IntoIterator<Item = FieldBuffer>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RecordBuffer {
    type Item = FieldBuffer;
    type IntoIter = std::vec::IntoIter<FieldBuffer>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordBuffer {
    type Item = &'a FieldBuffer;
    type IntoIter = std::slice::Iter<'a, FieldBuffer>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

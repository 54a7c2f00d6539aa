//! Records
//!
//! A record is an ordered sequence of fields with unique names. Consumers
//! only ever read records; deriving a new record means building a new
//! [`FieldBuffer`] (usually with [`FieldBuffer::add_from`] and
//! [`FieldBuffer::set`]).

use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::field::Field;

/// Capability to look fields up by name and visit them in order
pub trait Record {
    /// Get a field by name
    ///
    /// # Errors
    ///
    /// Returns `FieldNotFound` if the record has no such field.
    fn field(&self, name: &str) -> Result<Field>;

    /// Visit fields in insertion order
    ///
    /// Stops at and returns the first error `visit` returns. Can be called
    /// any number of times.
    fn iterate(&self, visit: &mut dyn FnMut(&Field) -> Result<()>) -> Result<()>;
}

impl<R: Record + ?Sized> Record for &R {
    fn field(&self, name: &str) -> Result<Field> {
        (**self).field(name)
    }

    fn iterate(&self, visit: &mut dyn FnMut(&Field) -> Result<()>) -> Result<()> {
        (**self).iterate(visit)
    }
}

impl<R: Record + ?Sized> Record for Box<R> {
    fn field(&self, name: &str) -> Result<Field> {
        (**self).field(name)
    }

    fn iterate(&self, visit: &mut dyn FnMut(&Field) -> Result<()>) -> Result<()> {
        (**self).iterate(visit)
    }
}

/// Owned, in-memory record
///
/// Small records (up to 8 fields) are stored inline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldBuffer {
    fields: SmallVec<[Field; 8]>,
}

impl FieldBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a buffer from fields, rejecting duplicate names
    pub fn from_fields(fields: impl IntoIterator<Item = Field>) -> Result<Self> {
        let mut fb = FieldBuffer::new();
        for field in fields {
            fb.add(field)?;
        }
        Ok(fb)
    }

    /// Deep copy of any record
    pub fn from_record(record: &dyn Record) -> Result<Self> {
        let mut fb = FieldBuffer::new();
        fb.add_from(record)?;
        Ok(fb)
    }

    /// Append a field
    ///
    /// # Errors
    ///
    /// Returns `DuplicateField` if a field with the same name exists.
    pub fn add(&mut self, field: Field) -> Result<()> {
        if self.position(&field.name).is_some() {
            return Err(Error::DuplicateField(field.name));
        }
        self.fields.push(field);
        Ok(())
    }

    /// Copy every field of `record` into this buffer
    pub fn add_from(&mut self, record: &dyn Record) -> Result<()> {
        record.iterate(&mut |f| self.add(f.clone()))
    }

    /// Replace the field with the same name, or append it
    pub fn set(&mut self, field: Field) {
        match self.position(&field.name) {
            Some(i) => self.fields[i] = field,
            None => self.fields.push(field),
        }
    }

    /// Remove a field by name, keeping the order of the others
    pub fn delete(&mut self, name: &str) -> Result<Field> {
        match self.position(name) {
            Some(i) => Ok(self.fields.remove(i)),
            None => Err(Error::FieldNotFound(name.to_string())),
        }
    }

    /// Borrow a field by name
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the buffer has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in order
    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

impl Record for FieldBuffer {
    fn field(&self, name: &str) -> Result<Field> {
        self.get(name)
            .cloned()
            .ok_or_else(|| Error::FieldNotFound(name.to_string()))
    }

    fn iterate(&self, visit: &mut dyn FnMut(&Field) -> Result<()>) -> Result<()> {
        for field in &self.fields {
            visit(field)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a FieldBuffer {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl IntoIterator for FieldBuffer {
    type Item = Field;
    type IntoIter = smallvec::IntoIter<[Field; 8]>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

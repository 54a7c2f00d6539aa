//! Partitioned record streams
//!
//! [`Reader::group_by`] walks its source once and copies each record into
//! the group of its key field's decoded value.
//!
//! # Key equality
//!
//! Keys compare by decoded value, not by bytes:
//! - `-0.0` and `0.0` share a group
//! - every NaN shares one group
//! - values of different types never share a group (`Int64(1)` and
//!   `Float64(1.0)` are two groups)
//!
//! Keys are stored in canonical form, so `keys()` reports `0.0` for a group
//! first seen as `-0.0`.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHashMap;
use tessera_core::error::{Error, Result};
use tessera_core::record::Record;
use tessera_core::value::Value;

use crate::reader::Reader;
use crate::store::RecordBuffer;

/// Hashable wrapper giving canonical-value equality
#[derive(Debug, Clone)]
struct GroupKey(Value);

impl GroupKey {
    fn new(value: Value) -> Self {
        GroupKey(value.canonical())
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.canonical_cmp(&other.0).is_eq()
    }
}

impl Eq for GroupKey {}

impl Hash for GroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.field_type().hash(state);
        match &self.0 {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int64(i) => i.hash(state),
            Value::Float64(f) => f.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::Bytes(b) => b.hash(state),
        }
    }
}

/// A set of Readers, optionally keyed by group value
#[derive(Debug, Clone, Default)]
pub struct GroupReader<'a> {
    readers: Vec<Reader<'a>>,
    keys: Vec<Value>,
    err: Option<Error>,
}

impl<'a> GroupReader<'a> {
    /// Group explicit Readers, without keys
    pub fn new(readers: Vec<Reader<'a>>) -> Self {
        Self {
            readers,
            keys: Vec::new(),
            err: None,
        }
    }

    fn failed(err: Error) -> Self {
        Self {
            readers: Vec::new(),
            keys: Vec::new(),
            err: Some(err),
        }
    }

    pub(crate) fn partition(source: &Reader<'a>, field: &str, sorted: bool) -> Self {
        if let Some(e) = source.err() {
            return Self::failed(e.clone());
        }

        let mut index: FxHashMap<GroupKey, usize> = FxHashMap::default();
        let mut groups: Vec<(Value, RecordBuffer)> = Vec::new();

        let walked = source.for_each(|record| {
            let key = GroupKey::new(record.field(field)?.value()?);
            let slot = match index.get(&key) {
                Some(&slot) => slot,
                None => {
                    groups.push((key.0.clone(), RecordBuffer::new()));
                    index.insert(key, groups.len() - 1);
                    groups.len() - 1
                }
            };
            groups[slot].1.add(record)
        });
        if let Some(e) = walked.err() {
            return Self::failed(e.clone());
        }

        if sorted {
            groups.sort_by(|(a, _), (b, _)| a.canonical_cmp(b));
        }

        let (keys, readers) = groups
            .into_iter()
            .map(|(key, rb)| (key, Reader::new(rb)))
            .unzip();
        Self {
            readers,
            keys,
            err: None,
        }
    }

    /// Member Readers, in order
    pub fn readers(&self) -> &[Reader<'a>] {
        &self.readers
    }

    /// Group keys, parallel to [`readers`](GroupReader::readers)
    ///
    /// Empty for a GroupReader built with [`new`](GroupReader::new).
    pub fn keys(&self) -> &[Value] {
        &self.keys
    }

    /// Reader for the group whose key equals `key`
    pub fn get(&self, key: &Value) -> Option<&Reader<'a>> {
        let wanted = GroupKey::new(key.clone());
        self.keys
            .iter()
            .position(|k| GroupKey(k.clone()) == wanted)
            .and_then(|i| self.readers.get(i))
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.readers.len()
    }

    /// Check if there are no groups
    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    /// Error recorded while grouping, if any
    pub fn err(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    /// All records of all groups, in group order
    ///
    /// Fails with the grouping error, or with the error of the first Failed
    /// member.
    pub fn concat(&self) -> Reader<'a> {
        match &self.err {
            Some(e) => Reader::failed(e.clone()),
            None => Reader::concat_all(&self.readers),
        }
    }

    /// Sum of the member Readers' counts
    pub fn count(&self) -> Result<usize> {
        self.concat().count()
    }
}

impl<'a> FromIterator<Reader<'a>> for GroupReader<'a> {
    fn from_iter<I: IntoIterator<Item = Reader<'a>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

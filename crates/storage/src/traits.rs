//! Storage engine abstraction
//!
//! An [`Engine`] hands out [`Transaction`]s. A transaction reads a fixed
//! snapshot plus its own writes, and either commits all of its writes
//! atomically or none of them.
//!
//! Data lives in named buckets. A bucket must be created before keys can be
//! written to it; keys within a bucket are kept in byte order.

use tessera_core::cancel::CancelToken;
use tessera_core::error::Result;

/// A `(key, value)` pair read from a bucket
pub type Entry = (Vec<u8>, Vec<u8>);

/// Lazy, key-ordered sequence of entries
pub type Entries<'a> = Box<dyn Iterator<Item = Result<Entry>> + 'a>;

/// A transactional key-value store
pub trait Engine: Send + Sync {
    /// Start a transaction
    ///
    /// A read-only transaction (`writable == false`) rejects every write
    /// with `ReadOnlyTransaction`.
    fn begin(&self, writable: bool) -> Result<Box<dyn Transaction + '_>>;

    /// Short engine name ("memory", "log")
    fn name(&self) -> &'static str;
}

/// A unit of work against an [`Engine`]
///
/// Dropping a transaction without calling [`commit`](Transaction::commit)
/// rolls it back.
pub trait Transaction: Send + Sync {
    /// Whether this transaction accepts writes
    fn writable(&self) -> bool;

    /// Create an empty bucket
    ///
    /// Fails with `BucketExists` if the name is taken.
    fn create_bucket(&mut self, name: &str) -> Result<()>;

    /// Remove a bucket and every key in it
    ///
    /// Fails with `BucketNotFound` if there is no such bucket.
    fn drop_bucket(&mut self, name: &str) -> Result<()>;

    /// Check whether a bucket exists
    fn has_bucket(&self, name: &str) -> bool;

    /// Read one value
    fn get(&self, bucket: &str, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Write one value, replacing any previous one
    fn put(&mut self, bucket: &str, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove one value
    ///
    /// Fails with `KeyNotFound` if the key is absent.
    fn delete(&mut self, bucket: &str, key: &[u8]) -> Result<()>;

    /// Iterate the entries of `bucket` whose key starts with `prefix`
    ///
    /// Entries are produced lazily, in ascending key order.
    fn iterate<'a>(&'a self, bucket: &str, prefix: &[u8]) -> Result<Entries<'a>>;

    /// Like [`iterate`](Transaction::iterate), stopping with `Cancelled` once
    /// `cancel` fires
    fn iterate_until<'a>(
        &'a self,
        bucket: &str,
        prefix: &[u8],
        cancel: &CancelToken,
    ) -> Result<Entries<'a>> {
        let entries = self.iterate(bucket, prefix)?;
        Ok(Box::new(Cancellable::new(entries, cancel.clone())))
    }

    /// Validate and publish every write of this transaction
    ///
    /// Fails with `Conflict` if a key or bucket written here was changed by
    /// another transaction that committed after this one began. Committing
    /// a read-only transaction only releases it.
    fn commit(self: Box<Self>) -> Result<()>;

    /// Discard every write of this transaction
    fn rollback(self: Box<Self>) -> Result<()>;
}

/// Iterator adapter that checks a [`CancelToken`] before each entry
///
/// Once the token fires, yields a single `Cancelled` error and then ends.
pub struct Cancellable<I> {
    inner: I,
    cancel: CancelToken,
    done: bool,
}

impl<I> Cancellable<I> {
    /// Wrap `inner`
    pub fn new(inner: I, cancel: CancelToken) -> Self {
        Self {
            inner,
            cancel,
            done: false,
        }
    }
}

impl<I> Iterator for Cancellable<I>
where
    I: Iterator<Item = Result<Entry>>,
{
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Err(e) = self.cancel.check() {
            self.done = true;
            return Some(Err(e));
        }
        let item = self.inner.next();
        if matches!(item, None | Some(Err(_))) {
            self.done = true;
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::error::Error;

    fn entries(n: u8) -> impl Iterator<Item = Result<Entry>> {
        (0..n).map(|i| Ok((vec![i], vec![i])))
    }

    #[test]
    fn test_cancellable_passes_through() {
        let it = Cancellable::new(entries(3), CancelToken::new());
        assert_eq!(it.count(), 3);
    }

    #[test]
    fn test_cancellable_stops_once() {
        let token = CancelToken::new();
        let mut it = Cancellable::new(entries(5), token.clone());
        assert!(it.next().unwrap().is_ok());
        token.cancel();
        assert!(matches!(it.next(), Some(Err(Error::Cancelled))));
        assert!(it.next().is_none());
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let items: Vec<_> = Cancellable::new(entries(5), token).collect();
        assert_eq!(items.len(), 1);
        assert!(items[0].as_ref().unwrap_err().is_cancelled());
    }
}

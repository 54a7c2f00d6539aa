//! Lazy record streams
//!
//! A [`Reader`] is either Ok, holding a tree of operator nodes over a
//! [`RecordStore`], or Failed, holding the error that ended it.
//!
//! - `filter` and `map` add a node and return at once; nothing is read
//! - `for_each`, `count`, `collect` and `group_by` walk the tree
//! - A walk that fails returns a new, Failed Reader; the receiver never
//!   changes, so it can be walked again
//! - Every operator on a Failed Reader returns that same error without
//!   calling user code
//!
//! ```
//! use tessera_core::{Field, FieldBuffer, Record};
//! use tessera_table::{Reader, RecordBuffer};
//!
//! let rb: RecordBuffer = (0..10)
//!     .map(|i| FieldBuffer::from_fields([Field::int64("id", i)]).unwrap())
//!     .collect();
//! let even = Reader::new(rb).filter(|r| Ok(r.field("id")?.as_int64()? % 2 == 0));
//! assert_eq!(even.count().unwrap(), 5);
//! ```

use std::fmt;
use std::sync::Arc;

use tessera_core::error::{Error, Result};
use tessera_core::record::{FieldBuffer, Record};

use crate::group::GroupReader;
use crate::store::{RecordBuffer, RecordStore, Visit};

type Predicate<'a> = Arc<dyn Fn(&dyn Record) -> Result<bool> + Send + Sync + 'a>;
type Transform<'a> = Arc<dyn Fn(&dyn Record) -> Result<FieldBuffer> + Send + Sync + 'a>;

/// One stage of a Reader's pipeline
enum Node<'a> {
    Store(Arc<dyn RecordStore + 'a>),
    Filter {
        upstream: Arc<Node<'a>>,
        predicate: Predicate<'a>,
    },
    Map {
        upstream: Arc<Node<'a>>,
        transform: Transform<'a>,
    },
    Concat(Vec<Arc<Node<'a>>>),
}

impl Node<'_> {
    fn walk(&self, visit: &mut Visit<'_>) -> Result<()> {
        match self {
            Node::Store(store) => store.for_each(visit),
            Node::Filter {
                upstream,
                predicate,
            } => upstream.walk(&mut |record| {
                if predicate(record)? {
                    visit(record)
                } else {
                    Ok(())
                }
            }),
            Node::Map {
                upstream,
                transform,
            } => upstream.walk(&mut |record| {
                let mapped = transform(record)?;
                visit(&mapped)
            }),
            Node::Concat(parts) => {
                for part in parts {
                    part.walk(visit)?;
                }
                Ok(())
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            Node::Store(_) => "store".to_string(),
            Node::Filter { upstream, .. } => format!("{} -> filter", upstream.describe()),
            Node::Map { upstream, .. } => format!("{} -> map", upstream.describe()),
            Node::Concat(parts) => format!("concat({})", parts.len()),
        }
    }
}

#[derive(Clone)]
enum State<'a> {
    Ok(Arc<Node<'a>>),
    Failed(Error),
}

/// Lazy, immutable stream of records with a sticky error
///
/// Cloning is cheap: clones share the pipeline.
#[derive(Clone)]
pub struct Reader<'a> {
    state: State<'a>,
}

impl<'a> Reader<'a> {
    /// Wrap a record store; never touches it
    pub fn new<S>(store: S) -> Self
    where
        S: RecordStore + 'a,
    {
        Self::from_store(Arc::new(store))
    }

    /// Wrap a shared record store
    pub fn from_store(store: Arc<dyn RecordStore + 'a>) -> Self {
        Self::ok(Node::Store(store))
    }

    /// A Reader that has already failed with `err`
    pub fn failed(err: Error) -> Self {
        Self {
            state: State::Failed(err),
        }
    }

    fn ok(node: Node<'a>) -> Self {
        Self {
            state: State::Ok(Arc::new(node)),
        }
    }

    /// Visit every record in order
    ///
    /// Returns a Reader equal to this one when the walk completes, or a
    /// Failed Reader carrying the first error from `visit` or the source.
    /// On a Failed Reader `visit` is never called.
    pub fn for_each<F>(&self, mut visit: F) -> Reader<'a>
    where
        F: FnMut(&dyn Record) -> Result<()>,
    {
        match &self.state {
            State::Failed(_) => self.clone(),
            State::Ok(node) => match node.walk(&mut visit) {
                Ok(()) => self.clone(),
                Err(e) => Reader::failed(e),
            },
        }
    }

    /// Keep only records for which `predicate` returns true
    ///
    /// Lazy: `predicate` runs when the result is walked, and its errors
    /// surface then.
    pub fn filter<F>(&self, predicate: F) -> Reader<'a>
    where
        F: Fn(&dyn Record) -> Result<bool> + Send + Sync + 'a,
    {
        match &self.state {
            State::Failed(_) => self.clone(),
            State::Ok(node) => Reader::ok(Node::Filter {
                upstream: Arc::clone(node),
                predicate: Arc::new(predicate),
            }),
        }
    }

    /// Replace each record with `transform(record)`
    ///
    /// Lazy, like [`filter`](Reader::filter). The source records are not
    /// modified.
    pub fn map<F>(&self, transform: F) -> Reader<'a>
    where
        F: Fn(&dyn Record) -> Result<FieldBuffer> + Send + Sync + 'a,
    {
        match &self.state {
            State::Failed(_) => self.clone(),
            State::Ok(node) => Reader::ok(Node::Map {
                upstream: Arc::clone(node),
                transform: Arc::new(transform),
            }),
        }
    }

    /// Number of records, forcing a full walk
    pub fn count(&self) -> Result<usize> {
        let mut n = 0;
        let walked = self.for_each(|_| {
            n += 1;
            Ok(())
        });
        match walked.state {
            State::Failed(e) => Err(e),
            State::Ok(_) => Ok(n),
        }
    }

    /// The stored error, if this Reader is Failed
    ///
    /// Never walks the pipeline: a lazy filter whose predicate would fail
    /// still reports `None` until something walks it.
    pub fn err(&self) -> Option<&Error> {
        match &self.state {
            State::Ok(_) => None,
            State::Failed(e) => Some(e),
        }
    }

    /// Check whether this Reader is Failed
    pub fn is_failed(&self) -> bool {
        matches!(self.state, State::Failed(_))
    }

    /// Copy every record into an owned buffer
    pub fn collect(&self) -> Result<RecordBuffer> {
        let mut rb = RecordBuffer::new();
        let walked = self.for_each(|r| rb.add(r));
        match walked.state {
            State::Failed(e) => Err(e),
            State::Ok(_) => Ok(rb),
        }
    }

    /// Partition records by the decoded value of `field`
    ///
    /// Groups appear in the order their key was first seen.
    pub fn group_by(&self, field: &str) -> GroupReader<'a> {
        GroupReader::partition(self, field, false)
    }

    /// Like [`group_by`](Reader::group_by), with groups in key order
    pub fn group_by_sorted(&self, field: &str) -> GroupReader<'a> {
        GroupReader::partition(self, field, true)
    }

    /// Records of this Reader followed by those of `other`
    pub fn concat(&self, other: &Reader<'a>) -> Reader<'a> {
        Reader::concat_all([self, other])
    }

    /// Concatenate in order; the first Failed input fails the result
    pub(crate) fn concat_all<'r, I>(readers: I) -> Reader<'a>
    where
        'a: 'r,
        I: IntoIterator<Item = &'r Reader<'a>>,
    {
        let mut parts = Vec::new();
        for reader in readers {
            match &reader.state {
                State::Failed(e) => return Reader::failed(e.clone()),
                State::Ok(node) => parts.push(Arc::clone(node)),
            }
        }
        Reader::ok(Node::Concat(parts))
    }
}

impl fmt::Debug for Reader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            State::Ok(node) => f.debug_tuple("Reader::Ok").field(&node.describe()).finish(),
            State::Failed(e) => f.debug_tuple("Reader::Failed").field(e).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tessera_core::field::Field;

    static_assertions::assert_impl_all!(Reader<'static>: Send, Sync, Clone);

    fn create_table(size: i64) -> Reader<'static> {
        let rb: RecordBuffer = (0..size)
            .map(|i| {
                FieldBuffer::from_fields([
                    Field::int64("id", i),
                    Field::string("name", format!("john-{}", i)),
                    Field::int64("age", i * 10),
                    Field::int64("group", i % 3),
                ])
                .unwrap()
            })
            .collect();
        Reader::new(rb)
    }

    fn id(r: &dyn Record) -> Result<i64> {
        r.field("id")?.as_int64()
    }

    #[test]
    fn test_for_each_order() {
        let tr = create_table(10);
        let mut i = 0;
        let tr = tr.for_each(|r| {
            assert_eq!(id(r)?, i);
            i += 1;
            Ok(())
        });
        assert!(tr.err().is_none());
        assert_eq!(i, 10);
    }

    #[test]
    fn test_for_each_error_is_immutable() {
        let tr = create_table(10);
        let mut calls = 0;
        let tr2 = tr.for_each(|_| {
            calls += 1;
            Err(Error::user("some error"))
        });
        assert_eq!(calls, 1);
        assert!(tr.err().is_none());
        assert_eq!(tr2.err().unwrap().to_string(), "some error");
        assert_eq!(tr.count().unwrap(), 10);
    }

    #[test]
    fn test_failed_reader_never_calls_back() {
        let failed = Reader::failed(Error::user("boom"));
        let calls = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&calls);
        let derived = failed
            .filter(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            })
            .map(|r| FieldBuffer::from_record(r));
        let derived = derived.for_each(|_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(derived.err().unwrap().to_string(), "boom");
        assert_eq!(derived.count().unwrap_err().to_string(), "boom");
        assert!(derived.group_by("id").err().is_some());
    }

    #[test]
    fn test_filter() {
        let tr = create_table(10);
        let tr2 = tr.filter(|r| Ok(id(r)? % 2 == 0));
        assert!(tr2.err().is_none());

        assert_eq!(tr.count().unwrap(), 10);

        let mut seen = Vec::new();
        let tr3 = tr2.for_each(|r| {
            seen.push(id(r)?);
            Ok(())
        });
        assert!(tr3.err().is_none());
        assert_eq!(seen, vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn test_filter_is_lazy() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let tr = create_table(10).filter(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Err(Error::user("some error"))
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(tr.err().is_none());

        let forced = tr.for_each(|_| Ok(()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(forced.err().unwrap().to_string(), "some error");
        assert_eq!(tr.count().unwrap_err().to_string(), "some error");
    }

    #[test]
    fn test_map() {
        let tr = create_table(10);
        let tr2 = tr.map(|r| {
            let age = r.field("age")?.as_int64()?;
            let mut fb = FieldBuffer::new();
            fb.add_from(r)?;
            fb.set(Field::int64("age", age * 2));
            Ok(fb)
        });
        assert!(tr2.err().is_none());

        let mut i = 0;
        tr.for_each(|r| {
            assert_eq!(r.field("age")?.as_int64()?, i * 10);
            i += 1;
            Ok(())
        });
        assert_eq!(i, 10);

        let mut i = 0;
        let out = tr2.for_each(|r| {
            assert_eq!(r.field("age")?.as_int64()?, i * 20);
            assert_eq!(id(r)?, i);
            i += 1;
            Ok(())
        });
        assert!(out.err().is_none());
        assert_eq!(i, 10);
    }

    #[test]
    fn test_map_error() {
        let tr = create_table(10);
        let tr2 = tr.map(|_| Err(Error::user("some error")));
        assert!(tr.err().is_none());
        assert_eq!(tr2.count().unwrap_err().to_string(), "some error");
    }

    #[test]
    fn test_user_error_is_passed_through() {
        #[derive(Debug)]
        struct Custom;
        impl fmt::Display for Custom {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "custom")
            }
        }
        impl std::error::Error for Custom {}

        let out = create_table(3).for_each(|_| Err(Error::user(Custom)));
        let inner = out.err().and_then(Error::user_error).unwrap();
        assert!(inner.downcast_ref::<Custom>().is_some());
    }

    #[test]
    fn test_count() {
        assert_eq!(create_table(10).count().unwrap(), 10);
        assert_eq!(create_table(0).count().unwrap(), 0);
    }

    #[test]
    fn test_missing_field_surfaces_as_error() {
        let tr = create_table(4).filter(|r| Ok(r.field("missing")?.as_int64()? > 0));
        assert!(matches!(tr.count(), Err(Error::FieldNotFound(_))));
    }

    #[test]
    fn test_collect() {
        let rb = create_table(4).filter(|r| Ok(id(r)? > 1)).collect().unwrap();
        assert_eq!(rb.len(), 2);
        assert_eq!(rb.get(0).unwrap().field("id").unwrap().as_int64().unwrap(), 2);
    }

    #[test]
    fn test_concat() {
        let r = create_table(2).concat(&create_table(3));
        assert!(r.err().is_none());
        assert_eq!(r.count().unwrap(), 5);

        let mut ids = Vec::new();
        r.for_each(|rec| {
            ids.push(id(rec)?);
            Ok(())
        });
        assert_eq!(ids, vec![0, 1, 0, 1, 2]);
    }

    #[test]
    fn test_concat_with_failed_is_failed() {
        let r = create_table(2).concat(&Reader::failed(Error::Cancelled));
        assert!(r.err().unwrap().is_cancelled());
    }

    #[test]
    fn test_borrowed_store() {
        let rb: RecordBuffer = (0..3)
            .map(|i| FieldBuffer::from_fields([Field::int64("id", i)]).unwrap())
            .collect();
        let tr = Reader::new(&rb);
        assert_eq!(tr.count().unwrap(), 3);
        assert_eq!(rb.len(), 3);
    }

    #[test]
    fn test_debug_shows_pipeline() {
        let tr = create_table(1).filter(|_| Ok(true)).map(|r| FieldBuffer::from_record(r));
        assert!(format!("{:?}", tr).contains("filter -> map"));
    }
}

//! Shared helpers for integration suites
//!
//! Import with `#[path = "../common/mod.rs"] mod common;` from a suite's
//! main.rs.

#![allow(dead_code)]

use tempfile::TempDir;
pub use tessera::{
    Database, DatabaseConfig, Error, Field, FieldBuffer, Reader, Record, RecordBuffer, Table,
    Transaction, Value,
};

/// A log-engine database in a temporary directory
pub struct TestDb {
    pub db: Database,
    pub dir: TempDir,
}

impl TestDb {
    /// Fresh database with `always` durability
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let db = Database::open(DatabaseConfig::log(dir.path()).with_durability("always"))
            .expect("open database");
        Self { db, dir }
    }

    /// Close and reopen the same directory
    pub fn reopen(self) -> Self {
        let TestDb { db, dir } = self;
        let config = db.config().clone();
        drop(db);
        let db = Database::open(config).expect("reopen database");
        Self { db, dir }
    }
}

/// `{id, name, age, group}` with `group = id % 3`
pub fn person(id: i64) -> FieldBuffer {
    FieldBuffer::from_fields([
        Field::int64("id", id),
        Field::string("name", format!("john-{}", id)),
        Field::int64("age", id * 10),
        Field::int64("group", id % 3),
    ])
    .expect("unique field names")
}

/// Create `name` and insert `person(0..n)`
pub fn seed_people(db: &Database, name: &str, n: i64) {
    db.update(|txn| {
        let table = Table::create(txn, name)?;
        for id in 0..n {
            table.insert(txn, &person(id))?;
        }
        Ok(())
    })
    .expect("seed table");
}

/// Values of the `id` field, in reader order
pub fn ids(reader: &Reader<'_>) -> Result<Vec<i64>, Error> {
    let mut out = Vec::new();
    let walked = reader.for_each(|r| {
        out.push(r.field("id")?.as_int64()?);
        Ok(())
    });
    match walked.err() {
        Some(e) => Err(e.clone()),
        None => Ok(out),
    }
}

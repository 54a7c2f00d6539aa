//! Tables survive reopening a log-engine database

use crate::common::*;

#[test]
fn records_survive_reopen() {
    let t = TestDb::new();
    seed_people(&t.db, "people", 8);
    let t = t.reopen();

    let got = t
        .db
        .view(|txn| ids(&Table::open(txn, "people")?.reader(txn)))
        .unwrap();
    assert_eq!(got, (0..8).collect::<Vec<_>>());
}

#[test]
fn key_sequence_continues_after_reopen() {
    let t = TestDb::new();
    seed_people(&t.db, "people", 2);
    let t = t.reopen();

    let key = t
        .db
        .update(|txn| Table::open(txn, "people")?.insert(txn, &person(2)))
        .unwrap();
    assert_eq!(key, 3u64.to_be_bytes().to_vec());
}

#[test]
fn failed_update_leaves_nothing_behind() {
    let t = TestDb::new();
    seed_people(&t.db, "people", 1);

    let err = t
        .db
        .update(|txn| {
            let table = Table::open(txn, "people")?;
            table.insert(txn, &person(1))?;
            Table::create(txn, "other")?;
            Err::<(), _>(Error::user("abort"))
        })
        .unwrap_err();
    assert_eq!(err.to_string(), "abort");

    let t = t.reopen();
    t.db.view(|txn| {
        assert_eq!(Table::open(txn, "people")?.reader(txn).count()?, 1);
        assert!(matches!(
            Table::open(txn, "other"),
            Err(Error::BucketNotFound(_))
        ));
        Ok(())
    })
    .unwrap();
}

#[test]
fn dropped_table_stays_dropped() {
    let t = TestDb::new();
    seed_people(&t.db, "people", 3);
    t.db.update(|txn| Table::drop_table(txn, "people")).unwrap();
    let t = t.reopen();

    let res = t.db.view(|txn| Table::open(txn, "people").map(|_| ()));
    assert!(matches!(res, Err(Error::BucketNotFound(_))));
}

#[test]
fn open_dir_uses_config_file() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("tessera.toml"), "engine = \"memory\"\n").unwrap();

    let db = Database::open_dir(dir.path()).unwrap();
    assert_eq!(db.engine().name(), "memory");
    seed_people(&db, "people", 1);
    drop(db);

    let db = Database::open_dir(dir.path()).unwrap();
    let res = db.view(|txn| Table::open(txn, "people").map(|_| ()));
    assert!(matches!(res, Err(Error::BucketNotFound(_))));
}

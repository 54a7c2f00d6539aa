//! Reader pipelines over stored tables

use crate::common::*;

#[test]
fn table_reader_walks_in_insertion_order() {
    let t = TestDb::new();
    seed_people(&t.db, "people", 20);

    let got = t
        .db
        .view(|txn| ids(&Table::open(txn, "people")?.reader(txn)))
        .unwrap();
    assert_eq!(got, (0..20).collect::<Vec<_>>());
}

#[test]
fn filter_map_count_pipeline() {
    let t = TestDb::new();
    seed_people(&t.db, "people", 10);

    let names = t
        .db
        .view(|txn| {
            let people = Table::open(txn, "people")?;
            let base = people.reader(txn);
            let older = base
                .filter(|r| Ok(r.field("age")?.as_int64()? >= 50))
                .map(|r| {
                    let mut out = FieldBuffer::new();
                    out.add(r.field("name")?)?;
                    out.add(Field::bool("senior", true))?;
                    Ok(out)
                });

            // the base reader is unaffected by derived ones
            assert_eq!(base.count()?, 10);
            assert_eq!(older.count()?, 5);

            let rb = older.collect()?;
            rb.iter()
                .map(|r| r.field("name")?.as_string())
                .collect::<Result<Vec<_>, _>>()
        })
        .unwrap();
    assert_eq!(
        names,
        vec!["john-5", "john-6", "john-7", "john-8", "john-9"]
    );
}

#[test]
fn callback_error_is_sticky() {
    let t = TestDb::new();
    seed_people(&t.db, "people", 5);

    t.db.view(|txn| {
        let r = Table::open(txn, "people")?.reader(txn);
        let failed = r.for_each(|rec| {
            if rec.field("id")?.as_int64()? == 2 {
                return Err(Error::user("boom"));
            }
            Ok(())
        });
        assert_eq!(failed.err().unwrap().to_string(), "boom");
        assert!(r.err().is_none());

        let mut calls = 0;
        let again = failed.for_each(|_| {
            calls += 1;
            Ok(())
        });
        assert_eq!(calls, 0);
        assert_eq!(again.err().unwrap().to_string(), "boom");
        assert!(failed.filter(|_| Ok(true)).count().is_err());
        Ok(())
    })
    .unwrap();
}

#[test]
fn group_by_stored_records() {
    let t = TestDb::new();
    seed_people(&t.db, "people", 10);

    t.db.view(|txn| {
        let groups = Table::open(txn, "people")?.reader(txn).group_by("group");
        assert!(groups.err().is_none());
        assert_eq!(
            groups.keys(),
            &[Value::Int64(0), Value::Int64(1), Value::Int64(2)]
        );
        assert_eq!(ids(&groups.readers()[1])?, vec![1, 4, 7]);
        assert_eq!(groups.count()?, 10);
        Ok(())
    })
    .unwrap();
}

#[test]
fn group_readers_outlive_the_transaction() {
    let t = TestDb::new();
    seed_people(&t.db, "people", 6);

    let groups = t
        .db
        .view(|txn| {
            let groups = Table::open(txn, "people")?.reader(txn).group_by("group");
            // groups hold copies, so they can be rebuilt as 'static readers
            let owned: Vec<Reader<'static>> = groups
                .readers()
                .iter()
                .map(|r| r.collect().map(Reader::new))
                .collect::<Result<_, _>>()?;
            Ok(owned)
        })
        .unwrap();

    let counts: Vec<usize> = groups.iter().map(|r| r.count().unwrap()).collect();
    assert_eq!(counts, vec![2, 2, 2]);
}

#[test]
fn concat_across_tables() {
    let t = TestDb::new();
    seed_people(&t.db, "a", 2);
    seed_people(&t.db, "b", 3);

    let got = t
        .db
        .view(|txn| {
            let a = Table::open(txn, "a")?.reader(txn);
            let b = Table::open(txn, "b")?.reader(txn);
            ids(&a.concat(&b))
        })
        .unwrap();
    assert_eq!(got, vec![0, 1, 0, 1, 2]);
}

#[test]
fn reader_sees_its_transaction_snapshot() {
    let t = TestDb::new();
    seed_people(&t.db, "people", 3);

    let txn = t.db.begin(false).unwrap();
    let reader = Table::open(txn.as_ref(), "people")
        .unwrap()
        .reader(txn.as_ref());

    seed_more(&t.db, 3..6);

    assert_eq!(reader.count().unwrap(), 3);
    drop(reader);
    txn.rollback().unwrap();

    let total = t
        .db
        .view(|txn| Table::open(txn, "people")?.reader(txn).count())
        .unwrap();
    assert_eq!(total, 6);
}

fn seed_more(db: &Database, range: std::ops::Range<i64>) {
    db.update(|txn| {
        let table = Table::open(txn, "people")?;
        for id in range.clone() {
            table.insert(txn, &person(id))?;
        }
        Ok(())
    })
    .unwrap();
}

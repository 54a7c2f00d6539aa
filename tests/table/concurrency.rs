//! Concurrent writers and readers through one database

use crate::common::*;
use std::sync::Barrier;
use std::thread;
use tessera::RetryConfig;

#[test]
fn concurrent_inserts_with_retry_all_land() {
    let t = TestDb::new();
    seed_people(&t.db, "people", 0);

    let threads = 4;
    let per_thread = 25;
    let barrier = Barrier::new(threads);
    let policy = RetryConfig::new().with_max_retries(1000).with_delays(0, 1);

    thread::scope(|s| {
        for w in 0..threads {
            let db = &t.db;
            let barrier = &barrier;
            s.spawn(move || {
                barrier.wait();
                for i in 0..per_thread {
                    let id = (w * per_thread + i) as i64;
                    db.update_with_retry(policy, |txn| {
                        Table::open(txn, "people")?.insert(txn, &person(id))
                    })
                    .unwrap();
                }
            });
        }
    });

    let mut got = t
        .db
        .view(|txn| ids(&Table::open(txn, "people")?.reader(txn)))
        .unwrap();
    assert_eq!(got.len(), threads * per_thread);
    got.sort_unstable();
    assert_eq!(got, (0..(threads * per_thread) as i64).collect::<Vec<_>>());
}

#[test]
fn readers_run_while_writers_commit() {
    let t = TestDb::new();
    seed_people(&t.db, "people", 10);

    thread::scope(|s| {
        s.spawn(|| {
            for id in 10..30 {
                t.db.update_with_retry(RetryConfig::new().with_max_retries(100), |txn| {
                    Table::open(txn, "people")?.insert(txn, &person(id))
                })
                .unwrap();
            }
        });
        for _ in 0..2 {
            s.spawn(|| {
                for _ in 0..20 {
                    // every snapshot is a prefix of the final sequence
                    let got = t
                        .db
                        .view(|txn| ids(&Table::open(txn, "people")?.reader(txn)))
                        .unwrap();
                    assert!(got.len() >= 10);
                    assert_eq!(got, (0..got.len() as i64).collect::<Vec<_>>());
                }
            });
        }
    });
}

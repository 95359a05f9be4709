//! Shared-pass wrapper behavior (requires the `sync` feature).

use std::thread;
use tempora::agg::{AggKind, WindowAgg};
use tempora::temporal::{TInstant, Temporal};
use tempora::SyncWindowAgg;
use tempora_types::{TimeDelta, Timestamp, Value};

fn sample(v: f64, secs: i64) -> Temporal {
    Temporal::Instant(TInstant::new(Value::Float(v), Timestamp::from_secs(secs)).unwrap())
}

#[test]
fn test_shared_pass_accepts_concurrent_transitions() {
    let shared = SyncWindowAgg::new(AggKind::Min, TimeDelta::from_secs(5)).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let shared = shared.clone();
            thread::spawn(move || {
                for i in 0..25i64 {
                    let v = (worker * 25 + i) as f64;
                    shared.transfn(&sample(v, i * 4 + worker)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let out = shared.finalize().unwrap().expect("samples were folded");
    // Worker 0's first sample always wins at its own timestamp.
    assert_eq!(out.value_at(Timestamp::from_secs(0)), Some(Value::Float(0.0)));
}

#[test]
fn test_partitioned_passes_reduce_into_shared() {
    let shared = SyncWindowAgg::new(AggKind::Max, TimeDelta::from_secs(5)).unwrap();

    let mut partition = WindowAgg::new(AggKind::Max, TimeDelta::from_secs(5)).unwrap();
    partition.transfn(&sample(9.0, 0)).unwrap();
    shared.combine(partition).unwrap();
    shared.transfn(&sample(4.0, 2)).unwrap();

    let out = shared.finalize().unwrap().expect("non-empty");
    assert_eq!(out.value_at(Timestamp::from_secs(3)), Some(Value::Float(9.0)));
    assert_eq!(out.value_at(Timestamp::from_secs(6)), Some(Value::Float(4.0)));
}

#[test]
fn test_finalize_snapshot_keeps_pass_usable() {
    let shared = SyncWindowAgg::new(AggKind::Min, TimeDelta::from_secs(5)).unwrap();
    shared.transfn(&sample(3.0, 0)).unwrap();

    let first = shared.finalize().unwrap().expect("non-empty");
    shared.transfn(&sample(1.0, 1)).unwrap();
    let second = shared.finalize().unwrap().expect("non-empty");

    assert_eq!(first.value_at(Timestamp::from_secs(2)), Some(Value::Float(3.0)));
    assert_eq!(second.value_at(Timestamp::from_secs(2)), Some(Value::Float(1.0)));
}

//! Scenario tests S1-S7 from §8 of `SPEC_FULL.md`, plus a couple of
//! supporting checks for the replace-shortens/lengthens-deadline, idempotent-
//! remove, and ordered-expiration properties. The bounded-auxiliary-state
//! property (ladder buckets + pending log vs. live entries) is exercised as
//! a unit test against the internal `needs_reschedule` bound in
//! `src/pending.rs`, since the ladder and pending log are not part of this
//! crate's public surface.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use expiring_store::{Config, Store};

fn store<V: Send + Sync + 'static>() -> Store<&'static str, V> {
    Store::new(Config::default())
}

#[test]
fn s1_absent_key() {
    let store: Store<&str, i32> = store();
    assert_eq!(store.get(&"x"), None);
    store.close();
}

#[test]
fn s2_zero_timeout_is_a_noop() {
    let store = store();
    store.put("a", 1, 0);
    assert_eq!(store.size(), 0);
    assert_eq!(store.get(&"a"), None);
    store.close();
}

#[test]
fn s3_basic_expiry() {
    let store = store();
    store.put("a", 1, 200);
    assert_eq!(store.get(&"a"), Some(1));
    thread::sleep(Duration::from_millis(100));
    assert_eq!(store.get(&"a"), Some(1));
    thread::sleep(Duration::from_millis(300));
    assert_eq!(store.get(&"a"), None);
    assert_eq!(store.size(), 0);
    store.close();
}

#[test]
fn s4_out_of_order_expiration() {
    let store = store();
    store.put("k1", 1, 250);
    store.put("k2", 2, 300);
    store.put("k3", 3, 100);
    thread::sleep(Duration::from_millis(150));
    assert_eq!(store.get(&"k3"), None);
    assert_eq!(store.get(&"k1"), Some(1));
    assert_eq!(store.get(&"k2"), Some(2));
    store.remove(&"k2");
    assert_eq!(store.get(&"k2"), None);
    assert_eq!(store.get(&"k1"), Some(1));
    store.close();
}

#[test]
fn s5_replace_shortens_deadline() {
    let store = store();
    store.put("a", 1, 1000);
    store.put("a", 2, 100);
    thread::sleep(Duration::from_millis(200));
    assert_eq!(store.get(&"a"), None);
    store.close();
}

#[test]
fn s6_replace_lengthens_deadline() {
    let store = store();
    store.put("a", 1, 100);
    store.put("a", 2, 1000);
    thread::sleep(Duration::from_millis(300));
    assert_eq!(store.get(&"a"), Some(2));
    thread::sleep(Duration::from_millis(1000));
    assert_eq!(store.get(&"a"), None);
    store.close();
}

#[test]
fn s7_parallel_stress() {
    let store: Arc<Store<String, usize>> = Arc::new(Store::new(Config::default()));
    let mut handles = Vec::new();
    for thread_idx in 0..10 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            let mut keys = Vec::with_capacity(100);
            for i in 0..100 {
                let key = format!("t{thread_idx}-k{i}");
                let timeout_ms = 150 + (i % 100);
                store.put(key.clone(), i, timeout_ms as i64);
                assert_eq!(store.get(&key), Some(i), "just-inserted key must read back");
                keys.push(key);
            }
            for key in &keys {
                store.remove(key);
                assert_eq!(store.get(key), None);
            }
        }));
    }
    for handle in handles {
        handle.join().expect("worker thread panicked");
    }
    assert_eq!(store.size(), 0);
    store.close();
}

#[test]
fn replace_correctness_regardless_of_ordering() {
    // property 3: after put(k, v1, t1); put(k, v2, t2), get(k) observes v2
    // until t2 elapses, regardless of t1 vs t2.
    let store = store();
    store.put("k", 1, 50);
    store.put("k", 2, 400);
    thread::sleep(Duration::from_millis(150));
    assert_eq!(store.get(&"k"), Some(2));
    store.close();
}

#[test]
fn idempotent_remove_on_absent_key() {
    let store: Store<&str, i32> = store();
    store.remove(&"missing");
    assert_eq!(store.size(), 0);
    store.close();
}

#[test]
fn ordered_expiration_under_distinct_deadlines() {
    // property 7: k1 with an earlier absolute deadline than k2 must be
    // observed absent no later than k2.
    let store = store();
    store.put("k1", 1, 100);
    store.put("k2", 2, 400);
    thread::sleep(Duration::from_millis(200));
    assert_eq!(store.get(&"k1"), None);
    assert_eq!(store.get(&"k2"), Some(2));
    store.close();
}

#[test]
fn close_is_idempotent_and_stops_further_eviction_work() {
    let store = store();
    store.put("a", 1, 50);
    store.close();
    store.close();
    // UseAfterClose: implementation-defined, but must not panic or corrupt
    // state.
    store.put("b", 2, 1000);
    let _ = store.get(&"a");
}

#[test]
fn distinct_keys_do_not_collide() {
    let store = store();
    let mut seen = HashSet::new();
    for i in 0..50 {
        let key = format!("k{i}");
        store.put(key.clone(), i, 500);
        seen.insert(key);
    }
    assert_eq!(store.size(), seen.len());
    store.close();
}

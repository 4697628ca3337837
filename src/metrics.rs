//! Instrumentation for [`crate::Store`] and its purger.
//!
//! Counters/gauges at the same points `async_lru`'s `metrics.rs` instruments
//! its own cache (hit/miss/waiting, size), adapted to the public `metrics`
//! facade crate rather than an in-house prometheus-backed wrapper, since
//! this crate has no server process to register a prometheus registry with.

use metrics::{counter, gauge, histogram};

pub fn log_store_put() {
    counter!("expiring_store_put_total").increment(1);
}

pub fn log_store_get_hit() {
    counter!("expiring_store_get_hit_total").increment(1);
}

pub fn log_store_get_miss() {
    counter!("expiring_store_get_miss_total").increment(1);
}

pub fn log_store_remove() {
    counter!("expiring_store_remove_total").increment(1);
}

pub fn log_store_eviction_count(count: usize) {
    counter!("expiring_store_evicted_total").increment(count as u64);
}

pub fn log_store_size(size: usize) {
    gauge!("expiring_store_size").set(size as f64);
}

pub fn log_ladder_buckets(buckets: usize) {
    gauge!("expiring_store_ladder_buckets").set(buckets as f64);
}

pub fn log_pending_len(len: usize) {
    gauge!("expiring_store_pending_len").set(len as f64);
}

pub fn log_purge_cycle_duration_seconds(seconds: f64) {
    histogram!("expiring_store_purge_cycle_seconds").record(seconds);
}

//! Monotonic clock in nanoseconds since an arbitrary process-local epoch.
//!
//! Deadlines throughout this crate are absolute instants on this clock, not
//! wall-clock time: `std::time::Instant` is monotonic but has no stable
//! representation as an integer, so we fix an epoch the first time this
//! module is touched and measure everything as an offset from it.

use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// `u64::MAX` is reserved to mean "no deadline" (the purger parked forever).
pub const INFINITY: u64 = u64::MAX;

/// Current time on this clock, in nanoseconds since the process-local epoch.
pub fn now_ns() -> u64 {
    let epoch = EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_nanos() as u64
}

/// Convert a positive millisecond timeout into an absolute deadline.
pub fn deadline_from_timeout_ms(timeout_ms: i64) -> u64 {
    debug_assert!(timeout_ms > 0);
    now_ns().saturating_add(timeout_ms as u64 * 1_000_000)
}

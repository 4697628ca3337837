//! The pending-operation log and its coalescing rules (§4.1, §9 "Coalescing
//! PendingOps" of `SPEC_FULL.md`).
//!
//! Clients append to this log in O(1) under the Store writer lock; the
//! purger is the only reader, draining it wholesale on every wake. At most
//! one `PendingOp` exists per key at any time, which is what bounds its
//! growth to O(1) per key under a tight update-same-key loop rather than
//! O(ops).

use crate::clock::INFINITY;
use crate::config::Config;

/// A prospective change to the deadline ladder, not yet applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOp {
    /// Schedule eviction at the given deadline.
    Add(u64),
    /// Remove a previously scheduled eviction at the given deadline.
    Del(u64),
    /// `Del(old)` then `Add(new)`, collapsed into one record.
    Replace(u64, u64),
}

/// Coalesce a new `Add(new_deadline)` into `existing`, per the table in
/// spec.md §4.1. `old_deadline` is the deadline of the entry being
/// overwritten by this `put`, if any (used only when no `PendingOp` for this
/// key exists yet).
pub fn coalesce_add(
    existing: Option<PendingOp>,
    old_deadline: Option<u64>,
    new_deadline: u64,
) -> PendingOp {
    match existing {
        None => match old_deadline {
            Some(old) => PendingOp::Replace(old, new_deadline),
            None => PendingOp::Add(new_deadline),
        },
        Some(PendingOp::Add(_)) => PendingOp::Add(new_deadline),
        Some(PendingOp::Del(t)) => PendingOp::Replace(t, new_deadline),
        Some(PendingOp::Replace(t0, _)) => PendingOp::Replace(t0, new_deadline),
    }
}

/// Coalesce a `Del(old_deadline)` into `existing`, per the table in spec.md
/// §4.1. Returns `None` when the net effect is to drop the pending op
/// entirely (an `Add` that the ladder never saw is simply forgotten).
pub fn coalesce_del(existing: Option<PendingOp>, old_deadline: u64) -> Option<PendingOp> {
    match existing {
        None => Some(PendingOp::Del(old_deadline)),
        Some(PendingOp::Add(_)) => None,
        Some(PendingOp::Replace(t0, _)) => Some(PendingOp::Del(t0)),
        Some(PendingOp::Del(_)) => Some(PendingOp::Del(old_deadline)),
    }
}

/// Whether a client mutation must signal the purger, per the `needReschedule`
/// rule in spec.md §4.1: the purger is idle, the new deadline is earlier
/// than its parked target, its parked target is being cancelled, or the
/// pending log has grown past its bound.
pub fn needs_reschedule(
    next_wakeup: u64,
    new_deadline: Option<u64>,
    old_deadline: Option<u64>,
    pending_len: usize,
    live_entries: usize,
    config: &Config,
) -> bool {
    if next_wakeup == INFINITY {
        return true;
    }
    if let Some(new) = new_deadline {
        if new < next_wakeup {
            return true;
        }
    }
    if old_deadline == Some(next_wakeup) {
        return true;
    }
    let bound = (config.pending_ratio * live_entries as f64).max(config.pending_max as f64);
    pending_len as f64 > bound
}

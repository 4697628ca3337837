//! The single background purger thread (§4.2, §4.2.4, §9 of
//! `SPEC_FULL.md`).
//!
//! The purger is the only thing that ever touches the [`Ladder`]. It wakes
//! on a signal or a parked timer, drains the pending-op log into the
//! ladder, evicts anything whose deadline has passed, and reparks on the
//! new head deadline (or an idle timeout, self-terminating if nothing
//! happens before that elapses).

use std::hash::Hash;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::clock::{now_ns, INFINITY};
use crate::ladder::Ladder;
use crate::store::Shared;

/// The "small dedicated lock" of §4.2: guards the signal flag, the worker
/// handle, and the shutdown flag together, so that the spawn-if-absent
/// decision in [`notify_reschedule`] is race-free against the purger's own
/// decision to exit when idle (§9, "Lazy purger spawning").
pub(crate) struct PurgerState {
    pub signalled: bool,
    pub closing: bool,
    pub worker: Option<JoinHandle<()>>,
}

impl PurgerState {
    pub fn new() -> Self {
        Self {
            signalled: false,
            closing: false,
            worker: None,
        }
    }
}

pub(crate) struct PurgerCell {
    pub state: Mutex<PurgerState>,
    pub cond: Condvar,
}

impl PurgerCell {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PurgerState::new()),
            cond: Condvar::new(),
        }
    }
}

enum ParkOutcome {
    Signalled,
    TimedOut,
    Closing,
}

/// Block until signalled, until the absolute instant `deadline_ns` elapses,
/// or until close() is observed. A spurious wakeup just loops back to
/// recompute the remaining wait against the same `deadline_ns` and try again
/// (§4.2.4, §9 "Signal vs. timer"). Callers with no ladder-derived deadline
/// (the idle-wait case) must pass `now_ns() + idle_timeout` computed once
/// *before* the first call, not re-derive `idle_timeout` on every iteration —
/// otherwise a spurious wakeup looks identical to a genuine idle-timeout
/// expiry and the wait never actually ends.
fn park<K, V>(shared: &Shared<K, V>, deadline_ns: u64) -> ParkOutcome {
    let mut guard = shared.purger.state.lock();
    loop {
        if guard.closing {
            return ParkOutcome::Closing;
        }
        if guard.signalled {
            guard.signalled = false;
            return ParkOutcome::Signalled;
        }
        let now = now_ns();
        if deadline_ns <= now {
            return ParkOutcome::TimedOut;
        }
        let wait = Duration::from_nanos(deadline_ns - now);
        let result = shared.purger.cond.wait_for(&mut guard, wait);
        if result.timed_out() {
            // Loop back: the top-of-loop check recomputes whether we've
            // actually reached `deadline_ns` (a genuine timeout) or merely
            // woke up spuriously with time still left (reparks for the
            // remainder against the same absolute `deadline_ns`).
            continue;
        }
    }
}

/// Lazily spawn the purger if it isn't running, then signal it. Called by
/// clients (outside the Store writer lock) whenever a mutation decides
/// `needs_reschedule` was true.
pub(crate) fn notify_reschedule<K, V>(shared: &Arc<Shared<K, V>>)
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    let mut guard = shared.purger.state.lock();
    if guard.worker.is_none() && !guard.closing {
        let shared = Arc::clone(shared);
        guard.worker = Some(
            thread::Builder::new()
                .name("expiring-store-purger".to_string())
                .spawn(move || purger_main(shared))
                .expect("failed to spawn expiring_store purger thread"),
        );
    }
    guard.signalled = true;
    shared.purger.cond.notify_one();
}

/// Stop the purger (idempotent) and wait for its in-flight cycle to finish.
pub(crate) fn close<K, V>(shared: &Arc<Shared<K, V>>)
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    let handle = {
        let mut guard = shared.purger.state.lock();
        guard.closing = true;
        shared.purger.cond.notify_all();
        guard.worker.take()
    };
    if let Some(handle) = handle {
        if handle.join().is_err() {
            tracing::error!("expiring_store purger thread panicked");
        }
    }
}

fn purger_main<K, V>(shared: Arc<Shared<K, V>>)
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    let mut ladder: Ladder<K> = Ladder::new();
    loop {
        if shared.purger.state.lock().closing {
            break;
        }

        let cycle_start = Instant::now();
        replay_pending(&shared, &mut ladder);
        sweep_expired(&shared, &mut ladder);
        crate::metrics::log_purge_cycle_duration_seconds(cycle_start.elapsed().as_secs_f64());

        crate::metrics::log_ladder_buckets(ladder.bucket_count());

        match ladder.head_deadline() {
            Some(deadline) => {
                shared.next_wakeup.store(deadline, Ordering::Release);
                match park(&shared, deadline) {
                    ParkOutcome::Closing => break,
                    ParkOutcome::Signalled | ParkOutcome::TimedOut => continue,
                }
            }
            None => {
                shared.next_wakeup.store(INFINITY, Ordering::Release);
                let idle_deadline = now_ns().saturating_add(shared.config.idle_timeout.as_nanos() as u64);
                match park(&shared, idle_deadline) {
                    ParkOutcome::Closing => break,
                    ParkOutcome::Signalled => continue,
                    ParkOutcome::TimedOut => {
                        // Idle timeout elapsed with an empty ladder. Decide
                        // whether to exit under the same lock that
                        // `notify_reschedule` uses to decide whether to
                        // spawn, so the two decisions can't race (§9).
                        let mut guard = shared.purger.state.lock();
                        if guard.signalled {
                            // A reschedule snuck in between park() returning
                            // and us re-acquiring the lock; consume it and
                            // keep running instead of exiting.
                            guard.signalled = false;
                            continue;
                        }
                        guard.worker = None;
                        break;
                    }
                }
            }
        }
    }
}

/// §4.2.1: atomically take the pending-op map under the Store writer lock,
/// then replay each op against the ladder with the lock released.
fn replay_pending<K, V>(shared: &Shared<K, V>, ladder: &mut Ladder<K>)
where
    K: Eq + Hash + Clone,
{
    let pending = {
        let mut state = shared.state.write();
        std::mem::take(&mut state.pending)
    };
    crate::metrics::log_pending_len(pending.len());
    for (key, op) in pending {
        ladder.replay(key, op);
    }
}

/// §4.2.2: while the head bucket's deadline has passed, evict its keys from
/// the Store, taking the writer lock once for the whole sweep rather than
/// once per bucket.
fn sweep_expired<K, V>(shared: &Shared<K, V>, ladder: &mut Ladder<K>)
where
    K: Eq + Hash + Clone,
{
    let now = now_ns();
    if !matches!(ladder.head_deadline(), Some(deadline) if deadline <= now) {
        return;
    }
    let mut evicted = 0usize;
    let mut state = shared.state.write();
    while let Some(deadline) = ladder.head_deadline() {
        if deadline > now {
            break;
        }
        let (bucket_deadline, keys) = ladder.pop_head();
        for key in keys {
            // Only evict if the entry's deadline still matches the bucket
            // we just popped: a REPLACE that landed between this ADD being
            // replayed and this sweep observing it will have its own,
            // later bucket and must not be evicted here (§4.2.2).
            let still_due = matches!(state.entries.get(&key), Some(entry) if entry.deadline == bucket_deadline);
            if still_due {
                state.entries.remove(&key);
                evicted += 1;
            }
        }
    }
    drop(state);
    if evicted > 0 {
        crate::metrics::log_store_eviction_count(evicted);
    }
}

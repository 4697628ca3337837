//! The client-facing [`Store`] (§4.1 of `SPEC_FULL.md`).
//!
//! `put`/`remove` mutate the entries map and the pending-op log together
//! under one writer lock; `get` runs under the matching reader lock and
//! never touches the pending log or the ladder. All sorted-structure
//! maintenance is deferred to the purger (`src/purger.rs`).

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::clock::{deadline_from_timeout_ms, INFINITY};
use crate::config::Config;
use crate::pending::{coalesce_add, coalesce_del, needs_reschedule, PendingOp};
use crate::purger::{self, PurgerCell};

pub(crate) struct Entry<V> {
    pub value: V,
    pub deadline: u64,
}

/// The state protected by the single Store writer/reader lock: the live
/// entries and the pending-op log live side by side so that a `put`/
/// `remove` can mutate both atomically (§4.2 of `SPEC_FULL.md`).
pub(crate) struct StoreState<K, V> {
    pub entries: HashMap<K, Entry<V>>,
    pub pending: HashMap<K, PendingOp>,
}

pub(crate) struct Shared<K, V> {
    pub state: RwLock<StoreState<K, V>>,
    pub next_wakeup: AtomicU64,
    pub purger: PurgerCell,
    pub config: Config,
    pub closed: AtomicBool,
}

/// A thread-safe, in-memory map whose entries expire after a per-entry
/// timeout. See the crate-level docs and `SPEC_FULL.md` for the full
/// concurrency design.
pub struct Store<K, V> {
    shared: Arc<Shared<K, V>>,
}

impl<K, V> Clone for Store<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K, V> Store<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Create a new, empty store. The purger thread is not spawned until
    /// the first `put`/`remove` that needs rescheduling (§9, "Lazy purger
    /// spawning").
    pub fn new(config: Config) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(StoreState {
                    entries: HashMap::new(),
                    pending: HashMap::new(),
                }),
                next_wakeup: AtomicU64::new(INFINITY),
                purger: PurgerCell::new(),
                config,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Insert or replace `key` with `value`, expiring after `timeout_ms`
    /// milliseconds unless removed first. `timeout_ms <= 0` is a no-op
    /// (§4.1, §7 `InvalidTimeout`).
    pub fn put(&self, key: K, value: V, timeout_ms: i64) {
        if self.shared.closed.load(Ordering::Acquire) {
            return;
        }
        if timeout_ms <= 0 {
            return;
        }
        let new_deadline = deadline_from_timeout_ms(timeout_ms);

        let need_reschedule = {
            let mut state = self.shared.state.write();
            let old_deadline = state.entries.get(&key).map(|entry| entry.deadline);
            state
                .entries
                .insert(key.clone(), Entry { value, deadline: new_deadline });
            let live_entries = state.entries.len();

            let existing_pending = state.pending.get(&key).copied();
            let op = coalesce_add(existing_pending, old_deadline, new_deadline);
            state.pending.insert(key, op);

            needs_reschedule(
                self.shared.next_wakeup.load(Ordering::Acquire),
                Some(new_deadline),
                old_deadline,
                state.pending.len(),
                live_entries,
                &self.shared.config,
            )
        };

        crate::metrics::log_store_put();
        if need_reschedule {
            purger::notify_reschedule(&self.shared);
        }
    }

    /// Look up `key`. Returns `None` if absent or already expired and
    /// evicted (§4.1, §4.3: a `get` never observes a partially-evicted
    /// entry).
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        if self.shared.closed.load(Ordering::Acquire) {
            return None;
        }
        let state = self.shared.state.read();
        let found = state.entries.get(key).map(|entry| entry.value.clone());
        drop(state);
        if found.is_some() {
            crate::metrics::log_store_get_hit();
        } else {
            crate::metrics::log_store_get_miss();
        }
        found
    }

    /// Delete `key` if present; a no-op (and no observable state change) if
    /// absent (§4.1, §8 property 6).
    pub fn remove(&self, key: &K) {
        if self.shared.closed.load(Ordering::Acquire) {
            return;
        }
        let mut need_reschedule = false;
        {
            let mut state = self.shared.state.write();
            if let Some(entry) = state.entries.remove(key) {
                let live_entries = state.entries.len();
                let existing_pending = state.pending.get(key).copied();
                match coalesce_del(existing_pending, entry.deadline) {
                    Some(op) => {
                        state.pending.insert(key.clone(), op);
                    }
                    None => {
                        state.pending.remove(key);
                    }
                }
                need_reschedule = needs_reschedule(
                    self.shared.next_wakeup.load(Ordering::Acquire),
                    None,
                    Some(entry.deadline),
                    state.pending.len(),
                    live_entries,
                    &self.shared.config,
                );
            }
        }
        crate::metrics::log_store_remove();
        if need_reschedule {
            purger::notify_reschedule(&self.shared);
        }
    }

    /// Number of live entries.
    pub fn size(&self) -> usize {
        let size = self.shared.state.read().entries.len();
        crate::metrics::log_store_size(size);
        size
    }

    /// Stop the purger and release its thread. Idempotent. Operations after
    /// `close()` are silently dropped / return `None` (§5, §7
    /// `UseAfterClose`).
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
        purger::close(&self.shared);
    }

    /// Whether the purger's worker thread is currently alive. Test-only: the
    /// purger thread is an implementation detail, not part of the public
    /// contract, but its self-termination on an idle ladder (§4.2.3,
    /// §4.2.4) is a load-bearing invariant worth asserting directly.
    #[cfg(test)]
    fn purger_is_running(&self) -> bool {
        self.shared.purger.state.lock().worker.is_some()
    }
}

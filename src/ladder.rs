//! The sorted deadline ladder (§3, §4.2.1 of `SPEC_FULL.md`).
//!
//! Owned exclusively by the purger thread — never wrapped in a lock, never
//! touched by client code. A `Vec<(deadline, keys)>` kept sorted by
//! deadline is adequate up to tens of thousands of distinct deadlines (§9);
//! a higher-scale implementation could swap this for a `BTreeMap` or a
//! heap-of-buckets without changing the purger's contract with `Ladder`.

use crate::pending::PendingOp;

pub struct Ladder<K> {
    buckets: Vec<(u64, Vec<K>)>,
}

impl<K: Eq + Clone> Ladder<K> {
    pub fn new() -> Self {
        Self { buckets: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of keys across all buckets. Used only by tests checking
    /// the bounded-auxiliary-state property; not on any hot path.
    #[cfg(test)]
    pub fn key_count(&self) -> usize {
        self.buckets.iter().map(|(_, keys)| keys.len()).sum()
    }

    pub fn head_deadline(&self) -> Option<u64> {
        self.buckets.first().map(|(deadline, _)| *deadline)
    }

    /// Apply a single drained `PendingOp` to the ladder.
    pub fn replay(&mut self, key: K, op: PendingOp) {
        match op {
            PendingOp::Add(deadline) => self.add(key, deadline),
            PendingOp::Del(deadline) => self.del(&key, deadline),
            PendingOp::Replace(old, new) => {
                self.del(&key, old);
                self.add(key, new);
            }
        }
    }

    fn add(&mut self, key: K, deadline: u64) {
        match self.buckets.binary_search_by_key(&deadline, |(d, _)| *d) {
            Ok(idx) => self.buckets[idx].1.push(key),
            Err(idx) => self.buckets.insert(idx, (deadline, vec![key])),
        }
    }

    fn del(&mut self, key: &K, deadline: u64) {
        let Ok(idx) = self.buckets.binary_search_by_key(&deadline, |(d, _)| *d) else {
            // No bucket at this deadline: the bucket was already evicted
            // before this DEL was replayed. This is a normal race, not a
            // bug (§4.2.1, §7).
            tracing::debug!(deadline, "pending DEL found no bucket at this deadline");
            return;
        };
        let keys = &mut self.buckets[idx].1;
        match keys.iter().position(|k| k == key) {
            Some(pos) => {
                keys.swap_remove(pos);
            }
            None => {
                tracing::debug!(deadline, "pending DEL found bucket but key was absent");
            }
        }
        if self.buckets[idx].1.is_empty() {
            self.buckets.remove(idx);
        }
    }

    /// Remove and return the head bucket. Panics if the ladder is empty;
    /// callers must check `head_deadline` first.
    pub fn pop_head(&mut self) -> (u64, Vec<K>) {
        self.buckets.remove(0)
    }
}

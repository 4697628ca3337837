//! An in-memory, thread-safe map whose entries expire after a per-entry
//! timeout.
//!
//! `put`/`get`/`remove` are lock-light and O(1) excluding lock contention; a
//! single background purger thread maintains a sorted deadline ladder and
//! evicts expired entries, rescheduling itself whenever a newly inserted
//! entry's deadline is earlier than its current wait target. See
//! `SPEC_FULL.md` in the crate root for the full design.
//!
//! ```
//! use expiring_store::{Config, Store};
//!
//! let store: Store<&str, i32> = Store::new(Config::default());
//! store.put("a", 1, 200);
//! assert_eq!(store.get(&"a"), Some(1));
//! store.remove(&"a");
//! assert_eq!(store.get(&"a"), None);
//! store.close();
//! ```

mod clock;
mod config;
mod error;
mod ladder;
mod metrics;
mod pending;
mod purger;
mod store;

pub use config::Config;
pub use error::ConfigError;
pub use store::Store;

/// Convenience alias matching the "ExpiringStore" name used in
/// `SPEC_FULL.md`'s external-interfaces section.
pub type ExpiringStore<K, V> = Store<K, V>;

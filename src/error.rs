//! Narrow, optional-validation error type for [`crate::config::Config`].
//!
//! The core put/get/remove/size/close operations never fail and never
//! return a `Result` — see §7 of `SPEC_FULL.md`. This type exists only for
//! callers who opt into strict construction-time validation via
//! [`crate::config::Config::validated`].

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("pending_ratio must be positive, got {0}")]
    NonPositivePendingRatio(f64),
    #[error("idle_timeout must be non-zero")]
    ZeroIdleTimeout,
}

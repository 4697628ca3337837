//! Tunable limits for a [`crate::Store`].
//!
//! Mirrors the environment-overridable knob convention used for backend
//! tunables in the teacher corpus, scoped down to a single constructor
//! argument instead of a global registry: there is no server process here
//! for knobs to hang off of, just a `Config` value passed to `Store::new`.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Tunables for the pending-op log bound and the purger's idle shutdown.
///
/// See §6 of `SPEC_FULL.md` for the meaning of each field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// How long the purger waits with an empty ladder before
    /// self-terminating.
    pub idle_timeout: Duration,
    /// `PendingOp` log size bound factor over live-entry count.
    pub pending_ratio: f64,
    /// Lower bound on `PendingOp` log size before a forced signal.
    pub pending_max: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_millis(3000),
            pending_ratio: 2.0,
            pending_max: 32,
        }
    }
}

impl Config {
    /// Build a `Config` from defaults overridden by environment variables:
    /// `EXPIRING_STORE_IDLE_TIMEOUT_MS`, `EXPIRING_STORE_PENDING_RATIO`,
    /// `EXPIRING_STORE_PENDING_MAX`. A present-but-unparseable variable is
    /// logged and ignored rather than treated as fatal.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            idle_timeout: env_override("EXPIRING_STORE_IDLE_TIMEOUT_MS", defaults.idle_timeout.as_millis() as u64)
                .map(Duration::from_millis)
                .unwrap_or(defaults.idle_timeout),
            pending_ratio: env_override("EXPIRING_STORE_PENDING_RATIO", defaults.pending_ratio)
                .unwrap_or(defaults.pending_ratio),
            pending_max: env_override("EXPIRING_STORE_PENDING_MAX", defaults.pending_max)
                .unwrap_or(defaults.pending_max),
        }
    }

    /// Validate the config, rejecting values that would make the pending-log
    /// bound or idle-timeout meaningless. Most callers should just use
    /// [`Config::default`] or [`Config::from_env`]; this is for callers who
    /// want construction-time assurance rather than silent clamping.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.pending_ratio <= 0.0 {
            return Err(ConfigError::NonPositivePendingRatio(self.pending_ratio));
        }
        if self.idle_timeout.is_zero() {
            return Err(ConfigError::ZeroIdleTimeout);
        }
        Ok(self)
    }
}

/// Read an environment variable as `T`, returning `None` (and logging a
/// warning) if it is present but fails to parse, or absent entirely.
fn env_override<T: FromStr>(name: &str, default: T) -> Option<T> {
    match env::var(name) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(
                    name,
                    raw,
                    "ignoring unparseable override, using default"
                );
                let _ = default;
                None
            }
        },
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_table() {
        let config = Config::default();
        assert_eq!(config.idle_timeout, Duration::from_millis(3000));
        assert_eq!(config.pending_ratio, 2.0);
        assert_eq!(config.pending_max, 32);
    }

    #[test]
    fn validated_rejects_nonpositive_ratio() {
        let config = Config {
            pending_ratio: 0.0,
            ..Config::default()
        };
        assert!(matches!(
            config.validated(),
            Err(ConfigError::NonPositivePendingRatio(_))
        ));
    }

    #[test]
    fn validated_rejects_zero_idle_timeout() {
        let config = Config {
            idle_timeout: Duration::ZERO,
            ..Config::default()
        };
        assert!(matches!(
            config.validated(),
            Err(ConfigError::ZeroIdleTimeout)
        ));
    }

    #[test]
    fn validated_accepts_defaults() {
        assert!(Config::default().validated().is_ok());
    }
}

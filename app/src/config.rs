//! Configuration management for the Pantry app.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Unparseable values fall back to the default with a warning;
//! [`Config::validate`] rejects values that parse but cannot work.

use pantry_lists::SortOrder;
use pantry_motion::{AnimationConfig, Interpolator};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "pantry=info";

/// Default undo window (long snackbar duration)
pub const DEFAULT_UNDO_WINDOW: Duration = Duration::from_millis(4000);

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A duration setting is zero
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// How long a delete can be undone (`PANTRY_UNDO_WINDOW_MS`)
    pub undo_window: Duration,
    /// Expand/collapse timing (`PANTRY_ANIMATION_MS`, `PANTRY_INTERPOLATOR`)
    pub animation: AnimationConfig,
    /// Sort order used until a saved preference loads (`PANTRY_DEFAULT_SORT`)
    pub default_sort: SortOrder,
    /// Seed the in-memory store with demo items (`PANTRY_SEED_DEMO`)
    pub seed_demo: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            undo_window: DEFAULT_UNDO_WINDOW,
            animation: AnimationConfig::default(),
            default_sort: SortOrder::default(),
            seed_demo: true,
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, one variable name at a time
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let millis = |key: &str, default: Duration| {
            parsed::<u64>(&lookup, key).map_or(default, Duration::from_millis)
        };

        Self {
            undo_window: millis("PANTRY_UNDO_WINDOW_MS", defaults.undo_window),
            animation: AnimationConfig::new(
                millis("PANTRY_ANIMATION_MS", defaults.animation.duration),
                parsed::<Interpolator>(&lookup, "PANTRY_INTERPOLATOR")
                    .unwrap_or(defaults.animation.interpolator),
            ),
            default_sort: parsed(&lookup, "PANTRY_DEFAULT_SORT").unwrap_or(defaults.default_sort),
            seed_demo: parsed(&lookup, "PANTRY_SEED_DEMO").unwrap_or(defaults.seed_demo),
        }
    }

    /// Check values that parsed but are unusable
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroDuration`] if the undo window or the
    /// animation duration is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.undo_window.is_zero() {
            return Err(ConfigError::ZeroDuration("PANTRY_UNDO_WINDOW_MS"));
        }
        if self.animation.duration.is_zero() {
            return Err(ConfigError::ZeroDuration("PANTRY_ANIMATION_MS"));
        }
        Ok(())
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable setting");
            None
        },
    }
}

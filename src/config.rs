//! # Per-manager configuration.
//!
//! [`ManagerConfig`] defines an [`EventManager`](crate::EventManager)'s
//! identity for logging and the bound on its duplicate-suppression set.
//!
//! # Example
//! ```
//! use bubblebus::ManagerConfig;
//!
//! let mut cfg = ManagerConfig::default();
//! cfg.name = "world-context".into();
//! cfg.dedup_prune_threshold = 256;
//!
//! assert_eq!(cfg.name, "world-context");
//! ```

use std::borrow::Cow;

/// Configuration for a single event manager.
///
/// Controls the manager's log identity and how eagerly the dispatched-event
/// set drops entries for events that were garbage-collected.
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    /// Manager name, attached to every log line this manager emits.
    pub name: Cow<'static, str>,
    /// Prune the dispatched-event set once it holds more than this many slots.
    ///
    /// Pruning drops slots whose event has no remaining strong reference.
    /// Zero is clamped to 1.
    pub dedup_prune_threshold: usize,
}

impl ManagerConfig {
    /// Creates a config with the given name and default tuning.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Prune threshold with the zero clamp applied.
    pub(crate) fn prune_threshold_clamped(&self) -> usize {
        self.dedup_prune_threshold.max(1)
    }
}

impl Default for ManagerConfig {
    /// Provides a default configuration:
    /// - `name = "manager"`
    /// - `dedup_prune_threshold = 128`
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("manager"),
            dedup_prune_threshold: 128,
        }
    }
}

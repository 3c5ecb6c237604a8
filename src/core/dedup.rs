//! # Weak identity set of already-dispatched events.
//!
//! A manager must deliver one event instance at most once, even when bubbling
//! paths converge on it, without keeping the event alive. [`DispatchedSet`]
//! records a `Weak<dyn Event>` keyed by the `Arc`'s pointer.
//!
//! ## Rules
//! - Identity is the `Arc` pointer, never value equality: an event type with
//!   a misbehaving `PartialEq` can never suppress a different event.
//! - While a slot's weak reference is held, its allocation cannot be reused,
//!   so a live key always refers to the recorded event.
//! - A slot whose event has no strong references left is *forgotten*: the
//!   address may then belong to a new event, which must dispatch normally.
//! - The set prunes dead slots once it grows past the configured threshold,
//!   so long-lived managers do not accumulate memory for transient events.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tracing::trace;

use crate::events::Event;

/// Identity-keyed record of events this manager has already dispatched.
pub(crate) struct DispatchedSet {
    prune_threshold: usize,
    slots: HashMap<usize, Weak<dyn Event>>,
}

impl DispatchedSet {
    pub(crate) fn new(prune_threshold: usize) -> Self {
        Self {
            prune_threshold,
            slots: HashMap::new(),
        }
    }

    /// Records the event's identity; returns `true` if it was already
    /// dispatched by this manager.
    ///
    /// A stale slot (event dropped, address possibly reused) never counts as
    /// "already dispatched" — it is replaced by the new event's weak.
    pub(crate) fn check_and_insert(&mut self, event: &Arc<dyn Event>) -> bool {
        let key = identity(event);
        if let Some(slot) = self.slots.get(&key) {
            if slot.strong_count() > 0 {
                return true;
            }
            trace!(key, "replacing stale dedup slot");
        }

        self.slots.insert(key, Arc::downgrade(event));
        if self.slots.len() > self.prune_threshold {
            self.prune();
        }
        false
    }

    /// Drops slots whose event has been released.
    fn prune(&mut self) {
        let before = self.slots.len();
        self.slots.retain(|_, weak| weak.strong_count() > 0);
        trace!(pruned = before - self.slots.len(), "pruned dedup set");
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

/// Pointer identity of an event `Arc`.
fn identity(event: &Arc<dyn Event>) -> usize {
    Arc::as_ptr(event).cast::<()>() as usize
}

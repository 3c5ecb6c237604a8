//! # Per-event-type ordered handler collection.
//!
//! One `HandlerCollection` exists per `(manager, event type)` pair, created
//! lazily on first subscription. Entries are kept sorted by
//! `(priority tier, registration sequence)`, so equal-tier handlers fire in
//! registration order.
//!
//! ## Rules
//! - At most one entry per handler identity; [`HandlerCollection::add`]
//!   returns `false` without mutating state on a duplicate.
//! - Dispatch iterates a **snapshot**: handlers may subscribe/unsubscribe on
//!   the same manager mid-dispatch without corrupting iteration.
//! - A panicking handler is caught and logged; the remaining entries and the
//!   bubbling chain still run.
//! - A cancelled event skips entries registered with
//!   `ignore_cancelled = false`, except [`Priority::Watcher`] entries which
//!   always run.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use tracing::{error, trace};

use crate::events::{Event, Priority};
use crate::handlers::{handler_identity, Handler, HandlerRef};

/// Global sequence counter for registration ordering within a tier.
static REGISTRATION_SEQ: AtomicU64 = AtomicU64::new(0);

pub(crate) fn next_registration_seq() -> u64 {
    REGISTRATION_SEQ.fetch_add(1, AtomicOrdering::Relaxed)
}

/// One registered unit of dispatch: callable, tier, cancellation visibility.
#[derive(Clone)]
pub(crate) struct HandlerEntry {
    handler: HandlerRef,
    priority: Priority,
    ignore_cancelled: bool,
    seq: u64,
}

impl HandlerEntry {
    fn sort_key(&self) -> (u8, u64) {
        (self.priority.value(), self.seq)
    }

    pub(crate) fn identity(&self) -> usize {
        handler_identity(&self.handler)
    }

    /// True if this entry runs for the given event right now.
    fn should_run(&self, event: &dyn Event) -> bool {
        if self.ignore_cancelled || self.priority.runs_when_cancelled() {
            return true;
        }
        !event.is_cancelled()
    }
}

/// Ordered entries for one event type, owned by exactly one manager.
pub(crate) struct HandlerCollection {
    event_type_name: &'static str,
    entries: Vec<HandlerEntry>,
}

impl HandlerCollection {
    pub(crate) fn new(event_type_name: &'static str) -> Self {
        Self {
            event_type_name,
            entries: Vec::new(),
        }
    }

    /// Inserts a handler keeping `(tier, seq)` order.
    ///
    /// Returns `false` without mutating state if the handler identity is
    /// already present.
    pub(crate) fn add(
        &mut self,
        handler: HandlerRef,
        priority: Priority,
        ignore_cancelled: bool,
    ) -> bool {
        let identity = handler_identity(&handler);
        if self.entries.iter().any(|e| e.identity() == identity) {
            return false;
        }

        let entry = HandlerEntry {
            handler,
            priority,
            ignore_cancelled,
            seq: next_registration_seq(),
        };
        let at = self
            .entries
            .partition_point(|e| e.sort_key() <= entry.sort_key());
        self.entries.insert(at, entry);
        true
    }

    /// Removes the entry with the given handler identity. Idempotent.
    pub(crate) fn remove(&mut self, identity: usize) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.identity() != identity);
        self.entries.len() != before
    }

    /// Copy of the current entries, for lock-free invocation.
    pub(crate) fn snapshot(&self) -> Vec<HandlerEntry> {
        self.entries.clone()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn event_type_name(&self) -> &'static str {
        self.event_type_name
    }
}

/// Invokes a snapshot of entries against one event.
///
/// Runs with no manager lock held: entries were snapshotted beforehand, so a
/// handler may freely mutate registrations on the same manager. Panics are
/// isolated per entry.
pub(crate) fn invoke_entries(manager: &str, entries: &[HandlerEntry], event: &Arc<dyn Event>) {
    for entry in entries {
        if !entry.should_run(event.as_ref()) {
            trace!(
                manager,
                handler = entry.handler.name(),
                event = event.event_name(),
                "skipping handler: event cancelled"
            );
            continue;
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| entry.handler.handle(event.as_ref())));
        if let Err(panic_err) = outcome {
            error!(
                manager,
                handler = entry.handler.name(),
                event = event.event_name(),
                priority = %entry.priority,
                "handler panicked during dispatch: {panic_err:?}"
            );
        }
    }
}

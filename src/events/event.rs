//! # Event contract and cancellation state.
//!
//! An [`Event`] is any `'static + Send + Sync` type that exposes itself as
//! [`Any`] for downcasting. Events travel through the bus as `Arc<dyn Event>`;
//! the **`Arc` pointer is the event's identity**. Two events that compare
//! equal by value are still distinct deliveries, and the same `Arc` reaching
//! a manager twice (through converging bubbling paths) is delivered once.
//!
//! ## Cancellation
//! An event type opts into cancellation by embedding a [`CancelState`] and
//! returning it from [`Event::cancel_state`]. A handler that cancels the
//! event suppresses later entries registered with `ignore_cancelled = false`;
//! [`Priority::Watcher`](crate::Priority::Watcher) entries always run.
//!
//! ## Example
//! ```
//! use std::any::Any;
//! use bubblebus::{CancelState, Event};
//!
//! struct BlockBreak {
//!     position: (i32, i32, i32),
//!     cancel: CancelState,
//! }
//!
//! impl Event for BlockBreak {
//!     fn as_any(&self) -> &dyn Any { self }
//!     fn cancel_state(&self) -> Option<&CancelState> { Some(&self.cancel) }
//! }
//!
//! let ev = BlockBreak { position: (0, 64, 0), cancel: CancelState::new() };
//! assert!(!ev.cancel.is_cancelled());
//! ev.cancel.cancel();
//! assert!(ev.cancel.is_cancelled());
//! ```

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

/// # A domain event deliverable through the bus.
///
/// Implementations carry whatever payload the domain needs; the bus only
/// requires runtime-type access (for routing to the matching per-type
/// handler collection) and an optional cancellation flag.
///
/// Events are dispatched by their **exact** runtime type, never by supertype.
pub trait Event: Any + Send + Sync {
    /// Short name used in log lines. Defaults to the type name.
    fn event_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Runtime-typed view for handler downcasts.
    fn as_any(&self) -> &dyn Any;

    /// Cancellation flag, if this event type supports being cancelled.
    ///
    /// Returning `None` (the default) means every handler runs regardless of
    /// what earlier handlers did.
    fn cancel_state(&self) -> Option<&CancelState> {
        None
    }
}

impl dyn Event {
    /// Downcasts to a concrete event type.
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }

    /// True if the event supports cancellation and is currently cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_state().is_some_and(CancelState::is_cancelled)
    }
}

/// Shared cancellation flag for an event in flight.
///
/// Cancellation is advisory: it only affects which handler entries the bus
/// skips. Handlers observe and flip it through interior mutability, so the
/// event itself stays behind a shared reference.
#[derive(Debug, Default)]
pub struct CancelState {
    cancelled: AtomicBool,
}

impl CancelState {
    /// Creates a fresh, non-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the event has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(AtomicOrdering::Acquire)
    }

    /// Marks the event cancelled.
    pub fn cancel(&self) {
        self.cancelled.store(true, AtomicOrdering::Release);
    }

    /// Sets the cancellation flag explicitly (handlers may un-cancel).
    pub fn set_cancelled(&self, cancelled: bool) {
        self.cancelled.store(cancelled, AtomicOrdering::Release);
    }
}

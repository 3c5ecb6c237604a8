//! # Listener: a bundle of handler bindings registered as a unit.
//!
//! A listener **declares** its bindings explicitly: [`Listener::bindings`]
//! returns the `(event type, priority, cancellation visibility, callable)`
//! tuples the manager subscribes in one call. One listener identity, many
//! handlers, removed together.
//!
//! ## Example
//! ```
//! use std::any::Any;
//! use bubblebus::{Binding, Event, Listener, Priority};
//!
//! struct ChunkLoad;
//! impl Event for ChunkLoad {
//!     fn as_any(&self) -> &dyn Any { self }
//! }
//!
//! struct ChunkUnload;
//! impl Event for ChunkUnload {
//!     fn as_any(&self) -> &dyn Any { self }
//! }
//!
//! struct WorldListener;
//!
//! impl Listener for WorldListener {
//!     fn bindings(&self) -> Vec<Binding> {
//!         vec![
//!             Binding::of("on-load", Priority::Normal, false, |_ev: &ChunkLoad| {}),
//!             Binding::of("on-unload", Priority::Last, true, |_ev: &ChunkUnload| {}),
//!         ]
//!     }
//!
//!     fn name(&self) -> &str { "world-listener" }
//! }
//! ```

use std::any::TypeId;
use std::sync::Arc;

use crate::events::{Event, Priority};
use crate::handlers::{Handler, HandlerFn, HandlerRef};

/// One declared handler binding of a listener.
///
/// Couples the event type the handler is subscribed for with its priority,
/// cancellation visibility and the callable itself.
pub struct Binding {
    event_type: TypeId,
    event_type_name: &'static str,
    priority: Priority,
    ignore_cancelled: bool,
    handler: HandlerRef,
}

impl Binding {
    /// Creates a binding from an existing handler.
    pub fn new<E: Event>(priority: Priority, ignore_cancelled: bool, handler: HandlerRef) -> Self {
        Self {
            event_type: TypeId::of::<E>(),
            event_type_name: std::any::type_name::<E>(),
            priority,
            ignore_cancelled,
            handler,
        }
    }

    /// Creates a binding from a typed closure (wrapped in a [`HandlerFn`]).
    pub fn of<E, F>(
        name: &'static str,
        priority: Priority,
        ignore_cancelled: bool,
        f: F,
    ) -> Self
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        Self::new::<E>(priority, ignore_cancelled, HandlerFn::arc(name, f))
    }

    /// Event type this binding subscribes to.
    pub(crate) fn event_type(&self) -> TypeId {
        self.event_type
    }

    /// Name of the event type, for logs.
    pub(crate) fn event_type_name(&self) -> &'static str {
        self.event_type_name
    }

    /// Priority tier of the bound handler.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Whether the bound handler runs for cancelled events.
    pub fn ignore_cancelled(&self) -> bool {
        self.ignore_cancelled
    }

    /// The bound callable.
    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }
}

/// # An object bundling multiple handlers.
///
/// Registered through
/// [`EventManager::subscribe_listener`](crate::EventManager::subscribe_listener);
/// all bindings are added in one call and removed together when the listener
/// is unsubscribed or its owner is bulk unregistered.
pub trait Listener: Send + Sync + 'static {
    /// The handler bindings this listener contributes.
    ///
    /// Called once per registration; the returned handlers carry the
    /// listener's identity for group removal.
    fn bindings(&self) -> Vec<Binding>;

    /// Human-readable name (for logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Teardown hook, invoked once when the listener's owner is bulk
    /// unregistered. Defaults to a no-op.
    fn dispose(&self) {}
}

/// Shared handle to a listener.
pub type ListenerRef = Arc<dyn Listener>;

/// Pointer identity of a listener, the duplicate/removal key.
pub(crate) fn listener_identity(listener: &ListenerRef) -> usize {
    Arc::as_ptr(listener).cast::<()>() as usize
}

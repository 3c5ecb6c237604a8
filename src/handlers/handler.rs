//! # Handler abstraction and function-backed handler implementation.
//!
//! This module defines the [`Handler`] trait (synchronous, panic-isolated by
//! the dispatch loop) and a convenient function-backed implementation
//! [`HandlerFn`]. The common handle type is [`HandlerRef`], an
//! `Arc<dyn Handler>` suitable for sharing across managers.
//!
//! A handler's **identity** is its `Arc` pointer: registering the same
//! `HandlerRef` twice on one manager is rejected, while two `Arc`s around
//! equal closures are distinct handlers.

use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::events::Event;

/// # Synchronous unit of dispatch.
///
/// A `Handler` has a stable [`name`](Handler::name) and a
/// [`handle`](Handler::handle) method invoked with the event in flight.
/// Implementations must return promptly; they run on the publishing thread.
///
/// # Example
/// ```
/// use bubblebus::{Event, Handler};
///
/// struct Counter(std::sync::atomic::AtomicU64);
///
/// impl Handler for Counter {
///     fn handle(&self, _event: &dyn Event) {
///         self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///     }
///
///     fn name(&self) -> &str { "counter" }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Handles one event. Downcast via [`Event::as_any`] as needed.
    fn handle(&self, event: &dyn Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Teardown hook, invoked once when the handler's owner is bulk
    /// unregistered. Defaults to a no-op.
    fn dispose(&self) {}
}

/// Shared handle to a handler.
pub type HandlerRef = Arc<dyn Handler>;

/// Pointer identity of a handler, the bus-wide duplicate/removal key.
pub(crate) fn handler_identity(handler: &HandlerRef) -> usize {
    Arc::as_ptr(handler).cast::<()>() as usize
}

/// Function-backed handler implementation.
///
/// Wraps a closure over a concrete event type `E`; events of any other
/// runtime type are ignored (the downcast fails silently). Prefer
/// [`HandlerFn::arc`] when you immediately need a [`HandlerRef`].
///
/// ## Example
/// ```
/// use std::any::Any;
/// use bubblebus::{Event, HandlerFn, HandlerRef};
///
/// struct Tick;
/// impl Event for Tick {
///     fn as_any(&self) -> &dyn Any { self }
/// }
///
/// let h: HandlerRef = HandlerFn::arc("tick-logger", |_ev: &Tick| {
///     // react to the tick...
/// });
/// assert_eq!(h.name(), "tick-logger");
/// ```
pub struct HandlerFn<E, F> {
    name: Cow<'static, str>,
    f: F,
    _marker: PhantomData<fn(&E)>,
}

impl<E, F> HandlerFn<E, F> {
    /// Creates a new function-backed handler.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            _marker: PhantomData,
        }
    }

    /// Creates the handler and returns it as a shared [`HandlerRef`].
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<E, F> Handler for HandlerFn<E, F>
where
    E: Event,
    F: Fn(&E) + Send + Sync + 'static, // Fn, not FnMut
{
    fn handle(&self, event: &dyn Event) {
        if let Some(ev) = event.downcast_ref::<E>() {
            (self.f)(ev);
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Function-backed handler over the erased event.
///
/// Unlike [`HandlerFn`] the closure receives `&dyn Event` and fires for every
/// runtime type; the natural adapter for
/// [`EventManager::add_call_handler`](crate::EventManager::add_call_handler).
pub struct CallFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> CallFn<F> {
    /// Creates a new untyped function-backed handler.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a shared [`HandlerRef`].
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> Handler for CallFn<F>
where
    F: Fn(&dyn Event) + Send + Sync + 'static,
{
    fn handle(&self, event: &dyn Event) {
        (self.f)(event);
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Ping;

    impl Event for Ping {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct Pong;

    impl Event for Pong {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn handler_fn_only_fires_for_its_type() {
        let hits = Arc::new(AtomicU32::new(0));
        let hits2 = Arc::clone(&hits);
        let h: HandlerRef = HandlerFn::arc("ping-only", move |_ev: &Ping| {
            hits2.fetch_add(1, Ordering::Relaxed);
        });

        h.handle(&Ping);
        h.handle(&Pong);
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn call_fn_fires_for_any_type() {
        let hits = Arc::new(AtomicU32::new(0));
        let hits2 = Arc::clone(&hits);
        let h: HandlerRef = CallFn::arc("everything", move |_ev: &dyn Event| {
            hits2.fetch_add(1, Ordering::Relaxed);
        });

        h.handle(&Ping);
        h.handle(&Pong);
        assert_eq!(hits.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn identity_is_per_arc_not_per_closure() {
        let a: HandlerRef = HandlerFn::arc("a", |_ev: &Ping| {});
        let b = Arc::clone(&a);
        let c: HandlerRef = HandlerFn::arc("a", |_ev: &Ping| {});

        assert_eq!(handler_identity(&a), handler_identity(&b));
        assert_ne!(handler_identity(&a), handler_identity(&c));
    }
}

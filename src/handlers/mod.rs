//! # Handlers, listeners and the per-type dispatch collection.
//!
//! This module provides the callable side of the bus:
//!
//! - [`Handler`] — one callable bound to an event type, with a priority and a
//!   cancellation-visibility flag; [`HandlerFn`] adapts typed closures.
//! - [`Listener`] — an object bundling several handler [`Binding`]s,
//!   registered and removed as a unit.
//! - `HandlerCollection` (crate-internal) — the ordered entry list for one
//!   event type, performing the priority-sorted invocation.
//!
//! ## Architecture
//! ```text
//! Dispatch flow (one manager, one event type):
//!   publish(Arc<E>) ──► EventManager ──► HandlerCollection<E>
//!                                             │  snapshot entries
//!                                   ┌─────────┼─────────┐
//!                                   ▼         ▼         ▼
//!                                 First ... Normal ... Watcher
//!                                   │         │         │
//!                            handler.handle(&dyn Event)  (panics caught)
//! ```
//!
//! ## Implementing a custom handler
//! ```
//! use bubblebus::{Event, Handler};
//!
//! struct Audit;
//!
//! impl Handler for Audit {
//!     fn handle(&self, event: &dyn Event) {
//!         // write audit record...
//!         let _ = event;
//!     }
//!
//!     fn name(&self) -> &str { "audit" }
//! }
//! ```

mod collection;
mod handler;
mod listener;

pub(crate) use collection::{invoke_entries, HandlerCollection};
pub(crate) use handler::handler_identity;
pub(crate) use listener::listener_identity;

pub use handler::{CallFn, Handler, HandlerFn, HandlerRef};
pub use listener::{Binding, Listener, ListenerRef};

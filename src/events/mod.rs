//! Event data model: the [`Event`] trait, cancellation state and priorities.
//!
//! This module groups what an event **is** (a runtime-typed, identity-bearing
//! object, optionally cancellable) and how handlers for it are **ordered**
//! (the six [`Priority`] tiers).
//!
//! ## Contents
//! - [`Event`], [`CancelState`] — event contract and cooperative cancellation
//! - [`Priority`] — total order over the six dispatch tiers
//!
//! ## Quick reference
//! - **Producers** allocate an event once (`Arc::new`) and hand the same `Arc`
//!   to [`EventManager::publish`](crate::EventManager::publish); the pointer
//!   is the event's identity for duplicate suppression.
//! - **Handlers** receive `&dyn Event` and downcast via [`Event::as_any`].
//!
//! See `core/mod.rs` for the dispatch wiring diagram.

mod event;
mod priority;

pub use event::{CancelState, Event};
pub use priority::Priority;

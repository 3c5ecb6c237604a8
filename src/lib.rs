//! # bubblebus
//!
//! **Bubblebus** is a synchronous, hierarchical in-process event bus for Rust.
//!
//! It decouples producers of domain events from consumers while letting
//! independent contexts (sub-systems, plugins, worlds) each run their own
//! isolated bus that still participates in a global dispatch hierarchy.
//! The crate is designed as a building block for plugin hosts and game-style
//! tick loops.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                       ┌───────────────────┐
//!                       │   Root manager    │  ◄── global handlers see
//!                       │ (no parent)       │      every event first
//!                       └───────┬───────────┘
//!               bubbling ▲      ▲      ▲ bubbling
//!            ┌───────────┘      │      └───────────┐
//!   ┌────────┴────────┐ ┌───────┴───────┐ ┌────────┴────────┐
//!   │ Context manager │ │ Context mgr   │ │ Context manager │
//!   │ (world A)       │ │ (world B)     │ │ (UI)            │
//!   └────────┬────────┘ └───────────────┘ └─────────────────┘
//!            │ publish(Arc<E>)
//!            ▼
//!   ┌───────────────────────────────────────────────────────┐
//!   │ EventManager                                          │
//!   │  - dedup set (weak event identity, bubbling-loop guard)│
//!   │  - TypeId → HandlerCollection (per-type, tier-sorted) │
//!   │  - call handlers (every event, insertion order)       │
//!   └───────────────────────────────────────────────────────┘
//!            │
//!            ▼
//!   First → High → Normal → Low → Last → Watcher   (panics isolated)
//! ```
//!
//! ### Dispatch lifecycle
//! ```text
//! manager.publish(e):
//!   ├─ disposed?           → Err(BusError::Disposed)
//!   ├─ already dispatched? → Ok (same Arc delivered once per manager)
//!   ├─ parent.publish(e)   → recurse first; root handlers run before local
//!   ├─ HandlerCollection   → snapshot, invoke in (tier, registration) order
//!   │       └─ cancelled event skips entries unless ignore_cancelled/Watcher
//!   └─ call handlers       → every event, insertion order
//! ```
//!
//! ## Features
//! | Area | Description | Key types / traits |
//! |---|---|---|
//! | **Handlers** | One callable per event type with priority and cancellation visibility. | [`Handler`], [`HandlerFn`], [`Priority`] |
//! | **Listeners** | Bundle several handlers, registered/removed as a unit. | [`Listener`], [`Binding`] |
//! | **Hierarchy** | Immutable parent links; events bubble to the root first. | [`EventManager`] |
//! | **Ownership** | Weak-keyed owner index for plugin-scoped bulk teardown. | [`Owner`], [`OwnershipRegistry`] |
//! | **Errors** | Typed errors for registration and publish misuse. | [`BusError`] |
//!
//! ## Example
//! ```
//! use std::any::Any;
//! use std::sync::Arc;
//! use bubblebus::{
//!     CancelState, Event, EventManager, HandlerFn, Owner, OwnershipRegistry, Priority,
//! };
//!
//! struct MyPlugin;
//! impl Owner for MyPlugin {
//!     fn name(&self) -> &str { "my-plugin" }
//! }
//!
//! struct BlockBreak {
//!     cancel: CancelState,
//! }
//! impl Event for BlockBreak {
//!     fn as_any(&self) -> &dyn Any { self }
//!     fn cancel_state(&self) -> Option<&CancelState> { Some(&self.cancel) }
//! }
//!
//! fn main() -> Result<(), bubblebus::BusError> {
//!     let registry = OwnershipRegistry::new();
//!     let root = EventManager::root(Arc::clone(&registry));
//!     let world = EventManager::with_parent(Arc::clone(&root));
//!
//!     let plugin: Arc<dyn Owner> = Arc::new(MyPlugin);
//!
//!     // Protection plugin: veto the break early.
//!     world.subscribe::<BlockBreak>(
//!         Priority::First,
//!         false,
//!         HandlerFn::arc("protect", |ev: &BlockBreak| ev.cancel.cancel()),
//!         &plugin,
//!     )?;
//!
//!     // Logger: watch everything, cancelled or not.
//!     world.subscribe::<BlockBreak>(
//!         Priority::Watcher,
//!         false,
//!         HandlerFn::arc("audit", |_ev: &BlockBreak| { /* log it */ }),
//!         &plugin,
//!     )?;
//!
//!     let ev = world.publish(Arc::new(BlockBreak { cancel: CancelState::new() }))?;
//!     assert!(ev.cancel.is_cancelled());
//!
//!     // Plugin unload: every registration on every manager goes away.
//!     registry.unregister_owner(&plugin);
//!     assert!(!world.has_handlers::<BlockBreak>());
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod handlers;
mod registry;

// ---- Public re-exports ----

pub use config::ManagerConfig;
pub use core::{EventManager, RegistrationHandle};
pub use error::BusError;
pub use events::{CancelState, Event, Priority};
pub use handlers::{Binding, CallFn, Handler, HandlerFn, HandlerRef, Listener, ListenerRef};
pub use registry::{Owner, OwnerRef, OwnershipRegistry, Registration, RegistrationTarget};

// The manager is handed across threads (auxiliary workers publish and
// unregister); pin that at compile time.
static_assertions::assert_impl_all!(EventManager: Send, Sync);
static_assertions::assert_impl_all!(OwnershipRegistry: Send, Sync);

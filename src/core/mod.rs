//! Dispatch core: the event manager and registration lifecycle.
//!
//! This module contains the embedded implementation of the bubblebus engine.
//! The public API from this module is [`EventManager`] plus the
//! [`RegistrationHandle`] it hands out.
//!
//! Internal modules:
//! - [`manager`]: the bus — subscribe/unsubscribe/publish, parent bubbling;
//! - [`handle`]: ACTIVE → REMOVED handle for explicit unsubscribe;
//! - [`dedup`]: weak identity set suppressing repeat delivery.
//!
//! ## High-level architecture
//! ```text
//! publish(Arc<E>) on Child:
//!
//!   Child.publish(e)
//!     ├─ disposed?            → Err(Disposed)
//!     ├─ dedup.check(e)       → already seen: return Ok (bubbling-loop guard)
//!     ├─ Parent.publish(e)    → recurse FIRST (root handlers see e before local ones)
//!     │    └─ ... up to Root
//!     ├─ collections[type(e)] → snapshot, invoke in (tier, seq) order
//!     └─ call handlers        → invoke in insertion order
//! ```

mod dedup;
mod handle;
mod manager;

pub(crate) use dedup::DispatchedSet;

pub use handle::RegistrationHandle;
pub use manager::EventManager;

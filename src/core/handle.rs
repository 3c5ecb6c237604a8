//! # Registration handle.
//!
//! [`RegistrationHandle`] is returned by every successful registration and
//! allows explicit, idempotent removal without keeping the manager alive.
//!
//! ## Rules
//! - State machine: `ACTIVE → REMOVED`, terminal. [`remove`] after the first
//!   call is a no-op, as is removal after the manager was dropped or disposed.
//! - Removal through the handle synchronizes both sides: the manager's
//!   collections and the ownership registry.
//!
//! [`remove`]: RegistrationHandle::remove

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Weak;

use crate::core::EventManager;
use crate::registry::RegistrationTarget;

/// Handle to one active registration (handler, listener or call handler).
pub struct RegistrationHandle {
    manager: Weak<EventManager>,
    target: RegistrationTarget,
    removed: AtomicBool,
}

impl RegistrationHandle {
    pub(crate) fn new(manager: Weak<EventManager>, target: RegistrationTarget) -> Self {
        Self {
            manager,
            target,
            removed: AtomicBool::new(false),
        }
    }

    /// Removes the registration from its manager and the ownership registry.
    ///
    /// Idempotent; a handle whose manager is gone flips to REMOVED silently.
    pub fn remove(&self) {
        if self.removed.swap(true, AtomicOrdering::AcqRel) {
            return;
        }
        let Some(manager) = self.manager.upgrade() else {
            return;
        };
        match &self.target {
            RegistrationTarget::Handler(handler) => manager.unsubscribe_handler(handler),
            RegistrationTarget::Listener(listener) => manager.unsubscribe_listener(listener),
            RegistrationTarget::CallHandler(handler) => manager.remove_call_handler(handler),
        }
    }

    /// True once [`remove`](RegistrationHandle::remove) has run.
    pub fn is_removed(&self) -> bool {
        self.removed.load(AtomicOrdering::Acquire)
    }

    /// What this handle registered.
    pub fn target(&self) -> &RegistrationTarget {
        &self.target
    }
}

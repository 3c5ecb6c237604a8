//! # Ownership registry — owner-scoped bulk teardown.
//!
//! Every registration on any manager is also indexed here under the **owner**
//! (the principal — typically a plugin — on whose behalf it was made). When
//! an owner is unloaded, [`OwnershipRegistry::unregister_owner`] unwinds all
//! of its handlers, listeners and call handlers across *every* manager it
//! ever registered with.
//!
//! ## Architecture
//! ```text
//! OwnershipRegistry (process-wide, one instance, injected into managers)
//!   owner#A ──► [ Registration { manager W1, Handler h1 },
//!                 Registration { manager W2, Listener l1 } ]
//!   owner#B ──► [ Registration { manager W1, CallHandler c1 } ]
//!
//! unregister_owner(A):
//!   detach owner#A's whole set atomically
//!     └─ for each registration:
//!          manager.upgrade() → unsubscribe(target)
//!          target.dispose()
//! ```
//!
//! ## Rules
//! - Keyed by owner pointer identity; the stored owner reference is **weak**,
//!   so the registry never keeps a principal alive. An owner dropped without
//!   explicit teardown leaves unreachable registrations behind — bulk
//!   teardown is the required path.
//! - `remove_all` detaches atomically; teardown then runs without any shard
//!   lock held, so managers may call back into the registry freely.
//! - Safe for concurrent access from any thread (the only structure shared
//!   across managers).

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::core::EventManager;
use crate::handlers::{handler_identity, listener_identity, Handler, HandlerRef, Listener, ListenerRef};

/// # Owning principal of registrations.
///
/// The external entity (e.g. a plugin) on whose behalf handlers and listeners
/// are registered. Identity is `Arc` pointer identity.
///
/// # Example
/// ```
/// use bubblebus::Owner;
///
/// struct Plugin { id: String }
///
/// impl Owner for Plugin {
///     fn name(&self) -> &str { &self.id }
/// }
/// ```
pub trait Owner: Send + Sync + 'static {
    /// Human-readable name (for logs).
    fn name(&self) -> &str;
}

/// Shared handle to an owner.
pub type OwnerRef = Arc<dyn Owner>;

fn owner_identity(owner: &OwnerRef) -> usize {
    Arc::as_ptr(owner).cast::<()>() as usize
}

/// What a registration points at on its manager.
#[derive(Clone)]
pub enum RegistrationTarget {
    /// A directly subscribed handler.
    Handler(HandlerRef),
    /// A listener registered as a unit.
    Listener(ListenerRef),
    /// A manager-wide call handler.
    CallHandler(HandlerRef),
}

/// Registration kind, the third component of the removal key.
///
/// One `Arc` identity may be registered both as a typed handler and as a call
/// handler on the same manager; removing one must not detach the other's
/// index entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TargetKind {
    Handler,
    Listener,
    CallHandler,
}

impl RegistrationTarget {
    /// Pointer identity of the target.
    pub(crate) fn identity(&self) -> usize {
        match self {
            RegistrationTarget::Handler(h) | RegistrationTarget::CallHandler(h) => {
                handler_identity(h)
            }
            RegistrationTarget::Listener(l) => listener_identity(l),
        }
    }

    /// Kind discriminant for removal matching.
    pub(crate) fn kind(&self) -> TargetKind {
        match self {
            RegistrationTarget::Handler(_) => TargetKind::Handler,
            RegistrationTarget::Listener(_) => TargetKind::Listener,
            RegistrationTarget::CallHandler(_) => TargetKind::CallHandler,
        }
    }

    /// Name of the target, for logs.
    pub fn name(&self) -> &str {
        match self {
            RegistrationTarget::Handler(h) | RegistrationTarget::CallHandler(h) => h.name(),
            RegistrationTarget::Listener(l) => l.name(),
        }
    }

    /// Runs the target's teardown hook.
    fn dispose(&self) {
        match self {
            RegistrationTarget::Handler(h) | RegistrationTarget::CallHandler(h) => h.dispose(),
            RegistrationTarget::Listener(l) => l.dispose(),
        }
    }
}

/// One indexed registration: which manager, which target.
#[derive(Clone)]
pub struct Registration {
    manager: Weak<EventManager>,
    target: RegistrationTarget,
}

impl Registration {
    pub(crate) fn new(manager: Weak<EventManager>, target: RegistrationTarget) -> Self {
        Self { manager, target }
    }

    /// The manager this registration lives on, if still alive.
    pub fn manager(&self) -> Option<Arc<EventManager>> {
        self.manager.upgrade()
    }

    /// What was registered.
    pub fn target(&self) -> &RegistrationTarget {
        &self.target
    }

    fn matches(&self, manager_ptr: usize, kind: TargetKind, target_identity: usize) -> bool {
        self.manager.as_ptr().cast::<()>() as usize == manager_ptr
            && self.target.kind() == kind
            && self.target.identity() == target_identity
    }
}

/// Per-owner slot: weak principal reference plus its registrations.
struct OwnerSlot {
    owner: Weak<dyn Owner>,
    registrations: Vec<Registration>,
}

/// Process-wide index from owner to every registration made on its behalf.
///
/// Construct one per process (or per test) and pass the same `Arc` to every
/// [`EventManager`]; there is deliberately no hidden global instance.
#[derive(Default)]
pub struct OwnershipRegistry {
    owners: DashMap<usize, OwnerSlot>,
}

impl OwnershipRegistry {
    /// Creates an empty registry behind a shared handle.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Indexes one registration under the owner.
    pub(crate) fn put(&self, owner: &OwnerRef, registration: Registration) {
        let key = owner_identity(owner);
        let mut slot = self.owners.entry(key).or_insert_with(|| OwnerSlot {
            owner: Arc::downgrade(owner),
            registrations: Vec::new(),
        });
        trace!(
            owner = owner.name(),
            target = registration.target().name(),
            "indexed registration"
        );
        slot.registrations.push(registration);
    }

    /// Drops one registration from the owner's set, leaving the rest intact.
    ///
    /// The key is `(manager, kind, identity)`: a shared `Arc` registered both
    /// as a typed handler and as a call handler keeps its other entry. Used by
    /// per-registration unsubscribe; a missing owner or registration is a
    /// no-op.
    pub(crate) fn remove_value(
        &self,
        owner_key: usize,
        manager_ptr: usize,
        kind: TargetKind,
        target_identity: usize,
    ) {
        let emptied = match self.owners.get_mut(&owner_key) {
            Some(mut slot) => {
                slot.registrations
                    .retain(|r| !r.matches(manager_ptr, kind, target_identity));
                slot.registrations.is_empty() && slot.owner.strong_count() == 0
            }
            None => false,
        };
        // Drop the slot once both the set and the principal are gone.
        if emptied {
            self.owners
                .remove_if(&owner_key, |_, slot| {
                    slot.registrations.is_empty() && slot.owner.strong_count() == 0
                });
        }
    }

    /// Atomically detaches and returns every registration for the owner.
    pub fn remove_all(&self, owner: &OwnerRef) -> Vec<Registration> {
        match self.owners.remove(&owner_identity(owner)) {
            Some((_, slot)) => slot.registrations,
            None => Vec::new(),
        }
    }

    /// Number of live registrations indexed for the owner.
    pub fn registration_count(&self, owner: &OwnerRef) -> usize {
        self.owners
            .get(&owner_identity(owner))
            .map_or(0, |slot| slot.registrations.len())
    }

    /// Unwinds everything the owner ever registered, across all managers.
    ///
    /// For each detached registration the owning manager (if still alive) is
    /// asked to unsubscribe the target, then the target's `dispose()` hook
    /// runs. Registrations that were already removed individually are absent
    /// from the set, so repeated or partial teardown is harmless.
    pub fn unregister_owner(&self, owner: &OwnerRef) {
        let registrations = self.remove_all(owner);
        debug!(
            owner = owner.name(),
            count = registrations.len(),
            "unregistering owner"
        );

        for registration in registrations {
            if let Some(manager) = registration.manager() {
                match registration.target() {
                    RegistrationTarget::Handler(handler) => manager.unsubscribe_handler(handler),
                    RegistrationTarget::Listener(listener) => {
                        manager.unsubscribe_listener(listener)
                    }
                    RegistrationTarget::CallHandler(handler) => {
                        manager.remove_call_handler(handler)
                    }
                }
            }
            registration.target.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestOwner(&'static str);

    impl Owner for TestOwner {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn noop_handler(tag: &'static str) -> HandlerRef {
        struct Noop(&'static str);
        impl crate::handlers::Handler for Noop {
            fn handle(&self, _event: &dyn crate::events::Event) {}
            fn name(&self) -> &str {
                self.0
            }
        }
        Arc::new(Noop(tag))
    }

    #[test]
    fn put_then_remove_all_returns_everything() {
        let registry = OwnershipRegistry::new();
        let owner: OwnerRef = Arc::new(TestOwner("p1"));

        for tag in ["a", "b", "c"] {
            registry.put(
                &owner,
                Registration::new(Weak::new(), RegistrationTarget::Handler(noop_handler(tag))),
            );
        }
        assert_eq!(registry.registration_count(&owner), 3);

        let removed = registry.remove_all(&owner);
        assert_eq!(removed.len(), 3);
        assert_eq!(registry.registration_count(&owner), 0);
        assert!(registry.remove_all(&owner).is_empty());
    }

    #[test]
    fn remove_value_leaves_siblings_intact() {
        let registry = OwnershipRegistry::new();
        let owner: OwnerRef = Arc::new(TestOwner("p1"));
        let keep = noop_handler("keep");
        let drop_me = noop_handler("drop");

        registry.put(
            &owner,
            Registration::new(Weak::new(), RegistrationTarget::Handler(Arc::clone(&keep))),
        );
        registry.put(
            &owner,
            Registration::new(
                Weak::new(),
                RegistrationTarget::Handler(Arc::clone(&drop_me)),
            ),
        );

        let manager_ptr = Weak::<EventManager>::new().as_ptr().cast::<()>() as usize;
        registry.remove_value(
            owner_identity(&owner),
            manager_ptr,
            TargetKind::Handler,
            handler_identity(&drop_me),
        );

        assert_eq!(registry.registration_count(&owner), 1);
        let left = registry.remove_all(&owner);
        assert_eq!(left[0].target().name(), "keep");
    }

    #[test]
    fn removal_is_scoped_to_the_registration_kind() {
        let registry = OwnershipRegistry::new();
        let owner: OwnerRef = Arc::new(TestOwner("p1"));
        let shared = noop_handler("shared");

        registry.put(
            &owner,
            Registration::new(Weak::new(), RegistrationTarget::Handler(Arc::clone(&shared))),
        );
        registry.put(
            &owner,
            Registration::new(
                Weak::new(),
                RegistrationTarget::CallHandler(Arc::clone(&shared)),
            ),
        );

        let manager_ptr = Weak::<EventManager>::new().as_ptr().cast::<()>() as usize;
        registry.remove_value(
            owner_identity(&owner),
            manager_ptr,
            TargetKind::Handler,
            handler_identity(&shared),
        );

        let left = registry.remove_all(&owner);
        assert_eq!(left.len(), 1);
        assert!(matches!(left[0].target(), RegistrationTarget::CallHandler(_)));
    }

    #[test]
    fn owners_are_isolated() {
        let registry = OwnershipRegistry::new();
        let a: OwnerRef = Arc::new(TestOwner("a"));
        let b: OwnerRef = Arc::new(TestOwner("b"));

        registry.put(
            &a,
            Registration::new(Weak::new(), RegistrationTarget::Handler(noop_handler("ha"))),
        );
        registry.put(
            &b,
            Registration::new(Weak::new(), RegistrationTarget::Handler(noop_handler("hb"))),
        );

        registry.remove_all(&a);
        assert_eq!(registry.registration_count(&b), 1);
    }
}

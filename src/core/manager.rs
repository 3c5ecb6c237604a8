//! # EventManager: the bus.
//!
//! An [`EventManager`] owns one [`HandlerCollection`] per event type, an
//! optional parent pointer, a weak identity set of dispatched events and the
//! public subscribe/unsubscribe/publish API.
//!
//! ## Rules
//! - The parent is set at construction and **immutable** afterwards; managers
//!   form a tree, cycles are structurally impossible. A manager never owns or
//!   destroys its parent.
//! - `publish` recurses into the parent **before** dispatching locally: root
//!   handlers observe every event before local ones, no matter how many
//!   managers bubble it. Priority tiers order handlers only *within* one
//!   manager.
//! - The state mutex is never held while user code (handlers, listener
//!   bindings) runs, so handlers may subscribe, unsubscribe and publish on
//!   the same manager mid-dispatch.
//! - `dispose()` is terminal: it unregisters every handler and listener and
//!   fails all further subscribe/publish calls. Unsubscribe stays a silent
//!   no-op. Call handlers are left to their own remove API.

use std::any::TypeId;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

use crate::config::ManagerConfig;
use crate::core::handle::RegistrationHandle;
use crate::core::DispatchedSet;
use crate::error::BusError;
use crate::events::{Event, Priority};
use crate::handlers::{
    handler_identity, invoke_entries, listener_identity, Handler, HandlerCollection, HandlerFn,
    HandlerRef, Listener, ListenerRef,
};
use crate::registry::{OwnerRef, OwnershipRegistry, Registration, RegistrationTarget, TargetKind};

/// A directly subscribed handler and where it went.
struct DirectHandler {
    event_type: TypeId,
    owner_key: usize,
}

/// A registered listener and the handlers it bound.
struct ListenerRecord {
    bound: Vec<(TypeId, usize)>,
    owner_key: usize,
}

/// A manager-wide call handler (runs for every published event).
struct CallHandlerEntry {
    handler: HandlerRef,
    owner_key: usize,
}

/// Mutable manager state; one short-lived lock, never held across user code.
struct ManagerState {
    collections: HashMap<TypeId, HandlerCollection>,
    direct_handlers: HashMap<usize, DirectHandler>,
    listeners: HashMap<usize, ListenerRecord>,
    call_handlers: Vec<CallHandlerEntry>,
    dispatched: DispatchedSet,
    disposed: bool,
}

/// One bus in the dispatch hierarchy.
///
/// Construct a root per context with [`EventManager::root`] and children with
/// [`EventManager::with_parent`]; all managers of one process share a single
/// [`OwnershipRegistry`].
///
/// ## Example
/// ```
/// use std::any::Any;
/// use std::sync::Arc;
/// use bubblebus::{Event, EventManager, HandlerFn, Owner, OwnershipRegistry, Priority};
///
/// struct Plugin;
/// impl Owner for Plugin {
///     fn name(&self) -> &str { "demo-plugin" }
/// }
///
/// struct PlayerJoin;
/// impl Event for PlayerJoin {
///     fn as_any(&self) -> &dyn Any { self }
/// }
///
/// let registry = OwnershipRegistry::new();
/// let root = EventManager::root(Arc::clone(&registry));
/// let world = EventManager::with_parent(Arc::clone(&root));
///
/// let owner: Arc<dyn Owner> = Arc::new(Plugin);
/// root.subscribe::<PlayerJoin>(
///     Priority::Normal,
///     false,
///     HandlerFn::arc("greeter", |_ev: &PlayerJoin| { /* ... */ }),
///     &owner,
/// ).unwrap();
///
/// // Publishing on the child reaches the root handler first.
/// world.publish(Arc::new(PlayerJoin)).unwrap();
/// ```
pub struct EventManager {
    config: ManagerConfig,
    parent: Option<Arc<EventManager>>,
    registry: Arc<OwnershipRegistry>,
    state: Mutex<ManagerState>,
}

impl EventManager {
    /// Creates a root manager (no parent).
    pub fn root(registry: Arc<OwnershipRegistry>) -> Arc<Self> {
        Self::with_config(ManagerConfig::default(), None, registry)
    }

    /// Creates a child manager bubbling into `parent`.
    ///
    /// The child shares the parent's ownership registry. The parent link is
    /// immutable for the child's lifetime.
    pub fn with_parent(parent: Arc<EventManager>) -> Arc<Self> {
        let registry = Arc::clone(&parent.registry);
        Self::with_config(ManagerConfig::default(), Some(parent), registry)
    }

    /// Creates a manager with explicit configuration and parent.
    pub fn with_config(
        config: ManagerConfig,
        parent: Option<Arc<EventManager>>,
        registry: Arc<OwnershipRegistry>,
    ) -> Arc<Self> {
        let dedup = DispatchedSet::new(config.prune_threshold_clamped());
        Arc::new(Self {
            config,
            parent,
            registry,
            state: Mutex::new(ManagerState {
                collections: HashMap::new(),
                direct_handlers: HashMap::new(),
                listeners: HashMap::new(),
                call_handlers: Vec::new(),
                dispatched: dedup,
                disposed: false,
            }),
        })
    }

    /// Manager name (from its config), used in log fields.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The parent manager, if any.
    pub fn parent(&self) -> Option<&Arc<EventManager>> {
        self.parent.as_ref()
    }

    /// The shared ownership registry this manager reports to.
    pub fn registry(&self) -> &Arc<OwnershipRegistry> {
        &self.registry
    }

    // ---------------------------
    // Registration
    // ---------------------------

    /// Subscribes a handler for events of type `E`.
    ///
    /// Fails with [`BusError::Disposed`] on a disposed manager and
    /// [`BusError::DuplicateHandler`] when the handler identity is already
    /// registered here (one `Arc`, one registration per manager).
    pub fn subscribe<E: Event>(
        self: &Arc<Self>,
        priority: Priority,
        ignore_cancelled: bool,
        handler: HandlerRef,
        owner: &OwnerRef,
    ) -> Result<RegistrationHandle, BusError> {
        let identity = handler_identity(&handler);
        {
            let mut state = self.state.lock();
            self.ensure_open(&state)?;
            if state.direct_handlers.contains_key(&identity) {
                return Err(self.duplicate_handler(handler.name()));
            }

            let collection = state
                .collections
                .entry(TypeId::of::<E>())
                .or_insert_with(|| HandlerCollection::new(std::any::type_name::<E>()));
            if !collection.add(Arc::clone(&handler), priority, ignore_cancelled) {
                return Err(self.duplicate_handler(handler.name()));
            }

            state.direct_handlers.insert(
                identity,
                DirectHandler {
                    event_type: TypeId::of::<E>(),
                    owner_key: owner_key(owner),
                },
            );
        }

        debug!(
            manager = self.name(),
            handler = handler.name(),
            event = std::any::type_name::<E>(),
            priority = %priority,
            "subscribed handler"
        );
        let target = RegistrationTarget::Handler(handler);
        self.registry
            .put(owner, Registration::new(Arc::downgrade(self), target.clone()));
        Ok(RegistrationHandle::new(Arc::downgrade(self), target))
    }

    /// Subscribes a typed closure for events of type `E`.
    ///
    /// Convenience over [`subscribe`](EventManager::subscribe) +
    /// [`HandlerFn::arc`]; returns the same kind of handle.
    pub fn subscribe_fn<E, F>(
        self: &Arc<Self>,
        name: &'static str,
        priority: Priority,
        ignore_cancelled: bool,
        f: F,
        owner: &OwnerRef,
    ) -> Result<RegistrationHandle, BusError>
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscribe::<E>(priority, ignore_cancelled, HandlerFn::arc(name, f), owner)
    }

    /// Registers a listener: all of its declared bindings in one call.
    ///
    /// Fails with [`BusError::DuplicateListener`] if this listener identity is
    /// already registered. A binding whose handler identity is already taken
    /// is skipped with a warning; the remaining bindings still register.
    pub fn subscribe_listener(
        self: &Arc<Self>,
        listener: ListenerRef,
        owner: &OwnerRef,
    ) -> Result<RegistrationHandle, BusError> {
        // User code; must run before the state lock is taken.
        let bindings = listener.bindings();

        let identity = listener_identity(&listener);
        let mut skipped: Vec<&'static str> = Vec::new();
        {
            let mut state = self.state.lock();
            self.ensure_open(&state)?;
            if state.listeners.contains_key(&identity) {
                return Err(BusError::DuplicateListener {
                    listener: listener.name().to_string(),
                    manager: self.name().to_string(),
                });
            }

            let mut bound = Vec::with_capacity(bindings.len());
            for binding in &bindings {
                let collection = state
                    .collections
                    .entry(binding.event_type())
                    .or_insert_with(|| HandlerCollection::new(binding.event_type_name()));
                if collection.add(
                    Arc::clone(binding.handler()),
                    binding.priority(),
                    binding.ignore_cancelled(),
                ) {
                    bound.push((binding.event_type(), handler_identity(binding.handler())));
                } else {
                    skipped.push(binding.event_type_name());
                }
            }

            state.listeners.insert(
                identity,
                ListenerRecord {
                    bound,
                    owner_key: owner_key(owner),
                },
            );
        }

        for event_type in skipped {
            warn!(
                manager = self.name(),
                listener = listener.name(),
                event = event_type,
                "skipping binding: handler already registered"
            );
        }
        debug!(
            manager = self.name(),
            listener = listener.name(),
            bindings = bindings.len(),
            "subscribed listener"
        );

        let target = RegistrationTarget::Listener(listener);
        self.registry
            .put(owner, Registration::new(Arc::downgrade(self), target.clone()));
        Ok(RegistrationHandle::new(Arc::downgrade(self), target))
    }

    /// Adds a call handler, invoked for **every** published event after the
    /// type-specific handlers, in insertion order.
    pub fn add_call_handler(
        self: &Arc<Self>,
        handler: HandlerRef,
        owner: &OwnerRef,
    ) -> Result<RegistrationHandle, BusError> {
        let identity = handler_identity(&handler);
        {
            let mut state = self.state.lock();
            self.ensure_open(&state)?;
            if state
                .call_handlers
                .iter()
                .any(|c| handler_identity(&c.handler) == identity)
            {
                return Err(self.duplicate_handler(handler.name()));
            }
            state.call_handlers.push(CallHandlerEntry {
                handler: Arc::clone(&handler),
                owner_key: owner_key(owner),
            });
        }

        debug!(
            manager = self.name(),
            handler = handler.name(),
            "added call handler"
        );
        let target = RegistrationTarget::CallHandler(handler);
        self.registry
            .put(owner, Registration::new(Arc::downgrade(self), target.clone()));
        Ok(RegistrationHandle::new(Arc::downgrade(self), target))
    }

    // ---------------------------
    // Removal
    // ---------------------------

    /// Unsubscribes a directly registered handler.
    ///
    /// No-op when the manager is disposed or the handler was never here.
    pub fn unsubscribe_handler(&self, handler: &HandlerRef) {
        let identity = handler_identity(handler);
        let removed = {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            match state.direct_handlers.remove(&identity) {
                Some(record) => {
                    if let Some(collection) = state.collections.get_mut(&record.event_type) {
                        collection.remove(identity);
                    }
                    Some(record.owner_key)
                }
                None => None,
            }
        };

        if let Some(owner_key) = removed {
            trace!(
                manager = self.name(),
                handler = handler.name(),
                "unsubscribed handler"
            );
            self.registry
                .remove_value(owner_key, self.as_ptr(), TargetKind::Handler, identity);
        }
    }

    /// Unsubscribes a listener and every handler it bound.
    ///
    /// No-op when the manager is disposed or the listener was never here.
    pub fn unsubscribe_listener(&self, listener: &ListenerRef) {
        let identity = listener_identity(listener);
        let removed = {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            match state.listeners.remove(&identity) {
                Some(record) => {
                    for (event_type, handler_id) in &record.bound {
                        if let Some(collection) = state.collections.get_mut(event_type) {
                            collection.remove(*handler_id);
                        }
                    }
                    Some(record.owner_key)
                }
                None => None,
            }
        };

        if let Some(owner_key) = removed {
            trace!(
                manager = self.name(),
                listener = listener.name(),
                "unsubscribed listener"
            );
            self.registry
                .remove_value(owner_key, self.as_ptr(), TargetKind::Listener, identity);
        }
    }

    /// Removes a call handler. Idempotent.
    pub fn remove_call_handler(&self, handler: &HandlerRef) {
        let identity = handler_identity(handler);
        let removed = {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            let mut owner_key = None;
            state.call_handlers.retain(|c| {
                if handler_identity(&c.handler) == identity {
                    owner_key = Some(c.owner_key);
                    false
                } else {
                    true
                }
            });
            owner_key
        };

        if let Some(owner_key) = removed {
            self.registry
                .remove_value(owner_key, self.as_ptr(), TargetKind::CallHandler, identity);
        }
    }

    /// Removes every handler and listener from this manager.
    ///
    /// Call handlers are kept (remove them via
    /// [`remove_call_handler`](EventManager::remove_call_handler)). Idempotent
    /// and safe on an already-empty or disposed manager.
    pub fn unsubscribe_all(&self) {
        let detached = {
            let mut state = self.state.lock();
            Self::drain_registrations(&mut state)
        };

        if !detached.is_empty() {
            debug!(
                manager = self.name(),
                count = detached.len(),
                "unsubscribed all handlers and listeners"
            );
        }
        self.detach_from_registry(detached);
    }

    // ---------------------------
    // Publish
    // ---------------------------

    /// Publishes an event, returning it for chaining.
    ///
    /// Dispatch order: parent chain first (bubbling toward the root), then
    /// this manager's collection for the event's exact runtime type, then the
    /// call handlers. Publishing the same `Arc` twice on one manager is a
    /// silent no-op (duplicate suppression).
    pub fn publish<E: Event>(&self, event: Arc<E>) -> Result<Arc<E>, BusError> {
        let erased: Arc<dyn Event> = Arc::clone(&event) as Arc<dyn Event>;
        self.publish_erased(&erased)?;
        Ok(event)
    }

    /// Publishes a type-erased event.
    ///
    /// Entry point for producers that already hold `Arc<dyn Event>`; also the
    /// recursion step used by child managers when bubbling.
    pub fn publish_erased(&self, event: &Arc<dyn Event>) -> Result<(), BusError> {
        {
            let mut state = self.state.lock();
            self.ensure_open(&state)?;
            if state.dispatched.check_and_insert(event) {
                trace!(
                    manager = self.name(),
                    event = event.event_name(),
                    "suppressing duplicate delivery"
                );
                return Ok(());
            }
        }

        // Bubble first: root-level handlers observe the event before local
        // ones. A disposed parent is skipped; the child keeps working.
        if let Some(parent) = &self.parent {
            match parent.publish_erased(event) {
                Ok(()) => {}
                Err(err) if err.is_disposed() => {
                    trace!(
                        manager = self.name(),
                        parent = parent.name(),
                        "skipping disposed parent during bubbling"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        let type_id = event.as_any().type_id();
        let (entries, calls) = {
            let state = self.state.lock();
            let entries = state
                .collections
                .get(&type_id)
                .map(|c| c.snapshot())
                .unwrap_or_default();
            let calls: Vec<HandlerRef> = state
                .call_handlers
                .iter()
                .map(|c| Arc::clone(&c.handler))
                .collect();
            (entries, calls)
        };

        invoke_entries(self.name(), &entries, event);

        for call in &calls {
            let outcome = catch_unwind(AssertUnwindSafe(|| call.handle(event.as_ref())));
            if let Err(panic_err) = outcome {
                error!(
                    manager = self.name(),
                    handler = call.name(),
                    event = event.event_name(),
                    "call handler panicked: {panic_err:?}"
                );
            }
        }

        Ok(())
    }

    // ---------------------------
    // Introspection & lifecycle
    // ---------------------------

    /// True if any handler is registered for events of type `E`.
    pub fn has_handlers<E: Event>(&self) -> bool {
        self.has_handlers_of(TypeId::of::<E>())
    }

    /// Type-erased form of [`has_handlers`](EventManager::has_handlers).
    pub fn has_handlers_of(&self, event_type: TypeId) -> bool {
        let state = self.state.lock();
        !state.disposed
            && state
                .collections
                .get(&event_type)
                .is_some_and(|c| !c.is_empty())
    }

    /// True once [`dispose`](EventManager::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    /// Unregisters every handler and listener, then marks the manager
    /// terminally disposed. A second call is a no-op.
    ///
    /// The drain and the disposed flag are set under one lock, so a
    /// concurrent `subscribe` either lands before the drain (and is unwound
    /// with the rest) or observes the disposed state and fails.
    ///
    /// Child managers pointing at this one keep working; they skip the
    /// disposed parent while bubbling.
    pub fn dispose(&self) {
        let detached = {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            let detached = Self::drain_registrations(&mut state);
            state.disposed = true;
            detached
        };

        debug!(manager = self.name(), "disposed event manager");
        self.detach_from_registry(detached);
    }

    // ---------------------------
    // Helpers
    // ---------------------------

    /// Drains every handler and listener record under the caller's lock.
    fn drain_registrations(state: &mut ManagerState) -> Vec<(usize, usize, TargetKind)> {
        let mut detached = Vec::new();
        for (identity, record) in state.direct_handlers.drain() {
            detached.push((record.owner_key, identity, TargetKind::Handler));
        }
        for (identity, record) in state.listeners.drain() {
            detached.push((record.owner_key, identity, TargetKind::Listener));
        }
        state.collections.clear();
        detached
    }

    /// Drops drained records from the ownership registry, lock released.
    fn detach_from_registry(&self, detached: Vec<(usize, usize, TargetKind)>) {
        for (owner_key, identity, kind) in detached {
            self.registry
                .remove_value(owner_key, self.as_ptr(), kind, identity);
        }
    }

    fn ensure_open(&self, state: &ManagerState) -> Result<(), BusError> {
        if state.disposed {
            return Err(BusError::Disposed {
                manager: self.name().to_string(),
            });
        }
        Ok(())
    }

    fn duplicate_handler(&self, handler: &str) -> BusError {
        BusError::DuplicateHandler {
            handler: handler.to_string(),
            manager: self.name().to_string(),
        }
    }

    fn as_ptr(&self) -> usize {
        std::ptr::from_ref(self) as usize
    }
}

fn owner_key(owner: &OwnerRef) -> usize {
    Arc::as_ptr(owner).cast::<()>() as usize
}

//! # Example: Plugin-scoped event flow
//!
//! Builds a two-level manager hierarchy, registers a protection plugin with
//! an audit listener, publishes cancellable events and finally unloads the
//! plugin in one call.
//!
//! Run with: `cargo run --example playground`

use std::any::Any;
use std::sync::Arc;

use bubblebus::{
    Binding, BusError, CallFn, CancelState, Event, EventManager, Listener, Owner, OwnerRef,
    OwnershipRegistry, Priority,
};

struct PlayerJoin {
    player: &'static str,
}

impl Event for PlayerJoin {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn event_name(&self) -> &'static str {
        "PlayerJoin"
    }
}

struct BlockBreak {
    block: &'static str,
    cancel: CancelState,
}

impl BlockBreak {
    fn new(block: &'static str) -> Arc<Self> {
        Arc::new(Self {
            block,
            cancel: CancelState::new(),
        })
    }
}

impl Event for BlockBreak {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn event_name(&self) -> &'static str {
        "BlockBreak"
    }

    fn cancel_state(&self) -> Option<&CancelState> {
        Some(&self.cancel)
    }
}

struct ProtectionPlugin;

impl Owner for ProtectionPlugin {
    fn name(&self) -> &str {
        "protection-plugin"
    }
}

/// Watches everything the plugin cares about, cancelled or not.
struct AuditListener;

impl Listener for AuditListener {
    fn bindings(&self) -> Vec<Binding> {
        vec![
            Binding::of("audit-join", Priority::Watcher, true, |ev: &PlayerJoin| {
                println!("[audit] player joined: {}", ev.player);
            }),
            Binding::of("audit-break", Priority::Watcher, true, |ev: &BlockBreak| {
                println!(
                    "[audit] block break: {} (cancelled: {})",
                    ev.block,
                    ev.cancel.is_cancelled()
                );
            }),
        ]
    }

    fn name(&self) -> &str {
        "audit-listener"
    }
}

fn main() -> Result<(), BusError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let registry = OwnershipRegistry::new();
    let root = EventManager::root(Arc::clone(&registry));
    let world = EventManager::with_parent(Arc::clone(&root));

    let plugin: OwnerRef = Arc::new(ProtectionPlugin);

    // Veto breaking the spawn beacon before anyone else reacts.
    world.subscribe_fn::<BlockBreak, _>(
        "protect-spawn",
        Priority::First,
        false,
        |ev: &BlockBreak| {
            if ev.block == "spawn-beacon" {
                println!("[protect] vetoing break of {}", ev.block);
                ev.cancel.cancel();
            }
        },
        &plugin,
    )?;

    // Audit at the root: sees events from every world.
    root.subscribe_listener(Arc::new(AuditListener), &plugin)?;
    root.add_call_handler(
        CallFn::arc("firehose", |ev: &dyn Event| {
            println!("[firehose] {}", ev.event_name());
        }),
        &plugin,
    )?;

    world.publish(Arc::new(PlayerJoin { player: "steve" }))?;

    let vetoed = world.publish(BlockBreak::new("spawn-beacon"))?;
    println!("spawn-beacon break cancelled: {}", vetoed.cancel.is_cancelled());

    world.publish(BlockBreak::new("dirt"))?;

    // Plugin unload: one call unwinds every registration on both managers.
    registry.unregister_owner(&plugin);
    println!(
        "plugin unloaded; world still handles BlockBreak: {}",
        world.has_handlers::<BlockBreak>()
    );
    Ok(())
}

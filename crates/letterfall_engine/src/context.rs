//! Process-scoped context bundling the shared runtime services
//!
//! Instead of ambient global singletons, the physics world, the event
//! registry and the asset catalog live in one explicit [`GameContext`] that
//! is passed to the assembler and the update loop. Single-instance semantics
//! are preserved per context, and unit tests get isolated instances for
//! free.

use crate::assets::AssetCatalog;
use crate::entity::Stage;
use crate::events::{EventPayload, EventRegistry, GameEventType};
use crate::physics::PhysicsWorld;

/// The shared runtime services of one game process
#[derive(Default)]
pub struct GameContext {
    /// The single shared physical simulation
    pub physics: PhysicsWorld,
    /// The event factory/registry/dispatcher
    pub events: EventRegistry,
    /// The asset-resolution boundary
    pub assets: AssetCatalog,
}

impl GameContext {
    /// Create a fresh context with an empty world, registry and catalog
    pub fn new() -> Self {
        Self {
            physics: PhysicsWorld::new(),
            events: EventRegistry::new(),
            assets: AssetCatalog::new(),
        }
    }

    /// Publish an event to all subscribed components on the stage
    ///
    /// Splits the context so listeners can mutate the physics world while
    /// the registry dispatches. Returns the number of successful deliveries.
    pub fn publish(
        &mut self,
        event_type: GameEventType,
        payload: EventPayload,
        stage: &mut Stage,
    ) -> usize {
        let Self {
            physics, events, ..
        } = self;
        events.publish(event_type, payload, stage, physics)
    }
}

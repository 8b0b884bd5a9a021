//! # Letterfall Engine
//!
//! The runtime core for a 2D physics-driven game: entities assembled from
//! polymorphic components, a shared physical simulation, and a typed game
//! event bus connecting the two.
//!
//! ## Architecture
//!
//! - **Entities and components**: an [`entity::Entity`] owns an ordered list
//!   of [`component::Component`] trait objects (graphics, physics, action).
//!   Entities live in a [`entity::Stage`] arena and are addressed by
//!   generational keys.
//! - **Physics**: [`physics::PhysicsWorld`] owns the single shared
//!   simulation instance and the active contact listener.
//! - **Events**: [`events::EventRegistry`] caches exactly one live
//!   [`events::GameEvent`] per event type and dispatches synchronously, in
//!   registration order.
//! - **Assembly**: [`assembly::EntityAssembler`] resolves component
//!   descriptors from configuration against an explicit
//!   [`assembly::ComponentRegistry`] and wires the results into physics and
//!   events.
//! - **Coordination**: [`engine::Engine`] drives the per-frame sequence:
//!   step the simulation, bridge contacts into game events, update entities,
//!   purge the terminated.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use letterfall_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = GameSettings::default();
//!     let mut engine = Engine::new(&settings);
//!
//!     let config: EntityConfig =
//!         ron::from_str(r#"(kind: Player, name: "player", position: (0.0, 2.0))"#)?;
//!     let player = engine.spawn_entity(&config)?;
//!
//!     engine.tick(1.0 / 60.0);
//!     let _ = player;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;

pub mod assembly;
pub mod assets;
pub mod component;
pub mod config;
pub mod entity;
pub mod events;
pub mod persistence;
pub mod physics;

mod context;
mod engine;

pub use context::GameContext;
pub use engine::Engine;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assembly::{AssemblyError, ComponentConfig, ComponentRegistry, EntityAssembler, EntityConfig},
        assets::{AssetCatalog, Drawable},
        component::{Component, ComponentId, ComponentKind},
        config::{Config, GameSettings},
        engine::Engine,
        entity::{Entity, EntityKey, EntityKind, Stage},
        events::{EventPayload, EventRegistry, GameEventType},
        foundation::{
            math::Vec2,
            time::{FixedStep, Timer},
        },
        persistence::{ScoreRecord, ScoreStore},
        physics::{ContactEvent, ContactListener, ContactPhase, PhysicsWorld},
        GameContext,
    };
}

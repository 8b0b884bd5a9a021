//! Runtime coordinator
//!
//! [`Engine`] owns the stage, the shared context and the assembler, and
//! drives the per-frame sequence on the single update thread: step the
//! simulation, bridge contacts through the active contact listener (which
//! raises typed game events), update every active entity (physics-backed
//! components sync transforms first), then purge terminated entities.

use crate::assembly::{AssemblyError, EntityAssembler, EntityConfig};
use crate::config::GameSettings;
use crate::context::GameContext;
use crate::entity::{EntityKey, Stage};
use crate::events::{EventPayload, GameEventType};
use crate::foundation::math::Vec2;
use crate::foundation::time::Timer;
use crate::physics::ContactPhase;

/// Coordinates the stage, the shared context and the frame sequence
pub struct Engine {
    stage: Stage,
    context: GameContext,
    assembler: EntityAssembler,
    timer: Timer,
}

impl Engine {
    /// Create an engine configured by the given settings
    pub fn new(settings: &GameSettings) -> Self {
        let mut context = GameContext::new();
        context
            .physics
            .set_gravity(Vec2::new(settings.gravity.0, settings.gravity.1));
        Self {
            stage: Stage::new(),
            context,
            assembler: EntityAssembler::new(),
            timer: Timer::new(),
        }
    }

    /// Create an engine with a custom assembler (e.g. game component types)
    pub fn with_assembler(settings: &GameSettings, assembler: EntityAssembler) -> Self {
        let mut engine = Self::new(settings);
        engine.assembler = assembler;
        engine
    }

    /// The entity stage
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Mutable access to the entity stage
    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    /// The shared runtime context
    pub fn context(&self) -> &GameContext {
        &self.context
    }

    /// Mutable access to the shared runtime context
    pub fn context_mut(&mut self) -> &mut GameContext {
        &mut self.context
    }

    /// The assembler used for entity construction
    pub fn assembler_mut(&mut self) -> &mut EntityAssembler {
        &mut self.assembler
    }

    /// Frame timing statistics
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Create an entity from configuration and assemble its components
    pub fn spawn_entity(&mut self, config: &EntityConfig) -> Result<EntityKey, AssemblyError> {
        let key = self.stage.spawn(
            config.kind,
            Vec2::new(config.position.0, config.position.1),
            Vec2::new(config.scale.0, config.scale.1),
        );
        let attached = self
            .assembler
            .assemble(config, key, &mut self.stage, &mut self.context)?;
        log::debug!(
            "assembled entity '{}' with {} component(s)",
            config.name,
            attached
        );
        Ok(key)
    }

    /// Re-assemble additional components onto an existing entity
    pub fn assemble_onto(
        &mut self,
        key: EntityKey,
        config: &EntityConfig,
    ) -> Result<usize, AssemblyError> {
        self.assembler
            .assemble(config, key, &mut self.stage, &mut self.context)
    }

    /// Remove an entity immediately, disposing its components
    pub fn despawn(&mut self, key: EntityKey) -> bool {
        let GameContext {
            physics, events, ..
        } = &mut self.context;
        self.stage.despawn(key, physics, events)
    }

    /// Publish an event to all subscribed components
    pub fn publish(&mut self, event_type: GameEventType, payload: EventPayload) -> usize {
        self.context.publish(event_type, payload, &mut self.stage)
    }

    /// Advance the game by one frame
    pub fn tick(&mut self, delta_time: f32) {
        self.timer.update();

        let contacts = self.context.physics.step(delta_time);
        if !contacts.is_empty() {
            // The listener is taken out for the duration so it can publish
            // events and mutate the world it is formally owned by.
            if let Some(mut listener) = self.context.physics.take_contact_listener() {
                for contact in &contacts {
                    match contact.phase {
                        ContactPhase::Begin => {
                            listener.begin_contact(contact, &mut self.stage, &mut self.context);
                        }
                        ContactPhase::End => {
                            listener.end_contact(contact, &mut self.stage, &mut self.context);
                        }
                    }
                }
                self.context.physics.set_contact_listener(listener);
            }
        }

        let GameContext {
            physics, events, ..
        } = &mut self.context;
        self.stage.update(physics, events, delta_time);
    }

    /// Tear down the current level: dispose all entities, then replace the
    /// simulation with a fresh one
    ///
    /// Entities are disposed first so every rigid body component releases
    /// its body before the world is discarded.
    pub fn reset_level(&mut self) {
        let GameContext {
            physics, events, ..
        } = &mut self.context;
        self.stage.clear(physics, events);
        self.context.physics.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use crate::events::MoveDirection;
    use crate::physics::{ContactEvent, ContactListener};

    /// Raises a ground-contact game event whenever terrain participates in
    /// a begin contact.
    struct TerrainBridge;

    impl ContactListener for TerrainBridge {
        fn begin_contact(
            &mut self,
            contact: &ContactEvent,
            stage: &mut Stage,
            context: &mut GameContext,
        ) {
            let (first, second) = contact.entities();
            for (candidate, other) in [(first, second), (second, first)] {
                let is_terrain = stage
                    .get(candidate)
                    .is_some_and(|e| e.kind() == EntityKind::Terrain);
                if is_terrain {
                    context.publish(
                        GameEventType::GroundContact,
                        EventPayload::GroundContact { entity: other },
                        stage,
                    );
                }
            }
        }
    }

    fn falling_item() -> EntityConfig {
        ron::from_str(
            r#"(
                kind: Item,
                name: "letter_a",
                position: (0.0, 2.0),
                components: [
                    (
                        id: 1,
                        type: physics,
                        name: "rigid_body",
                        subscriptions: ["ground_contact"],
                        params: (
                            bodies: {"default": [(shape: "cuboid", half_width: 0.3, half_height: 0.3)]},
                            fixed_rotation: true,
                            actions: [(id: 1, trigger: "ground_contact", kind: "halt")],
                        ),
                    ),
                    (
                        id: 2,
                        type: action,
                        name: "actions",
                        subscriptions: ["ground_contact"],
                        params: (actions: [(id: 1, trigger: "ground_contact", kind: "mark_grounded")]),
                    ),
                ],
            )"#,
        )
        .unwrap()
    }

    fn ground() -> EntityConfig {
        ron::from_str(
            r#"(
                kind: Terrain,
                name: "ground",
                position: (0.0, -1.0),
                components: [
                    (
                        id: 1,
                        type: physics,
                        name: "rigid_body",
                        params: (
                            bodies: {"default": [(shape: "cuboid", half_width: 20.0, half_height: 0.5)]},
                            body_type: "fixed",
                        ),
                    ),
                ],
            )"#,
        )
        .unwrap()
    }

    fn engine() -> Engine {
        let settings = GameSettings::new().with_gravity(0.0, -10.0);
        let mut engine = Engine::new(&settings);
        engine
            .context_mut()
            .physics
            .set_contact_listener(Box::new(TerrainBridge));
        engine
    }

    #[test]
    fn test_falling_item_receives_ground_contact() {
        let mut engine = engine();
        engine.spawn_entity(&ground()).unwrap();
        let item = engine.spawn_entity(&falling_item()).unwrap();
        assert_eq!(engine.context().physics.body_count(), 2);

        for _ in 0..240 {
            engine.tick(1.0 / 60.0);
        }

        let entity = engine.stage().get(item).unwrap();
        assert!(entity.is_on_ground(), "item never touched the ground");
        // The transform was synced from the simulation on the way down.
        assert!(entity.position().y < 2.0);
    }

    #[test]
    fn test_movement_event_drives_assembled_body() {
        let mut engine = engine();
        let config: EntityConfig = ron::from_str(
            r#"(
                kind: Player,
                name: "player",
                position: (0.0, 0.0),
                components: [
                    (
                        id: 1,
                        type: physics,
                        name: "rigid_body",
                        subscriptions: ["move"],
                        params: (
                            bodies: {"default": [(shape: "cuboid", half_width: 0.5, half_height: 0.5)]},
                            gravity_scale: 0.0,
                            actions: [(id: 1, trigger: "move", kind: "apply_movement")],
                        ),
                    ),
                ],
            )"#,
        )
        .unwrap();
        let player = engine.spawn_entity(&config).unwrap();

        let delivered = engine.publish(
            GameEventType::Move,
            EventPayload::Move {
                direction: MoveDirection::Right,
                speed: 3.0,
            },
        );
        assert_eq!(delivered, 1);

        for _ in 0..30 {
            engine.tick(1.0 / 60.0);
        }
        assert!(engine.stage().get(player).unwrap().position().x > 0.5);
    }

    #[test]
    fn test_terminated_entities_release_their_bodies() {
        let mut engine = engine();
        let item = engine.spawn_entity(&falling_item()).unwrap();
        assert_eq!(engine.context().physics.body_count(), 1);

        engine
            .stage_mut()
            .get_mut(item)
            .unwrap()
            .set_terminated(true);
        engine.tick(1.0 / 60.0);

        assert!(engine.stage().get(item).is_none());
        assert_eq!(engine.context().physics.body_count(), 0);
    }

    #[test]
    fn test_reset_level_leaves_a_fresh_world() {
        let mut engine = engine();
        engine.spawn_entity(&ground()).unwrap();
        engine.spawn_entity(&falling_item()).unwrap();

        engine.reset_level();

        assert!(engine.stage().is_empty());
        assert_eq!(engine.context().physics.body_count(), 0);
        assert_eq!(engine.context().physics.gravity(), Vec2::zeros());
        assert!(engine.context().physics.has_contact_listener());
    }
}

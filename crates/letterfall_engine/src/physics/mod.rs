//! Physics world manager: the single shared simulation instance
//!
//! [`PhysicsWorld`] owns the simulation and the active contact listener and
//! is the only path through which components register or deregister bodies.
//! The simulation must be stepped from the single designated update thread;
//! no other thread may mutate bodies concurrently with a step.

mod collision_layers;
mod contact;
mod shapes;

pub use collision_layers::CollisionLayers;
pub use contact::{BodyTag, ContactEvent, ContactListener, ContactPhase};
pub use shapes::{BodyShape, ColliderDef, ShapeCache, ShapeKind};

/// Opaque handle to a registered simulation body
pub use rapier2d::dynamics::RigidBodyHandle;

use crate::foundation::math::Vec2;
use contact::ContactCollector;
use rapier2d::prelude::{
    vector, ActiveEvents, CCDSolver, ColliderBuilder, ColliderSet, DefaultBroadPhase,
    ImpulseJointSet, IntegrationParameters, InteractionGroups, IslandManager, MultibodyJointSet,
    NarrowPhase, PhysicsPipeline, RigidBodyBuilder, RigidBodySet,
};
use std::collections::HashMap;

/// Motion type of a simulation body
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyType {
    /// Moved by forces and contacts
    Dynamic,
    /// Never moves (terrain)
    Fixed,
    /// Moved by velocity commands only
    KinematicVelocityBased,
}

impl BodyType {
    /// Resolve a body type from its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dynamic" => Some(Self::Dynamic),
            "fixed" => Some(Self::Fixed),
            "kinematic" => Some(Self::KinematicVelocityBased),
            _ => None,
        }
    }
}

/// Parameters for registering a new simulation body
#[derive(Debug, Clone)]
pub struct BodyDef {
    /// Motion type
    pub body_type: BodyType,
    /// Initial position in world units
    pub position: Vec2,
    /// Initial rotation in degrees
    pub rotation: f32,
    /// Whether the body's rotation is locked
    pub fixed_rotation: bool,
    /// Linear damping factor
    pub linear_damping: f32,
    /// Per-body gravity multiplier
    pub gravity_scale: f32,
    /// Layers this body belongs to
    pub layers: CollisionLayers,
    /// Layers this body interacts with
    pub mask: CollisionLayers,
}

impl Default for BodyDef {
    fn default() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position: Vec2::zeros(),
            rotation: 0.0,
            fixed_rotation: false,
            linear_damping: 0.0,
            gravity_scale: 1.0,
            layers: CollisionLayers::all(),
            mask: CollisionLayers::all(),
        }
    }
}

/// The single shared physical simulation instance
///
/// Exactly one instance exists at any time per [`GameContext`](crate::GameContext);
/// replacing it via [`PhysicsWorld::reset`] requires callers to dispose all
/// rigid body components first, since their handles refer to the discarded
/// world.
pub struct PhysicsWorld {
    gravity: Vec2,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    collector: ContactCollector,
    tags: HashMap<RigidBodyHandle, BodyTag>,
    contact_listener: Option<Box<dyn ContactListener>>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create a fresh simulation with default (zero) gravity
    pub fn new() -> Self {
        Self {
            gravity: Vec2::zeros(),
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            collector: ContactCollector::new(),
            tags: HashMap::new(),
            contact_listener: None,
        }
    }

    /// Current global gravity vector
    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// Set the global gravity; affects all bodies on the next step
    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    /// Advance the simulation by `delta_time` seconds
    ///
    /// Returns the contacts that began or ended during the step, resolved to
    /// the owning `(entity, component)` tags. Must only be called from the
    /// designated update thread.
    pub fn step(&mut self, delta_time: f32) -> Vec<ContactEvent> {
        self.integration_parameters.dt = delta_time;
        let gravity = vector![self.gravity.x, self.gravity.y];
        self.pipeline.step(
            &gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &self.collector,
        );
        self.collector.drain(&self.colliders)
    }

    /// Register a new body built from a body definition and shape
    ///
    /// Every collider is tagged with `tag` so contacts resolve back to the
    /// owning component. `scale` multiplies the shape extents and offsets.
    pub fn create_body(
        &mut self,
        def: &BodyDef,
        shape: &BodyShape,
        scale: Vec2,
        tag: BodyTag,
    ) -> RigidBodyHandle {
        let mut builder = match def.body_type {
            BodyType::Dynamic => RigidBodyBuilder::dynamic(),
            BodyType::Fixed => RigidBodyBuilder::fixed(),
            BodyType::KinematicVelocityBased => RigidBodyBuilder::kinematic_velocity_based(),
        };
        builder = builder
            .translation(vector![def.position.x, def.position.y])
            .rotation(def.rotation.to_radians())
            .linear_damping(def.linear_damping)
            .gravity_scale(def.gravity_scale);
        if def.fixed_rotation {
            builder = builder.lock_rotations();
        }
        let handle = self.bodies.insert(builder.build());

        for collider_def in &shape.colliders {
            let collider = match collider_def.shape {
                ShapeKind::Cuboid {
                    half_width,
                    half_height,
                } => ColliderBuilder::cuboid(half_width * scale.x, half_height * scale.y),
                ShapeKind::Ball { radius } => ColliderBuilder::ball(radius * scale.x.max(scale.y)),
            }
            .translation(vector![
                collider_def.offset.0 * scale.x,
                collider_def.offset.1 * scale.y
            ])
            .density(collider_def.density)
            .friction(collider_def.friction)
            .restitution(collider_def.restitution)
            .sensor(collider_def.sensor)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .collision_groups(InteractionGroups::new(
                def.layers.to_group(),
                def.mask.to_group(),
            ))
            .user_data(tag.pack())
            .build();
            self.colliders
                .insert_with_parent(collider, handle, &mut self.bodies);
        }

        self.tags.insert(handle, tag);
        handle
    }

    /// Deregister a body and its colliders
    ///
    /// Policy: never destroy from an empty world — if the world has zero
    /// bodies (or the handle is stale) this is a benign no-op returning
    /// `false`.
    pub fn destroy_body(&mut self, handle: RigidBodyHandle) -> bool {
        if self.bodies.len() == 0 {
            return false;
        }
        let removed = self
            .bodies
            .remove(
                handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some();
        if removed {
            self.tags.remove(&handle);
        }
        removed
    }

    /// Number of registered bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Query a body's position (world units) and rotation (radians)
    pub fn body_position(&self, handle: RigidBodyHandle) -> Option<(Vec2, f32)> {
        let body = self.bodies.get(handle)?;
        let translation = body.translation();
        Some((
            Vec2::new(translation.x, translation.y),
            body.rotation().angle(),
        ))
    }

    /// Query a body's linear velocity
    pub fn body_velocity(&self, handle: RigidBodyHandle) -> Option<Vec2> {
        let body = self.bodies.get(handle)?;
        let velocity = body.linvel();
        Some(Vec2::new(velocity.x, velocity.y))
    }

    /// Set a body's linear velocity, waking it
    ///
    /// Returns `false` if the handle no longer resolves.
    pub fn set_body_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec2) -> bool {
        match self.bodies.get_mut(handle) {
            Some(body) => {
                body.set_linvel(vector![velocity.x, velocity.y], true);
                true
            }
            None => false,
        }
    }

    /// First registered body owned by the given entity, if any
    pub fn body_of(&self, entity: crate::entity::EntityKey) -> Option<RigidBodyHandle> {
        self.tags
            .iter()
            .find(|(_, tag)| tag.entity == entity)
            .map(|(handle, _)| *handle)
    }

    /// The tag a body was registered with
    pub fn body_tag(&self, handle: RigidBodyHandle) -> Option<BodyTag> {
        self.tags.get(&handle).copied()
    }

    /// Install the active contact listener
    ///
    /// At most one listener is active; setting a new one replaces the old
    /// one without notifying it of removal.
    pub fn set_contact_listener(&mut self, listener: Box<dyn ContactListener>) {
        self.contact_listener = Some(listener);
    }

    /// The currently installed contact listener, if any
    pub fn contact_listener(&self) -> Option<&dyn ContactListener> {
        self.contact_listener.as_deref()
    }

    /// Whether a contact listener is installed
    pub fn has_contact_listener(&self) -> bool {
        self.contact_listener.is_some()
    }

    /// Temporarily remove the contact listener (the runtime does this while
    /// driving it, so the listener may mutate the world)
    pub fn take_contact_listener(&mut self) -> Option<Box<dyn ContactListener>> {
        self.contact_listener.take()
    }

    /// Discard the simulation and construct a fresh one with default gravity
    ///
    /// Any component still holding a body handle from the old world is in an
    /// invalid state; callers (e.g. level reload) must dispose all rigid
    /// body components first. The installed contact listener is retained.
    pub fn reset(&mut self) {
        self.gravity = Vec2::zeros();
        self.integration_parameters = IntegrationParameters::default();
        self.pipeline = PhysicsPipeline::new();
        self.islands = IslandManager::new();
        self.broad_phase = DefaultBroadPhase::new();
        self.narrow_phase = NarrowPhase::new();
        self.bodies = RigidBodySet::new();
        self.colliders = ColliderSet::new();
        self.impulse_joints = ImpulseJointSet::new();
        self.multibody_joints = MultibodyJointSet::new();
        self.ccd_solver = CCDSolver::new();
        self.collector.clear();
        self.tags.clear();
    }

    /// Alias for [`PhysicsWorld::reset`], kept for lifecycle symmetry with
    /// the other managers
    pub fn dispose(&mut self) {
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentId;
    use crate::entity::{EntityKey, EntityKind, Stage};
    use crate::events::EventRegistry;
    use crate::GameContext;
    use approx::assert_relative_eq;

    fn tag(entity: EntityKey, component: u32) -> BodyTag {
        BodyTag {
            entity,
            component: ComponentId::new(component),
        }
    }

    fn ball(radius: f32) -> BodyShape {
        BodyShape {
            colliders: vec![ColliderDef {
                shape: ShapeKind::Ball { radius },
                offset: (0.0, 0.0),
                density: 1.0,
                friction: 0.0,
                restitution: 0.0,
                sensor: false,
            }],
        }
    }

    fn spawn_key(stage: &mut Stage) -> EntityKey {
        stage.spawn(EntityKind::Item, Vec2::zeros(), Vec2::new(1.0, 1.0))
    }

    #[test]
    fn test_fresh_world_is_empty_with_zero_gravity() {
        let world = PhysicsWorld::new();
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.gravity(), Vec2::zeros());
        assert!(!world.has_contact_listener());
    }

    #[test]
    fn test_create_and_destroy_body() {
        let mut stage = Stage::new();
        let mut world = PhysicsWorld::new();
        let key = spawn_key(&mut stage);

        let handle = world.create_body(&BodyDef::default(), &ball(0.5), Vec2::new(1.0, 1.0), tag(key, 1));
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.body_of(key), Some(handle));

        assert!(world.destroy_body(handle));
        assert_eq!(world.body_count(), 0);
        assert!(world.body_of(key).is_none());
    }

    #[test]
    fn test_destroy_from_empty_world_is_noop() {
        let mut stage = Stage::new();
        let mut world = PhysicsWorld::new();
        let key = spawn_key(&mut stage);

        let handle = world.create_body(&BodyDef::default(), &ball(0.5), Vec2::new(1.0, 1.0), tag(key, 1));
        assert!(world.destroy_body(handle));

        // World now has zero bodies: a second destroy must not fault.
        assert!(!world.destroy_body(handle));
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_dynamic_body_falls_under_gravity() {
        let mut stage = Stage::new();
        let mut world = PhysicsWorld::new();
        world.set_gravity(Vec2::new(0.0, -10.0));
        let key = spawn_key(&mut stage);

        let def = BodyDef {
            position: Vec2::new(0.0, 10.0),
            ..BodyDef::default()
        };
        let handle = world.create_body(&def, &ball(0.5), Vec2::new(1.0, 1.0), tag(key, 1));

        for _ in 0..60 {
            world.step(1.0 / 60.0);
        }

        let (position, _) = world.body_position(handle).unwrap();
        assert!(position.y < 10.0, "body did not fall: y = {}", position.y);
    }

    #[test]
    fn test_velocity_round_trip() {
        let mut stage = Stage::new();
        let mut world = PhysicsWorld::new();
        let key = spawn_key(&mut stage);

        let handle = world.create_body(&BodyDef::default(), &ball(0.5), Vec2::new(1.0, 1.0), tag(key, 1));
        assert!(world.set_body_velocity(handle, Vec2::new(3.0, 0.0)));

        let velocity = world.body_velocity(handle).unwrap();
        assert_relative_eq!(velocity.x, 3.0);
        assert_relative_eq!(velocity.y, 0.0);
    }

    #[test]
    fn test_overlapping_sensors_report_contact_begin() {
        let mut stage = Stage::new();
        let mut world = PhysicsWorld::new();
        let first = spawn_key(&mut stage);
        let second = spawn_key(&mut stage);

        let sensor = BodyShape {
            colliders: vec![ColliderDef {
                shape: ShapeKind::Ball { radius: 0.5 },
                offset: (0.0, 0.0),
                density: 1.0,
                friction: 0.0,
                restitution: 0.0,
                sensor: true,
            }],
        };
        world.create_body(&BodyDef::default(), &sensor, Vec2::new(1.0, 1.0), tag(first, 1));
        world.create_body(&BodyDef::default(), &sensor, Vec2::new(1.0, 1.0), tag(second, 2));

        let contacts = world.step(1.0 / 60.0);
        let begin = contacts
            .iter()
            .find(|c| c.phase == ContactPhase::Begin)
            .expect("overlapping sensors must report a begin contact");
        assert!(begin.involves(first));
        assert!(begin.involves(second));
    }

    #[test]
    fn test_reset_discards_bodies_and_keeps_listener() {
        struct Quiet;
        impl ContactListener for Quiet {
            fn begin_contact(&mut self, _: &ContactEvent, _: &mut Stage, _: &mut GameContext) {}
        }

        let mut stage = Stage::new();
        let mut events = EventRegistry::new();
        let mut world = PhysicsWorld::new();
        let key = spawn_key(&mut stage);

        world.set_gravity(Vec2::new(0.0, -9.8));
        world.set_contact_listener(Box::new(Quiet));
        world.create_body(&BodyDef::default(), &ball(0.5), Vec2::new(1.0, 1.0), tag(key, 1));

        // Caller contract: dispose body-holding components before reset.
        stage.clear(&mut world, &mut events);
        world.reset();

        assert_eq!(world.body_count(), 0);
        assert_eq!(world.gravity(), Vec2::zeros());
        assert!(world.has_contact_listener());
    }
}

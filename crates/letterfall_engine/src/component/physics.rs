//! Rigid body component: the bridge between an entity and the simulation
//!
//! Owns exactly one simulation body plus a cache of named body definitions;
//! every tick it syncs the owning entity's position and rotation from the
//! body. Disposal deregisters the body (never from an empty world) and
//! clears the shape cache, so nothing leaks across level reloads.

use super::action::{resolve_actions, ActionParams};
use super::{Component, ComponentCore, ComponentError, ComponentId, ComponentKind, GameAction};
use crate::assembly::{AssemblyError, ComponentConfig};
use crate::entity::{Entity, EntityKey};
use crate::events::{EventPayload, EventRegistry, GameEventType, ListenerHandle, MoveDirection};
use crate::foundation::math::Vec2;
use crate::physics::{
    BodyDef, BodyShape, BodyTag, BodyType, ColliderDef, CollisionLayers, PhysicsWorld,
    RigidBodyHandle, ShapeCache, ShapeKind,
};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct RigidBodyColliderParams {
    shape: String,
    #[serde(default)]
    half_width: f32,
    #[serde(default)]
    half_height: f32,
    #[serde(default)]
    radius: f32,
    #[serde(default)]
    offset: (f32, f32),
    #[serde(default = "default_density")]
    density: f32,
    #[serde(default)]
    friction: f32,
    #[serde(default)]
    restitution: f32,
    #[serde(default)]
    sensor: bool,
}

fn default_density() -> f32 {
    1.0
}

fn default_gravity_scale() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
struct RigidBodyParams {
    bodies: HashMap<String, Vec<RigidBodyColliderParams>>,
    #[serde(default)]
    active_body: Option<String>,
    #[serde(default)]
    body_type: Option<String>,
    #[serde(default)]
    fixed_rotation: bool,
    #[serde(default)]
    linear_damping: f32,
    #[serde(default = "default_gravity_scale")]
    gravity_scale: f32,
    #[serde(default)]
    layers: Vec<String>,
    #[serde(default)]
    mask: Vec<String>,
    #[serde(default)]
    actions: Vec<ActionParams>,
}

fn collider_from_params(
    params: &RigidBodyColliderParams,
    component: &str,
) -> Result<ColliderDef, AssemblyError> {
    let shape = match params.shape.as_str() {
        "cuboid" => {
            if params.half_width <= 0.0 || params.half_height <= 0.0 {
                return Err(AssemblyError::InvalidParams {
                    name: component.to_string(),
                    reason: "cuboid colliders need positive half extents".into(),
                });
            }
            ShapeKind::Cuboid {
                half_width: params.half_width,
                half_height: params.half_height,
            }
        }
        "ball" => {
            if params.radius <= 0.0 {
                return Err(AssemblyError::InvalidParams {
                    name: component.to_string(),
                    reason: "ball colliders need a positive radius".into(),
                });
            }
            ShapeKind::Ball {
                radius: params.radius,
            }
        }
        other => {
            return Err(AssemblyError::InvalidParams {
                name: component.to_string(),
                reason: format!("unknown collider shape '{other}'"),
            })
        }
    };
    Ok(ColliderDef {
        shape,
        offset: params.offset,
        density: params.density,
        friction: params.friction,
        restitution: params.restitution,
        sensor: params.sensor,
    })
}

/// Physics component owning one simulation body and its shape cache
pub struct RigidBodyComponent {
    core: ComponentCore,
    body_keys: Vec<String>,
    active_body: String,
    shape_cache: ShapeCache,
    def: BodyDef,
    body: Option<RigidBodyHandle>,
    velocity: Vec2,
    flipped: bool,
}

impl RigidBodyComponent {
    /// Build from a component descriptor and register the body with the
    /// shared world at the entity's current position
    pub fn from_config(
        config: &ComponentConfig,
        entity: &Entity,
        physics: &mut PhysicsWorld,
    ) -> Result<Self, AssemblyError> {
        let params: RigidBodyParams = config.params()?;
        if params.bodies.is_empty() {
            return Err(AssemblyError::InvalidParams {
                name: config.name.clone(),
                reason: "at least one body definition is required".into(),
            });
        }

        let mut shape_cache = ShapeCache::new();
        for (name, colliders) in &params.bodies {
            let colliders = colliders
                .iter()
                .map(|c| collider_from_params(c, &config.name))
                .collect::<Result<Vec<_>, _>>()?;
            shape_cache.insert(name.clone(), BodyShape { colliders });
        }
        let mut body_keys: Vec<String> = params.bodies.keys().cloned().collect();
        body_keys.sort();

        let active_body = match params.active_body {
            Some(name) => name,
            None if body_keys.len() == 1 => body_keys[0].clone(),
            None => {
                return Err(AssemblyError::InvalidParams {
                    name: config.name.clone(),
                    reason: "active_body is required when several bodies are defined".into(),
                })
            }
        };
        let shape = shape_cache
            .get(&active_body)
            .ok_or_else(|| AssemblyError::InvalidParams {
                name: config.name.clone(),
                reason: format!("active body '{active_body}' is not defined"),
            })?
            .clone();

        let body_type = match params.body_type.as_deref() {
            None => BodyType::Dynamic,
            Some(name) => {
                BodyType::from_name(name).ok_or_else(|| AssemblyError::InvalidParams {
                    name: config.name.clone(),
                    reason: format!("unknown body type '{name}'"),
                })?
            }
        };
        let def = BodyDef {
            body_type,
            position: entity.position(),
            rotation: entity.rotation(),
            fixed_rotation: params.fixed_rotation,
            linear_damping: params.linear_damping,
            gravity_scale: params.gravity_scale,
            layers: if params.layers.is_empty() {
                CollisionLayers::all()
            } else {
                CollisionLayers::from_names(&params.layers)
            },
            mask: if params.mask.is_empty() {
                CollisionLayers::all()
            } else {
                CollisionLayers::from_names(&params.mask)
            },
        };

        let id = ComponentId::new(config.id);
        let handle = physics.create_body(
            &def,
            &shape,
            entity.scale(),
            BodyTag {
                entity: entity.key(),
                component: id,
            },
        );

        let mut core = ComponentCore::new(id, ComponentKind::Physics);
        for action in resolve_actions(params.actions, &config.name)? {
            core.add_action(action);
        }

        Ok(Self {
            core,
            body_keys,
            active_body,
            shape_cache,
            def,
            body: Some(handle),
            velocity: Vec2::zeros(),
            flipped: false,
        })
    }

    /// Boxed factory used by the component registry
    pub fn build(
        config: &ComponentConfig,
        entity: &Entity,
        physics: &mut PhysicsWorld,
    ) -> Result<Box<dyn Component>, AssemblyError> {
        Ok(Box::new(Self::from_config(config, entity, physics)?))
    }

    /// The simulation body handle, while the component is live
    pub fn body(&self) -> Option<RigidBodyHandle> {
        self.body
    }

    /// Names of all cached body definitions
    pub fn body_keys(&self) -> &[String] {
        &self.body_keys
    }

    /// The active body definition's name
    pub fn active_body_name(&self) -> &str {
        &self.active_body
    }

    /// The cached body definitions
    pub fn shape_cache(&self) -> &ShapeCache {
        &self.shape_cache
    }

    /// Velocity observed at the last update
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Current facing (true when looking left)
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Set the facing state
    pub fn set_flipped(&mut self, flipped: bool) {
        self.flipped = flipped;
    }

    /// Swap the simulation body for another cached definition
    ///
    /// The current body is destroyed and a replacement is created at the
    /// parent's current position.
    pub fn activate_body(
        &mut self,
        name: &str,
        parent: &Entity,
        physics: &mut PhysicsWorld,
    ) -> Result<(), ComponentError> {
        if self.core.is_disposed() {
            return Err(ComponentError::Disposed);
        }
        let shape = self
            .shape_cache
            .get(name)
            .cloned()
            .ok_or_else(|| ComponentError::ActionFailed {
                id: 0,
                reason: format!("no body definition named '{name}'"),
            })?;
        if let Some(handle) = self.body.take() {
            physics.destroy_body(handle);
        }
        self.def.position = parent.position();
        self.def.rotation = parent.rotation();
        let handle = physics.create_body(
            &self.def,
            &shape,
            parent.scale(),
            BodyTag {
                entity: parent.key(),
                component: self.core.id(),
            },
        );
        self.body = Some(handle);
        self.active_body = name.to_string();
        Ok(())
    }
}

impl Component for RigidBodyComponent {
    fn id(&self) -> ComponentId {
        self.core.id()
    }

    fn kind(&self) -> ComponentKind {
        self.core.kind()
    }

    fn parent(&self) -> Option<EntityKey> {
        self.core.parent()
    }

    fn set_parent(&mut self, parent: EntityKey) {
        self.core.set_parent(parent);
    }

    fn update(&mut self, parent: &mut Entity, physics: &mut PhysicsWorld, delta_time: f32) {
        if self.core.is_disposed() {
            return;
        }
        if let Some(handle) = self.body {
            if let Some((position, angle)) = physics.body_position(handle) {
                parent.set_rotation(angle.to_degrees());
                parent.set_position(position);
            }
            if let Some(velocity) = physics.body_velocity(handle) {
                self.velocity = velocity;
            }
        }
        self.core.update_children(parent, physics, delta_time);
    }

    fn dispose(&mut self, physics: &mut PhysicsWorld, events: &mut EventRegistry) {
        if !self.core.mark_disposed() {
            return;
        }
        self.core.dispose_children(physics, events);
        self.core.unsubscribe_all(events);
        if let Some(handle) = self.body.take() {
            if !physics.destroy_body(handle) {
                log::debug!("rigid body {} was already removed from the world", self.core.id());
            }
        }
        self.shape_cache.clear();
    }

    fn actions(&self) -> &[GameAction] {
        self.core.actions()
    }

    fn add_action(&mut self, action: GameAction) {
        self.core.add_action(action);
    }

    fn remove_action(&mut self, action_id: u32) -> bool {
        self.core.remove_action(action_id)
    }

    fn subscriptions(&self) -> &[(GameEventType, ListenerHandle)] {
        self.core.subscriptions()
    }

    fn note_subscription(&mut self, event_type: GameEventType, handle: ListenerHandle) {
        self.core.note_subscription(event_type, handle);
    }

    fn add_child(&mut self, child: Box<dyn Component>) {
        self.core.add_child(child);
    }

    fn has_child(&self, id: ComponentId) -> bool {
        self.core.has_child(id)
    }

    fn child(&self, id: ComponentId) -> Option<&dyn Component> {
        self.core.child(id)
    }

    fn child_mut(&mut self, id: ComponentId) -> Option<&mut dyn Component> {
        self.core.child_mut(id)
    }

    fn on_event(
        &mut self,
        event_type: GameEventType,
        payload: &EventPayload,
        parent: &mut Entity,
        physics: &mut PhysicsWorld,
    ) -> Result<(), ComponentError> {
        if self.core.is_disposed() {
            return Err(ComponentError::Disposed);
        }
        self.core
            .apply_actions(event_type, payload, parent, physics)?;
        if let EventPayload::Move { direction, .. } = payload {
            match direction {
                MoveDirection::Left => self.flipped = true,
                MoveDirection::Right => self.flipped = false,
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityKind, Stage};
    use approx::assert_relative_eq;

    fn rigid_body_config(id: u32) -> ComponentConfig {
        ron::from_str(&format!(
            r#"(
                id: {id},
                kind: physics,
                name: "rigid_body",
                params: (
                    bodies: {{
                        "default": [
                            (shape: "cuboid", half_width: 0.5, half_height: 0.5),
                        ],
                        "crouched": [
                            (shape: "ball", radius: 0.3),
                        ],
                    }},
                    active_body: "default",
                ),
            )"#
        ))
        .unwrap()
    }

    fn fixture() -> (Stage, PhysicsWorld, EventRegistry) {
        (Stage::new(), PhysicsWorld::new(), EventRegistry::new())
    }

    #[test]
    fn test_body_is_registered_at_entity_position() {
        let (mut stage, mut physics, _) = fixture();
        let key = stage.spawn(EntityKind::Player, Vec2::new(2.0, 5.0), Vec2::new(1.0, 1.0));

        let entity = stage.get(key).unwrap();
        let component =
            RigidBodyComponent::from_config(&rigid_body_config(1), entity, &mut physics).unwrap();

        assert_eq!(physics.body_count(), 1);
        assert_eq!(component.body_keys(), ["crouched", "default"]);
        assert_eq!(component.active_body_name(), "default");

        let (position, _) = physics.body_position(component.body().unwrap()).unwrap();
        assert_relative_eq!(position.x, 2.0);
        assert_relative_eq!(position.y, 5.0);
    }

    #[test]
    fn test_update_syncs_parent_transform_from_body() {
        let (mut stage, mut physics, _) = fixture();
        physics.set_gravity(Vec2::new(0.0, -10.0));
        let key = stage.spawn(EntityKind::Item, Vec2::new(0.0, 8.0), Vec2::new(1.0, 1.0));

        let mut component = {
            let entity = stage.get(key).unwrap();
            RigidBodyComponent::from_config(&rigid_body_config(1), entity, &mut physics).unwrap()
        };
        component.set_parent(key);

        for _ in 0..30 {
            physics.step(1.0 / 60.0);
        }
        let entity = stage.get_mut(key).unwrap();
        component.update(entity, &mut physics, 1.0 / 60.0);

        assert!(entity.position().y < 8.0);
        assert!(component.velocity().y < 0.0);
    }

    #[test]
    fn test_dispose_removes_exactly_one_body_and_is_idempotent() {
        let (mut stage, mut physics, mut events) = fixture();
        let key = stage.spawn(EntityKind::Item, Vec2::zeros(), Vec2::new(1.0, 1.0));

        let mut component = {
            let entity = stage.get(key).unwrap();
            RigidBodyComponent::from_config(&rigid_body_config(1), entity, &mut physics).unwrap()
        };
        assert_eq!(physics.body_count(), 1);

        component.dispose(&mut physics, &mut events);
        assert_eq!(physics.body_count(), 0);
        assert!(component.body().is_none());
        assert!(component.shape_cache().is_empty());

        component.dispose(&mut physics, &mut events);
        assert_eq!(physics.body_count(), 0);
    }

    #[test]
    fn test_dispose_after_world_reset_is_benign() {
        let (mut stage, mut physics, mut events) = fixture();
        let key = stage.spawn(EntityKind::Item, Vec2::zeros(), Vec2::new(1.0, 1.0));

        let mut component = {
            let entity = stage.get(key).unwrap();
            RigidBodyComponent::from_config(&rigid_body_config(1), entity, &mut physics).unwrap()
        };

        // Caller contract violation tolerated: the world was reset while the
        // component still held its old handle. Disposal must not fault.
        physics.reset();
        component.dispose(&mut physics, &mut events);
        assert_eq!(physics.body_count(), 0);
    }

    #[test]
    fn test_activate_body_swaps_the_simulation_body() {
        let (mut stage, mut physics, _) = fixture();
        let key = stage.spawn(EntityKind::Player, Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0));

        let mut component = {
            let entity = stage.get(key).unwrap();
            RigidBodyComponent::from_config(&rigid_body_config(1), entity, &mut physics).unwrap()
        };
        let first = component.body().unwrap();

        let entity = stage.get(key).unwrap();
        component
            .activate_body("crouched", entity, &mut physics)
            .unwrap();

        assert_eq!(physics.body_count(), 1);
        assert_eq!(component.active_body_name(), "crouched");
        assert_ne!(component.body().unwrap(), first);
    }

    #[test]
    fn test_multiple_bodies_require_explicit_active_body() {
        let (mut stage, mut physics, _) = fixture();
        let key = stage.spawn(EntityKind::Player, Vec2::zeros(), Vec2::new(1.0, 1.0));

        let config: ComponentConfig = ron::from_str(
            r#"(
                id: 1,
                kind: physics,
                name: "rigid_body",
                params: (
                    bodies: {
                        "a": [(shape: "ball", radius: 0.5)],
                        "b": [(shape: "ball", radius: 0.7)],
                    },
                ),
            )"#,
        )
        .unwrap();
        let entity = stage.get(key).unwrap();
        let result = RigidBodyComponent::from_config(&config, entity, &mut physics);
        assert!(matches!(result, Err(AssemblyError::InvalidParams { .. })));
        assert_eq!(physics.body_count(), 0);
    }
}

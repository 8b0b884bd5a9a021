//! Entities: positioned game objects composed of components
//!
//! An entity holds a transform, activity flags and an ordered collection of
//! owned components. Entities never look inside their components; they only
//! hold, iterate and dispose them. The physics-backed component syncs the
//! entity transform from the simulation every tick.

mod stage;

pub use stage::Stage;

use crate::component::{Component, ComponentError, ComponentId};
use crate::events::{EventPayload, EventRegistry, GameEventType};
use crate::foundation::math::Vec2;
use crate::physics::PhysicsWorld;

slotmap::new_key_type! {
    /// Generational key addressing an entity on the [`Stage`]
    ///
    /// Used as the non-owning back-reference from components and event
    /// listeners; a key whose entity has been removed simply fails to
    /// resolve.
    pub struct EntityKey;
}

/// Category of a game entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EntityKind {
    /// The player character
    Player,
    /// A collectible item (e.g. a falling letter)
    Item,
    /// Static level geometry
    Terrain,
    /// Screen-space overlay elements
    Hud,
}

/// A positioned, composed game object owning an ordered component list
pub struct Entity {
    key: EntityKey,
    kind: EntityKind,
    position: Vec2,
    rotation: f32,
    scale: Vec2,
    size: Vec2,
    active: bool,
    terminated: bool,
    on_ground: bool,
    components: Vec<Box<dyn Component>>,
}

impl Entity {
    pub(crate) fn new(key: EntityKey, kind: EntityKind, position: Vec2, scale: Vec2) -> Self {
        Self {
            key,
            kind,
            position,
            rotation: 0.0,
            scale,
            size: Vec2::zeros(),
            active: true,
            terminated: false,
            on_ground: false,
            components: Vec::new(),
        }
    }

    /// The entity's key on the stage
    pub fn key(&self) -> EntityKey {
        self.key
    }

    /// The entity's category
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Current position in world units
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Set the position in world units
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Current rotation in degrees
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Set the rotation in degrees
    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
    }

    /// Current scale factors
    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    /// Set the scale factors
    pub fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
    }

    /// Visual size in world units, as established by the graphics components
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Set the visual size in world units
    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    /// Whether the entity participates in updates
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enable or disable updates for this entity
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Whether the entity is marked for removal
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Mark the entity for removal at the end of the frame
    pub fn set_terminated(&mut self, terminated: bool) {
        self.terminated = terminated;
    }

    /// Whether the entity currently touches the ground
    pub fn is_on_ground(&self) -> bool {
        self.on_ground
    }

    /// Set the ground-contact flag
    pub fn set_on_ground(&mut self, on_ground: bool) {
        self.on_ground = on_ground;
    }

    /// Number of directly owned components
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Identifiers of the directly owned components, in attachment order
    pub fn component_ids(&self) -> Vec<ComponentId> {
        self.components.iter().map(|c| c.id()).collect()
    }

    /// Whether a component with the given id exists anywhere in this entity
    /// (including nested children)
    pub fn has_component(&self, id: ComponentId) -> bool {
        self.components
            .iter()
            .any(|c| c.id() == id || c.has_child(id))
    }

    /// Look up a component by id, searching nested children too
    pub fn component(&self, id: ComponentId) -> Option<&dyn Component> {
        for component in &self.components {
            if component.id() == id {
                return Some(component.as_ref());
            }
            if let Some(child) = component.child(id) {
                return Some(child);
            }
        }
        None
    }

    /// Append a component to the ordered collection
    ///
    /// The component should already be parented to this entity; attachment
    /// order is preserved for updates and assembly semantics.
    pub fn add_component(&mut self, component: Box<dyn Component>) {
        self.components.push(component);
    }

    /// Update all owned components with the elapsed frame time
    pub fn update(&mut self, physics: &mut PhysicsWorld, delta_time: f32) {
        if !self.active || self.terminated {
            return;
        }
        let mut components = std::mem::take(&mut self.components);
        for component in &mut components {
            component.update(self, physics, delta_time);
        }
        // Keep anything a component attached while the list was detached.
        let added = std::mem::take(&mut self.components);
        self.components = components;
        self.components.extend(added);
    }

    /// Deliver an event to one owned component (searching nested children)
    ///
    /// Returns `None` if no such component is attached.
    pub fn deliver(
        &mut self,
        component: ComponentId,
        event_type: GameEventType,
        payload: &EventPayload,
        physics: &mut PhysicsWorld,
    ) -> Option<Result<(), ComponentError>> {
        let mut components = std::mem::take(&mut self.components);
        let result = Self::find_in(&mut components, component)
            .map(|target| target.on_event(event_type, payload, self, physics));
        let added = std::mem::take(&mut self.components);
        self.components = components;
        self.components.extend(added);
        result
    }

    /// Dispose every owned component (simulation bodies, caches, children)
    ///
    /// Idempotent: the component list is drained, so a second call is a
    /// no-op.
    pub fn dispose_components(&mut self, physics: &mut PhysicsWorld, events: &mut EventRegistry) {
        while !self.components.is_empty() {
            let mut components = std::mem::take(&mut self.components);
            for component in &mut components {
                component.dispose(physics, events);
            }
        }
    }

    fn find_in(
        components: &mut [Box<dyn Component>],
        id: ComponentId,
    ) -> Option<&mut dyn Component> {
        let index = components
            .iter()
            .position(|c| c.id() == id || c.has_child(id))?;
        let component = components[index].as_mut();
        if component.id() == id {
            Some(component)
        } else {
            component.child_mut(id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentCore, ComponentKind, GameAction};
    use crate::events::ListenerHandle;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Counting {
        core: ComponentCore,
        updates: Rc<RefCell<u32>>,
        disposals: Rc<RefCell<u32>>,
    }

    impl Component for Counting {
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
        fn update(&mut self, _parent: &mut Entity, _physics: &mut PhysicsWorld, _dt: f32) {
            *self.updates.borrow_mut() += 1;
        }
        fn dispose(&mut self, _physics: &mut PhysicsWorld, events: &mut EventRegistry) {
            if self.core.mark_disposed() {
                self.core.unsubscribe_all(events);
                *self.disposals.borrow_mut() += 1;
            }
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
    }

    fn counting(
        id: u32,
        updates: &Rc<RefCell<u32>>,
        disposals: &Rc<RefCell<u32>>,
    ) -> Box<dyn Component> {
        Box::new(Counting {
            core: ComponentCore::new(ComponentId::new(id), ComponentKind::Action),
            updates: Rc::clone(updates),
            disposals: Rc::clone(disposals),
        })
    }

    #[test]
    fn test_update_skips_inactive_entities() {
        let mut stage = Stage::new();
        let mut physics = PhysicsWorld::new();
        let updates = Rc::new(RefCell::new(0));
        let disposals = Rc::new(RefCell::new(0));

        let key = stage.spawn(EntityKind::Item, Vec2::zeros(), Vec2::new(1.0, 1.0));
        let entity = stage.get_mut(key).unwrap();
        entity.add_component(counting(1, &updates, &disposals));

        entity.update(&mut physics, 0.016);
        assert_eq!(*updates.borrow(), 1);

        entity.set_active(false);
        entity.update(&mut physics, 0.016);
        assert_eq!(*updates.borrow(), 1);
    }

    #[test]
    fn test_dispose_components_is_idempotent() {
        let mut stage = Stage::new();
        let mut physics = PhysicsWorld::new();
        let mut events = EventRegistry::new();
        let updates = Rc::new(RefCell::new(0));
        let disposals = Rc::new(RefCell::new(0));

        let key = stage.spawn(EntityKind::Item, Vec2::zeros(), Vec2::new(1.0, 1.0));
        let entity = stage.get_mut(key).unwrap();
        entity.add_component(counting(1, &updates, &disposals));
        entity.add_component(counting(2, &updates, &disposals));

        entity.dispose_components(&mut physics, &mut events);
        entity.dispose_components(&mut physics, &mut events);

        assert_eq!(*disposals.borrow(), 2);
        assert_eq!(entity.component_count(), 0);
    }

    #[test]
    fn test_component_lookup_and_order() {
        let mut stage = Stage::new();
        let updates = Rc::new(RefCell::new(0));
        let disposals = Rc::new(RefCell::new(0));

        let key = stage.spawn(EntityKind::Player, Vec2::zeros(), Vec2::new(1.0, 1.0));
        let entity = stage.get_mut(key).unwrap();
        for id in [5, 3, 8] {
            entity.add_component(counting(id, &updates, &disposals));
        }

        assert_eq!(
            entity.component_ids(),
            vec![ComponentId::new(5), ComponentId::new(3), ComponentId::new(8)]
        );
        assert!(entity.has_component(ComponentId::new(3)));
        assert!(!entity.has_component(ComponentId::new(4)));
        assert!(entity.component(ComponentId::new(8)).is_some());
    }
}

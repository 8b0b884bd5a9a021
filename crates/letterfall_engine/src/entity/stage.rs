//! Stage: the arena owning all live entities

use super::{Entity, EntityKey, EntityKind};
use crate::events::EventRegistry;
use crate::foundation::math::Vec2;
use crate::physics::PhysicsWorld;
use slotmap::SlotMap;

/// Arena of live entities, addressed by generational [`EntityKey`]s
///
/// The stage drives the per-frame component updates and removes terminated
/// entities at the end of each pass, disposing their components first so
/// simulation bodies and caches are released.
#[derive(Default)]
pub struct Stage {
    entities: SlotMap<EntityKey, Entity>,
}

impl Stage {
    /// Create an empty stage
    pub fn new() -> Self {
        Self {
            entities: SlotMap::with_key(),
        }
    }

    /// Create a new entity and return its key
    pub fn spawn(&mut self, kind: EntityKind, position: Vec2, scale: Vec2) -> EntityKey {
        self.entities
            .insert_with_key(|key| Entity::new(key, kind, position, scale))
    }

    /// Look up an entity
    pub fn get(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    /// Look up an entity mutably
    pub fn get_mut(&mut self, key: EntityKey) -> Option<&mut Entity> {
        self.entities.get_mut(key)
    }

    /// Whether the key still resolves to a live entity
    pub fn contains(&self, key: EntityKey) -> bool {
        self.entities.contains_key(key)
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the stage holds no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Keys of all live entities
    pub fn keys(&self) -> Vec<EntityKey> {
        self.entities.keys().collect()
    }

    /// Iterate over all live entities
    pub fn iter(&self) -> impl Iterator<Item = (EntityKey, &Entity)> {
        self.entities.iter()
    }

    /// Update every active entity, then purge terminated ones
    pub fn update(
        &mut self,
        physics: &mut PhysicsWorld,
        events: &mut EventRegistry,
        delta_time: f32,
    ) {
        for key in self.keys() {
            if let Some(entity) = self.entities.get_mut(key) {
                entity.update(physics, delta_time);
            }
        }
        self.purge(physics, events);
    }

    /// Remove all terminated entities, disposing their components
    pub fn purge(&mut self, physics: &mut PhysicsWorld, events: &mut EventRegistry) {
        let terminated: Vec<EntityKey> = self
            .entities
            .iter()
            .filter(|(_, entity)| entity.is_terminated())
            .map(|(key, _)| key)
            .collect();
        for key in terminated {
            self.despawn(key, physics, events);
        }
    }

    /// Remove one entity immediately, disposing its components
    ///
    /// Returns `false` if the key no longer resolves.
    pub fn despawn(
        &mut self,
        key: EntityKey,
        physics: &mut PhysicsWorld,
        events: &mut EventRegistry,
    ) -> bool {
        match self.entities.remove(key) {
            Some(mut entity) => {
                entity.dispose_components(physics, events);
                true
            }
            None => false,
        }
    }

    /// Tear down every entity (level unload)
    pub fn clear(&mut self, physics: &mut PhysicsWorld, events: &mut EventRegistry) {
        for key in self.keys() {
            self.despawn(key, physics, events);
        }
    }
}

//! Contact bridging between the simulation and the game event bus
//!
//! The simulation reports raw collider-pair events; this module maps them
//! back to `(entity, component)` tags and hands them to the single active
//! [`ContactListener`], which decides which typed game events to raise.

use crate::component::ComponentId;
use crate::entity::{EntityKey, Stage};
use crate::GameContext;
use rapier2d::prelude::{ColliderSet, CollisionEvent, ContactPair, EventHandler, Real, RigidBodySet};
use slotmap::Key;
use std::sync::Mutex;

/// Identifies the owner of a simulation body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyTag {
    /// Entity owning the body's component
    pub entity: EntityKey,
    /// The rigid body component within that entity
    pub component: ComponentId,
}

impl BodyTag {
    // Packed into collider user_data: entity key in the low 64 bits,
    // component id in the next 32.
    pub(crate) fn pack(self) -> u128 {
        u128::from(self.entity.data().as_ffi()) | (u128::from(self.component.value()) << 64)
    }

    pub(crate) fn unpack(data: u128) -> Self {
        let entity = EntityKey::from(slotmap::KeyData::from_ffi(data as u64));
        let component = ComponentId::new((data >> 64) as u32);
        Self { entity, component }
    }
}

/// Whether a contact began or ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    /// The two bodies started touching
    Begin,
    /// The two bodies stopped touching
    End,
}

/// A resolved contact between two tagged bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEvent {
    /// Begin or end of the contact
    pub phase: ContactPhase,
    /// First participant
    pub a: BodyTag,
    /// Second participant
    pub b: BodyTag,
}

impl ContactEvent {
    /// Whether the given entity participates in this contact
    pub fn involves(&self, entity: EntityKey) -> bool {
        self.a.entity == entity || self.b.entity == entity
    }

    /// The tag on the other side of the contact, if `entity` participates
    pub fn other(&self, entity: EntityKey) -> Option<BodyTag> {
        if self.a.entity == entity {
            Some(self.b)
        } else if self.b.entity == entity {
            Some(self.a)
        } else {
            None
        }
    }

    /// Both participating entities
    pub fn entities(&self) -> (EntityKey, EntityKey) {
        (self.a.entity, self.b.entity)
    }
}

/// The single active handler notified when bodies begin or end touching
///
/// Invoked on the update thread between the simulation step and the entity
/// update pass; implementations typically publish typed game events through
/// the context.
pub trait ContactListener {
    /// Two bodies started touching
    fn begin_contact(&mut self, contact: &ContactEvent, stage: &mut Stage, context: &mut GameContext);

    /// Two bodies stopped touching
    fn end_contact(&mut self, contact: &ContactEvent, stage: &mut Stage, context: &mut GameContext) {
        let _ = (contact, stage, context);
    }
}

/// Collects raw simulation events during a step for later resolution
#[derive(Default)]
pub(crate) struct ContactCollector {
    events: Mutex<Vec<CollisionEvent>>,
}

impl ContactCollector {
    pub(crate) fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Resolve and drain everything collected during the last step
    ///
    /// Events whose colliders were removed mid-step no longer resolve to a
    /// tag and are dropped.
    pub(crate) fn drain(&self, colliders: &ColliderSet) -> Vec<ContactEvent> {
        let raw = match self.events.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => Vec::new(),
        };
        raw.into_iter()
            .filter_map(|event| {
                let (phase, first, second) = match event {
                    CollisionEvent::Started(first, second, _) => (ContactPhase::Begin, first, second),
                    CollisionEvent::Stopped(first, second, _) => (ContactPhase::End, first, second),
                };
                let a = BodyTag::unpack(colliders.get(first)?.user_data);
                let b = BodyTag::unpack(colliders.get(second)?.user_data);
                Some(ContactEvent { phase, a, b })
            })
            .collect()
    }

    pub(crate) fn clear(&self) {
        if let Ok(mut guard) = self.events.lock() {
            guard.clear();
        }
    }
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_tag_pack_round_trip() {
        let mut keys: slotmap::SlotMap<EntityKey, ()> = slotmap::SlotMap::with_key();
        keys.insert(());
        let entity = keys.insert(());

        let tag = BodyTag {
            entity,
            component: ComponentId::new(42),
        };
        assert_eq!(BodyTag::unpack(tag.pack()), tag);
    }

    #[test]
    fn test_contact_event_other_side() {
        let mut keys: slotmap::SlotMap<EntityKey, ()> = slotmap::SlotMap::with_key();
        let first = keys.insert(());
        let second = keys.insert(());
        let third = keys.insert(());

        let contact = ContactEvent {
            phase: ContactPhase::Begin,
            a: BodyTag {
                entity: first,
                component: ComponentId::new(1),
            },
            b: BodyTag {
                entity: second,
                component: ComponentId::new(2),
            },
        };

        assert!(contact.involves(first));
        assert!(!contact.involves(third));
        assert_eq!(contact.other(first).unwrap().entity, second);
        assert!(contact.other(third).is_none());
    }
}

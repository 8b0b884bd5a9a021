//! Typed game event bus: factory, registry and observer dispatch
//!
//! Every [`GameEventType`] has at most one live [`GameEvent`] instance for
//! the lifetime of the process. Instances are created lazily on first
//! request and cached in the [`EventRegistry`] until teardown. Listeners are
//! routing records pointing at a component inside the stage; they are
//! notified synchronously, in registration order, on the dispatching thread.
//! There is no queuing or deferred delivery.

use crate::component::ComponentId;
use crate::entity::{EntityKey, Stage};
use crate::foundation::math::Vec2;
use crate::physics::PhysicsWorld;
use std::collections::HashMap;

/// Closed enumeration of game event categories
///
/// Extend by adding enum members; unknown names only exist at the
/// string-resolution boundary ([`GameEventType::from_name`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEventType {
    /// An entity is asked to move or finished a move
    Move,
    /// A body began or ended touching terrain
    GroundContact,
    /// A falling letter was caught by the player
    LetterCaught,
    /// A target word was completed
    WordCompleted,
}

impl GameEventType {
    /// Resolve an event type from its configuration name
    ///
    /// Returns `None` for unrecognized names; callers must treat that as a
    /// non-fatal no-op (no registration, no dispatch).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "move" => Some(Self::Move),
            "ground_contact" => Some(Self::GroundContact),
            "letter_caught" => Some(Self::LetterCaught),
            "word_completed" => Some(Self::WordCompleted),
            _ => None,
        }
    }

    /// The configuration name of this event type
    pub fn name(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::GroundContact => "ground_contact",
            Self::LetterCaught => "letter_caught",
            Self::WordCompleted => "word_completed",
        }
    }
}

/// Direction of a movement event
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    /// Towards negative x
    Left,
    /// Towards positive x
    Right,
    /// Towards positive y
    Up,
    /// Towards negative y
    Down,
}

impl MoveDirection {
    /// Unit vector for this direction
    pub fn vector(self) -> Vec2 {
        match self {
            Self::Left => Vec2::new(-1.0, 0.0),
            Self::Right => Vec2::new(1.0, 0.0),
            Self::Up => Vec2::new(0.0, 1.0),
            Self::Down => Vec2::new(0.0, -1.0),
        }
    }
}

/// Data carried by a dispatched event
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// No payload
    None,
    /// Movement request for the subscribed entity
    Move {
        /// Direction to move in
        direction: MoveDirection,
        /// Speed in world units per second
        speed: f32,
    },
    /// A body of `entity` began touching terrain
    GroundContact {
        /// The entity that touched the ground
        entity: EntityKey,
    },
    /// The falling letter `entity` was caught
    LetterCaught {
        /// The caught letter entity
        entity: EntityKey,
        /// The letter it carried
        letter: char,
    },
    /// A target word was completed
    WordCompleted {
        /// The completed word
        word: String,
        /// Points awarded
        points: u32,
    },
}

impl EventPayload {
    /// The entity this payload is about, when it targets one
    pub fn target(&self) -> Option<EntityKey> {
        match self {
            Self::GroundContact { entity } | Self::LetterCaught { entity, .. } => Some(*entity),
            _ => None,
        }
    }
}

/// Subscription handle returned by listener registration
///
/// Handles stay valid for unsubscription even after the listening component
/// or its entity has been destroyed; removing an unknown handle is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

/// Routing record identifying a listening component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerTarget {
    /// The entity owning the listener
    pub entity: EntityKey,
    /// The listening component within that entity
    pub component: ComponentId,
}

#[derive(Debug, Clone, Copy)]
struct ListenerEntry {
    handle: ListenerHandle,
    target: ListenerTarget,
}

/// A single live event instance: the per-type listener list plus the most
/// recently published payload
pub struct GameEvent {
    event_type: GameEventType,
    payload: EventPayload,
    listeners: Vec<ListenerEntry>,
    next_handle: u64,
}

impl GameEvent {
    fn new(event_type: GameEventType) -> Self {
        Self {
            event_type,
            payload: EventPayload::None,
            listeners: Vec::new(),
            next_handle: 0,
        }
    }

    /// The event type this instance represents
    pub fn event_type(&self) -> GameEventType {
        self.event_type
    }

    /// The most recently published payload
    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// Replace the payload without dispatching
    pub fn set_payload(&mut self, payload: EventPayload) {
        self.payload = payload;
    }

    /// Register a listener; listeners are notified in registration order
    pub fn add_listener(&mut self, target: ListenerTarget) -> ListenerHandle {
        let handle = ListenerHandle(self.next_handle);
        self.next_handle += 1;
        self.listeners.push(ListenerEntry { handle, target });
        handle
    }

    /// Unregister a listener; removing an unknown handle is a no-op
    pub fn remove_listener(&mut self, handle: ListenerHandle) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|entry| entry.handle != handle);
        self.listeners.len() != before
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

/// Factory and cache guaranteeing one live instance per event type
///
/// Instances are created lazily and retained for the registry's lifetime;
/// they are never destroyed except at process teardown.
#[derive(Default)]
pub struct EventRegistry {
    events: HashMap<GameEventType, GameEvent>,
}

impl EventRegistry {
    /// Create an empty registry (all event types uncreated)
    pub fn new() -> Self {
        Self {
            events: HashMap::new(),
        }
    }

    /// Get the singleton instance for `event_type`, creating and caching it
    /// on first call
    pub fn game_event(&mut self, event_type: GameEventType) -> &mut GameEvent {
        self.events
            .entry(event_type)
            .or_insert_with(|| GameEvent::new(event_type))
    }

    /// Peek at an event instance without transitioning it to live
    pub fn try_game_event(&self, event_type: GameEventType) -> Option<&GameEvent> {
        self.events.get(&event_type)
    }

    /// Whether an instance for the given type has been created
    pub fn is_live(&self, event_type: GameEventType) -> bool {
        self.events.contains_key(&event_type)
    }

    /// Register `target` as a listener for `event_type`
    pub fn subscribe(&mut self, event_type: GameEventType, target: ListenerTarget) -> ListenerHandle {
        self.game_event(event_type).add_listener(target)
    }

    /// Remove a listener; a handle that was never registered (or whose event
    /// is still uncreated) is a no-op
    pub fn unsubscribe(&mut self, event_type: GameEventType, handle: ListenerHandle) -> bool {
        match self.events.get_mut(&event_type) {
            Some(event) => event.remove_listener(handle),
            None => false,
        }
    }

    /// Publish a payload: store it on the event instance and notify all
    /// registered listeners synchronously, in registration order
    ///
    /// A listener whose entity or component no longer exists is skipped. A
    /// listener that fails is logged and the remaining listeners still run.
    /// Returns the number of listeners that handled the event successfully.
    pub fn publish(
        &mut self,
        event_type: GameEventType,
        payload: EventPayload,
        stage: &mut Stage,
        physics: &mut PhysicsWorld,
    ) -> usize {
        let event = self.game_event(event_type);
        event.set_payload(payload);
        // Snapshot so listeners may subscribe/unsubscribe during dispatch.
        let entries = event.listeners.clone();
        let payload = event.payload.clone();

        let mut delivered = 0;
        for entry in entries {
            let Some(entity) = stage.get_mut(entry.target.entity) else {
                log::debug!(
                    "skipping {} listener on vanished entity {:?}",
                    event_type.name(),
                    entry.target.entity
                );
                continue;
            };
            match entity.deliver(entry.target.component, event_type, &payload, physics) {
                Some(Ok(())) => delivered += 1,
                Some(Err(err)) => {
                    log::error!(
                        "listener {} on entity {:?} failed handling {}: {}",
                        entry.target.component,
                        entry.target.entity,
                        event_type.name(),
                        err
                    );
                }
                None => {
                    log::debug!(
                        "skipping {} listener: component {} no longer attached",
                        event_type.name(),
                        entry.target.component
                    );
                }
            }
        }
        delivered
    }
}

//! Component model: the contract every entity component satisfies
//!
//! A component is a unit of entity behaviour or state (graphics, physics,
//! action). It is exclusively owned by exactly one [`Entity`](crate::entity::Entity);
//! the back-reference to the owner is a non-owning [`EntityKey`] set exactly
//! once at attach time. Components may carry an ordered list of
//! [`GameAction`]s bound to event types, and may own nested child components
//! (a tree, never a cycle).

pub mod action;
pub mod graphics;
pub mod physics;

pub use action::{ActionComponent, ActionKind, GameAction};

use crate::entity::{Entity, EntityKey};
use crate::events::{EventPayload, EventRegistry, GameEventType, ListenerHandle};
use crate::physics::PhysicsWorld;
use thiserror::Error;

/// Unique component identifier within its owning entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(u32);

impl ComponentId {
    /// Create a component identifier from its raw value
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw identifier value
    pub fn value(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Capability set a component belongs to
///
/// The assembler uses this to decide which specialized factory is
/// responsible for a resolved component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Drawable state (sprites, texture layers)
    Graphics,
    /// Simulation-backed state (rigid bodies)
    Physics,
    /// Event-driven behaviour
    Action,
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Graphics => "graphics",
            Self::Physics => "physics",
            Self::Action => "action",
        };
        f.write_str(name)
    }
}

/// Component-level errors
#[derive(Error, Debug)]
pub enum ComponentError {
    /// The component was already disposed
    #[error("component has been disposed")]
    Disposed,

    /// No simulation body is attached to the owning entity
    #[error("no simulation body is attached to the owning entity")]
    MissingBody,

    /// A bound action failed to apply
    #[error("action {id} failed: {reason}")]
    ActionFailed {
        /// Identifier of the failing action
        id: u32,
        /// Failure description
        reason: String,
    },
}

/// Contract all component variants satisfy
///
/// Operations on a disposed component are the caller's responsibility to
/// avoid; implementations make re-entry safe where cheap (disposal is
/// idempotent, updates after disposal are no-ops).
pub trait Component {
    /// The component's identifier, unique within its owning entity
    fn id(&self) -> ComponentId;

    /// The capability set this component belongs to
    fn kind(&self) -> ComponentKind;

    /// The owning entity, if attached
    fn parent(&self) -> Option<EntityKey>;

    /// Establish the non-owning back-reference to the owning entity
    ///
    /// Set exactly once at attach time; later calls are ignored with a
    /// warning.
    fn set_parent(&mut self, parent: EntityKey);

    /// Advance component-local state by the elapsed frame time in seconds
    fn update(&mut self, parent: &mut Entity, physics: &mut PhysicsWorld, delta_time: f32);

    /// Release all resources owned by the component
    ///
    /// Idempotent: calling twice must not fault and leaves the same
    /// observable end state as calling once.
    fn dispose(&mut self, physics: &mut PhysicsWorld, events: &mut EventRegistry);

    /// The ordered list of bound actions
    fn actions(&self) -> &[GameAction];

    /// Append an action to the bound action list
    fn add_action(&mut self, action: GameAction);

    /// Remove a bound action by its identifier
    ///
    /// Returns `false` if no action with that identifier was present.
    fn remove_action(&mut self, action_id: u32) -> bool;

    /// Event subscriptions held by this component
    fn subscriptions(&self) -> &[(GameEventType, ListenerHandle)];

    /// Record an event subscription taken out on this component's behalf
    fn note_subscription(&mut self, event_type: GameEventType, handle: ListenerHandle);

    /// Take ownership of a nested child component
    fn add_child(&mut self, child: Box<dyn Component>) {
        log::warn!(
            "component {} does not accept children; dropping component {}",
            self.id(),
            child.id()
        );
    }

    /// Whether a component with the given id exists in this component's subtree
    fn has_child(&self, id: ComponentId) -> bool {
        let _ = id;
        false
    }

    /// Look up a nested child component by id
    fn child(&self, id: ComponentId) -> Option<&dyn Component> {
        let _ = id;
        None
    }

    /// Look up a nested child component by id, mutably
    fn child_mut(&mut self, id: ComponentId) -> Option<&mut dyn Component> {
        let _ = id;
        None
    }

    /// Hook invoked after the component has been parented, before the next
    /// sibling is assembled
    ///
    /// This is where size- and alignment-dependent attachment work happens
    /// (graphics components propagate their size to the entity here).
    fn on_attach(&mut self, parent: &mut Entity) {
        let _ = parent;
    }

    /// React to a dispatched game event
    ///
    /// Invoked synchronously on the update thread. Errors are logged by the
    /// dispatch loop; remaining listeners still run.
    fn on_event(
        &mut self,
        event_type: GameEventType,
        payload: &EventPayload,
        parent: &mut Entity,
        physics: &mut PhysicsWorld,
    ) -> Result<(), ComponentError> {
        let _ = (event_type, payload, parent, physics);
        Ok(())
    }
}

/// Shared bookkeeping embedded by every concrete component
///
/// Carries the identifier, capability, parent back-reference, bound action
/// list, event subscriptions, nested children and the disposal flag, so
/// concrete components delegate the common contract here.
pub struct ComponentCore {
    id: ComponentId,
    kind: ComponentKind,
    parent: Option<EntityKey>,
    actions: Vec<GameAction>,
    subscriptions: Vec<(GameEventType, ListenerHandle)>,
    children: Vec<Box<dyn Component>>,
    disposed: bool,
}

impl ComponentCore {
    /// Create the bookkeeping core for a component
    pub fn new(id: ComponentId, kind: ComponentKind) -> Self {
        Self {
            id,
            kind,
            parent: None,
            actions: Vec::new(),
            subscriptions: Vec::new(),
            children: Vec::new(),
            disposed: false,
        }
    }

    /// The component identifier
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// The capability set
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// The owning entity, if attached
    pub fn parent(&self) -> Option<EntityKey> {
        self.parent
    }

    /// Set the parent back-reference; only the first call takes effect
    pub fn set_parent(&mut self, parent: EntityKey) {
        if self.parent.is_some() {
            log::warn!("component {} is already parented; ignoring re-parent", self.id);
            return;
        }
        self.parent = Some(parent);
    }

    /// The ordered bound action list
    pub fn actions(&self) -> &[GameAction] {
        &self.actions
    }

    /// Append an action
    pub fn add_action(&mut self, action: GameAction) {
        self.actions.push(action);
    }

    /// Remove an action by identifier; `false` if absent
    pub fn remove_action(&mut self, action_id: u32) -> bool {
        let before = self.actions.len();
        self.actions.retain(|action| action.id != action_id);
        self.actions.len() != before
    }

    /// Apply every bound action matching the dispatched event, in order
    pub fn apply_actions(
        &self,
        event_type: GameEventType,
        payload: &EventPayload,
        parent: &mut Entity,
        physics: &mut PhysicsWorld,
    ) -> Result<(), ComponentError> {
        for action in &self.actions {
            action.apply(event_type, payload, parent, physics)?;
        }
        Ok(())
    }

    /// Recorded event subscriptions
    pub fn subscriptions(&self) -> &[(GameEventType, ListenerHandle)] {
        &self.subscriptions
    }

    /// Record a subscription handle
    pub fn note_subscription(&mut self, event_type: GameEventType, handle: ListenerHandle) {
        self.subscriptions.push((event_type, handle));
    }

    /// Release all recorded subscriptions
    pub fn unsubscribe_all(&mut self, events: &mut EventRegistry) {
        for (event_type, handle) in self.subscriptions.drain(..) {
            events.unsubscribe(event_type, handle);
        }
    }

    /// Nested child components
    pub fn children(&self) -> &[Box<dyn Component>] {
        &self.children
    }

    /// Take ownership of a child component
    pub fn add_child(&mut self, child: Box<dyn Component>) {
        self.children.push(child);
    }

    /// Whether the given id exists anywhere in the child subtree
    pub fn has_child(&self, id: ComponentId) -> bool {
        self.children
            .iter()
            .any(|child| child.id() == id || child.has_child(id))
    }

    /// Look up a child anywhere in the subtree
    pub fn child(&self, id: ComponentId) -> Option<&dyn Component> {
        for child in &self.children {
            if child.id() == id {
                return Some(child.as_ref());
            }
            if let Some(found) = child.child(id) {
                return Some(found);
            }
        }
        None
    }

    /// Look up a child anywhere in the subtree, mutably
    pub fn child_mut(&mut self, id: ComponentId) -> Option<&mut dyn Component> {
        let index = self
            .children
            .iter()
            .position(|child| child.id() == id || child.has_child(id))?;
        let child = self.children[index].as_mut();
        if child.id() == id {
            Some(child)
        } else {
            child.child_mut(id)
        }
    }

    /// Update all children
    pub fn update_children(
        &mut self,
        parent: &mut Entity,
        physics: &mut PhysicsWorld,
        delta_time: f32,
    ) {
        for child in &mut self.children {
            child.update(parent, physics, delta_time);
        }
    }

    /// Dispose all children
    pub fn dispose_children(&mut self, physics: &mut PhysicsWorld, events: &mut EventRegistry) {
        for child in &mut self.children {
            child.dispose(physics, events);
        }
    }

    /// Flip the disposal flag; returns `true` only on the first call
    pub fn mark_disposed(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        true
    }

    /// Whether the component has been disposed
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> ComponentCore {
        ComponentCore::new(ComponentId::new(7), ComponentKind::Action)
    }

    #[test]
    fn test_remove_action_reports_absence() {
        let mut core = core();
        core.add_action(GameAction::new(1, GameEventType::Move, ActionKind::ApplyMovement));
        core.add_action(GameAction::new(2, GameEventType::GroundContact, ActionKind::MarkGrounded));

        assert!(core.remove_action(1));
        assert!(!core.remove_action(1));
        assert!(!core.remove_action(99));
        assert_eq!(core.actions().len(), 1);
    }

    #[test]
    fn test_actions_keep_insertion_order() {
        let mut core = core();
        for id in [3, 1, 2] {
            core.add_action(GameAction::new(id, GameEventType::Move, ActionKind::Halt));
        }
        let ids: Vec<u32> = core.actions().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_parent_set_only_once() {
        let mut keys: slotmap::SlotMap<EntityKey, ()> = slotmap::SlotMap::with_key();
        let first = keys.insert(());
        let second = keys.insert(());

        let mut core = core();
        core.set_parent(first);
        core.set_parent(second);
        assert_eq!(core.parent(), Some(first));
    }

    #[test]
    fn test_mark_disposed_is_one_shot() {
        let mut core = core();
        assert!(core.mark_disposed());
        assert!(!core.mark_disposed());
        assert!(core.is_disposed());
    }
}

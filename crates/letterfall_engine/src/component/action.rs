//! Action components: behaviour bound to event types
//!
//! A [`GameAction`] couples an event type with a behaviour applied to the
//! owning entity when that event is dispatched. Any component can carry
//! actions; [`ActionComponent`] exists purely to hold them.

use super::{Component, ComponentCore, ComponentError, ComponentId, ComponentKind};
use crate::assembly::{AssemblyError, ComponentConfig};
use crate::entity::{Entity, EntityKey};
use crate::events::{EventPayload, EventRegistry, GameEventType, ListenerHandle};
use crate::foundation::math::Vec2;
use crate::physics::PhysicsWorld;
use serde::Deserialize;

/// Behaviour applied when a bound event fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Drive the owning entity's simulation body from a movement payload
    ApplyMovement,
    /// Flag the owning entity as grounded
    MarkGrounded,
    /// Zero the owning entity's body velocity
    Halt,
    /// Mark the owning entity terminated
    Terminate,
}

impl ActionKind {
    /// Resolve an action kind from its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "apply_movement" => Some(Self::ApplyMovement),
            "mark_grounded" => Some(Self::MarkGrounded),
            "halt" => Some(Self::Halt),
            "terminate" => Some(Self::Terminate),
            _ => None,
        }
    }
}

/// Behaviour bound to an event type, owned by a component
#[derive(Debug, Clone)]
pub struct GameAction {
    /// Identifier used for removal
    pub id: u32,
    /// The event type this action reacts to
    pub trigger: GameEventType,
    /// The behaviour to apply
    pub kind: ActionKind,
}

impl GameAction {
    /// Create a new action
    pub fn new(id: u32, trigger: GameEventType, kind: ActionKind) -> Self {
        Self { id, trigger, kind }
    }

    /// Apply the action if the dispatched event matches its trigger
    ///
    /// Payloads that target a specific entity only apply when that entity is
    /// the action's owner.
    pub fn apply(
        &self,
        event_type: GameEventType,
        payload: &EventPayload,
        parent: &mut Entity,
        physics: &mut PhysicsWorld,
    ) -> Result<(), ComponentError> {
        if self.trigger != event_type {
            return Ok(());
        }
        if let Some(target) = payload.target() {
            if target != parent.key() {
                return Ok(());
            }
        }
        match self.kind {
            ActionKind::ApplyMovement => {
                let EventPayload::Move { direction, speed } = payload else {
                    return Ok(());
                };
                let handle =
                    physics
                        .body_of(parent.key())
                        .ok_or(ComponentError::MissingBody)?;
                physics.set_body_velocity(handle, direction.vector() * *speed);
            }
            ActionKind::MarkGrounded => {
                parent.set_on_ground(true);
            }
            ActionKind::Halt => {
                if let Some(handle) = physics.body_of(parent.key()) {
                    physics.set_body_velocity(handle, Vec2::zeros());
                }
            }
            ActionKind::Terminate => {
                parent.set_terminated(true);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActionParams {
    id: u32,
    trigger: String,
    kind: String,
}

/// Resolve action descriptors into bound actions, rejecting unknown names
pub(crate) fn resolve_actions(
    actions: Vec<ActionParams>,
    component: &str,
) -> Result<Vec<GameAction>, AssemblyError> {
    let mut resolved = Vec::with_capacity(actions.len());
    for action in actions {
        let trigger = GameEventType::from_name(&action.trigger).ok_or_else(|| {
            AssemblyError::InvalidParams {
                name: component.to_string(),
                reason: format!("unknown event type '{}'", action.trigger),
            }
        })?;
        let kind =
            ActionKind::from_name(&action.kind).ok_or_else(|| AssemblyError::InvalidParams {
                name: component.to_string(),
                reason: format!("unknown action kind '{}'", action.kind),
            })?;
        resolved.push(GameAction::new(action.id, trigger, kind));
    }
    Ok(resolved)
}

#[derive(Debug, Deserialize)]
struct ActionsParams {
    actions: Vec<ActionParams>,
}

/// Component that exists to carry event-bound actions
pub struct ActionComponent {
    core: ComponentCore,
}

impl ActionComponent {
    /// Create an action component with an initial action list
    pub fn new(id: ComponentId, actions: Vec<GameAction>) -> Self {
        let mut core = ComponentCore::new(id, ComponentKind::Action);
        for action in actions {
            core.add_action(action);
        }
        Self { core }
    }

    /// Build from a component descriptor
    pub fn from_config(config: &ComponentConfig) -> Result<Self, AssemblyError> {
        let params: ActionsParams = config.params()?;
        let actions = resolve_actions(params.actions, &config.name)?;
        Ok(Self::new(ComponentId::new(config.id), actions))
    }

    /// Boxed factory used by the component registry
    pub fn build(config: &ComponentConfig) -> Result<Box<dyn Component>, AssemblyError> {
        Ok(Box::new(Self::from_config(config)?))
    }
}

impl Component for ActionComponent {
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
        self.core.update_children(parent, physics, delta_time);
    }

    fn dispose(&mut self, physics: &mut PhysicsWorld, events: &mut EventRegistry) {
        if !self.core.mark_disposed() {
            return;
        }
        self.core.dispose_children(physics, events);
        self.core.unsubscribe_all(events);
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
        self.core.apply_actions(event_type, payload, parent, physics)
    }
}

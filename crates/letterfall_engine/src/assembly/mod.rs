//! Dynamic component assembly
//!
//! The assembler turns declarative entity configuration into wired
//! components: each descriptor's `name` is resolved against an explicit
//! [`ComponentRegistry`] (a compile-time-checked registration table instead
//! of reflective class loading), the matching capability factory constructs
//! the component, and the assembler parents it, subscribes it to the events
//! it declares interest in, and appends it to the entity — in descriptor
//! order, completing each attachment before the next sibling begins.
//!
//! Unknown names, capability mismatches, bad parameters and duplicate
//! identifiers are skipped with a warning; the entity keeps whatever
//! components did resolve.

mod config;

pub use config::{ComponentConfig, EntityConfig};

use crate::assets::AssetCatalog;
use crate::component::{
    ActionComponent, Component, ComponentId, ComponentKind,
    graphics::{LayeredGraphics, SpriteGraphics},
    physics::RigidBodyComponent,
};
use crate::entity::{Entity, EntityKey, Stage};
use crate::events::{GameEventType, ListenerTarget};
use crate::physics::PhysicsWorld;
use crate::GameContext;
use std::collections::HashMap;
use thiserror::Error;

/// Assembly errors
///
/// Only [`AssemblyError::MissingEntity`] aborts an assembly pass; every
/// other variant is absorbed per descriptor and surfaced as a logged skip.
#[derive(Error, Debug)]
pub enum AssemblyError {
    /// No factory is registered under the descriptor's name
    #[error("no component registered under name '{0}'")]
    UnknownComponent(String),

    /// The resolved factory belongs to a different capability set
    #[error("component '{name}' resolved to {resolved} but was declared {declared}")]
    CapabilityMismatch {
        /// Descriptor name
        name: String,
        /// Capability declared in the descriptor
        declared: ComponentKind,
        /// Capability of the resolved factory
        resolved: ComponentKind,
    },

    /// The descriptor's parameters failed validation
    #[error("invalid parameters for component '{name}': {reason}")]
    InvalidParams {
        /// Descriptor name
        name: String,
        /// Validation failure
        reason: String,
    },

    /// A referenced asset does not exist in the catalog
    #[error("unknown asset '{0}'")]
    UnknownAsset(String),

    /// A component with this identifier is already attached
    #[error("duplicate component identifier {0}")]
    DuplicateId(u32),

    /// The target entity is not on the stage
    #[error("entity is not present on the stage")]
    MissingEntity,
}

/// Factory function for a graphics-capability component
pub type GraphicsFactory =
    fn(&ComponentConfig, &mut AssetCatalog) -> Result<Box<dyn Component>, AssemblyError>;

/// Factory function for a physics-capability component
pub type PhysicsFactory =
    fn(&ComponentConfig, &Entity, &mut PhysicsWorld) -> Result<Box<dyn Component>, AssemblyError>;

/// Factory function for an action-capability component
pub type ActionFactory = fn(&ComponentConfig) -> Result<Box<dyn Component>, AssemblyError>;

/// A registered factory, tagged with the capability set it serves
pub enum ComponentFactory {
    /// Builds drawable components
    Graphics(GraphicsFactory),
    /// Builds simulation-backed components
    Physics(PhysicsFactory),
    /// Builds event-driven behaviour components
    Action(ActionFactory),
}

impl ComponentFactory {
    /// The capability set this factory serves
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Graphics(_) => ComponentKind::Graphics,
            Self::Physics(_) => ComponentKind::Physics,
            Self::Action(_) => ComponentKind::Action,
        }
    }
}

/// Explicit registration table mapping descriptor names to factories
pub struct ComponentRegistry {
    factories: HashMap<String, ComponentFactory>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ComponentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry with the built-in component types registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("sprite", ComponentFactory::Graphics(SpriteGraphics::build));
        registry.register(
            "layered_sprite",
            ComponentFactory::Graphics(LayeredGraphics::build),
        );
        registry.register(
            "rigid_body",
            ComponentFactory::Physics(RigidBodyComponent::build),
        );
        registry.register("actions", ComponentFactory::Action(ActionComponent::build));
        registry
    }

    /// Register a factory, replacing any previous entry with the same name
    pub fn register(&mut self, name: impl Into<String>, factory: ComponentFactory) {
        let name = name.into();
        if self.factories.insert(name.clone(), factory).is_some() {
            log::warn!("component factory '{name}' was replaced");
        }
    }

    /// Resolve a descriptor name to its factory
    pub fn resolve(&self, name: &str) -> Option<&ComponentFactory> {
        self.factories.get(name)
    }

    /// Names of all registered factories
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

/// Configuration-driven component construction and wiring
pub struct EntityAssembler {
    registry: ComponentRegistry,
}

impl Default for EntityAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityAssembler {
    /// Create an assembler with the built-in component registry
    pub fn new() -> Self {
        Self {
            registry: ComponentRegistry::with_defaults(),
        }
    }

    /// Create an assembler with a custom registry
    pub fn with_registry(registry: ComponentRegistry) -> Self {
        Self { registry }
    }

    /// The registry used for type resolution
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Mutable access to the registry (e.g. to register game components)
    pub fn registry_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.registry
    }

    /// Assemble the configured components onto an existing entity
    ///
    /// Descriptors are processed in configuration order; each component is
    /// fully attached (including size-dependent position computation) before
    /// the next sibling begins, so later components may rely on state
    /// established by earlier ones. Descriptors that fail to resolve are
    /// skipped with a warning. An entity may be re-assembled with additional
    /// descriptors as long as identifiers are not duplicated.
    ///
    /// Returns the number of components attached.
    pub fn assemble(
        &self,
        config: &EntityConfig,
        key: EntityKey,
        stage: &mut Stage,
        context: &mut GameContext,
    ) -> Result<usize, AssemblyError> {
        if !stage.contains(key) {
            return Err(AssemblyError::MissingEntity);
        }
        let mut attached = 0;
        for descriptor in &config.components {
            match self.assemble_component(descriptor, key, stage, context) {
                Ok(()) => attached += 1,
                Err(err) => log::warn!(
                    "skipping component '{}' ({}) on entity '{}': {}",
                    descriptor.name,
                    descriptor.id,
                    config.name,
                    err
                ),
            }
        }
        Ok(attached)
    }

    fn assemble_component(
        &self,
        descriptor: &ComponentConfig,
        key: EntityKey,
        stage: &mut Stage,
        context: &mut GameContext,
    ) -> Result<(), AssemblyError> {
        let id = ComponentId::new(descriptor.id);
        {
            let entity = stage.get(key).ok_or(AssemblyError::MissingEntity)?;
            if entity.has_component(id) {
                return Err(AssemblyError::DuplicateId(descriptor.id));
            }
        }

        let mut component = self.construct(descriptor, key, stage, context)?;

        for child in &descriptor.components {
            if child.id == descriptor.id
                || component.has_child(ComponentId::new(child.id))
                || stage
                    .get(key)
                    .is_some_and(|entity| entity.has_component(ComponentId::new(child.id)))
            {
                log::warn!(
                    "skipping nested component '{}' ({}): duplicate identifier",
                    child.name,
                    child.id
                );
                continue;
            }
            match self.construct(child, key, stage, context) {
                Ok(mut built) => {
                    self.wire_subscriptions(child, key, built.as_mut(), context);
                    built.set_parent(key);
                    component.add_child(built);
                }
                Err(err) => log::warn!(
                    "skipping nested component '{}' ({}): {}",
                    child.name,
                    child.id,
                    err
                ),
            }
        }

        self.wire_subscriptions(descriptor, key, component.as_mut(), context);
        component.set_parent(key);

        let entity = stage.get_mut(key).ok_or(AssemblyError::MissingEntity)?;
        component.on_attach(entity);
        entity.add_component(component);
        Ok(())
    }

    fn construct(
        &self,
        descriptor: &ComponentConfig,
        key: EntityKey,
        stage: &mut Stage,
        context: &mut GameContext,
    ) -> Result<Box<dyn Component>, AssemblyError> {
        let factory = self
            .registry
            .resolve(&descriptor.name)
            .ok_or_else(|| AssemblyError::UnknownComponent(descriptor.name.clone()))?;
        if factory.kind() != descriptor.kind {
            return Err(AssemblyError::CapabilityMismatch {
                name: descriptor.name.clone(),
                declared: descriptor.kind,
                resolved: factory.kind(),
            });
        }
        match factory {
            ComponentFactory::Graphics(build) => build(descriptor, &mut context.assets),
            ComponentFactory::Physics(build) => {
                let entity = stage.get(key).ok_or(AssemblyError::MissingEntity)?;
                build(descriptor, entity, &mut context.physics)
            }
            ComponentFactory::Action(build) => build(descriptor),
        }
    }

    fn wire_subscriptions(
        &self,
        descriptor: &ComponentConfig,
        key: EntityKey,
        component: &mut dyn Component,
        context: &mut GameContext,
    ) {
        for event_name in &descriptor.subscriptions {
            match GameEventType::from_name(event_name) {
                Some(event_type) => {
                    let handle = context.events.subscribe(
                        event_type,
                        ListenerTarget {
                            entity: key,
                            component: component.id(),
                        },
                    );
                    component.note_subscription(event_type, handle);
                }
                None => log::warn!(
                    "component '{}' requested unknown event type '{}'",
                    descriptor.name,
                    event_name
                ),
            }
        }
    }
}

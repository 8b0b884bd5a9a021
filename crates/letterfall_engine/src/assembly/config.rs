//! Declarative entity and component descriptors
//!
//! Entities are described by a hierarchical RON document: per component a
//! capability (`type`), a registry `name`, event subscriptions, nested
//! sub-components, and variant-specific parameters. Parameters are kept as a
//! raw value tree; each component constructor deserialises and validates its
//! own parameter struct from it.

use super::AssemblyError;
use crate::component::ComponentKind;
use crate::entity::EntityKind;
use serde::Deserialize;

/// Descriptor for one component of an entity
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentConfig {
    /// Identifier, unique within the owning entity
    pub id: u32,
    /// Declared capability; must match what the name resolves to
    #[serde(alias = "type")]
    pub kind: ComponentKind,
    /// Registry name of the concrete component type
    pub name: String,
    /// Event types this component wants to listen to
    #[serde(default)]
    pub subscriptions: Vec<String>,
    /// Nested sub-components owned by this component
    #[serde(default)]
    pub components: Vec<ComponentConfig>,
    /// Variant-specific parameters, validated by the component constructor
    #[serde(default = "default_params")]
    pub params: ron::Value,
}

fn default_params() -> ron::Value {
    ron::Value::Unit
}

impl ComponentConfig {
    /// Deserialise the variant-specific parameters into a typed struct
    pub fn params<T: serde::de::DeserializeOwned>(&self) -> Result<T, AssemblyError> {
        self.params
            .clone()
            .into_rust()
            .map_err(|e| AssemblyError::InvalidParams {
                name: self.name.clone(),
                reason: e.to_string(),
            })
    }
}

fn default_scale() -> (f32, f32) {
    (1.0, 1.0)
}

/// Descriptor for a complete entity
#[derive(Debug, Clone, Deserialize)]
pub struct EntityConfig {
    /// Entity category
    pub kind: EntityKind,
    /// Name used for diagnostics
    pub name: String,
    /// Initial position in world units
    #[serde(default)]
    pub position: (f32, f32),
    /// Initial scale factors
    #[serde(default = "default_scale")]
    pub scale: (f32, f32),
    /// Component descriptors, assembled in order
    #[serde(default)]
    pub components: Vec<ComponentConfig>,
}

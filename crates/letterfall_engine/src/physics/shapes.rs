//! Shape-definition cache backing rigid body components
//!
//! A rigid body component keeps several named body definitions (e.g. one per
//! animation pose) and activates one of them. The cache is owned by the
//! component and disposed with it; leaking caches across level reloads would
//! accumulate stale shape data.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Geometric primitive for a collider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Axis-aligned box given by half extents
    Cuboid {
        /// Half extent along x
        half_width: f32,
        /// Half extent along y
        half_height: f32,
    },
    /// Circle given by its radius
    Ball {
        /// Circle radius
        radius: f32,
    },
}

/// One collider within a body definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColliderDef {
    /// Collider geometry
    pub shape: ShapeKind,
    /// Offset from the body origin
    #[serde(default)]
    pub offset: (f32, f32),
    /// Mass density
    #[serde(default = "default_density")]
    pub density: f32,
    /// Surface friction coefficient
    #[serde(default)]
    pub friction: f32,
    /// Bounciness coefficient
    #[serde(default)]
    pub restitution: f32,
    /// Whether the collider only reports contacts without a physical response
    #[serde(default)]
    pub sensor: bool,
}

fn default_density() -> f32 {
    1.0
}

/// A named body definition: the colliders making up one body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyShape {
    /// Colliders attached to the body
    pub colliders: Vec<ColliderDef>,
}

/// Cache of named body definitions
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ShapeCache {
    shapes: HashMap<String, BodyShape>,
}

impl ShapeCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            shapes: HashMap::new(),
        }
    }

    /// Parse a cache from RON text
    pub fn from_ron(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Insert or replace a named body definition
    pub fn insert(&mut self, name: impl Into<String>, shape: BodyShape) {
        self.shapes.insert(name.into(), shape);
    }

    /// Look up a body definition
    pub fn get(&self, name: &str) -> Option<&BodyShape> {
        self.shapes.get(name)
    }

    /// Whether a body definition with the given name exists
    pub fn contains(&self, name: &str) -> bool {
        self.shapes.contains_key(name)
    }

    /// Number of cached body definitions
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Whether the cache holds no definitions
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Dispose the cache contents
    pub fn clear(&mut self) {
        self.shapes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cache_from_ron() {
        let cache = ShapeCache::from_ron(
            r#"(
                shapes: {
                    "default": (colliders: [
                        (shape: Cuboid(half_width: 0.5, half_height: 0.5), density: 2.0),
                    ]),
                    "crouched": (colliders: [
                        (shape: Ball(radius: 0.3), sensor: true),
                    ]),
                },
            )"#,
        )
        .unwrap();

        assert_eq!(cache.len(), 2);
        let body = cache.get("default").unwrap();
        assert_eq!(body.colliders.len(), 1);
        assert_eq!(
            body.colliders[0].shape,
            ShapeKind::Cuboid {
                half_width: 0.5,
                half_height: 0.5
            }
        );
        assert!(cache.get("crouched").unwrap().colliders[0].sensor);
    }

    #[test]
    fn test_malformed_cache_is_a_parse_error() {
        assert!(ShapeCache::from_ron("(shapes: 17)").is_err());
    }

    #[test]
    fn test_clear_empties_the_cache() {
        let mut cache = ShapeCache::new();
        cache.insert("default", BodyShape { colliders: vec![] });
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }
}

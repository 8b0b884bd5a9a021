//! Asset catalog: the boundary to the asset-loading collaborator
//!
//! The core does not decode textures or fonts; it resolves names declared in
//! a RON manifest to opaque drawable/font handles plus the size metadata the
//! graphics components need for alignment and margin positioning.

use crate::foundation::collections::{Handle, HandleMap, TypedHandle};
use crate::foundation::math::Vec2;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

/// Asset system errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// The manifest could not be parsed
    #[error("manifest parse error: {0}")]
    Parse(String),
}

/// Manifest entry describing a drawable resource
#[derive(Debug, Clone, Deserialize)]
pub struct DrawableDef {
    /// Name components refer to
    pub name: String,
    /// Path of the backing resource (opaque to the core)
    pub path: String,
    /// Natural size in world units
    pub size: (f32, f32),
}

/// Manifest entry describing a font face
#[derive(Debug, Clone, Deserialize)]
pub struct FontDef {
    /// Name components refer to
    pub name: String,
    /// Path of the backing font file (opaque to the core)
    pub path: String,
    /// Point size the face is rasterized at
    pub point_size: u32,
}

#[derive(Debug, Deserialize)]
struct AssetManifest {
    #[serde(default)]
    drawables: Vec<DrawableDef>,
    #[serde(default)]
    fonts: Vec<FontDef>,
}

/// A resolved drawable resource
#[derive(Debug, Clone)]
pub struct Drawable {
    /// Resource name
    pub name: String,
    /// Backing resource path
    pub path: String,
    /// Natural size in world units
    pub size: Vec2,
}

/// A resolved font face
#[derive(Debug, Clone)]
pub struct FontFace {
    /// Font name
    pub name: String,
    /// Backing font file path
    pub path: String,
    /// Point size
    pub point_size: u32,
}

/// Catalog resolving asset names to opaque handles
#[derive(Default)]
pub struct AssetCatalog {
    drawables: HandleMap<Drawable>,
    drawable_names: HashMap<String, Handle>,
    fonts: HandleMap<FontFace>,
    font_names: HashMap<String, Handle>,
}

impl AssetCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a RON manifest, registering every declared asset
    ///
    /// Returns the number of assets registered.
    pub fn load_manifest(&mut self, contents: &str) -> Result<usize, AssetError> {
        let manifest: AssetManifest =
            ron::from_str(contents).map_err(|e| AssetError::Parse(e.to_string()))?;
        let count = manifest.drawables.len() + manifest.fonts.len();
        for def in manifest.drawables {
            self.register_drawable(def);
        }
        for def in manifest.fonts {
            self.register_font(def);
        }
        Ok(count)
    }

    /// Register a drawable, replacing any previous one with the same name
    pub fn register_drawable(&mut self, def: DrawableDef) -> TypedHandle<Drawable> {
        if let Some(old) = self.drawable_names.remove(&def.name) {
            self.drawables.remove(old);
            log::debug!("replacing drawable '{}'", def.name);
        }
        let name = def.name.clone();
        let key = self.drawables.insert(Drawable {
            name: def.name,
            path: def.path,
            size: Vec2::new(def.size.0, def.size.1),
        });
        self.drawable_names.insert(name, key);
        TypedHandle::new(key)
    }

    /// Register a font face, replacing any previous one with the same name
    pub fn register_font(&mut self, def: FontDef) -> TypedHandle<FontFace> {
        if let Some(old) = self.font_names.remove(&def.name) {
            self.fonts.remove(old);
            log::debug!("replacing font '{}'", def.name);
        }
        let name = def.name.clone();
        let key = self.fonts.insert(FontFace {
            name: def.name,
            path: def.path,
            point_size: def.point_size,
        });
        self.font_names.insert(name, key);
        TypedHandle::new(key)
    }

    /// Resolve a drawable by name
    pub fn drawable(&self, name: &str) -> Option<TypedHandle<Drawable>> {
        self.drawable_names
            .get(name)
            .map(|&key| TypedHandle::new(key))
    }

    /// Metadata of a resolved drawable
    pub fn drawable_info(&self, handle: TypedHandle<Drawable>) -> Option<&Drawable> {
        self.drawables.get(handle.key())
    }

    /// Resolve a font by name
    pub fn font(&self, name: &str) -> Option<TypedHandle<FontFace>> {
        self.font_names.get(name).map(|&key| TypedHandle::new(key))
    }

    /// Metadata of a resolved font
    pub fn font_info(&self, handle: TypedHandle<FontFace>) -> Option<&FontFace> {
        self.fonts.get(handle.key())
    }

    /// Number of registered drawables
    pub fn drawable_count(&self) -> usize {
        self.drawables.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"(
        drawables: [
            (name: "crate", path: "textures/crate.png", size: (1.0, 1.0)),
            (name: "letter_tile", path: "textures/letter_tile.png", size: (0.6, 0.6)),
        ],
        fonts: [
            (name: "hud", path: "fonts/hud.ttf", point_size: 24),
        ],
    )"#;

    #[test]
    fn test_manifest_registers_assets() {
        let mut catalog = AssetCatalog::new();
        assert_eq!(catalog.load_manifest(MANIFEST).unwrap(), 3);
        assert_eq!(catalog.drawable_count(), 2);

        let handle = catalog.drawable("letter_tile").unwrap();
        let info = catalog.drawable_info(handle).unwrap();
        assert_eq!(info.size, Vec2::new(0.6, 0.6));
        assert!(catalog.font("hud").is_some());
    }

    #[test]
    fn test_unknown_asset_resolves_to_none() {
        let catalog = AssetCatalog::new();
        assert!(catalog.drawable("missing").is_none());
    }

    #[test]
    fn test_malformed_manifest_is_a_parse_error() {
        let mut catalog = AssetCatalog::new();
        assert!(catalog.load_manifest("(drawables: 3)").is_err());
    }

    #[test]
    fn test_reregistering_replaces_by_name() {
        let mut catalog = AssetCatalog::new();
        catalog.register_drawable(DrawableDef {
            name: "crate".into(),
            path: "a.png".into(),
            size: (1.0, 1.0),
        });
        catalog.register_drawable(DrawableDef {
            name: "crate".into(),
            path: "b.png".into(),
            size: (2.0, 2.0),
        });

        assert_eq!(catalog.drawable_count(), 1);
        let handle = catalog.drawable("crate").unwrap();
        assert_eq!(catalog.drawable_info(handle).unwrap().path, "b.png");
    }
}

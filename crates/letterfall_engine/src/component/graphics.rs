//! Graphics components: drawable state positioned by alignment and margin
//!
//! The core never touches pixel data; it holds opaque drawable handles from
//! the [`AssetCatalog`] and computes relative positions itself. A layered
//! component stacks several textures by z-index and may own nested child
//! components (HUD panels are built this way).

use super::{Component, ComponentCore, ComponentId, ComponentKind, GameAction};
use crate::assembly::{AssemblyError, ComponentConfig};
use crate::assets::{AssetCatalog, Drawable};
use crate::entity::{Entity, EntityKey};
use crate::events::{EventRegistry, GameEventType, ListenerHandle};
use crate::foundation::collections::TypedHandle;
use crate::foundation::math::Vec2;
use crate::physics::PhysicsWorld;
use serde::{Deserialize, Serialize};

/// Nine-way anchor within a parent's bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Anchored top-left
    TopLeft,
    /// Anchored top-center
    TopCenter,
    /// Anchored top-right
    TopRight,
    /// Anchored center-left
    CenterLeft,
    /// Centered both ways
    #[default]
    Middle,
    /// Anchored center-right
    CenterRight,
    /// Anchored bottom-left
    BottomLeft,
    /// Anchored bottom-center
    BottomCenter,
    /// Anchored bottom-right
    BottomRight,
}

enum HAlign {
    Left,
    Center,
    Right,
}

enum VAlign {
    Top,
    Middle,
    Bottom,
}

impl Alignment {
    /// Resolve an alignment from its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "top_left" => Some(Self::TopLeft),
            "top_center" => Some(Self::TopCenter),
            "top_right" => Some(Self::TopRight),
            "center_left" => Some(Self::CenterLeft),
            "middle" => Some(Self::Middle),
            "center_right" => Some(Self::CenterRight),
            "bottom_left" => Some(Self::BottomLeft),
            "bottom_center" => Some(Self::BottomCenter),
            "bottom_right" => Some(Self::BottomRight),
            _ => None,
        }
    }

    fn split(self) -> (HAlign, VAlign) {
        match self {
            Self::TopLeft => (HAlign::Left, VAlign::Top),
            Self::TopCenter => (HAlign::Center, VAlign::Top),
            Self::TopRight => (HAlign::Right, VAlign::Top),
            Self::CenterLeft => (HAlign::Left, VAlign::Middle),
            Self::Middle => (HAlign::Center, VAlign::Middle),
            Self::CenterRight => (HAlign::Right, VAlign::Middle),
            Self::BottomLeft => (HAlign::Left, VAlign::Bottom),
            Self::BottomCenter => (HAlign::Center, VAlign::Bottom),
            Self::BottomRight => (HAlign::Right, VAlign::Bottom),
        }
    }
}

/// Offset of a child's center from its parent's center, given the child
/// size, parent size, anchor and margins
///
/// Margins are `[left, top, right, bottom]` in world units and push the
/// child away from the edge it is anchored to.
pub fn relative_position(
    size: Vec2,
    parent_size: Vec2,
    alignment: Alignment,
    margin: [f32; 4],
) -> Vec2 {
    let (h, v) = alignment.split();
    let x = match h {
        HAlign::Left => -(parent_size.x - size.x) / 2.0 + margin[0],
        HAlign::Center => margin[0] - margin[2],
        HAlign::Right => (parent_size.x - size.x) / 2.0 - margin[2],
    };
    let y = match v {
        VAlign::Top => (parent_size.y - size.y) / 2.0 - margin[1],
        VAlign::Middle => margin[3] - margin[1],
        VAlign::Bottom => -(parent_size.y - size.y) / 2.0 + margin[3],
    };
    Vec2::new(x, y)
}

/// One texture in a layered graphics stack
#[derive(Debug, Clone)]
pub struct TextureLayer {
    /// The texture's resource name
    pub name: String,
    /// Resolved drawable handle
    pub drawable: TypedHandle<Drawable>,
    /// Anchor within the component bounds
    pub alignment: Alignment,
    /// Margins `[left, top, right, bottom]`
    pub margin: [f32; 4],
    /// Order in the layer stack (lower renders first)
    pub z_index: i32,
    /// Natural size of the texture
    pub size: Vec2,
    /// Computed offset from the component center
    pub offset: Vec2,
}

// Alignment names stay strings here: the params blob is deserialized from a
// dynamic value tree, which is only self-describing for primitives.
fn resolve_alignment(
    name: Option<&str>,
    component: &str,
) -> Result<Alignment, AssemblyError> {
    match name {
        None => Ok(Alignment::default()),
        Some(name) => Alignment::from_name(name).ok_or_else(|| AssemblyError::InvalidParams {
            name: component.to_string(),
            reason: format!("unknown alignment '{name}'"),
        }),
    }
}

#[derive(Debug, Deserialize)]
struct SpriteParams {
    texture: String,
    #[serde(default)]
    alignment: Option<String>,
    #[serde(default)]
    margin: [f32; 4],
    #[serde(default)]
    z_index: i32,
}

/// Graphics component drawing a single texture
pub struct SpriteGraphics {
    core: ComponentCore,
    drawable: TypedHandle<Drawable>,
    alignment: Alignment,
    margin: [f32; 4],
    z_index: i32,
    size: Vec2,
    offset: Vec2,
    world_position: Vec2,
}

impl SpriteGraphics {
    /// Build from a component descriptor, resolving the texture handle
    pub fn from_config(
        config: &ComponentConfig,
        assets: &mut AssetCatalog,
    ) -> Result<Self, AssemblyError> {
        let params: SpriteParams = config.params()?;
        let alignment = resolve_alignment(params.alignment.as_deref(), &config.name)?;
        let drawable = assets
            .drawable(&params.texture)
            .ok_or_else(|| AssemblyError::UnknownAsset(params.texture.clone()))?;
        let size = assets
            .drawable_info(drawable)
            .map_or_else(Vec2::zeros, |info| info.size);
        Ok(Self {
            core: ComponentCore::new(ComponentId::new(config.id), ComponentKind::Graphics),
            drawable,
            alignment,
            margin: params.margin,
            z_index: params.z_index,
            size,
            offset: Vec2::zeros(),
            world_position: Vec2::zeros(),
        })
    }

    /// Boxed factory used by the component registry
    pub fn build(
        config: &ComponentConfig,
        assets: &mut AssetCatalog,
    ) -> Result<Box<dyn Component>, AssemblyError> {
        Ok(Box::new(Self::from_config(config, assets)?))
    }

    /// The resolved drawable handle
    pub fn drawable(&self) -> TypedHandle<Drawable> {
        self.drawable
    }

    /// Natural size of the sprite
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Render order
    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    /// Offset from the owning entity's center
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// World position computed during the last update
    pub fn world_position(&self) -> Vec2 {
        self.world_position
    }
}

impl Component for SpriteGraphics {
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

    fn on_attach(&mut self, parent: &mut Entity) {
        let scaled = self.size.component_mul(&parent.scale());
        if parent.size() == Vec2::zeros() {
            // First graphics component establishes the entity bounds.
            parent.set_size(scaled);
        }
        self.offset = relative_position(scaled, parent.size(), self.alignment, self.margin);
        self.world_position = parent.position() + self.offset;
    }

    fn update(&mut self, parent: &mut Entity, physics: &mut PhysicsWorld, delta_time: f32) {
        if self.core.is_disposed() {
            return;
        }
        self.world_position = parent.position() + self.offset;
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
}

#[derive(Debug, Deserialize)]
struct LayerParams {
    texture: String,
    #[serde(default)]
    alignment: Option<String>,
    #[serde(default)]
    margin: [f32; 4],
    #[serde(default)]
    z_index: i32,
}

#[derive(Debug, Deserialize)]
struct LayeredParams {
    layers: Vec<LayerParams>,
}

/// Graphics component stacking several textures by z-index
///
/// The component bounds are the maximum layer extents; each layer is
/// positioned within them by its own alignment and margin.
pub struct LayeredGraphics {
    core: ComponentCore,
    layers: Vec<TextureLayer>,
    size: Vec2,
    world_position: Vec2,
}

impl LayeredGraphics {
    /// Build from a component descriptor, resolving every layer texture
    ///
    /// Layers whose texture does not resolve are skipped with a warning;
    /// the remaining layers are kept in z-index order.
    pub fn from_config(
        config: &ComponentConfig,
        assets: &mut AssetCatalog,
    ) -> Result<Self, AssemblyError> {
        let params: LayeredParams = config.params()?;
        let mut layers = Vec::with_capacity(params.layers.len());
        for layer in params.layers {
            let alignment = resolve_alignment(layer.alignment.as_deref(), &config.name)?;
            let Some(drawable) = assets.drawable(&layer.texture) else {
                log::warn!(
                    "layer texture '{}' not found; skipping layer in component '{}'",
                    layer.texture,
                    config.name
                );
                continue;
            };
            let size = assets
                .drawable_info(drawable)
                .map_or_else(Vec2::zeros, |info| info.size);
            layers.push(TextureLayer {
                name: layer.texture,
                drawable,
                alignment,
                margin: layer.margin,
                z_index: layer.z_index,
                size,
                offset: Vec2::zeros(),
            });
        }
        layers.sort_by_key(|layer| layer.z_index);

        let size = layers.iter().fold(Vec2::zeros(), |acc, layer| {
            Vec2::new(acc.x.max(layer.size.x), acc.y.max(layer.size.y))
        });
        Ok(Self {
            core: ComponentCore::new(ComponentId::new(config.id), ComponentKind::Graphics),
            layers,
            size,
            world_position: Vec2::zeros(),
        })
    }

    /// Boxed factory used by the component registry
    pub fn build(
        config: &ComponentConfig,
        assets: &mut AssetCatalog,
    ) -> Result<Box<dyn Component>, AssemblyError> {
        Ok(Box::new(Self::from_config(config, assets)?))
    }

    /// The layers in render order
    pub fn layers(&self) -> &[TextureLayer] {
        &self.layers
    }

    /// Component bounds (maximum layer extents)
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// World position computed during the last update
    pub fn world_position(&self) -> Vec2 {
        self.world_position
    }
}

impl Component for LayeredGraphics {
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

    fn on_attach(&mut self, parent: &mut Entity) {
        let scaled = self.size.component_mul(&parent.scale());
        if parent.size() == Vec2::zeros() {
            parent.set_size(scaled);
        }
        for layer in &mut self.layers {
            let layer_size = layer.size.component_mul(&parent.scale());
            layer.offset = relative_position(layer_size, scaled, layer.alignment, layer.margin);
        }
        self.world_position = parent.position();
    }

    fn update(&mut self, parent: &mut Entity, physics: &mut PhysicsWorld, delta_time: f32) {
        if self.core.is_disposed() {
            return;
        }
        self.world_position = parent.position();
        self.core.update_children(parent, physics, delta_time);
    }

    fn dispose(&mut self, physics: &mut PhysicsWorld, events: &mut EventRegistry) {
        if !self.core.mark_disposed() {
            return;
        }
        self.core.dispose_children(physics, events);
        self.core.unsubscribe_all(events);
        self.layers.clear();
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::DrawableDef;
    use crate::entity::{EntityKind, Stage};
    use approx::assert_relative_eq;

    fn catalog() -> AssetCatalog {
        let mut catalog = AssetCatalog::new();
        catalog.register_drawable(DrawableDef {
            name: "panel".into(),
            path: "textures/panel.png".into(),
            size: (4.0, 2.0),
        });
        catalog.register_drawable(DrawableDef {
            name: "icon".into(),
            path: "textures/icon.png".into(),
            size: (1.0, 1.0),
        });
        catalog
    }

    fn sprite_config(id: u32, texture: &str) -> ComponentConfig {
        let source = format!(
            r#"(id: {id}, kind: graphics, name: "sprite", params: (texture: "{texture}"))"#
        );
        ron::from_str(&source).unwrap()
    }

    #[test]
    fn test_relative_position_anchors() {
        let size = Vec2::new(2.0, 2.0);
        let parent = Vec2::new(10.0, 6.0);

        let middle = relative_position(size, parent, Alignment::Middle, [0.0; 4]);
        assert_relative_eq!(middle.x, 0.0);
        assert_relative_eq!(middle.y, 0.0);

        let top_left = relative_position(size, parent, Alignment::TopLeft, [0.0; 4]);
        assert_relative_eq!(top_left.x, -4.0);
        assert_relative_eq!(top_left.y, 2.0);

        let bottom_right = relative_position(size, parent, Alignment::BottomRight, [0.0; 4]);
        assert_relative_eq!(bottom_right.x, 4.0);
        assert_relative_eq!(bottom_right.y, -2.0);
    }

    #[test]
    fn test_margins_push_away_from_anchored_edge() {
        let size = Vec2::new(2.0, 2.0);
        let parent = Vec2::new(10.0, 6.0);

        let anchored = relative_position(size, parent, Alignment::TopLeft, [1.0, 0.5, 0.0, 0.0]);
        assert_relative_eq!(anchored.x, -3.0);
        assert_relative_eq!(anchored.y, 1.5);
    }

    #[test]
    fn test_sprite_resolves_drawable_and_sets_entity_size() {
        let mut assets = catalog();
        let mut stage = Stage::new();
        let key = stage.spawn(EntityKind::Hud, Vec2::new(3.0, 1.0), Vec2::new(1.0, 1.0));

        let mut sprite =
            SpriteGraphics::from_config(&sprite_config(1, "panel"), &mut assets).unwrap();
        assert_eq!(sprite.size(), Vec2::new(4.0, 2.0));

        let entity = stage.get_mut(key).unwrap();
        sprite.set_parent(key);
        sprite.on_attach(entity);
        assert_eq!(entity.size(), Vec2::new(4.0, 2.0));
        assert_eq!(sprite.world_position(), Vec2::new(3.0, 1.0));
    }

    #[test]
    fn test_sprite_with_unknown_texture_fails_resolution() {
        let mut assets = catalog();
        let result = SpriteGraphics::from_config(&sprite_config(1, "missing"), &mut assets);
        assert!(matches!(result, Err(AssemblyError::UnknownAsset(_))));
    }

    #[test]
    fn test_layers_are_sorted_by_z_index() {
        let mut assets = catalog();
        let config: ComponentConfig = ron::from_str(
            r#"(
                id: 2,
                kind: graphics,
                name: "layered_sprite",
                params: (layers: [
                    (texture: "icon", z_index: 5),
                    (texture: "panel", z_index: 1),
                    (texture: "nonexistent", z_index: 3),
                ]),
            )"#,
        )
        .unwrap();

        let layered = LayeredGraphics::from_config(&config, &mut assets).unwrap();
        let names: Vec<&str> = layered.layers().iter().map(|l| l.name.as_str()).collect();
        // The unresolvable texture was skipped; the rest are z-ordered.
        assert_eq!(names, vec!["panel", "icon"]);
        assert_eq!(layered.size(), Vec2::new(4.0, 2.0));
    }
}

//! Collision layer system for filtering collision detection
//!
//! Layers and masks are declared by name in component configuration and
//! mapped onto the simulation's interaction groups: two colliders interact
//! when each one's layer is contained in the other's mask.

use rapier2d::prelude::Group;

bitflags::bitflags! {
    /// Collision layer bitmask
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CollisionLayers: u32 {
        /// The player character
        const PLAYER = 1 << 0;
        /// Collectible items (falling letters)
        const ITEM = 1 << 1;
        /// Static level geometry
        const TERRAIN = 1 << 2;
        /// Trigger volumes with no physical response
        const TRIGGER = 1 << 3;
    }
}

impl Default for CollisionLayers {
    fn default() -> Self {
        Self::all()
    }
}

impl CollisionLayers {
    /// Resolve a single layer from its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "player" => Some(Self::PLAYER),
            "item" => Some(Self::ITEM),
            "terrain" => Some(Self::TERRAIN),
            "trigger" => Some(Self::TRIGGER),
            _ => None,
        }
    }

    /// Combine a list of configuration names into one mask
    ///
    /// Unknown names are skipped with a warning; an empty list yields the
    /// empty mask.
    pub fn from_names(names: &[String]) -> Self {
        let mut layers = Self::empty();
        for name in names {
            match Self::from_name(name) {
                Some(layer) => layers |= layer,
                None => log::warn!("unknown collision layer '{name}' ignored"),
            }
        }
        layers
    }

    pub(crate) fn to_group(self) -> Group {
        Group::from_bits_truncate(self.bits())
    }
}

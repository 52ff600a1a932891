//! Collision layers
//!
//! Every hitbox sits on one or more layers and reacts to the layers in its
//! mask. Two entities interact when one's mask names the other's layer.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Bit set of collision layers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CollisionLayer: u32 {
        const PLAYER = 1;
        const ENEMY = 1 << 1;
        const PLAYER_PROJECTILE = 1 << 2;
        const ENEMY_PROJECTILE = 1 << 3;
        const WALL = 1 << 4;
        const INTERACTABLE = 1 << 5;
        const ENEMY_ROOM_TRIGGER = 1 << 6;
    }
}

impl CollisionLayer {
    /// What walls block
    pub const WALL_MASK: CollisionLayer = Self::PLAYER
        .union(Self::ENEMY)
        .union(Self::ENEMY_PROJECTILE)
        .union(Self::PLAYER_PROJECTILE);
    /// Only the player sets off room triggers
    pub const TRIGGER_MASK: CollisionLayer = Self::PLAYER;
}

/// Whether an entity with `mask` reacts to one on `layer`
#[inline]
pub fn reacts_to(mask: CollisionLayer, layer: CollisionLayer) -> bool {
    mask.intersects(layer)
}

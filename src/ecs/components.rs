//! ECS Components
//!
//! All components used in the game's entity-component system.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use crate::combat::CollisionLayer;
use crate::entities::loot::LootDrop;
use crate::entities::EnemyKind;
use crate::game::screens::Destination;
use crate::spells::{ProjectileBehaviour, ProjectileSpellId};
use crate::world::encounter::EncounterKey;

// ============================================================================
// Math
// ============================================================================

/// 2D vector in world units (pixels)
pub use glam::Vec2;

// ============================================================================
// Position & Movement
// ============================================================================

/// Position in the game world (center of the entity)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position(pub Vec2);

/// Velocity and dash state for moving entities
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Motion {
    pub velocity: Vec2,
    /// While dashing, normal steering is suspended and the entity decelerates
    pub is_dashing: bool,
}

/// Axis-aligned hitbox centered on the entity's position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hitbox {
    pub size: Vec2,
    /// Layers this entity occupies
    pub layer: CollisionLayer,
    /// Layers this entity reacts to
    pub mask: CollisionLayer,
}

impl Hitbox {
    pub fn new(size: Vec2, layer: CollisionLayer, mask: CollisionLayer) -> Self {
        Self { size, layer, mask }
    }

    /// Whether two hitboxes at the given centers overlap
    pub fn overlaps(&self, at: Vec2, other: &Hitbox, other_at: Vec2) -> bool {
        (at.x - other_at.x).abs() * 2.0 < self.size.x + other.size.x
            && (at.y - other_at.y).abs() * 2.0 < self.size.y + other.size.y
    }
}

// ============================================================================
// Identity
// ============================================================================

/// Marks an entity as the player
#[derive(Debug, Clone, Copy, Default)]
pub struct Player;

/// Health pool
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let actual = amount.min(self.current).max(0);
        self.current -= actual;
        actual
    }

    pub fn heal(&mut self, amount: i32) -> i32 {
        let actual = amount.min(self.max - self.current).max(0);
        self.current += actual;
        actual
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0
    }
}

// ============================================================================
// Combat
// ============================================================================

/// A live projectile
#[derive(Debug, Clone)]
pub struct Projectile {
    pub spell: ProjectileSpellId,
    pub damage: i32,
    /// Seconds left before the projectile expires
    pub lifetime: f32,
    pub behaviour: ProjectileBehaviour,
    /// Launch speed, the cap for steering
    pub speed: f32,
    pub owner: Entity,
    pub fired_by_player: bool,
    /// Lingering projectiles keep hitting; each target is re-hit after this many seconds
    pub rehit_delay: Option<f32>,
    pub recent_hits: Vec<(Entity, f32)>,
}

/// Static or raised wall segment
#[derive(Debug, Clone, Copy, Default)]
pub struct Wall;

/// Breakable crate placed by room templates
#[derive(Debug, Clone, Copy, Default)]
pub struct Destructible;

/// What an enemy or box drops when it dies
#[derive(Debug, Clone, Copy)]
pub struct Lootable(pub LootDrop);

// ============================================================================
// Encounters
// ============================================================================

/// Enemy spawned by an encounter room; its death is reported to that room
#[derive(Debug, Clone, Copy)]
pub struct RoomMember(pub EncounterKey);

/// Trigger volume that activates an encounter when the player overlaps it
#[derive(Debug, Clone, Copy)]
pub struct RoomTrigger(pub EncounterKey);

/// Wall raised while an encounter is in progress
#[derive(Debug, Clone, Copy)]
pub struct BoundaryWall(pub EncounterKey);

/// Placeholder that turns into an enemy when its timer fires
#[derive(Debug, Clone, Copy)]
pub struct SpawnIndicator {
    pub kind: EnemyKind,
    pub encounter: Option<EncounterKey>,
    /// Summoned minions have reduced health and never drop loot
    pub minion: bool,
}

// ============================================================================
// Interactables
// ============================================================================

/// Something the player can use by standing next to it and interacting
#[derive(Debug, Clone, Copy)]
pub enum Interactable {
    Pickup(LootDrop),
    Door(Destination),
    Fountain { heal: i32 },
    /// Trades half of the player's current health for relics
    Sacrifice { relics: u32 },
    /// Looks like a chest until someone tries to open it
    Mimic,
    /// Talks; the line state lives in the entity's `Npc` component
    Npc,
}

/// One of two offers in a choice room; taking it removes the other
#[derive(Debug, Clone, Copy)]
pub struct ChoiceSibling(pub Entity);

//! Enemy tunables for data-driven enemy creation
//!
//! One row of numbers per [`EnemyKind`], loaded from `enemies.ron` with the
//! table below as the fallback.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::ecs::Vec2;
use crate::entities::EnemyKind;
use crate::spells::ProjectileSpellId;

/// How an enemy fires when its attack recharges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttackPattern {
    Single,
    /// `shots` casts spread `spacing` radians apart, centred on the aim
    Fan { shots: u32, spacing: f32 },
    /// `count` casts `delay` seconds apart
    Burst { count: u32, delay: f32 },
}

/// Movement while in shooting range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngageStyle {
    /// Drift in random directions
    Wander,
    /// Keep closing the distance
    Chase,
    /// Stand still
    Hold,
}

/// Numbers for one archetype
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTunables {
    pub kind: EnemyKind,
    pub max_health: i32,
    /// World units per second
    pub speed: f32,
    pub detection_range: f32,
    pub shooting_range: f32,
    /// Flee when the player is within this fraction of the shooting range
    pub flee_fraction: Option<f32>,
    /// Seconds between attacks
    pub recharge: f32,
    pub hitbox: Vec2,
    pub attack: AttackPattern,
    pub spell: ProjectileSpellId,
    pub engage: EngageStyle,
    /// Chance to carry a drop
    pub loot_chance: f32,
}

/// Every archetype's tunables, indexed by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<EnemyTunables>", into = "Vec<EnemyTunables>")]
pub struct EnemyTable {
    rows: Vec<EnemyTunables>,
}

impl EnemyTable {
    /// Table with `rows` overriding the built-in row of the same kind
    pub fn from_rows(rows: Vec<EnemyTunables>) -> Self {
        let mut table = default_enemy_table();
        for row in rows {
            let index = row.kind as usize;
            table.rows[index] = row;
        }
        table
    }

    pub fn get(&self, kind: EnemyKind) -> &EnemyTunables {
        &self.rows[kind as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnemyTunables> {
        self.rows.iter()
    }
}

impl Default for EnemyTable {
    fn default() -> Self {
        default_enemy_table()
    }
}

impl From<Vec<EnemyTunables>> for EnemyTable {
    fn from(rows: Vec<EnemyTunables>) -> Self {
        Self::from_rows(rows)
    }
}

impl From<EnemyTable> for Vec<EnemyTunables> {
    fn from(table: EnemyTable) -> Self {
        table.rows
    }
}

const SHOOTING_FRACTION: f32 = 0.7;
const ENEMY_HITBOX: Vec2 = Vec2::new(20.0, 40.0);
const DROP_CHANCE: f32 = 0.3;

/// Create the default enemy table (hardcoded fallback)
pub fn default_enemy_table() -> EnemyTable {
    let rows = vec![
        EnemyTunables {
            kind: EnemyKind::Ranged,
            max_health: 40,
            speed: 150.0,
            detection_range: 600.0,
            shooting_range: 600.0 * SHOOTING_FRACTION,
            flee_fraction: Some(0.5),
            recharge: 1.5,
            hitbox: ENEMY_HITBOX,
            attack: AttackPattern::Burst { count: 4, delay: 0.11 },
            spell: ProjectileSpellId::RedOrb,
            engage: EngageStyle::Wander,
            loot_chance: DROP_CHANCE,
        },
        EnemyTunables {
            kind: EnemyKind::Shotgun,
            max_health: 50,
            speed: 175.0,
            detection_range: 600.0,
            shooting_range: 600.0 * SHOOTING_FRACTION,
            flee_fraction: Some(0.5),
            recharge: 1.5,
            hitbox: ENEMY_HITBOX,
            attack: AttackPattern::Fan { shots: 3, spacing: 2.0 * PI / 11.0 },
            spell: ProjectileSpellId::RedOrb,
            engage: EngageStyle::Wander,
            loot_chance: DROP_CHANCE,
        },
        EnemyTunables {
            kind: EnemyKind::Melee,
            max_health: 60,
            speed: 220.0,
            detection_range: 600.0,
            shooting_range: 48.0,
            flee_fraction: None,
            recharge: 1.0,
            hitbox: ENEMY_HITBOX,
            attack: AttackPattern::Single,
            spell: ProjectileSpellId::FakeMelee,
            engage: EngageStyle::Chase,
            loot_chance: DROP_CHANCE,
        },
        EnemyTunables {
            kind: EnemyKind::Tower,
            max_health: 80,
            speed: 0.0,
            detection_range: 700.0,
            shooting_range: 700.0 * SHOOTING_FRACTION,
            flee_fraction: None,
            recharge: 2.0,
            hitbox: Vec2::new(32.0, 48.0),
            attack: AttackPattern::Burst { count: 4, delay: 0.11 },
            spell: ProjectileSpellId::MediumSpeedRedOrb,
            engage: EngageStyle::Hold,
            loot_chance: DROP_CHANCE,
        },
        EnemyTunables {
            kind: EnemyKind::Dummy,
            max_health: 20,
            speed: 0.0,
            detection_range: 0.0,
            shooting_range: 0.0,
            flee_fraction: None,
            recharge: 0.0,
            hitbox: ENEMY_HITBOX,
            attack: AttackPattern::Single,
            spell: ProjectileSpellId::RedOrb,
            engage: EngageStyle::Hold,
            loot_chance: 0.0,
        },
        EnemyTunables {
            kind: EnemyKind::Boss1,
            max_health: 600,
            speed: 150.0,
            detection_range: 2000.0,
            shooting_range: 1500.0,
            flee_fraction: None,
            recharge: 1.5,
            hitbox: Vec2::new(40.0, 70.0),
            attack: AttackPattern::Single,
            spell: ProjectileSpellId::MediumSpeedRedOrb,
            engage: EngageStyle::Hold,
            loot_chance: 0.0,
        },
        EnemyTunables {
            kind: EnemyKind::Boss2,
            max_health: 300,
            speed: 150.0,
            detection_range: 2000.0,
            shooting_range: 1500.0,
            flee_fraction: None,
            recharge: 1.5,
            hitbox: Vec2::new(24.0, 40.0),
            attack: AttackPattern::Single,
            spell: ProjectileSpellId::MediumSpeedRedOrb,
            engage: EngageStyle::Hold,
            loot_chance: 0.0,
        },
    ];
    EnemyTable { rows }
}

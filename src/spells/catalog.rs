//! Spell catalog
//!
//! Immutable base definitions for every projectile and movement spell. The
//! catalog is loaded once and passed by reference to whoever casts; casting
//! always works on a clone so the base values never change.

use serde::{Deserialize, Serialize};

use super::relics::RelicTuning;
use crate::ecs::Vec2;

/// Projectile velocity below this is treated as stopped
pub const STOPPED_SPEED: f32 = 0.1;
/// A returning projectile is caught once it is this close to its owner
pub const CATCH_DISTANCE: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileSpellId {
    Fireball,
    Waterball,
    Shotgun,
    ThornBomb,
    Thorn,
    Boomerang,
    BoomerangReturn,
    Magnet,
    Lightning,
    Acid,
    AcidEffect,
    Cutter,
    CutterLeft,
    CutterRight,
    // Enemy and boss spells
    RedOrb,
    MediumSpeedRedOrb,
    FakeMelee,
    BossOrb,
}

impl ProjectileSpellId {
    pub const ALL: [ProjectileSpellId; 18] = [
        ProjectileSpellId::Fireball,
        ProjectileSpellId::Waterball,
        ProjectileSpellId::Shotgun,
        ProjectileSpellId::ThornBomb,
        ProjectileSpellId::Thorn,
        ProjectileSpellId::Boomerang,
        ProjectileSpellId::BoomerangReturn,
        ProjectileSpellId::Magnet,
        ProjectileSpellId::Lightning,
        ProjectileSpellId::Acid,
        ProjectileSpellId::AcidEffect,
        ProjectileSpellId::Cutter,
        ProjectileSpellId::CutterLeft,
        ProjectileSpellId::CutterRight,
        ProjectileSpellId::RedOrb,
        ProjectileSpellId::MediumSpeedRedOrb,
        ProjectileSpellId::FakeMelee,
        ProjectileSpellId::BossOrb,
    ];

    /// Spells a player can find as loot
    pub const PLAYER_CASTABLE: [ProjectileSpellId; 9] = [
        ProjectileSpellId::Fireball,
        ProjectileSpellId::Waterball,
        ProjectileSpellId::Shotgun,
        ProjectileSpellId::ThornBomb,
        ProjectileSpellId::Boomerang,
        ProjectileSpellId::Magnet,
        ProjectileSpellId::Lightning,
        ProjectileSpellId::Acid,
        ProjectileSpellId::Cutter,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementSpellId {
    Dash,
    Blink,
}

impl MovementSpellId {
    pub const ALL: [MovementSpellId; 2] = [MovementSpellId::Dash, MovementSpellId::Blink];
}

/// Any spell that can sit in a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpellRef {
    Projectile(ProjectileSpellId),
    Movement(MovementSpellId),
}

/// How a projectile moves and what it leaves behind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectileBehaviour {
    Straight,
    /// Slows down by `deceleration` units/s² until it stops
    Decelerating { deceleration: f32 },
    /// Fires `pellets` projectiles at random angles inside the spread
    Shotgun { pellets: u32, spread_degrees: f32 },
    /// Decelerates, then bursts into `shards` projectiles spaced evenly around the circle
    Shrapnel {
        deceleration: f32,
        shards: u32,
        jitter_degrees: f32,
        shard: ProjectileSpellId,
    },
    /// Decelerates, then sends `returns_as` back toward the owner
    Boomerang {
        deceleration: f32,
        returns_as: ProjectileSpellId,
    },
    /// Homes in on the owner and expires when caught
    Returning { seek_strength: f32 },
    /// Homes in on the nearest hostile
    Seeking { seek_strength: f32 },
    /// Decelerates, then leaves a damaging area
    Lingering {
        deceleration: f32,
        effect: ProjectileSpellId,
    },
    /// Stationary area that re-hits every `tick` seconds
    Area { tick: f32 },
    /// Replaced at cast time by two curving projectiles
    Split {
        left: ProjectileSpellId,
        right: ProjectileSpellId,
    },
    /// Launched `angle_offset` radians off-aim, then bends back by `curve_strength`
    Curving { angle_offset: f32, curve_strength: f32 },
}

/// Projectile spawned when another one expires
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeathSpawn {
    /// `count` copies of `spell`, evenly spaced and jittered
    Burst {
        spell: ProjectileSpellId,
        count: u32,
        jitter_degrees: f32,
    },
    /// One projectile aimed back at the owner
    ReturnToOwner(ProjectileSpellId),
    /// One stationary projectile on the spot
    Leave(ProjectileSpellId),
}

/// What the steering step needs to know about the projectile's surroundings
#[derive(Debug, Clone, Copy)]
pub struct SteerInput {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Max speed, usually the spell's launch speed
    pub speed: f32,
    /// Owner position for returning projectiles, nearest hostile for seekers
    pub target: Option<Vec2>,
    pub dt: f32,
}

impl ProjectileBehaviour {
    /// Velocity after one step
    pub fn steer(&self, input: SteerInput) -> Vec2 {
        let SteerInput { position, velocity, speed, target, dt } = input;
        match *self {
            ProjectileBehaviour::Decelerating { deceleration }
            | ProjectileBehaviour::Shrapnel { deceleration, .. }
            | ProjectileBehaviour::Boomerang { deceleration, .. }
            | ProjectileBehaviour::Lingering { deceleration, .. } => {
                if velocity.length() < STOPPED_SPEED {
                    return Vec2::ZERO;
                }
                let slowed = velocity - velocity.normalize_or_zero() * deceleration * dt;
                // Never reverse direction
                if slowed.dot(velocity) <= 0.0 {
                    Vec2::ZERO
                } else {
                    slowed
                }
            }
            ProjectileBehaviour::Seeking { seek_strength }
            | ProjectileBehaviour::Returning { seek_strength } => match target {
                Some(target) => {
                    let pull = (target - position).normalize_or_zero() * seek_strength * dt;
                    cap_speed(velocity + pull, speed)
                }
                None => velocity,
            },
            ProjectileBehaviour::Curving { curve_strength, .. } => {
                let heading = velocity.normalize_or_zero();
                let perpendicular = Vec2::new(-heading.y, heading.x);
                let bend = (perpendicular * curve_strength - heading * 0.1) * dt * speed;
                cap_speed(velocity + bend, speed)
            }
            ProjectileBehaviour::Area { .. } => Vec2::ZERO,
            ProjectileBehaviour::Straight
            | ProjectileBehaviour::Shotgun { .. }
            | ProjectileBehaviour::Split { .. } => velocity,
        }
    }

    /// What replaces the projectile when its lifetime runs out
    pub fn on_expire(&self) -> Option<DeathSpawn> {
        match *self {
            ProjectileBehaviour::Shrapnel { shards, jitter_degrees, shard, .. } => Some(DeathSpawn::Burst {
                spell: shard,
                count: shards,
                jitter_degrees,
            }),
            ProjectileBehaviour::Boomerang { returns_as, .. } => Some(DeathSpawn::ReturnToOwner(returns_as)),
            ProjectileBehaviour::Lingering { effect, .. } => Some(DeathSpawn::Leave(effect)),
            _ => None,
        }
    }

    /// Whether the projectile survives touching a damageable target
    pub fn pierces(&self) -> bool {
        matches!(self, ProjectileBehaviour::Area { .. } | ProjectileBehaviour::Returning { .. })
    }

    /// Whether the projectile ignores walls
    pub fn passes_walls(&self) -> bool {
        matches!(self, ProjectileBehaviour::Area { .. })
    }

    /// Whether the projectile is caught by its owner when close
    pub fn returns_to_owner(&self) -> bool {
        matches!(self, ProjectileBehaviour::Returning { .. })
    }
}

fn cap_speed(velocity: Vec2, speed: f32) -> Vec2 {
    if velocity.length() > speed {
        velocity.normalize_or_zero() * speed
    } else {
        velocity
    }
}

/// Base numbers for a projectile spell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpell {
    pub id: ProjectileSpellId,
    pub cooldown: f32,
    #[serde(default = "default_projectile_internal")]
    pub internal_cooldown: f32,
    #[serde(default = "default_num_casts")]
    pub num_casts: i32,
    pub damage: i32,
    pub speed: f32,
    /// Seconds
    pub lifetime: f32,
    pub behaviour: ProjectileBehaviour,
}

fn default_projectile_internal() -> f32 {
    0.05
}

fn default_movement_internal() -> f32 {
    0.1
}

fn default_num_casts() -> i32 {
    1
}

impl ProjectileSpell {
    const fn new(
        id: ProjectileSpellId,
        cooldown: f32,
        damage: i32,
        speed: f32,
        lifetime: f32,
        behaviour: ProjectileBehaviour,
    ) -> Self {
        Self {
            id,
            cooldown,
            internal_cooldown: 0.05,
            num_casts: 1,
            damage,
            speed,
            lifetime,
            behaviour,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MovementKind {
    /// Burst of velocity for `duration` seconds
    Dash { duration: f32 },
    /// Teleport after `cast_time` seconds
    Blink { cast_time: f32 },
}

/// Base numbers for a movement spell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementSpell {
    pub id: MovementSpellId,
    pub cooldown: f32,
    #[serde(default = "default_movement_internal")]
    pub internal_cooldown: f32,
    #[serde(default = "default_num_casts")]
    pub num_casts: i32,
    /// Dash strength or blink distance, in world units
    pub distance: f32,
    pub kind: MovementKind,
}

pub const FIREBALL: ProjectileSpell =
    ProjectileSpell::new(ProjectileSpellId::Fireball, 0.4, 5, 850.0, 0.6, ProjectileBehaviour::Straight);
pub const WATERBALL: ProjectileSpell = ProjectileSpell::new(
    ProjectileSpellId::Waterball,
    0.35,
    5,
    2000.0,
    0.75,
    ProjectileBehaviour::Decelerating { deceleration: 3000.0 },
);
pub const SHOTGUN: ProjectileSpell = ProjectileSpell::new(
    ProjectileSpellId::Shotgun,
    1.1,
    2,
    750.0,
    1.0,
    ProjectileBehaviour::Shotgun { pellets: 7, spread_degrees: 30.0 },
);
pub const THORN_BOMB: ProjectileSpell = ProjectileSpell::new(
    ProjectileSpellId::ThornBomb,
    1.0,
    0,
    550.0,
    0.85,
    ProjectileBehaviour::Shrapnel {
        deceleration: 500.0,
        shards: 12,
        jitter_degrees: 10.0,
        shard: ProjectileSpellId::Thorn,
    },
);
pub const THORN: ProjectileSpell = ProjectileSpell::new(
    ProjectileSpellId::Thorn,
    0.25,
    3,
    750.0,
    0.5,
    ProjectileBehaviour::Decelerating { deceleration: 1500.0 },
);
pub const BOOMERANG: ProjectileSpell = ProjectileSpell::new(
    ProjectileSpellId::Boomerang,
    0.5,
    0,
    1100.0,
    0.5,
    ProjectileBehaviour::Boomerang {
        deceleration: 2000.0,
        returns_as: ProjectileSpellId::BoomerangReturn,
    },
);
pub const BOOMERANG_RETURN: ProjectileSpell = ProjectileSpell::new(
    ProjectileSpellId::BoomerangReturn,
    0.75,
    10,
    1000.0,
    20.0,
    ProjectileBehaviour::Returning { seek_strength: 3000.0 },
);
pub const MAGNET: ProjectileSpell = ProjectileSpell::new(
    ProjectileSpellId::Magnet,
    0.4,
    2,
    500.0,
    5.0,
    ProjectileBehaviour::Seeking { seek_strength: 2500.0 },
);
pub const LIGHTNING: ProjectileSpell =
    ProjectileSpell::new(ProjectileSpellId::Lightning, 0.35, 5, 1200.0, 1.5, ProjectileBehaviour::Straight);
pub const ACID: ProjectileSpell = ProjectileSpell::new(
    ProjectileSpellId::Acid,
    1.0,
    0,
    500.0,
    0.75,
    ProjectileBehaviour::Lingering {
        deceleration: 750.0,
        effect: ProjectileSpellId::AcidEffect,
    },
);
pub const ACID_EFFECT: ProjectileSpell = ProjectileSpell::new(
    ProjectileSpellId::AcidEffect,
    0.3,
    1,
    0.0,
    5.0,
    ProjectileBehaviour::Area { tick: 0.3 },
);
pub const CUTTER: ProjectileSpell = ProjectileSpell::new(
    ProjectileSpellId::Cutter,
    0.55,
    0,
    1.0,
    0.5,
    ProjectileBehaviour::Split {
        left: ProjectileSpellId::CutterLeft,
        right: ProjectileSpellId::CutterRight,
    },
);
pub const CUTTER_LEFT: ProjectileSpell = ProjectileSpell::new(
    ProjectileSpellId::CutterLeft,
    0.0,
    8,
    1700.0,
    0.75,
    ProjectileBehaviour::Curving { angle_offset: -0.69, curve_strength: 6.5 },
);
pub const CUTTER_RIGHT: ProjectileSpell = ProjectileSpell::new(
    ProjectileSpellId::CutterRight,
    0.0,
    8,
    1700.0,
    0.75,
    ProjectileBehaviour::Curving { angle_offset: 0.69, curve_strength: -6.5 },
);
pub const RED_ORB: ProjectileSpell =
    ProjectileSpell::new(ProjectileSpellId::RedOrb, 0.0, 8, 330.0, 10.0, ProjectileBehaviour::Straight);
pub const MEDIUM_SPEED_RED_ORB: ProjectileSpell =
    ProjectileSpell::new(ProjectileSpellId::MediumSpeedRedOrb, 0.0, 15, 250.0, 10.0, ProjectileBehaviour::Straight);
pub const FAKE_MELEE: ProjectileSpell =
    ProjectileSpell::new(ProjectileSpellId::FakeMelee, 1.0, 8, 2000.0, 1.0, ProjectileBehaviour::Straight);
pub const BOSS_ORB: ProjectileSpell =
    ProjectileSpell::new(ProjectileSpellId::BossOrb, 0.0, 8, 570.0, 10.0, ProjectileBehaviour::Straight);

pub const DASH: MovementSpell = MovementSpell {
    id: MovementSpellId::Dash,
    cooldown: 1.5,
    internal_cooldown: 0.1,
    num_casts: 1,
    distance: 250.0,
    kind: MovementKind::Dash { duration: 0.25 },
};
pub const BLINK: MovementSpell = MovementSpell {
    id: MovementSpellId::Blink,
    cooldown: 1.5,
    internal_cooldown: 0.1,
    num_casts: 1,
    distance: 250.0,
    kind: MovementKind::Blink { cast_time: 0.25 },
};

/// Every spell and the relic numbers, passed to casters by reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellCatalog {
    pub projectiles: Vec<ProjectileSpell>,
    pub movements: Vec<MovementSpell>,
    #[serde(default)]
    pub relics: RelicTuning,
}

impl Default for SpellCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SpellCatalog {
    pub fn builtin() -> Self {
        Self {
            projectiles: vec![
                FIREBALL,
                WATERBALL,
                SHOTGUN,
                THORN_BOMB,
                THORN,
                BOOMERANG,
                BOOMERANG_RETURN,
                MAGNET,
                LIGHTNING,
                ACID,
                ACID_EFFECT,
                CUTTER,
                CUTTER_LEFT,
                CUTTER_RIGHT,
                RED_ORB,
                MEDIUM_SPEED_RED_ORB,
                FAKE_MELEE,
                BOSS_ORB,
            ],
            movements: vec![DASH, BLINK],
            relics: RelicTuning::default(),
        }
    }

    pub fn projectile(&self, id: ProjectileSpellId) -> Option<&ProjectileSpell> {
        self.projectiles.iter().find(|s| s.id == id)
    }

    pub fn movement(&self, id: MovementSpellId) -> Option<&MovementSpell> {
        self.movements.iter().find(|s| s.id == id)
    }

    /// Spell ids with no definition
    pub fn missing(&self) -> Vec<SpellRef> {
        let projectiles = ProjectileSpellId::ALL
            .iter()
            .filter(|id| self.projectile(**id).is_none())
            .map(|id| SpellRef::Projectile(*id));
        let movements = MovementSpellId::ALL
            .iter()
            .filter(|id| self.movement(**id).is_none())
            .map(|id| SpellRef::Movement(*id));
        projectiles.chain(movements).collect()
    }
}

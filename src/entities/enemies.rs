//! Enemy archetypes
//!
//! Every archetype is data (an [`EnemyTunables`] row) plus a step function
//! looked up in [`STEP_TABLE`] by [`EnemyKind`]. A step reads a snapshot of
//! the world ([`StepContext`]) and returns the effects it wants applied;
//! it never touches the world itself.

use hecs::{Entity, EntityBuilder, World};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bosses::{self, Boss1Brain, Boss2Brain};
use super::loot::roll_enemy_loot;
use crate::combat::CollisionLayer;
use crate::data::enemies::{AttackPattern, EngageStyle, EnemyTable, EnemyTunables};
use crate::ecs::{Health, Hitbox, Lootable, Motion, Position, RoomMember, Vec2};
use crate::spells::{SpellRef, SpellSlots};
use crate::world::EncounterKey;

/// Seconds an enemy idles before its first wander
pub const IDLE_TIMER_INIT: f32 = 1.0;
/// Fleeing ends once the player is farther than this fraction of detection range
pub const SAFE_FRACTION: f32 = 0.75;
pub const FLEE_SPEED_MULTIPLIER: f32 = 1.5;
/// Minions summoned by a boss spawn with this fraction of their health
pub const MINION_HEALTH_FRACTION: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Four-shot bursts from range
    Ranged,
    /// Three-shot fans from range
    Shotgun,
    /// Closes in and strikes
    Melee,
    /// Never moves
    Tower,
    /// Training target
    Dummy,
    Boss1,
    Boss2,
}

impl EnemyKind {
    pub const COUNT: usize = 7;

    pub const ALL: [EnemyKind; EnemyKind::COUNT] = [
        EnemyKind::Ranged,
        EnemyKind::Shotgun,
        EnemyKind::Melee,
        EnemyKind::Tower,
        EnemyKind::Dummy,
        EnemyKind::Boss1,
        EnemyKind::Boss2,
    ];

    pub fn is_boss(&self) -> bool {
        matches!(self, EnemyKind::Boss1 | EnemyKind::Boss2)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EnemyKind::Ranged => "Ranged",
            EnemyKind::Shotgun => "Shotgun",
            EnemyKind::Melee => "Melee",
            EnemyKind::Tower => "Tower",
            EnemyKind::Dummy => "Dummy",
            EnemyKind::Boss1 => "Boss 1",
            EnemyKind::Boss2 => "Boss 2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnemyError {
    #[error("enemy {entity:?} has no {component} component")]
    MissingComponent { entity: Entity, component: &'static str },
}

// ============================================================================
// Components
// ============================================================================

/// A hostile body: it can be hit, it counts as a kill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enemy {
    pub kind: EnemyKind,
}

/// Decision state for an entity that thinks each frame
#[derive(Debug, Clone, PartialEq)]
pub struct EnemyAi {
    pub kind: EnemyKind,
    pub brain: EnemyBrain,
}

impl EnemyAi {
    pub fn new(kind: EnemyKind) -> Self {
        Self {
            kind,
            brain: EnemyBrain::for_kind(kind),
        }
    }
}

/// The four baseline statuses every ordinary enemy cycles through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyStatus {
    Idle,
    Targeting,
    Shooting,
    Fleeing,
}

/// Timers and status of an ordinary enemy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicBrain {
    pub status: EnemyStatus,
    /// Seconds until the next random move
    pub idle_timer: f32,
    /// Seconds until the next attack
    pub attack_countdown: f32,
}

impl Default for BasicBrain {
    fn default() -> Self {
        Self {
            status: EnemyStatus::Idle,
            idle_timer: IDLE_TIMER_INIT,
            attack_countdown: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnemyBrain {
    Basic(BasicBrain),
    Boss1(Boss1Brain),
    Boss2(Boss2Brain),
    Inert,
}

impl EnemyBrain {
    pub fn for_kind(kind: EnemyKind) -> Self {
        match kind {
            EnemyKind::Ranged | EnemyKind::Shotgun | EnemyKind::Melee | EnemyKind::Tower => {
                EnemyBrain::Basic(BasicBrain::default())
            }
            EnemyKind::Dummy => EnemyBrain::Inert,
            EnemyKind::Boss1 => EnemyBrain::Boss1(Boss1Brain::default()),
            EnemyKind::Boss2 => EnemyBrain::Boss2(Boss2Brain::default()),
        }
    }
}

// ============================================================================
// Step interface
// ============================================================================

/// Live state of one boss segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentView {
    pub position: Vec2,
    pub velocity: Vec2,
    pub is_dashing: bool,
}

/// What a step function can see
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub dt: f32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub is_dashing: bool,
    pub player: Vec2,
    pub tunables: &'a EnemyTunables,
    /// Multi-part bosses only; `None` for a dead segment
    pub segments: [Option<SegmentView>; 2],
}

/// Which body an effect applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Owner,
    Segment(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnemyAction {
    SetVelocity(Vec2),
    SetDashing(bool),
    /// Cast from a slot without touching its cooldown
    Cast { slot: usize, direction: Vec2 },
    /// `count` casts `delay` seconds apart from the actor's current position
    Burst {
        slot: usize,
        direction: Vec2,
        count: u32,
        delay: f32,
    },
    /// Cast a movement slot through the cooldown rules, then clear its cooldown
    Dash { slot: usize, direction: Vec2 },
    SpawnMinion { position: Vec2 },
    /// Make one segment damageable and protect the other
    SetActiveSegment(usize),
    /// The actor now drops the exit door when it dies
    GrantDoorLoot,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyEffect {
    pub actor: Actor,
    pub action: EnemyAction,
}

impl EnemyEffect {
    pub fn owner(action: EnemyAction) -> Self {
        Self { actor: Actor::Owner, action }
    }

    pub fn segment(index: usize, action: EnemyAction) -> Self {
        Self {
            actor: Actor::Segment(index),
            action,
        }
    }
}

pub type StepFn = fn(&mut EnemyBrain, &StepContext, &mut dyn RngCore) -> Vec<EnemyEffect>;

/// Step function per archetype, indexed by `EnemyKind as usize`
pub const STEP_TABLE: [StepFn; EnemyKind::COUNT] = [
    basic_step,        // Ranged
    basic_step,        // Shotgun
    basic_step,        // Melee
    basic_step,        // Tower
    inert_step,        // Dummy
    bosses::boss1_step,
    bosses::boss2_step,
];

pub fn step(ai: &mut EnemyAi, ctx: &StepContext, rng: &mut dyn RngCore) -> Vec<EnemyEffect> {
    STEP_TABLE[ai.kind as usize](&mut ai.brain, ctx, rng)
}

fn inert_step(_: &mut EnemyBrain, _: &StepContext, _: &mut dyn RngCore) -> Vec<EnemyEffect> {
    Vec::new()
}

// ============================================================================
// Baseline behaviour
// ============================================================================

/// Distance checks for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Senses {
    pub in_detect: bool,
    pub in_shoot: bool,
    pub in_flee: bool,
    pub out_of_flee: bool,
}

impl Senses {
    pub fn measure(distance: f32, tunables: &EnemyTunables) -> Self {
        let flee_range = tunables.flee_fraction.map(|f| tunables.shooting_range * f);
        Self {
            in_detect: distance <= tunables.detection_range,
            in_shoot: distance <= tunables.shooting_range,
            in_flee: flee_range.is_some_and(|r| distance <= r),
            out_of_flee: distance > tunables.detection_range * SAFE_FRACTION,
        }
    }
}

/// Status transition. Fleeing takes priority over shooting.
pub fn think(status: EnemyStatus, senses: Senses) -> EnemyStatus {
    match status {
        EnemyStatus::Idle if senses.in_detect => EnemyStatus::Targeting,
        EnemyStatus::Targeting | EnemyStatus::Shooting if senses.in_flee => EnemyStatus::Fleeing,
        EnemyStatus::Targeting if senses.in_shoot => EnemyStatus::Shooting,
        EnemyStatus::Shooting if !senses.in_shoot => EnemyStatus::Targeting,
        EnemyStatus::Fleeing if senses.out_of_flee => EnemyStatus::Targeting,
        other => other,
    }
}

fn random_direction(rng: &mut dyn RngCore) -> Vec2 {
    let dir = Vec2::new(rng.gen::<f32>() * 2.0 - 1.0, rng.gen::<f32>() * 2.0 - 1.0).normalize_or_zero();
    if dir == Vec2::ZERO {
        Vec2::new(1.0, 0.0)
    } else {
        dir
    }
}

impl BasicBrain {
    /// New random velocity once the idle timer runs out
    fn wander(&mut self, dt: f32, speed: f32, move_chance: f32, rng: &mut dyn RngCore) -> Option<Vec2> {
        if self.idle_timer > 0.0 {
            self.idle_timer = (self.idle_timer - dt).max(0.0);
            return None;
        }
        let dir = random_direction(rng);
        let velocity = if rng.gen::<f32>() < move_chance { dir * speed } else { Vec2::ZERO };
        self.idle_timer = 1.0 + rng.gen::<f32>() * 1.5;
        Some(velocity)
    }

    /// Attack effects if the recharge countdown has run out
    fn attack(&mut self, dt: f32, tunables: &EnemyTunables, aim: Vec2) -> Vec<EnemyEffect> {
        let mut effects = Vec::new();
        if self.attack_countdown <= 0.0 {
            self.attack_countdown = tunables.recharge;
            effects = attack_effects(tunables.attack, aim);
        }
        if self.attack_countdown > 0.0 {
            self.attack_countdown = (self.attack_countdown - dt).max(0.0);
        }
        effects
    }
}

pub fn attack_effects(pattern: AttackPattern, aim: Vec2) -> Vec<EnemyEffect> {
    match pattern {
        AttackPattern::Single => vec![EnemyEffect::owner(EnemyAction::Cast { slot: 0, direction: aim })],
        AttackPattern::Fan { shots, spacing } => (0..shots)
            .map(|i| {
                let offset = (i as f32 - (shots.saturating_sub(1)) as f32 / 2.0) * spacing;
                EnemyEffect::owner(EnemyAction::Cast {
                    slot: 0,
                    direction: Vec2::from_angle(offset).rotate(aim),
                })
            })
            .collect(),
        AttackPattern::Burst { count, delay } => vec![EnemyEffect::owner(EnemyAction::Burst {
            slot: 0,
            direction: aim,
            count,
            delay,
        })],
    }
}

fn basic_step(brain: &mut EnemyBrain, ctx: &StepContext, rng: &mut dyn RngCore) -> Vec<EnemyEffect> {
    let EnemyBrain::Basic(state) = brain else {
        log::debug!("Basic step called with a {:?} brain", brain);
        return Vec::new();
    };
    let t = ctx.tunables;
    let to_player = ctx.player - ctx.position;
    let toward = to_player.normalize_or_zero();

    state.status = think(state.status, Senses::measure(to_player.length(), t));

    let mut effects = Vec::new();
    let set_velocity = |v: Vec2, effects: &mut Vec<EnemyEffect>| {
        effects.push(EnemyEffect::owner(EnemyAction::SetVelocity(v)));
    };

    match state.status {
        EnemyStatus::Idle => {
            if let Some(v) = state.wander(ctx.dt, t.speed * 0.5, 0.8, rng) {
                set_velocity(v, &mut effects);
            }
        }
        EnemyStatus::Targeting => set_velocity(toward * t.speed, &mut effects),
        EnemyStatus::Shooting => {
            match t.engage {
                EngageStyle::Wander => {
                    if let Some(v) = state.wander(ctx.dt, t.speed, 1.0, rng) {
                        set_velocity(v, &mut effects);
                    }
                }
                EngageStyle::Chase => set_velocity(toward * t.speed, &mut effects),
                EngageStyle::Hold => set_velocity(Vec2::ZERO, &mut effects),
            }
            effects.extend(state.attack(ctx.dt, t, to_player));
        }
        EnemyStatus::Fleeing => {
            set_velocity(-toward * t.speed * FLEE_SPEED_MULTIPLIER, &mut effects);
            effects.extend(state.attack(ctx.dt, t, to_player));
        }
    }
    effects
}

// ============================================================================
// Spawning
// ============================================================================

/// Options for one spawned enemy
#[derive(Debug, Clone, Copy, Default)]
pub struct SpawnOptions {
    pub encounter: Option<EncounterKey>,
    /// Boss minions: reduced health, no loot
    pub minion: bool,
}

/// Spawn an ordinary enemy at `pos`. Bosses go through [`bosses::spawn_boss`].
pub fn spawn_enemy(
    world: &mut World,
    kind: EnemyKind,
    pos: Vec2,
    table: &EnemyTable,
    options: SpawnOptions,
    rng: &mut impl Rng,
) -> Entity {
    let tunables = table.get(kind);
    let health = if options.minion {
        ((tunables.max_health as f32 * MINION_HEALTH_FRACTION) as i32).max(1)
    } else {
        tunables.max_health
    };

    let mut builder = EntityBuilder::new();
    builder.add_bundle((
        Enemy { kind },
        EnemyAi::new(kind),
        Position(pos),
        Motion::default(),
        Hitbox::new(
            tunables.hitbox,
            CollisionLayer::ENEMY,
            CollisionLayer::WALL | CollisionLayer::PLAYER,
        ),
        Health::new(health),
        SpellSlots::new(&[SpellRef::Projectile(tunables.spell)]),
    ));
    if let Some(key) = options.encounter {
        builder.add(RoomMember(key));
    }
    if !options.minion {
        if let Some(drop) = roll_enemy_loot(tunables.loot_chance, rng) {
            builder.add(Lootable(drop));
        }
    }
    let entity = world.spawn(builder.build());

    log::debug!("Spawned {} at ({:.0}, {:.0})", kind.name(), pos.x, pos.y);
    entity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::enemies::default_enemy_table;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ctx<'a>(tunables: &'a EnemyTunables, player: Vec2) -> StepContext<'a> {
        StepContext {
            dt: 0.016,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            is_dashing: false,
            player,
            tunables,
            segments: [None, None],
        }
    }

    #[test]
    fn test_step_table_covers_every_kind() {
        assert_eq!(STEP_TABLE.len(), EnemyKind::ALL.len());
        for (i, kind) in EnemyKind::ALL.iter().enumerate() {
            assert_eq!(*kind as usize, i);
        }
    }

    #[test]
    fn test_think_transitions() {
        let none = Senses::default();
        let detect = Senses { in_detect: true, ..none };
        let shoot = Senses { in_detect: true, in_shoot: true, ..none };
        let flee = Senses { in_flee: true, ..shoot };

        assert_eq!(think(EnemyStatus::Idle, none), EnemyStatus::Idle);
        assert_eq!(think(EnemyStatus::Idle, detect), EnemyStatus::Targeting);
        assert_eq!(think(EnemyStatus::Targeting, shoot), EnemyStatus::Shooting);
        assert_eq!(think(EnemyStatus::Targeting, flee), EnemyStatus::Fleeing);
        assert_eq!(think(EnemyStatus::Shooting, flee), EnemyStatus::Fleeing);
        assert_eq!(think(EnemyStatus::Shooting, detect), EnemyStatus::Targeting);
        assert_eq!(think(EnemyStatus::Fleeing, shoot), EnemyStatus::Fleeing);
        assert_eq!(
            think(EnemyStatus::Fleeing, Senses { out_of_flee: true, ..detect }),
            EnemyStatus::Targeting
        );
    }

    #[test]
    fn test_senses_without_flee_never_flee() {
        let table = default_enemy_table();
        let melee = table.get(EnemyKind::Melee);
        assert!(melee.flee_fraction.is_none());
        assert!(!Senses::measure(0.0, melee).in_flee);
    }

    #[test]
    fn test_shotgun_fires_three_shot_fan_when_in_range() {
        let table = default_enemy_table();
        let tunables = table.get(EnemyKind::Shotgun);
        let mut ai = EnemyAi::new(EnemyKind::Shotgun);
        let mut rng = StdRng::seed_from_u64(1);
        let player = Vec2::new(tunables.shooting_range * 0.8, 0.0);

        // Idle -> Targeting
        let effects = step(&mut ai, &ctx(tunables, player), &mut rng);
        assert!(effects.iter().all(|e| !matches!(e.action, EnemyAction::Cast { .. })));
        // Targeting -> Shooting, fires immediately
        let effects = step(&mut ai, &ctx(tunables, player), &mut rng);
        let casts: Vec<_> = effects
            .iter()
            .filter_map(|e| match e.action {
                EnemyAction::Cast { direction, .. } => Some(direction),
                _ => None,
            })
            .collect();
        assert_eq!(casts.len(), 3);
        let EnemyBrain::Basic(brain) = &ai.brain else {
            panic!("shotgun enemies use the basic brain");
        };
        assert_eq!(brain.status, EnemyStatus::Shooting);
        assert!(brain.attack_countdown > 0.0);

        // Recharging: no shots next frame
        let effects = step(&mut ai, &ctx(tunables, player), &mut rng);
        assert!(effects.iter().all(|e| !matches!(e.action, EnemyAction::Cast { .. })));
    }

    #[test]
    fn test_fan_spreads_symmetrically_around_aim() {
        let spacing = 0.3;
        let effects = attack_effects(AttackPattern::Fan { shots: 3, spacing }, Vec2::X);
        let dirs: Vec<Vec2> = effects
            .iter()
            .filter_map(|e| match e.action {
                EnemyAction::Cast { direction, .. } => Some(direction),
                _ => None,
            })
            .collect();
        assert_eq!(dirs.len(), 3);
        assert!((dirs[1] - Vec2::X).length() < 1e-5);
        assert!((dirs[0].to_angle() + spacing).abs() < 1e-5);
        assert!((dirs[2].to_angle() - spacing).abs() < 1e-5);
        assert!(dirs.iter().all(|d| (d.length() - 1.0).abs() < 1e-5));
    }

    #[test]
    fn test_ranged_flees_and_bursts_when_crowded() {
        let table = default_enemy_table();
        let tunables = table.get(EnemyKind::Ranged);
        let mut ai = EnemyAi {
            kind: EnemyKind::Ranged,
            brain: EnemyBrain::Basic(BasicBrain {
                status: EnemyStatus::Shooting,
                ..BasicBrain::default()
            }),
        };
        let mut rng = StdRng::seed_from_u64(2);
        let effects = step(&mut ai, &ctx(tunables, Vec2::new(10.0, 0.0)), &mut rng);

        let velocity = effects.iter().find_map(|e| match e.action {
            EnemyAction::SetVelocity(v) => Some(v),
            _ => None,
        });
        assert!(velocity.unwrap().x < 0.0);
        assert!(effects
            .iter()
            .any(|e| matches!(e.action, EnemyAction::Burst { count: 4, .. })));
    }

    #[test]
    fn test_tower_holds_still() {
        let table = default_enemy_table();
        let tunables = table.get(EnemyKind::Tower);
        let mut ai = EnemyAi::new(EnemyKind::Tower);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..10 {
            for effect in step(&mut ai, &ctx(tunables, Vec2::new(50.0, 0.0)), &mut rng) {
                if let EnemyAction::SetVelocity(v) = effect.action {
                    assert_eq!(v, Vec2::ZERO);
                }
            }
        }
    }

    #[test]
    fn test_dummy_does_nothing() {
        let table = default_enemy_table();
        let mut ai = EnemyAi::new(EnemyKind::Dummy);
        let mut rng = StdRng::seed_from_u64(4);
        assert!(step(&mut ai, &ctx(table.get(EnemyKind::Dummy), Vec2::ZERO), &mut rng).is_empty());
    }

    #[test]
    fn test_spawn_enemy_components() {
        let table = default_enemy_table();
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(5);
        let e = spawn_enemy(
            &mut world,
            EnemyKind::Melee,
            Vec2::new(64.0, 64.0),
            &table,
            SpawnOptions { minion: true, ..Default::default() },
            &mut rng,
        );
        assert_eq!(world.get::<&Enemy>(e).unwrap().kind, EnemyKind::Melee);
        let health = *world.get::<&Health>(e).unwrap();
        assert_eq!(health.max, table.get(EnemyKind::Melee).max_health / 2);
        assert!(world.get::<&Lootable>(e).is_err());
        assert!(world.get::<&RoomMember>(e).is_err());
    }

    #[test]
    fn test_room_enemy_spawns_with_membership() {
        let table = default_enemy_table();
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(6);
        let mut rooms: slotmap::SlotMap<EncounterKey, ()> = slotmap::SlotMap::with_key();
        let key = rooms.insert(());
        let e = spawn_enemy(
            &mut world,
            EnemyKind::Ranged,
            Vec2::ZERO,
            &table,
            SpawnOptions { encounter: Some(key), minion: false },
            &mut rng,
        );
        assert_eq!(world.get::<&RoomMember>(e).unwrap().0, key);
        assert!(world.get::<&Hitbox>(e).unwrap().layer.contains(CollisionLayer::ENEMY));
    }
}

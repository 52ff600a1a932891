//! Boss creation and attack cycles
//!
//! Boss 1 is a single body that rotates through dash, summon and bullet
//! patterns. Boss 2 is two segments steered by one controller entity; only
//! the active segment can be hit, and the survivor of the pair speeds up.

use std::f32::consts::PI;

use hecs::{Entity, World};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::enemies::{Enemy, EnemyAction, EnemyAi, EnemyBrain, EnemyEffect, EnemyKind, StepContext};
use super::loot::LootDrop;
use crate::combat::CollisionLayer;
use crate::data::enemies::EnemyTable;
use crate::ecs::{Health, Hitbox, Lootable, Motion, Position, Vec2};
use crate::spells::cast::PLAYER_ACCELERATION;
use crate::spells::{MovementSpellId, ProjectileSpellId, SpellRef, SpellSlots};

/// The two bosses an exit gate can lead to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossKind {
    Boss1,
    Boss2,
}

impl BossKind {
    pub fn enemy_kind(&self) -> EnemyKind {
        match self {
            BossKind::Boss1 => EnemyKind::Boss1,
            BossKind::Boss2 => EnemyKind::Boss2,
        }
    }

    pub fn name(&self) -> &'static str {
        self.enemy_kind().name()
    }
}

/// Boss 1 rests between attacks; an explosion always leads into a fireball stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boss1State {
    #[default]
    Inactive,
    DashTowardPlayer,
    SummonEnemies,
    CircleSpiralAttack,
    FireballStream,
    CircleExplosion,
}

/// Boss 2 alternates between these two forever
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boss2State {
    #[default]
    CircleAttack,
    DashTowardPlayer,
}

/// Spiral rotation added per volley
const ROTATION_STEP: f32 = PI / 24.0;

/// Directions of `count` shots evenly spaced around a circle
fn ring(rotation: f32, count: u32) -> impl Iterator<Item = Vec2> {
    (0..count).map(move |i| {
        let angle = rotation + i as f32 * 2.0 * PI / count as f32;
        Vec2::new(angle.sin(), angle.cos())
    })
}

// ============================================================================
// Boss 1
// ============================================================================

pub mod boss1 {
    /// Slot layout
    pub const SPIRAL_SLOT: usize = 0;
    pub const EXPLOSION_SLOT: usize = 1;
    pub const STREAM_SLOT: usize = 2;
    pub const DASH_SLOT: usize = 3;

    pub const INACTIVE_TIME: f32 = 1.0;
    pub const DASH_INTERVAL: f32 = 0.4;
    pub const DASH_TIME: f32 = 1.6;
    pub const SUMMON_INTERVAL: f32 = 0.1;
    pub const SUMMON_TIME: f32 = 0.5;
    pub const SUMMON_SPREAD: f32 = 150.0;
    pub const SPIRAL_INTERVAL: f32 = 0.35;
    pub const SPIRAL_TIME: f32 = 6.0;
    pub const SPIRAL_SHOTS: u32 = 10;
    pub const STREAM_INTERVAL: f32 = 0.2;
    pub const STREAM_TIME: f32 = 3.05;
    pub const STREAM_SHOTS: u32 = 3;
    pub const STREAM_JITTER: f32 = 60.0;
    pub const EXPLOSION_INTERVAL: f32 = 0.15;
    pub const EXPLOSION_TIME: f32 = 0.5;
    pub const EXPLOSION_SHOTS: u32 = 12;
}

/// States an inactive Boss 1 picks its next attack from
const BOSS1_ATTACKS: [Boss1State; 3] = [
    Boss1State::DashTowardPlayer,
    Boss1State::SummonEnemies,
    Boss1State::CircleSpiralAttack,
];

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Boss1Brain {
    pub state: Boss1State,
    pub prev_state: Boss1State,
    /// Seconds in the current state
    pub state_timer: f32,
    /// Seconds since the last volley
    pub attack_timer: f32,
    pub rotation: f32,
}

impl Boss1Brain {
    fn transition(&mut self, next: Boss1State, effects: &mut Vec<EnemyEffect>) {
        self.state_timer = 0.0;
        self.attack_timer = 0.0;
        self.prev_state = self.state;
        self.state = next;
        effects.push(EnemyEffect::owner(EnemyAction::SetDashing(false)));
        effects.push(EnemyEffect::owner(EnemyAction::SetVelocity(Vec2::ZERO)));
    }

    /// Random attack state other than the one just finished
    fn next_attack(&self, rng: &mut dyn RngCore) -> Boss1State {
        let choices: Vec<Boss1State> = BOSS1_ATTACKS
            .iter()
            .copied()
            .filter(|s| *s != self.prev_state)
            .collect();
        choices.choose(rng).copied().unwrap_or(Boss1State::CircleSpiralAttack)
    }

    /// True once per `interval` seconds
    fn volley_due(&mut self, interval: f32) -> bool {
        if self.attack_timer >= interval {
            self.attack_timer = 0.0;
            true
        } else {
            false
        }
    }
}

pub fn boss1_step(brain: &mut EnemyBrain, ctx: &StepContext, rng: &mut dyn RngCore) -> Vec<EnemyEffect> {
    use boss1::*;

    let EnemyBrain::Boss1(b) = brain else {
        log::debug!("Boss 1 step called with a {:?} brain", brain);
        return Vec::new();
    };
    let mut effects = Vec::new();

    if ctx.is_dashing {
        let speed = (ctx.velocity.length() - PLAYER_ACCELERATION * ctx.dt).max(0.0);
        effects.push(EnemyEffect::owner(EnemyAction::SetVelocity(
            ctx.velocity.normalize_or_zero() * speed,
        )));
    }

    b.state_timer += ctx.dt;
    b.attack_timer += ctx.dt;
    let toward = (ctx.player - ctx.position).normalize_or_zero();

    match b.state {
        Boss1State::Inactive => {
            if b.state_timer >= INACTIVE_TIME {
                let next = b.next_attack(rng);
                b.transition(next, &mut effects);
            }
        }
        Boss1State::DashTowardPlayer => {
            if b.volley_due(DASH_INTERVAL) {
                effects.push(EnemyEffect::owner(EnemyAction::SetDashing(false)));
                effects.push(EnemyEffect::owner(EnemyAction::SetVelocity(Vec2::ZERO)));
                effects.push(EnemyEffect::owner(EnemyAction::Dash {
                    slot: DASH_SLOT,
                    direction: toward,
                }));
            }
            if b.state_timer >= DASH_TIME {
                b.transition(Boss1State::CircleExplosion, &mut effects);
            }
        }
        Boss1State::SummonEnemies => {
            if b.volley_due(SUMMON_INTERVAL) {
                let offset = Vec2::new(
                    rng.gen_range(-SUMMON_SPREAD..=SUMMON_SPREAD),
                    rng.gen_range(-SUMMON_SPREAD..=SUMMON_SPREAD),
                );
                effects.push(EnemyEffect::owner(EnemyAction::SpawnMinion {
                    position: ctx.position + offset,
                }));
            }
            if b.state_timer >= SUMMON_TIME {
                b.transition(Boss1State::Inactive, &mut effects);
            }
        }
        Boss1State::CircleSpiralAttack => {
            if b.volley_due(SPIRAL_INTERVAL) {
                b.rotation += ROTATION_STEP;
                effects.extend(ring(b.rotation, SPIRAL_SHOTS).map(|direction| {
                    EnemyEffect::owner(EnemyAction::Cast { slot: SPIRAL_SLOT, direction })
                }));
            }
            if b.state_timer >= SPIRAL_TIME {
                b.transition(Boss1State::Inactive, &mut effects);
            }
        }
        Boss1State::FireballStream => {
            if b.volley_due(STREAM_INTERVAL) {
                for _ in 0..STREAM_SHOTS {
                    let jitter = Vec2::new(
                        rng.gen_range(-STREAM_JITTER..=STREAM_JITTER),
                        rng.gen_range(-STREAM_JITTER..=STREAM_JITTER),
                    );
                    let direction = (ctx.player + jitter - ctx.position).normalize_or_zero();
                    effects.push(EnemyEffect::owner(EnemyAction::Cast { slot: STREAM_SLOT, direction }));
                }
            }
            if b.state_timer >= STREAM_TIME {
                b.transition(Boss1State::Inactive, &mut effects);
            }
        }
        Boss1State::CircleExplosion => {
            if b.volley_due(EXPLOSION_INTERVAL) {
                b.rotation += ROTATION_STEP;
                effects.extend(ring(b.rotation, EXPLOSION_SHOTS).map(|direction| {
                    EnemyEffect::owner(EnemyAction::Cast { slot: EXPLOSION_SLOT, direction })
                }));
            }
            if b.state_timer >= EXPLOSION_TIME {
                b.transition(Boss1State::FireballStream, &mut effects);
            }
        }
    }
    effects
}

// ============================================================================
// Boss 2
// ============================================================================

pub mod boss2 {
    pub const RING_SLOT: usize = 0;

    pub const DASH_SPEED: f32 = 700.0;
    pub const DASH_DECELERATION: f32 = 300.0;
    pub const DASH_INTERVAL: f32 = 1.0;
    pub const DASH_TIME: f32 = 2.0;
    pub const RING_INTERVAL: f32 = 2.0;
    pub const RING_TIME: f32 = 3.0;
    pub const RING_SHOTS: u32 = 12;
    /// Seconds between swapping which segment can be hit
    pub const SWAP_INTERVAL: f32 = 5.0;
    /// Extra attack-timer rate once one segment is left
    pub const ENRAGE_RATE: f32 = 8.0;
    /// Half the distance between the segments at spawn
    pub const SEGMENT_OFFSET: f32 = 48.0;
}

/// Speed below which a dashing segment counts as stopped
const STOPPED_SPEED: f32 = 0.1;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Boss2Brain {
    pub state: Boss2State,
    pub state_timer: f32,
    pub attack_timer: f32,
    pub rotation: f32,
    /// The segment that can currently be hit
    pub active_segment: usize,
    /// Last active segment pushed to the hitboxes
    pub applied_segment: Option<usize>,
    pub swap_timer: f32,
    pub door_granted: bool,
}

impl Boss2Brain {
    fn transition(&mut self, next: Boss2State) {
        self.state_timer = 0.0;
        self.attack_timer = 0.0;
        self.state = next;
    }
}

pub fn boss2_step(brain: &mut EnemyBrain, ctx: &StepContext, _rng: &mut dyn RngCore) -> Vec<EnemyEffect> {
    use boss2::*;

    let EnemyBrain::Boss2(b) = brain else {
        log::debug!("Boss 2 step called with a {:?} brain", brain);
        return Vec::new();
    };
    let alive: Vec<(usize, _)> = ctx
        .segments
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.map(|s| (i, s)))
        .collect();
    if alive.is_empty() {
        return Vec::new();
    }
    let mut effects = Vec::new();

    for (i, segment) in &alive {
        if !segment.is_dashing {
            continue;
        }
        let speed = segment.velocity.length() - DASH_DECELERATION * ctx.dt;
        if speed <= STOPPED_SPEED {
            effects.push(EnemyEffect::segment(*i, EnemyAction::SetVelocity(Vec2::ZERO)));
            effects.push(EnemyEffect::segment(*i, EnemyAction::SetDashing(false)));
        } else {
            effects.push(EnemyEffect::segment(
                *i,
                EnemyAction::SetVelocity(segment.velocity.normalize_or_zero() * speed),
            ));
        }
    }

    b.state_timer += ctx.dt;
    b.attack_timer += ctx.dt;

    if let [(survivor, _)] = alive.as_slice() {
        b.active_segment = *survivor;
        b.attack_timer += ENRAGE_RATE * ctx.dt;
        if !b.door_granted {
            b.door_granted = true;
            effects.push(EnemyEffect::segment(*survivor, EnemyAction::GrantDoorLoot));
        }
    } else {
        b.swap_timer += ctx.dt;
        if b.swap_timer >= SWAP_INTERVAL {
            b.swap_timer = 0.0;
            b.active_segment = 1 - b.active_segment;
        }
    }
    if b.applied_segment != Some(b.active_segment) {
        b.applied_segment = Some(b.active_segment);
        effects.push(EnemyEffect::owner(EnemyAction::SetActiveSegment(b.active_segment)));
    }

    match b.state {
        Boss2State::DashTowardPlayer => {
            if b.attack_timer >= DASH_INTERVAL {
                b.attack_timer = 0.0;
                for (i, segment) in &alive {
                    let toward = (ctx.player - segment.position).normalize_or_zero();
                    effects.push(EnemyEffect::segment(*i, EnemyAction::SetVelocity(toward * DASH_SPEED)));
                    effects.push(EnemyEffect::segment(*i, EnemyAction::SetDashing(true)));
                }
            }
            if b.state_timer >= DASH_TIME {
                b.transition(Boss2State::CircleAttack);
            }
        }
        Boss2State::CircleAttack => {
            if b.attack_timer >= RING_INTERVAL {
                b.attack_timer = 0.0;
                for (i, _) in &alive {
                    effects.extend(ring(b.rotation, RING_SHOTS).map(|direction| {
                        EnemyEffect::segment(*i, EnemyAction::Cast { slot: RING_SLOT, direction })
                    }));
                }
                b.rotation += ROTATION_STEP;
            }
            if b.state_timer >= RING_TIME {
                b.transition(Boss2State::DashTowardPlayer);
            }
        }
    }
    effects
}

// ============================================================================
// Components and spawning
// ============================================================================

/// On a Boss 2 controller: its segments, `None` once dead
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BossSegments(pub [Option<Entity>; 2]);

/// On a Boss 2 segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BossSegment {
    pub controller: Entity,
    pub index: usize,
}

/// Hitbox for a segment: the active one takes hits, the other only collides with walls
pub fn segment_hitbox(size: Vec2, active: bool) -> Hitbox {
    if active {
        Hitbox::new(size, CollisionLayer::ENEMY, CollisionLayer::WALL | CollisionLayer::PLAYER)
    } else {
        Hitbox::new(size, CollisionLayer::empty(), CollisionLayer::WALL)
    }
}

/// Spawn a boss at `at`. For Boss 2 the returned entity is the controller.
pub fn spawn_boss(world: &mut World, kind: BossKind, at: Vec2, table: &EnemyTable) -> Entity {
    let enemy_kind = kind.enemy_kind();
    let tunables = table.get(enemy_kind);

    let entity = match kind {
        BossKind::Boss1 => world.spawn((
            Enemy { kind: enemy_kind },
            EnemyAi::new(enemy_kind),
            Position(at),
            Motion::default(),
            Hitbox::new(
                tunables.hitbox,
                CollisionLayer::ENEMY,
                CollisionLayer::WALL | CollisionLayer::PLAYER,
            ),
            Health::new(tunables.max_health),
            SpellSlots::new(&[
                SpellRef::Projectile(ProjectileSpellId::MediumSpeedRedOrb),
                SpellRef::Projectile(ProjectileSpellId::RedOrb),
                SpellRef::Projectile(ProjectileSpellId::BossOrb),
                SpellRef::Movement(MovementSpellId::Dash),
            ]),
            Lootable(LootDrop::NextLevelDoor),
        )),
        BossKind::Boss2 => {
            let controller = world.spawn((Position(at), Motion::default(), EnemyAi::new(enemy_kind)));
            let mut segments = [None; 2];
            for (index, side) in [-1.0f32, 1.0].into_iter().enumerate() {
                let segment = world.spawn((
                    Enemy { kind: enemy_kind },
                    BossSegment { controller, index },
                    Position(at + Vec2::new(side * boss2::SEGMENT_OFFSET, 0.0)),
                    Motion::default(),
                    segment_hitbox(tunables.hitbox, index == 0),
                    Health::new(tunables.max_health),
                    SpellSlots::new(&[
                        SpellRef::Projectile(ProjectileSpellId::MediumSpeedRedOrb),
                        SpellRef::Projectile(ProjectileSpellId::Fireball),
                        SpellRef::Movement(MovementSpellId::Dash),
                    ]),
                ));
                segments[index] = Some(segment);
            }
            if let Err(e) = world.insert_one(controller, BossSegments(segments)) {
                log::warn!("Boss controller {:?} vanished mid-spawn: {}", controller, e);
            }
            controller
        }
    };

    log::info!("Spawned {} at ({:.0}, {:.0})", kind.name(), at.x, at.y);
    entity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::enemies::default_enemy_table;
    use crate::entities::enemies::{step, SegmentView};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ctx(table: &EnemyTable, kind: EnemyKind, dt: f32) -> StepContext<'_> {
        StepContext {
            dt,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            is_dashing: false,
            player: Vec2::new(300.0, 0.0),
            tunables: table.get(kind),
            segments: [None, None],
        }
    }

    fn casts(effects: &[EnemyEffect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e.action, EnemyAction::Cast { .. }))
            .count()
    }

    fn boss1(ai: &EnemyAi) -> &Boss1Brain {
        match &ai.brain {
            EnemyBrain::Boss1(b) => b,
            other => panic!("expected a Boss 1 brain, got {:?}", other),
        }
    }

    #[test]
    fn test_boss1_leaves_inactive_after_a_second() {
        let table = default_enemy_table();
        let mut ai = EnemyAi::new(EnemyKind::Boss1);
        let mut rng = StdRng::seed_from_u64(1);
        step(&mut ai, &ctx(&table, EnemyKind::Boss1, 0.5), &mut rng);
        assert_eq!(boss1(&ai).state, Boss1State::Inactive);
        let effects = step(&mut ai, &ctx(&table, EnemyKind::Boss1, 0.5), &mut rng);
        assert!(BOSS1_ATTACKS.contains(&boss1(&ai).state));
        assert!(effects.contains(&EnemyEffect::owner(EnemyAction::SetVelocity(Vec2::ZERO))));
    }

    #[test]
    fn test_boss1_never_repeats_previous_attack() {
        let mut rng = StdRng::seed_from_u64(2);
        for prev in BOSS1_ATTACKS {
            let brain = Boss1Brain { prev_state: prev, ..Default::default() };
            for _ in 0..50 {
                assert_ne!(brain.next_attack(&mut rng), prev);
            }
        }
    }

    #[test]
    fn test_boss1_spiral_fires_ten_shot_rings() {
        let table = default_enemy_table();
        let mut ai = EnemyAi {
            kind: EnemyKind::Boss1,
            brain: EnemyBrain::Boss1(Boss1Brain {
                state: Boss1State::CircleSpiralAttack,
                ..Default::default()
            }),
        };
        let mut rng = StdRng::seed_from_u64(3);
        let effects = step(&mut ai, &ctx(&table, EnemyKind::Boss1, 0.2), &mut rng);
        assert_eq!(casts(&effects), 0);
        let effects = step(&mut ai, &ctx(&table, EnemyKind::Boss1, 0.2), &mut rng);
        assert_eq!(casts(&effects), boss1::SPIRAL_SHOTS as usize);
        assert!((boss1(&ai).rotation - ROTATION_STEP).abs() < 1e-6);
    }

    #[test]
    fn test_boss1_explosion_leads_to_fireball_stream() {
        let table = default_enemy_table();
        let mut ai = EnemyAi {
            kind: EnemyKind::Boss1,
            brain: EnemyBrain::Boss1(Boss1Brain {
                state: Boss1State::CircleExplosion,
                ..Default::default()
            }),
        };
        let mut rng = StdRng::seed_from_u64(4);
        let mut total = 0;
        for _ in 0..20 {
            total += casts(&step(&mut ai, &ctx(&table, EnemyKind::Boss1, 0.05), &mut rng));
            if boss1(&ai).state != Boss1State::CircleExplosion {
                break;
            }
        }
        assert_eq!(boss1(&ai).state, Boss1State::FireballStream);
        assert_eq!(boss1(&ai).prev_state, Boss1State::CircleExplosion);
        assert!(total > 0);
        assert_eq!(total % boss1::EXPLOSION_SHOTS as usize, 0);
    }

    #[test]
    fn test_boss1_dash_slows_down() {
        let table = default_enemy_table();
        let mut ai = EnemyAi::new(EnemyKind::Boss1);
        let mut rng = StdRng::seed_from_u64(5);
        let mut context = ctx(&table, EnemyKind::Boss1, 0.01);
        context.is_dashing = true;
        context.velocity = Vec2::new(1000.0, 0.0);
        let effects = step(&mut ai, &context, &mut rng);
        assert_eq!(
            effects[0],
            EnemyEffect::owner(EnemyAction::SetVelocity(Vec2::new(970.0, 0.0)))
        );
    }

    fn boss2_ctx(table: &EnemyTable, dt: f32, segments: [Option<SegmentView>; 2]) -> StepContext<'_> {
        StepContext {
            segments,
            ..ctx(table, EnemyKind::Boss2, dt)
        }
    }

    fn view(x: f32) -> Option<SegmentView> {
        Some(SegmentView {
            position: Vec2::new(x, 0.0),
            velocity: Vec2::ZERO,
            is_dashing: false,
        })
    }

    #[test]
    fn test_boss2_does_nothing_without_segments() {
        let table = default_enemy_table();
        let mut ai = EnemyAi::new(EnemyKind::Boss2);
        let mut rng = StdRng::seed_from_u64(6);
        assert!(step(&mut ai, &boss2_ctx(&table, 0.1, [None, None]), &mut rng).is_empty());
    }

    #[test]
    fn test_boss2_swaps_active_segment() {
        let table = default_enemy_table();
        let mut ai = EnemyAi::new(EnemyKind::Boss2);
        let mut rng = StdRng::seed_from_u64(7);
        let effects = step(&mut ai, &boss2_ctx(&table, 0.1, [view(-48.0), view(48.0)]), &mut rng);
        assert!(effects.contains(&EnemyEffect::owner(EnemyAction::SetActiveSegment(0))));

        let mut swapped = false;
        for _ in 0..60 {
            let effects = step(&mut ai, &boss2_ctx(&table, 0.1, [view(-48.0), view(48.0)]), &mut rng);
            swapped |= effects.contains(&EnemyEffect::owner(EnemyAction::SetActiveSegment(1)));
        }
        assert!(swapped);
    }

    #[test]
    fn test_boss2_survivor_gets_the_door_once() {
        let table = default_enemy_table();
        let mut ai = EnemyAi::new(EnemyKind::Boss2);
        let mut rng = StdRng::seed_from_u64(8);
        let first = step(&mut ai, &boss2_ctx(&table, 0.1, [None, view(48.0)]), &mut rng);
        assert!(first.contains(&EnemyEffect::segment(1, EnemyAction::GrantDoorLoot)));
        assert!(first.contains(&EnemyEffect::owner(EnemyAction::SetActiveSegment(1))));
        let second = step(&mut ai, &boss2_ctx(&table, 0.1, [None, view(48.0)]), &mut rng);
        assert!(!second.iter().any(|e| e.action == EnemyAction::GrantDoorLoot));
    }

    #[test]
    fn test_boss2_rings_come_from_every_segment() {
        let table = default_enemy_table();
        let mut ai = EnemyAi {
            kind: EnemyKind::Boss2,
            brain: EnemyBrain::Boss2(Boss2Brain {
                state: Boss2State::CircleAttack,
                attack_timer: boss2::RING_INTERVAL,
                ..Default::default()
            }),
        };
        let mut rng = StdRng::seed_from_u64(9);
        let effects = step(&mut ai, &boss2_ctx(&table, 0.01, [view(-48.0), view(48.0)]), &mut rng);
        assert_eq!(casts(&effects), 2 * boss2::RING_SHOTS as usize);
    }

    #[test]
    fn test_boss2_alternates_rings_and_dashes() {
        let table = default_enemy_table();
        let mut ai = EnemyAi::new(EnemyKind::Boss2);
        let mut rng = StdRng::seed_from_u64(10);
        let state = |ai: &EnemyAi| match &ai.brain {
            EnemyBrain::Boss2(b) => b.state,
            other => panic!("expected a Boss 2 brain, got {:?}", other),
        };
        assert_eq!(state(&ai), Boss2State::CircleAttack);

        step(&mut ai, &boss2_ctx(&table, boss2::RING_TIME + 0.01, [view(-48.0), view(48.0)]), &mut rng);
        assert_eq!(state(&ai), Boss2State::DashTowardPlayer);
        step(&mut ai, &boss2_ctx(&table, boss2::DASH_TIME + 0.01, [view(-48.0), view(48.0)]), &mut rng);
        assert_eq!(state(&ai), Boss2State::CircleAttack);
    }

    #[test]
    fn test_spawn_boss2_has_two_segments_one_protected() {
        let table = default_enemy_table();
        let mut world = World::new();
        let controller = spawn_boss(&mut world, BossKind::Boss2, Vec2::new(500.0, 500.0), &table);
        let segments = *world.get::<&BossSegments>(controller).unwrap();
        let [Some(a), Some(b)] = segments.0 else {
            panic!("both segments should spawn");
        };
        assert_eq!(world.get::<&Hitbox>(a).unwrap().layer, CollisionLayer::ENEMY);
        assert_eq!(world.get::<&Hitbox>(b).unwrap().layer, CollisionLayer::empty());
        assert_eq!(world.get::<&BossSegment>(b).unwrap().controller, controller);
        assert!(world.get::<&Health>(controller).is_err());
    }

    #[test]
    fn test_spawn_boss1_drops_door() {
        let table = default_enemy_table();
        let mut world = World::new();
        let boss = spawn_boss(&mut world, BossKind::Boss1, Vec2::ZERO, &table);
        assert_eq!(world.get::<&Lootable>(boss).unwrap().0, LootDrop::NextLevelDoor);
        assert_eq!(world.get::<&SpellSlots>(boss).unwrap().len(), 4);
    }
}

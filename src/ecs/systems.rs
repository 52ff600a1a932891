//! ECS Systems
//!
//! Per-frame logic over the world. Systems that have to look before they
//! write (enemy AI, contacts) collect first and apply afterwards.

use std::collections::HashSet;
use std::f32::consts::PI;

use hecs::{Entity, EntityBuilder, World};
use rand::Rng;

use crate::combat::damage::{find_contacts, Contact};
use crate::combat::layers::reacts_to;
use crate::combat::{apply_damage, CollisionLayer, DamageOutcome, HitEvent};
use crate::data::enemies::EnemyTable;
use crate::ecs::{
    BoundaryWall, Destructible, Health, Hitbox, Interactable, Lootable, Motion, Player, Position, Projectile,
    RoomMember, RoomTrigger, SpawnIndicator, Vec2, Wall,
};
use crate::entities::bosses::{segment_hitbox, BossSegment, BossSegments};
use crate::entities::enemies::{self, Actor, EnemyAction, EnemyAi, EnemyEffect, EnemyError, EnemyKind, SegmentView, StepContext};
use crate::entities::{Enemy, LootDrop};
use crate::game::timer::{ScheduledEvent, Scheduler};
use crate::spells::{
    CastEffect, CastError, DeathSpawn, ProjectileBehaviour, ProjectileLaunch, SpellCastManager, SpellCatalog,
    SpellSlots, SteerInput,
};
use crate::spells::catalog::CATCH_DISTANCE;
use crate::world::generation::WallCollider;
use crate::world::{EncounterKey, Rect};

/// Hitbox of an ordinary projectile
pub const PROJECTILE_HITBOX: Vec2 = Vec2::new(16.0, 16.0);
/// Hitbox of a stationary damage area
pub const AREA_HITBOX: Vec2 = Vec2::new(96.0, 96.0);
/// Time before a piercing projectile can hit the same target again
pub const REHIT_DELAY: f32 = 0.5;
/// What a boss summon turns into
pub const MINION_KINDS: [EnemyKind; 3] = [EnemyKind::Ranged, EnemyKind::Shotgun, EnemyKind::Melee];

// ============================================================================
// Spawning helpers
// ============================================================================

/// Spawn the projectile described by a cast
pub fn spawn_projectile(world: &mut World, launch: &ProjectileLaunch, fired_by_player: bool) -> Entity {
    let (layer, mask) = if fired_by_player {
        (CollisionLayer::PLAYER_PROJECTILE, CollisionLayer::ENEMY | CollisionLayer::WALL)
    } else {
        (CollisionLayer::ENEMY_PROJECTILE, CollisionLayer::PLAYER | CollisionLayer::WALL)
    };
    let (size, rehit_delay) = match launch.behaviour {
        ProjectileBehaviour::Area { tick } => (AREA_HITBOX, Some(tick)),
        ProjectileBehaviour::Returning { .. } => (PROJECTILE_HITBOX, Some(REHIT_DELAY)),
        _ => (PROJECTILE_HITBOX, None),
    };

    world.spawn((
        Position(launch.position),
        Motion {
            velocity: launch.velocity,
            is_dashing: false,
        },
        Hitbox::new(size, layer, mask),
        Projectile {
            spell: launch.spell,
            damage: launch.damage,
            lifetime: launch.lifetime,
            behaviour: launch.behaviour,
            speed: launch.speed,
            owner: launch.owner,
            fired_by_player,
            rehit_delay,
            recent_hits: Vec::new(),
        },
    ))
}

/// Spawn a static wall covering `rect` (tile coordinates)
pub fn spawn_wall(world: &mut World, rect: Rect) -> Entity {
    world.spawn(wall_bundle(rect))
}

fn wall_bundle(rect: Rect) -> (Position, Hitbox, Wall) {
    (
        Position(rect.world_center()),
        Hitbox::new(rect.world_size(), CollisionLayer::WALL, CollisionLayer::WALL_MASK),
        Wall,
    )
}

/// Spawn one wall per collider. Returns the number spawned.
pub fn spawn_colliders(world: &mut World, colliders: &[WallCollider]) -> usize {
    for collider in colliders {
        world.spawn((
            Position(collider.rect.world_center()),
            Hitbox::new(collider.rect.world_size(), collider.layer, CollisionLayer::WALL_MASK),
            Wall,
        ));
    }
    colliders.len()
}

/// Breakable box on one tile
pub fn spawn_box(world: &mut World, tile: (i32, i32), health: i32) -> Entity {
    let rect = Rect::new(tile.0, tile.1, 1, 1);
    world.spawn((
        Position(rect.world_center()),
        Hitbox::new(rect.world_size(), CollisionLayer::WALL, CollisionLayer::WALL_MASK),
        Wall,
        Destructible,
        Health::new(health),
    ))
}

/// Invisible sensor that wakes an encounter room
pub fn spawn_room_trigger(world: &mut World, key: EncounterKey, rect: Rect) -> Entity {
    world.spawn((
        Position(rect.world_center()),
        Hitbox::new(rect.world_size(), CollisionLayer::ENEMY_ROOM_TRIGGER, CollisionLayer::TRIGGER_MASK),
        RoomTrigger(key),
    ))
}

/// Wall that seals an encounter room until it is cleared
pub fn spawn_boundary_wall(world: &mut World, key: EncounterKey, rect: Rect) -> Entity {
    let mut builder = EntityBuilder::new();
    builder.add_bundle(wall_bundle(rect)).add(BoundaryWall(key));
    world.spawn(builder.build())
}

pub fn spawn_interactable(world: &mut World, at: Vec2, interactable: Interactable) -> Entity {
    world.spawn((
        Position(at),
        Hitbox::new(PROJECTILE_HITBOX * 2.0, CollisionLayer::INTERACTABLE, CollisionLayer::PLAYER),
        interactable,
    ))
}

/// Place an indicator and schedule the enemy that replaces it
pub fn spawn_indicator(
    world: &mut World,
    scheduler: &mut Scheduler<ScheduledEvent>,
    indicator: SpawnIndicator,
    at: Vec2,
    delay: f32,
) -> Entity {
    let entity = world.spawn((Position(at), indicator));
    scheduler.schedule_for(entity, delay, ScheduledEvent::SpawnEnemy { indicator: entity });
    entity
}

// ============================================================================
// Casting
// ============================================================================

/// Turn a cast's effects into world changes for `caster`.
///
/// Returns the number of projectiles spawned.
pub fn apply_cast_effects(
    world: &mut World,
    scheduler: &mut Scheduler<ScheduledEvent>,
    caster: Entity,
    effects: &[CastEffect],
) -> usize {
    let fired_by_player = world.get::<&Player>(caster).is_ok();
    let mut spawned = 0;
    for effect in effects {
        match *effect {
            CastEffect::SpawnProjectile(launch) => {
                spawn_projectile(world, &launch, fired_by_player);
                spawned += 1;
            }
            CastEffect::Dash { velocity, duration } => {
                if let Ok(mut motion) = world.get::<&mut Motion>(caster) {
                    motion.velocity = velocity;
                    motion.is_dashing = true;
                }
                scheduler.schedule_for(caster, duration, ScheduledEvent::EndDash { entity: caster });
            }
            CastEffect::Blink { offset, cast_time } => {
                scheduler.schedule_for(caster, cast_time, ScheduledEvent::BlinkArrive { entity: caster, offset });
            }
        }
    }
    spawned
}

/// Cast from one of `caster`'s slots, honouring cooldowns.
///
/// Returns `Ok(false)` when the slot refused or the caster can't cast.
pub fn cast_from_slot(
    world: &mut World,
    scheduler: &mut Scheduler<ScheduledEvent>,
    manager: &SpellCastManager,
    caster: Entity,
    slot: usize,
    direction: Vec2,
    rng: &mut impl Rng,
) -> Result<bool, CastError> {
    let Ok(origin) = world.get::<&Position>(caster).map(|p| p.0) else {
        return Ok(false);
    };
    let report = {
        let Ok(mut slots) = world.get::<&mut SpellSlots>(caster) else {
            return Ok(false);
        };
        let Some(slot) = slots.get_mut(slot) else {
            return Ok(false);
        };
        manager.cast(slot, origin, direction, caster, rng)?
    };
    match report {
        Some(report) => {
            apply_cast_effects(world, scheduler, caster, &report.effects);
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Cast from a slot ignoring its cooldowns
pub fn cast_unpaced(
    world: &mut World,
    scheduler: &mut Scheduler<ScheduledEvent>,
    manager: &SpellCastManager,
    caster: Entity,
    slot: usize,
    direction: Vec2,
    rng: &mut impl Rng,
) -> Result<(), CastError> {
    let Ok(origin) = world.get::<&Position>(caster).map(|p| p.0) else {
        return Ok(());
    };
    let report = {
        let Ok(slots) = world.get::<&SpellSlots>(caster) else {
            return Ok(());
        };
        let Some(slot) = slots.get(slot) else {
            log::debug!("{:?} has no slot {}", caster, slot);
            return Ok(());
        };
        manager.cast_boss(slot, origin, direction, caster, rng)?
    };
    apply_cast_effects(world, scheduler, caster, &report.effects);
    Ok(())
}

pub fn decay_spell_slots(world: &mut World, dt: f32) {
    for (_, slots) in world.query_mut::<&mut SpellSlots>() {
        slots.decay(dt);
    }
}

// ============================================================================
// Enemy AI
// ============================================================================

fn segment_view(world: &World, segment: Entity) -> Option<SegmentView> {
    let alive = world.get::<&Health>(segment).map(|h| !h.is_dead()).unwrap_or(false);
    if !alive {
        return None;
    }
    let position = world.get::<&Position>(segment).ok()?.0;
    let motion = *world.get::<&Motion>(segment).ok()?;
    Some(SegmentView {
        position,
        velocity: motion.velocity,
        is_dashing: motion.is_dashing,
    })
}

/// Build the step input for one thinking entity
pub fn sense<'t>(
    world: &World,
    entity: Entity,
    player: Vec2,
    table: &'t EnemyTable,
    dt: f32,
) -> Result<StepContext<'t>, EnemyError> {
    let missing = |component: &'static str| EnemyError::MissingComponent { entity, component };

    let kind = world.get::<&EnemyAi>(entity).map_err(|_| missing("EnemyAi"))?.kind;
    let position = world.get::<&Position>(entity).map_err(|_| missing("Position"))?.0;
    let motion = *world.get::<&Motion>(entity).map_err(|_| missing("Motion"))?;
    let segments = match world.get::<&BossSegments>(entity) {
        Ok(segments) => segments.0.map(|s| s.and_then(|s| segment_view(world, s))),
        Err(_) => [None, None],
    };

    Ok(StepContext {
        dt,
        position,
        velocity: motion.velocity,
        is_dashing: motion.is_dashing,
        player,
        tunables: table.get(kind),
        segments,
    })
}

/// Step every thinking entity. Returns each entity's effects, unapplied.
pub fn run_enemy_ai(
    world: &mut World,
    player: Vec2,
    table: &EnemyTable,
    dt: f32,
    rng: &mut impl Rng,
) -> Vec<(Entity, Vec<EnemyEffect>)> {
    let thinkers: Vec<Entity> = world.query::<&EnemyAi>().iter().map(|(e, _)| e).collect();

    let mut batches = Vec::new();
    for entity in thinkers {
        let ctx = match sense(world, entity, player, table, dt) {
            Ok(ctx) => ctx,
            Err(e) => {
                log::debug!("Skipping enemy step: {}", e);
                continue;
            }
        };
        let effects = match world.get::<&mut EnemyAi>(entity) {
            Ok(mut ai) => enemies::step(&mut ai, &ctx, rng),
            Err(_) => continue,
        };
        if !effects.is_empty() {
            batches.push((entity, effects));
        }
    }
    batches
}

fn resolve_actor(world: &World, owner: Entity, actor: Actor) -> Option<Entity> {
    match actor {
        Actor::Owner => Some(owner),
        Actor::Segment(index) => world
            .get::<&BossSegments>(owner)
            .ok()
            .and_then(|segments| segments.0.get(index).copied().flatten())
            .filter(|segment| world.contains(*segment)),
    }
}

/// Protect every segment of `controller` except `active`
pub fn set_active_segment(world: &mut World, controller: Entity, active: usize) {
    let Ok(segments) = world.get::<&BossSegments>(controller).map(|s| *s) else {
        return;
    };
    for (index, segment) in segments.0.iter().enumerate() {
        let Some(segment) = segment else { continue };
        if let Ok(mut hitbox) = world.get::<&mut Hitbox>(*segment) {
            *hitbox = segment_hitbox(hitbox.size, index == active);
        }
    }
}

/// Apply the effects collected by [`run_enemy_ai`]
pub fn apply_enemy_effects(
    world: &mut World,
    scheduler: &mut Scheduler<ScheduledEvent>,
    manager: &SpellCastManager,
    batches: Vec<(Entity, Vec<EnemyEffect>)>,
    minion_delay: f32,
    rng: &mut impl Rng,
) -> Result<(), CastError> {
    for (owner, effects) in batches {
        for effect in effects {
            let Some(actor) = resolve_actor(world, owner, effect.actor) else {
                continue;
            };
            match effect.action {
                EnemyAction::SetVelocity(velocity) => {
                    if let Ok(mut motion) = world.get::<&mut Motion>(actor) {
                        motion.velocity = velocity;
                    }
                }
                EnemyAction::SetDashing(dashing) => {
                    if let Ok(mut motion) = world.get::<&mut Motion>(actor) {
                        motion.is_dashing = dashing;
                    }
                }
                EnemyAction::Cast { slot, direction } => {
                    cast_unpaced(world, scheduler, manager, actor, slot, direction, rng)?;
                }
                EnemyAction::Burst { slot, direction, count, delay } => {
                    SpellCastManager::cast_burst(scheduler, actor, slot, direction, count, delay);
                }
                EnemyAction::Dash { slot, direction } => {
                    cast_from_slot(world, scheduler, manager, actor, slot, direction, rng)?;
                    if let Ok(mut slots) = world.get::<&mut SpellSlots>(actor) {
                        if let Some(slot) = slots.get_mut(slot) {
                            slot.remaining_cooldown = 0.0;
                            slot.internal_cooldown = 0.0;
                        }
                    }
                }
                EnemyAction::SpawnMinion { position } => {
                    let kind = MINION_KINDS[rng.gen_range(0..MINION_KINDS.len())];
                    let indicator = SpawnIndicator {
                        kind,
                        encounter: None,
                        minion: true,
                    };
                    spawn_indicator(world, scheduler, indicator, position, minion_delay);
                }
                EnemyAction::SetActiveSegment(index) => set_active_segment(world, owner, index),
                EnemyAction::GrantDoorLoot => {
                    if let Err(e) = world.insert_one(actor, Lootable(LootDrop::NextLevelDoor)) {
                        log::warn!("Door loot has no carrier {:?}: {}", actor, e);
                    }
                }
            }
        }
    }
    Ok(())
}

/// Keep multi-part boss controllers at the centre of their live segments
pub fn sync_boss_controllers(world: &mut World) {
    let controllers: Vec<(Entity, BossSegments)> =
        world.query::<&BossSegments>().iter().map(|(e, s)| (e, *s)).collect();
    for (controller, segments) in controllers {
        let live: Vec<Vec2> = segments
            .0
            .iter()
            .flatten()
            .filter_map(|s| world.get::<&Position>(*s).ok().map(|p| p.0))
            .collect();
        if live.is_empty() {
            continue;
        }
        let sum = live.iter().fold(Vec2::ZERO, |acc, p| acc + *p);
        if let Ok(mut pos) = world.get::<&mut Position>(controller) {
            pos.0 = sum * (1.0 / live.len() as f32);
        }
    }
}

// ============================================================================
// Movement
// ============================================================================

/// Wall snapshot for movement checks
#[derive(Debug, Clone, Copy)]
pub struct Solid {
    pub position: Vec2,
    pub hitbox: Hitbox,
}

pub fn collect_walls(world: &World) -> Vec<Solid> {
    world
        .query::<(&Position, &Hitbox, &Wall)>()
        .iter()
        .map(|(_, (pos, hitbox, _))| Solid {
            position: pos.0,
            hitbox: *hitbox,
        })
        .collect()
}

/// Whether a body with `hitbox` at `at` overlaps a wall it collides with
pub fn blocked(walls: &[Solid], at: Vec2, hitbox: &Hitbox) -> bool {
    walls
        .iter()
        .any(|w| reacts_to(hitbox.mask, w.hitbox.layer) && hitbox.overlaps(at, &w.hitbox, w.position))
}

/// Move every non-projectile body, resolving walls one axis at a time.
/// A body already inside a wall may move freely until it is out.
pub fn update_motion(world: &mut World, dt: f32) {
    let walls = collect_walls(world);
    for (_, (pos, motion, hitbox, projectile)) in
        world.query_mut::<(&mut Position, &mut Motion, Option<&Hitbox>, Option<&Projectile>)>()
    {
        if projectile.is_some() {
            continue;
        }
        let step = motion.velocity * dt;
        let Some(hitbox) = hitbox else {
            pos.0 += step;
            continue;
        };
        let stuck = blocked(&walls, pos.0, hitbox);

        let moved = Vec2::new(pos.0.x + step.x, pos.0.y);
        if !stuck && blocked(&walls, moved, hitbox) {
            motion.velocity.x = 0.0;
        } else {
            pos.0 = moved;
        }
        let moved = Vec2::new(pos.0.x, pos.0.y + step.y);
        if !stuck && blocked(&walls, moved, hitbox) {
            motion.velocity.y = 0.0;
        } else {
            pos.0 = moved;
        }
    }
}

/// Land a blink at `offset` from `from`, shortening it until clear of walls
pub fn blink_destination(walls: &[Solid], from: Vec2, hitbox: &Hitbox, offset: Vec2) -> Vec2 {
    let mut offset = offset;
    for _ in 0..4 {
        let to = from + offset;
        if !blocked(walls, to, hitbox) {
            return to;
        }
        offset = offset * 0.5;
    }
    from
}

// ============================================================================
// Projectiles
// ============================================================================

fn nearest(points: &[Vec2], from: Vec2) -> Option<Vec2> {
    points
        .iter()
        .copied()
        .min_by(|a, b| a.distance(from).total_cmp(&b.distance(from)))
}

/// Steer, move and age every projectile.
///
/// Returning projectiles close enough to their owner are caught and
/// despawned. Returns the projectiles whose lifetime ran out; pass them to
/// [`retire_projectiles`].
pub fn update_projectiles(world: &mut World, dt: f32) -> Vec<Entity> {
    let hostiles: Vec<Vec2> = world
        .query::<(&Position, &Hitbox, &Enemy)>()
        .iter()
        .filter(|(_, (_, hitbox, _))| hitbox.layer.intersects(CollisionLayer::ENEMY))
        .map(|(_, (pos, _, _))| pos.0)
        .collect();
    let player: Option<Vec2> = world
        .query::<(&Position, &Player)>()
        .iter()
        .map(|(_, (pos, _))| pos.0)
        .next();

    let targets: Vec<(Entity, Option<Vec2>)> = world
        .query::<(&Position, &Projectile)>()
        .iter()
        .map(|(e, (pos, projectile))| {
            let target = match projectile.behaviour {
                ProjectileBehaviour::Seeking { .. } if projectile.fired_by_player => nearest(&hostiles, pos.0),
                ProjectileBehaviour::Seeking { .. } => player,
                ProjectileBehaviour::Returning { .. } => {
                    world.get::<&Position>(projectile.owner).ok().map(|p| p.0)
                }
                _ => None,
            };
            (e, target)
        })
        .collect();

    let mut expired = Vec::new();
    let mut caught = Vec::new();
    for (entity, target) in targets {
        let Ok((pos, motion, projectile)) =
            world.query_one_mut::<(&mut Position, &mut Motion, &mut Projectile)>(entity)
        else {
            continue;
        };
        motion.velocity = projectile.behaviour.steer(SteerInput {
            position: pos.0,
            velocity: motion.velocity,
            speed: projectile.speed,
            target,
            dt,
        });
        pos.0 += motion.velocity * dt;
        projectile.lifetime -= dt;
        projectile.recent_hits.retain_mut(|(_, cooldown)| {
            *cooldown -= dt;
            *cooldown > 0.0
        });

        if projectile.behaviour.returns_to_owner() {
            if let Some(owner) = target {
                if owner.distance(pos.0) < CATCH_DISTANCE {
                    caught.push(entity);
                    continue;
                }
            }
        }
        if projectile.lifetime <= 0.0 {
            expired.push(entity);
        }
    }

    for entity in caught {
        if let Err(e) = world.despawn(entity) {
            log::warn!("Caught projectile {:?} already gone: {}", entity, e);
        }
    }
    expired
}

fn death_launches(
    catalog: &SpellCatalog,
    spawn: DeathSpawn,
    at: Vec2,
    owner: Entity,
    owner_at: Option<Vec2>,
    rng: &mut impl Rng,
) -> Vec<ProjectileLaunch> {
    let launch = |id, direction: Vec2| {
        catalog.projectile(id).map(|spell| ProjectileLaunch {
            spell: id,
            position: at,
            velocity: direction * spell.speed,
            speed: spell.speed,
            damage: spell.damage,
            lifetime: spell.lifetime,
            behaviour: spell.behaviour,
            owner,
        })
    };

    match spawn {
        DeathSpawn::Burst { spell, count, jitter_degrees } => (0..count)
            .filter_map(|i| {
                let jitter = rng.gen_range(-jitter_degrees..=jitter_degrees).to_radians();
                let angle = i as f32 * 2.0 * PI / count as f32 + jitter;
                launch(spell, Vec2::from_angle(angle))
            })
            .collect(),
        DeathSpawn::ReturnToOwner(spell) => {
            let direction = owner_at.map(|o| (o - at).normalize_or_zero()).unwrap_or(Vec2::ZERO);
            launch(spell, direction).into_iter().collect()
        }
        DeathSpawn::Leave(spell) => launch(spell, Vec2::ZERO).into_iter().collect(),
    }
}

/// Despawn projectiles, spawning whatever each one leaves behind
pub fn retire_projectiles(world: &mut World, catalog: &SpellCatalog, retired: &[Entity], rng: &mut impl Rng) {
    for &entity in retired {
        let Ok((behaviour, owner, fired_by_player)) = world
            .get::<&Projectile>(entity)
            .map(|p| (p.behaviour, p.owner, p.fired_by_player))
        else {
            continue;
        };
        let at = world.get::<&Position>(entity).map(|p| p.0).unwrap_or(Vec2::ZERO);
        let owner_at = world.get::<&Position>(owner).ok().map(|p| p.0);
        if let Err(e) = world.despawn(entity) {
            log::warn!("Retired projectile {:?} already gone: {}", entity, e);
        }

        let Some(spawn) = behaviour.on_expire() else {
            continue;
        };
        for launch in death_launches(catalog, spawn, at, owner, owner_at, rng) {
            spawn_projectile(world, &launch, fired_by_player);
        }
    }
}

/// Hits landed and projectiles used up in one contact pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactReport {
    pub hits: Vec<HitEvent>,
    pub retired: Vec<Entity>,
}

/// Apply damage for every projectile contact this frame
pub fn resolve_contacts(world: &mut World) -> ContactReport {
    let mut report = ContactReport::default();
    let mut retired = HashSet::new();

    for Contact { projectile, target, damageable, solid } in find_contacts(world) {
        if retired.contains(&projectile) {
            continue;
        }
        let Ok((behaviour, damage, spell, rehit_delay, recently_hit)) = world.get::<&Projectile>(projectile).map(|p| {
            (
                p.behaviour,
                p.damage,
                p.spell,
                p.rehit_delay,
                p.recent_hits.iter().any(|(e, _)| *e == target),
            )
        }) else {
            continue;
        };

        let mut spent = solid && !behaviour.passes_walls();
        if damageable && !recently_hit {
            let outcome = match world.get::<&mut Health>(target) {
                Ok(mut health) => apply_damage(&mut health, damage),
                Err(_) => DamageOutcome::Ignored,
            };
            if let DamageOutcome::Damaged { dealt } | DamageOutcome::Killed { dealt } = outcome {
                if dealt > 0 {
                    report.hits.push(HitEvent {
                        source: projectile,
                        target,
                        spell,
                        damage: dealt,
                    });
                }
            }
            if let (Some(delay), Ok(mut p)) = (rehit_delay, world.get::<&mut Projectile>(projectile)) {
                p.recent_hits.push((target, delay));
            }
            spent |= !behaviour.pierces();
        }

        if spent {
            retired.insert(projectile);
            report.retired.push(projectile);
        }
    }
    report
}

// ============================================================================
// Deaths, triggers and interaction
// ============================================================================

/// Everything the game needs to know about an entity that just died
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Death {
    pub entity: Entity,
    pub position: Vec2,
    pub enemy: Option<EnemyKind>,
    pub loot: Option<LootDrop>,
    pub room: Option<EncounterKey>,
    pub segment: Option<BossSegment>,
    pub is_player: bool,
    pub is_box: bool,
}

pub fn collect_deaths(world: &World) -> Vec<Death> {
    world
        .query::<(&Health, &Position)>()
        .iter()
        .filter(|(_, (health, _))| health.is_dead())
        .map(|(entity, (_, pos))| Death {
            entity,
            position: pos.0,
            enemy: world.get::<&Enemy>(entity).ok().map(|e| e.kind),
            loot: world.get::<&Lootable>(entity).ok().map(|l| l.0),
            room: world.get::<&RoomMember>(entity).ok().map(|m| m.0),
            segment: world.get::<&BossSegment>(entity).ok().map(|s| *s),
            is_player: world.get::<&Player>(entity).is_ok(),
            is_box: world.get::<&Destructible>(entity).is_ok(),
        })
        .collect()
}

/// Encounter triggers the body `entity` is standing in
pub fn touched_triggers(world: &World, entity: Entity) -> Vec<(Entity, EncounterKey)> {
    let Ok(at) = world.get::<&Position>(entity).map(|p| p.0) else {
        return Vec::new();
    };
    let Ok(hitbox) = world.get::<&Hitbox>(entity).map(|h| *h) else {
        return Vec::new();
    };
    world
        .query::<(&Position, &Hitbox, &RoomTrigger)>()
        .iter()
        .filter(|(_, (pos, trigger, _))| {
            reacts_to(trigger.mask, hitbox.layer) && trigger.overlaps(pos.0, &hitbox, at)
        })
        .map(|(e, (_, _, trigger))| (e, trigger.0))
        .collect()
}

/// Closest interactable within `range` of `at`
pub fn nearest_interactable(world: &World, at: Vec2, range: f32) -> Option<(Entity, Interactable)> {
    world
        .query::<(&Position, &Interactable)>()
        .iter()
        .map(|(e, (pos, interactable))| (e, *interactable, pos.0.distance(at)))
        .filter(|(_, _, d)| *d <= range)
        .min_by(|a, b| a.2.total_cmp(&b.2))
        .map(|(e, interactable, _)| (e, interactable))
}

//! Spell cast mediator
//!
//! Every cast goes through [`SpellCastManager`]. It enforces the slot's
//! cooldown rules, clones the catalog spell, applies the slot's relics in
//! equip order and describes the resulting effects. The caller turns those
//! effects into entities.

use hecs::Entity;
use rand::Rng;
use thiserror::Error;

use super::catalog::{
    MovementKind, MovementSpell, ProjectileBehaviour, ProjectileSpell, ProjectileSpellId, SpellCatalog, SpellRef,
};
use super::slots::SpellSlot;
use crate::ecs::Vec2;
use crate::game::timer::{Scheduler, ScheduledEvent};

pub const PLAYER_MOVE_SPEED: f32 = 300.0;
/// Reaches full speed in 0.1 s
pub const PLAYER_ACCELERATION: f32 = PLAYER_MOVE_SPEED / 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CastError {
    #[error("spell {0:?} is not in the catalog")]
    UnknownSpell(SpellRef),
}

/// A projectile to spawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileLaunch {
    pub spell: ProjectileSpellId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub speed: f32,
    pub damage: i32,
    pub lifetime: f32,
    pub behaviour: ProjectileBehaviour,
    pub owner: Entity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CastEffect {
    SpawnProjectile(ProjectileLaunch),
    /// Set the caster's velocity and end the dash after `duration`
    Dash { velocity: Vec2, duration: f32 },
    /// Move the caster by `offset` after `cast_time`
    Blink { offset: Vec2, cast_time: f32 },
}

/// Outcome of a cast that went through
#[derive(Debug, Clone, PartialEq)]
pub struct CastReport {
    pub effects: Vec<CastEffect>,
    /// Main cooldown of the modified spell
    pub cooldown: f32,
    pub internal_cooldown: f32,
    /// Casts the modified spell allows per cooldown window
    pub num_casts: i32,
    /// The cast consumed a banked extra cast
    pub banked: bool,
}

/// Spell modified by a slot's relics
#[derive(Debug, Clone, Copy)]
enum Modified {
    Projectile(ProjectileSpell),
    Movement(MovementSpell),
}

impl Modified {
    fn cooldown(&self) -> f32 {
        match self {
            Modified::Projectile(s) => s.cooldown,
            Modified::Movement(s) => s.cooldown,
        }
    }

    fn internal_cooldown(&self) -> f32 {
        match self {
            Modified::Projectile(s) => s.internal_cooldown,
            Modified::Movement(s) => s.internal_cooldown,
        }
    }

    fn num_casts(&self) -> i32 {
        match self {
            Modified::Projectile(s) => s.num_casts,
            Modified::Movement(s) => s.num_casts,
        }
    }
}

/// Casts spells against an immutable catalog
#[derive(Debug, Clone, Copy)]
pub struct SpellCastManager<'a> {
    catalog: &'a SpellCatalog,
}

impl<'a> SpellCastManager<'a> {
    pub fn new(catalog: &'a SpellCatalog) -> Self {
        Self { catalog }
    }

    /// Cast from `slot`, updating its cooldowns.
    ///
    /// Returns `Ok(None)` when the slot refuses: the internal cooldown is
    /// running, or the main cooldown is running with no banked casts left.
    pub fn cast<R: Rng + ?Sized>(
        &self,
        slot: &mut SpellSlot,
        origin: Vec2,
        direction: Vec2,
        caster: Entity,
        rng: &mut R,
    ) -> Result<Option<CastReport>, CastError> {
        if slot.internal_cooldown > 0.0 {
            return Ok(None);
        }

        if slot.remaining_cooldown > 0.0 {
            if slot.num_casts <= 0 {
                return Ok(None);
            }
            slot.num_casts -= 1;
            let mut report = self.apply_relics_and_cast(slot, origin, direction, caster, rng)?;
            slot.internal_cooldown = report.internal_cooldown;
            report.banked = true;
            return Ok(Some(report));
        }

        let report = self.apply_relics_and_cast(slot, origin, direction, caster, rng)?;
        slot.num_casts = report.num_casts - 1;
        slot.internal_cooldown = report.internal_cooldown;
        slot.remaining_cooldown = report.cooldown;
        Ok(Some(report))
    }

    /// Cast ignoring the slot's cooldowns; bosses pace themselves with their own timers
    pub fn cast_boss<R: Rng + ?Sized>(
        &self,
        slot: &SpellSlot,
        origin: Vec2,
        direction: Vec2,
        caster: Entity,
        rng: &mut R,
    ) -> Result<CastReport, CastError> {
        self.apply_relics_and_cast(slot, origin, direction, caster, rng)
    }

    /// Queue `count` casts of slot `slot_index`, `delay` seconds apart. Each
    /// shot fires from wherever the caster is at that moment, and only if the
    /// caster is still alive.
    pub fn cast_burst(
        scheduler: &mut Scheduler<ScheduledEvent>,
        caster: Entity,
        slot_index: usize,
        direction: Vec2,
        count: u32,
        delay: f32,
    ) {
        for i in 0..count {
            scheduler.schedule_for(
                caster,
                delay * i as f32,
                ScheduledEvent::BurstShot {
                    caster,
                    slot: slot_index,
                    direction,
                },
            );
        }
    }

    /// Clone the base spell, apply relics in order, and describe the effect
    fn apply_relics_and_cast<R: Rng + ?Sized>(
        &self,
        slot: &SpellSlot,
        origin: Vec2,
        direction: Vec2,
        caster: Entity,
        rng: &mut R,
    ) -> Result<CastReport, CastError> {
        let modified = self.modified(slot.spell, &slot.relics)?;
        let effects = match &modified {
            Modified::Projectile(spell) => {
                let mut effects = Vec::new();
                self.launch(spell, &slot.relics, origin, aim(direction), caster, rng, &mut effects)?;
                effects
            }
            Modified::Movement(spell) => vec![movement_effect(spell, direction)],
        };
        Ok(CastReport {
            effects,
            cooldown: modified.cooldown(),
            internal_cooldown: modified.internal_cooldown(),
            num_casts: modified.num_casts(),
            banked: false,
        })
    }

    fn modified(&self, spell: SpellRef, relics: &[super::Relic]) -> Result<Modified, CastError> {
        let tuning = &self.catalog.relics;
        match spell {
            SpellRef::Projectile(id) => {
                let mut clone = *self.catalog.projectile(id).ok_or(CastError::UnknownSpell(spell))?;
                for relic in relics {
                    relic.modify_projectile(&mut clone, tuning);
                }
                Ok(Modified::Projectile(clone))
            }
            SpellRef::Movement(id) => {
                let mut clone = *self.catalog.movement(id).ok_or(CastError::UnknownSpell(spell))?;
                for relic in relics {
                    relic.modify_movement(&mut clone, tuning);
                }
                Ok(Modified::Movement(clone))
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn launch<R: Rng + ?Sized>(
        &self,
        spell: &ProjectileSpell,
        relics: &[super::Relic],
        origin: Vec2,
        direction: Vec2,
        caster: Entity,
        rng: &mut R,
        out: &mut Vec<CastEffect>,
    ) -> Result<(), CastError> {
        let single = |dir: Vec2| {
            CastEffect::SpawnProjectile(ProjectileLaunch {
                spell: spell.id,
                position: origin,
                velocity: dir * spell.speed,
                speed: spell.speed,
                damage: spell.damage,
                lifetime: spell.lifetime,
                behaviour: spell.behaviour,
                owner: caster,
            })
        };

        match spell.behaviour {
            ProjectileBehaviour::Shotgun { pellets, spread_degrees } => {
                for _ in 0..pellets {
                    let offset = rng.gen::<f32>() * spread_degrees - spread_degrees / 2.0;
                    out.push(single(Vec2::from_angle(offset.to_radians()).rotate(direction)));
                }
            }
            ProjectileBehaviour::Split { left, right } => {
                // Halves carry the slot's relics too
                for half in [left, right] {
                    let Modified::Projectile(child) = self.modified(SpellRef::Projectile(half), relics)? else {
                        continue;
                    };
                    let dir = match child.behaviour {
                        ProjectileBehaviour::Curving { angle_offset, .. } => Vec2::from_angle(angle_offset).rotate(direction),
                        _ => direction,
                    };
                    let mut launch = Vec::new();
                    self.launch(&child, relics, origin, dir, caster, rng, &mut launch)?;
                    out.extend(launch);
                }
            }
            _ => out.push(single(direction)),
        }
        Ok(())
    }
}

/// Unit aim vector; a zero aim points right
fn aim(direction: Vec2) -> Vec2 {
    let dir = direction.normalize_or_zero();
    if dir == Vec2::ZERO {
        Vec2::new(1.0, 0.0)
    } else {
        dir
    }
}

/// Extra casts make movement spells go further
fn casts_multiplier(num_casts: i32) -> f32 {
    (num_casts as f32 / 1.5).max(1.0)
}

fn movement_effect(spell: &MovementSpell, direction: Vec2) -> CastEffect {
    let dir = direction.normalize_or_zero();
    let multiplier = casts_multiplier(spell.num_casts);
    match spell.kind {
        MovementKind::Dash { duration } => {
            let speed = spell.distance / duration + PLAYER_ACCELERATION * duration * 0.5 - PLAYER_MOVE_SPEED;
            CastEffect::Dash {
                velocity: dir * speed * multiplier,
                duration,
            }
        }
        MovementKind::Blink { cast_time } => CastEffect::Blink {
            offset: dir * spell.distance * multiplier,
            cast_time,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spells::catalog::{FIREBALL, SHOTGUN};
    use crate::spells::{MovementSpellId, Relic};
    use hecs::World;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup() -> (SpellCatalog, Entity, StdRng) {
        let mut world = World::new();
        let caster = world.spawn((0u8,));
        (SpellCatalog::builtin(), caster, StdRng::seed_from_u64(1))
    }

    fn fireball_slot() -> SpellSlot {
        SpellSlot::new(SpellRef::Projectile(ProjectileSpellId::Fireball))
    }

    #[test]
    fn test_fresh_cast_sets_cooldowns_and_refuses_immediate_recast() {
        let (catalog, caster, mut rng) = setup();
        let manager = SpellCastManager::new(&catalog);
        let mut slot = fireball_slot();

        let report = manager
            .cast(&mut slot, Vec2::ZERO, Vec2::new(1.0, 0.0), caster, &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(report.effects.len(), 1);
        assert_eq!(slot.remaining_cooldown, FIREBALL.cooldown);
        assert_eq!(slot.internal_cooldown, FIREBALL.internal_cooldown);
        assert_eq!(slot.num_casts, 0);

        let again = manager.cast(&mut slot, Vec2::ZERO, Vec2::new(1.0, 0.0), caster, &mut rng);
        assert_eq!(again, Ok(None));

        slot.decay(FIREBALL.internal_cooldown + 0.01);
        // Main cooldown still running and nothing banked
        let again = manager.cast(&mut slot, Vec2::ZERO, Vec2::new(1.0, 0.0), caster, &mut rng);
        assert_eq!(again, Ok(None));

        slot.decay(FIREBALL.cooldown);
        assert!(manager
            .cast(&mut slot, Vec2::ZERO, Vec2::new(1.0, 0.0), caster, &mut rng)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_numbers_relic_banks_extra_cast_without_resetting_cooldown() {
        let (catalog, caster, mut rng) = setup();
        let manager = SpellCastManager::new(&catalog);
        let mut slot = SpellSlot::with_relics(
            SpellRef::Projectile(ProjectileSpellId::Fireball),
            vec![Relic::Numbers],
        );

        manager.cast(&mut slot, Vec2::ZERO, Vec2::new(0.0, 1.0), caster, &mut rng).unwrap();
        assert_eq!(slot.num_casts, 1);
        let cooldown = slot.remaining_cooldown;

        slot.decay(0.06);
        let report = manager
            .cast(&mut slot, Vec2::ZERO, Vec2::new(0.0, 1.0), caster, &mut rng)
            .unwrap()
            .unwrap();
        assert!(report.banked);
        assert_eq!(slot.num_casts, 0);
        assert!((slot.remaining_cooldown - (cooldown - 0.06)).abs() < 1e-6);
    }

    #[test]
    fn test_relics_modify_clone_not_catalog() {
        let (catalog, caster, mut rng) = setup();
        let manager = SpellCastManager::new(&catalog);
        let mut slot = SpellSlot::with_relics(
            SpellRef::Projectile(ProjectileSpellId::Fireball),
            vec![Relic::Strength, Relic::Strength, Relic::Time],
        );
        let report = manager
            .cast(&mut slot, Vec2::ZERO, Vec2::new(1.0, 0.0), caster, &mut rng)
            .unwrap()
            .unwrap();
        let CastEffect::SpawnProjectile(launch) = report.effects[0] else {
            panic!("expected a projectile");
        };
        assert_eq!(launch.damage, FIREBALL.damage + 2);
        assert!((slot.remaining_cooldown - 0.38).abs() < 1e-6);
        assert_eq!(catalog.projectile(ProjectileSpellId::Fireball).unwrap().damage, FIREBALL.damage);
    }

    #[test]
    fn test_shotgun_fans_pellets_inside_spread() {
        let (catalog, caster, mut rng) = setup();
        let manager = SpellCastManager::new(&catalog);
        let slot = SpellSlot::new(SpellRef::Projectile(ProjectileSpellId::Shotgun));
        let report = manager
            .cast_boss(&slot, Vec2::ZERO, Vec2::new(1.0, 0.0), caster, &mut rng)
            .unwrap();
        assert_eq!(report.effects.len(), 7);
        let half_spread = (SHOTGUN_SPREAD / 2.0).to_radians() + 1e-4;
        for effect in &report.effects {
            let CastEffect::SpawnProjectile(launch) = effect else {
                panic!("expected a projectile");
            };
            assert!(launch.velocity.y.atan2(launch.velocity.x).abs() <= half_spread);
            assert!((launch.velocity.length() - SHOTGUN.speed).abs() < 1e-2);
        }
    }

    const SHOTGUN_SPREAD: f32 = 30.0;

    #[test]
    fn test_cutter_splits_into_two_halves() {
        let (catalog, caster, mut rng) = setup();
        let manager = SpellCastManager::new(&catalog);
        let slot = SpellSlot::new(SpellRef::Projectile(ProjectileSpellId::Cutter));
        let report = manager
            .cast_boss(&slot, Vec2::ZERO, Vec2::new(1.0, 0.0), caster, &mut rng)
            .unwrap();
        let spells: Vec<_> = report
            .effects
            .iter()
            .filter_map(|e| match e {
                CastEffect::SpawnProjectile(l) => Some(l.spell),
                _ => None,
            })
            .collect();
        assert_eq!(spells, vec![ProjectileSpellId::CutterLeft, ProjectileSpellId::CutterRight]);
    }

    #[test]
    fn test_dash_speed_matches_kinematics() {
        let (catalog, caster, mut rng) = setup();
        let manager = SpellCastManager::new(&catalog);
        let mut slot = SpellSlot::new(SpellRef::Movement(MovementSpellId::Dash));
        let report = manager
            .cast(&mut slot, Vec2::ZERO, Vec2::new(2.0, 0.0), caster, &mut rng)
            .unwrap()
            .unwrap();
        // 250 / 0.25 + 3000 * 0.25 / 2 - 300
        let expected = 1000.0 + 375.0 - 300.0;
        match report.effects[0] {
            CastEffect::Dash { velocity, duration } => {
                assert!((velocity.x - expected).abs() < 1e-2);
                assert_eq!(duration, 0.25);
            }
            other => panic!("unexpected effect {other:?}"),
        }
        assert_eq!(slot.remaining_cooldown, 1.5);
    }

    #[test]
    fn test_blink_scales_with_extra_casts() {
        let (catalog, caster, mut rng) = setup();
        let manager = SpellCastManager::new(&catalog);
        let slot = SpellSlot::with_relics(
            SpellRef::Movement(MovementSpellId::Blink),
            vec![Relic::Numbers, Relic::Numbers],
        );
        let report = manager
            .cast_boss(&slot, Vec2::ZERO, Vec2::new(0.0, -1.0), caster, &mut rng)
            .unwrap();
        match report.effects[0] {
            CastEffect::Blink { offset, .. } => assert!((offset.y + 250.0 * 2.0).abs() < 1e-2),
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn test_unknown_spell_is_an_error() {
        let (mut catalog, caster, mut rng) = setup();
        catalog.projectiles.retain(|s| s.id != ProjectileSpellId::Magnet);
        let manager = SpellCastManager::new(&catalog);
        let mut slot = SpellSlot::new(SpellRef::Projectile(ProjectileSpellId::Magnet));
        let err = manager.cast(&mut slot, Vec2::ZERO, Vec2::new(1.0, 0.0), caster, &mut rng);
        assert!(matches!(err, Err(CastError::UnknownSpell(_))));
    }

    #[test]
    fn test_burst_schedules_spaced_shots() {
        let mut world = World::new();
        let caster = world.spawn((0u8,));
        let mut scheduler = Scheduler::new();
        SpellCastManager::cast_burst(&mut scheduler, caster, 0, Vec2::new(1.0, 0.0), 4, 0.11);
        assert_eq!(scheduler.advance(0.0, |_| true).len(), 1);
        assert_eq!(scheduler.advance(0.12, |_| true).len(), 1);
        world.despawn(caster).unwrap();
        assert!(scheduler.advance(1.0, |e| world.contains(e)).is_empty());
    }

    #[test]
    fn test_shotgun_constant_matches_catalog() {
        assert!(matches!(
            SHOTGUN.behaviour,
            ProjectileBehaviour::Shotgun { spread_degrees, .. } if spread_degrees == SHOTGUN_SPREAD
        ));
    }
}

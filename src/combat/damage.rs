//! Damage resolution
//!
//! Finds projectile contacts for the frame and applies damage to health
//! pools.

use hecs::{Entity, World};

use super::layers::reacts_to;
use crate::ecs::{Health, Hitbox, Position, Projectile, Wall};
use crate::spells::ProjectileSpellId;

/// A projectile touching something it reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub projectile: Entity,
    pub target: Entity,
    /// Target has a health pool
    pub damageable: bool,
    /// Target is a wall (boxes are both)
    pub solid: bool,
}

/// Damage dealt to one target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitEvent {
    pub source: Entity,
    pub target: Entity,
    pub spell: ProjectileSpellId,
    pub damage: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Target was already dead
    Ignored,
    Damaged { dealt: i32 },
    Killed { dealt: i32 },
}

/// Subtract `amount` from a health pool
pub fn apply_damage(health: &mut Health, amount: i32) -> DamageOutcome {
    if health.is_dead() {
        return DamageOutcome::Ignored;
    }
    let dealt = health.take_damage(amount);
    if health.is_dead() {
        DamageOutcome::Killed { dealt }
    } else {
        DamageOutcome::Damaged { dealt }
    }
}

/// Every projectile/target overlap this frame, ordered by projectile
pub fn find_contacts(world: &World) -> Vec<Contact> {
    let projectiles: Vec<(Entity, Position, Hitbox, Entity)> = world
        .query::<(&Position, &Hitbox, &Projectile)>()
        .iter()
        .map(|(e, (pos, hitbox, projectile))| (e, *pos, *hitbox, projectile.owner))
        .collect();

    let mut targets_query = world.query::<(&Position, &Hitbox)>();
    let targets: Vec<(Entity, Position, Hitbox)> = targets_query
        .iter()
        .filter(|(e, _)| world.get::<&Projectile>(*e).is_err())
        .map(|(e, (pos, hitbox))| (e, *pos, *hitbox))
        .collect();

    let mut contacts = Vec::new();
    for (projectile, p_pos, p_box, owner) in projectiles {
        for &(target, t_pos, t_box) in &targets {
            if target == owner || !reacts_to(p_box.mask, t_box.layer) {
                continue;
            }
            if !p_box.overlaps(p_pos.0, &t_box, t_pos.0) {
                continue;
            }
            contacts.push(Contact {
                projectile,
                target,
                damageable: world.get::<&Health>(target).is_ok(),
                solid: world.get::<&Wall>(target).is_ok(),
            });
        }
    }
    contacts
}

//! Player entity creation

use hecs::{Entity, World};

use crate::combat::CollisionLayer;
use crate::ecs::{Health, Hitbox, Motion, Player, Position, Vec2};
use crate::spells::cast::{PLAYER_ACCELERATION, PLAYER_MOVE_SPEED};
use crate::spells::{MovementSpellId, ProjectileSpellId, SpellRef, SpellSlots};

pub const PLAYER_HEALTH: i32 = 100;
pub const PLAYER_HITBOX: Vec2 = Vec2::new(20.0, 40.0);
/// Slot that projectile pickups swap into
pub const PROJECTILE_SLOT: usize = 0;
/// Slot that movement pickups swap into
pub const MOVEMENT_SLOT: usize = 1;

/// One frame of player intent, already mapped from whatever input device
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    /// Desired move direction; zero to stop
    pub movement: Vec2,
    /// World-space aim direction
    pub aim: Vec2,
    pub cast_projectile: bool,
    pub cast_movement: bool,
    pub interact: bool,
    /// Relic pickups go to the movement slot instead of the projectile slot
    pub apply_to_movement: bool,
}

pub fn starting_slots() -> SpellSlots {
    SpellSlots::new(&[
        SpellRef::Projectile(ProjectileSpellId::Fireball),
        SpellRef::Movement(MovementSpellId::Dash),
    ])
}

/// Spawn the player entity
pub fn spawn_player(world: &mut World, pos: Vec2) -> Entity {
    world.spawn((
        Player,
        Position(pos),
        Motion::default(),
        Hitbox::new(
            PLAYER_HITBOX,
            CollisionLayer::PLAYER,
            CollisionLayer::WALL | CollisionLayer::ENEMY | CollisionLayer::INTERACTABLE,
        ),
        Health::new(PLAYER_HEALTH),
        starting_slots(),
    ))
}

/// Accelerate toward the input direction at full move speed
pub fn steer(motion: &mut Motion, movement: Vec2, dt: f32) {
    if motion.is_dashing {
        return;
    }
    let target = movement.normalize_or_zero() * PLAYER_MOVE_SPEED;
    let delta = target - motion.velocity;
    let max_step = PLAYER_ACCELERATION * dt;
    motion.velocity = if delta.length() <= max_step {
        target
    } else {
        motion.velocity + delta.normalize_or_zero() * max_step
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_player_loadout() {
        let mut world = World::new();
        let player = spawn_player(&mut world, Vec2::new(10.0, 20.0));
        assert!(world.get::<&Player>(player).is_ok());
        assert_eq!(world.get::<&Health>(player).unwrap().max, PLAYER_HEALTH);
        let slots = world.get::<&SpellSlots>(player).unwrap();
        assert_eq!(
            slots.get(PROJECTILE_SLOT).unwrap().spell,
            SpellRef::Projectile(ProjectileSpellId::Fireball)
        );
        assert_eq!(
            slots.get(MOVEMENT_SLOT).unwrap().spell,
            SpellRef::Movement(MovementSpellId::Dash)
        );
    }

    #[test]
    fn test_steer_reaches_full_speed_in_a_tenth_of_a_second() {
        let mut motion = Motion::default();
        for _ in 0..10 {
            steer(&mut motion, Vec2::new(1.0, 0.0), 0.01);
        }
        assert!((motion.velocity.x - PLAYER_MOVE_SPEED).abs() < 1e-2);
        for _ in 0..10 {
            steer(&mut motion, Vec2::ZERO, 0.01);
        }
        assert!(motion.velocity.length() < 1e-2);
    }

    #[test]
    fn test_steer_leaves_dash_alone() {
        let mut motion = Motion {
            velocity: Vec2::new(900.0, 0.0),
            is_dashing: true,
        };
        steer(&mut motion, Vec2::ZERO, 0.1);
        assert_eq!(motion.velocity, Vec2::new(900.0, 0.0));
    }
}

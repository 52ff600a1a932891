//! Relics
//!
//! Equippable modifiers. A relic mutates the per-cast clone of a spell and
//! never the catalog entry itself.

use serde::{Deserialize, Serialize};

use super::catalog::{MovementKind, MovementSpell, ProjectileSpell};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relic {
    /// More damage, longer dashes
    Strength,
    /// Shorter cooldowns
    Time,
    /// Faster projectiles, quicker dashes and blinks
    Speed,
    /// One more cast per cooldown
    Numbers,
}

impl Relic {
    pub const ALL: [Relic; 4] = [Relic::Strength, Relic::Time, Relic::Speed, Relic::Numbers];

    pub fn name(&self) -> &'static str {
        match self {
            Relic::Strength => "Strength",
            Relic::Time => "Time",
            Relic::Speed => "Speed",
            Relic::Numbers => "Numbers",
        }
    }

    pub fn modify_projectile(&self, spell: &mut ProjectileSpell, tuning: &RelicTuning) {
        match self {
            Relic::Strength => spell.damage += tuning.damage_increase,
            Relic::Time => {
                spell.cooldown = (spell.cooldown - tuning.cooldown_reduction).max(tuning.min_projectile_cooldown)
            }
            Relic::Speed => spell.speed += tuning.speed_increase,
            Relic::Numbers => spell.num_casts += 1,
        }
    }

    pub fn modify_movement(&self, spell: &mut MovementSpell, tuning: &RelicTuning) {
        match self {
            Relic::Strength => spell.distance += tuning.distance_increase,
            Relic::Time => {
                spell.cooldown = (spell.cooldown - tuning.cooldown_reduction).max(tuning.min_movement_cooldown)
            }
            Relic::Speed => match &mut spell.kind {
                MovementKind::Dash { duration } => {
                    *duration = (*duration - tuning.dash_duration_decrease).max(tuning.min_dash_duration)
                }
                MovementKind::Blink { cast_time } => {
                    *cast_time = (*cast_time - tuning.cast_time_decrease).max(tuning.min_cast_time)
                }
            },
            Relic::Numbers => spell.num_casts += 1,
        }
    }
}

/// Per-relic numbers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelicTuning {
    pub damage_increase: i32,
    pub distance_increase: f32,
    pub cooldown_reduction: f32,
    pub min_projectile_cooldown: f32,
    pub min_movement_cooldown: f32,
    pub speed_increase: f32,
    pub dash_duration_decrease: f32,
    pub min_dash_duration: f32,
    pub cast_time_decrease: f32,
    pub min_cast_time: f32,
}

impl Default for RelicTuning {
    fn default() -> Self {
        Self {
            damage_increase: 1,
            distance_increase: 100.0,
            cooldown_reduction: 0.02,
            min_projectile_cooldown: 0.1,
            min_movement_cooldown: 0.25,
            speed_increase: 25.0,
            dash_duration_decrease: 0.05,
            min_dash_duration: 0.1,
            cast_time_decrease: 0.05,
            min_cast_time: 0.1,
        }
    }
}

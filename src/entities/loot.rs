//! Loot drops
//!
//! What enemies, chests and fountains leave behind.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::spells::{MovementSpellId, ProjectileSpellId, Relic, SpellRef};

/// Heal granted by a health drop
pub const HEAL_DROP: i32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LootDrop {
    Relic(Relic),
    Heal(i32),
    /// Swapped with whatever the matching slot holds
    Spell(SpellRef),
    /// Leads out of a boss arena
    NextLevelDoor,
}

/// Roll an ordinary enemy's drop: with probability `chance`, 10% a Numbers
/// relic, 10% a heal, otherwise one of the other relics
pub fn roll_enemy_loot(chance: f32, rng: &mut impl Rng) -> Option<LootDrop> {
    if rng.gen::<f32>() >= chance {
        return None;
    }
    let drop = match rng.gen_range(0..10) {
        0 => LootDrop::Relic(Relic::Numbers),
        1 => LootDrop::Heal(HEAL_DROP),
        _ => LootDrop::Relic(random_common_relic(rng)),
    };
    Some(drop)
}

/// Any relic but Numbers
pub fn random_common_relic(rng: &mut impl Rng) -> Relic {
    const COMMON: [Relic; 3] = [Relic::Strength, Relic::Time, Relic::Speed];
    COMMON[rng.gen_range(0..COMMON.len())]
}

pub fn random_relic(rng: &mut impl Rng) -> Relic {
    Relic::ALL[rng.gen_range(0..Relic::ALL.len())]
}

/// A player spell, movement spells included
pub fn random_spell(rng: &mut impl Rng) -> SpellRef {
    let movement_share = MovementSpellId::ALL.len() as f32
        / (MovementSpellId::ALL.len() + ProjectileSpellId::PLAYER_CASTABLE.len()) as f32;
    if rng.gen::<f32>() < movement_share {
        SpellRef::Movement(MovementSpellId::ALL[rng.gen_range(0..MovementSpellId::ALL.len())])
    } else {
        let id = ProjectileSpellId::PLAYER_CASTABLE[rng.gen_range(0..ProjectileSpellId::PLAYER_CASTABLE.len())];
        SpellRef::Projectile(id)
    }
}

/// Two different projectile spells for a choice room
pub fn spell_choice(rng: &mut impl Rng) -> [SpellRef; 2] {
    let mut pool = ProjectileSpellId::PLAYER_CASTABLE.to_vec();
    pool.shuffle(rng);
    [SpellRef::Projectile(pool[0]), SpellRef::Projectile(pool[1])]
}

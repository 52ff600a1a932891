//! Spell slots
//!
//! A slot holds one equipped spell, its cooldown state and the relics
//! attached to it. Slots live on the caster as a `SpellSlots` component.

use serde::{Deserialize, Serialize};

use super::catalog::SpellRef;
use super::relics::Relic;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellSlot {
    pub spell: SpellRef,
    /// Seconds until a fresh cast is allowed
    pub remaining_cooldown: f32,
    /// Anti-spam floor between any two casts from this slot
    pub internal_cooldown: f32,
    /// Extra casts banked for the current cooldown window
    pub num_casts: i32,
    /// Applied in equip order
    pub relics: Vec<Relic>,
}

impl SpellSlot {
    pub fn new(spell: SpellRef) -> Self {
        Self {
            spell,
            remaining_cooldown: 0.0,
            internal_cooldown: 0.0,
            num_casts: 0,
            relics: Vec::new(),
        }
    }

    pub fn with_relics(spell: SpellRef, relics: Vec<Relic>) -> Self {
        Self { relics, ..Self::new(spell) }
    }

    /// Count down both cooldowns; neither goes below zero
    pub fn decay(&mut self, dt: f32) {
        self.remaining_cooldown = (self.remaining_cooldown - dt).max(0.0);
        self.internal_cooldown = (self.internal_cooldown - dt).max(0.0);
    }

    pub fn is_ready(&self) -> bool {
        self.internal_cooldown <= 0.0 && (self.remaining_cooldown <= 0.0 || self.num_casts > 0)
    }

    /// Swap in a new spell, keeping relics and resetting cooldowns
    pub fn replace_spell(&mut self, spell: SpellRef) {
        self.spell = spell;
        self.remaining_cooldown = 0.0;
        self.internal_cooldown = 0.0;
        self.num_casts = 0;
    }

    pub fn equip(&mut self, relic: Relic) {
        self.relics.push(relic);
    }

    pub fn relic_count(&self, relic: Relic) -> usize {
        self.relics.iter().filter(|r| **r == relic).count()
    }
}

/// All slots owned by one caster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpellSlots(pub Vec<SpellSlot>);

impl SpellSlots {
    pub fn new(spells: &[SpellRef]) -> Self {
        Self(spells.iter().copied().map(SpellSlot::new).collect())
    }

    pub fn get(&self, index: usize) -> Option<&SpellSlot> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut SpellSlot> {
        self.0.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn decay(&mut self, dt: f32) {
        for slot in &mut self.0 {
            slot.decay(dt);
        }
    }
}

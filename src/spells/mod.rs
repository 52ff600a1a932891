//! Spells
//!
//! The spell catalog, relics, per-caster slots and the cast mediator.

pub mod cast;
pub mod catalog;
pub mod relics;
pub mod slots;

pub use cast::{CastEffect, CastError, CastReport, ProjectileLaunch, SpellCastManager};
pub use catalog::{
    DeathSpawn, MovementKind, MovementSpell, MovementSpellId, ProjectileBehaviour, ProjectileSpell,
    ProjectileSpellId, SpellCatalog, SpellRef, SteerInput,
};
pub use relics::{Relic, RelicTuning};
pub use slots::{SpellSlot, SpellSlots};

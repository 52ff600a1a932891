//! Combat system
//!
//! Collision layers and damage application.

pub mod damage;
pub mod layers;

pub use damage::{apply_damage, DamageOutcome, HitEvent};
pub use layers::CollisionLayer;

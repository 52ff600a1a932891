//! Ashfall - A real-time dungeon crawler core
//!
//! Carve a floor out of a BSP tree, seal encounter rooms around the player,
//! and fight through them with slotted spells and relics.

pub mod combat;
pub mod data;
pub mod ecs;
pub mod entities;
pub mod game;
pub mod spells;
pub mod world;

// Re-export commonly used types
pub use data::DataManager;
pub use ecs::components::*;
pub use game::{Game, GameError, GameScreen};
pub use world::TileGrid;

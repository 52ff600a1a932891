//! World module
//!
//! Contains the tile grid, encounter rooms, and procedural generation.

pub mod encounter;
pub mod generation;
pub mod map;
pub mod tile;

pub use encounter::{EncounterConfig, EncounterKey, EncounterRoomManager, EncounterSet};
pub use map::{tile_to_world, world_to_tile, Rect, TileGrid, TILE_SIZE};
pub use tile::TileKind;

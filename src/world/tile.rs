//! Tile definitions
//!
//! The generator works on raw integer codes; `TileKind` is the typed view.

use serde::{Deserialize, Serialize};

pub const EMPTY: i32 = 0;
pub const WALL: i32 = 1;
pub const CORRIDOR: i32 = 2;
/// First room id handed out by the partition tree
pub const FIRST_ROOM_ID: i32 = 3;
/// Last code that still names a room
pub const MAX_ROOM_ID: i32 = 127;

/// Category of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Empty,
    Wall,
    Corridor,
    /// Floor belonging to the room with this id
    Room(u8),
    /// Codes outside the known ranges (128 and up, or negative)
    Reserved(i32),
}

impl TileKind {
    pub fn from_code(code: i32) -> Self {
        match code {
            EMPTY => TileKind::Empty,
            WALL => TileKind::Wall,
            CORRIDOR => TileKind::Corridor,
            FIRST_ROOM_ID..=MAX_ROOM_ID => TileKind::Room(code as u8),
            other => TileKind::Reserved(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            TileKind::Empty => EMPTY,
            TileKind::Wall => WALL,
            TileKind::Corridor => CORRIDOR,
            TileKind::Room(id) => *id as i32,
            TileKind::Reserved(code) => *code,
        }
    }

    /// Room floor and corridors can be walked on
    pub fn is_walkable(&self) -> bool {
        matches!(self, TileKind::Corridor | TileKind::Room(_))
    }

    pub fn is_wall(&self) -> bool {
        matches!(self, TileKind::Wall)
    }

    pub fn room_id(&self) -> Option<u8> {
        match self {
            TileKind::Room(id) => Some(*id),
            _ => None,
        }
    }

    pub fn glyph(&self) -> char {
        match self {
            TileKind::Empty => ' ',
            TileKind::Wall => '#',
            TileKind::Corridor => ',',
            TileKind::Room(_) => '.',
            TileKind::Reserved(_) => '?',
        }
    }
}

/// Shorthand for `TileKind::from_code(code).is_walkable()`
#[inline]
pub fn is_walkable_code(code: i32) -> bool {
    code >= CORRIDOR && code <= MAX_ROOM_ID
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_kind() {
        for code in -3..200 {
            assert_eq!(TileKind::from_code(code).code(), code);
        }
    }

    #[test]
    fn test_room_range() {
        assert_eq!(TileKind::from_code(3), TileKind::Room(3));
        assert_eq!(TileKind::from_code(127), TileKind::Room(127));
        assert_eq!(TileKind::from_code(128), TileKind::Reserved(128));
    }

    #[test]
    fn test_walkable_matches_kind() {
        for code in -3..200 {
            assert_eq!(is_walkable_code(code), TileKind::from_code(code).is_walkable());
        }
        assert!(!TileKind::Wall.is_walkable());
        assert!(TileKind::Wall.is_wall());
    }
}

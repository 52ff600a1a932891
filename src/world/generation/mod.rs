//! Procedural floor generation
//!
//! The pipeline runs partition, content assignment, corridor carving and
//! wall synthesis in that order over one tile grid.

pub mod arenas;
pub mod bsp;
pub mod content;
pub mod corridors;
pub mod templates;
pub mod walls;

pub use arenas::{ArenaEncounter, ArenaKind, ArenaLayout};
pub use bsp::{BspTree, MapNode, NodeArena, NodeId};
pub use content::{EncounterSpec, ExitGate, FloorContent, RoomRole, UniqueRoom};
pub use corridors::{CorridorReport, SplitAxis};
pub use templates::{RoomTemplate, TemplateCatalog};
pub use walls::{ColliderShape, WallCollider};

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{tile, TileGrid};

/// Everything that can go wrong while building a floor
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("room template {index} not found")]
    TemplateNotFound { index: usize },

    #[error("room template line {line}: bad token {token:?}")]
    TemplateParse { line: usize, token: String },

    #[error("room template line {line}: expected {expected} cells, found {found}")]
    TemplateShape { line: usize, expected: usize, found: usize },

    #[error("region at {origin:?} of size {size:?} is too small to hold a room")]
    DegenerateSplit { origin: (i32, i32), size: (i32, i32) },

    #[error("ran out of room ids after {leaves} leaves")]
    RoomIdsExhausted { leaves: usize },

    #[error("no corridor joins the halves of the {axis} split at {node:?}")]
    CorridorCarveFailed { node: (i32, i32), axis: SplitAxis },

    #[error("level layout has no {marker} marker")]
    MissingMarker { marker: &'static str },

    #[error("{marker} marker at {at:?} lies outside every encounter zone")]
    StrayMarker { marker: &'static str, at: (i32, i32) },

    #[error("invalid generation config: {0}")]
    InvalidConfig(String),

    #[error("template io: {0}")]
    Io(#[from] std::io::Error),
}

impl GenerationError {
    /// Errors a fresh roll of the dice can get past
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::DegenerateSplit { .. }
                | GenerationError::RoomIdsExhausted { .. }
                | GenerationError::CorridorCarveFailed { .. }
        )
    }
}

/// Floor generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub map_width: i32,
    pub map_height: i32,
    /// Regions at or below this area become leaves
    pub max_leaf_area: i32,
    /// Splits fall strictly between this and `1 - min_split_fraction`
    pub min_split_fraction: f32,
    pub corridor_thickness: i32,
    /// Wall margin on the top/left side of every carved room
    pub min_wall_thickness: i32,
    /// Up to half of this is added randomly per side
    pub max_room_adjust: i32,
    /// Shortest wall run merged into one collider
    pub min_wall_collision: i32,
    pub max_enemy_rooms: usize,
    pub max_chest_rooms: usize,
    pub spawn_room_id: i32,
    pub exit_room_id: i32,
    pub spawn_room_size: (i32, i32),
    pub exit_room_size: (i32, i32),
    pub chest_room_size: (i32, i32),
    pub fountain_room_size: (i32, i32),
    /// Whole-floor retries after a retryable failure
    pub max_attempts: u32,
}

/// Smallest room area the partition aims to leave in each child
pub const MIN_ROOM_TILES: i32 = 500;
pub const MIN_SPLIT_FRACTION: f32 = 0.45;

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            map_width: 100,
            map_height: 100,
            max_leaf_area: (MIN_ROOM_TILES as f32 / (1.0 - MIN_SPLIT_FRACTION)) as i32,
            min_split_fraction: MIN_SPLIT_FRACTION,
            corridor_thickness: 2,
            min_wall_thickness: 8,
            max_room_adjust: 4,
            min_wall_collision: 3,
            max_enemy_rooms: 10,
            max_chest_rooms: 4,
            spawn_room_id: tile::FIRST_ROOM_ID,
            exit_room_id: 15,
            spawn_room_size: (9, 9),
            exit_room_size: (9, 9),
            chest_room_size: (7, 7),
            fountain_room_size: (7, 7),
            max_attempts: 8,
        }
    }
}

impl GenerationConfig {
    /// Small maps for tests and quick runs
    pub fn compact() -> Self {
        Self {
            map_width: 40,
            map_height: 40,
            max_leaf_area: 200,
            min_wall_thickness: 3,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        let fail = |msg: &str| Err(GenerationError::InvalidConfig(msg.to_string()));
        if self.map_width <= 0 || self.map_height <= 0 {
            return fail("map dimensions must be positive");
        }
        if !(self.min_split_fraction > 0.0 && self.min_split_fraction < 0.5) {
            return fail("min_split_fraction must lie in (0, 0.5)");
        }
        if self.max_leaf_area <= 0 {
            return fail("max_leaf_area must be positive");
        }
        if self.corridor_thickness < 1 {
            return fail("corridor_thickness must be at least 1");
        }
        if self.max_enemy_rooms == 0 || self.max_chest_rooms == 0 {
            return fail("room quotas must be at least 1");
        }
        if !(tile::FIRST_ROOM_ID..=tile::MAX_ROOM_ID).contains(&self.spawn_room_id) {
            return fail("spawn_room_id must be a room code");
        }
        Ok(())
    }
}

/// Summary numbers for one generated floor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FloorStats {
    pub rooms: usize,
    pub encounter_rooms: usize,
    pub chest_rooms: usize,
    pub unique_rooms: usize,
    pub boxes: usize,
    pub exit_generated: bool,
    pub straight_corridors: usize,
    pub elbow_corridors: usize,
    pub corridor_cells: usize,
    pub wall_cells: usize,
    pub merged_colliders: usize,
    pub single_colliders: usize,
    pub attempts: u32,
}

/// A finished procedural floor
#[derive(Debug)]
pub struct Floor {
    pub grid: TileGrid,
    pub tree: BspTree,
    pub content: FloorContent,
    pub colliders: Vec<WallCollider>,
    pub stats: FloorStats,
}

impl Floor {
    pub fn spawn_point(&self) -> Option<(i32, i32)> {
        self.content.spawn_point
    }
}

/// Generate a floor, retrying from scratch on retryable failures
pub fn generate_floor(
    config: &GenerationConfig,
    templates: &TemplateCatalog,
    rng: &mut impl Rng,
) -> Result<Floor, GenerationError> {
    config.validate()?;

    let attempts = config.max_attempts.max(1);
    let mut last_err = None;
    for attempt in 1..=attempts {
        match generate_floor_once(config, templates, rng) {
            Ok(mut floor) => {
                floor.stats.attempts = attempt;
                log_stats(&floor.stats);
                return Ok(floor);
            }
            Err(e) if e.is_retryable() => {
                log::warn!("Floor generation attempt {}/{} failed: {}", attempt, attempts, e);
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| GenerationError::InvalidConfig("no attempts made".to_string())))
}

/// One pass of the pipeline with no retries
pub fn generate_floor_once(
    config: &GenerationConfig,
    templates: &TemplateCatalog,
    rng: &mut impl Rng,
) -> Result<Floor, GenerationError> {
    let mut grid = TileGrid::new(config.map_width, config.map_height);
    let mut tree = BspTree::build(&mut grid, config, rng)?;
    let content = content::assign_rooms(&mut grid, &mut tree, config, templates, rng)?;
    let corridors = corridors::connect_rooms(&mut grid, &tree, config, rng)?;
    let colliders = walls::synthesize_walls(&mut grid, config.min_wall_collision);

    let stats = FloorStats {
        rooms: tree.leaves.len(),
        encounter_rooms: content.encounters.len(),
        chest_rooms: content.chests.len(),
        unique_rooms: content.unique_rooms.len(),
        boxes: content.boxes.len(),
        exit_generated: content.is_exit_generated(),
        straight_corridors: corridors.straight,
        elbow_corridors: corridors.elbow,
        corridor_cells: grid.count_code(tile::CORRIDOR),
        wall_cells: grid.count_code(tile::WALL),
        merged_colliders: colliders.iter().filter(|c| c.shape != ColliderShape::Single).count(),
        single_colliders: colliders.iter().filter(|c| c.shape == ColliderShape::Single).count(),
        attempts: 1,
    };

    Ok(Floor { grid, tree, content, colliders, stats })
}

fn log_stats(stats: &FloorStats) {
    log::info!(
        "Generated floor: {} rooms ({} encounter, {} chest, {} unique), exit: {}, colliders: {} merged / {} single",
        stats.rooms,
        stats.encounter_rooms,
        stats.chest_rooms,
        stats.unique_rooms,
        stats.exit_generated,
        stats.merged_colliders,
        stats.single_colliders
    );
    log::debug!(
        "Corridors: {} straight, {} elbow, {} cells; {} wall cells; {} attempt(s)",
        stats.straight_corridors,
        stats.elbow_corridors,
        stats.corridor_cells,
        stats.wall_cells,
        stats.attempts
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tile::TileKind;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn floor(seed: u64, config: &GenerationConfig) -> Floor {
        let templates = TemplateCatalog::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        generate_floor(config, &templates, &mut rng).unwrap()
    }

    fn assert_connected(floor: &Floor) {
        let (sx, sy) = floor.spawn_point().unwrap();
        let reached = floor.grid.flood_fill_walkable(sx, sy);
        for (idx, &code) in floor.grid.cells().iter().enumerate() {
            if tile::is_walkable_code(code) {
                let (x, y) = floor.grid.idx_to_xy(idx);
                assert!(reached[idx], "walkable cell ({}, {}) with code {} unreachable", x, y, code);
            }
        }
    }

    #[test]
    fn test_default_max_leaf_area() {
        assert_eq!(GenerationConfig::default().max_leaf_area, 909);
    }

    #[test]
    fn test_validate_rejects_half_split() {
        let config = GenerationConfig { min_split_fraction: 0.5, ..GenerationConfig::default() };
        assert!(matches!(config.validate(), Err(GenerationError::InvalidConfig(_))));
    }

    #[test]
    fn test_compact_end_to_end() {
        let config = GenerationConfig::compact();
        for seed in 0..20 {
            let floor = floor(seed, &config);
            assert!(floor.tree.leaf_with_room(config.spawn_room_id).is_some());
            let exits = floor
                .tree
                .leaves
                .iter()
                .filter(|&&l| floor.tree.node(l).room_id == Some(config.exit_room_id))
                .count();
            if floor.content.is_exit_generated() {
                assert_eq!(exits, 1);
            }
            assert_eq!(floor.tree.leaves.len(), floor.stats.rooms);
            assert_eq!(floor.content.assignments.len(), floor.stats.rooms);
            assert_connected(&floor);
        }
    }

    #[test]
    fn test_walls_never_overwrite_rooms() {
        let config = GenerationConfig::default();
        let floor = floor(21, &config);
        for &leaf in &floor.tree.leaves {
            let node = floor.tree.node(leaf);
            let id = node.room_id.unwrap();
            assert!(!floor.grid.room_cells(id).is_empty());
        }
    }

    #[test]
    fn test_stats_agree_with_grid() {
        let config = GenerationConfig::default();
        let floor = floor(8, &config);
        assert_eq!(floor.stats.wall_cells, floor.grid.count_code(tile::WALL));
        assert_eq!(
            floor.stats.merged_colliders + floor.stats.single_colliders,
            floor.colliders.len()
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_floor_is_connected(seed in any::<u64>()) {
            let config = GenerationConfig::default();
            let floor = floor(seed, &config);
            assert_connected(&floor);
        }

        #[test]
        fn prop_cells_have_one_category(seed in any::<u64>()) {
            let config = GenerationConfig::default();
            let floor = floor(seed, &config);
            for &code in floor.grid.cells() {
                let kind = TileKind::from_code(code);
                let categories = [
                    kind == TileKind::Empty,
                    kind.is_wall(),
                    kind == TileKind::Corridor,
                    kind.room_id().is_some(),
                ];
                prop_assert_eq!(categories.iter().filter(|&&c| c).count(), 1);
            }
        }

        #[test]
        fn prop_no_single_collider_over_merged_run(seed in any::<u64>()) {
            let config = GenerationConfig::compact();
            let floor = floor(seed, &config);
            for single in floor.colliders.iter().filter(|c| c.shape == ColliderShape::Single) {
                let (x, y) = (single.rect.x, single.rect.y);
                prop_assert!(!floor
                    .colliders
                    .iter()
                    .filter(|c| c.shape != ColliderShape::Single)
                    .any(|c| c.rect.contains(x, y)));
            }
        }
    }
}

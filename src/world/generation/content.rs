//! Room content assignment
//!
//! Visits every leaf once in shuffled order and gives it a role: the spawn
//! room, the floor exit, encounter rooms stamped from templates, treasure
//! rooms, and finally one-per-floor unique rooms for whatever is left.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use super::bsp::{BspTree, NodeId};
use super::templates::{TemplateCatalog, BOX_MARKER, FLOOR_MARKER};
use super::{GenerationConfig, GenerationError};
use crate::entities::bosses::BossKind;
use crate::world::{tile, Rect, TileGrid};

/// One-per-floor special rooms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UniqueRoom {
    /// Restores the player to full health
    Fountain,
    /// Trades health for relics
    Sacrifice,
    /// Offers two spells to pick from
    Choice,
    /// A chest that fights back
    Mimic,
}

impl UniqueRoom {
    pub const ALL: [UniqueRoom; 4] = [
        UniqueRoom::Fountain,
        UniqueRoom::Sacrifice,
        UniqueRoom::Choice,
        UniqueRoom::Mimic,
    ];
}

/// Role given to a leaf by the content pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoomRole {
    Spawn,
    Exit,
    Encounter,
    Chest,
    Unique(UniqueRoom),
    Plain,
}

/// Floor exit and the boss it leads to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExitGate {
    pub tile: (i32, i32),
    pub boss: BossKind,
}

/// Encounter room footprint, before waves are rolled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EncounterSpec {
    pub room_id: i32,
    pub rect: Rect,
    pub template: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UniqueRoomSpot {
    pub kind: UniqueRoom,
    pub center: (i32, i32),
}

/// What the content pass decided for one leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomAssignment {
    pub node: NodeId,
    pub room_id: i32,
    pub role: RoomRole,
    pub rect: Rect,
}

/// Everything the content pass placed on the floor
#[derive(Debug, Clone, Default)]
pub struct FloorContent {
    pub assignments: Vec<RoomAssignment>,
    pub spawn_point: Option<(i32, i32)>,
    pub exit: Option<ExitGate>,
    pub chests: Vec<(i32, i32)>,
    pub unique_rooms: Vec<UniqueRoomSpot>,
    pub boxes: Vec<(i32, i32)>,
    pub encounters: Vec<EncounterSpec>,
}

impl FloorContent {
    pub fn is_exit_generated(&self) -> bool {
        self.exit.is_some()
    }

    pub fn count_role(&self, role: RoomRole) -> usize {
        self.assignments.iter().filter(|a| a.role == role).count()
    }
}

/// Decaying chance so a quota fills before leaves run out
fn roll_quota(count: usize, cap: usize, rng: &mut impl Rng) -> bool {
    if count >= cap {
        return false;
    }
    let chance = (cap - count + 1) as f32 / cap as f32;
    rng.gen::<f32>() < chance
}

/// Assign roles to every leaf of the tree
pub fn assign_rooms(
    grid: &mut TileGrid,
    tree: &mut BspTree,
    config: &GenerationConfig,
    templates: &TemplateCatalog,
    rng: &mut impl Rng,
) -> Result<FloorContent, GenerationError> {
    let mut content = FloorContent::default();
    let mut order = tree.leaves.clone();
    order.shuffle(rng);

    let mut enemy_rooms = 0;
    let mut chest_rooms = 0;

    for &leaf in &order {
        let Some(room_id) = tree.arena[leaf].room_id else {
            continue;
        };

        if room_id == config.spawn_room_id {
            let rect = adjust_room_size(grid, tree, leaf, config.spawn_room_size);
            content.spawn_point = Some(rect.center());
            content.record(tree, leaf, room_id, RoomRole::Spawn, rect);
            continue;
        }

        if !content.is_exit_generated() && room_id == config.exit_room_id {
            let rect = adjust_room_size(grid, tree, leaf, config.exit_room_size);
            let boss = if rng.gen::<f32>() > 0.5 { BossKind::Boss1 } else { BossKind::Boss2 };
            content.exit = Some(ExitGate { tile: rect.center(), boss });
            content.record(tree, leaf, room_id, RoomRole::Exit, rect);
            continue;
        }

        if !templates.is_empty() && roll_quota(enemy_rooms, config.max_enemy_rooms, rng) {
            let index = templates.pick_index(rng);
            let rect = stamp_template(grid, tree, leaf, templates, index, &mut content.boxes)?;
            content.encounters.push(EncounterSpec { room_id, rect, template: index });
            content.record(tree, leaf, room_id, RoomRole::Encounter, rect);
            enemy_rooms += 1;
            continue;
        }

        if roll_quota(chest_rooms, config.max_chest_rooms, rng) {
            let rect = adjust_room_size(grid, tree, leaf, config.chest_room_size);
            content.chests.push(rect.center());
            content.record(tree, leaf, room_id, RoomRole::Chest, rect);
            chest_rooms += 1;
        }
    }

    let mut remaining: Vec<UniqueRoom> = UniqueRoom::ALL.to_vec();
    for &leaf in &order {
        let node = &tree.arena[leaf];
        if node.is_filled {
            continue;
        }
        let (Some(room_id), Some(room)) = (node.room_id, node.room) else {
            continue;
        };

        if remaining.is_empty() {
            content.assignments.push(RoomAssignment { node: leaf, room_id, role: RoomRole::Plain, rect: room });
            continue;
        }

        let pick = (rng.gen::<f32>() * remaining.len() as f32) as usize;
        let kind = remaining.remove(pick.min(remaining.len() - 1));
        let rect = match kind {
            UniqueRoom::Fountain | UniqueRoom::Sacrifice => {
                adjust_room_size(grid, tree, leaf, config.fountain_room_size)
            }
            UniqueRoom::Choice | UniqueRoom::Mimic => room,
        };
        content.unique_rooms.push(UniqueRoomSpot { kind, center: rect.center() });
        content.record(tree, leaf, room_id, RoomRole::Unique(kind), rect);
    }

    Ok(content)
}

impl FloorContent {
    fn record(&mut self, tree: &mut BspTree, node: NodeId, room_id: i32, role: RoomRole, rect: Rect) {
        tree.arena[node].is_filled = true;
        self.assignments.push(RoomAssignment { node, room_id, role, rect });
    }
}

/// Clear a leaf's room and stamp a `size` room centered on the old one.
///
/// The new room is clamped to the leaf region shrunk by one cell so rooms of
/// neighbouring leaves never touch; a room that can't fit is shrunk.
pub fn adjust_room_size(grid: &mut TileGrid, tree: &mut BspTree, leaf: NodeId, size: (i32, i32)) -> Rect {
    let node = &tree.arena[leaf];
    let room_id = node.room_id.unwrap_or(tile::FIRST_ROOM_ID);
    let old = node.room.unwrap_or(node.region);
    let limit = node.region.inset(1);
    let limit = Rect::new(limit.x.max(1), limit.y.max(1), limit.w, limit.h);

    grid.fill_rect(old, tile::EMPTY);

    let w = size.0.min(limit.right() - limit.x).max(1);
    let h = size.1.min(limit.bottom() - limit.y).max(1);
    let (cx, cy) = old.center();
    let x = (cx - w / 2).clamp(limit.x, (limit.right() - w).max(limit.x));
    let y = (cy - h / 2).clamp(limit.y, (limit.bottom() - h).max(limit.y));

    let rect = Rect::new(x, y, w, h);
    grid.fill_rect(rect, room_id);
    tree.arena[leaf].room = Some(rect);
    rect
}

/// Replace a leaf's room with a template layout; returns the stamped footprint
fn stamp_template(
    grid: &mut TileGrid,
    tree: &mut BspTree,
    leaf: NodeId,
    templates: &TemplateCatalog,
    index: usize,
    boxes: &mut Vec<(i32, i32)>,
) -> Result<Rect, GenerationError> {
    let template = templates.get(index)?;
    let rect = adjust_room_size(grid, tree, leaf, template.size());
    let room_id = tree.arena[leaf].room_id.unwrap_or(tile::FIRST_ROOM_ID);

    // Cropped templates keep their middle
    let off_x = (template.width - rect.w) / 2;
    let off_y = (template.height - rect.h) / 2;

    for (x, y) in rect.cells() {
        let code = template.cell(x - rect.x + off_x, y - rect.y + off_y);
        let code = match code {
            FLOOR_MARKER => room_id,
            BOX_MARKER => {
                boxes.push((x, y));
                room_id
            }
            other => other,
        };
        grid.set(x, y, code);
    }

    Ok(rect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup(seed: u64, config: &GenerationConfig) -> (TileGrid, BspTree, FloorContent) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut grid = TileGrid::new(config.map_width, config.map_height);
        let mut tree = BspTree::build(&mut grid, config, &mut rng).unwrap();
        let templates = TemplateCatalog::builtin().unwrap();
        let content = assign_rooms(&mut grid, &mut tree, config, &templates, &mut rng).unwrap();
        (grid, tree, content)
    }

    #[test]
    fn test_every_leaf_gets_one_assignment() {
        let config = GenerationConfig::default();
        for seed in 0..10 {
            let (_, tree, content) = setup(seed, &config);
            assert_eq!(content.assignments.len(), tree.leaves.len());
            let mut nodes: Vec<_> = content.assignments.iter().map(|a| a.room_id).collect();
            nodes.sort_unstable();
            nodes.dedup();
            assert_eq!(nodes.len(), tree.leaves.len());
        }
    }

    #[test]
    fn test_spawn_room_is_resized() {
        let config = GenerationConfig::default();
        let (grid, tree, content) = setup(5, &config);
        let leaf = tree.leaf_with_room(config.spawn_room_id).unwrap();
        let room = tree.node(leaf).room.unwrap();
        assert_eq!((room.w, room.h), config.spawn_room_size);
        let (sx, sy) = content.spawn_point.unwrap();
        assert_eq!(grid.code(sx, sy), config.spawn_room_id);
    }

    #[test]
    fn test_quotas_respected() {
        let config = GenerationConfig::default();
        for seed in 0..20 {
            let (_, _, content) = setup(seed, &config);
            assert!(content.encounters.len() <= config.max_enemy_rooms);
            assert!(content.chests.len() <= config.max_chest_rooms);
            assert!(content.unique_rooms.len() <= UniqueRoom::ALL.len());
            let mut kinds: Vec<_> = content.unique_rooms.iter().map(|u| u.kind as u8).collect();
            kinds.sort_unstable();
            kinds.dedup();
            assert_eq!(kinds.len(), content.unique_rooms.len());
        }
    }

    #[test]
    fn test_exit_only_on_designated_room() {
        let config = GenerationConfig::default();
        for seed in 0..20 {
            let (grid, tree, content) = setup(seed, &config);
            let exit_leaf = tree.leaf_with_room(config.exit_room_id);
            assert_eq!(content.is_exit_generated(), exit_leaf.is_some());
            if let Some(gate) = content.exit {
                assert_eq!(grid.code(gate.tile.0, gate.tile.1), config.exit_room_id);
                assert_eq!(content.count_role(RoomRole::Exit), 1);
            }
        }
    }

    #[test]
    fn test_encounter_rooms_stay_inside_their_leaf() {
        let config = GenerationConfig::default();
        for seed in 0..10 {
            let (grid, tree, content) = setup(seed, &config);
            for spec in &content.encounters {
                let leaf = tree.leaf_with_room(spec.room_id).unwrap();
                assert!(tree.node(leaf).region.inset(1).contains_rect(&spec.rect));
                assert!(spec.rect.cells().any(|(x, y)| grid.code(x, y) == spec.room_id));
            }
            for &(bx, by) in &content.boxes {
                assert!(grid.code(bx, by) >= tile::FIRST_ROOM_ID);
            }
        }
    }

    #[test]
    fn test_roll_quota_first_draw_always_passes() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..100 {
            assert!(roll_quota(0, 10, &mut rng));
            assert!(!roll_quota(10, 10, &mut rng));
        }
    }
}

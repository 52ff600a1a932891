//! Wall placement and collider merging
//!
//! Rings every room and corridor with wall cells, then merges wall cells
//! into as few axis-aligned colliders as possible.

use serde::Serialize;

use crate::combat::CollisionLayer;
use crate::world::tile;
use crate::world::{Rect, TileGrid};

/// How a collider was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColliderShape {
    /// Column run of at least the merge threshold
    Vertical,
    /// Row run of at least the merge threshold
    Horizontal,
    /// Leftover cell covered by neither run
    Single,
}

/// Axis-aligned wall collider in tile coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallCollider {
    pub rect: Rect,
    pub shape: ColliderShape,
    pub layer: CollisionLayer,
}

impl WallCollider {
    fn new(rect: Rect, shape: ColliderShape) -> Self {
        Self { rect, shape, layer: CollisionLayer::WALL }
    }
}

/// Turn every empty cell touching (8-way) a room or corridor into wall.
///
/// Returns the number of cells converted.
pub fn add_walls(grid: &mut TileGrid) -> usize {
    let mut added = 0;
    for y in 0..grid.height {
        for x in 0..grid.width {
            if grid.code(x, y) != tile::EMPTY {
                continue;
            }
            let touches_floor = (-1..=1)
                .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
                .filter(|&(dx, dy)| dx != 0 || dy != 0)
                .any(|(dx, dy)| grid.get(x + dx, y + dy).is_some_and(|c| c >= tile::CORRIDOR));
            if touches_floor {
                grid.set(x, y, tile::WALL);
                added += 1;
            }
        }
    }
    added
}

/// Merge wall cells into colliders.
///
/// Columns are scanned first, then rows. The two passes track coverage
/// separately, so a corner cell can sit under both a vertical and a
/// horizontal run. Cells covered by neither get a 1x1 collider.
pub fn synthesize_colliders(grid: &TileGrid, min_run: i32) -> Vec<WallCollider> {
    let min_run = min_run.max(1);
    let mut colliders = Vec::new();
    let len = (grid.width * grid.height) as usize;
    let mut has_vertical = vec![false; len];
    let mut has_horizontal = vec![false; len];

    for x in 0..grid.width {
        let mut run_start: Option<i32> = None;
        for y in 0..=grid.height {
            let is_wall = y < grid.height && grid.code(x, y) == tile::WALL;
            match (is_wall, run_start) {
                (true, None) => run_start = Some(y),
                (false, Some(start)) => {
                    let run = y - start;
                    if run >= min_run {
                        colliders.push(WallCollider::new(Rect::new(x, start, 1, run), ColliderShape::Vertical));
                        for ry in start..y {
                            has_vertical[grid.xy_to_idx(x, ry)] = true;
                        }
                    }
                    run_start = None;
                }
                _ => {}
            }
        }
    }

    for y in 0..grid.height {
        let mut run_start: Option<i32> = None;
        for x in 0..=grid.width {
            let is_wall = x < grid.width && grid.code(x, y) == tile::WALL;
            match (is_wall, run_start) {
                (true, None) => run_start = Some(x),
                (false, Some(start)) => {
                    let run = x - start;
                    if run >= min_run {
                        colliders.push(WallCollider::new(Rect::new(start, y, run, 1), ColliderShape::Horizontal));
                        for rx in start..x {
                            has_horizontal[grid.xy_to_idx(rx, y)] = true;
                        }
                    }
                    run_start = None;
                }
                _ => {}
            }
        }
    }

    for y in 0..grid.height {
        for x in 0..grid.width {
            let idx = grid.xy_to_idx(x, y);
            if grid.code(x, y) == tile::WALL && !has_vertical[idx] && !has_horizontal[idx] {
                colliders.push(WallCollider::new(Rect::new(x, y, 1, 1), ColliderShape::Single));
            }
        }
    }

    colliders
}

/// Wall pass followed by collider merging
pub fn synthesize_walls(grid: &mut TileGrid, min_run: i32) -> Vec<WallCollider> {
    add_walls(grid);
    synthesize_colliders(grid, min_run)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_grid() -> TileGrid {
        let mut grid = TileGrid::new(12, 10);
        grid.fill_rect(Rect::new(2, 2, 6, 5), 3);
        grid
    }

    fn covered(colliders: &[WallCollider], x: i32, y: i32) -> bool {
        colliders.iter().any(|c| c.rect.contains(x, y))
    }

    #[test]
    fn test_walls_ring_room() {
        let mut grid = room_grid();
        let added = add_walls(&mut grid);
        // (6 + 2) * (5 + 2) - 6 * 5
        assert_eq!(added, 26);
        assert_eq!(grid.code(1, 1), tile::WALL);
        assert_eq!(grid.code(0, 0), tile::EMPTY);
    }

    #[test]
    fn test_wall_pass_is_idempotent() {
        let mut grid = room_grid();
        let first = synthesize_walls(&mut grid, 3);
        let snapshot = grid.clone();
        let second = synthesize_walls(&mut grid, 3);
        assert_eq!(grid, snapshot);
        assert_eq!(first, second);
    }

    #[test]
    fn test_every_wall_cell_covered() {
        let mut grid = room_grid();
        grid.set(10, 9, 4);
        let colliders = synthesize_walls(&mut grid, 3);
        for (x, y) in grid.bounds().cells() {
            if grid.code(x, y) == tile::WALL {
                assert!(covered(&colliders, x, y), "({}, {})", x, y);
            }
        }
        assert!(colliders.iter().all(|c| c.layer == CollisionLayer::WALL));
    }

    #[test]
    fn test_no_single_over_merged_cell() {
        let mut grid = room_grid();
        grid.set(10, 9, 4);
        let colliders = synthesize_walls(&mut grid, 3);
        for single in colliders.iter().filter(|c| c.shape == ColliderShape::Single) {
            let (x, y) = (single.rect.x, single.rect.y);
            assert!(!colliders
                .iter()
                .filter(|c| c.shape != ColliderShape::Single)
                .any(|c| c.rect.contains(x, y)));
        }
    }

    #[test]
    fn test_ring_merges_into_four_runs() {
        let mut grid = room_grid();
        let colliders = synthesize_walls(&mut grid, 3);
        let vertical = colliders.iter().filter(|c| c.shape == ColliderShape::Vertical).count();
        let horizontal = colliders.iter().filter(|c| c.shape == ColliderShape::Horizontal).count();
        let singles = colliders.iter().filter(|c| c.shape == ColliderShape::Single).count();
        assert_eq!((vertical, horizontal, singles), (2, 2, 0));
    }

    #[test]
    fn test_short_runs_become_singles() {
        let mut grid = TileGrid::new(3, 3);
        grid.set(0, 0, tile::WALL);
        grid.set(2, 2, tile::WALL);
        let colliders = synthesize_colliders(&grid, 3);
        assert_eq!(colliders.len(), 2);
        assert!(colliders.iter().all(|c| c.shape == ColliderShape::Single));
    }
}

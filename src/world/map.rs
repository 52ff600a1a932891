//! Map data structure
//!
//! The integer tile grid a floor is carved into, plus the rectangle type
//! every generation stage passes around.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::tile::{self, TileKind};
use crate::ecs::Vec2;

/// Edge length of one tile in world units
pub const TILE_SIZE: f32 = 32.0;

/// Axis-aligned rectangle in tile coordinates; `x + w` and `y + h` are exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> i32 {
        self.w * self.h
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right() && other.x < self.right() && self.y < other.bottom() && other.y < self.bottom()
    }

    /// Center cell (integer division, biased toward the origin)
    pub fn center(&self) -> (i32, i32) {
        (self.x + self.w / 2, self.y + self.h / 2)
    }

    /// Shrink by `n` cells on every side
    pub fn inset(&self, n: i32) -> Rect {
        Rect::new(self.x + n, self.y + n, self.w - 2 * n, self.h - 2 * n)
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Iterate every cell, row by row
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> {
        let r = *self;
        (r.y..r.bottom()).flat_map(move |y| (r.x..r.right()).map(move |x| (x, y)))
    }

    /// World-space center of the covered tiles
    pub fn world_center(&self) -> Vec2 {
        Vec2::new(
            (self.x as f32 + (self.w as f32 - 1.0) / 2.0) * TILE_SIZE,
            (self.y as f32 + (self.h as f32 - 1.0) / 2.0) * TILE_SIZE,
        )
    }

    /// World-space size of the covered tiles
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.w as f32 * TILE_SIZE, self.h as f32 * TILE_SIZE)
    }
}

/// World position of a tile's center
pub fn tile_to_world(x: i32, y: i32) -> Vec2 {
    Vec2::new(x as f32 * TILE_SIZE, y as f32 * TILE_SIZE)
}

/// Tile containing a world position
pub fn world_to_tile(pos: Vec2) -> (i32, i32) {
    (
        (pos.x / TILE_SIZE + 0.5).floor() as i32,
        (pos.y / TILE_SIZE + 0.5).floor() as i32,
    )
}

/// A dungeon floor grid of raw tile codes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    pub width: i32,
    pub height: i32,
    cells: Vec<i32>,
}

impl TileGrid {
    /// Create a grid filled with empty cells
    pub fn new(width: i32, height: i32) -> Self {
        let len = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            cells: vec![tile::EMPTY; len],
        }
    }

    /// Convert 2D coordinates to 1D index
    #[inline]
    pub fn xy_to_idx(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    /// Convert 1D index to 2D coordinates
    #[inline]
    pub fn idx_to_xy(&self, idx: usize) -> (i32, i32) {
        let idx = idx as i32;
        (idx % self.width, idx / self.width)
    }

    /// Check if coordinates are within bounds
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Raw code at a position
    pub fn get(&self, x: i32, y: i32) -> Option<i32> {
        if self.in_bounds(x, y) {
            Some(self.cells[self.xy_to_idx(x, y)])
        } else {
            None
        }
    }

    /// Raw code, treating out-of-bounds as empty
    #[inline]
    pub fn code(&self, x: i32, y: i32) -> i32 {
        self.get(x, y).unwrap_or(tile::EMPTY)
    }

    pub fn kind(&self, x: i32, y: i32) -> TileKind {
        TileKind::from_code(self.code(x, y))
    }

    /// Set the code at a position; out-of-bounds writes are ignored
    pub fn set(&mut self, x: i32, y: i32, code: i32) {
        if self.in_bounds(x, y) {
            let idx = self.xy_to_idx(x, y);
            self.cells[idx] = code;
        }
    }

    /// Stamp `code` over every in-bounds cell of `rect`
    pub fn fill_rect(&mut self, rect: Rect, code: i32) {
        for (x, y) in rect.cells() {
            self.set(x, y, code);
        }
    }

    /// Check if a position is walkable
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        tile::is_walkable_code(self.code(x, y))
    }

    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    pub fn count_code(&self, code: i32) -> usize {
        self.cells.iter().filter(|&&c| c == code).count()
    }

    /// All cells carrying the given room id
    pub fn room_cells(&self, room_id: i32) -> Vec<(i32, i32)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == room_id)
            .map(|(idx, _)| self.idx_to_xy(idx))
            .collect()
    }

    /// Get all walkable positions (for spawning)
    pub fn walkable_positions(&self) -> Vec<(i32, i32)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| tile::is_walkable_code(c))
            .map(|(idx, _)| self.idx_to_xy(idx))
            .collect()
    }

    /// 4-connected flood fill over walkable cells; returns a reachability mask
    pub fn flood_fill_walkable(&self, start_x: i32, start_y: i32) -> Vec<bool> {
        let mut reached = vec![false; self.cells.len()];
        if !self.is_walkable(start_x, start_y) {
            return reached;
        }

        let mut queue = VecDeque::new();
        reached[self.xy_to_idx(start_x, start_y)] = true;
        queue.push_back((start_x, start_y));

        while let Some((x, y)) = queue.pop_front() {
            for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
                if !self.is_walkable(nx, ny) {
                    continue;
                }
                let idx = self.xy_to_idx(nx, ny);
                if !reached[idx] {
                    reached[idx] = true;
                    queue.push_back((nx, ny));
                }
            }
        }

        reached
    }

    /// Render the grid as text, one line per row
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(((self.width + 1) * self.height) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(self.kind(x, y).glyph());
            }
            out.push('\n');
        }
        out
    }
}

//! Corridor carving
//!
//! Walks the partition tree bottom-up and joins the two halves of every
//! internal node. A straight corridor is tried first along a line drawn
//! from a normal distribution centered on the halves' shared span; when no
//! straight line reaches floor on both sides, an elbow corridor is carved
//! through the split boundary instead.

use std::fmt;

use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::bsp::{BspTree, NodeId};
use super::{GenerationConfig, GenerationError};
use crate::world::tile::{self, is_walkable_code};
use crate::world::{Rect, TileGrid};

/// Orientation of the split a corridor crosses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitAxis {
    /// Halves side by side, corridor runs horizontally
    Vertical,
    /// Halves stacked, corridor runs vertically
    Horizontal,
}

impl fmt::Display for SplitAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitAxis::Vertical => write!(f, "vertical"),
            SplitAxis::Horizontal => write!(f, "horizontal"),
        }
    }
}

/// How each internal node ended up connected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorridorReport {
    pub straight: usize,
    pub elbow: usize,
}

/// Where along the shared span a straight corridor is aimed, as a fraction
const LINE_MEAN: f32 = 0.5;
const LINE_STD_DEV: f32 = 0.166;

/// Draw one sample from N(mean, std_dev); `std_dev` must be finite and non-negative
pub fn sample_normal(rng: &mut impl Rng, mean: f32, std_dev: f32) -> Result<f32, GenerationError> {
    // rand_distr only rejects non-finite deviations
    if !(std_dev >= 0.0) {
        return Err(GenerationError::InvalidConfig(format!(
            "normal({}, {}): deviation must be non-negative",
            mean, std_dev
        )));
    }
    let normal = Normal::new(mean, std_dev)
        .map_err(|e| GenerationError::InvalidConfig(format!("normal({}, {}): {}", mean, std_dev, e)))?;
    Ok(normal.sample(rng))
}

/// Connect every pair of siblings in the tree
pub fn connect_rooms(
    grid: &mut TileGrid,
    tree: &BspTree,
    config: &GenerationConfig,
    rng: &mut impl Rng,
) -> Result<CorridorReport, GenerationError> {
    let mut report = CorridorReport::default();
    connect_node(grid, tree, tree.root, config, rng, &mut report)?;
    Ok(report)
}

fn connect_node(
    grid: &mut TileGrid,
    tree: &BspTree,
    id: NodeId,
    config: &GenerationConfig,
    rng: &mut impl Rng,
    report: &mut CorridorReport,
) -> Result<(), GenerationError> {
    let node = tree.node(id);
    let Some((a, b)) = node.children else {
        return Ok(());
    };

    connect_node(grid, tree, a, config, rng, report)?;
    connect_node(grid, tree, b, config, rng, report)?;

    let frame = Frame { vertical: node.split_vertically };
    let region_a = tree.node(a).region;
    let region_b = tree.node(b).region;
    let bounds = (tree.room_bounds(a), tree.room_bounds(b));
    let (Some(bounds_a), Some(bounds_b)) = bounds else {
        return Err(carve_failed(node.region, frame));
    };

    let thickness = config.corridor_thickness.max(1);
    if carve_straight(grid, &frame, bounds_a, bounds_b, region_b, thickness, rng)? {
        report.straight += 1;
        return Ok(());
    }

    log::debug!(
        "No straight corridor across {} split at ({}, {}); carving elbow",
        frame.axis(),
        node.region.x,
        node.region.y
    );
    carve_elbow(grid, &frame, node.region, region_a, region_b, thickness)
        .ok_or_else(|| carve_failed(node.region, frame))?;
    report.elbow += 1;
    Ok(())
}

fn carve_failed(region: Rect, frame: Frame) -> GenerationError {
    let err = GenerationError::CorridorCarveFailed {
        node: (region.x, region.y),
        axis: frame.axis(),
    };
    log::error!("{}", err);
    err
}

/// Maps corridor-local coordinates to grid coordinates.
///
/// `u` runs along the corridor (across the split), `v` across it.
#[derive(Debug, Clone, Copy)]
struct Frame {
    vertical: bool,
}

impl Frame {
    fn axis(&self) -> SplitAxis {
        if self.vertical {
            SplitAxis::Vertical
        } else {
            SplitAxis::Horizontal
        }
    }

    fn xy(&self, u: i32, v: i32) -> (i32, i32) {
        if self.vertical {
            (u, v)
        } else {
            (v, u)
        }
    }

    fn u_span(&self, r: &Rect) -> (i32, i32) {
        if self.vertical {
            (r.x, r.right())
        } else {
            (r.y, r.bottom())
        }
    }

    fn v_span(&self, r: &Rect) -> (i32, i32) {
        if self.vertical {
            (r.y, r.bottom())
        } else {
            (r.x, r.right())
        }
    }

    fn code(&self, grid: &TileGrid, u: i32, v: i32) -> i32 {
        let (x, y) = self.xy(u, v);
        grid.code(x, y)
    }

    fn set(&self, grid: &mut TileGrid, u: i32, v: i32, code: i32) {
        let (x, y) = self.xy(u, v);
        grid.set(x, y, code);
    }
}

/// Try every line across the shared span, nearest to a normally drawn one first
fn carve_straight(
    grid: &mut TileGrid,
    frame: &Frame,
    bounds_a: Rect,
    bounds_b: Rect,
    region_b: Rect,
    thickness: i32,
    rng: &mut impl Rng,
) -> Result<bool, GenerationError> {
    let (a_lo, a_hi) = frame.v_span(&bounds_a);
    let (b_lo, b_hi) = frame.v_span(&bounds_b);
    let v_min = a_lo.max(b_lo);
    let v_max = a_hi.min(b_hi);

    let mut lo = v_min + 1;
    let hi = v_max - thickness;
    if lo > hi {
        lo = v_min;
    }
    if lo > hi {
        return Ok(false);
    }

    let r = sample_normal(rng, LINE_MEAN, LINE_STD_DEV)?.clamp(0.0, 1.0);
    let sampled = ((v_min as f32 + r * (v_max - v_min) as f32) as i32).clamp(lo, hi);

    let mut candidates: Vec<i32> = (lo..=hi).collect();
    candidates.sort_by_key(|&v| ((v - sampled).abs(), v));

    let boundary = frame.u_span(&region_b).0;
    let (a_start, _) = frame.u_span(&bounds_a);
    let (_, b_end) = frame.u_span(&bounds_b);

    for v in candidates {
        let spans: Option<Vec<(i32, i32, i32)>> = (0..thickness)
            .map(|t| {
                let line = v + t;
                let left = (a_start..boundary).rev().find(|&u| frame.code(grid, u, line) != tile::EMPTY)?;
                let right = (boundary..b_end).find(|&u| frame.code(grid, u, line) != tile::EMPTY)?;
                let reachable = is_walkable_code(frame.code(grid, left, line))
                    && is_walkable_code(frame.code(grid, right, line));
                reachable.then_some((line, left, right))
            })
            .collect();

        if let Some(spans) = spans {
            for (line, left, right) in spans {
                for u in left + 1..right {
                    frame.set(grid, u, line, tile::CORRIDOR);
                }
            }
            return Ok(true);
        }
    }

    Ok(false)
}

/// Walkable cell of `region` closest to the split boundary
fn nearest_to_boundary(grid: &TileGrid, frame: &Frame, region: Rect, boundary: i32, toward_v: i32) -> Option<(i32, i32)> {
    let (u_lo, u_hi) = frame.u_span(&region);
    let (v_lo, v_hi) = frame.v_span(&region);
    let mut best: Option<((i32, i32), (i32, i32))> = None;

    for u in u_lo..u_hi {
        for v in v_lo..v_hi {
            if !is_walkable_code(frame.code(grid, u, v)) {
                continue;
            }
            let key = ((u - boundary).abs(), (v - toward_v).abs());
            if best.map_or(true, |(k, _)| key < k) {
                best = Some((key, (u, v)));
            }
        }
    }

    best.map(|(_, cell)| cell)
}

/// Three-leg corridor: out of A to the boundary, along it, then into B
fn carve_elbow(
    grid: &mut TileGrid,
    frame: &Frame,
    parent: Rect,
    region_a: Rect,
    region_b: Rect,
    thickness: i32,
) -> Option<()> {
    let boundary = frame.u_span(&region_b).0;
    let (v_lo, v_hi) = frame.v_span(&parent);
    let v_mid = (v_lo + v_hi) / 2;

    let (a_u, a_v) = nearest_to_boundary(grid, frame, region_a, boundary, v_mid)?;
    let (b_u, b_v) = nearest_to_boundary(grid, frame, region_b, boundary, a_v)?;

    let carve = |grid: &mut TileGrid, u: i32, v: i32| {
        let (x, y) = frame.xy(u, v);
        if !parent.contains(x, y) {
            return;
        }
        let code = grid.code(x, y);
        if code == tile::EMPTY || code == tile::WALL {
            grid.set(x, y, tile::CORRIDOR);
        }
    };

    for t in 0..thickness {
        for u in a_u + 1..=boundary {
            carve(grid, u, a_v + t);
        }
        for v in a_v.min(b_v)..=a_v.max(b_v) + thickness - 1 {
            carve(grid, boundary + t, v);
        }
        for u in boundary..b_u {
            carve(grid, u, b_v + t);
        }
    }

    Some(())
}

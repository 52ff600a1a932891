//! Binary space partition
//!
//! Recursively splits the map into leaf regions and carves one room into
//! each leaf. Nodes live in a per-floor arena; dropping the arena drops the
//! whole tree.

use std::ops::{Index, IndexMut};

use rand::Rng;

use super::{GenerationConfig, GenerationError};
use crate::world::tile::{FIRST_ROOM_ID, MAX_ROOM_ID};
use crate::world::{Rect, TileGrid};

/// Handle to a node in a [`NodeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// A node of the partition tree
#[derive(Debug, Clone)]
pub struct MapNode {
    /// Area of the map this node owns
    pub region: Rect,
    /// Carved room rectangle (leaves only)
    pub room: Option<Rect>,
    pub children: Option<(NodeId, NodeId)>,
    /// Vertical split: children sit side by side, child one on the left
    pub split_vertically: bool,
    /// Tile code of the leaf's room
    pub room_id: Option<i32>,
    /// Set once the content pass gave this leaf a role
    pub is_filled: bool,
}

impl MapNode {
    fn new(region: Rect) -> Self {
        Self {
            region,
            room: None,
            children: None,
            split_vertically: false,
            room_id: None,
            is_filled: false,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Storage for every node of one floor's tree
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<MapNode>,
    generation: u32,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every node; ids handed out before this call stop resolving
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn alloc(&mut self, node: MapNode) -> NodeId {
        let id = NodeId {
            index: self.nodes.len() as u32,
            generation: self.generation,
        };
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&MapNode> {
        if id.generation != self.generation {
            return None;
        }
        self.nodes.get(id.index as usize)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut MapNode> {
        if id.generation != self.generation {
            return None;
        }
        self.nodes.get_mut(id.index as usize)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Panics on ids from a cleared generation, like indexing a `Vec` out of range.
impl Index<NodeId> for NodeArena {
    type Output = MapNode;

    fn index(&self, id: NodeId) -> &MapNode {
        assert_eq!(id.generation, self.generation, "stale NodeId");
        &self.nodes[id.index as usize]
    }
}

impl IndexMut<NodeId> for NodeArena {
    fn index_mut(&mut self, id: NodeId) -> &mut MapNode {
        assert_eq!(id.generation, self.generation, "stale NodeId");
        &mut self.nodes[id.index as usize]
    }
}

/// A built partition tree
#[derive(Debug)]
pub struct BspTree {
    pub arena: NodeArena,
    pub root: NodeId,
    /// Leaves in creation order (room id order)
    pub leaves: Vec<NodeId>,
}

impl BspTree {
    /// Partition the grid's full extent and carve one room per leaf
    pub fn build(
        grid: &mut TileGrid,
        config: &GenerationConfig,
        rng: &mut impl Rng,
    ) -> Result<Self, GenerationError> {
        let mut builder = Builder {
            arena: NodeArena::new(),
            leaves: Vec::new(),
            next_room_id: FIRST_ROOM_ID,
            config,
        };
        let root = builder.split(grid, grid.bounds(), rng)?;

        Ok(Self {
            arena: builder.arena,
            root,
            leaves: builder.leaves,
        })
    }

    pub fn node(&self, id: NodeId) -> &MapNode {
        &self.arena[id]
    }

    /// Leaf carrying the given room id
    pub fn leaf_with_room(&self, room_id: i32) -> Option<NodeId> {
        self.leaves
            .iter()
            .copied()
            .find(|&id| self.arena[id].room_id == Some(room_id))
    }

    /// Bounding box of every room below `id`
    pub fn room_bounds(&self, id: NodeId) -> Option<Rect> {
        let node = &self.arena[id];
        match node.children {
            None => node.room,
            Some((a, b)) => match (self.room_bounds(a), self.room_bounds(b)) {
                (Some(ra), Some(rb)) => Some(ra.union(&rb)),
                (ra, rb) => ra.or(rb),
            },
        }
    }
}

struct Builder<'a> {
    arena: NodeArena,
    leaves: Vec<NodeId>,
    next_room_id: i32,
    config: &'a GenerationConfig,
}

impl Builder<'_> {
    fn split(&mut self, grid: &mut TileGrid, region: Rect, rng: &mut impl Rng) -> Result<NodeId, GenerationError> {
        if region.is_empty() {
            return Err(GenerationError::DegenerateSplit {
                origin: (region.x, region.y),
                size: (region.w, region.h),
            });
        }

        if region.area() <= self.config.max_leaf_area {
            return self.make_leaf(grid, region, rng);
        }

        let split_vertically = choose_split_axis(region.w, region.h, rng);
        let fraction = random_split_fraction(self.config.min_split_fraction, rng);

        let (first, second) = if split_vertically {
            let w1 = (region.w as f32 * fraction) as i32;
            (
                Rect::new(region.x, region.y, w1, region.h),
                Rect::new(region.x + w1, region.y, region.w - w1, region.h),
            )
        } else {
            let h1 = (region.h as f32 * fraction) as i32;
            (
                Rect::new(region.x, region.y, region.w, h1),
                Rect::new(region.x, region.y + h1, region.w, region.h - h1),
            )
        };

        let child_one = self.split(grid, first, rng)?;
        let child_two = self.split(grid, second, rng)?;

        let mut node = MapNode::new(region);
        node.children = Some((child_one, child_two));
        node.split_vertically = split_vertically;
        Ok(self.arena.alloc(node))
    }

    fn make_leaf(&mut self, grid: &mut TileGrid, region: Rect, rng: &mut impl Rng) -> Result<NodeId, GenerationError> {
        if self.next_room_id > MAX_ROOM_ID {
            return Err(GenerationError::RoomIdsExhausted { leaves: self.leaves.len() });
        }

        let room = carve_room_rect(region, self.config, rng);
        if room.is_empty() {
            return Err(GenerationError::DegenerateSplit {
                origin: (region.x, region.y),
                size: (region.w, region.h),
            });
        }

        let room_id = self.next_room_id;
        self.next_room_id += 1;
        grid.fill_rect(room, room_id);

        let mut node = MapNode::new(region);
        node.room = Some(room);
        node.room_id = Some(room_id);
        let id = self.arena.alloc(node);
        self.leaves.push(id);
        Ok(id)
    }
}

/// Near-square regions get a coin flip so floors don't become strips
fn choose_split_axis(w: i32, h: i32, rng: &mut impl Rng) -> bool {
    let near_square = (w - h).abs() <= 2 && w > 3 && h > 3 && w * h > 50;
    if near_square {
        return rng.gen::<f32>() > 0.5;
    }
    w >= h
}

/// Uniform draw from the open interval (min, 1 - min)
fn random_split_fraction(min_fraction: f32, rng: &mut impl Rng) -> f32 {
    loop {
        let f: f32 = rng.gen();
        if f > min_fraction && f < 1.0 - min_fraction {
            return f;
        }
    }
}

/// Room rectangle inside a leaf: a fixed wall margin on the top/left, one
/// cell on the bottom/right, plus a random 0..adjust/2 per side.
fn carve_room_rect(region: Rect, config: &GenerationConfig, rng: &mut impl Rng) -> Rect {
    let mut adjust = || (rng.gen::<f32>() * config.max_room_adjust as f32 / 2.0) as i32;
    let left = adjust();
    let right = adjust();
    let top = adjust();
    let bottom = adjust();

    let x0 = region.x + config.min_wall_thickness + left;
    let x1 = region.x + region.w - 1 - right;
    let y0 = region.y + config.min_wall_thickness + top;
    let y1 = region.y + region.h - 1 - bottom;
    Rect::new(x0, y0, x1 - x0, y1 - y0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn build(seed: u64, config: &GenerationConfig) -> (TileGrid, BspTree) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut grid = TileGrid::new(config.map_width, config.map_height);
        let tree = BspTree::build(&mut grid, config, &mut rng).unwrap();
        (grid, tree)
    }

    fn check_partition(tree: &BspTree, id: NodeId, max_leaf: i32) {
        let node = tree.node(id);
        match node.children {
            None => {
                assert!(node.region.area() <= max_leaf);
                let room = node.room.unwrap();
                assert!(node.region.contains_rect(&room));
            }
            Some((a, b)) => {
                let (ra, rb) = (tree.node(a).region, tree.node(b).region);
                assert_eq!(ra.area() + rb.area(), node.region.area());
                assert!(!ra.intersects(&rb));
                assert!(node.region.contains_rect(&ra));
                assert!(node.region.contains_rect(&rb));
                if node.split_vertically {
                    assert_eq!(rb.x, ra.right());
                } else {
                    assert_eq!(rb.y, ra.bottom());
                }
                check_partition(tree, a, max_leaf);
                check_partition(tree, b, max_leaf);
            }
        }
    }

    #[test]
    fn test_root_covers_map() {
        let config = GenerationConfig::default();
        let (_, tree) = build(1, &config);
        assert_eq!(tree.node(tree.root).region, Rect::new(0, 0, 100, 100));
    }

    #[test]
    fn test_room_ids_are_sequential() {
        let config = GenerationConfig::default();
        let (grid, tree) = build(7, &config);
        for (i, &leaf) in tree.leaves.iter().enumerate() {
            let id = tree.node(leaf).room_id.unwrap();
            assert_eq!(id, FIRST_ROOM_ID + i as i32);
            assert!(!grid.room_cells(id).is_empty());
        }
    }

    #[test]
    fn test_arena_clear_invalidates_ids() {
        let config = GenerationConfig::compact();
        let (_, mut tree) = build(3, &config);
        let root = tree.root;
        assert!(tree.arena.get(root).is_some());
        tree.arena.clear();
        assert!(tree.arena.get(root).is_none());
    }

    #[test]
    fn test_tiny_leaf_is_degenerate() {
        let mut config = GenerationConfig::compact();
        config.map_width = 4;
        config.map_height = 4;
        let mut grid = TileGrid::new(4, 4);
        let mut rng = StdRng::seed_from_u64(0);
        let err = BspTree::build(&mut grid, &config, &mut rng).unwrap_err();
        assert!(matches!(err, GenerationError::DegenerateSplit { .. }));
    }

    #[test]
    fn test_room_bounds_cover_children() {
        let config = GenerationConfig::default();
        let (_, tree) = build(11, &config);
        let bounds = tree.room_bounds(tree.root).unwrap();
        for &leaf in &tree.leaves {
            assert!(bounds.contains_rect(&tree.node(leaf).room.unwrap()));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_split_is_clean_partition(seed in any::<u64>()) {
            let config = GenerationConfig::default();
            let (_, tree) = build(seed, &config);
            check_partition(&tree, tree.root, config.max_leaf_area);
        }

        #[test]
        fn prop_compact_split_is_clean_partition(seed in any::<u64>()) {
            let config = GenerationConfig::compact();
            let (_, tree) = build(seed, &config);
            check_partition(&tree, tree.root, config.max_leaf_area);
        }
    }
}

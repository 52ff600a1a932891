//! Hand-authored levels
//!
//! The hub, the tutorial, boss arenas and the in-between room are fixed
//! layouts read with the same integer-grid format as room templates, plus a
//! few marker codes.

use super::templates::RoomTemplate;
use super::walls::{synthesize_walls, WallCollider};
use super::GenerationError;
use crate::entities::EnemyKind;
use crate::world::encounter::{EnemySpawn, EnemyWave};
use crate::world::{tile, Rect, TileGrid};

const BOSS_ARENA: &str = include_str!("../../../assets/arenas/boss_arena.txt");
const IN_BETWEEN: &str = include_str!("../../../assets/arenas/in_between.txt");
const HUB: &str = include_str!("../../../assets/arenas/hub.txt");
const TUTORIAL: &str = include_str!("../../../assets/arenas/tutorial.txt");

/// Room id every hand-authored floor cell gets
pub const ARENA_ROOM_ID: i32 = tile::FIRST_ROOM_ID;

const PLAYER_SPAWN: i32 = 4;
const BOSS_SPAWN: i32 = 5;
const DOOR: i32 = 6;
const FIRST_GATE: i32 = 7;
const FIRST_REWARD: i32 = 10;
const SIDE_DOOR: i32 = 13;
const NPC: i32 = 14;
/// Both corners of an encounter zone carry its code
const FIRST_ZONE: i32 = 15;
const DUMMY_SPAWN: i32 = 18;
const RANGED_SPAWN: i32 = 19;
const MELEE_SPAWN: i32 = 20;
const CHEST: i32 = 21;
const RELIC_SPOT: i32 = 22;
/// One gate and one reward alcove per floor goal
pub const GOAL_SLOTS: usize = 3;
pub const ZONE_SLOTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaKind {
    Boss,
    InBetween,
    Hub,
    Tutorial,
}

impl ArenaKind {
    fn source(&self) -> &'static str {
        match self {
            ArenaKind::Boss => BOSS_ARENA,
            ArenaKind::InBetween => IN_BETWEEN,
            ArenaKind::Hub => HUB,
            ArenaKind::Tutorial => TUTORIAL,
        }
    }
}

/// A scripted single-wave encounter laid out by hand
#[derive(Debug, Clone, PartialEq)]
pub struct ArenaEncounter {
    pub zone: Rect,
    pub wave: EnemyWave,
}

/// A parsed hand-authored level
#[derive(Debug, Clone)]
pub struct ArenaLayout {
    pub grid: TileGrid,
    pub colliders: Vec<WallCollider>,
    pub player_spawn: (i32, i32),
    pub boss_spawn: Option<(i32, i32)>,
    pub door: Option<(i32, i32)>,
    /// Footprint of each goal gate; a wall is raised here when the goal fails
    pub goal_gates: [Option<Rect>; GOAL_SLOTS],
    pub reward_spots: [Option<(i32, i32)>; GOAL_SLOTS],
    /// Second exit, e.g. the hub's way into the tutorial
    pub side_door: Option<(i32, i32)>,
    pub npc: Option<(i32, i32)>,
    pub chests: Vec<(i32, i32)>,
    pub relic_spots: Vec<(i32, i32)>,
    /// In zone order; zones without enemies are dropped
    pub encounters: Vec<ArenaEncounter>,
}

impl ArenaLayout {
    pub fn load(kind: ArenaKind, min_wall_collision: i32) -> Result<Self, GenerationError> {
        Self::parse(kind.source(), min_wall_collision)
    }

    pub fn parse(text: &str, min_wall_collision: i32) -> Result<Self, GenerationError> {
        let layout = RoomTemplate::parse(text)?;
        let mut grid = TileGrid::new(layout.width, layout.height);
        let mut player_spawn = None;
        let mut boss_spawn = None;
        let mut door = None;
        let mut goal_gates: [Option<Rect>; GOAL_SLOTS] = [None; GOAL_SLOTS];
        let mut reward_spots = [None; GOAL_SLOTS];
        let mut side_door = None;
        let mut npc = None;
        let mut chests = Vec::new();
        let mut relic_spots = Vec::new();
        let mut zones: [Option<Rect>; ZONE_SLOTS] = [None; ZONE_SLOTS];
        let mut spawns: Vec<EnemySpawn> = Vec::new();

        for y in 0..layout.height {
            for x in 0..layout.width {
                let code = layout.cell(x, y);
                let cell = match code {
                    tile::EMPTY | tile::WALL | tile::CORRIDOR => code,
                    PLAYER_SPAWN => {
                        player_spawn = Some((x, y));
                        ARENA_ROOM_ID
                    }
                    BOSS_SPAWN => {
                        boss_spawn = Some((x, y));
                        ARENA_ROOM_ID
                    }
                    DOOR => {
                        door = Some((x, y));
                        ARENA_ROOM_ID
                    }
                    c if (FIRST_GATE..FIRST_GATE + GOAL_SLOTS as i32).contains(&c) => {
                        let slot = (c - FIRST_GATE) as usize;
                        let cell_rect = Rect::new(x, y, 1, 1);
                        goal_gates[slot] = Some(match goal_gates[slot] {
                            Some(r) => r.union(&cell_rect),
                            None => cell_rect,
                        });
                        tile::CORRIDOR
                    }
                    c if (FIRST_REWARD..FIRST_REWARD + GOAL_SLOTS as i32).contains(&c) => {
                        reward_spots[(c - FIRST_REWARD) as usize] = Some((x, y));
                        ARENA_ROOM_ID
                    }
                    SIDE_DOOR => {
                        side_door = Some((x, y));
                        ARENA_ROOM_ID
                    }
                    NPC => {
                        npc = Some((x, y));
                        ARENA_ROOM_ID
                    }
                    c if (FIRST_ZONE..FIRST_ZONE + ZONE_SLOTS as i32).contains(&c) => {
                        let slot = (c - FIRST_ZONE) as usize;
                        let cell_rect = Rect::new(x, y, 1, 1);
                        zones[slot] = Some(match zones[slot] {
                            Some(r) => r.union(&cell_rect),
                            None => cell_rect,
                        });
                        ARENA_ROOM_ID
                    }
                    DUMMY_SPAWN | RANGED_SPAWN | MELEE_SPAWN => {
                        let kind = match code {
                            DUMMY_SPAWN => EnemyKind::Dummy,
                            RANGED_SPAWN => EnemyKind::Ranged,
                            _ => EnemyKind::Melee,
                        };
                        spawns.push(EnemySpawn { kind, tile: (x, y) });
                        ARENA_ROOM_ID
                    }
                    CHEST => {
                        chests.push((x, y));
                        ARENA_ROOM_ID
                    }
                    RELIC_SPOT => {
                        relic_spots.push((x, y));
                        ARENA_ROOM_ID
                    }
                    _ => ARENA_ROOM_ID,
                };
                grid.set(x, y, cell);
            }
        }

        let player_spawn = player_spawn.ok_or(GenerationError::MissingMarker { marker: "player spawn" })?;
        let encounters = group_spawns(&zones, spawns)?;
        let colliders = synthesize_walls(&mut grid, min_wall_collision);

        Ok(Self {
            grid,
            colliders,
            player_spawn,
            boss_spawn,
            door,
            goal_gates,
            reward_spots,
            side_door,
            npc,
            chests,
            relic_spots,
            encounters,
        })
    }
}

/// Put every enemy marker into the wave of the zone that holds it
fn group_spawns(
    zones: &[Option<Rect>; ZONE_SLOTS],
    spawns: Vec<EnemySpawn>,
) -> Result<Vec<ArenaEncounter>, GenerationError> {
    let mut encounters: Vec<ArenaEncounter> = zones
        .iter()
        .flatten()
        .map(|&zone| ArenaEncounter { zone, wave: EnemyWave::default() })
        .collect();

    for spawn in spawns {
        let (x, y) = spawn.tile;
        let encounter = encounters
            .iter_mut()
            .find(|e| e.zone.contains(x, y))
            .ok_or(GenerationError::StrayMarker { marker: spawn.kind.name(), at: spawn.tile })?;
        encounter.wave.enemies.push(spawn);
    }

    encounters.retain(|e| !e.wave.enemies.is_empty());
    Ok(encounters)
}

//! Encounter rooms
//!
//! Each encounter room holds a list of enemy waves. Walking into the room
//! starts wave 0; every wave after that starts when the previous one is
//! dead, and the room clears after the last wave.

use rand::Rng;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use super::{Rect, TileGrid};
use crate::entities::EnemyKind;

new_key_type! {
    /// Handle to an encounter room in an [`EncounterSet`]
    pub struct EncounterKey;
}

/// All encounter rooms of the current level
pub type EncounterSet = SlotMap<EncounterKey, EncounterRoomManager>;

/// Wave and enemy counts for randomly rolled encounters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    pub min_waves: usize,
    pub max_waves: usize,
    pub min_enemies_per_wave: usize,
    pub max_enemies_per_wave: usize,
    /// Seconds a spawn indicator shows before the enemy appears
    pub spawn_indicator_delay: f32,
    pub enemy_kinds: Vec<EnemyKind>,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            min_waves: 2,
            max_waves: 3,
            min_enemies_per_wave: 3,
            max_enemies_per_wave: 4,
            spawn_indicator_delay: 1.0,
            enemy_kinds: vec![EnemyKind::Ranged, EnemyKind::Shotgun, EnemyKind::Melee, EnemyKind::Tower],
        }
    }
}

/// One enemy to create when its wave starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub kind: EnemyKind,
    pub tile: (i32, i32),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyWave {
    pub enemies: Vec<EnemySpawn>,
}

/// Where an encounter is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterState {
    Idle,
    Active { wave: usize },
    Cleared,
}

/// What the owner of an encounter has to do after notifying it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncounterEvent {
    /// Nothing changed
    Ignored,
    /// Enemies of the current wave are still alive
    Waiting { remaining: i32 },
    /// Create these enemies (raise the boundary walls if this is wave 0)
    SpawnWave { wave: usize, enemies: Vec<EnemySpawn> },
    /// Last wave is dead; drop the boundary walls
    Cleared,
}

/// Trigger and wave state for one encounter room
#[derive(Debug, Clone)]
pub struct EncounterRoomManager {
    /// Room footprint in tiles
    pub rect: Rect,
    pub waves: Vec<EnemyWave>,
    pub is_triggered: bool,
    pub is_active: bool,
    pub current_wave: usize,
    pub current_enemy_count: i32,
}

impl EncounterRoomManager {
    /// Manager with hand-picked waves
    pub fn from_waves(rect: Rect, waves: Vec<EnemyWave>) -> Self {
        Self {
            rect,
            waves,
            is_triggered: false,
            is_active: false,
            current_wave: 0,
            current_enemy_count: 0,
        }
    }

    /// Manager with random waves placed on walkable cells of `rect`
    pub fn init(rect: Rect, grid: &TileGrid, config: &EncounterConfig, rng: &mut impl Rng) -> Self {
        let num_waves = rng.gen_range(config.min_waves..=config.max_waves.max(config.min_waves));
        let waves = (0..num_waves)
            .map(|_| {
                let count = rng.gen_range(
                    config.min_enemies_per_wave..=config.max_enemies_per_wave.max(config.min_enemies_per_wave),
                );
                let enemies = (0..count)
                    .filter_map(|_| {
                        let kind = *config.enemy_kinds.get(rng.gen_range(0..config.enemy_kinds.len().max(1)))?;
                        let tile = random_walkable_tile(rect, grid, rng)?;
                        Some(EnemySpawn { kind, tile })
                    })
                    .collect();
                EnemyWave { enemies }
            })
            .collect();

        Self::from_waves(rect, waves)
    }

    pub fn state(&self) -> EncounterState {
        if self.is_active {
            EncounterState::Active { wave: self.current_wave }
        } else if self.is_triggered {
            EncounterState::Cleared
        } else {
            EncounterState::Idle
        }
    }

    /// Total enemies across every wave
    pub fn total_enemies(&self) -> usize {
        self.waves.iter().map(|w| w.enemies.len()).sum()
    }

    /// The player crossed the trigger volume
    pub fn on_player_entered(&mut self) -> EncounterEvent {
        if self.is_triggered {
            return EncounterEvent::Ignored;
        }
        self.is_triggered = true;
        self.is_active = true;
        self.current_wave = 0;
        self.spawn_enemies()
    }

    /// Start the current wave, skipping waves with no enemies
    pub fn spawn_enemies(&mut self) -> EncounterEvent {
        while self.current_wave < self.waves.len() && self.waves[self.current_wave].enemies.is_empty() {
            self.current_wave += 1;
        }

        let Some(wave) = self.waves.get(self.current_wave) else {
            if self.is_active {
                log::warn!("Encounter at {:?} has no waves left to spawn", self.rect);
                self.is_active = false;
                self.current_enemy_count = 0;
                return EncounterEvent::Cleared;
            }
            log::warn!("Spawn requested for inactive encounter at {:?}", self.rect);
            return EncounterEvent::Ignored;
        };

        self.current_enemy_count = wave.enemies.len() as i32;
        EncounterEvent::SpawnWave {
            wave: self.current_wave,
            enemies: wave.enemies.clone(),
        }
    }

    /// One enemy belonging to this room died
    pub fn enemy_died(&mut self) -> EncounterEvent {
        if !self.is_active {
            log::warn!("Death reported to encounter at {:?} that is not active", self.rect);
            return EncounterEvent::Ignored;
        }

        self.current_enemy_count -= 1;
        if self.current_enemy_count > 0 {
            return EncounterEvent::Waiting { remaining: self.current_enemy_count };
        }

        self.current_enemy_count = 0;
        self.current_wave += 1;
        if self.current_wave >= self.waves.len() {
            self.is_active = false;
            log::info!("Encounter at {:?} cleared", self.rect);
            return EncounterEvent::Cleared;
        }
        self.spawn_enemies()
    }

    /// Volume the player must enter to start the fight
    pub fn trigger_rect(&self) -> Rect {
        if self.rect.w > 2 && self.rect.h > 2 {
            self.rect.inset(1)
        } else {
            self.rect
        }
    }

    /// Walls that seal the room while it is active: top, bottom, left, right
    pub fn boundary_walls(&self) -> [Rect; 4] {
        let r = self.rect;
        [
            Rect::new(r.x - 1, r.y - 1, r.w + 2, 1),
            Rect::new(r.x - 1, r.bottom(), r.w + 2, 1),
            Rect::new(r.x - 1, r.y - 1, 1, r.h + 2),
            Rect::new(r.right(), r.y - 1, 1, r.h + 2),
        ]
    }
}

const MAX_PLACEMENT_TRIES: usize = 64;

/// Rejection-sample a walkable tile, falling back to the first one found
fn random_walkable_tile(rect: Rect, grid: &TileGrid, rng: &mut impl Rng) -> Option<(i32, i32)> {
    if rect.is_empty() {
        return None;
    }
    for _ in 0..MAX_PLACEMENT_TRIES {
        let x = rng.gen_range(rect.x..rect.right());
        let y = rng.gen_range(rect.y..rect.bottom());
        if grid.is_walkable(x, y) {
            return Some((x, y));
        }
    }
    rect.cells().find(|&(x, y)| grid.is_walkable(x, y))
}

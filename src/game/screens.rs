//! Game screens
//!
//! A run starts in the hub, then cycles through procedural floors, a boss
//! arena and the in-between room where floor goals are settled. Dying sends
//! the player back to the hub. The tutorial hangs off the hub.

use serde::{Deserialize, Serialize};

use crate::entities::BossKind;

/// Where a door leads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    BossArena(BossKind),
    InBetween,
    NextFloor,
    Hub,
    Tutorial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameScreen {
    /// Safe room between runs, depth 0
    Hub,
    Tutorial,
    /// Procedural floor, numbered from 1
    Floor { depth: u32 },
    BossArena { depth: u32, boss: BossKind },
    InBetween { depth: u32 },
}

impl GameScreen {
    pub fn depth(&self) -> u32 {
        match *self {
            GameScreen::Hub | GameScreen::Tutorial => 0,
            GameScreen::Floor { depth } | GameScreen::BossArena { depth, .. } | GameScreen::InBetween { depth } => {
                depth
            }
        }
    }

    /// Screen reached by walking through a door to `destination`
    pub fn through(&self, destination: Destination) -> GameScreen {
        let depth = self.depth();
        match destination {
            Destination::BossArena(boss) => GameScreen::BossArena { depth, boss },
            Destination::InBetween => GameScreen::InBetween { depth },
            Destination::NextFloor => GameScreen::Floor { depth: depth + 1 },
            Destination::Hub => GameScreen::Hub,
            Destination::Tutorial => GameScreen::Tutorial,
        }
    }

    /// Procedural floors run the goal timer
    pub fn is_procedural(&self) -> bool {
        matches!(self, GameScreen::Floor { .. })
    }

    pub fn name(&self) -> String {
        match self {
            GameScreen::Hub => "Hub".to_string(),
            GameScreen::Tutorial => "Tutorial".to_string(),
            GameScreen::Floor { depth } => format!("Floor {}", depth),
            GameScreen::BossArena { boss, .. } => format!("{} arena", boss.name()),
            GameScreen::InBetween { .. } => "In-between room".to_string(),
        }
    }
}

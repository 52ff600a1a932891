//! Entity creation and behaviour

pub mod bosses;
pub mod enemies;
pub mod loot;
pub mod npcs;
pub mod player;

pub use bosses::{spawn_boss, Boss1State, Boss2State, BossKind, BossSegment, BossSegments};
pub use enemies::{spawn_enemy, Enemy, EnemyAi, EnemyError, EnemyKind, SpawnOptions};
pub use loot::LootDrop;
pub use npcs::{spawn_npc, Npc, NpcKind};
pub use player::{spawn_player, PlayerInput};

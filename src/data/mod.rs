//! Data loading and external game content
//!
//! Floor generation, enemy and spell tables are read from RON files when
//! present, so tuning does not need a rebuild.

pub mod enemies;
pub mod loader;

pub use enemies::{default_enemy_table, AttackPattern, EngageStyle, EnemyTable, EnemyTunables};
pub use loader::{data_dirs, export_default_data, DataError, DataManager, GenerationFile};

//! RON data loader
//!
//! Loads game data from external RON files, with fallback to hardcoded defaults.
//! The per-user data directory is searched before `assets/data`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::enemies::{default_enemy_table, EnemyTable};
use crate::spells::SpellCatalog;
use crate::world::generation::{GenerationConfig, GenerationError, TemplateCatalog};
use crate::world::EncounterConfig;

/// Bundled data directory, relative to the working directory
pub const ASSET_DATA_DIR: &str = "assets/data";
/// Room template overrides, relative to the working directory
pub const ASSET_ROOMS_DIR: &str = "assets/rooms";

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path:?}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("failed to parse {path:?}: {source}")]
    Parse { path: PathBuf, source: ron::error::SpannedError },

    #[error("failed to serialize {name}: {source}")]
    Serialize { name: &'static str, source: ron::Error },

    #[error("room templates: {0}")]
    Templates(#[from] GenerationError),
}

/// Encounter tuning is stored next to floor generation
#[derive(Debug, Clone, Default, PartialEq, Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GenerationFile {
    pub floor: GenerationConfig,
    pub encounters: EncounterConfig,
}

/// Manages all external game data
#[derive(Debug, Clone)]
pub struct DataManager {
    pub generation: GenerationConfig,
    pub encounters: EncounterConfig,
    pub enemies: EnemyTable,
    pub spells: SpellCatalog,
    pub templates: TemplateCatalog,
}

impl DataManager {
    /// Load from the standard search path, falling back per file
    pub fn new() -> Result<Self, DataError> {
        Self::load_from(&data_dirs(), Path::new(ASSET_ROOMS_DIR))
    }

    /// Built-in tables only
    pub fn builtin() -> Result<Self, DataError> {
        Ok(Self {
            generation: GenerationConfig::default(),
            encounters: EncounterConfig::default(),
            enemies: default_enemy_table(),
            spells: SpellCatalog::builtin(),
            templates: TemplateCatalog::builtin()?,
        })
    }

    /// Load each file from the first directory in `dirs` that has it
    pub fn load_from(dirs: &[PathBuf], rooms_dir: &Path) -> Result<Self, DataError> {
        let generation = Self::load_generation(dirs);
        let enemies = load_or_default(dirs, "enemies.ron", default_enemy_table);
        let spells = Self::load_spells(dirs);
        let templates = Self::load_templates(rooms_dir)?;

        Ok(Self {
            generation: generation.floor,
            encounters: generation.encounters,
            enemies,
            spells,
            templates,
        })
    }

    fn load_generation(dirs: &[PathBuf]) -> GenerationFile {
        let file: GenerationFile = load_or_default(dirs, "generation.ron", GenerationFile::default);
        if let Err(e) = file.floor.validate() {
            log::warn!("Ignoring generation.ron: {}", e);
            return GenerationFile::default();
        }
        file
    }

    fn load_spells(dirs: &[PathBuf]) -> SpellCatalog {
        let catalog: SpellCatalog = load_or_default(dirs, "spells.ron", SpellCatalog::builtin);
        let missing = catalog.missing();
        if !missing.is_empty() {
            log::warn!("spells.ron is missing {:?}; using the built-in catalog", missing);
            return SpellCatalog::builtin();
        }
        catalog
    }

    fn load_templates(rooms_dir: &Path) -> Result<TemplateCatalog, DataError> {
        if !rooms_dir.is_dir() {
            return Ok(TemplateCatalog::builtin()?);
        }
        match TemplateCatalog::load_dir(rooms_dir) {
            Ok(catalog) => Ok(catalog),
            Err(e) => {
                log::warn!("Failed to load room templates from {:?}: {}", rooms_dir, e);
                Ok(TemplateCatalog::builtin()?)
            }
        }
    }
}

/// Data directories in search order
pub fn data_dirs() -> Vec<PathBuf> {
    use directories::ProjectDirs;

    let mut dirs = Vec::new();
    if let Some(proj_dirs) = ProjectDirs::from("com", "ashfall", "Ashfall") {
        dirs.push(proj_dirs.data_local_dir().join("data"));
    }
    dirs.push(PathBuf::from(ASSET_DATA_DIR));
    dirs
}

/// Parse `name` from the first directory that has it. `Ok(None)` if none does.
pub fn load_ron<T: DeserializeOwned>(dirs: &[PathBuf], name: &str) -> Result<Option<T>, DataError> {
    let Some(path) = dirs.iter().map(|d| d.join(name)).find(|p| p.exists()) else {
        return Ok(None);
    };
    let content = fs::read_to_string(&path).map_err(|source| DataError::Io { path: path.clone(), source })?;
    let value = ron::from_str(&content).map_err(|source| DataError::Parse { path: path.clone(), source })?;
    log::debug!("Loaded {}", path.display());
    Ok(Some(value))
}

fn load_or_default<T: DeserializeOwned>(dirs: &[PathBuf], name: &str, default: fn() -> T) -> T {
    match load_ron(dirs, name) {
        Ok(Some(value)) => value,
        Ok(None) => {
            log::debug!("No {} found, using defaults", name);
            default()
        }
        Err(e) => {
            log::warn!("{}. Using defaults.", e);
            default()
        }
    }
}

/// Export all default data to RON files for easy editing
pub fn export_default_data(dir: &Path) -> Result<(), DataError> {
    fs::create_dir_all(dir).map_err(|source| DataError::Io { path: dir.to_path_buf(), source })?;

    write_ron(dir, "generation.ron", &GenerationFile::default())?;
    write_ron(dir, "enemies.ron", &default_enemy_table())?;
    write_ron(dir, "spells.ron", &SpellCatalog::builtin())?;
    Ok(())
}

fn write_ron<T: Serialize>(dir: &Path, name: &'static str, value: &T) -> Result<(), DataError> {
    let text = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
        .map_err(|source| DataError::Serialize { name, source })?;
    let path = dir.join(name);
    fs::write(&path, text).map_err(|source| DataError::Io { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EnemyKind;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ashfall-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_export_then_load_matches_builtin() {
        let dir = scratch_dir("export");
        export_default_data(&dir).unwrap();
        assert!(dir.join("generation.ron").exists());
        assert!(dir.join("enemies.ron").exists());
        assert!(dir.join("spells.ron").exists());

        let manager = DataManager::load_from(&[dir.clone()], &dir.join("rooms")).unwrap();
        assert_eq!(manager.generation, GenerationConfig::default());
        assert_eq!(manager.encounters, EncounterConfig::default());
        assert_eq!(manager.enemies, default_enemy_table());
        assert_eq!(manager.spells, SpellCatalog::builtin());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = scratch_dir("malformed");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("enemies.ron"), "this is not ron").unwrap();

        assert!(matches!(
            load_ron::<EnemyTable>(&[dir.clone()], "enemies.ron"),
            Err(DataError::Parse { .. })
        ));
        let manager = DataManager::load_from(&[dir.clone()], &dir).unwrap();
        assert_eq!(manager.enemies, default_enemy_table());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_first_directory_wins() {
        let first = scratch_dir("first");
        let second = scratch_dir("second");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        fs::write(first.join("generation.ron"), "(floor: (map_width: 60))").unwrap();
        fs::write(second.join("generation.ron"), "(floor: (map_width: 80))").unwrap();

        let manager = DataManager::load_from(&[first.clone(), second.clone()], &first).unwrap();
        assert_eq!(manager.generation.map_width, 60);
        assert_eq!(manager.generation.map_height, GenerationConfig::default().map_height);
        let _ = fs::remove_dir_all(&first);
        let _ = fs::remove_dir_all(&second);
    }

    #[test]
    fn test_invalid_generation_config_is_ignored() {
        let dir = scratch_dir("invalid");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("generation.ron"), "(floor: (min_split_fraction: 0.9))").unwrap();
        let manager = DataManager::load_from(&[dir.clone()], &dir).unwrap();
        assert_eq!(manager.generation, GenerationConfig::default());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_bundled_assets_parse() {
        let dirs = [PathBuf::from(ASSET_DATA_DIR)];
        let generation = load_ron::<GenerationFile>(&dirs, "generation.ron").unwrap().unwrap();
        generation.floor.validate().unwrap();
        let enemies = load_ron::<EnemyTable>(&dirs, "enemies.ron").unwrap().unwrap();
        assert_eq!(enemies.get(EnemyKind::Shotgun).kind, EnemyKind::Shotgun);
        let spells = load_ron::<SpellCatalog>(&dirs, "spells.ron").unwrap().unwrap();
        assert!(spells.missing().is_empty());
    }
}

//! Spawn descriptor persistence (JSON)

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::SaveService;
use crate::constants::{DEFAULT_SCENE, DEFAULT_SPAWN_KEY};

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Save not found: {0}")]
    NotFound(String),
}

/// Where the hero appears after the next load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnData {
    pub scene_name: String,
    pub spawn_point_key: String,
    pub facing_right: bool,
}

impl Default for SpawnData {
    fn default() -> Self {
        Self {
            scene_name: DEFAULT_SCENE.to_string(),
            spawn_point_key: DEFAULT_SPAWN_KEY.to_string(),
            facing_right: true,
        }
    }
}

/// JSON files under `<root>/<folder>/<file>`, or an in-memory map when
/// there is no root (headless runs and tests)
#[derive(Resource, Debug, Default)]
pub struct JsonSaveStore {
    root: Option<PathBuf>,
    memory: HashMap<String, String>,
}

impl JsonSaveStore {
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            memory: HashMap::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    fn key(folder: &str, file: &str) -> String {
        format!("{}/{}", folder, file)
    }
}

impl SaveService for JsonSaveStore {
    fn save(&mut self, data: &SpawnData, folder: &str, file: &str) -> Result<(), SaveError> {
        let json = serde_json::to_string_pretty(data)?;
        match &self.root {
            Some(root) => {
                let dir = root.join(folder);
                fs::create_dir_all(&dir)?;
                fs::write(dir.join(file), json)?;
            }
            None => {
                self.memory.insert(Self::key(folder, file), json);
            }
        }
        Ok(())
    }

    fn load(&self, folder: &str, file: &str) -> Result<SpawnData, SaveError> {
        let json = match &self.root {
            Some(root) => {
                let path = root.join(folder).join(file);
                if !path.exists() {
                    return Err(SaveError::NotFound(path.display().to_string()));
                }
                fs::read_to_string(path)?
            }
            None => self
                .memory
                .get(&Self::key(folder, file))
                .cloned()
                .ok_or_else(|| SaveError::NotFound(Self::key(folder, file)))?,
        };
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_round_trip() {
        let mut store = JsonSaveStore::in_memory();
        assert!(matches!(
            store.load("SaveFiles", "SpawnPoint.json"),
            Err(SaveError::NotFound(_))
        ));
        let data = SpawnData {
            scene_name: "Level2".into(),
            spawn_point_key: "Terminal".into(),
            facing_right: false,
        };
        store.save(&data, "SaveFiles", "SpawnPoint.json").unwrap();
        assert_eq!(store.load("SaveFiles", "SpawnPoint.json").unwrap(), data);
    }

    #[test]
    fn test_file_store_writes_under_folder() {
        let root = std::env::temp_dir().join(format!("ghostline-save-{}", uuid::Uuid::new_v4()));
        let mut store = JsonSaveStore::at(&root);
        store.save(&SpawnData::default(), "Slot", "spawn.json").unwrap();
        assert!(root.join("Slot").join("spawn.json").exists());
        assert_eq!(store.load("Slot", "spawn.json").unwrap(), SpawnData::default());
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let root = std::env::temp_dir().join(format!("ghostline-save-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(root.join("Slot")).unwrap();
        fs::write(root.join("Slot").join("spawn.json"), "{not json").unwrap();
        let store = JsonSaveStore::at(&root);
        assert!(matches!(
            store.load("Slot", "spawn.json"),
            Err(SaveError::Serialization(_))
        ));
        let _ = fs::remove_dir_all(root);
    }
}

//! Level database - parsing and storage
//!
//! Levels live in a line-based text file:
//!
//! ```text
//! level: Level1
//! platform: <min_x> <min_y> <max_x> <max_y>
//! hazard:   <min_x> <min_y> <max_x> <max_y>
//! gate:     <min_x> <min_y> <max_x> <max_y>
//! plate:    <min_x> <min_y> <max_x> <max_y> [gate_index]
//! spawn:    <key> <x> <y> [left|right]
//! terminal: <min_x> <min_y> <max_x> <max_y>
//! ```

use bevy::prelude::*;
use std::fs;

use crate::constants::{DEFAULT_SPAWN_KEY, TERMINAL_SPAWN_KEY};
use crate::world::{Aabb, Gate, LevelGeometry, PressurePlate, SpawnPoint};

/// Plate definition. `gate` indexes the level's gate list.
#[derive(Clone, Debug, PartialEq)]
pub struct PlateDef {
    pub bounds: Aabb,
    pub gate: Option<usize>,
}

/// Single level definition
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LevelData {
    pub name: String,
    pub platforms: Vec<Aabb>,
    pub hazards: Vec<Aabb>,
    pub gates: Vec<Aabb>,
    pub plates: Vec<PlateDef>,
    pub spawns: Vec<SpawnPoint>,
    pub terminal: Option<Aabb>,
}

impl LevelData {
    /// Build runtime collision geometry. Plates bound to a missing gate
    /// are kept but unbound.
    pub fn build_geometry(&self) -> LevelGeometry {
        let plates = self
            .plates
            .iter()
            .enumerate()
            .map(|(index, plate)| {
                let gate = match plate.gate {
                    Some(g) if g >= self.gates.len() => {
                        error!(
                            "Level {}: plate {} bound to missing gate {}, plate disabled",
                            self.name, index, g
                        );
                        None
                    }
                    other => other,
                };
                PressurePlate::new(plate.bounds, gate)
            })
            .collect();

        LevelGeometry {
            name: self.name.clone(),
            solids: self.platforms.clone(),
            hazards: self.hazards.clone(),
            gates: self.gates.iter().copied().map(Gate::new).collect(),
            plates,
            spawn_points: self.spawns.clone(),
            terminal_zone: self.terminal,
        }
    }
}

/// Database of all loaded levels
#[derive(Resource, Clone, Default)]
pub struct LevelDatabase {
    pub levels: Vec<LevelData>,
}

fn parse_floats(params: &str) -> Vec<f32> {
    params
        .split_whitespace()
        .filter_map(|p| p.parse::<f32>().ok())
        .collect()
}

fn parse_box(params: &str) -> Option<Aabb> {
    match parse_floats(params)[..] {
        [min_x, min_y, max_x, max_y, ..] if min_x < max_x && min_y < max_y => Some(Aabb {
            min: Vec2::new(min_x, min_y),
            max: Vec2::new(max_x, max_y),
        }),
        _ => None,
    }
}

fn parse_spawn(params: &str) -> Option<SpawnPoint> {
    let parts: Vec<&str> = params.split_whitespace().collect();
    if parts.len() < 3 {
        return None;
    }
    let (Ok(x), Ok(y)) = (parts[1].parse::<f32>(), parts[2].parse::<f32>()) else {
        return None;
    };
    Some(SpawnPoint {
        key: parts[0].to_string(),
        position: Vec2::new(x, y),
        facing_right: parts.get(3).is_none_or(|f| *f != "left"),
    })
}

impl LevelDatabase {
    /// Load levels from file, returns default hardcoded levels on error
    pub fn load_from_file(path: &str) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                warn!("Failed to load levels from {}: {}, using defaults", path, e);
                Self::default_levels()
            }
        }
    }

    /// Parse level data from string
    pub fn parse(content: &str) -> Self {
        let mut levels = Vec::new();
        let mut current_level: Option<LevelData> = None;

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix("level:") {
                if let Some(level) = current_level.take() {
                    levels.push(level);
                }
                current_level = Some(LevelData {
                    name: name.trim().to_string(),
                    ..Default::default()
                });
                continue;
            }

            let Some(level) = current_level.as_mut() else {
                warn!("levels line {}: entry before any level:, ignored", line_no + 1);
                continue;
            };

            let parsed = if let Some(params) = line.strip_prefix("platform:") {
                parse_box(params).map(|b| level.platforms.push(b))
            } else if let Some(params) = line.strip_prefix("hazard:") {
                parse_box(params).map(|b| level.hazards.push(b))
            } else if let Some(params) = line.strip_prefix("gate:") {
                parse_box(params).map(|b| level.gates.push(b))
            } else if let Some(params) = line.strip_prefix("plate:") {
                parse_box(params).map(|bounds| {
                    let gate = params
                        .split_whitespace()
                        .nth(4)
                        .and_then(|g| g.parse::<usize>().ok());
                    level.plates.push(PlateDef { bounds, gate });
                })
            } else if let Some(params) = line.strip_prefix("spawn:") {
                parse_spawn(params).map(|s| level.spawns.push(s))
            } else if let Some(params) = line.strip_prefix("terminal:") {
                parse_box(params).map(|b| level.terminal = Some(b))
            } else {
                None
            };

            if parsed.is_none() {
                warn!("levels line {}: could not parse '{}'", line_no + 1, line);
            }
        }

        // Don't forget the last level
        if let Some(level) = current_level {
            levels.push(level);
        }

        if levels.is_empty() {
            warn!("No levels parsed, using defaults");
            return Self::default_levels();
        }

        info!("Loaded {} levels from file", levels.len());
        Self { levels }
    }

    /// Hardcoded fallback levels
    pub fn default_levels() -> Self {
        let boxed = |min_x: f32, min_y: f32, max_x: f32, max_y: f32| Aabb {
            min: Vec2::new(min_x, min_y),
            max: Vec2::new(max_x, max_y),
        };
        let spawn = |key: &str, x: f32, facing_right: bool| SpawnPoint {
            key: key.to_string(),
            position: Vec2::new(x, 0.0),
            facing_right,
        };

        Self {
            levels: vec![
                LevelData {
                    name: "Level1".to_string(),
                    platforms: vec![
                        boxed(-20.0, -1.0, 40.0, 0.0),
                        boxed(-21.0, -1.0, -20.0, 12.0),
                        boxed(6.0, 2.0, 10.0, 2.5),
                        boxed(30.0, 0.0, 31.0, 3.0),
                    ],
                    hazards: vec![boxed(14.0, 0.0, 16.0, 0.4)],
                    gates: vec![boxed(22.0, 0.0, 22.5, 6.0)],
                    plates: vec![PlateDef {
                        bounds: boxed(18.0, 0.0, 20.0, 0.2),
                        gate: Some(0),
                    }],
                    spawns: vec![
                        spawn(DEFAULT_SPAWN_KEY, -15.0, true),
                        spawn(TERMINAL_SPAWN_KEY, -6.0, true),
                    ],
                    terminal: Some(boxed(-7.0, 0.0, -5.0, 2.0)),
                },
                LevelData {
                    name: "flat".to_string(),
                    platforms: vec![boxed(-500.0, -1.0, 500.0, 0.0)],
                    spawns: vec![spawn(DEFAULT_SPAWN_KEY, 0.0, true)],
                    ..Default::default()
                },
            ],
        }
    }

    /// Get level by index
    pub fn get(&self, index: usize) -> Option<&LevelData> {
        self.levels.get(index)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&LevelData> {
        self.levels.iter().find(|l| l.name == name)
    }

    /// Get number of levels
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Check if database is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
# two rooms
level: Room
platform: -10 -1 10 0
gate: 4 0 4.5 4
plate: 1 0 2 0.2 0
plate: 3 0 3.5 0.2 7
spawn: Start -5 0
spawn: Terminal 0 0 left
terminal: -1 0 1 2
bogus: 1 2 3

level: Empty
platform: 0 0 1
";

    #[test]
    fn test_parse_levels() {
        let db = LevelDatabase::parse(SAMPLE);
        assert_eq!(db.len(), 2);

        let room = db.get_by_name("Room").unwrap();
        assert_eq!(room.platforms.len(), 1);
        assert_eq!(room.gates.len(), 1);
        assert_eq!(room.plates[0].gate, Some(0));
        assert_eq!(room.spawns.len(), 2);
        assert!(!room.spawns[1].facing_right);
        assert!(room.spawns[0].facing_right);
        assert!(room.terminal.is_some());

        // Short platform line is rejected
        assert!(db.get_by_name("Empty").unwrap().platforms.is_empty());
    }

    #[test]
    fn test_missing_gate_binding_unbinds_plate() {
        let db = LevelDatabase::parse(SAMPLE);
        let geometry = db.get_by_name("Room").unwrap().build_geometry();
        assert_eq!(geometry.plates[0].gate, Some(0));
        assert_eq!(geometry.plates[1].gate, None);
        assert_eq!(geometry.name, "Room");
    }

    #[test]
    fn test_empty_file_falls_back_to_defaults() {
        let db = LevelDatabase::parse("# nothing here");
        assert!(db.get_by_name("Level1").is_some());
        assert!(db.get_by_name("flat").is_some());
    }

    #[test]
    fn test_default_level_has_terminal_spawn() {
        let db = LevelDatabase::default_levels();
        let level = db.get_by_name("Level1").unwrap().build_geometry();
        assert!(level.spawn_point(TERMINAL_SPAWN_KEY).is_some());
        let terminal = level.spawn_point(TERMINAL_SPAWN_KEY).unwrap().position;
        assert!(level.terminal_zone.unwrap().contains(terminal + Vec2::new(0.0, 0.5)));
    }
}

//! Spawn control - where the hero appears after a load

use bevy::prelude::*;

use super::SpawnData;
use crate::constants::DEFAULT_SPAWN_KEY;
use crate::world::{LevelGeometry, SpawnPoint};

/// Pick the spawn point for a freshly loaded level.
///
/// A saved descriptor wins when it names this scene and a point that
/// exists; otherwise the level's default point, then its first point.
pub fn resolve_spawn(geometry: &LevelGeometry, saved: Option<&SpawnData>) -> SpawnPoint {
    if let Some(data) = saved.filter(|d| d.scene_name == geometry.name) {
        if let Some(point) = geometry.spawn_point(&data.spawn_point_key) {
            return SpawnPoint {
                facing_right: data.facing_right,
                ..point.clone()
            };
        }
        warn!(
            "Saved spawn point {} not found in {}",
            data.spawn_point_key, geometry.name
        );
    }

    if let Some(point) = geometry
        .spawn_point(DEFAULT_SPAWN_KEY)
        .or_else(|| geometry.spawn_points.first())
    {
        return point.clone();
    }

    warn!("Level {} has no spawn points, spawning at origin", geometry.name);
    SpawnPoint {
        key: DEFAULT_SPAWN_KEY.to_string(),
        position: Vec2::ZERO,
        facing_right: true,
    }
}

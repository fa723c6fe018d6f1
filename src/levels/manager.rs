//! LevelManager - the level service the session restarts through
//!
//! Requests are queued and picked up by `load_pending_level` on the next
//! fixed tick, so a restart requested mid-tick never tears down the world
//! under a running system.

use bevy::prelude::*;

use crate::constants::DEFAULT_SCENE;
use crate::session::LevelService;

#[derive(Resource, Debug)]
pub struct LevelManager {
    current: String,
    pending: Option<String>,
    load_count: u32,
}

impl Default for LevelManager {
    fn default() -> Self {
        Self::starting_at(DEFAULT_SCENE)
    }
}

impl LevelManager {
    /// Manager that loads `scene` on the first tick
    pub fn starting_at(scene: &str) -> Self {
        Self {
            current: scene.to_string(),
            pending: Some(scene.to_string()),
            load_count: 0,
        }
    }

    pub fn take_pending(&mut self) -> Option<String> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn mark_loaded(&mut self, scene: &str) {
        self.current = scene.to_string();
        self.load_count += 1;
    }

    /// Completed loads since startup, the first one included
    pub fn load_count(&self) -> u32 {
        self.load_count
    }
}

impl LevelService for LevelManager {
    fn current_scene(&self) -> &str {
        &self.current
    }

    fn restart_current_level(&mut self) {
        debug!("Restart of {} requested", self.current);
        self.pending = Some(self.current.clone());
    }

    fn load_level_by_name(&mut self, name: &str) {
        debug!("Load of {} requested", name);
        self.pending = Some(name.to_string());
    }
}

//! Headless App Builder
//!
//! Provides a reusable builder for creating headless Bevy apps with the full
//! ghostline schedule. Used by the session demo, the scenario runner and
//! app-level tests.

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use std::time::Duration;

use crate::levels::{LevelDatabase, LevelManager};
use crate::plugin::GhostlinePlugin;
use crate::profiles::ProfileDatabase;
use crate::session::JsonSaveStore;
use crate::tuning::GameplayTuning;

/// Builder for creating headless Bevy apps
pub struct HeadlessAppBuilder {
    level_id: Option<String>,
    level_db: Option<LevelDatabase>,
    profile_db: Option<ProfileDatabase>,
    tuning: Option<GameplayTuning>,
    minimal_threads: bool,
}

impl Default for HeadlessAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessAppBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            level_id: None,
            level_db: None,
            profile_db: None,
            tuning: None,
            minimal_threads: false,
        }
    }

    /// Set the level loaded on the first tick
    pub fn with_level(mut self, level_id: &str) -> Self {
        self.level_id = Some(level_id.to_string());
        self
    }

    /// Set the level database
    pub fn with_level_db(mut self, level_db: LevelDatabase) -> Self {
        self.level_db = Some(level_db);
        self
    }

    /// Set the character profile database
    pub fn with_profile_db(mut self, profile_db: ProfileDatabase) -> Self {
        self.profile_db = Some(profile_db);
        self
    }

    /// Use these tuning values instead of the config file
    pub fn with_tuning(mut self, tuning: GameplayTuning) -> Self {
        self.tuning = Some(tuning);
        self
    }

    /// Enable minimal thread mode (task pools = 1)
    ///
    /// Use this when running many apps side by side to avoid hitting OS thread limits.
    pub fn with_minimal_threads(mut self) -> Self {
        self.minimal_threads = true;
        self
    }

    /// Build the app with minimal plugins and the ghostline schedule
    ///
    /// Databases default to the built-in sets rather than the asset files,
    /// and saves stay in memory, so headless runs never touch the disk.
    /// Drive it with [`step_fixed`].
    pub fn build(self) -> App {
        let mut app = App::new();
        let tuning = self.tuning.unwrap_or_default();

        let runner = ScheduleRunnerPlugin::run_loop(Duration::from_secs_f32(tuning.fixed_dt));
        if self.minimal_threads {
            app.add_plugins(MinimalPlugins.set(runner).set(TaskPoolPlugin {
                task_pool_options: TaskPoolOptions::with_num_threads(1),
            }));
        } else {
            app.add_plugins(MinimalPlugins.set(runner));
        }

        let level_id = self
            .level_id
            .unwrap_or_else(|| crate::constants::DEFAULT_SCENE.to_string());
        app.insert_resource(LevelManager::starting_at(&level_id));
        app.insert_resource(self.level_db.unwrap_or_else(LevelDatabase::default_levels));
        app.insert_resource(
            self.profile_db
                .unwrap_or_else(ProfileDatabase::default_profiles),
        );
        app.insert_resource(JsonSaveStore::in_memory());
        app.insert_resource(tuning);

        app.add_plugins(GhostlinePlugin);
        app
    }
}

/// Run the fixed schedule `ticks` times, independent of wall-clock time
pub fn step_fixed(app: &mut App, ticks: u32) {
    for _ in 0..ticks {
        app.world_mut().run_schedule(FixedUpdate);
    }
}

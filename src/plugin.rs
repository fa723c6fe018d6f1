//! GhostlinePlugin - resources and schedule wiring
//!
//! Fixed tick order: level load, terminal commands, then (unless the
//! terminal has the world frozen) input latch, playback, recording tap,
//! simulation, state mirror, plates, kiosks, death restarts. Recorder and
//! session notifications are forwarded last so they see this tick's stops.

use bevy::prelude::*;

use crate::clones::sync_body_visuals;
use crate::constants::{LEVELS_FILE, SAVE_ROOT};
use crate::events::{EventBus, advance_event_bus_tick, log_bus_events};
use crate::input::{PlayerCommands, read_command_keys, read_device_input};
use crate::levels::{LevelDatabase, LevelManager, load_pending_level};
use crate::player::{
    latch_player_input, mirror_state_transitions, simulate_characters, sync_transforms,
    update_animators, update_pressure_plates,
};
use crate::profiles::{PROFILES_FILE, ProfileDatabase};
use crate::replay::{record_inputs, tick_playback};
use crate::session::{
    JsonSaveStore, TerminalSession, forward_recorder_events, forward_session_events,
    handle_death_restarts, run_player_commands, tick_session_notice, update_terminal_kiosks,
    world_running,
};
use crate::tuning::{GameplayTuning, load_global_tuning};
use crate::world::LevelGeometry;

/// Resources already present (inserted by a headless builder or a test)
/// are left alone; everything else is loaded from disk or defaulted.
#[derive(Default)]
pub struct GhostlinePlugin;

fn insert_if_missing<R: Resource>(app: &mut App, make: impl FnOnce() -> R) {
    if !app.world().contains_resource::<R>() {
        app.insert_resource(make());
    }
}

impl Plugin for GhostlinePlugin {
    fn build(&self, app: &mut App) {
        insert_if_missing(app, load_global_tuning);
        insert_if_missing(app, || ProfileDatabase::load_from_file(PROFILES_FILE));
        insert_if_missing(app, || LevelDatabase::load_from_file(LEVELS_FILE));
        insert_if_missing(app, LevelManager::default);
        insert_if_missing(app, LevelGeometry::default);
        insert_if_missing(app, || JsonSaveStore::at(SAVE_ROOT));
        insert_if_missing(app, TerminalSession::default);
        insert_if_missing(app, EventBus::new);
        insert_if_missing(app, PlayerCommands::default);

        let fixed_dt = app.world().resource::<GameplayTuning>().fixed_dt;
        app.insert_resource(Time::<Fixed>::from_seconds(f64::from(fixed_dt)));

        app.add_systems(
            Update,
            (
                (read_device_input, read_command_keys),
                (update_animators, sync_transforms, sync_body_visuals),
                log_bus_events,
            )
                .chain(),
        )
        .add_systems(
            FixedUpdate,
            (
                load_pending_level,
                run_player_commands,
                tick_session_notice,
                (
                    advance_event_bus_tick,
                    latch_player_input,
                    tick_playback,
                    record_inputs,
                    simulate_characters,
                    mirror_state_transitions,
                    update_pressure_plates,
                    update_terminal_kiosks,
                    handle_death_restarts,
                )
                    .chain()
                    .run_if(world_running),
                forward_recorder_events,
                forward_session_events,
            )
                .chain(),
        );
    }
}

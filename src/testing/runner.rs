//! Scenario execution engine
//!
//! Each scenario runs in its own headless app. The level loads on a setup
//! tick; scripted frames start on the tick after it, one fixed tick each.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::clones::CloneSwitcher;
use crate::events::EventBus;
use crate::input::{GatherInput, PlayerCommand, PlayerCommands};
use crate::levels::{LevelDatabase, LevelManager};
use crate::player::{Ghost, HumanControlled, PhysicsControl, PlayerStats, StateMachine};
use crate::replay::ReplayPlayback;
use crate::session::TerminalSession;
use crate::simulation::{HeadlessAppBuilder, step_fixed};
use crate::tuning::{GameplayTuning, load_gameplay_tuning_from_file};
use crate::world::LevelGeometry;

use super::TEST_LEVELS_FILE;
use super::assertions::{
    AssertionError, CapturedEvent, EntityState, SessionSnapshot, WorldState, check_sequence,
    check_state,
};
use super::input::{CurrentInputState, ScriptedInputs};
use super::parser::TestDefinition;

/// The only character a scenario can drive
const HERO_ID: &str = "hero";

/// Frames run when a scenario has no inputs or state checks
const DEFAULT_FRAMES: u64 = 60;

/// Result of running a scenario
#[derive(Debug)]
pub enum TestResult {
    Pass { frames: u64 },
    Fail { error: AssertionError },
    Error { message: String },
}

/// Run a scenario against the test level file
pub fn run_test(test: &TestDefinition) -> TestResult {
    run_test_with_levels(test, LevelDatabase::load_from_file(TEST_LEVELS_FILE))
}

/// Run a scenario against the given levels
pub fn run_test_with_levels(test: &TestDefinition, level_db: LevelDatabase) -> TestResult {
    let level_name = &test.setup.level;
    if level_db.get_by_name(level_name).is_none() {
        return TestResult::Error {
            message: format!(
                "Level '{}' not found. Available: {:?}",
                level_name,
                level_db.levels.iter().map(|l| &l.name).collect::<Vec<_>>()
            ),
        };
    }

    let tuning = match &test.setup.tuning {
        Some(path) => match load_gameplay_tuning_from_file(path) {
            Ok(tuning) => tuning,
            Err(message) => return TestResult::Error { message },
        },
        None => GameplayTuning::default(),
    };

    let mut scripted = match ScriptedInputs::from_inputs(&test.input) {
        Ok(scripted) => scripted,
        Err(message) => return TestResult::Error { message },
    };
    if let Some(id) = scripted.frames.values().flat_map(|f| f.keys()).find(|id| *id != HERO_ID) {
        return TestResult::Error {
            message: format!("Unknown scripted character '{}', only '{}' can be driven", id, HERO_ID),
        };
    }

    // Run until the last state check
    for state in &test.expect.state {
        scripted.set_max_frame(state.after_frame);
    }
    if scripted.max_frame == 0 {
        scripted.max_frame = DEFAULT_FRAMES;
    }

    let mut app = HeadlessAppBuilder::new()
        .with_level(level_name)
        .with_level_db(level_db)
        .with_tuning(tuning)
        .with_minimal_threads()
        .build();

    // Setup tick loads the level and spawns the hero
    step_fixed(&mut app, 1);
    if let Some(key) = test.setup.profile_key {
        app.world_mut()
            .resource_mut::<PlayerCommands>()
            .push(PlayerCommand::Digit(key));
    }

    let mut captured: Vec<CapturedEvent> = app
        .world_mut()
        .resource_mut::<EventBus>()
        .drain()
        .iter()
        .map(|e| CapturedEvent::from_bus_event(0, e))
        .collect();

    while scripted.should_continue() {
        let frame = scripted.current_frame;
        let (held, commands) = scripted.advance_frame();
        inject_inputs(app.world_mut(), &held, commands);

        step_fixed(&mut app, 1);

        let events = app.world_mut().resource_mut::<EventBus>().drain();
        captured.extend(events.iter().map(|e| CapturedEvent::from_bus_event(frame, e)));

        for assertion in test.expect.state.iter().filter(|a| a.after_frame == frame) {
            let state = snapshot_world(app.world_mut());
            if let Err(error) = check_state(assertion, &state) {
                return TestResult::Fail { error };
            }
        }
    }

    if let Err(error) = check_sequence(&test.expect.sequence, &captured) {
        return TestResult::Fail { error };
    }

    TestResult::Pass {
        frames: scripted.current_frame,
    }
}

/// Write held input into the hero and queue this frame's commands
fn inject_inputs(
    world: &mut World,
    held: &HashMap<String, CurrentInputState>,
    commands: Vec<PlayerCommand>,
) {
    if let Some(state) = held.get(HERO_ID) {
        let mut heroes = world.query_filtered::<&mut GatherInput, With<HumanControlled>>();
        for mut input in heroes.iter_mut(world) {
            state.write_to(&mut input);
        }
    }
    let mut queue = world.resource_mut::<PlayerCommands>();
    for command in commands {
        queue.push(command);
    }
}

fn entity_state(
    machine: &StateMachine,
    physics: &PhysicsControl,
    stats: &PlayerStats,
    switcher: &CloneSwitcher,
) -> EntityState {
    EntityState {
        x: physics.position.x,
        y: physics.position.y,
        velocity_x: physics.velocity.x,
        velocity_y: physics.velocity.y,
        grounded: physics.grounded,
        state: format!("{:?}", machine.current()),
        remaining_jumps: machine.remaining_jumps(),
        health: stats.health,
        profile: switcher.current_id().map(str::to_string),
        ..Default::default()
    }
}

/// Collect the state scenario checks can look at
pub fn snapshot_world(world: &mut World) -> WorldState {
    let mut entities = HashMap::new();

    let mut heroes = world.query_filtered::<
        (&StateMachine, &PhysicsControl, &PlayerStats, &CloneSwitcher),
        With<HumanControlled>,
    >();
    if let Some((machine, physics, stats, switcher)) = heroes.iter(world).next() {
        entities.insert(HERO_ID.to_string(), entity_state(machine, physics, stats, switcher));
    }

    let mut ghosts = world.query_filtered::<
        (&StateMachine, &PhysicsControl, &PlayerStats, &CloneSwitcher, &ReplayPlayback),
        With<Ghost>,
    >();
    if let Some((machine, physics, stats, switcher, playback)) = ghosts.iter(world).next() {
        let mut state = entity_state(machine, physics, stats, switcher);
        state.playing = playback.is_playing();
        state.hard_snaps = playback.stats().hard_snaps;
        entities.insert("ghost".to_string(), state);
    }

    let session = world.resource::<TerminalSession>();
    let session = SessionSnapshot {
        state: format!("{:?}", session.state()),
        selected_slot: session.selected_slot(),
        slots: session
            .slot_profiles()
            .iter()
            .map(|p| p.map(str::to_string))
            .collect(),
        frozen: session.is_world_frozen(),
        notice: session.current_notice().map(str::to_string),
    };

    WorldState {
        entities,
        session,
        scene: world.resource::<LevelGeometry>().name.clone(),
        load_count: world.resource::<LevelManager>().load_count(),
    }
}

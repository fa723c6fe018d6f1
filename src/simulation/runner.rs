//! Headless record-and-replay run
//!
//! Walks the hero into the level's terminal, records a seeded random input
//! script with one clone, plays it back as a ghost and compares the two
//! transition histories.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::app_builder::{HeadlessAppBuilder, step_fixed};
use super::config::DemoConfig;
use super::report::{DemoReport, describe_transition};
use crate::events::{BusEvent, CharacterRole, EventBus, GameEvent};
use crate::input::{GatherInput, PlayerCommand, PlayerCommands};
use crate::levels::LevelDatabase;
use crate::player::{HumanControlled, PhysicsControl};
use crate::profiles::ProfileDatabase;
use crate::session::{SessionState, TerminalSession};
use crate::testing::CurrentInputState;
use crate::tuning::{GameplayTuning, load_gameplay_tuning_from_file};
use crate::world::Aabb;

/// Ticks allowed for walking to the terminal
const WALK_LIMIT: u32 = 600;
/// Ticks allowed for a session transition to settle
const SETTLE_LIMIT: u32 = 10;
/// Extra ticks past the clip length before playback is declared stuck
const PLAYBACK_SLACK: usize = 20;

/// Steps an app and keeps every bus event it produced
struct DemoDriver {
    app: App,
    events: Vec<BusEvent>,
    held: CurrentInputState,
}

impl DemoDriver {
    fn step(&mut self) {
        let world = self.app.world_mut();
        let mut heroes = world.query_filtered::<&mut GatherInput, With<HumanControlled>>();
        if let Some(mut input) = heroes.iter_mut(world).next() {
            self.held.write_to(&mut input);
        }
        step_fixed(&mut self.app, 1);
        let drained = self.app.world_mut().resource_mut::<EventBus>().drain();
        self.events.extend(drained);
    }

    fn command(&mut self, command: PlayerCommand) {
        self.app
            .world_mut()
            .resource_mut::<PlayerCommands>()
            .push(command);
    }

    fn session(&self) -> &TerminalSession {
        self.app.world().resource::<TerminalSession>()
    }

    fn state(&self) -> SessionState {
        self.session().state()
    }

    fn hero_bounds(&mut self) -> Option<Aabb> {
        let world = self.app.world_mut();
        let mut heroes = world.query_filtered::<&PhysicsControl, With<HumanControlled>>();
        heroes.iter(world).next().map(PhysicsControl::bounds)
    }

    /// Step until the session reaches `target`
    fn settle(&mut self, target: SessionState, limit: u32) -> Result<(), String> {
        for _ in 0..limit {
            if self.state() == target {
                return Ok(());
            }
            self.step();
        }
        if self.state() == target {
            Ok(())
        } else {
            Err(format!(
                "Session stuck in {:?}, expected {:?}",
                self.state(),
                target
            ))
        }
    }

    fn find(&self, from: usize, matches: impl Fn(&GameEvent) -> bool) -> Option<usize> {
        self.events[from..]
            .iter()
            .position(|e| matches(&e.event))
            .map(|i| i + from)
    }
}

/// Run one demo session and report how the ghost tracked the recording
pub fn run_demo(config: &DemoConfig) -> Result<DemoReport, String> {
    let tuning = match &config.tuning_file {
        Some(path) => load_gameplay_tuning_from_file(path)?,
        None => GameplayTuning::default(),
    };
    run_demo_with(config, tuning, LevelDatabase::default_levels())
}

pub fn run_demo_with(
    config: &DemoConfig,
    tuning: GameplayTuning,
    level_db: LevelDatabase,
) -> Result<DemoReport, String> {
    let level = level_db
        .get_by_name(&config.level)
        .ok_or_else(|| format!("Unknown level '{}'", config.level))?;
    let zone = level
        .terminal
        .ok_or_else(|| format!("Level '{}' has no terminal", config.level))?;
    let profiles = ProfileDatabase::default_profiles();
    let profile = profiles
        .get(usize::from(config.profile_key.saturating_sub(1)))
        .ok_or_else(|| format!("No clone on key {}", config.profile_key))?
        .id
        .clone();

    let app = HeadlessAppBuilder::new()
        .with_level(&config.level)
        .with_level_db(level_db.clone())
        .with_profile_db(profiles)
        .with_tuning(tuning)
        .with_minimal_threads()
        .build();
    let mut driver = DemoDriver {
        app,
        events: Vec::new(),
        held: CurrentInputState::default(),
    };
    driver.step();

    // Walk into the terminal zone
    let mut walked = 0;
    loop {
        let bounds = driver
            .hero_bounds()
            .ok_or_else(|| "No hero after level load".to_string())?;
        if bounds.overlaps(&zone) {
            break;
        }
        if walked >= WALK_LIMIT {
            return Err("Hero never reached the terminal".to_string());
        }
        driver.held.move_x = (zone.center().x - bounds.center().x).signum();
        driver.step();
        walked += 1;
    }
    driver.held = CurrentInputState {
        interact: true,
        ..Default::default()
    };
    driver.settle(SessionState::TerminalPaused, SETTLE_LIMIT)?;
    driver.held = CurrentInputState::default();

    driver.command(PlayerCommand::Digit(config.profile_key));
    let record_from = driver.events.len();
    driver.settle(SessionState::Recording, SETTLE_LIMIT)?;

    // Seeded random script while the recorder runs
    let mut rng = StdRng::seed_from_u64(config.seed);
    let hold = config.hold_ticks.max(1);
    let mut recorded = 0;
    while driver.state() == SessionState::Recording && recorded < config.record_ticks {
        if recorded % hold == 0 {
            driver.held = CurrentInputState {
                move_x: rng.gen_range(-1..=1) as f32,
                jump: rng.gen_bool(0.3),
                dash: rng.gen_bool(0.15),
                interact: false,
            };
        }
        driver.step();
        recorded += 1;
    }
    driver.held = CurrentInputState::default();
    if driver.state() == SessionState::Recording {
        driver.command(PlayerCommand::StopRecording);
        driver.step();
    }
    driver.settle(SessionState::TerminalPaused, SETTLE_LIMIT)?;

    let started = driver
        .find(record_from, |e| matches!(e, GameEvent::RecordingStarted { .. }))
        .ok_or_else(|| "Recording never started".to_string())?;
    let session = driver.session();
    let clip = session
        .clip(session.selected_slot())
        .cloned()
        .ok_or_else(|| "No clip in the selected slot".to_string())?;

    // Recorded ticks follow the tick the recording started on
    let first_tick = driver.events[started].tick + 1;
    let last_tick = first_tick + clip.frame_count() as u64;
    let mut report = DemoReport {
        seed: config.seed,
        level: config.level.clone(),
        profile,
        recorded_frames: clip.frame_count(),
        keyframes: clip.keyframes().len(),
        hero_transitions: driver.events[started..]
            .iter()
            .filter(|e| e.tick >= first_tick && e.tick < last_tick)
            .filter_map(|e| describe_transition(e, CharacterRole::Hero))
            .collect(),
        ..Default::default()
    };

    let ghost_from = driver.events.len();
    driver.command(PlayerCommand::Play);
    driver.step();
    if driver.state() != SessionState::Playback {
        return Err(format!("Playback did not start, session is {:?}", driver.state()));
    }

    let mut finished = None;
    for _ in 0..clip.frame_count() + PLAYBACK_SLACK {
        finished = driver.find(ghost_from, |e| matches!(e, GameEvent::PlaybackFinished { .. }));
        if finished.is_some() {
            break;
        }
        driver.step();
        report.played_ticks += 1;
    }
    let finished = finished.ok_or_else(|| "Ghost never finished playback".to_string())?;

    if let GameEvent::PlaybackFinished {
        soft_pulls,
        hard_snaps,
        max_error,
    } = driver.events[finished].event
    {
        report.soft_pulls = soft_pulls;
        report.hard_snaps = hard_snaps;
        report.max_error = max_error;
    }
    report.ghost_transitions = driver.events[ghost_from..=finished]
        .iter()
        .filter_map(|e| describe_transition(e, CharacterRole::Ghost))
        .collect();
    report.finalize();

    info!("Demo finished: {}", report.summary());
    Ok(report)
}

/// Run the demo from parsed arguments and emit the report
pub fn run_simulation(config: DemoConfig) -> Result<(), String> {
    if !config.quiet {
        println!(
            "Recording {} ticks on {} with clone key {} (seed: {})",
            config.record_ticks, config.level, config.profile_key, config.seed
        );
    }

    let report = run_demo(&config)?;
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| format!("Failed to serialize report: {}", e))?;

    match &config.output_file {
        Some(path) => {
            std::fs::write(path, &json).map_err(|e| format!("Failed to write {}: {}", path, e))?;
            if !config.quiet {
                println!("{}", report.summary());
                println!("Report written to {}", path);
            }
        }
        None => println!("{}", json),
    }
    Ok(())
}

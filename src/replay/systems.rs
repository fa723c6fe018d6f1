//! Fixed-tick replay systems

use bevy::prelude::*;

use super::{DriftCorrection, PlaybackStep, ReplayPlayback, ReplayRecorder};
use crate::events::{EventBus, GameEvent};
use crate::input::GatherInput;
use crate::player::{CharacterRig, Facing, PhysicsControl, PlayerStats, StateMachine};
use crate::session::TerminalSession;

/// Feed recorded frames to every playing ghost. Runs after input latch,
/// before simulation.
pub fn tick_playback(
    mut bus: ResMut<EventBus>,
    mut session: ResMut<TerminalSession>,
    mut ghosts: Query<(
        &mut ReplayPlayback,
        &mut StateMachine,
        &mut GatherInput,
        &mut PhysicsControl,
        &mut Facing,
        &mut PlayerStats,
    )>,
) {
    for (mut playback, mut machine, mut input, mut physics, mut facing, mut stats) in &mut ghosts {
        let mut rig = CharacterRig {
            input: &mut input,
            physics: &mut physics,
            facing: &mut facing,
            stats: &mut stats,
        };
        match playback.fixed_tick(&mut machine, &mut rig) {
            PlaybackStep::Inactive => {}
            PlaybackStep::Applied {
                tick,
                correction,
                error,
            } => {
                if correction != DriftCorrection::None {
                    bus.emit(GameEvent::DriftCorrected {
                        tick,
                        correction,
                        error,
                    });
                }
            }
            PlaybackStep::Finished => {
                let stats = playback.stats();
                bus.emit(GameEvent::PlaybackFinished {
                    soft_pulls: stats.soft_pulls,
                    hard_snaps: stats.hard_snaps,
                    max_error: stats.max_error,
                });
                session.finish_playback();
            }
        }
    }
}

/// Capture the latched input of every recording character
pub fn record_inputs(mut recorders: Query<(&mut ReplayRecorder, &GatherInput, &PhysicsControl)>) {
    for (mut recorder, input, physics) in &mut recorders {
        recorder.record_tick(input, physics);
    }
}

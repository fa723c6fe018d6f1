//! ReplayPlayback - drives a character from a clip with drift correction
//!
//! Idle -> Playing -> Finished. Each fixed tick applies the recorded frame
//! to the character's input and, on keyframe ticks, compares the body with
//! the recorded one:
//! - error <= epsilon: leave it
//! - error < hard snap: pull position and velocity part of the way
//! - otherwise: snap to the keyframe

use std::sync::Arc;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::ReplayClip;
use crate::input::InputMode;
use crate::player::{CharacterRig, PhysicsControl, PlayerState, StateMachine};
use crate::tuning::{DriftTuning, SimulationContract};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriftCorrection {
    None,
    SoftPull,
    HardSnap,
}

/// Result of one playback tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackStep {
    /// Not playing
    Inactive,
    Applied {
        tick: u32,
        correction: DriftCorrection,
        error: f32,
    },
    /// Ran out of frames this tick
    Finished,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackStats {
    pub keyframes_checked: u32,
    pub soft_pulls: u32,
    pub hard_snaps: u32,
    pub max_error: f32,
}

/// Two-tier correction of a body toward a keyframe
pub fn correct_drift(
    physics: &mut PhysicsControl,
    target_position: Vec2,
    target_velocity: Vec2,
    tuning: &DriftTuning,
) -> (DriftCorrection, f32) {
    let error = physics.position.distance(target_position);
    if error <= tuning.position_epsilon {
        return (DriftCorrection::None, error);
    }
    if error >= tuning.hard_snap_threshold {
        physics.position = target_position;
        physics.velocity = target_velocity;
        return (DriftCorrection::HardSnap, error);
    }
    let t = tuning.pull_strength;
    physics.position = physics.position.lerp(target_position, t);
    physics.velocity = physics.velocity.lerp(target_velocity, t);
    (DriftCorrection::SoftPull, error)
}

#[derive(Component, Debug, Default)]
pub struct ReplayPlayback {
    clip: Option<Arc<ReplayClip>>,
    state: PlaybackState,
    tick: u32,
    keyframe_cursor: usize,
    drift: DriftTuning,
    stats: PlaybackStats,
}

impl ReplayPlayback {
    pub fn new(drift: DriftTuning) -> Self {
        Self {
            drift,
            ..Default::default()
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn stats(&self) -> PlaybackStats {
        self.stats
    }

    pub fn clip(&self) -> Option<&Arc<ReplayClip>> {
        self.clip.as_ref()
    }

    /// Put the character exactly in the clip's start state and begin.
    ///
    /// The caller applies the clip's profile first.
    pub fn start_playback(
        &mut self,
        clip: Arc<ReplayClip>,
        machine: &mut StateMachine,
        rig: &mut CharacterRig,
        contract: &SimulationContract,
    ) {
        if !clip.contract.matches(contract) {
            warn!(
                "Clip {} was recorded under {:?}, playing under {:?}; replay may diverge",
                clip.id, clip.contract, contract
            );
        }

        let start = &clip.start;
        rig.physics.position = start.position;
        rig.physics.velocity = start.velocity;
        rig.facing.0 = if start.facing_right { 1.0 } else { -1.0 };
        machine.force_change(start.state);

        // Stale counters from a previous life would change jump counts
        machine.reset_jump_state();

        rig.input.set_mode(InputMode::Replay);
        rig.physics.disarm_coyote();
        rig.physics.enable_gravity();

        info!(
            "Playback started: profile={}, frames={}",
            clip.profile_id(),
            clip.frame_count()
        );
        self.clip = Some(clip);
        self.tick = 0;
        self.keyframe_cursor = 0;
        self.stats = PlaybackStats::default();
        self.state = PlaybackState::Playing;
    }

    /// Feed this tick's frame. Call before the character is simulated.
    pub fn fixed_tick(&mut self, machine: &mut StateMachine, rig: &mut CharacterRig) -> PlaybackStep {
        if self.state != PlaybackState::Playing {
            return PlaybackStep::Inactive;
        }
        let Some(clip) = self.clip.clone() else {
            self.state = PlaybackState::Finished;
            return PlaybackStep::Finished;
        };

        if self.tick as usize >= clip.frame_count() {
            rig.input.clear();
            rig.physics.velocity.x = 0.0;
            machine.force_change(PlayerState::Idle);
            self.state = PlaybackState::Finished;
            info!(
                "Playback finished: soft_pulls={}, hard_snaps={}, max_error={:.3}",
                self.stats.soft_pulls, self.stats.hard_snaps, self.stats.max_error
            );
            return PlaybackStep::Finished;
        }

        let tick = self.tick;
        rig.input.apply_replay_frame(&clip.frame(tick));
        let (correction, error) = self.apply_drift_correction(&clip, tick, rig.physics);
        self.tick += 1;

        PlaybackStep::Applied {
            tick,
            correction,
            error,
        }
    }

    fn apply_drift_correction(
        &mut self,
        clip: &ReplayClip,
        tick: u32,
        physics: &mut PhysicsControl,
    ) -> (DriftCorrection, f32) {
        let keyframes = clip.keyframes();
        if keyframes.is_empty() {
            return (DriftCorrection::None, 0.0);
        }

        // Latest keyframe at or before this tick; ticks only move forward
        while self.keyframe_cursor + 1 < keyframes.len()
            && keyframes[self.keyframe_cursor + 1].tick <= tick
        {
            self.keyframe_cursor += 1;
        }
        let keyframe = keyframes[self.keyframe_cursor];
        if keyframe.tick != tick {
            return (DriftCorrection::None, 0.0);
        }

        let (correction, error) =
            correct_drift(physics, keyframe.position, keyframe.velocity, &self.drift);
        self.stats.keyframes_checked += 1;
        self.stats.max_error = self.stats.max_error.max(error);
        match correction {
            DriftCorrection::SoftPull => self.stats.soft_pulls += 1,
            DriftCorrection::HardSnap => self.stats.hard_snaps += 1,
            DriftCorrection::None => {}
        }
        if correction != DriftCorrection::None {
            debug!("Tick {}: {:?} (error {:.3})", tick, correction, error);
        }
        (correction, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{CharacterParts, Transition};
    use crate::replay::{ReplayRecorder, RecorderEvent, StartSnapshot};
    use crate::tuning::GameplayTuning;
    use crate::world::LevelGeometry;

    fn drift() -> DriftTuning {
        DriftTuning {
            position_epsilon: 0.25,
            hard_snap_threshold: 1.0,
            pull_strength: 0.5,
        }
    }

    #[test]
    fn test_error_at_epsilon_is_not_corrected() {
        let mut physics = PhysicsControl::default();
        let (correction, error) =
            correct_drift(&mut physics, Vec2::new(0.25, 0.0), Vec2::ONE, &drift());
        assert_eq!(correction, DriftCorrection::None);
        assert_eq!(error, 0.25);
        assert_eq!(physics.position, Vec2::ZERO);
        assert_eq!(physics.velocity, Vec2::ZERO);

        let (correction, _) = correct_drift(&mut physics, Vec2::new(0.26, 0.0), Vec2::ONE, &drift());
        assert_eq!(correction, DriftCorrection::SoftPull);
        assert!((physics.position.x - 0.13).abs() < 1e-6);
        assert_eq!(physics.velocity, Vec2::splat(0.5));
    }

    #[test]
    fn test_hard_snap_at_threshold() {
        let mut physics = PhysicsControl::default();
        let (correction, _) = correct_drift(&mut physics, Vec2::new(0.0, 1.0), Vec2::X, &drift());
        assert_eq!(correction, DriftCorrection::HardSnap);
        assert_eq!(physics.position, Vec2::new(0.0, 1.0));
        assert_eq!(physics.velocity, Vec2::X);
    }

    /// Record a scripted run, then replay it on a fresh character
    fn record(
        tuning: &GameplayTuning,
        world: &LevelGeometry,
        script: &[(f32, bool)],
    ) -> (Arc<ReplayClip>, Vec<Transition>) {
        let mut hero = CharacterParts::new(tuning, Vec2::ZERO);
        let mut recorder = ReplayRecorder::default();
        let snapshot = StartSnapshot::capture(&hero.machine, &hero.physics, &hero.facing, "Hero");
        recorder.start_recording(Some((0, "Hero")), snapshot, tuning.contract(), tuning);
        hero.machine.drain_transitions();

        for &(move_x, jump) in script {
            hero.input.set_move_axis(move_x);
            hero.input.set_buttons(jump, false, false);
            hero.input.latch_tick();
            recorder.record_tick(&hero.input, &hero.physics);
            hero.tick(world, tuning);
        }
        recorder.stop_recording(&hero.physics);
        let Some(RecorderEvent::Stopped(clip)) = recorder.drain_events().pop() else {
            panic!("recording did not stop");
        };
        (clip, hero.machine.drain_transitions())
    }

    fn script() -> Vec<(f32, bool)> {
        let mut script = Vec::new();
        script.extend(std::iter::repeat_n((1.0, false), 20));
        script.extend(std::iter::repeat_n((1.0, true), 8));
        script.extend(std::iter::repeat_n((0.0, false), 30));
        script.extend(std::iter::repeat_n((-1.0, false), 15));
        script.extend(std::iter::repeat_n((-1.0, true), 3));
        script.extend(std::iter::repeat_n((0.0, false), 60));
        script
    }

    #[test]
    fn test_replay_reproduces_transitions() {
        let tuning = GameplayTuning::default();
        let world = LevelGeometry::flat(0.0);
        let (clip, recorded) = record(&tuning, &world, &script());
        assert!(!recorded.is_empty());

        let mut ghost = CharacterParts::new(&tuning, Vec2::new(5.0, 0.0));
        let mut playback = ReplayPlayback::new(tuning.drift());
        {
            let (machine, mut rig) = ghost.split();
            playback.start_playback(clip.clone(), machine, &mut rig, &tuning.contract());
        }
        ghost.machine.drain_transitions();
        assert_eq!(ghost.physics.position, clip.start.position);

        let mut finished = false;
        for _ in 0..clip.frame_count() + 1 {
            let (machine, mut rig) = ghost.split();
            match playback.fixed_tick(machine, &mut rig) {
                PlaybackStep::Finished => finished = true,
                PlaybackStep::Applied { .. } => ghost.tick(&world, &tuning),
                PlaybackStep::Inactive => {}
            }
        }
        assert!(finished);
        assert_eq!(playback.state(), PlaybackState::Finished);
        assert_eq!(playback.stats().hard_snaps, 0);

        let replayed: Vec<Transition> = ghost
            .machine
            .drain_transitions()
            .into_iter()
            .filter(|t| !t.forced)
            .collect();
        assert_eq!(replayed, recorded);
    }

    #[test]
    fn test_finish_clears_input_and_forces_idle() {
        let tuning = GameplayTuning::default();
        let world = LevelGeometry::flat(0.0);
        let (clip, _) = record(&tuning, &world, &[(1.0, false); 5]);

        let mut ghost = CharacterParts::new(&tuning, Vec2::ZERO);
        let mut playback = ReplayPlayback::new(tuning.drift());
        let (machine, mut rig) = ghost.split();
        playback.start_playback(clip, machine, &mut rig, &tuning.contract());
        for _ in 0..5 {
            assert!(matches!(
                playback.fixed_tick(machine, &mut rig),
                PlaybackStep::Applied { .. }
            ));
        }
        assert_eq!(rig.input.move_x, 1.0);
        assert_eq!(playback.fixed_tick(machine, &mut rig), PlaybackStep::Finished);
        assert_eq!(rig.input.move_x, 0.0);
        assert_eq!(machine.current(), PlayerState::Idle);
        assert_eq!(playback.fixed_tick(machine, &mut rig), PlaybackStep::Inactive);
    }

    #[test]
    fn test_displaced_ghost_snaps_back_on_first_keyframe() {
        let tuning = GameplayTuning::default();
        let world = LevelGeometry::flat(0.0);
        let (clip, _) = record(&tuning, &world, &[(0.0, false); 12]);

        let mut ghost = CharacterParts::new(&tuning, Vec2::ZERO);
        let mut playback = ReplayPlayback::new(tuning.drift());
        let (machine, mut rig) = ghost.split();
        playback.start_playback(clip.clone(), machine, &mut rig, &tuning.contract());
        rig.physics.position.x += 5.0;

        let step = playback.fixed_tick(machine, &mut rig);
        assert!(matches!(
            step,
            PlaybackStep::Applied {
                tick: 0,
                correction: DriftCorrection::HardSnap,
                ..
            }
        ));
        assert_eq!(rig.physics.position, clip.keyframes()[0].position);
        assert_eq!(playback.stats().hard_snaps, 1);
    }
}

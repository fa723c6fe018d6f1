//! ReplayRecorder - taps one character's input every fixed tick

use std::sync::Arc;

use bevy::prelude::*;

use super::{ReplayClip, StartSnapshot};
use crate::input::GatherInput;
use crate::player::PhysicsControl;
use crate::tuning::{GameplayTuning, SimulationContract};

#[derive(Debug, Clone)]
pub enum RecorderEvent {
    /// Recording ended (hotkey, death, or max length). The clip is frozen.
    Stopped(Arc<ReplayClip>),
}

#[derive(Component, Debug, Default)]
pub struct ReplayRecorder {
    clip: Option<ReplayClip>,
    recording: bool,
    tick: u32,
    max_ticks: u32,
    keyframe_every: u32,
    events: Vec<RecorderEvent>,
}

impl ReplayRecorder {
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Ticks captured so far in the current recording
    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn max_ticks(&self) -> u32 {
        self.max_ticks
    }

    pub fn current_clip(&self) -> Option<&ReplayClip> {
        self.clip.as_ref()
    }

    /// Begin a new clip from the given start state.
    ///
    /// `profile` is the active (index, id); recording refuses to start
    /// without one.
    pub fn start_recording(
        &mut self,
        profile: Option<(usize, &str)>,
        snapshot: StartSnapshot,
        contract: SimulationContract,
        tuning: &GameplayTuning,
    ) -> bool {
        let Some((profile_index, profile_id)) = profile else {
            error!("No active profile, cannot start recording");
            return false;
        };
        if self.recording {
            warn!("Recording already in progress, restarting it");
        }

        let start = StartSnapshot {
            profile_id: profile_id.to_string(),
            ..snapshot
        };
        self.clip = Some(ReplayClip::new(profile_index, start, contract));
        self.tick = 0;
        self.max_ticks = tuning.max_recording_ticks();
        self.keyframe_every = tuning.keyframe_every_ticks;
        self.recording = true;

        info!(
            "Recording started: profile={}, max_ticks={}",
            profile_id, self.max_ticks
        );
        true
    }

    /// Capture this tick's frame. Call after input is latched and before
    /// the character is simulated.
    pub fn record_tick(&mut self, input: &GatherInput, physics: &PhysicsControl) {
        if !self.recording {
            return;
        }
        if self.tick >= self.max_ticks {
            info!("Recording reached {} ticks, stopping", self.max_ticks);
            self.stop_recording(physics);
            return;
        }
        let Some(clip) = self.clip.as_mut() else {
            return;
        };

        let frame = input.capture_frame(self.tick);
        if let Err(e) = clip.push_frame(frame) {
            error!("Dropping recorded frame: {}", e);
        }
        if self.keyframe_every > 0 && self.tick % self.keyframe_every == 0 {
            if let Err(e) = clip.add_keyframe(self.tick, physics.position, physics.velocity) {
                error!("Dropping keyframe: {}", e);
            }
        }
        self.tick += 1;
    }

    /// Append the closing keyframe and publish the clip.
    ///
    /// Returns false when nothing was recording.
    pub fn stop_recording(&mut self, physics: &PhysicsControl) -> bool {
        if !self.recording {
            return false;
        }
        self.recording = false;
        let Some(mut clip) = self.clip.take() else {
            return false;
        };

        if let Err(e) = clip.add_keyframe(self.tick, physics.position, physics.velocity) {
            warn!("Closing keyframe rejected: {}", e);
        }
        info!(
            "Recording stopped: frames={}, keyframes={}",
            clip.frame_count(),
            clip.keyframes().len()
        );
        self.events.push(RecorderEvent::Stopped(Arc::new(clip)));
        true
    }

    pub fn drain_events(&mut self) -> Vec<RecorderEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerState;

    fn snapshot() -> StartSnapshot {
        StartSnapshot {
            position: Vec2::new(1.0, 2.0),
            velocity: Vec2::ZERO,
            facing_right: false,
            state: PlayerState::Idle,
            profile_id: String::new(),
        }
    }

    fn stopped_clip(recorder: &mut ReplayRecorder) -> Arc<ReplayClip> {
        match recorder.drain_events().pop() {
            Some(RecorderEvent::Stopped(clip)) => clip,
            None => panic!("no stop event"),
        }
    }

    #[test]
    fn test_requires_profile() {
        let mut recorder = ReplayRecorder::default();
        let tuning = GameplayTuning::default();
        assert!(!recorder.start_recording(None, snapshot(), tuning.contract(), &tuning));
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_frame_ticks_match_indices() {
        let mut recorder = ReplayRecorder::default();
        let tuning = GameplayTuning::default();
        let mut input = GatherInput::default();
        let physics = PhysicsControl::default();
        recorder.start_recording(Some((1, "Leaper")), snapshot(), tuning.contract(), &tuning);

        for i in 0..25 {
            input.set_move_axis(if i % 2 == 0 { 1.0 } else { -1.0 });
            input.latch_tick();
            recorder.record_tick(&input, &physics);
        }
        assert!(recorder.stop_recording(&physics));
        assert!(!recorder.stop_recording(&physics));

        let clip = stopped_clip(&mut recorder);
        assert_eq!(clip.frame_count(), 25);
        for (i, frame) in clip.frames().iter().enumerate() {
            assert_eq!(frame.tick, i as u32);
        }
        assert_eq!(clip.profile_id(), "Leaper");
        assert_eq!(clip.profile_index, 1);
        assert!(!clip.start.facing_right);

        // Every 10 ticks plus the closing one
        let ticks: Vec<u32> = clip.keyframes().iter().map(|k| k.tick).collect();
        assert_eq!(ticks, vec![0, 10, 20, 25]);
    }

    #[test]
    fn test_auto_stop_at_max_ticks() {
        let tuning = GameplayTuning {
            max_recording_seconds: 0.2,
            ..GameplayTuning::default()
        };
        assert_eq!(tuning.max_recording_ticks(), 10);

        let mut recorder = ReplayRecorder::default();
        let input = GatherInput::default();
        let physics = PhysicsControl::default();
        recorder.start_recording(Some((0, "Hero")), snapshot(), tuning.contract(), &tuning);
        for _ in 0..15 {
            recorder.record_tick(&input, &physics);
        }
        assert!(!recorder.is_recording());
        let clip = stopped_clip(&mut recorder);
        assert_eq!(clip.frame_count(), 10);
        assert_eq!(clip.keyframes().last().map(|k| k.tick), Some(10));
    }
}

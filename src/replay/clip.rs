//! Replay clip - recorded input frames plus drift keyframes

use bevy::prelude::*;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::input::InputFrame;
use crate::player::{Facing, PhysicsControl, PlayerState, StateMachine};
use crate::tuning::SimulationContract;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipError {
    #[error("Frame tick {got} does not follow frame count {expected}")]
    FrameOutOfOrder { expected: u32, got: u32 },

    #[error("Keyframe tick {got} is not after previous keyframe {previous}")]
    KeyframeOutOfOrder { previous: u32, got: u32 },
}

/// Body state sampled on a tick, used to pull a replay back on course
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub tick: u32,
    pub position: Vec2,
    pub velocity: Vec2,
}

/// Character state when recording began
#[derive(Debug, Clone, PartialEq)]
pub struct StartSnapshot {
    pub position: Vec2,
    pub velocity: Vec2,
    pub facing_right: bool,
    pub state: PlayerState,
    pub profile_id: String,
}

impl StartSnapshot {
    pub fn capture(
        machine: &StateMachine,
        physics: &PhysicsControl,
        facing: &Facing,
        profile_id: &str,
    ) -> Self {
        Self {
            position: physics.position,
            velocity: physics.velocity,
            facing_right: facing.is_right(),
            state: machine.current(),
            profile_id: profile_id.to_string(),
        }
    }
}

/// A recorded run. Frames are indexed by tick with no gaps.
#[derive(Debug, Clone)]
pub struct ReplayClip {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub profile_index: usize,
    pub start: StartSnapshot,
    pub contract: SimulationContract,
    frames: Vec<InputFrame>,
    keyframes: Vec<Keyframe>,
}

impl ReplayClip {
    pub fn new(profile_index: usize, start: StartSnapshot, contract: SimulationContract) -> Self {
        Self {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            profile_index,
            start,
            contract,
            frames: Vec::new(),
            keyframes: Vec::new(),
        }
    }

    pub fn profile_id(&self) -> &str {
        &self.start.profile_id
    }

    /// Append the next frame; its tick must equal the current frame count
    pub fn push_frame(&mut self, frame: InputFrame) -> Result<(), ClipError> {
        let expected = self.frames.len() as u32;
        if frame.tick != expected {
            return Err(ClipError::FrameOutOfOrder {
                expected,
                got: frame.tick,
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn add_keyframe(&mut self, tick: u32, position: Vec2, velocity: Vec2) -> Result<(), ClipError> {
        if let Some(last) = self.keyframes.last() {
            if tick <= last.tick {
                return Err(ClipError::KeyframeOutOfOrder {
                    previous: last.tick,
                    got: tick,
                });
            }
        }
        self.keyframes.push(Keyframe {
            tick,
            position,
            velocity,
        });
        Ok(())
    }

    /// Frame at `tick`, or a neutral frame past either end
    pub fn frame(&self, tick: u32) -> InputFrame {
        self.frames
            .get(tick as usize)
            .copied()
            .unwrap_or_else(|| InputFrame::empty(tick))
    }

    pub fn frames(&self) -> &[InputFrame] {
        &self.frames
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn duration_secs(&self) -> f32 {
        self.frames.len() as f32 * self.contract.fixed_dt
    }
}

//! Ghost replay - record a character's input, play it back on another body
//!
//! The recorder taps [`GatherInput`](crate::input::GatherInput) once per fixed
//! tick; playback feeds recorded frames back in and pulls the body toward
//! periodic keyframes to absorb small simulation differences.

mod clip;
mod playback;
mod recorder;
mod systems;

pub use clip::{ClipError, Keyframe, ReplayClip, StartSnapshot};
pub use playback::{
    DriftCorrection, PlaybackState, PlaybackStats, PlaybackStep, ReplayPlayback, correct_drift,
};
pub use recorder::{RecorderEvent, ReplayRecorder};
pub use systems::{record_inputs, tick_playback};

//! Event type definitions for the gameplay bus

use serde::{Deserialize, Serialize};

use crate::player::PlayerState;
use crate::replay::DriftCorrection;
use crate::session::SessionState;

/// Which character an event is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharacterRole {
    Hero,
    Ghost,
}

impl std::fmt::Display for CharacterRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CharacterRole::Hero => write!(f, "Hero"),
            CharacterRole::Ghost => write!(f, "Ghost"),
        }
    }
}

/// All gameplay events that flow through the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    // === Character Events ===
    /// Ability state machine moved
    StateChanged {
        role: CharacterRole,
        from: PlayerState,
        to: PlayerState,
        forced: bool,
    },
    /// A profile was applied to a character
    ProfileSwitched {
        role: CharacterRole,
        profile_id: String,
    },
    /// Character took damage
    PlayerDamaged { role: CharacterRole, health: i32 },

    // === Replay Events ===
    RecordingStarted { profile_id: String },
    RecordingStopped { frames: usize, keyframes: usize },
    PlaybackStarted { frames: usize },
    PlaybackFinished {
        soft_pulls: u32,
        hard_snaps: u32,
        max_error: f32,
    },
    /// Ghost position corrected on a keyframe tick
    DriftCorrected {
        tick: u32,
        correction: DriftCorrection,
        error: f32,
    },

    // === Session Events ===
    SessionStateChanged { from: SessionState, to: SessionState },
    SlotsChanged,
    Notice { message: String },

    // === World Events ===
    LevelLoaded { scene: String, spawn: String },
    PlateChanged { plate: usize, pressed: bool },
}

impl GameEvent {
    /// Short name used by scenario expectations and log lines
    pub fn kind(&self) -> &'static str {
        match self {
            GameEvent::StateChanged { .. } => "StateChanged",
            GameEvent::ProfileSwitched { .. } => "ProfileSwitched",
            GameEvent::PlayerDamaged { .. } => "PlayerDamaged",
            GameEvent::RecordingStarted { .. } => "RecordingStarted",
            GameEvent::RecordingStopped { .. } => "RecordingStopped",
            GameEvent::PlaybackStarted { .. } => "PlaybackStarted",
            GameEvent::PlaybackFinished { .. } => "PlaybackFinished",
            GameEvent::DriftCorrected { .. } => "DriftCorrected",
            GameEvent::SessionStateChanged { .. } => "SessionStateChanged",
            GameEvent::SlotsChanged => "SlotsChanged",
            GameEvent::Notice { .. } => "Notice",
            GameEvent::LevelLoaded { .. } => "LevelLoaded",
            GameEvent::PlateChanged { .. } => "PlateChanged",
        }
    }

    /// Primary value of the event as text, for scenario matching
    pub fn value(&self) -> String {
        match self {
            GameEvent::StateChanged { role, to, .. } => format!("{role}:{to}"),
            GameEvent::ProfileSwitched { role, profile_id } => format!("{role}:{profile_id}"),
            GameEvent::PlayerDamaged { role, health } => format!("{role}:{health}"),
            GameEvent::RecordingStarted { profile_id } => profile_id.clone(),
            GameEvent::RecordingStopped { frames, .. } => frames.to_string(),
            GameEvent::PlaybackStarted { frames } => frames.to_string(),
            GameEvent::PlaybackFinished { hard_snaps, .. } => hard_snaps.to_string(),
            GameEvent::DriftCorrected { correction, .. } => format!("{correction:?}"),
            GameEvent::SessionStateChanged { to, .. } => format!("{to:?}"),
            GameEvent::SlotsChanged => String::new(),
            GameEvent::Notice { message } => message.clone(),
            GameEvent::LevelLoaded { scene, .. } => scene.clone(),
            GameEvent::PlateChanged { plate, pressed } => format!("{plate}:{pressed}"),
        }
    }
}

//! Ghostline - a 2D platformer core where you record a clone's run at a
//! terminal and replay it as a ghost
//!
//! This crate provides all game components, resources, and systems organized into modules.

// Core modules
pub mod constants;
pub mod countdown;
pub mod events;
pub mod plugin;
pub mod simulation;
pub mod testing;
pub mod tuning;

// Game logic modules
pub mod clones;
pub mod input;
pub mod levels;
pub mod player;
pub mod profiles;
pub mod replay;
pub mod session;
pub mod world;

// Re-export commonly used types for convenience
pub use clones::{BodyInstance, CloneSwitcher, SwitchError};
pub use constants::*;
pub use countdown::Countdown;
pub use events::{BusEvent, CharacterRole, EventBus, GameEvent};
pub use input::{GatherInput, InputFrame, InputMode, PlayerCommand, PlayerCommands};
pub use levels::{LevelData, LevelDatabase, LevelManager};
pub use player::{
    CharacterParts, Facing, Ghost, HumanControlled, PhysicsControl, Player, PlayerState,
    PlayerStats, StateMachine,
};
pub use plugin::GhostlinePlugin;
pub use profiles::{CharacterProfile, PROFILES_FILE, ProfileDatabase};
pub use replay::{ReplayClip, ReplayPlayback, ReplayRecorder};
pub use session::{JsonSaveStore, SessionState, TerminalKiosk, TerminalSession};
pub use tuning::{GAMEPLAY_TUNING_FILE, GameplayTuning};
pub use world::{Aabb, CollisionWorld, LevelGeometry, SpawnPoint};

//! Player-related components

use bevy::prelude::*;

use super::PlayerState;

/// Marker for every simulated character (hero and ghosts)
#[derive(Component)]
pub struct Player;

/// Marker for the character driven by the local device
#[derive(Component)]
pub struct HumanControlled;

/// Marker for characters driven by a replay clip
#[derive(Component)]
pub struct Ghost;

/// Despawned whenever the level reloads
#[derive(Component)]
pub struct LevelScoped;

/// Direction the character faces (-1.0 = left, 1.0 = right)
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Facing(pub f32);

impl Default for Facing {
    fn default() -> Self {
        Self(1.0) // Default facing right
    }
}

impl Facing {
    pub fn from_right(facing_right: bool) -> Self {
        Self(if facing_right { 1.0 } else { -1.0 })
    }

    pub fn is_right(&self) -> bool {
        self.0 >= 0.0
    }
}

/// Whether the death pose may end in a level restart
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RestartPolicy {
    #[default]
    Allowed,
    /// Ghosts never restart the level
    Forbidden,
}

/// Values the animation layer reads every frame
#[derive(Component, Debug, Clone, Default)]
pub struct AnimatorParams {
    flags: [bool; PlayerState::COUNT],
    pub speed_x: f32,
    pub velocity_y: f32,
    pub grounded: bool,
    pub flashing: bool,
}

impl AnimatorParams {
    pub fn set_flag(&mut self, state: PlayerState, on: bool) {
        self.flags[state.index()] = on;
    }

    pub fn flag(&self, state: PlayerState) -> bool {
        self.flags[state.index()]
    }
}

//! Player ability states

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One state per ability. `Ignore` is a reserved marker that is never bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerState {
    #[default]
    Idle,
    Walk,
    Jump,
    Dash,
    WallSlide,
    KnockBack,
    Death,
    Ignore,
}

impl PlayerState {
    pub const COUNT: usize = 8;

    pub const ALL: [PlayerState; Self::COUNT] = [
        PlayerState::Idle,
        PlayerState::Walk,
        PlayerState::Jump,
        PlayerState::Dash,
        PlayerState::WallSlide,
        PlayerState::KnockBack,
        PlayerState::Death,
        PlayerState::Ignore,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            PlayerState::Idle => "Idle",
            PlayerState::Walk => "Walk",
            PlayerState::Jump => "Jump",
            PlayerState::Dash => "Dash",
            PlayerState::WallSlide => "WallSlide",
            PlayerState::KnockBack => "KnockBack",
            PlayerState::Death => "Death",
            PlayerState::Ignore => "Ignore",
        }
    }

    /// States the player steers with the move axis (facing follows input)
    pub fn follows_input(self) -> bool {
        matches!(
            self,
            PlayerState::Idle | PlayerState::Walk | PlayerState::Jump | PlayerState::WallSlide
        )
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlayerState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlayerState::ALL
            .iter()
            .copied()
            .find(|state| state.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown player state '{}'", s))
    }
}

//! Player module - ability state machine, physics and the per-tick driver

mod abilities;
mod character;
mod components;
mod machine;
mod physics;
mod states;
mod stats;
mod systems;

pub use abilities::{
    Ability, AbilityKind, DashAbility, DeathAbility, JumpAbility, KnockBackAbility, MoveAbility,
    WallSlideAbility,
};
pub use character::{CharacterParts, CharacterRig, simulate_tick};
pub use components::*;
pub use machine::{StateMachine, Transition};
pub use physics::*;
pub use states::PlayerState;
pub use stats::PlayerStats;
pub use systems::*;

//! Abilities - one behavior per player state
//!
//! Hooks never change state themselves. `process`/`process_fixed` return the
//! state they want next and the state machine applies it after the hook
//! returns, so a transition is never observed half-done.

mod dash;
mod death;
mod ground;
mod jump;
mod knockback;

pub use dash::DashAbility;
pub use death::DeathAbility;
pub use ground::{MoveAbility, WallSlideAbility};
pub use jump::JumpAbility;
pub use knockback::KnockBackAbility;

use super::{AnimatorParams, CharacterRig, PhysicsControl, PlayerState};

/// Behavior data for each ability
#[derive(Debug, Clone)]
pub enum AbilityKind {
    Idle,
    Move(MoveAbility),
    MultiJump(JumpAbility),
    WallSlide(WallSlideAbility),
    Dash(DashAbility),
    KnockBack(KnockBackAbility),
    Death(DeathAbility),
}

/// An ability bound to its state, with a per-profile permission flag
#[derive(Debug, Clone)]
pub struct Ability {
    state: PlayerState,
    pub permitted: bool,
    pub kind: AbilityKind,
}

impl Ability {
    pub fn new(state: PlayerState, kind: AbilityKind) -> Self {
        Self {
            state,
            permitted: true,
            kind,
        }
    }

    pub fn idle() -> Self {
        Self::new(PlayerState::Idle, AbilityKind::Idle)
    }

    pub fn walk(ability: MoveAbility) -> Self {
        Self::new(PlayerState::Walk, AbilityKind::Move(ability))
    }

    pub fn jump(ability: JumpAbility) -> Self {
        Self::new(PlayerState::Jump, AbilityKind::MultiJump(ability))
    }

    pub fn wall_slide(ability: WallSlideAbility) -> Self {
        Self::new(PlayerState::WallSlide, AbilityKind::WallSlide(ability))
    }

    pub fn dash(ability: DashAbility) -> Self {
        Self::new(PlayerState::Dash, AbilityKind::Dash(ability))
    }

    pub fn knockback(ability: KnockBackAbility) -> Self {
        Self::new(PlayerState::KnockBack, AbilityKind::KnockBack(ability))
    }

    pub fn death(ability: DeathAbility) -> Self {
        Self::new(PlayerState::Death, AbilityKind::Death(ability))
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn enter(&mut self, rig: &mut CharacterRig) {
        match &mut self.kind {
            AbilityKind::Idle => rig.physics.velocity.x = 0.0,
            AbilityKind::Move(_) => {}
            AbilityKind::MultiJump(_) => {}
            AbilityKind::WallSlide(_) => {}
            AbilityKind::Dash(_) => {}
            AbilityKind::KnockBack(_) => {}
            AbilityKind::Death(death) => death.enter(rig),
        }
    }

    pub fn exit(&mut self, rig: &mut CharacterRig) {
        match &mut self.kind {
            AbilityKind::MultiJump(jump) => jump.exit(rig),
            AbilityKind::Dash(dash) => dash.exit(rig),
            AbilityKind::KnockBack(knockback) => knockback.exit(),
            _ => {}
        }
    }

    /// Per-tick logic that decides transitions
    pub fn process(&mut self, rig: &mut CharacterRig, dt: f32) -> Option<PlayerState> {
        match &mut self.kind {
            AbilityKind::Idle => {
                if !rig.physics.grounded {
                    Some(PlayerState::Jump)
                } else if rig.input.move_x != 0.0 {
                    Some(PlayerState::Walk)
                } else {
                    None
                }
            }
            AbilityKind::Move(walk) => walk.process(rig),
            AbilityKind::MultiJump(jump) => jump.process(rig, dt),
            AbilityKind::WallSlide(slide) => slide.process(rig),
            AbilityKind::Dash(dash) => dash.process(rig, dt),
            AbilityKind::KnockBack(knockback) => knockback.process(rig, dt),
            AbilityKind::Death(death) => {
                death.process(dt);
                None
            }
        }
    }

    /// Per-tick velocity work
    pub fn process_fixed(&mut self, rig: &mut CharacterRig) -> Option<PlayerState> {
        match &mut self.kind {
            AbilityKind::Move(walk) => walk.process_fixed(rig),
            AbilityKind::MultiJump(jump) => jump.process_fixed(rig),
            AbilityKind::WallSlide(slide) => slide.process_fixed(rig),
            AbilityKind::Dash(dash) => dash.process_fixed(rig),
            AbilityKind::Death(_) => rig.physics.velocity.x = 0.0,
            AbilityKind::Idle | AbilityKind::KnockBack(_) => {}
        }
        None
    }

    /// Every ability publishes its own flag, whether or not it is current
    pub fn update_animator(
        &self,
        current: PlayerState,
        animator: &mut AnimatorParams,
        physics: &PhysicsControl,
    ) {
        let active = current == self.state;
        animator.set_flag(self.state, active);
        match &self.kind {
            AbilityKind::Move(_) if active => animator.speed_x = physics.velocity.x.abs(),
            AbilityKind::MultiJump(_) if active => animator.velocity_y = physics.velocity.y,
            _ => {}
        }
    }

    /// Drop timers and counters without running hooks
    pub fn reset_internal(&mut self) {
        match &mut self.kind {
            AbilityKind::MultiJump(jump) => jump.reset_jump_state(),
            AbilityKind::Dash(dash) => dash.reset(),
            AbilityKind::KnockBack(knockback) => knockback.exit(),
            AbilityKind::Death(death) => death.reset(),
            _ => {}
        }
    }
}

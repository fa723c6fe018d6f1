//! Dash - fixed-duration horizontal burst with gravity off

use crate::constants::{DASH_DURATION, DASH_FORCE};
use crate::countdown::Countdown;
use crate::player::{CharacterRig, PlayerState};

#[derive(Debug, Clone)]
pub struct DashAbility {
    pub dash_force: f32,
    pub dash_duration: f32,
    timer: Countdown,
}

impl Default for DashAbility {
    fn default() -> Self {
        Self {
            dash_force: DASH_FORCE,
            dash_duration: DASH_DURATION,
            timer: Countdown::default(),
        }
    }
}

impl DashAbility {
    /// Launch in the facing direction. The caller has switched into the dash state.
    pub fn begin(&mut self, rig: &mut CharacterRig) {
        rig.physics.disable_gravity();
        rig.physics.reset_velocity();
        rig.physics.velocity.x = rig.facing.0.signum() * self.dash_force;
        self.timer.start(self.dash_duration);
    }

    pub fn process(&mut self, rig: &mut CharacterRig, dt: f32) -> Option<PlayerState> {
        self.timer.tick(dt);
        if rig.physics.touching_wall {
            self.timer.cancel();
        }
        if self.timer.is_active() {
            return None;
        }
        Some(if rig.physics.grounded {
            PlayerState::Idle
        } else {
            PlayerState::Jump
        })
    }

    pub fn process_fixed(&mut self, rig: &mut CharacterRig) {
        rig.physics.velocity.y = 0.0;
    }

    pub fn exit(&mut self, rig: &mut CharacterRig) {
        rig.physics.enable_gravity();
        rig.physics.reset_velocity();
        self.timer.cancel();
    }

    pub fn reset(&mut self) {
        self.timer.cancel();
    }

    pub fn is_dashing(&self) -> bool {
        self.timer.is_active()
    }
}

//! Multiple jump - ground/coyote jump, air jumps, variable hold height

use bevy::prelude::*;

use crate::constants::*;
use crate::player::{CharacterRig, PlayerState};

#[derive(Debug, Clone)]
pub struct JumpAbility {
    pub jump_force: f32,
    pub max_jumps: u32,
    pub air_speed: f32,
    pub gravity_divider: f32,
    pub min_air_time: f32,
    pub jump_hold_time: f32,
    pub max_fall_speed: f32,

    remaining_jumps: u32,
    can_activate_additional_jumps: bool,
    is_jumping: bool,
    jump_timer: f32,
    min_air_timer: f32,
}

impl Default for JumpAbility {
    fn default() -> Self {
        let mut jump = Self {
            jump_force: JUMP_FORCE,
            max_jumps: MAX_JUMPS,
            air_speed: AIR_SPEED,
            gravity_divider: GRAVITY_DIVIDER,
            min_air_time: MIN_AIR_TIME,
            jump_hold_time: JUMP_HOLD_TIME,
            max_fall_speed: MAX_FALL_SPEED,
            remaining_jumps: 0,
            can_activate_additional_jumps: false,
            is_jumping: false,
            jump_timer: 0.0,
            min_air_timer: 0.0,
        };
        jump.reset_jump_state();
        jump
    }
}

impl JumpAbility {
    /// Profile values at defaults, timings from tuning
    pub fn with_timings(min_air_time: f32, jump_hold_time: f32, max_fall_speed: f32) -> Self {
        let mut jump = Self {
            min_air_time,
            jump_hold_time,
            max_fall_speed,
            ..Self::default()
        };
        jump.reset_jump_state();
        jump
    }

    pub fn remaining_jumps(&self) -> u32 {
        self.remaining_jumps
    }

    pub fn can_activate_additional_jumps(&self) -> bool {
        self.can_activate_additional_jumps
    }

    pub fn is_jumping(&self) -> bool {
        self.is_jumping
    }

    /// Jump off the ground (or inside the coyote window, or off a wall).
    /// The caller has already switched into the jump state.
    pub fn start_ground_jump(&mut self, rig: &mut CharacterRig, wall_kick: bool) {
        let vx = if wall_kick {
            // Kick away from the wall we were facing
            rig.facing.0 = -rig.facing.0;
            rig.facing.0 * self.air_speed
        } else {
            rig.input.move_x * self.air_speed
        };
        self.remaining_jumps = self.max_jumps;
        self.launch(rig, vx);
    }

    /// Spend one air jump. A refused attempt closes the air-jump window.
    pub fn try_air_jump(&mut self, rig: &mut CharacterRig) -> bool {
        if self.remaining_jumps > 0 && self.can_activate_additional_jumps {
            rig.physics.enable_gravity();
            let vx = rig.input.move_x * self.air_speed;
            self.launch(rig, vx);
            true
        } else {
            self.can_activate_additional_jumps = false;
            false
        }
    }

    /// Shared by ground and air jumps: restart the hold window and the
    /// minimum air time, consume coyote, spend one jump
    fn launch(&mut self, rig: &mut CharacterRig, vx: f32) {
        rig.physics.velocity = Vec2::new(vx, self.jump_force);
        rig.physics.disarm_coyote();
        self.min_air_timer = self.min_air_time;
        self.is_jumping = true;
        self.jump_timer = self.jump_hold_time;
        self.can_activate_additional_jumps = true;
        self.remaining_jumps = self.remaining_jumps.saturating_sub(1);
    }

    /// Jump released: stop sustaining upward force
    pub fn stop_jump(&mut self) {
        self.is_jumping = false;
    }

    pub fn process(&mut self, rig: &mut CharacterRig, dt: f32) -> Option<PlayerState> {
        self.min_air_timer -= dt;
        if self.is_jumping {
            self.jump_timer -= dt;
            if self.jump_timer <= 0.0 {
                self.is_jumping = false;
            }
        }

        if rig.physics.grounded && self.min_air_timer <= 0.0 {
            self.remaining_jumps = self.max_jumps;
            return Some(if rig.input.move_x != 0.0 {
                PlayerState::Walk
            } else {
                PlayerState::Idle
            });
        }
        if !rig.physics.grounded && rig.physics.touching_wall && rig.physics.velocity.y < 0.0 {
            return Some(PlayerState::WallSlide);
        }
        None
    }

    pub fn process_fixed(&mut self, rig: &mut CharacterRig) {
        if rig.physics.grounded {
            return;
        }
        rig.physics.velocity.x = rig.input.move_x * self.air_speed;
        if self.is_jumping {
            rig.physics.velocity.y = self.jump_force;
        } else {
            rig.physics.velocity.y = rig
                .physics
                .velocity
                .y
                .clamp(-self.max_fall_speed, self.jump_force);
        }
        if rig.physics.velocity.y < 0.0 {
            rig.physics.gravity_scale = rig.physics.base_gravity() / self.gravity_divider;
        }
    }

    pub fn exit(&mut self, rig: &mut CharacterRig) {
        rig.physics.enable_gravity();
        self.can_activate_additional_jumps = false;
    }

    /// Full reset (spawn, playback start)
    pub fn reset_jump_state(&mut self) {
        self.remaining_jumps = self.max_jumps;
        self.can_activate_additional_jumps = false;
        self.is_jumping = false;
        self.jump_timer = 0.0;
        self.min_air_timer = self.min_air_time;
    }

    /// Reset on a clone switch: timers and counters start over like
    /// `reset_jump_state`, but an open air-jump window stays open so the
    /// new clone can still jump mid-air
    pub fn reset_for_switch(&mut self) {
        let window = self.can_activate_additional_jumps;
        self.reset_jump_state();
        self.can_activate_additional_jumps = window;
    }

    pub fn hold_time_left(&self) -> f32 {
        if self.is_jumping { self.jump_timer } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::GatherInput;
    use crate::player::{Facing, PhysicsControl, PlayerStats};

    struct Body {
        input: GatherInput,
        physics: PhysicsControl,
        facing: Facing,
        stats: PlayerStats,
    }

    impl Body {
        fn new() -> Self {
            Self {
                input: GatherInput::default(),
                physics: PhysicsControl::new(Vec2::ZERO, COYOTE_TIME),
                facing: Facing::default(),
                stats: PlayerStats::new(MAX_HEALTH, DAMAGE_FLASH_TIME),
            }
        }

        fn rig(&mut self) -> CharacterRig<'_> {
            CharacterRig {
                input: &mut self.input,
                physics: &mut self.physics,
                facing: &mut self.facing,
                stats: &mut self.stats,
            }
        }
    }

    #[test]
    fn test_with_timings_sets_tuning_values() {
        let jump = JumpAbility::with_timings(0.3, 0.5, 7.0);
        assert_eq!(jump.min_air_time, 0.3);
        assert_eq!(jump.jump_hold_time, 0.5);
        assert_eq!(jump.max_fall_speed, 7.0);
        assert_eq!(jump.jump_force, JUMP_FORCE);
        assert_eq!(jump.remaining_jumps(), MAX_JUMPS);
    }

    #[test]
    fn test_air_jump_restarts_hold_window() {
        let mut body = Body::new();
        let mut jump = JumpAbility::default();
        jump.start_ground_jump(&mut body.rig(), false);
        jump.stop_jump();
        jump.process(&mut body.rig(), 0.15);
        assert!(!jump.is_jumping());

        body.physics.coyote_timer = 0.05;
        assert!(jump.try_air_jump(&mut body.rig()));
        assert!(jump.is_jumping());
        assert_eq!(jump.hold_time_left(), jump.jump_hold_time);
        assert!(body.physics.coyote_timer < 0.0);
        assert_eq!(jump.remaining_jumps(), 0);

        // Early release cuts the air jump short
        jump.stop_jump();
        assert_eq!(jump.hold_time_left(), 0.0);
    }

    #[test]
    fn test_air_jump_holds_min_air_time() {
        let mut body = Body::new();
        let mut jump = JumpAbility::default();
        jump.start_ground_jump(&mut body.rig(), false);
        jump.process(&mut body.rig(), 0.2);

        assert!(jump.try_air_jump(&mut body.rig()));
        body.physics.grounded = true;
        // Ground seen right after the air jump does not land it
        assert_eq!(jump.process(&mut body.rig(), FIXED_DT), None);
    }

    #[test]
    fn test_reset_for_switch_clears_timers_keeps_window() {
        let mut body = Body::new();
        let mut jump = JumpAbility::default();
        jump.start_ground_jump(&mut body.rig(), false);
        assert!(jump.is_jumping());

        jump.max_jumps = 3;
        jump.reset_for_switch();
        assert!(!jump.is_jumping());
        assert_eq!(jump.hold_time_left(), 0.0);
        assert_eq!(jump.remaining_jumps(), 3);
        assert!(jump.can_activate_additional_jumps());
    }
}

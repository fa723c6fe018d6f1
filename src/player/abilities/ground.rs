//! Walking and wall sliding

use crate::constants::{WALK_SPEED, WALL_SLIDE_SPEED};
use crate::player::{CharacterRig, PlayerState};

#[derive(Debug, Clone)]
pub struct MoveAbility {
    pub walk_speed: f32,
}

impl Default for MoveAbility {
    fn default() -> Self {
        Self {
            walk_speed: WALK_SPEED,
        }
    }
}

impl MoveAbility {
    pub fn process(&mut self, rig: &mut CharacterRig) -> Option<PlayerState> {
        if !rig.physics.grounded {
            Some(PlayerState::Jump)
        } else if rig.input.move_x == 0.0 {
            Some(PlayerState::Idle)
        } else {
            None
        }
    }

    pub fn process_fixed(&mut self, rig: &mut CharacterRig) {
        rig.physics.velocity.x = rig.input.move_x * self.walk_speed;
    }
}

/// Slow fall while pressed against a wall
#[derive(Debug, Clone)]
pub struct WallSlideAbility {
    pub slide_speed: f32,
}

impl Default for WallSlideAbility {
    fn default() -> Self {
        Self {
            slide_speed: WALL_SLIDE_SPEED,
        }
    }
}

impl WallSlideAbility {
    pub fn process(&mut self, rig: &mut CharacterRig) -> Option<PlayerState> {
        if rig.physics.grounded {
            Some(if rig.input.move_x != 0.0 {
                PlayerState::Walk
            } else {
                PlayerState::Idle
            })
        } else if !rig.physics.touching_wall {
            Some(PlayerState::Jump)
        } else {
            None
        }
    }

    pub fn process_fixed(&mut self, rig: &mut CharacterRig) {
        rig.physics.velocity.y = rig.physics.velocity.y.max(-self.slide_speed);
    }
}

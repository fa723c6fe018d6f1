//! Knockback after a hit

use bevy::prelude::*;

use crate::constants::KNOCKBACK_DURATION;
use crate::countdown::Countdown;
use crate::player::{CharacterRig, PlayerState};

#[derive(Debug, Clone)]
pub struct KnockBackAbility {
    pub duration: f32,
    timer: Countdown,
}

impl Default for KnockBackAbility {
    fn default() -> Self {
        Self {
            duration: KNOCKBACK_DURATION,
            timer: Countdown::default(),
        }
    }
}

impl KnockBackAbility {
    pub fn with_duration(duration: f32) -> Self {
        Self {
            duration,
            timer: Countdown::default(),
        }
    }

    /// Push away from `source_x`. Restarts the timer if already running.
    pub fn begin(&mut self, rig: &mut CharacterRig, force: Vec2, source_x: f32) {
        rig.physics.reset_velocity();
        let away = if rig.physics.position.x < source_x { -1.0 } else { 1.0 };
        rig.physics.velocity = Vec2::new(force.x * away, force.y);
        self.timer.start(self.duration);
    }

    pub fn process(&mut self, rig: &mut CharacterRig, dt: f32) -> Option<PlayerState> {
        self.timer.tick(dt);
        if self.timer.is_active() {
            return None;
        }
        if rig.stats.health <= 0 {
            return Some(PlayerState::Death);
        }
        Some(if !rig.physics.grounded {
            PlayerState::Jump
        } else if rig.input.move_x != 0.0 {
            PlayerState::Walk
        } else {
            PlayerState::Idle
        })
    }

    pub fn exit(&mut self) {
        self.timer.cancel();
    }
}

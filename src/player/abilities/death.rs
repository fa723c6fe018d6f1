use crate::constants::DEATH_RESTART_DELAY;
use crate::countdown::Countdown;
use crate::player::CharacterRig;

/// Death pose. Input is cut and a restart is requested after a delay;
/// whether the restart happens is up to the character's restart policy.
#[derive(Debug, Clone)]
pub struct DeathAbility {
    pub restart_delay: f32,
    timer: Countdown,
    restart_requested: bool,
}

impl Default for DeathAbility {
    fn default() -> Self {
        Self {
            restart_delay: DEATH_RESTART_DELAY,
            timer: Countdown::default(),
            restart_requested: false,
        }
    }
}

impl DeathAbility {
    pub fn with_delay(restart_delay: f32) -> Self {
        Self {
            restart_delay,
            ..Self::default()
        }
    }

    pub fn enter(&mut self, rig: &mut CharacterRig) {
        rig.input.disable_player_map();
        rig.physics.reset_velocity();
        self.restart_requested = false;
        self.timer.start(self.restart_delay);
    }

    pub fn process(&mut self, dt: f32) {
        if self.timer.tick(dt) {
            self.restart_requested = true;
        }
    }

    pub fn take_restart_request(&mut self) -> bool {
        std::mem::take(&mut self.restart_requested)
    }

    pub fn reset(&mut self) {
        self.timer.cancel();
        self.restart_requested = false;
    }
}

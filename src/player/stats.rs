//! Health and damage invulnerability

use bevy::prelude::*;

use crate::countdown::Countdown;

#[derive(Component, Debug, Clone)]
pub struct PlayerStats {
    pub health: i32,
    pub max_health: i32,
    flash: Countdown,
    flash_time: f32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self::new(crate::constants::MAX_HEALTH, crate::constants::DAMAGE_FLASH_TIME)
    }
}

impl PlayerStats {
    pub fn new(max_health: i32, flash_time: f32) -> Self {
        Self {
            health: max_health,
            max_health,
            flash: Countdown::default(),
            flash_time,
        }
    }

    /// False while flashing after a hit, or once dead
    pub fn can_take_damage(&self) -> bool {
        !self.flash.is_active() && self.health > 0
    }

    pub fn is_flashing(&self) -> bool {
        self.flash.is_active()
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    /// Apply damage and start the flash window. Returns false if ignored.
    pub fn damage(&mut self, amount: i32) -> bool {
        if !self.can_take_damage() {
            return false;
        }
        self.health -= amount;
        self.flash.start(self.flash_time);
        true
    }

    pub fn tick(&mut self, dt: f32) {
        self.flash.tick(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_blocks_repeat_damage() {
        let mut stats = PlayerStats::new(3, 0.5);
        assert!(stats.damage(1));
        assert!(!stats.damage(1));
        assert_eq!(stats.health, 2);
        stats.tick(0.5);
        assert!(stats.damage(1));
        assert_eq!(stats.health, 1);
    }

    #[test]
    fn test_dead_takes_no_damage() {
        let mut stats = PlayerStats::new(1, 0.0);
        assert!(stats.damage(1));
        stats.tick(0.1);
        assert!(stats.is_dead());
        assert!(!stats.damage(1));
    }
}

//! In-world terminal driver
//!
//! The kiosk only arms after the hero has been seen outside its zone, so a
//! hero respawned on the terminal spawn point does not re-trigger it.

use bevy::prelude::*;

use crate::world::Aabb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KioskSignal {
    None,
    /// Hero stepped into the zone
    Entered,
    /// Interact pressed inside an armed zone
    Activate,
}

#[derive(Component, Debug, Clone)]
pub struct TerminalKiosk {
    pub zone: Aabb,
    /// Spawn point the hero returns to after terminal restarts
    pub spawn_key: String,
    pub facing_right: bool,
    armed: bool,
    occupied: bool,
}

impl TerminalKiosk {
    pub fn new(zone: Aabb, spawn_key: &str, facing_right: bool) -> Self {
        Self {
            zone,
            spawn_key: spawn_key.to_string(),
            facing_right,
            armed: false,
            occupied: false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn update(&mut self, hero_bounds: &Aabb, interact_down: bool) -> KioskSignal {
        if !self.zone.overlaps(hero_bounds) {
            self.armed = true;
            self.occupied = false;
            return KioskSignal::None;
        }
        if !self.armed {
            return KioskSignal::None;
        }
        if interact_down {
            self.armed = false;
            return KioskSignal::Activate;
        }
        if !self.occupied {
            self.occupied = true;
            return KioskSignal::Entered;
        }
        KioskSignal::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kiosk() -> TerminalKiosk {
        TerminalKiosk::new(
            Aabb::from_center(Vec2::new(5.0, 1.0), Vec2::new(1.0, 1.0)),
            "Terminal",
            true,
        )
    }

    fn body_at(x: f32) -> Aabb {
        Aabb::from_center(Vec2::new(x, 1.0), Vec2::new(0.4, 0.8))
    }

    #[test]
    fn test_spawning_inside_does_not_trigger() {
        let mut kiosk = kiosk();
        assert_eq!(kiosk.update(&body_at(5.0), true), KioskSignal::None);
        assert!(!kiosk.is_armed());
    }

    #[test]
    fn test_enter_then_activate_once() {
        let mut kiosk = kiosk();
        assert_eq!(kiosk.update(&body_at(0.0), false), KioskSignal::None);
        assert_eq!(kiosk.update(&body_at(5.0), false), KioskSignal::Entered);
        assert_eq!(kiosk.update(&body_at(5.0), false), KioskSignal::None);
        assert_eq!(kiosk.update(&body_at(5.0), true), KioskSignal::Activate);
        assert_eq!(kiosk.update(&body_at(5.0), true), KioskSignal::None);

        // Leaving re-arms
        kiosk.update(&body_at(0.0), false);
        assert!(kiosk.is_armed());
    }
}

//! Countdown timer advanced explicitly per tick
//!
//! Used for every timed wait in the simulation (dash, knockback, damage
//! flash, death delay, notices). Starting a running countdown replaces it.

/// A one-shot countdown
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Countdown {
    /// Time remaining in seconds
    remaining: f32,
    /// Whether the countdown is currently running
    active: bool,
}

impl Countdown {
    /// Start (or restart) the countdown
    pub fn start(&mut self, seconds: f32) {
        self.remaining = seconds;
        self.active = true;
    }

    /// Stop without firing
    pub fn cancel(&mut self) {
        self.active = false;
        self.remaining = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn remaining(&self) -> f32 {
        if self.active { self.remaining } else { 0.0 }
    }

    /// Advance by `dt`. Returns true exactly once, on the tick it expires.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.active {
            return false;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.active = false;
            self.remaining = 0.0;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once() {
        let mut countdown = Countdown::default();
        countdown.start(0.5);
        assert!(!countdown.tick(0.25));
        assert!(countdown.tick(0.25));
        assert!(!countdown.tick(0.25));
        assert!(!countdown.is_active());
    }

    #[test]
    fn test_restart_replaces_running_countdown() {
        let mut countdown = Countdown::default();
        countdown.start(0.5);
        countdown.tick(0.25);
        countdown.start(1.0);
        assert_eq!(countdown.remaining(), 1.0);
        assert!(!countdown.tick(0.5));
        assert!(countdown.tick(0.5));
    }

    #[test]
    fn test_cancel_never_fires() {
        let mut countdown = Countdown::default();
        countdown.start(0.25);
        countdown.cancel();
        assert!(!countdown.tick(1.0));
    }
}

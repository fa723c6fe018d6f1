//! Input module - per-tick input frames and the GatherInput buffer
//!
//! Device events arrive at frame rate and are latched into exactly one
//! [`InputFrame`] per fixed tick. In replay mode the device is ignored and
//! frames are supplied from a clip instead.

mod device;

pub use device::{PlayerCommand, PlayerCommands, read_command_keys, read_device_input};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// One fixed tick's worth of input
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    pub tick: u32,
    pub move_x: f32,
    pub jump_down: bool,
    pub jump_up: bool,
    pub jump_held: bool,
    pub dash_down: bool,
    pub dash_up: bool,
    pub dash_held: bool,
}

impl InputFrame {
    /// Neutral frame for a tick (no buttons, no movement)
    pub fn empty(tick: u32) -> Self {
        Self {
            tick,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.move_x == 0.0
            && !self.jump_down
            && !self.jump_up
            && !self.jump_held
            && !self.dash_down
            && !self.dash_up
            && !self.dash_held
    }
}

/// Where GatherInput takes its input from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Live,
    Replay,
}

/// Edge events accumulated between two fixed ticks
#[derive(Debug, Clone, Copy, Default)]
struct RawEdges {
    jump_down: bool,
    jump_up: bool,
    dash_down: bool,
    dash_up: bool,
    interact_down: bool,
}

/// Input buffer for one character.
///
/// Raw setters are called at frame rate by the device reader (or a test
/// script). [`GatherInput::latch_tick`] moves them into the tick flags once
/// per fixed tick; readers consume edge flags so each edge is seen once.
#[derive(Component, Debug, Clone, Default)]
pub struct GatherInput {
    mode: InputMode,
    map_disabled: bool,

    // Device side
    raw: RawEdges,
    raw_move_x: f32,
    raw_jump_held: bool,
    raw_dash_held: bool,
    raw_interact_held: bool,

    // Tick side
    pub move_x: f32,
    pub jump_held: bool,
    pub dash_held: bool,
    pub interact_held: bool,
    jump_down_tick: bool,
    jump_up_tick: bool,
    dash_down_tick: bool,
    dash_up_tick: bool,
    interact_down_tick: bool,
}

impl GatherInput {
    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn is_player_map_enabled(&self) -> bool {
        !self.map_disabled
    }

    fn accepts_device(&self) -> bool {
        self.mode == InputMode::Live && !self.map_disabled
    }

    // --- device side -------------------------------------------------------

    pub fn set_move_axis(&mut self, x: f32) {
        if self.accepts_device() {
            self.raw_move_x = x.clamp(-1.0, 1.0);
        }
    }

    pub fn press_jump(&mut self) {
        if self.accepts_device() && !self.raw_jump_held {
            self.raw.jump_down = true;
            self.raw_jump_held = true;
        }
    }

    pub fn release_jump(&mut self) {
        if self.accepts_device() && self.raw_jump_held {
            self.raw.jump_up = true;
            self.raw_jump_held = false;
        }
    }

    pub fn press_dash(&mut self) {
        if self.accepts_device() && !self.raw_dash_held {
            self.raw.dash_down = true;
            self.raw_dash_held = true;
        }
    }

    pub fn release_dash(&mut self) {
        if self.accepts_device() && self.raw_dash_held {
            self.raw.dash_up = true;
            self.raw_dash_held = false;
        }
    }

    pub fn press_interact(&mut self) {
        if self.accepts_device() && !self.raw_interact_held {
            self.raw.interact_down = true;
            self.raw_interact_held = true;
        }
    }

    pub fn release_interact(&mut self) {
        if self.accepts_device() {
            self.raw_interact_held = false;
        }
    }

    /// Set the held state of every button at once, deriving edges from the
    /// change since the last call.
    pub fn set_buttons(&mut self, jump: bool, dash: bool, interact: bool) {
        if jump {
            self.press_jump();
        } else {
            self.release_jump();
        }
        if dash {
            self.press_dash();
        } else {
            self.release_dash();
        }
        if interact {
            self.press_interact();
        } else {
            self.release_interact();
        }
    }

    // --- tick side ---------------------------------------------------------

    /// Latch device state into this tick's flags. Live mode only.
    ///
    /// Edge flags are assigned, not accumulated, so an edge the previous
    /// tick left unconsumed is dropped here.
    pub fn latch_tick(&mut self) {
        if self.mode != InputMode::Live {
            return;
        }
        self.move_x = self.raw_move_x;
        self.jump_held = self.raw_jump_held;
        self.dash_held = self.raw_dash_held;
        self.interact_held = self.raw_interact_held;
        self.jump_down_tick = self.raw.jump_down;
        self.jump_up_tick = self.raw.jump_up;
        self.dash_down_tick = self.raw.dash_down;
        self.dash_up_tick = self.raw.dash_up;
        self.interact_down_tick = self.raw.interact_down;
        self.raw = RawEdges::default();
    }

    /// Snapshot the current tick flags
    pub fn capture_frame(&self, tick: u32) -> InputFrame {
        InputFrame {
            tick,
            move_x: self.move_x,
            jump_down: self.jump_down_tick,
            jump_up: self.jump_up_tick,
            jump_held: self.jump_held,
            dash_down: self.dash_down_tick,
            dash_up: self.dash_up_tick,
            dash_held: self.dash_held,
        }
    }

    /// Overwrite the tick flags with a recorded frame. Replay mode only.
    pub fn apply_replay_frame(&mut self, frame: &InputFrame) -> bool {
        if self.mode != InputMode::Replay {
            debug!("Ignoring replay frame {} in live mode", frame.tick);
            return false;
        }
        self.move_x = frame.move_x;
        self.jump_held = frame.jump_held;
        self.dash_held = frame.dash_held;
        self.jump_down_tick = frame.jump_down;
        self.jump_up_tick = frame.jump_up;
        self.dash_down_tick = frame.dash_down;
        self.dash_up_tick = frame.dash_up;
        true
    }

    /// Switch source. Always resets held and edge state.
    pub fn set_mode(&mut self, mode: InputMode) {
        self.clear();
        self.mode = mode;
    }

    /// Drop every held and edge flag on both sides
    pub fn clear(&mut self) {
        let mode = self.mode;
        let map_disabled = self.map_disabled;
        *self = Self {
            mode,
            map_disabled,
            ..Default::default()
        };
    }

    pub fn jump_down(&self) -> bool {
        self.jump_down_tick
    }

    pub fn dash_down(&self) -> bool {
        self.dash_down_tick
    }

    pub fn consume_jump_down(&mut self) -> bool {
        std::mem::take(&mut self.jump_down_tick)
    }

    pub fn consume_jump_up(&mut self) -> bool {
        std::mem::take(&mut self.jump_up_tick)
    }

    pub fn consume_dash_down(&mut self) -> bool {
        std::mem::take(&mut self.dash_down_tick)
    }

    pub fn consume_dash_up(&mut self) -> bool {
        std::mem::take(&mut self.dash_up_tick)
    }

    pub fn consume_interact_down(&mut self) -> bool {
        std::mem::take(&mut self.interact_down_tick)
    }

    /// Stop listening to the device (death, terminal menus)
    pub fn disable_player_map(&mut self) {
        self.clear();
        self.map_disabled = true;
    }

    /// Resume device input in live mode with a clean slate
    pub fn enable_player_map(&mut self) {
        self.map_disabled = false;
        self.set_mode(InputMode::Live);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_down_edge_lasts_one_tick() {
        let mut input = GatherInput::default();
        input.press_jump();

        input.latch_tick();
        let first = input.capture_frame(0);
        assert!(first.jump_down);
        assert!(first.jump_held);

        // Not consumed, still must not leak into the next tick
        input.latch_tick();
        let second = input.capture_frame(1);
        assert!(!second.jump_down);
        assert!(second.jump_held);
    }

    #[test]
    fn test_consume_once() {
        let mut input = GatherInput::default();
        input.press_dash();
        input.latch_tick();
        assert!(input.consume_dash_down());
        assert!(!input.consume_dash_down());
        assert!(input.dash_held);
    }

    #[test]
    fn test_press_and_release_between_ticks_keeps_both_edges() {
        let mut input = GatherInput::default();
        input.press_jump();
        input.release_jump();
        input.latch_tick();
        let frame = input.capture_frame(0);
        assert!(frame.jump_down);
        assert!(frame.jump_up);
        assert!(!frame.jump_held);
    }

    #[test]
    fn test_replay_mode_ignores_device() {
        let mut input = GatherInput::default();
        input.set_mode(InputMode::Replay);
        input.set_move_axis(1.0);
        input.press_jump();
        input.latch_tick();
        assert_eq!(input.move_x, 0.0);
        assert!(!input.jump_down());

        let frame = InputFrame {
            tick: 4,
            move_x: -1.0,
            jump_down: true,
            jump_held: true,
            ..Default::default()
        };
        assert!(input.apply_replay_frame(&frame));
        assert_eq!(input.capture_frame(4), frame);
    }

    #[test]
    fn test_live_mode_rejects_replay_frames() {
        let mut input = GatherInput::default();
        let frame = InputFrame {
            move_x: 1.0,
            ..Default::default()
        };
        assert!(!input.apply_replay_frame(&frame));
        assert_eq!(input.move_x, 0.0);
    }

    #[test]
    fn test_set_mode_resets_state() {
        let mut input = GatherInput::default();
        input.set_move_axis(1.0);
        input.press_jump();
        input.latch_tick();
        input.set_mode(InputMode::Replay);
        assert_eq!(input.move_x, 0.0);
        assert!(!input.jump_held);
        assert!(!input.jump_down());
        input.set_mode(InputMode::Live);
        // Raw held state was cleared too, so pressing again is a fresh edge
        input.press_jump();
        input.latch_tick();
        assert!(input.jump_down());
    }

    #[test]
    fn test_disabled_map_ignores_device_until_enabled() {
        let mut input = GatherInput::default();
        input.disable_player_map();
        input.press_jump();
        input.latch_tick();
        assert!(!input.jump_down());

        input.enable_player_map();
        assert_eq!(input.mode(), InputMode::Live);
        input.press_jump();
        input.latch_tick();
        assert!(input.jump_down());
    }

    #[test]
    fn test_interact_is_not_part_of_frame() {
        let mut input = GatherInput::default();
        input.press_interact();
        input.latch_tick();
        assert!(input.capture_frame(0).is_empty());
        assert!(input.consume_interact_down());
        assert!(input.interact_held);
    }
}

//! Scripted input injection for scenarios

use bevy::prelude::*;
use std::collections::HashMap;

use super::parser::{FrameInput, InputSnapshot};
use crate::input::{GatherInput, PlayerCommand};

/// Held device state for a scripted character (persists between frames)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CurrentInputState {
    pub move_x: f32,
    pub jump: bool,
    pub dash: bool,
    pub interact: bool,
}

impl CurrentInputState {
    fn apply(&mut self, snapshot: &InputSnapshot) {
        if let Some(x) = snapshot.effective_move_x() {
            self.move_x = x;
        }
        if let Some(jump) = snapshot.jump {
            self.jump = jump;
        }
        if let Some(dash) = snapshot.dash {
            self.dash = dash;
        }
        if let Some(interact) = snapshot.interact {
            self.interact = interact;
        }
    }

    /// Feed the held state to a character's input, as the device reader would
    pub fn write_to(&self, input: &mut GatherInput) {
        input.set_move_axis(self.move_x);
        input.set_buttons(self.jump, self.dash, self.interact);
    }
}

/// Parse a scenario command string
pub fn parse_command(command: &str) -> Result<PlayerCommand, String> {
    let command = command.trim();
    if let Some(digit) = command.strip_prefix("digit:") {
        return match digit.trim().parse::<u8>() {
            Ok(d @ 1..=9) => Ok(PlayerCommand::Digit(d)),
            _ => Err(format!("Invalid digit command: {}", command)),
        };
    }
    match command {
        "play" => Ok(PlayerCommand::Play),
        "exit" => Ok(PlayerCommand::ExitTerminal),
        "next_slot" => Ok(PlayerCommand::NextSlot),
        "prev_slot" => Ok(PlayerCommand::PreviousSlot),
        "stop" => Ok(PlayerCommand::StopRecording),
        _ => Err(format!("Unknown command: {}", command)),
    }
}

/// Scripted inputs for a scenario, indexed by frame
#[derive(Default)]
pub struct ScriptedInputs {
    /// Map of frame -> (character id -> input snapshot)
    pub frames: HashMap<u64, HashMap<String, InputSnapshot>>,
    /// Map of frame -> commands issued that frame
    pub commands: HashMap<u64, Vec<PlayerCommand>>,
    /// Current held state per character
    pub current_state: HashMap<String, CurrentInputState>,
    /// Current frame number
    pub current_frame: u64,
    /// Maximum frame to run
    pub max_frame: u64,
}

impl ScriptedInputs {
    /// Create from parsed frame inputs. Fails on an unknown command.
    pub fn from_inputs(inputs: &[FrameInput]) -> Result<Self, String> {
        let mut scripted = Self::default();

        for fi in inputs {
            scripted.max_frame = scripted.max_frame.max(fi.frame);
            scripted
                .frames
                .entry(fi.frame)
                .or_default()
                .extend(fi.inputs.iter().map(|(k, v)| (k.clone(), v.clone())));
            for command in &fi.commands {
                scripted
                    .commands
                    .entry(fi.frame)
                    .or_default()
                    .push(parse_command(command)?);
            }
        }

        Ok(scripted)
    }

    /// Set max frame (for state assertions)
    pub fn set_max_frame(&mut self, frame: u64) {
        self.max_frame = self.max_frame.max(frame);
    }

    /// Advance to the next frame, returning held state and this frame's commands
    pub fn advance_frame(&mut self) -> (HashMap<String, CurrentInputState>, Vec<PlayerCommand>) {
        if let Some(frame_inputs) = self.frames.get(&self.current_frame) {
            for (id, snapshot) in frame_inputs {
                self.current_state
                    .entry(id.clone())
                    .or_default()
                    .apply(snapshot);
            }
        }
        let commands = self
            .commands
            .get(&self.current_frame)
            .cloned()
            .unwrap_or_default();

        self.current_frame += 1;
        (self.current_state.clone(), commands)
    }

    /// Check if simulation should continue
    pub fn should_continue(&self) -> bool {
        self.current_frame <= self.max_frame
    }
}

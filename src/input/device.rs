//! Keyboard and gamepad readers

use bevy::prelude::*;

use super::GatherInput;
use crate::constants::STICK_DEADZONE;
use crate::player::HumanControlled;

/// Discrete commands outside the per-tick movement input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Number key 1-9. Profile hotkey, or record-with-profile inside the terminal.
    Digit(u8),
    /// Play the selected slot (terminal)
    Play,
    /// Leave the terminal menu
    ExitTerminal,
    NextSlot,
    PreviousSlot,
    StopRecording,
}

/// Commands collected this frame, drained by the session systems
#[derive(Resource, Default, Debug)]
pub struct PlayerCommands {
    pending: Vec<PlayerCommand>,
}

impl PlayerCommands {
    pub fn push(&mut self, command: PlayerCommand) {
        self.pending.push(command);
    }

    pub fn drain(&mut self) -> Vec<PlayerCommand> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

const DIGIT_KEYS: [KeyCode; 9] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
];

/// Runs in Update to feed device state into the hero's GatherInput.
/// Keyboard is optional so headless apps without an input plugin still run.
pub fn read_device_input(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    gamepads: Query<&Gamepad>,
    mut inputs: Query<&mut GatherInput, With<HumanControlled>>,
) {
    let Some(keyboard) = keyboard else {
        return;
    };

    // Horizontal movement (continuous - overwrite each frame)
    let mut move_x = 0.0;
    if keyboard.pressed(KeyCode::KeyA) || keyboard.pressed(KeyCode::ArrowLeft) {
        move_x -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) || keyboard.pressed(KeyCode::ArrowRight) {
        move_x += 1.0;
    }
    for gamepad in &gamepads {
        if let Some(stick_x) = gamepad.get(GamepadAxis::LeftStickX) {
            if stick_x.abs() > STICK_DEADZONE {
                move_x += stick_x;
            }
        }
    }

    let jump = keyboard.pressed(KeyCode::Space)
        || keyboard.pressed(KeyCode::KeyW)
        || keyboard.pressed(KeyCode::ArrowUp)
        || gamepads.iter().any(|gp| gp.pressed(GamepadButton::South));
    let dash = keyboard.pressed(KeyCode::ShiftLeft)
        || keyboard.pressed(KeyCode::ShiftRight)
        || gamepads.iter().any(|gp| gp.pressed(GamepadButton::West));
    let interact = keyboard.pressed(KeyCode::KeyE)
        || gamepads.iter().any(|gp| gp.pressed(GamepadButton::North));

    for mut input in &mut inputs {
        input.set_move_axis(move_x);
        input.set_buttons(jump, dash, interact);
    }
}

/// Runs in Update to turn hotkeys into [`PlayerCommand`]s
pub fn read_command_keys(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    gamepads: Query<&Gamepad>,
    mut commands: ResMut<PlayerCommands>,
) {
    let Some(keyboard) = keyboard else {
        return;
    };

    for (index, key) in DIGIT_KEYS.iter().enumerate() {
        if keyboard.just_pressed(*key) {
            commands.push(PlayerCommand::Digit(index as u8 + 1));
        }
    }
    if keyboard.just_pressed(KeyCode::KeyC)
        || gamepads.iter().any(|gp| gp.just_pressed(GamepadButton::Start))
    {
        commands.push(PlayerCommand::Play);
    }
    if keyboard.just_pressed(KeyCode::Escape)
        || gamepads.iter().any(|gp| gp.just_pressed(GamepadButton::East))
    {
        commands.push(PlayerCommand::ExitTerminal);
    }
    if keyboard.just_pressed(KeyCode::Tab)
        || gamepads
            .iter()
            .any(|gp| gp.just_pressed(GamepadButton::RightTrigger))
    {
        commands.push(PlayerCommand::NextSlot);
    }
    if gamepads
        .iter()
        .any(|gp| gp.just_pressed(GamepadButton::LeftTrigger))
    {
        commands.push(PlayerCommand::PreviousSlot);
    }
    if keyboard.just_pressed(KeyCode::KeyX) {
        commands.push(PlayerCommand::StopRecording);
    }
}

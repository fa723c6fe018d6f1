//! Session systems - wire the terminal session to the hero and the level

use bevy::prelude::*;

use super::{
    JsonSaveStore, KioskSignal, SessionEvent, SessionHost, SessionState, TerminalKiosk,
    TerminalSession,
};
use crate::clones::{CloneSwitcher, SwitchError};
use crate::events::{CharacterRole, EventBus, GameEvent};
use crate::input::{GatherInput, PlayerCommand, PlayerCommands};
use crate::levels::{LevelManager, spawn_ghost};
use crate::player::{Facing, HumanControlled, PhysicsControl, PlayerState, RestartPolicy, StateMachine};
use crate::profiles::ProfileDatabase;
use crate::replay::{RecorderEvent, ReplayRecorder, StartSnapshot};
use crate::tuning::GameplayTuning;

/// The hero's components as the session sees them
pub struct HeroHost<'a> {
    pub machine: &'a mut StateMachine,
    pub input: &'a mut GatherInput,
    pub physics: &'a mut PhysicsControl,
    pub facing: &'a mut Facing,
    pub switcher: &'a mut CloneSwitcher,
    pub recorder: &'a mut ReplayRecorder,
    pub profiles: &'a ProfileDatabase,
    pub tuning: &'a GameplayTuning,
    pub bus: &'a mut EventBus,
}

impl SessionHost for HeroHost<'_> {
    fn switch_profile(&mut self, index: usize) -> Result<(), SwitchError> {
        let profile = self.switcher.switch_to(
            index,
            self.profiles,
            self.machine,
            self.physics,
            self.facing,
        )?;
        self.bus.emit(GameEvent::ProfileSwitched {
            role: CharacterRole::Hero,
            profile_id: profile.id.clone(),
        });
        Ok(())
    }

    fn start_recording(&mut self) -> bool {
        let profile_id = self.switcher.current_id().unwrap_or_default();
        let snapshot = StartSnapshot::capture(self.machine, self.physics, self.facing, profile_id);
        let profile = self.switcher.current_index().zip(self.switcher.current_id());
        let started = self.recorder.start_recording(
            profile,
            snapshot,
            self.tuning.contract(),
            self.tuning,
        );
        if started {
            self.bus.emit(GameEvent::RecordingStarted {
                profile_id: profile_id.to_string(),
            });
        }
        started
    }

    fn set_player_input_enabled(&mut self, enabled: bool) {
        if enabled {
            self.input.enable_player_map();
        } else {
            self.input.disable_player_map();
        }
    }

    fn set_hotkeys_enabled(&mut self, enabled: bool) {
        self.switcher.set_hotkeys_enabled(enabled);
    }

    fn hold_player_idle(&mut self) {
        self.machine.force_change(PlayerState::Idle);
        self.physics.reset_velocity();
    }
}

/// Run condition: false while the terminal menu has the world frozen
pub fn world_running(session: Res<TerminalSession>) -> bool {
    !session.is_world_frozen()
}

/// Apply queued hotkeys and terminal commands.
///
/// Digits switch clones in the open world and pick the recording clone
/// inside the terminal.
#[allow(clippy::too_many_arguments)]
pub fn run_player_commands(
    mut commands: Commands,
    mut player_commands: ResMut<PlayerCommands>,
    mut session: ResMut<TerminalSession>,
    mut manager: ResMut<LevelManager>,
    mut saves: ResMut<JsonSaveStore>,
    profiles: Res<ProfileDatabase>,
    tuning: Res<GameplayTuning>,
    mut bus: ResMut<EventBus>,
    mut heroes: Query<
        (
            &mut StateMachine,
            &mut GatherInput,
            &mut PhysicsControl,
            &mut Facing,
            &mut CloneSwitcher,
            &mut ReplayRecorder,
        ),
        With<HumanControlled>,
    >,
) {
    if player_commands.is_empty() {
        return;
    }
    let queued = player_commands.drain();
    let Ok((mut machine, mut input, mut physics, mut facing, mut switcher, mut recorder)) =
        heroes.single_mut()
    else {
        debug!("No hero, dropping {} commands", queued.len());
        return;
    };
    let mut host = HeroHost {
        machine: &mut machine,
        input: &mut input,
        physics: &mut physics,
        facing: &mut facing,
        switcher: &mut switcher,
        recorder: &mut recorder,
        profiles: &profiles,
        tuning: &tuning,
        bus: &mut bus,
    };

    for command in queued {
        match command {
            PlayerCommand::Digit(digit) => {
                let index = usize::from(digit.saturating_sub(1));
                if index >= profiles.len() {
                    session.show_notice(&format!("No clone on key {}", digit));
                    continue;
                }
                match session.state() {
                    SessionState::TerminalPaused => {
                        session.request_restart_and_start_recording(
                            index,
                            manager.as_mut(),
                            saves.as_mut(),
                        );
                    }
                    SessionState::Normal | SessionState::Playback => {
                        if !host.switcher.hotkeys_enabled() {
                            debug!("Clone hotkeys disabled, ignoring key {}", digit);
                            continue;
                        }
                        if let Err(e) = host.switch_profile(index) {
                            warn!("Clone switch failed: {}", e);
                        }
                    }
                    _ => {}
                }
            }
            PlayerCommand::Play => {
                let Some(clip) = session.begin_playback(&mut host) else {
                    continue;
                };
                let frames = clip.frame_count();
                if spawn_ghost(&mut commands, clip, &profiles, &tuning).is_some() {
                    host.bus.emit(GameEvent::PlaybackStarted { frames });
                } else {
                    session.show_notice("Playback unavailable");
                    session.finish_playback();
                }
            }
            PlayerCommand::ExitTerminal => {
                session.exit_terminal(&mut host);
            }
            PlayerCommand::NextSlot => {
                session.cycle_slot(true);
            }
            PlayerCommand::PreviousSlot => {
                session.cycle_slot(false);
            }
            PlayerCommand::StopRecording => {
                host.recorder.stop_recording(host.physics);
            }
        }
    }
}

/// Hand finished clips to the session
pub fn forward_recorder_events(
    mut session: ResMut<TerminalSession>,
    mut manager: ResMut<LevelManager>,
    mut saves: ResMut<JsonSaveStore>,
    mut bus: ResMut<EventBus>,
    mut recorders: Query<&mut ReplayRecorder>,
) {
    for mut recorder in &mut recorders {
        for event in recorder.drain_events() {
            match event {
                RecorderEvent::Stopped(clip) => {
                    bus.emit(GameEvent::RecordingStopped {
                        frames: clip.frame_count(),
                        keyframes: clip.keyframes().len(),
                    });
                    session.handle_recording_stopped(clip, manager.as_mut(), saves.as_mut());
                }
            }
        }
    }
}

/// Death ends a recording. A finished death pose restarts the level
/// unless the character's policy forbids it.
pub fn handle_death_restarts(
    mut session: ResMut<TerminalSession>,
    mut manager: ResMut<LevelManager>,
    mut characters: Query<(
        &mut StateMachine,
        &PhysicsControl,
        &RestartPolicy,
        Option<&mut ReplayRecorder>,
    )>,
) {
    for (mut machine, physics, policy, recorder) in &mut characters {
        if machine.current() == PlayerState::Death {
            if let Some(mut recorder) = recorder {
                if recorder.is_recording() {
                    info!("Recording character died, stopping recording");
                    recorder.stop_recording(physics);
                }
            }
        }
        if !machine.take_restart_request() {
            continue;
        }
        match policy {
            RestartPolicy::Allowed => {
                session.request_plain_restart(manager.as_mut());
            }
            RestartPolicy::Forbidden => debug!("Restart request ignored by policy"),
        }
    }
}

/// Drive kiosks from the hero's position and interact edge
pub fn update_terminal_kiosks(
    mut session: ResMut<TerminalSession>,
    mut manager: ResMut<LevelManager>,
    mut saves: ResMut<JsonSaveStore>,
    mut heroes: Query<(&PhysicsControl, &mut GatherInput), With<HumanControlled>>,
    mut kiosks: Query<&mut TerminalKiosk>,
) {
    let Ok((physics, mut input)) = heroes.single_mut() else {
        return;
    };
    let interact = input.consume_interact_down();
    let bounds = physics.bounds();
    let usable = matches!(session.state(), SessionState::Normal | SessionState::Playback);

    for mut kiosk in &mut kiosks {
        match kiosk.update(&bounds, interact && usable) {
            KioskSignal::None => {}
            KioskSignal::Entered => {
                session.set_terminal_spawn(&kiosk.spawn_key, kiosk.facing_right);
                if usable {
                    session.show_notice("Press E to use the terminal");
                }
            }
            KioskSignal::Activate => {
                session.set_terminal_spawn(&kiosk.spawn_key, kiosk.facing_right);
                session.request_restart_and_enter_terminal(manager.as_mut(), saves.as_mut());
            }
        }
    }
}

/// Mirror session notifications onto the bus
pub fn forward_session_events(mut session: ResMut<TerminalSession>, mut bus: ResMut<EventBus>) {
    for event in session.drain_events() {
        bus.emit(match event {
            SessionEvent::SlotsChanged => GameEvent::SlotsChanged,
            SessionEvent::StateChanged { from, to } => GameEvent::SessionStateChanged { from, to },
            SessionEvent::Notice(message) => GameEvent::Notice { message },
        });
    }
}

pub fn tick_session_notice(tuning: Res<GameplayTuning>, mut session: ResMut<TerminalSession>) {
    session.tick_notice(tuning.fixed_dt);
}

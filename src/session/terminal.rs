//! TerminalSession - record/playback lifecycle across level reloads
//!
//! Entering the terminal or starting a recording restarts the level so the
//! world is in a known state. The request is parked in a pending token that
//! survives the reload and is consumed exactly once when the new level is
//! up. Only one restart may be in flight; further requests are dropped.

use std::sync::Arc;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{LevelService, SaveService, SessionHost, SpawnData};
use crate::constants::{NOTICE_DURATION, SAVE_FOLDER, SLOT_COUNT, SPAWN_SAVE_FILE};
use crate::countdown::Countdown;
use crate::replay::ReplayClip;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Normal,
    EnteringTerminal,
    TerminalPaused,
    EnteringRecord,
    Recording,
    Playback,
}

/// What to do once the reload completes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PendingAction {
    #[default]
    None,
    EnterTerminal,
    StartRecording,
}

/// Change notifications for observers (UI, event bus)
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SlotsChanged,
    StateChanged {
        from: SessionState,
        to: SessionState,
    },
    Notice(String),
}

#[derive(Resource, Debug, Default)]
pub struct TerminalSession {
    state: SessionState,
    pending: PendingAction,
    pending_profile: Option<usize>,
    slots: [Option<Arc<ReplayClip>>; SLOT_COUNT],
    selected_slot: usize,
    restart_in_progress: bool,
    world_frozen: bool,
    terminal_spawn: Option<(String, bool)>,
    notice: Countdown,
    notice_text: Option<String>,
    events: Vec<SessionEvent>,
}

impl TerminalSession {
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pending_action(&self) -> PendingAction {
        self.pending
    }

    pub fn pending_profile(&self) -> Option<usize> {
        self.pending_profile
    }

    pub fn restart_in_progress(&self) -> bool {
        self.restart_in_progress
    }

    pub fn is_world_frozen(&self) -> bool {
        self.world_frozen
    }

    pub fn selected_slot(&self) -> usize {
        self.selected_slot
    }

    pub fn has_clip(&self, slot: usize) -> bool {
        self.slots.get(slot).is_some_and(|s| s.is_some())
    }

    pub fn clip(&self, slot: usize) -> Option<&Arc<ReplayClip>> {
        self.slots.get(slot).and_then(|s| s.as_ref())
    }

    /// Profile id of the clip in each slot
    pub fn slot_profiles(&self) -> [Option<&str>; SLOT_COUNT] {
        std::array::from_fn(|i| self.slots[i].as_ref().map(|c| c.profile_id()))
    }

    fn set_state(&mut self, to: SessionState) {
        if self.state == to {
            return;
        }
        let from = self.state;
        self.state = to;
        info!("Terminal session: {:?} -> {:?}", from, to);
        self.events.push(SessionEvent::StateChanged { from, to });
    }

    /// Where the hero should reappear after terminal restarts
    pub fn set_terminal_spawn(&mut self, key: &str, facing_right: bool) {
        self.terminal_spawn = Some((key.to_string(), facing_right));
    }

    fn save_spawn_for_next_load(&self, level: &dyn LevelService, saves: &mut dyn SaveService) {
        let Some((key, facing_right)) = &self.terminal_spawn else {
            return;
        };
        let data = SpawnData {
            scene_name: level.current_scene().to_string(),
            spawn_point_key: key.clone(),
            facing_right: *facing_right,
        };
        if let Err(e) = saves.save(&data, SAVE_FOLDER, SPAWN_SAVE_FILE) {
            warn!("Could not save spawn point: {}", e);
        }
    }

    /// Park the action for the next reload. Replacing a live token is
    /// logged since the replaced action will never run.
    fn set_pending(&mut self, action: PendingAction, profile: Option<usize>) {
        if self.pending != PendingAction::None && self.pending != action {
            warn!(
                "Pending {:?} replaced by {:?} before the reload landed",
                self.pending, action
            );
        }
        self.pending = action;
        self.pending_profile = profile;
    }

    fn begin_restart(
        &mut self,
        level: &mut dyn LevelService,
        saves: &mut dyn SaveService,
    ) {
        self.save_spawn_for_next_load(level, saves);
        self.restart_in_progress = true;
        level.restart_current_level();
    }

    pub fn request_restart_and_enter_terminal(
        &mut self,
        level: &mut dyn LevelService,
        saves: &mut dyn SaveService,
    ) -> bool {
        if self.restart_in_progress {
            return false;
        }
        self.set_pending(PendingAction::EnterTerminal, None);
        self.set_state(SessionState::EnteringTerminal);
        self.begin_restart(level, saves);
        true
    }

    pub fn request_restart_and_start_recording(
        &mut self,
        profile_index: usize,
        level: &mut dyn LevelService,
        saves: &mut dyn SaveService,
    ) -> bool {
        if self.restart_in_progress {
            return false;
        }
        self.set_pending(PendingAction::StartRecording, Some(profile_index));
        self.set_state(SessionState::EnteringRecord);
        self.begin_restart(level, saves);
        true
    }

    /// Death restart. Goes through the same in-flight guard.
    pub fn request_plain_restart(&mut self, level: &mut dyn LevelService) -> bool {
        if self.restart_in_progress {
            return false;
        }
        self.set_pending(PendingAction::None, None);
        self.restart_in_progress = true;
        level.restart_current_level();
        true
    }

    /// Consume the pending token against the freshly spawned hero
    pub fn on_level_loaded(&mut self, host: &mut dyn SessionHost) {
        self.restart_in_progress = false;
        let pending = std::mem::take(&mut self.pending);
        let profile = self.pending_profile.take();

        match pending {
            PendingAction::EnterTerminal => {
                if let Err(e) = host.switch_profile(0) {
                    error!("Cannot apply default profile in terminal: {}", e);
                }
                host.hold_player_idle();
                self.world_frozen = true;
                host.set_player_input_enabled(false);
                host.set_hotkeys_enabled(false);
                self.set_state(SessionState::TerminalPaused);
            }
            PendingAction::StartRecording => {
                self.world_frozen = false;
                host.set_player_input_enabled(true);
                host.set_hotkeys_enabled(false);
                if let Some(index) = profile {
                    if let Err(e) = host.switch_profile(index) {
                        error!("Cannot record with profile {}: {}", index, e);
                        self.show_notice("Recording unavailable for that clone");
                        self.land_in_normal(host);
                        return;
                    }
                }
                if !host.start_recording() {
                    self.show_notice("Recording unavailable");
                    self.land_in_normal(host);
                    return;
                }
                self.set_state(SessionState::Recording);
                info!("Applied pending profile switch and started recording after reload");
            }
            PendingAction::None => self.land_in_normal(host),
        }
    }

    fn land_in_normal(&mut self, host: &mut dyn SessionHost) {
        self.world_frozen = false;
        if let Err(e) = host.switch_profile(0) {
            error!("Cannot apply default profile: {}", e);
        }
        host.set_player_input_enabled(true);
        host.set_hotkeys_enabled(true);
        self.set_state(SessionState::Normal);
    }

    /// Recorder stop event: keep the clip and restart into the terminal
    pub fn handle_recording_stopped(
        &mut self,
        clip: Arc<ReplayClip>,
        level: &mut dyn LevelService,
        saves: &mut dyn SaveService,
    ) {
        self.save_clip_to_selected_slot_and_restart(clip, level, saves);
    }

    pub fn save_clip_to_selected_slot_and_restart(
        &mut self,
        clip: Arc<ReplayClip>,
        level: &mut dyn LevelService,
        saves: &mut dyn SaveService,
    ) {
        info!(
            "Stored clip {} ({} frames, profile {}) in slot {}",
            clip.id,
            clip.frame_count(),
            clip.profile_id(),
            self.selected_slot + 1
        );
        self.slots[self.selected_slot] = Some(clip);
        self.events.push(SessionEvent::SlotsChanged);

        self.set_pending(PendingAction::EnterTerminal, None);
        self.set_state(SessionState::EnteringTerminal);
        if self.restart_in_progress {
            // The restart already under way will land in the terminal
            return;
        }
        self.begin_restart(level, saves);
    }

    /// Ignored while recording. Out-of-range slots are clamped.
    pub fn select_slot(&mut self, slot: usize) -> bool {
        if self.state == SessionState::Recording {
            return false;
        }
        self.selected_slot = slot.min(SLOT_COUNT - 1);
        self.events.push(SessionEvent::SlotsChanged);
        true
    }

    pub fn cycle_slot(&mut self, forward: bool) -> bool {
        let slot = if forward {
            (self.selected_slot + 1) % SLOT_COUNT
        } else {
            (self.selected_slot + SLOT_COUNT - 1) % SLOT_COUNT
        };
        self.select_slot(slot)
    }

    /// Leave the terminal menu and unfreeze the world
    pub fn exit_terminal(&mut self, host: &mut dyn SessionHost) -> bool {
        if self.state != SessionState::TerminalPaused {
            return false;
        }
        self.world_frozen = false;
        host.set_player_input_enabled(true);
        host.set_hotkeys_enabled(true);
        self.set_state(SessionState::Normal);
        true
    }

    /// Start playing the selected slot. The caller spawns the ghost.
    pub fn begin_playback(&mut self, host: &mut dyn SessionHost) -> Option<Arc<ReplayClip>> {
        if self.state != SessionState::TerminalPaused {
            return None;
        }
        let Some(clip) = self.clip(self.selected_slot).cloned() else {
            self.show_notice(&format!("Slot {} is empty", self.selected_slot + 1));
            return None;
        };
        self.world_frozen = false;
        host.set_player_input_enabled(true);
        host.set_hotkeys_enabled(true);
        self.set_state(SessionState::Playback);
        Some(clip)
    }

    pub fn finish_playback(&mut self) {
        if self.state == SessionState::Playback {
            self.set_state(SessionState::Normal);
        }
    }

    pub fn show_notice(&mut self, text: &str) {
        self.notice.start(NOTICE_DURATION);
        self.notice_text = Some(text.to_string());
        self.events.push(SessionEvent::Notice(text.to_string()));
    }

    pub fn tick_notice(&mut self, dt: f32) {
        if self.notice.tick(dt) {
            self.notice_text = None;
        }
    }

    pub fn current_notice(&self) -> Option<&str> {
        self.notice_text.as_deref()
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clones::SwitchError;
    use crate::player::PlayerState;
    use crate::replay::StartSnapshot;
    use crate::session::{JsonSaveStore, SaveError};
    use crate::tuning::SimulationContract;

    #[derive(Default)]
    struct FakeLevel {
        restarts: u32,
    }

    impl LevelService for FakeLevel {
        fn current_scene(&self) -> &str {
            "Level1"
        }
        fn restart_current_level(&mut self) {
            self.restarts += 1;
        }
        fn load_level_by_name(&mut self, _name: &str) {
            self.restarts += 1;
        }
    }

    #[derive(Default)]
    struct FakeHost {
        profile: Option<usize>,
        profile_count: usize,
        recording: bool,
        input_enabled: bool,
        hotkeys_enabled: bool,
        held_idle: bool,
    }

    impl FakeHost {
        fn new() -> Self {
            Self {
                profile_count: 3,
                ..Default::default()
            }
        }
    }

    impl SessionHost for FakeHost {
        fn switch_profile(&mut self, index: usize) -> Result<(), SwitchError> {
            if index >= self.profile_count {
                return Err(SwitchError::IndexOutOfRange {
                    index,
                    len: self.profile_count,
                });
            }
            self.profile = Some(index);
            Ok(())
        }
        fn start_recording(&mut self) -> bool {
            self.recording = self.profile.is_some();
            self.recording
        }
        fn set_player_input_enabled(&mut self, enabled: bool) {
            self.input_enabled = enabled;
        }
        fn set_hotkeys_enabled(&mut self, enabled: bool) {
            self.hotkeys_enabled = enabled;
        }
        fn hold_player_idle(&mut self) {
            self.held_idle = true;
        }
    }

    fn clip(profile_id: &str) -> Arc<ReplayClip> {
        let start = StartSnapshot {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            facing_right: true,
            state: PlayerState::Idle,
            profile_id: profile_id.into(),
        };
        Arc::new(ReplayClip::new(0, start, SimulationContract::default()))
    }

    #[test]
    fn test_start_recording_survives_reload() {
        let mut session = TerminalSession::default();
        let mut level = FakeLevel::default();
        let mut saves = JsonSaveStore::in_memory();
        let mut host = FakeHost::new();

        assert!(session.request_restart_and_start_recording(2, &mut level, &mut saves));
        assert_eq!(session.state(), SessionState::EnteringRecord);
        assert_eq!(level.restarts, 1);

        // Second request before the reload lands is dropped
        assert!(!session.request_restart_and_start_recording(1, &mut level, &mut saves));
        assert!(!session.request_restart_and_enter_terminal(&mut level, &mut saves));
        assert_eq!(session.state(), SessionState::EnteringRecord);
        assert_eq!(session.pending_profile(), Some(2));
        assert_eq!(level.restarts, 1);

        session.on_level_loaded(&mut host);
        assert_eq!(session.state(), SessionState::Recording);
        assert_eq!(host.profile, Some(2));
        assert!(host.recording);
        assert!(!host.hotkeys_enabled);
        assert_eq!(session.pending_action(), PendingAction::None);

        // Token is consumed once: the next reload is a plain one
        let mut host = FakeHost::new();
        session.on_level_loaded(&mut host);
        assert_eq!(session.state(), SessionState::Normal);
        assert_eq!(host.profile, Some(0));
        assert!(!host.recording);
    }

    #[test]
    fn test_clip_goes_to_selected_slot_only() {
        let mut session = TerminalSession::default();
        let mut level = FakeLevel::default();
        let mut saves = JsonSaveStore::in_memory();
        assert!(session.select_slot(1));
        session.drain_events();

        let recorded = clip("Leaper");
        session.save_clip_to_selected_slot_and_restart(recorded.clone(), &mut level, &mut saves);

        assert!(Arc::ptr_eq(session.clip(1).unwrap(), &recorded));
        assert!(!session.has_clip(0));
        assert!(!session.has_clip(2));
        assert_eq!(session.slot_profiles(), [None, Some("Leaper"), None]);
        assert_eq!(level.restarts, 1);
        assert_eq!(session.pending_action(), PendingAction::EnterTerminal);
        assert!(session.drain_events().contains(&SessionEvent::SlotsChanged));

        let mut host = FakeHost::new();
        session.on_level_loaded(&mut host);
        assert_eq!(session.state(), SessionState::TerminalPaused);
        assert!(session.is_world_frozen());
        assert!(!host.input_enabled);
    }

    #[test]
    fn test_enter_terminal_persists_spawn() {
        let mut session = TerminalSession::default();
        let mut level = FakeLevel::default();
        let mut saves = JsonSaveStore::in_memory();
        session.set_terminal_spawn("Terminal", false);

        assert!(session.request_restart_and_enter_terminal(&mut level, &mut saves));
        let saved = saves.load(SAVE_FOLDER, SPAWN_SAVE_FILE).unwrap();
        assert_eq!(saved.scene_name, "Level1");
        assert_eq!(saved.spawn_point_key, "Terminal");
        assert!(!saved.facing_right);
    }

    #[test]
    fn test_no_terminal_spawn_means_nothing_saved() {
        let mut session = TerminalSession::default();
        let mut level = FakeLevel::default();
        let mut saves = JsonSaveStore::in_memory();
        session.request_restart_and_enter_terminal(&mut level, &mut saves);
        assert!(matches!(
            saves.load(SAVE_FOLDER, SPAWN_SAVE_FILE),
            Err(SaveError::NotFound(_))
        ));
    }

    #[test]
    fn test_slot_selection_clamps_and_locks_while_recording() {
        let mut session = TerminalSession::default();
        assert!(session.select_slot(9));
        assert_eq!(session.selected_slot(), SLOT_COUNT - 1);
        assert!(session.cycle_slot(true));
        assert_eq!(session.selected_slot(), 0);
        assert!(session.cycle_slot(false));
        assert_eq!(session.selected_slot(), SLOT_COUNT - 1);

        let mut level = FakeLevel::default();
        let mut saves = JsonSaveStore::in_memory();
        session.request_restart_and_start_recording(0, &mut level, &mut saves);
        session.on_level_loaded(&mut FakeHost::new());
        assert_eq!(session.state(), SessionState::Recording);
        assert!(!session.select_slot(0));
        assert_eq!(session.selected_slot(), SLOT_COUNT - 1);
    }

    #[test]
    fn test_failed_profile_switch_lands_in_normal() {
        let mut session = TerminalSession::default();
        let mut level = FakeLevel::default();
        let mut saves = JsonSaveStore::in_memory();
        session.request_restart_and_start_recording(7, &mut level, &mut saves);

        let mut host = FakeHost::new();
        session.on_level_loaded(&mut host);
        assert_eq!(session.state(), SessionState::Normal);
        assert!(!host.recording);
        assert!(session.current_notice().is_some());
    }

    #[test]
    fn test_playback_flow() {
        let mut session = TerminalSession::default();
        let mut level = FakeLevel::default();
        let mut saves = JsonSaveStore::in_memory();
        let mut host = FakeHost::new();

        session.request_restart_and_enter_terminal(&mut level, &mut saves);
        session.on_level_loaded(&mut host);
        assert_eq!(session.state(), SessionState::TerminalPaused);

        // Empty slot: a notice, no state change
        assert!(session.begin_playback(&mut host).is_none());
        assert_eq!(session.current_notice(), Some("Slot 1 is empty"));
        session.tick_notice(NOTICE_DURATION + 0.1);
        assert_eq!(session.current_notice(), None);

        session.save_clip_to_selected_slot_and_restart(clip("Hero"), &mut level, &mut saves);
        session.on_level_loaded(&mut host);
        assert!(session.begin_playback(&mut host).is_some());
        assert_eq!(session.state(), SessionState::Playback);
        assert!(!session.is_world_frozen());

        session.finish_playback();
        assert_eq!(session.state(), SessionState::Normal);
    }

    #[test]
    fn test_exit_terminal_only_from_pause() {
        let mut session = TerminalSession::default();
        let mut host = FakeHost::new();
        assert!(!session.exit_terminal(&mut host));

        let mut level = FakeLevel::default();
        let mut saves = JsonSaveStore::in_memory();
        session.request_restart_and_enter_terminal(&mut level, &mut saves);
        session.on_level_loaded(&mut host);
        assert!(session.exit_terminal(&mut host));
        assert_eq!(session.state(), SessionState::Normal);
        assert!(!session.is_world_frozen());
        assert!(host.input_enabled);
    }

    #[test]
    fn test_plain_restart_is_coalesced() {
        let mut session = TerminalSession::default();
        let mut level = FakeLevel::default();
        assert!(session.request_plain_restart(&mut level));
        assert!(!session.request_plain_restart(&mut level));
        assert_eq!(level.restarts, 1);
        session.on_level_loaded(&mut FakeHost::new());
        assert!(!session.restart_in_progress());
    }

    #[test]
    fn test_terminal_reload_applies_default_profile_and_idles_hero() {
        let mut session = TerminalSession::default();
        let mut level = FakeLevel::default();
        let mut saves = JsonSaveStore::in_memory();
        let mut host = FakeHost::new();
        host.profile = Some(2);

        session.request_restart_and_enter_terminal(&mut level, &mut saves);
        session.on_level_loaded(&mut host);
        assert_eq!(session.state(), SessionState::TerminalPaused);
        assert_eq!(host.profile, Some(0));
        assert!(host.held_idle);
        assert!(!host.hotkeys_enabled);
    }

    #[test]
    fn test_stop_during_recording_reload_lands_in_terminal() {
        let mut session = TerminalSession::default();
        let mut level = FakeLevel::default();
        let mut saves = JsonSaveStore::in_memory();

        session.request_restart_and_start_recording(1, &mut level, &mut saves);
        session.save_clip_to_selected_slot_and_restart(clip("Leaper"), &mut level, &mut saves);
        // The stored clip's reload replaces the recording token without a second restart
        assert_eq!(session.pending_action(), PendingAction::EnterTerminal);
        assert_eq!(session.pending_profile(), None);
        assert_eq!(level.restarts, 1);

        let mut host = FakeHost::new();
        session.on_level_loaded(&mut host);
        assert_eq!(session.state(), SessionState::TerminalPaused);
        assert!(!host.recording);
    }
}

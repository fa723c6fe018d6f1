//! Narrow interfaces the session drives

use crate::clones::SwitchError;

use super::{SaveError, SpawnData};

/// Scene transitions. Fade and load timing are the implementor's business.
pub trait LevelService {
    fn current_scene(&self) -> &str;
    fn restart_current_level(&mut self);
    fn load_level_by_name(&mut self, name: &str);
}

/// Key/value persistence, used only for the spawn descriptor
pub trait SaveService {
    fn save(&mut self, data: &SpawnData, folder: &str, file: &str) -> Result<(), SaveError>;
    fn load(&self, folder: &str, file: &str) -> Result<SpawnData, SaveError>;
}

/// The freshly spawned hero, as seen by the session after a reload
pub trait SessionHost {
    fn switch_profile(&mut self, index: usize) -> Result<(), SwitchError>;
    fn start_recording(&mut self) -> bool;
    fn set_player_input_enabled(&mut self, enabled: bool);
    fn set_hotkeys_enabled(&mut self, enabled: bool);
    /// Park the hero in Idle with no motion, bypassing state permissions
    fn hold_player_idle(&mut self);
}

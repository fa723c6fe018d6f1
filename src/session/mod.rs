//! Terminal session - recording, slots and playback across level reloads

mod kiosk;
mod save;
mod services;
mod spawn;
mod systems;
mod terminal;

pub use kiosk::{KioskSignal, TerminalKiosk};
pub use save::{JsonSaveStore, SaveError, SpawnData};
pub use services::{LevelService, SaveService, SessionHost};
pub use spawn::resolve_spawn;
pub use systems::{
    HeroHost, forward_recorder_events, forward_session_events, handle_death_restarts,
    run_player_commands, tick_session_notice, update_terminal_kiosks, world_running,
};
pub use terminal::{PendingAction, SessionEvent, SessionState, TerminalSession};

//! Levels module - database, reload service, and spawning

mod database;
mod manager;
mod spawning;

pub use database::*;
pub use manager::LevelManager;
pub use spawning::*;

use bevy::prelude::*;

use crate::clones::CloneSwitcher;
use crate::constants::{SAVE_FOLDER, SPAWN_SAVE_FILE};
use crate::events::{EventBus, GameEvent};
use crate::player::{CharacterParts, Facing, LevelScoped};
use crate::profiles::ProfileDatabase;
use crate::replay::ReplayRecorder;
use crate::session::{
    HeroHost, JsonSaveStore, SaveService, TerminalSession, resolve_spawn,
};
use crate::tuning::GameplayTuning;
use crate::world::LevelGeometry;

/// Carry out a queued load or restart.
///
/// Level-scoped entities go, the geometry is rebuilt, the hero is placed
/// at the resolved spawn point and the session consumes its pending token
/// against the new hero before it is spawned.
#[allow(clippy::too_many_arguments)]
pub fn load_pending_level(
    mut commands: Commands,
    mut manager: ResMut<LevelManager>,
    levels: Res<LevelDatabase>,
    profiles: Res<ProfileDatabase>,
    tuning: Res<GameplayTuning>,
    saves: Res<JsonSaveStore>,
    mut geometry: ResMut<LevelGeometry>,
    mut session: ResMut<TerminalSession>,
    mut bus: ResMut<EventBus>,
    scoped: Query<Entity, With<LevelScoped>>,
) {
    let Some(requested) = manager.take_pending() else {
        return;
    };
    let Some(level) = levels.get_by_name(&requested).or_else(|| {
        error!("Unknown level {}, loading the first level instead", requested);
        levels.get(0)
    }) else {
        error!("Level database is empty, nothing to load");
        return;
    };

    for entity in &scoped {
        commands.entity(entity).despawn();
    }
    *geometry = level.build_geometry();

    let saved = saves.load(SAVE_FOLDER, SPAWN_SAVE_FILE).ok();
    let spawn = resolve_spawn(&geometry, saved.as_ref());

    let mut parts = CharacterParts::new(&tuning, spawn.position);
    parts.facing = Facing::from_right(spawn.facing_right);
    let mut switcher = CloneSwitcher::default();
    let mut recorder = ReplayRecorder::default();
    {
        let CharacterParts {
            machine,
            input,
            physics,
            facing,
            ..
        } = &mut parts;
        let mut host = HeroHost {
            machine,
            input,
            physics,
            facing,
            switcher: &mut switcher,
            recorder: &mut recorder,
            profiles: &profiles,
            tuning: &tuning,
            bus: &mut bus,
        };
        session.on_level_loaded(&mut host);
    }

    spawn_hero(&mut commands, parts, switcher, recorder);
    spawn_kiosk(&mut commands, &geometry);

    manager.mark_loaded(&level.name);
    info!(
        "Loaded level {} (load #{}), hero at {} {:?}",
        level.name,
        manager.load_count(),
        spawn.key,
        spawn.position
    );
    bus.emit(GameEvent::LevelLoaded {
        scene: level.name.clone(),
        spawn: spawn.key,
    });
}

//! Character and kiosk spawning for a freshly loaded level

use std::sync::Arc;

use bevy::prelude::*;

use crate::clones::CloneSwitcher;
use crate::constants::TERMINAL_SPAWN_KEY;
use crate::player::{
    AnimatorParams, CharacterParts, Ghost, HumanControlled, LevelScoped, Player, RestartPolicy,
};
use crate::profiles::ProfileDatabase;
use crate::replay::{ReplayClip, ReplayPlayback, ReplayRecorder};
use crate::session::TerminalKiosk;
use crate::tuning::GameplayTuning;
use crate::world::LevelGeometry;

/// Spawn the device-driven hero from prepared parts
pub fn spawn_hero(
    commands: &mut Commands,
    parts: CharacterParts,
    switcher: CloneSwitcher,
    recorder: ReplayRecorder,
) -> Entity {
    let CharacterParts {
        machine,
        input,
        physics,
        facing,
        stats,
    } = parts;
    commands
        .spawn((
            (Player, HumanControlled, LevelScoped, RestartPolicy::Allowed),
            (machine, input, physics, facing, stats),
            (switcher, recorder, AnimatorParams::default()),
            Transform::default(),
            Name::new("Hero"),
        ))
        .id()
}

/// Spawn a ghost that replays `clip` from its start snapshot.
///
/// The clip's profile is applied before playback starts. Returns None when
/// that profile can no longer be applied.
pub fn spawn_ghost(
    commands: &mut Commands,
    clip: Arc<ReplayClip>,
    profiles: &ProfileDatabase,
    tuning: &GameplayTuning,
) -> Option<Entity> {
    let mut parts = CharacterParts::new(tuning, clip.start.position);
    let mut switcher = CloneSwitcher::default();
    switcher.set_hotkeys_enabled(false);

    let index = profiles
        .index_of(clip.profile_id())
        .unwrap_or(clip.profile_index);
    if let Err(e) = switcher.switch_to(
        index,
        profiles,
        &mut parts.machine,
        &mut parts.physics,
        &mut parts.facing,
    ) {
        error!("Cannot spawn ghost for clip {}: {}", clip.id, e);
        return None;
    }

    let mut playback = ReplayPlayback::new(tuning.drift());
    let (machine, mut rig) = parts.split();
    playback.start_playback(clip, machine, &mut rig, &tuning.contract());

    let CharacterParts {
        machine,
        input,
        physics,
        facing,
        stats,
    } = parts;
    let entity = commands
        .spawn((
            (Player, Ghost, LevelScoped, RestartPolicy::Forbidden),
            (machine, input, physics, facing, stats),
            (switcher, playback, AnimatorParams::default()),
            Transform::default(),
            Name::new("Ghost"),
        ))
        .id();
    Some(entity)
}

/// Spawn the terminal kiosk if the level has a terminal zone
pub fn spawn_kiosk(commands: &mut Commands, geometry: &LevelGeometry) -> Option<Entity> {
    let zone = geometry.terminal_zone?;
    let facing_right = geometry
        .spawn_point(TERMINAL_SPAWN_KEY)
        .map(|s| s.facing_right)
        .unwrap_or(true);
    if geometry.spawn_point(TERMINAL_SPAWN_KEY).is_none() {
        warn!(
            "Level {} has a terminal but no {} spawn point",
            geometry.name, TERMINAL_SPAWN_KEY
        );
    }
    let entity = commands
        .spawn((
            TerminalKiosk::new(zone, TERMINAL_SPAWN_KEY, facing_right),
            LevelScoped,
            Name::new("Terminal"),
        ))
        .id();
    Some(entity)
}

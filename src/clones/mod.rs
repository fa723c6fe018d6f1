//! CloneSwitcher - swap the active body/profile mid-motion
//!
//! A switch either applies completely or not at all: the index and the
//! profile's body asset are validated before anything is touched. Velocity
//! and facing carry across the swap; jump counters are refilled.

use bevy::prelude::*;
use thiserror::Error;

use crate::player::{Facing, PhysicsControl, StateMachine};
use crate::profiles::{CharacterProfile, ProfileDatabase, apply_profile};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwitchError {
    #[error("Profile index {index} out of range ({len} profiles)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Profile {0} has no body asset")]
    MissingBody(String),
}

/// The body currently attached to a character
#[derive(Debug, Clone, PartialEq)]
pub struct BodyInstance {
    pub asset_id: String,
    pub size: Vec2,
    /// Bumped on every swap so visuals know to rebuild
    pub generation: u32,
}

/// Visual child built from a `BodyInstance`
#[derive(Component, Debug, Clone)]
pub struct BodyVisual {
    pub asset_id: String,
    pub size: Vec2,
    pub generation: u32,
}

#[derive(Component, Debug, Clone)]
pub struct CloneSwitcher {
    current_index: Option<usize>,
    current_id: Option<String>,
    hotkeys_enabled: bool,
    body: Option<BodyInstance>,
    generation: u32,
}

impl Default for CloneSwitcher {
    fn default() -> Self {
        Self {
            current_index: None,
            current_id: None,
            hotkeys_enabled: true,
            body: None,
            generation: 0,
        }
    }
}

impl CloneSwitcher {
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    pub fn body(&self) -> Option<&BodyInstance> {
        self.body.as_ref()
    }

    pub fn hotkeys_enabled(&self) -> bool {
        self.hotkeys_enabled
    }

    pub fn set_hotkeys_enabled(&mut self, enabled: bool) {
        self.hotkeys_enabled = enabled;
    }

    /// Switch to profile `index`.
    pub fn switch_to<'p>(
        &mut self,
        index: usize,
        profiles: &'p ProfileDatabase,
        machine: &mut StateMachine,
        physics: &mut PhysicsControl,
        facing: &mut Facing,
    ) -> Result<&'p CharacterProfile, SwitchError> {
        let profile = profiles.get(index).ok_or(SwitchError::IndexOutOfRange {
            index,
            len: profiles.len(),
        })?;
        let asset = profile
            .body
            .as_ref()
            .ok_or_else(|| SwitchError::MissingBody(profile.id.clone()))?;

        let saved_velocity = physics.velocity;
        let saved_facing = *facing;
        let feet_y = physics.position.y - physics.half_extents().y;

        // Old body goes, new body comes in and rebinds the sensors
        self.generation += 1;
        self.body = Some(BodyInstance {
            asset_id: asset.id.clone(),
            size: asset.size(),
            generation: self.generation,
        });
        physics.set_check_points(asset.anchors());
        physics.position.y = feet_y + physics.half_extents().y;
        *facing = saved_facing;

        apply_profile(profile, machine, physics);
        machine.reset_jump_state_for_switch();

        physics.velocity = saved_velocity;
        self.current_index = Some(index);
        self.current_id = Some(profile.id.clone());

        info!(
            "Switched to profile {} (max_jumps={}, remaining={})",
            profile.id,
            profile.max_jumps,
            machine.remaining_jumps()
        );
        Ok(profile)
    }
}

/// Rebuild body visuals for characters whose body changed
pub fn sync_body_visuals(
    mut commands: Commands,
    switchers: Query<(Entity, &CloneSwitcher, Option<&Children>), Changed<CloneSwitcher>>,
    visuals: Query<&BodyVisual>,
) {
    for (entity, switcher, children) in &switchers {
        let Some(body) = switcher.body() else {
            continue;
        };
        let mut up_to_date = false;
        let children: Vec<Entity> = children.map(|c| c.to_vec()).unwrap_or_default();
        for child in children {
            let Ok(visual) = visuals.get(child) else {
                continue;
            };
            if visual.generation == body.generation {
                up_to_date = true;
            } else {
                commands.entity(child).despawn();
            }
        }
        if !up_to_date {
            commands.spawn((
                BodyVisual {
                    asset_id: body.asset_id.clone(),
                    size: body.size,
                    generation: body.generation,
                },
                Transform::default(),
                ChildOf(entity),
            ));
        }
    }
}

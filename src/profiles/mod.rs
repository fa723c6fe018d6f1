//! Character profiles - one playable clone per profile
//!
//! Each profile bundles movement/jump tuning, a body asset and the set of
//! ability states the clone may enter. Loaded from
//! assets/character_profiles.toml; built-in profiles are used when the file
//! is missing or invalid.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use thiserror::Error;

use crate::constants::*;
use crate::player::{AbilityKind, PhysicsControl, PlayerState, SensorAnchors, StateMachine};

/// Path to character profiles file
pub const PROFILES_FILE: &str = "assets/character_profiles.toml";

/// Errors raised while loading or validating profiles
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("No profiles defined")]
    Empty,

    #[error("Duplicate profile id: {0}")]
    DuplicateId(String),

    #[error("Profile {id} is invalid: {reason}")]
    Invalid { id: String, reason: String },
}

/// Body visual and sensor layout for a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyAsset {
    pub id: String,
    /// Width and height in world units
    pub size: [f32; 2],
    #[serde(default = "default_sensor_inset")]
    pub sensor_inset: f32,
}

fn default_sensor_inset() -> f32 {
    SENSOR_INSET
}

impl BodyAsset {
    pub fn new(id: &str, size: Vec2) -> Self {
        Self {
            id: id.to_string(),
            size: size.to_array(),
            sensor_inset: SENSOR_INSET,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::from_array(self.size)
    }

    pub fn anchors(&self) -> SensorAnchors {
        SensorAnchors::with_inset(self.size(), self.sensor_inset)
    }
}

/// A named configuration bundle for one clone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterProfile {
    pub id: String,
    /// Missing body means the profile cannot be switched to
    pub body: Option<BodyAsset>,

    // Movement
    pub walk_speed: f32,
    pub base_gravity: f32,

    // Jump
    pub jump_force: f32,
    pub max_jumps: u32,
    pub air_speed: f32,
    pub gravity_divider: f32,

    // Dash
    pub dash_force: f32,
    pub dash_duration: f32,

    pub permitted_states: Vec<PlayerState>,
}

impl Default for CharacterProfile {
    fn default() -> Self {
        Self {
            id: "Hero".to_string(),
            body: Some(BodyAsset::new("hero_body", DEFAULT_BODY_SIZE)),
            walk_speed: WALK_SPEED,
            base_gravity: BASE_GRAVITY,
            jump_force: JUMP_FORCE,
            max_jumps: MAX_JUMPS,
            air_speed: AIR_SPEED,
            gravity_divider: GRAVITY_DIVIDER,
            dash_force: DASH_FORCE,
            dash_duration: DASH_DURATION,
            permitted_states: vec![
                PlayerState::Idle,
                PlayerState::Walk,
                PlayerState::Jump,
                PlayerState::WallSlide,
                PlayerState::Dash,
                PlayerState::KnockBack,
                PlayerState::Death,
            ],
        }
    }
}

impl CharacterProfile {
    pub fn permits(&self, state: PlayerState) -> bool {
        self.permitted_states.contains(&state)
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        let invalid = |reason: &str| ProfileError::Invalid {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.id.trim().is_empty() {
            return Err(invalid("empty id"));
        }
        if self.walk_speed < 0.0 || self.air_speed < 0.0 {
            return Err(invalid("negative speed"));
        }
        if self.gravity_divider <= 0.0 {
            return Err(invalid("gravity_divider must be positive"));
        }
        if self.dash_duration < 0.0 {
            return Err(invalid("negative dash_duration"));
        }
        if self.permits(PlayerState::Ignore) {
            return Err(invalid("Ignore cannot be permitted"));
        }
        if let Some(body) = &self.body {
            if body.size[0] <= 0.0 || body.size[1] <= 0.0 {
                return Err(invalid("body size must be positive"));
            }
        }
        Ok(())
    }
}

/// Push a profile's tuning and permission set into a character.
///
/// Every constant is applied before the permission set, and a current state
/// the profile does not permit is force-reset to Idle.
pub fn apply_profile(
    profile: &CharacterProfile,
    machine: &mut StateMachine,
    physics: &mut PhysicsControl,
) {
    physics.set_base_gravity(profile.base_gravity);

    for ability in machine.abilities_mut() {
        match &mut ability.kind {
            AbilityKind::Move(walk) => walk.walk_speed = profile.walk_speed,
            AbilityKind::MultiJump(jump) => {
                jump.jump_force = profile.jump_force;
                jump.max_jumps = profile.max_jumps;
                jump.air_speed = profile.air_speed;
                jump.gravity_divider = profile.gravity_divider;
            }
            AbilityKind::Dash(dash) => {
                dash.dash_force = profile.dash_force;
                dash.dash_duration = profile.dash_duration;
            }
            _ => {}
        }
        ability.permitted = profile.permits(ability.state());
    }

    if !profile.permits(machine.current()) {
        machine.force_change(PlayerState::Idle);
        physics.enable_gravity();
    }
}

#[derive(Debug, Deserialize)]
struct ProfileFile {
    #[serde(rename = "profile", default)]
    profiles: Vec<CharacterProfile>,
}

/// Ordered profile list; index = hotkey slot
#[derive(Resource, Debug, Clone)]
pub struct ProfileDatabase {
    profiles: Vec<CharacterProfile>,
}

impl Default for ProfileDatabase {
    fn default() -> Self {
        Self::default_profiles()
    }
}

impl ProfileDatabase {
    pub fn new(profiles: Vec<CharacterProfile>) -> Result<Self, ProfileError> {
        if profiles.is_empty() {
            return Err(ProfileError::Empty);
        }
        let mut seen = HashSet::new();
        for profile in &profiles {
            profile.validate()?;
            if !seen.insert(profile.id.as_str()) {
                return Err(ProfileError::DuplicateId(profile.id.clone()));
            }
        }
        Ok(Self { profiles })
    }

    /// Load profiles from file, falling back to the built-in set on error
    pub fn load_from_file(path: &str) -> Self {
        match Self::try_load(path) {
            Ok(db) => {
                info!("Loaded {} character profiles from {}", db.len(), path);
                db
            }
            Err(e) => {
                warn!("Could not load character profiles from {}: {}, using defaults", path, e);
                Self::default_profiles()
            }
        }
    }

    pub fn try_load(path: &str) -> Result<Self, ProfileError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ProfileError> {
        let file: ProfileFile = toml::from_str(content)?;
        Self::new(file.profiles)
    }

    /// Built-in clones: an all-rounder, a high jumper and a dasher
    pub fn default_profiles() -> Self {
        let hero = CharacterProfile::default();
        let leaper = CharacterProfile {
            id: "Leaper".to_string(),
            body: Some(BodyAsset::new("leaper_body", Vec2::new(0.7, 1.4))),
            walk_speed: 3.5,
            jump_force: 14.0,
            max_jumps: 3,
            permitted_states: hero
                .permitted_states
                .iter()
                .copied()
                .filter(|s| *s != PlayerState::Dash)
                .collect(),
            ..hero.clone()
        };
        let dasher = CharacterProfile {
            id: "Dasher".to_string(),
            body: Some(BodyAsset::new("dasher_body", Vec2::new(0.9, 1.2))),
            walk_speed: 5.0,
            max_jumps: 1,
            dash_force: 24.0,
            permitted_states: hero
                .permitted_states
                .iter()
                .copied()
                .filter(|s| *s != PlayerState::WallSlide)
                .collect(),
            ..hero.clone()
        };
        Self {
            profiles: vec![hero, leaper, dasher],
        }
    }

    pub fn get(&self, index: usize) -> Option<&CharacterProfile> {
        self.profiles.get(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.profiles.iter().position(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CharacterProfile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::CharacterParts;
    use crate::tuning::GameplayTuning;

    #[test]
    fn test_parse_profiles() {
        let content = r#"
[[profile]]
id = "Tiny"
walk_speed = 3.0
base_gravity = 6.0
jump_force = 10.0
max_jumps = 4
air_speed = 4.0
gravity_divider = 2.0
dash_force = 18.0
dash_duration = 0.15
permitted_states = ["Idle", "Walk", "Jump", "Death"]

[profile.body]
id = "tiny_body"
size = [0.5, 0.8]
"#;
        let db = ProfileDatabase::parse(content).unwrap();
        assert_eq!(db.len(), 1);
        let tiny = db.get(0).unwrap();
        assert_eq!(tiny.max_jumps, 4);
        assert!(tiny.permits(PlayerState::Jump));
        assert!(!tiny.permits(PlayerState::Dash));
        let body = tiny.body.as_ref().unwrap();
        assert_eq!(body.size(), Vec2::new(0.5, 0.8));
        assert_eq!(body.sensor_inset, SENSOR_INSET);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let hero = CharacterProfile::default();
        let result = ProfileDatabase::new(vec![hero.clone(), hero]);
        assert!(matches!(result, Err(ProfileError::DuplicateId(_))));
    }

    #[test]
    fn test_empty_and_missing_file_fall_back() {
        assert!(matches!(ProfileDatabase::parse(""), Err(ProfileError::Empty)));
        let db = ProfileDatabase::load_from_file("does/not/exist.toml");
        assert_eq!(db.len(), 3);
        assert_eq!(db.index_of("Dasher"), Some(2));
    }

    #[test]
    fn test_ignore_state_cannot_be_permitted() {
        let mut profile = CharacterProfile::default();
        profile.permitted_states.push(PlayerState::Ignore);
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_apply_profile_sets_permissions_and_forces_idle() {
        let tuning = GameplayTuning::default();
        let mut parts = CharacterParts::new(&tuning, Vec2::ZERO);
        let db = ProfileDatabase::default_profiles();
        {
            let (machine, mut rig) = parts.split();
            assert!(machine.try_start_dash(&mut rig));
        }
        assert_eq!(parts.state(), PlayerState::Dash);

        let leaper = db.get(1).unwrap();
        apply_profile(leaper, &mut parts.machine, &mut parts.physics);

        assert_eq!(parts.state(), PlayerState::Idle);
        assert!(!parts.machine.is_permitted(PlayerState::Dash));
        assert!(parts.physics.gravity_enabled());
        assert_eq!(parts.physics.base_gravity(), leaper.base_gravity);
        assert_eq!(parts.machine.jump_ability().unwrap().max_jumps, 3);
    }
}

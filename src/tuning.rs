//! Global gameplay tuning settings and the simulation contract

use bevy::log::warn;
use bevy::prelude::{Resource, Vec2};
use serde::{Deserialize, Serialize};

use crate::constants::*;

// Serde default functions for fields added after the first config shipped
fn default_wall_slide_speed() -> f32 {
    WALL_SLIDE_SPEED
}
fn default_knockback_duration() -> f32 {
    KNOCKBACK_DURATION
}
fn default_knockback_force_x() -> f32 {
    KNOCKBACK_FORCE.x
}
fn default_knockback_force_y() -> f32 {
    KNOCKBACK_FORCE.y
}
fn default_damage_flash_time() -> f32 {
    DAMAGE_FLASH_TIME
}
fn default_death_restart_delay() -> f32 {
    DEATH_RESTART_DELAY
}
fn default_max_health() -> i32 {
    MAX_HEALTH
}

/// Path to global gameplay tuning config
pub const GAMEPLAY_TUNING_FILE: &str = "config/gameplay_tuning.json";

/// Serializable tuning values stored in config
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameplayTuning {
    pub fixed_dt: f32,
    pub keyframe_every_ticks: u32,
    pub max_recording_seconds: f32,
    pub drift_position_epsilon: f32,
    pub drift_hard_snap: f32,
    pub drift_pull_strength: f32,
    pub coyote_time: f32,
    pub min_air_time: f32,
    pub jump_hold_time: f32,
    pub max_fall_speed: f32,
    #[serde(default = "default_wall_slide_speed")]
    pub wall_slide_speed: f32,
    #[serde(default = "default_knockback_duration")]
    pub knockback_duration: f32,
    #[serde(default = "default_knockback_force_x")]
    pub knockback_force_x: f32,
    #[serde(default = "default_knockback_force_y")]
    pub knockback_force_y: f32,
    #[serde(default = "default_damage_flash_time")]
    pub damage_flash_time: f32,
    #[serde(default = "default_death_restart_delay")]
    pub death_restart_delay: f32,
    #[serde(default = "default_max_health")]
    pub max_health: i32,
}

impl Default for GameplayTuning {
    fn default() -> Self {
        Self {
            fixed_dt: FIXED_DT,
            keyframe_every_ticks: KEYFRAME_EVERY_TICKS,
            max_recording_seconds: MAX_RECORDING_SECONDS,
            drift_position_epsilon: DRIFT_POSITION_EPSILON,
            drift_hard_snap: DRIFT_HARD_SNAP,
            drift_pull_strength: DRIFT_PULL_STRENGTH,
            coyote_time: COYOTE_TIME,
            min_air_time: MIN_AIR_TIME,
            jump_hold_time: JUMP_HOLD_TIME,
            max_fall_speed: MAX_FALL_SPEED,
            wall_slide_speed: default_wall_slide_speed(),
            knockback_duration: default_knockback_duration(),
            knockback_force_x: default_knockback_force_x(),
            knockback_force_y: default_knockback_force_y(),
            damage_flash_time: default_damage_flash_time(),
            death_restart_delay: default_death_restart_delay(),
            max_health: default_max_health(),
        }
    }
}

impl GameplayTuning {
    /// Reject values that would break replay or the ability timers
    pub fn validate(&self) -> Result<(), String> {
        if self.fixed_dt <= 0.0 {
            return Err(format!("fixed_dt must be positive, got {}", self.fixed_dt));
        }
        if self.keyframe_every_ticks == 0 {
            return Err("keyframe_every_ticks must be at least 1".to_string());
        }
        if self.max_recording_seconds <= 0.0 {
            return Err(format!(
                "max_recording_seconds must be positive, got {}",
                self.max_recording_seconds
            ));
        }
        if !(0.0..=1.0).contains(&self.drift_pull_strength) {
            return Err(format!(
                "drift_pull_strength must be within 0..=1, got {}",
                self.drift_pull_strength
            ));
        }
        if self.drift_position_epsilon < 0.0 || self.drift_hard_snap <= self.drift_position_epsilon {
            return Err(format!(
                "drift thresholds must satisfy 0 <= epsilon < hard_snap, got {} / {}",
                self.drift_position_epsilon, self.drift_hard_snap
            ));
        }
        if self.max_health <= 0 {
            return Err(format!("max_health must be positive, got {}", self.max_health));
        }
        Ok(())
    }

    pub fn drift(&self) -> DriftTuning {
        DriftTuning {
            position_epsilon: self.drift_position_epsilon,
            hard_snap_threshold: self.drift_hard_snap,
            pull_strength: self.drift_pull_strength,
        }
    }

    pub fn knockback_force(&self) -> Vec2 {
        Vec2::new(self.knockback_force_x, self.knockback_force_y)
    }

    /// Recording cap in ticks: round(max seconds / fixed dt)
    pub fn max_recording_ticks(&self) -> u32 {
        (self.max_recording_seconds / self.fixed_dt).round() as u32
    }

    pub fn contract(&self) -> SimulationContract {
        SimulationContract {
            fixed_dt: self.fixed_dt,
            ..SimulationContract::default()
        }
    }
}

/// Drift correction thresholds used by playback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftTuning {
    pub position_epsilon: f32,
    pub hard_snap_threshold: f32,
    pub pull_strength: f32,
}

impl Default for DriftTuning {
    fn default() -> Self {
        GameplayTuning::default().drift()
    }
}

/// Simulation settings a clip was recorded under.
///
/// Playback under a different contract is allowed but logged, since
/// replay is only exact when the contract matches.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct SimulationContract {
    pub fixed_dt: f32,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
}

impl Default for SimulationContract {
    fn default() -> Self {
        Self {
            fixed_dt: FIXED_DT,
            velocity_iterations: VELOCITY_ITERATIONS,
            position_iterations: POSITION_ITERATIONS,
        }
    }
}

impl SimulationContract {
    pub fn matches(&self, other: &SimulationContract) -> bool {
        (self.fixed_dt - other.fixed_dt).abs() < 1e-6
            && self.velocity_iterations == other.velocity_iterations
            && self.position_iterations == other.position_iterations
    }
}

pub fn load_gameplay_tuning_from_file(path: &str) -> Result<GameplayTuning, String> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
    let tuning: GameplayTuning =
        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse {}: {}", path, e))?;
    tuning
        .validate()
        .map_err(|e| format!("Invalid tuning in {}: {}", path, e))?;
    Ok(tuning)
}

/// Load the global tuning file, falling back to compiled defaults
pub fn load_global_tuning() -> GameplayTuning {
    match load_gameplay_tuning_from_file(GAMEPLAY_TUNING_FILE) {
        Ok(tuning) => tuning,
        Err(err) => {
            warn!("{}, using defaults", err);
            GameplayTuning::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(GameplayTuning::default().validate().is_ok());
    }

    #[test]
    fn test_max_recording_ticks_rounds() {
        let tuning = GameplayTuning::default();
        assert_eq!(tuning.max_recording_ticks(), 3000);

        let short = GameplayTuning {
            max_recording_seconds: 0.05,
            fixed_dt: 0.02,
            ..GameplayTuning::default()
        };
        // 2.5 rounds away from zero
        assert_eq!(short.max_recording_ticks(), 3);
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let json = r#"{
            "fixed_dt": 0.02,
            "keyframe_every_ticks": 5,
            "max_recording_seconds": 30.0,
            "drift_position_epsilon": 0.1,
            "drift_hard_snap": 0.5,
            "drift_pull_strength": 0.25,
            "coyote_time": 0.1,
            "min_air_time": 0.1,
            "jump_hold_time": 0.2,
            "max_fall_speed": 10.0
        }"#;
        let tuning: GameplayTuning = serde_json::from_str(json).unwrap();
        assert_eq!(tuning.keyframe_every_ticks, 5);
        assert_eq!(tuning.wall_slide_speed, WALL_SLIDE_SPEED);
        assert_eq!(tuning.max_health, MAX_HEALTH);
    }

    #[test]
    fn test_inverted_drift_thresholds_rejected() {
        let tuning = GameplayTuning {
            drift_position_epsilon: 1.0,
            drift_hard_snap: 0.5,
            ..GameplayTuning::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_contract_matches() {
        let a = SimulationContract::default();
        let mut b = a;
        assert!(a.matches(&b));
        b.position_iterations += 1;
        assert!(!a.matches(&b));
    }
}

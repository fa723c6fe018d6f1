//! Tunable constants for ghostline
//!
//! Compiled defaults. Most of these can be overridden through
//! `config/gameplay_tuning.json` or the character profile database.

use bevy::prelude::*;

// =============================================================================
// SIMULATION
// =============================================================================

pub const FIXED_DT: f32 = 0.02; // Seconds per fixed tick (50 Hz)
pub const VELOCITY_ITERATIONS: u32 = 8;
pub const POSITION_ITERATIONS: u32 = 3;
pub const GRAVITY: f32 = 9.81; // World gravity before per-body scale
pub const PIXELS_PER_UNIT: f32 = 32.0; // World units to render pixels
pub const COLLISION_EPSILON: f32 = 0.001; // Skin width for collision resolution

// =============================================================================
// BODY / SENSORS
// =============================================================================

pub const DEFAULT_BODY_SIZE: Vec2 = Vec2::new(0.8, 1.6);
pub const GROUND_RAY_LENGTH: f32 = 0.1; // Ray length below the foot anchors
pub const WALL_RAY_LENGTH: f32 = 0.1; // Ray length beyond the wall anchors
pub const SENSOR_INSET: f32 = 0.05; // Anchors sit this far inside the body edge

// =============================================================================
// GAME FEEL
// =============================================================================

pub const COYOTE_TIME: f32 = 0.1; // Seconds after leaving ground you can still jump
pub const COYOTE_DISARMED: f32 = -1.0; // Coyote value after a jump is spent
pub const MIN_AIR_TIME: f32 = 0.1; // Jump can't land before this much air time
pub const JUMP_HOLD_TIME: f32 = 0.2; // Max seconds jump force is sustained while held
pub const MAX_FALL_SPEED: f32 = 10.0; // Downward speed clamp in the jump state
pub const WALL_SLIDE_SPEED: f32 = 2.0; // Max fall speed while sliding on a wall
pub const STICK_DEADZONE: f32 = 0.25; // Analog stick deadzone

// =============================================================================
// PROFILE DEFAULTS
// =============================================================================

pub const WALK_SPEED: f32 = 4.0;
pub const BASE_GRAVITY: f32 = 8.0; // Gravity scale while grounded or rising
pub const JUMP_FORCE: f32 = 12.0;
pub const MAX_JUMPS: u32 = 2;
pub const AIR_SPEED: f32 = 5.0;
pub const GRAVITY_DIVIDER: f32 = 2.0; // Falling gravity = base / divider
pub const DASH_FORCE: f32 = 20.0;
pub const DASH_DURATION: f32 = 0.2;

// =============================================================================
// DAMAGE
// =============================================================================

pub const MAX_HEALTH: i32 = 3;
pub const HAZARD_DAMAGE: i32 = 1;
pub const KNOCKBACK_DURATION: f32 = 0.3;
pub const KNOCKBACK_FORCE: Vec2 = Vec2::new(6.0, 8.0);
pub const DAMAGE_FLASH_TIME: f32 = 1.0; // Invulnerability window after a hit
pub const DEATH_RESTART_DELAY: f32 = 1.0; // Seconds on the death pose before restart

// =============================================================================
// REPLAY
// =============================================================================

pub const KEYFRAME_EVERY_TICKS: u32 = 10;
pub const MAX_RECORDING_SECONDS: f32 = 60.0;
pub const DRIFT_POSITION_EPSILON: f32 = 0.15; // At or below: no correction
pub const DRIFT_HARD_SNAP: f32 = 0.75; // At or above: assign keyframe state
pub const DRIFT_PULL_STRENGTH: f32 = 0.5; // Blend factor for soft correction

// =============================================================================
// TERMINAL SESSION
// =============================================================================

pub const SLOT_COUNT: usize = 3;
pub const NOTICE_DURATION: f32 = 1.8; // Seconds a terminal notice stays up
pub const DEFAULT_SCENE: &str = "Level1";
pub const DEFAULT_SPAWN_KEY: &str = "Start";
pub const TERMINAL_SPAWN_KEY: &str = "Terminal";
pub const SAVE_FOLDER: &str = "SaveFiles";
pub const SPAWN_SAVE_FILE: &str = "SpawnPoint.json";

// =============================================================================
// FILES
// =============================================================================

pub const LEVELS_FILE: &str = "assets/levels.txt";
pub const SAVE_ROOT: &str = "."; // Save folders are created under this directory

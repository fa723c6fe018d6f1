//! Scenario testing system for deterministic gameplay testing
//!
//! Provides infrastructure for running scripted input scenarios against
//! a headless app to verify movement, clone switching and the terminal
//! record/playback flow.

pub mod assertions;
pub mod input;
pub mod parser;
pub mod runner;

pub use assertions::{AssertionError, WorldState, check_sequence, check_state};
pub use input::{CurrentInputState, ScriptedInputs};
pub use parser::{
    ExpectedEvent, FrameInput, InputSnapshot, StateAssertion, TestDefinition, TestExpectations,
    TestSetup,
};
pub use runner::{TestResult, run_test, run_test_with_levels, snapshot_world};

/// Default path for test scenarios
pub const SCENARIOS_DIR: &str = "tests/scenarios";

/// Default path for test levels
pub const TEST_LEVELS_FILE: &str = "config/test_levels.txt";

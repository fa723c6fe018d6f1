//! TOML scenario file parsing

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Complete scenario definition from a TOML file
#[derive(Debug, Deserialize)]
pub struct TestDefinition {
    pub name: String,
    pub description: Option<String>,
    pub setup: TestSetup,
    #[serde(default)]
    pub input: Vec<FrameInput>,
    pub expect: TestExpectations,
}

/// Scenario setup
#[derive(Debug, Deserialize)]
pub struct TestSetup {
    pub level: String,
    /// Profile hotkey applied before frame 0 (1-based, like the number keys)
    pub profile_key: Option<u8>,
    /// Optional gameplay tuning file; compiled defaults otherwise
    pub tuning: Option<String>,
}

/// Input changes at a specific frame. Frames are fixed ticks counted from
/// the first tick after the level loaded.
#[derive(Debug, Deserialize)]
pub struct FrameInput {
    pub frame: u64,
    /// Terminal and hotkey commands, e.g. "digit:2", "play", "exit", "stop"
    #[serde(default)]
    pub commands: Vec<String>,
    /// Held input per scripted character (only "hero" is scriptable)
    #[serde(flatten)]
    pub inputs: HashMap<String, InputSnapshot>,
}

/// Held state of the device for one character. Unset fields keep their
/// previous value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputSnapshot {
    #[serde(default)]
    pub move_x: Option<f32>,
    #[serde(default)]
    pub move_left: Option<bool>,
    #[serde(default)]
    pub move_right: Option<bool>,
    #[serde(default)]
    pub jump: Option<bool>,
    #[serde(default)]
    pub dash: Option<bool>,
    #[serde(default)]
    pub interact: Option<bool>,
}

impl InputSnapshot {
    /// Effective move_x, if this snapshot sets movement at all
    pub fn effective_move_x(&self) -> Option<f32> {
        if let Some(x) = self.move_x {
            return Some(x);
        }
        if self.move_left.is_none() && self.move_right.is_none() {
            return None;
        }
        let mut x = 0.0;
        if self.move_left.unwrap_or(false) {
            x -= 1.0;
        }
        if self.move_right.unwrap_or(false) {
            x += 1.0;
        }
        Some(x)
    }
}

/// Expected scenario outcomes
#[derive(Debug, Default, Deserialize)]
pub struct TestExpectations {
    #[serde(default)]
    pub sequence: Vec<ExpectedEvent>,
    /// Multiple state assertions at different frames (uses [[expect.state]] TOML syntax)
    #[serde(default)]
    pub state: Vec<StateAssertion>,
}

/// Expected event in sequence, matched by bus event kind
#[derive(Debug, Deserialize)]
pub struct ExpectedEvent {
    pub event: String,
    /// Substring of the event's value, e.g. "Hero:Jump" for StateChanged
    pub value: Option<String>,
    pub frame_min: Option<u64>,
    pub frame_max: Option<u64>,
}

/// State assertion after simulation
#[derive(Debug, Clone, Deserialize)]
pub struct StateAssertion {
    pub after_frame: u64,
    #[serde(default)]
    pub checks: Vec<String>,
}

/// Parse a scenario file from path
pub fn parse_test_file(path: &Path) -> Result<TestDefinition, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    toml::from_str(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let toml = r#"
name = "Jump"
[setup]
level = "flat"
profile_key = 2

[[input]]
frame = 0
hero = { move_right = true, jump = true }

[[input]]
frame = 5
commands = ["digit:1"]
hero = { jump = false }

[[expect.sequence]]
event = "StateChanged"
value = "Hero:Jump"
frame_max = 2

[[expect.state]]
after_frame = 20
checks = ["hero.state = Walk"]
"#;
        let def: TestDefinition = toml::from_str(toml).unwrap();
        assert_eq!(def.name, "Jump");
        assert_eq!(def.setup.level, "flat");
        assert_eq!(def.setup.profile_key, Some(2));
        assert_eq!(def.input.len(), 2);

        let hero = &def.input[0].inputs["hero"];
        assert_eq!(hero.effective_move_x(), Some(1.0));
        assert_eq!(hero.jump, Some(true));

        assert_eq!(def.input[1].commands, vec!["digit:1".to_string()]);
        assert_eq!(def.input[1].inputs["hero"].effective_move_x(), None);
        assert_eq!(def.expect.sequence[0].value.as_deref(), Some("Hero:Jump"));
    }
}

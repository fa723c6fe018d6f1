//! Assertion checking for scenario expectations

use std::collections::HashMap;

use super::parser::{ExpectedEvent, StateAssertion};
use crate::events::BusEvent;

/// Error when an assertion fails
#[derive(Debug)]
pub struct AssertionError {
    pub message: String,
    pub expected: String,
    pub actual: String,
}

impl std::fmt::Display for AssertionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n    Expected: {}\n    Actual: {}", self.message, self.expected, self.actual)
    }
}

/// Captured event with timing info
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub frame: u64,
    pub event_type: String,
    pub value: String,
}

impl CapturedEvent {
    pub fn from_bus_event(frame: u64, event: &BusEvent) -> Self {
        Self {
            frame,
            event_type: event.event.kind().to_string(),
            value: event.event.value(),
        }
    }
}

/// Check if captured events match expected sequence
pub fn check_sequence(expected: &[ExpectedEvent], captured: &[CapturedEvent]) -> Result<(), AssertionError> {
    let mut captured_idx = 0;

    for (i, exp) in expected.iter().enumerate() {
        // Find matching event starting from current position
        let found = captured[captured_idx..].iter().enumerate().find(|(_, cap)| {
            cap.event_type == exp.event
                && exp.value.as_ref().is_none_or(|v| cap.value.contains(v.as_str()))
        });

        match found {
            Some((offset, cap)) => {
                if let Some(min) = exp.frame_min {
                    if cap.frame < min {
                        return Err(AssertionError {
                            message: format!("Event #{} '{}' occurred too early", i + 1, exp.event),
                            expected: format!("frame >= {}", min),
                            actual: format!("frame {}", cap.frame),
                        });
                    }
                }
                if let Some(max) = exp.frame_max {
                    if cap.frame > max {
                        return Err(AssertionError {
                            message: format!("Event #{} '{}' occurred too late", i + 1, exp.event),
                            expected: format!("frame <= {}", max),
                            actual: format!("frame {}", cap.frame),
                        });
                    }
                }
                captured_idx += offset + 1;
            }
            None => {
                let value_str = exp.value.as_ref().map(|v| format!(" ({})", v)).unwrap_or_default();
                return Err(AssertionError {
                    message: format!("Event #{} '{}'{} not found", i + 1, exp.event, value_str),
                    expected: format!("'{}' event in sequence", exp.event),
                    actual: format!("events after position {}: {:?}",
                        captured_idx,
                        captured[captured_idx..]
                            .iter()
                            .map(|e| format!("{}({})", e.event_type, e.value))
                            .collect::<Vec<_>>()
                    ),
                });
            }
        }
    }

    Ok(())
}

/// Character state for assertions
#[derive(Debug, Clone, Default)]
pub struct EntityState {
    pub x: f32,
    pub y: f32,
    pub velocity_x: f32,
    pub velocity_y: f32,
    pub grounded: bool,
    pub state: String,
    pub remaining_jumps: u32,
    pub health: i32,
    pub profile: Option<String>,
    pub playing: bool,
    pub hard_snaps: u32,
}

/// Session state for assertions
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub state: String,
    pub selected_slot: usize,
    /// Profile id per slot, None when empty
    pub slots: Vec<Option<String>>,
    pub frozen: bool,
    pub notice: Option<String>,
}

/// World state for assertions
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    /// "hero" and "ghost" (first ghost)
    pub entities: HashMap<String, EntityState>,
    pub session: SessionSnapshot,
    pub scene: String,
    pub load_count: u32,
}

/// Parse a check string into (path, operator, value)
fn parse_check(check: &str) -> Option<(&str, &str, &str)> {
    // Try operators in order of specificity (>= before >, etc.)
    for op in &[">=", "<=", "!=", "=", ">", "<"] {
        if let Some(idx) = check.find(op) {
            let path = check[..idx].trim();
            let value = check[idx + op.len()..].trim();
            return Some((path, op, value));
        }
    }
    None
}

fn invalid_path(path: &str) -> AssertionError {
    AssertionError {
        message: format!("Unknown check path: {}", path),
        expected: "a known property".to_string(),
        actual: path.to_string(),
    }
}

/// Check state assertions against world state
pub fn check_state(assertion: &StateAssertion, state: &WorldState) -> Result<(), AssertionError> {
    for check in &assertion.checks {
        let (path, operator, expected_value) = parse_check(check).ok_or_else(|| AssertionError {
            message: format!("Invalid check syntax: {}", check),
            expected: "format: 'entity.property = value' or 'entity.property > value'".to_string(),
            actual: check.clone(),
        })?;

        let path_parts: Vec<&str> = path.split('.').collect();

        match path_parts[..] {
            ["scene"] => check_text(path, &state.scene, operator, expected_value)?,
            ["loads"] => check_float_comparison(path, state.load_count as f32, operator, expected_value)?,
            ["session", property, ..] => {
                let session = &state.session;
                match property {
                    "state" => check_text(path, &session.state, operator, expected_value)?,
                    "frozen" => check_text(path, &session.frozen.to_string(), operator, expected_value)?,
                    "selected_slot" => check_float_comparison(path, session.selected_slot as f32, operator, expected_value)?,
                    "notice" => check_text(path, session.notice.as_deref().unwrap_or("none"), operator, expected_value)?,
                    "slots" => {
                        let index: usize = path_parts
                            .get(2)
                            .and_then(|i| i.parse().ok())
                            .ok_or_else(|| invalid_path(path))?;
                        let slot = session.slots.get(index).ok_or_else(|| invalid_path(path))?;
                        check_text(path, slot.as_deref().unwrap_or("none"), operator, expected_value)?;
                    }
                    _ => return Err(invalid_path(path)),
                }
            }
            [entity_id, property] => {
                let entity = state.entities.get(entity_id).ok_or_else(|| AssertionError {
                    message: format!("Entity '{}' not found", entity_id),
                    expected: format!("entity '{}'", entity_id),
                    actual: format!("available: {:?}", state.entities.keys().collect::<Vec<_>>()),
                })?;
                match property {
                    "x" => check_float_comparison(path, entity.x, operator, expected_value)?,
                    "y" => check_float_comparison(path, entity.y, operator, expected_value)?,
                    "velocity_x" => check_float_comparison(path, entity.velocity_x, operator, expected_value)?,
                    "velocity_y" => check_float_comparison(path, entity.velocity_y, operator, expected_value)?,
                    "remaining_jumps" => check_float_comparison(path, entity.remaining_jumps as f32, operator, expected_value)?,
                    "health" => check_float_comparison(path, entity.health as f32, operator, expected_value)?,
                    "hard_snaps" => check_float_comparison(path, entity.hard_snaps as f32, operator, expected_value)?,
                    "grounded" => check_text(path, &entity.grounded.to_string(), operator, expected_value)?,
                    "playing" => check_text(path, &entity.playing.to_string(), operator, expected_value)?,
                    "state" => check_text(path, &entity.state, operator, expected_value)?,
                    "profile" => check_text(path, entity.profile.as_deref().unwrap_or("none"), operator, expected_value)?,
                    _ => return Err(invalid_path(path)),
                }
            }
            _ => return Err(invalid_path(path)),
        }
    }

    Ok(())
}

/// Check text equality (= or !=)
fn check_text(path: &str, actual: &str, operator: &str, expected_str: &str) -> Result<(), AssertionError> {
    let expected = expected_str.trim_matches('"');
    let pass = match operator {
        "=" => actual == expected,
        "!=" => actual != expected,
        _ => {
            return Err(AssertionError {
                message: format!("Operator {} not supported for {}", operator, path),
                expected: "= or !=".to_string(),
                actual: operator.to_string(),
            });
        }
    };

    if !pass {
        return Err(AssertionError {
            message: format!("Check failed: {} {} {}", path, operator, expected),
            expected: format!("{} {} {}", path, operator, expected),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

/// Check float comparison with operator
fn check_float_comparison(path: &str, actual: f32, operator: &str, expected_str: &str) -> Result<(), AssertionError> {
    let value: f32 = expected_str.trim().parse().map_err(|_| AssertionError {
        message: format!("Invalid value for {}", path),
        expected: "number".to_string(),
        actual: expected_str.to_string(),
    })?;

    let pass = match operator {
        ">=" => actual >= value,
        "<=" => actual <= value,
        ">" => actual > value,
        "<" => actual < value,
        "=" => (actual - value).abs() < 0.01,
        "!=" => (actual - value).abs() >= 0.01,
        _ => false,
    };

    if !pass {
        return Err(AssertionError {
            message: format!("Check failed: {} {} {} (actual: {:.3})", path, operator, expected_str, actual),
            expected: format!("{} {} {}", path, operator, value),
            actual: format!("{:.3}", actual),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> WorldState {
        let mut state = WorldState {
            scene: "flat".into(),
            ..Default::default()
        };
        state.entities.insert(
            "hero".into(),
            EntityState {
                x: 3.0,
                state: "Jump".into(),
                remaining_jumps: 1,
                profile: Some("Leaper".into()),
                ..Default::default()
            },
        );
        state.session = SessionSnapshot {
            state: "Recording".into(),
            slots: vec![None, Some("Leaper".into()), None],
            ..Default::default()
        };
        state
    }

    fn assertion(checks: &[&str]) -> StateAssertion {
        StateAssertion {
            after_frame: 0,
            checks: checks.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_checks_pass() {
        let checks = assertion(&[
            "hero.x > 2.5",
            "hero.state = Jump",
            "hero.remaining_jumps = 1",
            "hero.profile = \"Leaper\"",
            "session.state = Recording",
            "session.slots.1 = Leaper",
            "session.slots.0 = none",
            "scene = flat",
        ]);
        assert!(check_state(&checks, &world()).is_ok());
    }

    #[test]
    fn test_checks_fail() {
        assert!(check_state(&assertion(&["hero.state = Idle"]), &world()).is_err());
        assert!(check_state(&assertion(&["ghost.x > 0"]), &world()).is_err());
        assert!(check_state(&assertion(&["hero.wings = 2"]), &world()).is_err());
        assert!(check_state(&assertion(&["session.slots.5 = none"]), &world()).is_err());
    }

    #[test]
    fn test_sequence_order_and_value() {
        let captured = vec![
            CapturedEvent { frame: 1, event_type: "StateChanged".into(), value: "Hero:Walk".into() },
            CapturedEvent { frame: 4, event_type: "StateChanged".into(), value: "Hero:Jump".into() },
        ];
        let expected = |event: &str, value: Option<&str>, max: Option<u64>| ExpectedEvent {
            event: event.into(),
            value: value.map(str::to_string),
            frame_min: None,
            frame_max: max,
        };
        assert!(check_sequence(&[expected("StateChanged", Some("Jump"), None)], &captured).is_ok());
        assert!(check_sequence(
            &[expected("StateChanged", Some("Jump"), None), expected("StateChanged", Some("Walk"), None)],
            &captured
        )
        .is_err());
        assert!(check_sequence(&[expected("StateChanged", Some("Jump"), Some(3))], &captured).is_err());
    }
}

//! Demo report - what was recorded and how faithfully it replayed

use serde::{Deserialize, Serialize};

use crate::events::{BusEvent, CharacterRole, GameEvent};

/// One non-forced state transition, as "From->To"
pub fn describe_transition(event: &BusEvent, role: CharacterRole) -> Option<String> {
    match &event.event {
        GameEvent::StateChanged {
            role: r,
            from,
            to,
            forced: false,
        } if *r == role => Some(format!("{:?}->{:?}", from, to)),
        _ => None,
    }
}

/// Results of a record-and-replay run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemoReport {
    /// RFC 3339 time the run finished
    pub generated_at: String,
    pub seed: u64,
    pub level: String,
    pub profile: String,
    pub recorded_frames: usize,
    pub keyframes: usize,
    /// Ticks the ghost played before finishing
    pub played_ticks: u32,
    pub soft_pulls: u32,
    pub hard_snaps: u32,
    pub max_error: f32,
    pub hero_transitions: Vec<String>,
    pub ghost_transitions: Vec<String>,
    pub transitions_match: bool,
}

impl DemoReport {
    /// Compare the two transition lists and stamp the report
    pub fn finalize(&mut self) {
        self.transitions_match = self.hero_transitions == self.ghost_transitions;
        self.generated_at = chrono::Utc::now().to_rfc3339();
    }

    /// One-line summary for progress output
    pub fn summary(&self) -> String {
        format!(
            "{} on {}: {} frames, {} keyframes, {} soft / {} hard corrections, max error {:.3}, transitions {}",
            self.profile,
            self.level,
            self.recorded_frames,
            self.keyframes,
            self.soft_pulls,
            self.hard_snaps,
            self.max_error,
            if self.transitions_match { "match" } else { "DIFFER" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerState;

    fn changed(role: CharacterRole, forced: bool) -> BusEvent {
        BusEvent {
            tick: 3,
            event: GameEvent::StateChanged {
                role,
                from: PlayerState::Idle,
                to: PlayerState::Walk,
                forced,
            },
        }
    }

    #[test]
    fn test_describe_filters_role_and_forced() {
        assert_eq!(
            describe_transition(&changed(CharacterRole::Hero, false), CharacterRole::Hero),
            Some("Idle->Walk".to_string())
        );
        assert_eq!(describe_transition(&changed(CharacterRole::Hero, true), CharacterRole::Hero), None);
        assert_eq!(describe_transition(&changed(CharacterRole::Ghost, false), CharacterRole::Hero), None);
    }

    #[test]
    fn test_finalize_compares_transitions() {
        let mut report = DemoReport {
            hero_transitions: vec!["Idle->Walk".into()],
            ghost_transitions: vec!["Idle->Walk".into()],
            ..Default::default()
        };
        report.finalize();
        assert!(report.transitions_match);
        assert!(!report.generated_at.is_empty());

        report.ghost_transitions.push("Walk->Idle".into());
        report.finalize();
        assert!(!report.transitions_match);
    }
}

//! StateMachine - permission-gated transitions between abilities

use bevy::prelude::*;

use super::abilities::{
    Ability, AbilityKind, DashAbility, DeathAbility, JumpAbility, KnockBackAbility, MoveAbility,
    WallSlideAbility,
};
use super::{AnimatorParams, CharacterRig, PhysicsControl, PlayerState};
use crate::tuning::GameplayTuning;

/// A state change, in the order it happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: PlayerState,
    pub to: PlayerState,
    /// Set by `force_change` (no permission check, no hooks)
    pub forced: bool,
}

#[derive(Component, Debug, Clone)]
pub struct StateMachine {
    current: PlayerState,
    previous: PlayerState,
    abilities: Vec<Ability>,
    transitions: Vec<Transition>,
}

impl StateMachine {
    /// Machine over the given abilities, starting in Idle
    pub fn new(abilities: Vec<Ability>) -> Self {
        Self {
            current: PlayerState::Idle,
            previous: PlayerState::Idle,
            abilities,
            transitions: Vec::new(),
        }
    }

    /// Every ability bound, timings from tuning, profile values at defaults
    pub fn from_tuning(tuning: &GameplayTuning) -> Self {
        let jump = JumpAbility::with_timings(
            tuning.min_air_time,
            tuning.jump_hold_time,
            tuning.max_fall_speed,
        );

        Self::new(vec![
            Ability::idle(),
            Ability::walk(MoveAbility::default()),
            Ability::jump(jump),
            Ability::wall_slide(WallSlideAbility {
                slide_speed: tuning.wall_slide_speed,
            }),
            Ability::dash(DashAbility::default()),
            Ability::knockback(KnockBackAbility::with_duration(tuning.knockback_duration)),
            Ability::death(DeathAbility::with_delay(tuning.death_restart_delay)),
        ])
    }

    pub fn current(&self) -> PlayerState {
        self.current
    }

    pub fn previous(&self) -> PlayerState {
        self.previous
    }

    fn index_of(&self, state: PlayerState) -> Option<usize> {
        self.abilities.iter().position(|a| a.state() == state)
    }

    pub fn ability(&self, state: PlayerState) -> Option<&Ability> {
        self.abilities.iter().find(|a| a.state() == state)
    }

    pub fn abilities_mut(&mut self) -> impl Iterator<Item = &mut Ability> {
        self.abilities.iter_mut()
    }

    pub fn is_bound(&self, state: PlayerState) -> bool {
        self.index_of(state).is_some()
    }

    /// Bound and permitted
    pub fn is_permitted(&self, state: PlayerState) -> bool {
        self.ability(state).map(|a| a.permitted).unwrap_or(false)
    }

    pub fn set_permitted(&mut self, state: PlayerState, permitted: bool) -> bool {
        match self.index_of(state) {
            Some(idx) => {
                self.abilities[idx].permitted = permitted;
                true
            }
            None => false,
        }
    }

    /// Move to `target` through exit/enter hooks.
    ///
    /// Fails, leaving the state untouched, when no ability is bound to the
    /// target or the target is not permitted.
    pub fn change_state(&mut self, target: PlayerState, rig: &mut CharacterRig) -> bool {
        let Some(target_idx) = self.index_of(target) else {
            debug!("Rejected {} -> {}: no ability bound", self.current, target);
            return false;
        };
        if !self.abilities[target_idx].permitted {
            debug!("Rejected {} -> {}: not permitted", self.current, target);
            return false;
        }

        if let Some(current_idx) = self.index_of(self.current) {
            self.abilities[current_idx].exit(rig);
        }
        self.previous = self.current;
        self.current = target;
        self.transitions.push(Transition {
            from: self.previous,
            to: target,
            forced: false,
        });
        self.abilities[target_idx].enter(rig);
        true
    }

    /// Administrative reset: no permission check, no hooks.
    ///
    /// Every ability's timers and counters are reset so nothing carries over
    /// from the state that was skipped out of.
    pub fn force_change(&mut self, target: PlayerState) {
        self.previous = self.current;
        self.current = target;
        for ability in &mut self.abilities {
            ability.reset_internal();
        }
        self.transitions.push(Transition {
            from: self.previous,
            to: target,
            forced: true,
        });
    }

    /// Run the current ability's decision hook, then apply its request
    pub fn process(&mut self, rig: &mut CharacterRig, dt: f32) {
        let Some(idx) = self.index_of(self.current) else {
            return;
        };
        if let Some(next) = self.abilities[idx].process(rig, dt) {
            self.change_state(next, rig);
        }
    }

    pub fn process_fixed(&mut self, rig: &mut CharacterRig) {
        let Some(idx) = self.index_of(self.current) else {
            return;
        };
        if let Some(next) = self.abilities[idx].process_fixed(rig) {
            self.change_state(next, rig);
        }
    }

    pub fn update_animator(&self, animator: &mut AnimatorParams, physics: &PhysicsControl) {
        for ability in &self.abilities {
            ability.update_animator(self.current, animator, physics);
        }
        animator.grounded = physics.grounded;
    }

    // --- ability entry points -----------------------------------------------

    fn jump_ability_mut(&mut self) -> Option<&mut JumpAbility> {
        self.abilities.iter_mut().find_map(|a| match &mut a.kind {
            AbilityKind::MultiJump(jump) => Some(jump),
            _ => None,
        })
    }

    pub fn jump_ability(&self) -> Option<&JumpAbility> {
        self.abilities.iter().find_map(|a| match &a.kind {
            AbilityKind::MultiJump(jump) => Some(jump),
            _ => None,
        })
    }

    pub fn remaining_jumps(&self) -> u32 {
        self.jump_ability().map(|j| j.remaining_jumps()).unwrap_or(0)
    }

    /// Ground/coyote jump, wall kick, or air jump, in that order
    pub fn try_jump(&mut self, rig: &mut CharacterRig) -> bool {
        if !self.is_permitted(PlayerState::Jump)
            || matches!(self.current, PlayerState::KnockBack | PlayerState::Death)
        {
            return false;
        }

        let wall_kick = self.current == PlayerState::WallSlide;
        if rig.physics.coyote_timer > 0.0 || wall_kick {
            if !self.change_state(PlayerState::Jump, rig) {
                return false;
            }
            if let Some(jump) = self.jump_ability_mut() {
                jump.start_ground_jump(rig, wall_kick);
            }
            return true;
        }

        self.jump_ability_mut()
            .map(|jump| jump.try_air_jump(rig))
            .unwrap_or(false)
    }

    pub fn stop_jump(&mut self) {
        if let Some(jump) = self.jump_ability_mut() {
            jump.stop_jump();
        }
    }

    /// Full jump reset: counters refilled, air-jump window closed
    pub fn reset_jump_state(&mut self) {
        if let Some(jump) = self.jump_ability_mut() {
            jump.reset_jump_state();
        }
    }

    /// Jump reset for a clone switch, see `JumpAbility::reset_for_switch`
    pub fn reset_jump_state_for_switch(&mut self) {
        if let Some(jump) = self.jump_ability_mut() {
            jump.reset_for_switch();
        }
    }

    pub fn try_start_dash(&mut self, rig: &mut CharacterRig) -> bool {
        if !self.is_permitted(PlayerState::Dash)
            || matches!(
                self.current,
                PlayerState::KnockBack | PlayerState::Dash | PlayerState::Death
            )
            || rig.physics.touching_wall
        {
            return false;
        }
        if !self.change_state(PlayerState::Dash, rig) {
            return false;
        }
        for ability in &mut self.abilities {
            if let AbilityKind::Dash(dash) = &mut ability.kind {
                dash.begin(rig);
            }
        }
        true
    }

    /// Knock the character away from `source_x`. Ignored while invulnerable.
    pub fn start_knockback(&mut self, rig: &mut CharacterRig, force: Vec2, source_x: f32) -> bool {
        if !rig.stats.can_take_damage() {
            return false;
        }
        if !self.change_state(PlayerState::KnockBack, rig) {
            return false;
        }
        for ability in &mut self.abilities {
            if let AbilityKind::KnockBack(knockback) = &mut ability.kind {
                knockback.begin(rig, force, source_x);
            }
        }
        true
    }

    /// Damage plus knockback. Death follows immediately unless the
    /// knockback is running, in which case it follows when it ends.
    pub fn hit(&mut self, rig: &mut CharacterRig, damage: i32, force: Vec2, source_x: f32) -> bool {
        if self.current == PlayerState::Death || !rig.stats.can_take_damage() {
            return false;
        }
        self.start_knockback(rig, force, source_x);
        rig.stats.damage(damage);
        if rig.stats.is_dead()
            && self.current != PlayerState::KnockBack
            && !self.change_state(PlayerState::Death, rig)
        {
            warn!("Character died but Death is not permitted in its profile");
        }
        true
    }

    /// True once per elapsed death delay
    pub fn take_restart_request(&mut self) -> bool {
        self.abilities.iter_mut().any(|a| match &mut a.kind {
            AbilityKind::Death(death) => death.take_restart_request(),
            _ => false,
        })
    }

    pub fn drain_transitions(&mut self) -> Vec<Transition> {
        std::mem::take(&mut self.transitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::COYOTE_DISARMED;
    use crate::player::CharacterParts;

    fn parts() -> CharacterParts {
        CharacterParts::new(&GameplayTuning::default(), Vec2::ZERO)
    }

    fn set_max_jumps(parts: &mut CharacterParts, max_jumps: u32) {
        for ability in parts.machine.abilities_mut() {
            if let AbilityKind::MultiJump(jump) = &mut ability.kind {
                jump.max_jumps = max_jumps;
                jump.reset_jump_state();
            }
        }
    }

    #[test]
    fn test_change_to_unbound_state_fails() {
        let mut parts = parts();
        let (machine, mut rig) = parts.split();
        assert!(!machine.change_state(PlayerState::Ignore, &mut rig));
        assert_eq!(machine.current(), PlayerState::Idle);
        assert!(machine.drain_transitions().is_empty());
    }

    #[test]
    fn test_change_to_unpermitted_state_fails_until_permitted() {
        let mut parts = parts();
        let (machine, mut rig) = parts.split();
        machine.set_permitted(PlayerState::Walk, false);
        assert!(!machine.change_state(PlayerState::Walk, &mut rig));
        assert_eq!(machine.current(), PlayerState::Idle);

        machine.set_permitted(PlayerState::Walk, true);
        assert!(machine.change_state(PlayerState::Walk, &mut rig));
        assert_eq!(machine.current(), PlayerState::Walk);
        assert_eq!(machine.previous(), PlayerState::Idle);
    }

    #[test]
    fn test_change_runs_enter_hook() {
        let mut parts = parts();
        parts.physics.velocity.x = 3.0;
        let (machine, mut rig) = parts.split();
        machine.change_state(PlayerState::Walk, &mut rig);
        machine.change_state(PlayerState::Idle, &mut rig);
        // Idle entry stops horizontal motion
        assert_eq!(rig.physics.velocity.x, 0.0);
    }

    #[test]
    fn test_force_change_skips_permission_and_hooks() {
        let mut parts = parts();
        parts.physics.velocity.x = 3.0;
        let (machine, _rig) = parts.split();
        machine.set_permitted(PlayerState::Dash, false);
        machine.force_change(PlayerState::Dash);
        assert_eq!(machine.current(), PlayerState::Dash);
        machine.force_change(PlayerState::Idle);
        assert_eq!(parts.physics.velocity.x, 3.0);

        let transitions = parts.machine.drain_transitions();
        assert_eq!(transitions.len(), 2);
        assert!(transitions.iter().all(|t| t.forced));
    }

    #[test]
    fn test_coyote_jump_then_air_jump() {
        let mut parts = parts();
        parts.physics.coyote_timer = 0.05;
        let (machine, mut rig) = parts.split();

        assert!(machine.try_jump(&mut rig));
        assert_eq!(machine.current(), PlayerState::Jump);
        assert_eq!(machine.remaining_jumps(), 1);
        assert_eq!(rig.physics.coyote_timer, COYOTE_DISARMED);

        // Second immediate call spends the air jump
        assert!(machine.try_jump(&mut rig));
        assert_eq!(machine.remaining_jumps(), 0);
        assert!(!machine.try_jump(&mut rig));
    }

    #[test]
    fn test_single_jump_profile_refuses_second_jump() {
        let mut parts = parts();
        set_max_jumps(&mut parts, 1);
        parts.physics.coyote_timer = 0.05;
        let (machine, mut rig) = parts.split();

        assert!(machine.try_jump(&mut rig));
        assert_eq!(machine.remaining_jumps(), 0);
        assert!(!machine.try_jump(&mut rig));
        assert!(
            !machine
                .jump_ability()
                .map(|j| j.can_activate_additional_jumps())
                .unwrap_or(true)
        );
    }

    #[test]
    fn test_no_air_jump_without_ground_jump() {
        let mut parts = parts();
        parts.physics.coyote_timer = -0.5;
        let (machine, mut rig) = parts.split();
        assert!(!machine.try_jump(&mut rig));
        assert_eq!(machine.current(), PlayerState::Idle);
    }

    #[test]
    fn test_dash_refused_against_wall() {
        let mut parts = parts();
        parts.physics.touching_wall = true;
        let (machine, mut rig) = parts.split();
        assert!(!machine.try_start_dash(&mut rig));
        rig.physics.touching_wall = false;
        assert!(machine.try_start_dash(&mut rig));
        assert!(!machine.try_start_dash(&mut rig));
    }

    #[test]
    fn test_transitions_drain_in_order() {
        let mut parts = parts();
        let (machine, mut rig) = parts.split();
        machine.change_state(PlayerState::Walk, &mut rig);
        machine.change_state(PlayerState::Jump, &mut rig);
        let transitions = machine.drain_transitions();
        assert_eq!(
            transitions,
            vec![
                Transition {
                    from: PlayerState::Idle,
                    to: PlayerState::Walk,
                    forced: false
                },
                Transition {
                    from: PlayerState::Walk,
                    to: PlayerState::Jump,
                    forced: false
                },
            ]
        );
        assert!(machine.drain_transitions().is_empty());
    }

    #[test]
    fn test_from_tuning_carries_timings_into_abilities() {
        let tuning = GameplayTuning {
            min_air_time: 0.3,
            jump_hold_time: 0.5,
            max_fall_speed: 9.0,
            knockback_duration: 0.7,
            death_restart_delay: 2.0,
            ..GameplayTuning::default()
        };
        let machine = StateMachine::from_tuning(&tuning);

        let jump = machine.jump_ability().unwrap();
        assert_eq!(jump.min_air_time, 0.3);
        assert_eq!(jump.jump_hold_time, 0.5);
        assert_eq!(jump.max_fall_speed, 9.0);
        assert_eq!(jump.remaining_jumps(), jump.max_jumps);

        match &machine.ability(PlayerState::KnockBack).unwrap().kind {
            AbilityKind::KnockBack(knockback) => assert_eq!(knockback.duration, 0.7),
            other => panic!("unexpected ability {other:?}"),
        }
        match &machine.ability(PlayerState::Death).unwrap().kind {
            AbilityKind::Death(death) => assert_eq!(death.restart_delay, 2.0),
            other => panic!("unexpected ability {other:?}"),
        }
    }
}

//! One fixed tick of a character: sense, brain, abilities, physics

use bevy::prelude::*;

use super::{Facing, PhysicsControl, PlayerState, PlayerStats, StateMachine};
use crate::constants::HAZARD_DAMAGE;
use crate::input::GatherInput;
use crate::tuning::GameplayTuning;
use crate::world::CollisionWorld;

/// Mutable view of a character's components, handed to ability hooks
pub struct CharacterRig<'a> {
    pub input: &'a mut GatherInput,
    pub physics: &'a mut PhysicsControl,
    pub facing: &'a mut Facing,
    pub stats: &'a mut PlayerStats,
}

/// Advance one character by one fixed tick.
///
/// Input must already be latched (live) or applied from a clip (replay).
pub fn simulate_tick(
    machine: &mut StateMachine,
    rig: &mut CharacterRig,
    world: &dyn CollisionWorld,
    tuning: &GameplayTuning,
) {
    let dt = tuning.fixed_dt;

    // Facing follows input in the steerable states
    if machine.current().follows_input() && rig.input.move_x != 0.0 {
        rig.facing.0 = rig.input.move_x.signum();
    }

    rig.physics.sense(world, rig.facing.0);
    rig.physics.tick_coyote(dt);

    // Brain: consume this tick's edges
    if machine.current() != PlayerState::Death {
        if rig.input.consume_jump_down() {
            machine.try_jump(rig);
        }
        if rig.input.consume_jump_up() {
            machine.stop_jump();
        }
        if rig.input.consume_dash_down() {
            machine.try_start_dash(rig);
        }
    }

    machine.process(rig, dt);
    machine.process_fixed(rig);
    rig.stats.tick(dt);

    rig.physics.integrate(world, dt);

    if let Some(source) = world.hazard_contact(&rig.physics.bounds()) {
        machine.hit(rig, HAZARD_DAMAGE, tuning.knockback_force(), source.x);
    }
}

/// A character outside the ECS, for headless drivers and tests
#[derive(Debug, Clone)]
pub struct CharacterParts {
    pub machine: StateMachine,
    pub input: GatherInput,
    pub physics: PhysicsControl,
    pub facing: Facing,
    pub stats: PlayerStats,
}

impl CharacterParts {
    /// Character standing with its feet at `feet`
    pub fn new(tuning: &GameplayTuning, feet: Vec2) -> Self {
        let mut physics = PhysicsControl::new(Vec2::ZERO, tuning.coyote_time);
        physics.position = feet + Vec2::new(0.0, physics.half_extents().y);
        Self {
            machine: StateMachine::from_tuning(tuning),
            input: GatherInput::default(),
            physics,
            facing: Facing::default(),
            stats: PlayerStats::new(tuning.max_health, tuning.damage_flash_time),
        }
    }

    pub fn split(&mut self) -> (&mut StateMachine, CharacterRig<'_>) {
        (
            &mut self.machine,
            CharacterRig {
                input: &mut self.input,
                physics: &mut self.physics,
                facing: &mut self.facing,
                stats: &mut self.stats,
            },
        )
    }

    pub fn tick(&mut self, world: &dyn CollisionWorld, tuning: &GameplayTuning) {
        let (machine, mut rig) = self.split();
        simulate_tick(machine, &mut rig, world, tuning);
    }

    pub fn state(&self) -> PlayerState {
        self.machine.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Aabb, LevelGeometry};

    fn run(parts: &mut CharacterParts, world: &LevelGeometry, tuning: &GameplayTuning, ticks: usize) {
        for _ in 0..ticks {
            parts.input.latch_tick();
            parts.tick(world, tuning);
        }
    }

    #[test]
    fn test_walk_then_stop() {
        let tuning = GameplayTuning::default();
        let world = LevelGeometry::flat(0.0);
        let mut parts = CharacterParts::new(&tuning, Vec2::ZERO);

        parts.input.set_move_axis(1.0);
        run(&mut parts, &world, &tuning, 3);
        assert_eq!(parts.state(), PlayerState::Walk);
        assert!(parts.physics.position.x > 0.0);

        parts.input.set_move_axis(0.0);
        run(&mut parts, &world, &tuning, 2);
        assert_eq!(parts.state(), PlayerState::Idle);
        assert_eq!(parts.physics.velocity.x, 0.0);
    }

    #[test]
    fn test_jump_lands_back_to_idle() {
        let tuning = GameplayTuning::default();
        let world = LevelGeometry::flat(0.0);
        let mut parts = CharacterParts::new(&tuning, Vec2::ZERO);
        run(&mut parts, &world, &tuning, 1);

        parts.input.press_jump();
        run(&mut parts, &world, &tuning, 1);
        assert_eq!(parts.state(), PlayerState::Jump);
        assert!(parts.physics.position.y > parts.physics.half_extents().y);

        parts.input.release_jump();
        run(&mut parts, &world, &tuning, 200);
        assert_eq!(parts.state(), PlayerState::Idle);
        assert!(parts.physics.grounded);
        assert_eq!(parts.machine.remaining_jumps(), 2);
    }

    #[test]
    fn test_walk_off_ledge_enters_jump() {
        let tuning = GameplayTuning::default();
        let world = LevelGeometry {
            solids: vec![Aabb {
                min: Vec2::new(-10.0, -1.0),
                max: Vec2::new(0.5, 0.0),
            }],
            ..Default::default()
        };
        let mut parts = CharacterParts::new(&tuning, Vec2::ZERO);
        parts.input.set_move_axis(1.0);
        run(&mut parts, &world, &tuning, 20);
        assert_eq!(parts.state(), PlayerState::Jump);
        assert!(!parts.physics.grounded);
    }

    #[test]
    fn test_dash_moves_in_facing_direction() {
        let tuning = GameplayTuning::default();
        let world = LevelGeometry::flat(0.0);
        let mut parts = CharacterParts::new(&tuning, Vec2::ZERO);
        parts.facing = Facing(-1.0);

        parts.input.press_dash();
        run(&mut parts, &world, &tuning, 1);
        assert_eq!(parts.state(), PlayerState::Dash);
        assert!(parts.physics.velocity.x < 0.0);
        assert_eq!(parts.physics.gravity_scale, 0.0);

        run(&mut parts, &world, &tuning, 20);
        assert_eq!(parts.state(), PlayerState::Idle);
        assert!(parts.physics.gravity_enabled());
    }

    #[test]
    fn test_hazard_knocks_back_then_kills() {
        let tuning = GameplayTuning {
            max_health: 1,
            ..GameplayTuning::default()
        };
        let mut world = LevelGeometry::flat(0.0);
        world.hazards.push(Aabb {
            min: Vec2::new(0.2, 0.0),
            max: Vec2::new(1.0, 0.3),
        });
        let mut parts = CharacterParts::new(&tuning, Vec2::ZERO);
        run(&mut parts, &world, &tuning, 1);
        assert_eq!(parts.state(), PlayerState::KnockBack);
        assert!(parts.physics.velocity.x < 0.0);
        assert_eq!(parts.stats.health, 0);

        run(&mut parts, &world, &tuning, 30);
        assert_eq!(parts.state(), PlayerState::Death);
        assert!(!parts.input.is_player_map_enabled());

        let mut requested = false;
        for _ in 0..60 {
            run(&mut parts, &world, &tuning, 1);
            requested |= parts.machine.take_restart_request();
        }
        assert!(requested);
    }
}

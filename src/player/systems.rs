//! Player systems - fixed-tick simulation and per-frame presentation

use bevy::prelude::*;

use super::{
    AnimatorParams, CharacterRig, Facing, Ghost, PhysicsControl, Player, PlayerStats,
    StateMachine, simulate_tick,
};
use crate::constants::PIXELS_PER_UNIT;
use crate::events::{CharacterRole, EventBus, GameEvent};
use crate::input::GatherInput;
use crate::tuning::GameplayTuning;
use crate::world::LevelGeometry;

fn role(is_ghost: bool) -> CharacterRole {
    if is_ghost {
        CharacterRole::Ghost
    } else {
        CharacterRole::Hero
    }
}

/// Latch device input for this tick. Replaying characters ignore this.
pub fn latch_player_input(mut inputs: Query<&mut GatherInput, With<Player>>) {
    for mut input in &mut inputs {
        input.latch_tick();
    }
}

/// Advance every character one fixed tick
pub fn simulate_characters(
    tuning: Res<GameplayTuning>,
    geometry: Res<LevelGeometry>,
    mut bus: ResMut<EventBus>,
    mut characters: Query<
        (
            &mut StateMachine,
            &mut GatherInput,
            &mut PhysicsControl,
            &mut Facing,
            &mut PlayerStats,
            Has<Ghost>,
        ),
        With<Player>,
    >,
) {
    for (mut machine, mut input, mut physics, mut facing, mut stats, is_ghost) in &mut characters {
        let health_before = stats.health;
        let mut rig = CharacterRig {
            input: &mut input,
            physics: &mut physics,
            facing: &mut facing,
            stats: &mut stats,
        };
        simulate_tick(&mut machine, &mut rig, geometry.as_ref(), &tuning);

        if stats.health < health_before {
            bus.emit(GameEvent::PlayerDamaged {
                role: role(is_ghost),
                health: stats.health,
            });
        }
    }
}

/// Publish drained state transitions on the bus
pub fn mirror_state_transitions(
    mut bus: ResMut<EventBus>,
    mut machines: Query<(&mut StateMachine, Has<Ghost>)>,
) {
    for (mut machine, is_ghost) in &mut machines {
        for transition in machine.drain_transitions() {
            bus.emit(GameEvent::StateChanged {
                role: role(is_ghost),
                from: transition.from,
                to: transition.to,
                forced: transition.forced,
            });
        }
    }
}

/// Plates are pressed by any character body, hero or ghost
pub fn update_pressure_plates(
    mut geometry: ResMut<LevelGeometry>,
    mut bus: ResMut<EventBus>,
    bodies: Query<&PhysicsControl, With<Player>>,
) {
    if geometry.plates.is_empty() {
        return;
    }
    let bounds: Vec<_> = bodies.iter().map(|p| p.bounds()).collect();
    for change in geometry.update_plates(&bounds) {
        bus.emit(GameEvent::PlateChanged {
            plate: change.plate,
            pressed: change.pressed,
        });
    }
}

pub fn update_animators(
    mut characters: Query<(&StateMachine, &PhysicsControl, &PlayerStats, &mut AnimatorParams)>,
) {
    for (machine, physics, stats, mut animator) in &mut characters {
        machine.update_animator(&mut animator, physics);
        animator.flashing = stats.is_flashing();
    }
}

/// Copy simulation positions to render transforms
pub fn sync_transforms(
    mut characters: Query<(&PhysicsControl, &Facing, &mut Transform), With<Player>>,
) {
    for (physics, facing, mut transform) in &mut characters {
        transform.translation.x = physics.position.x * PIXELS_PER_UNIT;
        transform.translation.y = physics.position.y * PIXELS_PER_UNIT;
        transform.scale.x = facing.0.signum() * transform.scale.x.abs();
    }
}

//! PhysicsControl - rigid body state, ground/wall sensing and gravity

use bevy::prelude::*;

use crate::constants::*;
use crate::world::{Aabb, CollisionWorld};

/// Sensor anchor offsets from the body center.
///
/// Wall anchors are given for a right-facing body and mirrored by facing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorAnchors {
    pub half_extents: Vec2,
    pub ground_left: Vec2,
    pub ground_right: Vec2,
    pub wall_upper: Vec2,
    pub wall_lower: Vec2,
}

impl SensorAnchors {
    /// Standard anchor layout for a body of the given size
    pub fn for_size(size: Vec2) -> Self {
        Self::with_inset(size, SENSOR_INSET)
    }

    /// Anchors pulled `inset` inside the body edges
    pub fn with_inset(size: Vec2, inset: f32) -> Self {
        let half = size * 0.5;
        let foot_y = -half.y + inset;
        let wall_x = half.x - inset;
        Self {
            half_extents: half,
            ground_left: Vec2::new(-wall_x, foot_y),
            ground_right: Vec2::new(wall_x, foot_y),
            wall_upper: Vec2::new(wall_x, half.y * 0.5),
            wall_lower: Vec2::new(wall_x, -half.y * 0.5),
        }
    }
}

impl Default for SensorAnchors {
    fn default() -> Self {
        Self::for_size(DEFAULT_BODY_SIZE)
    }
}

#[derive(Component, Debug, Clone)]
pub struct PhysicsControl {
    pub position: Vec2,
    pub velocity: Vec2,
    pub gravity_scale: f32,
    base_gravity: f32,
    gravity_enabled: bool,
    /// Seconds left to jump after leaving ground. Negative once spent.
    pub coyote_timer: f32,
    coyote_set_time: f32,
    pub grounded: bool,
    pub touching_wall: bool,
    anchors: SensorAnchors,
}

impl Default for PhysicsControl {
    fn default() -> Self {
        Self::new(Vec2::ZERO, COYOTE_TIME)
    }
}

impl PhysicsControl {
    pub fn new(position: Vec2, coyote_time: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            gravity_scale: BASE_GRAVITY,
            base_gravity: BASE_GRAVITY,
            gravity_enabled: true,
            coyote_timer: 0.0,
            coyote_set_time: coyote_time,
            grounded: false,
            touching_wall: false,
            anchors: SensorAnchors::default(),
        }
    }

    pub fn base_gravity(&self) -> f32 {
        self.base_gravity
    }

    /// Change the base scale. Takes effect now unless gravity is disabled.
    pub fn set_base_gravity(&mut self, base: f32) {
        self.base_gravity = base;
        if self.gravity_enabled {
            self.gravity_scale = base;
        }
    }

    pub fn enable_gravity(&mut self) {
        self.gravity_enabled = true;
        self.gravity_scale = self.base_gravity;
    }

    pub fn disable_gravity(&mut self) {
        self.gravity_enabled = false;
        self.gravity_scale = 0.0;
    }

    pub fn gravity_enabled(&self) -> bool {
        self.gravity_enabled
    }

    pub fn reset_velocity(&mut self) {
        self.velocity = Vec2::ZERO;
    }

    pub fn disarm_coyote(&mut self) {
        self.coyote_timer = COYOTE_DISARMED;
    }

    pub fn set_coyote_time(&mut self, seconds: f32) {
        self.coyote_set_time = seconds;
    }

    /// Rebind sensors to a new body
    pub fn set_check_points(&mut self, anchors: SensorAnchors) {
        self.anchors = anchors;
    }

    pub fn anchors(&self) -> &SensorAnchors {
        &self.anchors
    }

    pub fn half_extents(&self) -> Vec2 {
        self.anchors.half_extents
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.position, self.anchors.half_extents)
    }

    /// Refresh grounded and wall contact with two rays each
    pub fn sense(&mut self, world: &dyn CollisionWorld, facing: f32) {
        let a = self.anchors;
        self.grounded = [a.ground_left, a.ground_right]
            .iter()
            .any(|offset| {
                world
                    .raycast(self.position + *offset, Vec2::NEG_Y, GROUND_RAY_LENGTH)
                    .is_some()
            });

        let dir = if facing < 0.0 { -1.0 } else { 1.0 };
        self.touching_wall = [a.wall_upper, a.wall_lower].iter().any(|offset| {
            let origin = self.position + Vec2::new(offset.x * dir, offset.y);
            world
                .raycast(origin, Vec2::new(dir, 0.0), WALL_RAY_LENGTH)
                .is_some()
        });
    }

    /// Rearm coyote time while grounded, count down otherwise
    pub fn tick_coyote(&mut self, dt: f32) {
        if self.grounded {
            self.coyote_timer = self.coyote_set_time;
        } else {
            self.coyote_timer -= dt;
        }
    }

    /// Apply gravity, move, and resolve against the world
    pub fn integrate(&mut self, world: &dyn CollisionWorld, dt: f32) {
        self.velocity.y -= GRAVITY * self.gravity_scale * dt;
        self.position += self.velocity * dt;
        world.resolve(&mut self.position, &mut self.velocity, self.anchors.half_extents);
    }
}

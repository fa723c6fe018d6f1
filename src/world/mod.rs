//! World collision - level solids, sensor raycasts and body resolution
//!
//! The simulation only talks to the world through [`CollisionWorld`], so
//! tests can drive characters against a bare floor.

mod gadgets;

pub use gadgets::{Gate, PlateChange, Pressable, PressurePlate};

use bevy::prelude::*;

use crate::constants::*;

/// Axis-aligned box in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Strict overlap (touching edges do not count)
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Distance along `direction` to the box, within `max_distance` (slab test)
    pub fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<f32> {
        let mut t_near = 0.0_f32;
        let mut t_far = max_distance;
        for axis in 0..2 {
            let o = origin[axis];
            let d = direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d.abs() < 1e-8 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t1 = (lo - o) * inv;
            let mut t2 = (hi - o) * inv;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_near = t_near.max(t1);
            t_far = t_far.min(t2);
            if t_near > t_far {
                return None;
            }
        }
        Some(t_near)
    }
}

/// What the character controller needs from the physics world
pub trait CollisionWorld {
    /// Nearest solid hit along a ray
    fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<f32>;

    /// Push a body of the given half extents out of every solid it overlaps
    fn resolve(&self, position: &mut Vec2, velocity: &mut Vec2, half: Vec2);

    /// Center of a hazard touching the bounds, if any
    fn hazard_contact(&self, _bounds: &Aabb) -> Option<Vec2> {
        None
    }
}

/// Named spawn location (feet position)
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnPoint {
    pub key: String,
    pub position: Vec2,
    pub facing_right: bool,
}

/// Collision geometry of the loaded level
#[derive(Resource, Debug, Clone, Default)]
pub struct LevelGeometry {
    pub name: String,
    pub solids: Vec<Aabb>,
    pub hazards: Vec<Aabb>,
    pub gates: Vec<Gate>,
    pub plates: Vec<PressurePlate>,
    pub spawn_points: Vec<SpawnPoint>,
    pub terminal_zone: Option<Aabb>,
}

impl LevelGeometry {
    /// A single wide floor whose top surface is at `top`
    pub fn flat(top: f32) -> Self {
        Self {
            name: "flat".to_string(),
            solids: vec![Aabb {
                min: Vec2::new(-500.0, top - 1.0),
                max: Vec2::new(500.0, top),
            }],
            spawn_points: vec![SpawnPoint {
                key: DEFAULT_SPAWN_KEY.to_string(),
                position: Vec2::new(0.0, top),
                facing_right: true,
            }],
            ..Default::default()
        }
    }

    pub fn with_solid(mut self, solid: Aabb) -> Self {
        self.solids.push(solid);
        self
    }

    pub fn spawn_point(&self, key: &str) -> Option<&SpawnPoint> {
        self.spawn_points.iter().find(|s| s.key == key)
    }

    pub fn in_terminal_zone(&self, bounds: &Aabb) -> bool {
        self.terminal_zone
            .map(|zone| zone.overlaps(bounds))
            .unwrap_or(false)
    }

    /// Solids plus gates that are currently closed
    fn blocking(&self) -> impl Iterator<Item = &Aabb> {
        self.solids.iter().chain(
            self.gates
                .iter()
                .filter(|gate| !gate.is_open())
                .map(|gate| &gate.bounds),
        )
    }

    /// Recompute which plates are held down by the given bodies
    pub fn update_plates(&mut self, bodies: &[Aabb]) -> Vec<PlateChange> {
        let mut changes = Vec::new();
        for (index, plate) in self.plates.iter_mut().enumerate() {
            let pressed = bodies.iter().any(|body| plate.bounds.overlaps(body));
            if pressed == plate.is_pressed() {
                continue;
            }
            plate.set_pressed(pressed);
            if let Some(gate) = plate.gate.and_then(|g| self.gates.get_mut(g)) {
                gate.set_pressed(pressed);
            }
            changes.push(PlateChange { plate: index, pressed });
        }
        changes
    }
}

impl CollisionWorld for LevelGeometry {
    fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<f32> {
        self.blocking()
            .filter_map(|solid| solid.raycast(origin, direction, max_distance))
            .min_by(|a, b| a.total_cmp(b))
    }

    fn resolve(&self, position: &mut Vec2, velocity: &mut Vec2, half: Vec2) {
        for solid in self.blocking() {
            let solid_pos = solid.center();
            let solid_half = solid.half_extents();

            let diff = *position - solid_pos;
            let overlap_x = half.x + solid_half.x - diff.x.abs();
            let overlap_y = half.y + solid_half.y - diff.y.abs();

            // No collision
            if overlap_x <= COLLISION_EPSILON || overlap_y <= COLLISION_EPSILON {
                continue;
            }

            // Resolve collision along the smallest overlap axis
            if overlap_y < overlap_x {
                if diff.y > 0.0 {
                    // Landed on top
                    position.y = solid_pos.y + solid_half.y + half.y;
                    if velocity.y < 0.0 {
                        velocity.y = 0.0;
                    }
                } else {
                    // Hit ceiling
                    position.y = solid_pos.y - solid_half.y - half.y;
                    if velocity.y > 0.0 {
                        velocity.y = 0.0;
                    }
                }
            } else if diff.x > 0.0 {
                position.x = solid_pos.x + solid_half.x + half.x;
            } else {
                position.x = solid_pos.x - solid_half.x - half.x;
            }
        }
    }

    fn hazard_contact(&self, bounds: &Aabb) -> Option<Vec2> {
        self.hazards
            .iter()
            .find(|hazard| hazard.overlaps(bounds))
            .map(|hazard| hazard.center())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raycast_down_hits_floor() {
        let world = LevelGeometry::flat(0.0);
        let hit = world.raycast(Vec2::new(0.0, 0.05), Vec2::NEG_Y, 0.1);
        assert!(hit.is_some());
        assert!((hit.unwrap() - 0.05).abs() < 1e-5);
        assert!(world.raycast(Vec2::new(0.0, 0.5), Vec2::NEG_Y, 0.1).is_none());
    }

    #[test]
    fn test_raycast_sideways_hits_wall() {
        let world = LevelGeometry::flat(0.0).with_solid(Aabb {
            min: Vec2::new(2.0, 0.0),
            max: Vec2::new(3.0, 5.0),
        });
        assert!(world.raycast(Vec2::new(1.95, 1.0), Vec2::X, 0.1).is_some());
        assert!(world.raycast(Vec2::new(1.95, 1.0), Vec2::NEG_X, 0.1).is_none());
    }

    #[test]
    fn test_resolve_lands_on_floor() {
        let world = LevelGeometry::flat(0.0);
        let half = Vec2::new(0.4, 0.8);
        let mut position = Vec2::new(0.0, 0.75);
        let mut velocity = Vec2::new(1.0, -3.0);
        world.resolve(&mut position, &mut velocity, half);
        assert_eq!(position.y, 0.8);
        assert_eq!(velocity.y, 0.0);
        assert_eq!(velocity.x, 1.0);
    }

    #[test]
    fn test_resolve_pushes_out_of_wall() {
        let world = LevelGeometry::default().with_solid(Aabb {
            min: Vec2::new(2.0, -5.0),
            max: Vec2::new(3.0, 5.0),
        });
        let half = Vec2::new(0.4, 0.8);
        let mut position = Vec2::new(1.65, 0.0);
        let mut velocity = Vec2::new(4.0, 0.0);
        world.resolve(&mut position, &mut velocity, half);
        assert!((position.x - 1.6).abs() < 1e-5);
    }

    #[test]
    fn test_open_gate_stops_blocking() {
        let mut world = LevelGeometry::flat(0.0);
        world.gates.push(Gate::new(Aabb {
            min: Vec2::new(2.0, 0.0),
            max: Vec2::new(2.5, 3.0),
        }));
        world.plates.push(PressurePlate::new(
            Aabb {
                min: Vec2::new(-1.0, 0.0),
                max: Vec2::new(1.0, 0.1),
            },
            Some(0),
        ));
        assert!(world.raycast(Vec2::new(1.9, 1.0), Vec2::X, 0.2).is_some());

        let feet = Aabb::from_center(Vec2::new(0.0, 0.8), Vec2::new(0.4, 0.8));
        let changes = world.update_plates(&[feet]);
        assert_eq!(changes, vec![PlateChange { plate: 0, pressed: true }]);
        assert!(world.raycast(Vec2::new(1.9, 1.0), Vec2::X, 0.2).is_none());

        // No change while still held
        assert!(world.update_plates(&[feet]).is_empty());
        world.update_plates(&[]);
        assert!(world.raycast(Vec2::new(1.9, 1.0), Vec2::X, 0.2).is_some());
    }
}

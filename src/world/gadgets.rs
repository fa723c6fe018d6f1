//! Pressure plates and the gates they drive

use super::Aabb;

/// Anything a plate can drive. Bindings are resolved when the level is built.
pub trait Pressable {
    fn set_pressed(&mut self, pressed: bool);
    fn is_pressed(&self) -> bool;
}

/// Solid that opens while its plate is held down
#[derive(Debug, Clone, PartialEq)]
pub struct Gate {
    pub bounds: Aabb,
    open: bool,
}

impl Gate {
    pub fn new(bounds: Aabb) -> Self {
        Self {
            bounds,
            open: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl Pressable for Gate {
    fn set_pressed(&mut self, pressed: bool) {
        self.open = pressed;
    }

    fn is_pressed(&self) -> bool {
        self.open
    }
}

/// Floor trigger pressed by any character standing on it
#[derive(Debug, Clone, PartialEq)]
pub struct PressurePlate {
    pub bounds: Aabb,
    /// Index into the level's gates
    pub gate: Option<usize>,
    pressed: bool,
}

impl PressurePlate {
    pub fn new(bounds: Aabb, gate: Option<usize>) -> Self {
        Self {
            bounds,
            gate,
            pressed: false,
        }
    }
}

impl Pressable for PressurePlate {
    fn set_pressed(&mut self, pressed: bool) {
        self.pressed = pressed;
    }

    fn is_pressed(&self) -> bool {
        self.pressed
    }
}

/// A plate that changed state this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlateChange {
    pub plate: usize,
    pub pressed: bool,
}

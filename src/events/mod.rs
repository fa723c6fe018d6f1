//! Gameplay event bus
//!
//! Decoupled cross-module communication. Systems emit `GameEvent`s stamped
//! with the fixed tick; the bus is drained once per frame for logging and
//! kept as a bounded history for the scenario runner.

mod bus;
mod types;

pub use bus::{BusEvent, EventBus, PROCESSED_HISTORY, advance_event_bus_tick, log_bus_events};
pub use types::{CharacterRole, GameEvent};

//! Event Bus - central hub for cross-module communication
//!
//! Gameplay systems emit events here instead of reaching into each other:
//! - the state mirror emits StateChanged for every drained transition
//! - the recorder and playback emit replay lifecycle events
//! - the terminal session emits state, slot and notice events
//!
//! Events are stamped with the fixed tick they were emitted on.

use std::collections::VecDeque;

use bevy::prelude::*;

use super::types::GameEvent;

/// How many consumed events stay available for inspection
pub const PROCESSED_HISTORY: usize = 4096;

/// Tick-stamped event for the event bus
#[derive(Debug, Clone, PartialEq)]
pub struct BusEvent {
    /// Fixed tick the event was emitted on
    pub tick: u64,
    /// The event data
    pub event: GameEvent,
}

/// Central event bus for cross-module communication
#[derive(Resource, Default)]
pub struct EventBus {
    /// Events emitted since the last drain
    pending: Vec<BusEvent>,

    /// Recently consumed events, oldest first
    processed: VecDeque<BusEvent>,

    /// Current fixed tick (for stamping)
    tick: u64,

    /// Whether the bus is enabled (for testing/simulation)
    enabled: bool,
}

impl EventBus {
    /// Create a new enabled event bus
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    /// Create a disabled event bus (events are dropped)
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Emit an event to the bus
    pub fn emit(&mut self, event: GameEvent) {
        if !self.enabled {
            return;
        }
        self.pending.push(BusEvent {
            tick: self.tick,
            event,
        });
    }

    /// Emit multiple events at once
    pub fn emit_all(&mut self, events: impl IntoIterator<Item = GameEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    /// Get pending events for consumption (does not drain)
    pub fn peek(&self) -> &[BusEvent] {
        &self.pending
    }

    /// Drain pending events, moving them to processed
    pub fn drain(&mut self) -> Vec<BusEvent> {
        let events = std::mem::take(&mut self.pending);
        self.processed.extend(events.iter().cloned());
        while self.processed.len() > PROCESSED_HISTORY {
            self.processed.pop_front();
        }
        events
    }

    /// Take the consumed-event history, leaving it empty
    pub fn take_processed(&mut self) -> Vec<BusEvent> {
        self.processed.drain(..).collect()
    }

    pub fn processed(&self) -> impl Iterator<Item = &BusEvent> {
        self.processed.iter()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// Advance the bus clock once per fixed tick
pub fn advance_event_bus_tick(mut bus: ResMut<EventBus>) {
    bus.advance_tick();
}

/// Drain the bus each frame and log what happened
pub fn log_bus_events(mut bus: ResMut<EventBus>) {
    for BusEvent { tick, event } in bus.drain() {
        match &event {
            GameEvent::Notice { message } => info!("[{tick}] {message}"),
            GameEvent::DriftCorrected { .. } | GameEvent::StateChanged { .. } => {
                debug!("[{tick}] {} {}", event.kind(), event.value())
            }
            _ => info!("[{tick}] {} {}", event.kind(), event.value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_and_drain() {
        let mut bus = EventBus::new();
        bus.advance_tick();
        bus.advance_tick();

        bus.emit(GameEvent::RecordingStarted {
            profile_id: "Hero".into(),
        });

        assert_eq!(bus.pending_count(), 1);
        assert!(bus.has_pending());

        let events = bus.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tick, 2);
        assert_eq!(bus.pending_count(), 0);
        assert_eq!(bus.processed().count(), 1);
    }

    #[test]
    fn test_disabled_bus() {
        let mut bus = EventBus::disabled();
        bus.emit(GameEvent::SlotsChanged);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut bus = EventBus::new();
        bus.emit_all((0..PROCESSED_HISTORY + 10).map(|_| GameEvent::SlotsChanged));
        bus.drain();
        assert_eq!(bus.processed().count(), PROCESSED_HISTORY);
        assert_eq!(bus.take_processed().len(), PROCESSED_HISTORY);
        assert_eq!(bus.processed().count(), 0);
    }
}

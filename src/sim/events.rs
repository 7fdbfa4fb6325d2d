//! Outbound simulation events
//!
//! The core never talks to UI, audio or persistence directly. It pushes
//! [`SimEvent`]s into an [`EventSink`] supplied by the host at construction.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::forces::FieldKind;

/// Something the presentation/audio/persistence side may care about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Ambient + wave particle total changed (rate-limited)
    ParticleCountChanged { count: usize },
    /// Avatar touched a particle (rate-limited)
    CollisionDetected,
    /// Level counter advanced
    LevelChanged { level: u32 },
    WaveActivated { name: String, budget: usize },
    WaveStopped { name: String },
    FieldActivated { kind: FieldKind, position: Vec2, duration: f32 },
    FieldExpired { kind: FieldKind },
}

/// Receiver for simulation events
pub trait EventSink {
    fn emit(&mut self, event: SimEvent);
}

impl<F: FnMut(SimEvent)> EventSink for F {
    fn emit(&mut self, event: SimEvent) {
        self(event)
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: SimEvent) {}
}

/// Records events in order (tests, replays)
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
}

impl EventLog {
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn count_where(&self, pred: impl Fn(&SimEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(*e)).count()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: SimEvent) {
        self.events.push(event);
    }
}

/// Decouples status notifications from the physics rate
#[derive(Debug, Clone)]
pub struct StatusThrottle {
    status_interval: f32,
    collision_cooldown: f32,
    since_status: f32,
    since_collision: f32,
    last_count: Option<usize>,
}

impl StatusThrottle {
    pub fn new(status_interval: f32, collision_cooldown: f32) -> Self {
        Self {
            status_interval,
            collision_cooldown,
            // First report goes out on the first tick
            since_status: status_interval,
            since_collision: collision_cooldown,
            last_count: None,
        }
    }

    /// Advance timers and emit whatever is due
    pub fn update(&mut self, dt: f32, count: usize, collided: bool, events: &mut impl EventSink) {
        self.since_status += dt;
        self.since_collision += dt;

        if self.since_status >= self.status_interval && self.last_count != Some(count) {
            events.emit(SimEvent::ParticleCountChanged { count });
            self.last_count = Some(count);
            self.since_status = 0.0;
        }

        if collided && self.since_collision >= self.collision_cooldown {
            events.emit(SimEvent::CollisionDetected);
            self.since_collision = 0.0;
        }
    }
}

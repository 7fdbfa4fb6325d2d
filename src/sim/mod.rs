//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only, no wall clock
//! - Frame delta clamped to a 30 fps floor
//! - Viewport passed in explicitly as [`SimBounds`]
//! - Events go out through an injected [`EventSink`]
//! - No rendering, audio or platform dependencies

pub mod bounds;
pub mod collision;
pub mod events;
pub mod field;
pub mod forces;
pub mod level;
pub mod particle;
pub mod state;
pub mod steering;
pub mod tick;
pub mod waves;

pub use bounds::SimBounds;
pub use collision::CollisionProbe;
pub use events::{EventLog, EventSink, NullSink, SimEvent, StatusThrottle};
pub use field::{ParticleField, SpawnProfile};
pub use forces::{FieldId, FieldKind, FieldView, ForceField, ForceFieldRegistry};
pub use level::LevelProgression;
pub use particle::{Particle, ParticleArena, ParticleId, ParticleView};
pub use state::{Simulation, growth_for};
pub use steering::SteeringMode;
pub use tick::{SimCommand, TickInput, TickOutcome, clamp_dt, tick};
pub use waves::{CircularBurst, TimedSweep, WaveMechanic, WaveSwarm, build_wave};

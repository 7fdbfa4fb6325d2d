//! Swarm Dodge - particle-swarm simulation core for a dodge-the-swarm game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (swarm, steering, force fields, waves, collisions)
//! - `settings`: Configuration snapshot read at round start
//! - `error`: Settings loading errors

pub mod error;
pub mod settings;
pub mod sim;

pub use error::SettingsError;
pub use settings::{Difficulty, Settings};

use glam::Vec2;

/// Simulation tuning constants
pub mod consts {
    /// Largest step the simulation accepts (30 fps floor)
    pub const MAX_DT: f32 = 1.0 / 30.0;

    /// Spawn ring sits this far outside the viewport's half-extent
    pub const SPAWN_MARGIN: f32 = 60.0;
    /// Extra random radial offset on top of the spawn margin
    pub const SPAWN_JITTER: f32 = 20.0;
    /// Particles further than this outside the viewport are retired
    pub const EXIT_MARGIN: f32 = 120.0;
    /// Seconds a particle may stay "freshly spawned" without entering the view
    pub const FRESH_SPAWN_GRACE: f32 = 8.0;
    /// Seconds for a new particle to fade in
    pub const FADE_IN_TIME: f32 = 0.35;

    /// Avatar/particle hit distance
    pub const COLLISION_RADIUS: f32 = 14.0;

    /// Targets closer than this skip the heading update
    pub const STEER_EPSILON: f32 = 0.5;
    /// Linear speed ceiling while steering
    pub const MAX_STEER_SPEED: f32 = 900.0;
    /// Linear speed ceiling after force fields are applied
    pub const MAX_PARTICLE_SPEED: f32 = 1200.0;
    /// Nominal speed may never be randomized below this fraction
    pub const MIN_SPEED_FRACTION: f32 = 0.1;

    /// Squared distance under which a field contribution is skipped
    pub const FORCE_EPSILON_SQ: f32 = 1.0;
    /// Distance exponent for attractors (softer close-range spike)
    pub const ATTRACTION_FALLOFF: f32 = 1.5;
    /// Distance exponent for repulsors
    pub const REPULSION_FALLOFF: f32 = 2.0;
    /// Fields fade out over their final second
    pub const FIELD_FADE_TIME: f32 = 1.0;

    /// Hard cap on the ambient swarm
    pub const MAX_AMBIENT_PARTICLES: usize = 2000;
    /// Hard cap on a single wave's budget
    pub const MAX_WAVE_BUDGET: usize = 500;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Heading angle of a vector (0 for the zero vector)
#[inline]
pub fn heading_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

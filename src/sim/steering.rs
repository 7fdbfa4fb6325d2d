//! Per-particle motion law
//!
//! Two modes: straight-line flight, and heading-limited pursuit where the
//! velocity vector rotates toward the target by at most `turn_rate * dt`
//! per tick while keeping its magnitude.

use glam::Vec2;

use super::particle::Particle;
use crate::consts::{MAX_STEER_SPEED, STEER_EPSILON};
use crate::{heading_of, normalize_angle};

/// How a particle's velocity evolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringMode {
    /// Velocity unchanged
    Straight,
    /// Turn toward a target, limited by the particle's turn rate
    Pursuit,
}

impl SteeringMode {
    pub fn for_particle(particle: &Particle) -> Self {
        if particle.chases_target {
            SteeringMode::Pursuit
        } else {
            SteeringMode::Straight
        }
    }
}

/// Adjust the particle's velocity for this tick (position is not touched)
pub fn steer(particle: &mut Particle, target: Vec2, dt: f32) {
    match SteeringMode::for_particle(particle) {
        SteeringMode::Straight => {}
        SteeringMode::Pursuit => {
            particle.vel = pursue(particle.pos, particle.vel, particle.speed, particle.turn_rate, target, dt);
        }
    }
}

/// Move the particle along its current velocity
#[inline]
pub fn integrate(particle: &mut Particle, dt: f32) {
    particle.pos += particle.vel * dt;
}

/// Steer then integrate, the full motion law for one tick
pub fn advance(particle: &mut Particle, target: Vec2, dt: f32) {
    steer(particle, target, dt);
    integrate(particle, dt);
}

/// Heading-limited pursuit. Returns the new velocity.
///
/// The current velocity is rotated toward `target` by no more than
/// `turn_rate * dt`. Its magnitude is preserved but capped at
/// [`MAX_STEER_SPEED`]. A stalled particle (zero velocity) restarts at its
/// nominal speed. Targets closer than [`STEER_EPSILON`] leave the velocity
/// unchanged.
pub fn pursue(pos: Vec2, vel: Vec2, speed: f32, turn_rate: f32, target: Vec2, dt: f32) -> Vec2 {
    let to_target = target - pos;
    if to_target.length_squared() < STEER_EPSILON * STEER_EPSILON {
        return vel;
    }

    let desired = to_target.normalize() * speed;
    let current_heading = heading_of(vel);
    let desired_heading = heading_of(desired);

    let delta = normalize_angle(desired_heading - current_heading);
    let max_turn = (turn_rate * dt).max(0.0);
    let turn = delta.clamp(-max_turn, max_turn);

    let magnitude = if vel.length_squared() > f32::EPSILON {
        vel.length()
    } else {
        speed
    };
    Vec2::from_angle(current_heading + turn) * magnitude.min(MAX_STEER_SPEED)
}

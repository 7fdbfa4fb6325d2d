//! Ambient swarm
//!
//! The persistent particle population. Particles spawn on a ring just
//! outside the viewport, fly in (optionally chasing the avatar), and are
//! recycled through the arena pool once they leave the play area. Every
//! retirement is matched by exactly one replacement spawn, so the population
//! only changes when growth is requested explicitly.

use glam::Vec2;
use rand::Rng;

use super::bounds::SimBounds;
use super::forces::ForceFieldRegistry;
use super::particle::{Particle, ParticleArena, ParticleId, ParticleView};
use super::steering;
use crate::consts::{
    EXIT_MARGIN, FRESH_SPAWN_GRACE, MAX_AMBIENT_PARTICLES, MAX_PARTICLE_SPEED, MIN_SPEED_FRACTION,
    SPAWN_JITTER, SPAWN_MARGIN,
};
use crate::polar_to_cartesian;
use crate::settings::Settings;

/// Per-spawn parameters taken from the round settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnProfile {
    /// Nominal speed (px/s)
    pub speed: f32,
    /// Nominal turn rate (rad/s)
    pub turn_rate: f32,
    /// Speed variance as a fraction of nominal
    pub speed_variance: f32,
    /// Probability that speed and turn rate are randomized
    pub randomizer_chance: f64,
    pub spawn_toward_avatar: bool,
    pub chase_enabled: bool,
}

impl SpawnProfile {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            speed: settings.particle_speed,
            turn_rate: settings.turn_rate,
            speed_variance: settings.speed_variance(),
            randomizer_chance: settings.randomizer_chance().clamp(0.0, 1.0),
            spawn_toward_avatar: settings.spawn_toward_avatar,
            chase_enabled: settings.chase_enabled,
        }
    }

    /// Nominal speed, or a randomized one never below 10% of nominal
    pub fn roll_speed(&self, rng: &mut impl Rng) -> f32 {
        let nominal = self.speed.max(1.0);
        let mut speed = nominal;
        if rng.random_bool(self.randomizer_chance) {
            let v = self.speed_variance.abs();
            speed *= 1.0 + rng.random_range(-v..=v);
        }
        speed.max(nominal * MIN_SPEED_FRACTION)
    }

    /// Nominal turn rate, or a random fraction of it
    pub fn roll_turn_rate(&self, rng: &mut impl Rng) -> f32 {
        if rng.random_bool(self.randomizer_chance) {
            self.turn_rate * rng.random::<f32>()
        } else {
            self.turn_rate
        }
    }
}

/// The ambient particle population and its pool
#[derive(Debug, Clone)]
pub struct ParticleField {
    arena: ParticleArena,
    profile: SpawnProfile,
}

impl ParticleField {
    pub fn new(profile: SpawnProfile) -> Self {
        Self {
            arena: ParticleArena::with_capacity(256),
            profile,
        }
    }

    pub fn profile(&self) -> &SpawnProfile {
        &self.profile
    }

    /// Swap in a new profile (next spawns use it, live particles keep theirs)
    pub fn set_profile(&mut self, profile: SpawnProfile) {
        self.profile = profile;
    }

    /// Pooled particle if available, else a fresh allocation
    pub fn get_pooled_particle(&mut self) -> ParticleId {
        self.arena.acquire()
    }

    /// Spawn one particle on the ring around the viewport
    pub fn spawn(&mut self, rng: &mut impl Rng, bounds: &SimBounds, avatar: Vec2) -> ParticleId {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let radius = bounds.half_extent() + SPAWN_MARGIN + rng.random_range(0.0..=SPAWN_JITTER);
        let pos = bounds.center() + polar_to_cartesian(radius, angle);

        let aim = if self.profile.spawn_toward_avatar {
            avatar
        } else {
            Vec2::new(
                rng.random_range(0.0..=bounds.width),
                rng.random_range(0.0..=bounds.height),
            )
        };
        let dir = (aim - pos)
            .try_normalize()
            .or_else(|| (bounds.center() - pos).try_normalize())
            .unwrap_or(Vec2::X);

        let speed = self.profile.roll_speed(rng);
        let turn_rate = self.profile.roll_turn_rate(rng);

        let id = self.get_pooled_particle();
        let particle = self.arena.get_mut(id);
        particle.pos = pos;
        particle.vel = dir * speed;
        particle.speed = speed;
        particle.turn_rate = turn_rate;
        particle.freshly_spawned = true;
        particle.chases_target = self.profile.chase_enabled;
        particle.spawned_toward_target = self.profile.spawn_toward_avatar;
        id
    }

    /// Spawn up to `count` particles, respecting the population cap.
    /// Returns how many were added.
    pub fn grow(&mut self, count: usize, rng: &mut impl Rng, bounds: &SimBounds, avatar: Vec2) -> usize {
        let room = MAX_AMBIENT_PARTICLES.saturating_sub(self.arena.active_count());
        let count = count.min(room);
        for _ in 0..count {
            self.spawn(rng, bounds, avatar);
        }
        count
    }

    /// Steer, apply forces and integrate every active particle. Particles
    /// that left the play area are retired and replaced one-for-one.
    /// Returns the number recycled this tick.
    pub fn update(
        &mut self,
        dt: f32,
        avatar: Vec2,
        bounds: &SimBounds,
        forces: &ForceFieldRegistry,
        rng: &mut impl Rng,
    ) -> usize {
        let mut retired = 0;
        let mut i = 0;
        while i < self.arena.active_count() {
            let id = self.arena.active_id(i);
            let p = self.arena.get_mut(id);
            let on_screen = bounds.contains(p.pos);
            let inbound = p.is_closing_on(bounds.center());
            p.age_by(dt, on_screen, inbound, FRESH_SPAWN_GRACE);

            steering::steer(p, avatar, dt);
            forces.apply_all_forces(p.pos, &mut p.vel, dt);
            p.vel = p.vel.clamp_length_max(MAX_PARTICLE_SPEED);
            steering::integrate(p, dt);

            if !p.freshly_spawned && bounds.is_beyond(p.pos, EXIT_MARGIN) {
                // swap_remove pulls an unvisited particle into slot i
                self.arena.retire_at(i);
                retired += 1;
            } else {
                i += 1;
            }
        }

        for _ in 0..retired {
            self.spawn(rng, bounds, avatar);
        }
        retired
    }

    /// Return every particle to the pool
    pub fn clear(&mut self) {
        self.arena.retire_all();
    }

    pub fn active_count(&self) -> usize {
        self.arena.active_count()
    }

    pub fn pooled_count(&self) -> usize {
        self.arena.pooled_count()
    }

    pub fn allocated(&self) -> usize {
        self.arena.allocated()
    }

    pub fn particle(&self, id: ParticleId) -> &Particle {
        self.arena.get(id)
    }

    pub fn particles(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.arena.iter_active().map(|(_, p)| p)
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.particles().map(|p| p.pos)
    }

    pub fn views(&self) -> impl Iterator<Item = ParticleView> + '_ {
        self.arena.iter_active().map(|(id, p)| ParticleView::of(id.0, p))
    }

    #[cfg(test)]
    pub(crate) fn particle_mut(&mut self, id: ParticleId) -> &mut Particle {
        self.arena.get_mut(id)
    }
}

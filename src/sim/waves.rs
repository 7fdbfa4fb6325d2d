//! Level-triggered wave mechanics
//!
//! Each mechanic owns its particles outright; they never touch the ambient
//! swarm's pool. Shared motion lives in [`WaveSwarm`], which every variant
//! embeds and drives from its own `update`.

use std::f32::consts::TAU;

use glam::Vec2;

use super::bounds::SimBounds;
use super::collision::CollisionProbe;
use super::forces::ForceFieldRegistry;
use super::particle::{Particle, ParticleView};
use crate::consts::{EXIT_MARGIN, FRESH_SPAWN_GRACE, MAX_PARTICLE_SPEED, SPAWN_MARGIN};
use crate::polar_to_cartesian;
use crate::settings::{WaveKind, WaveSettings};

/// Sweep particles start this far above the top edge
pub const SWEEP_LAUNCH_OFFSET: f32 = 20.0;

/// Capability interface shared by every wave variant
pub trait WaveMechanic {
    fn name(&self) -> &str;
    fn activation_level(&self) -> u32;
    fn particle_budget(&self) -> usize;
    fn is_active(&self) -> bool;

    /// Start the wave. Re-activating a running wave stops it first so no
    /// particles leak across triggers.
    fn activate(&mut self, bounds: &SimBounds);

    /// Halt emission and destroy every particle this wave owns
    fn stop(&mut self);

    fn update(&mut self, dt: f32, bounds: &SimBounds, forces: &ForceFieldRegistry);

    /// Particles currently owned by the wave
    fn particles(&self) -> &[Particle];

    fn active_particle_count(&self) -> usize {
        self.particles().len()
    }

    fn check_collisions(&self, probe: &CollisionProbe, avatar: Vec2) -> bool {
        probe.check(avatar, self.particles().iter().map(|p| p.pos))
    }

    fn views(&self) -> Vec<ParticleView> {
        self.particles()
            .iter()
            .map(|p| ParticleView::of(p.serial, p))
            .collect()
    }
}

/// Build the mechanic described by `settings`
pub fn build_wave(settings: &WaveSettings) -> Box<dyn WaveMechanic> {
    match settings.kind {
        WaveKind::CircularBurst => Box::new(CircularBurst::new(settings.clone())),
        WaveKind::TimedSweep => Box::new(TimedSweep::new(settings.clone())),
    }
}

/// Particle storage and straight-line motion shared by all wave variants
#[derive(Debug, Clone, Default)]
pub struct WaveSwarm {
    particles: Vec<Particle>,
    next_serial: u32,
}

impl WaveSwarm {
    /// Launch a particle, numbered in launch order until the next `clear`
    pub fn launch(&mut self, pos: Vec2, vel: Vec2) {
        let mut particle = Particle::launched(pos, vel);
        particle.serial = self.next_serial;
        self.next_serial += 1;
        self.particles.push(particle);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.next_serial = 0;
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Apply forces, integrate in a straight line and destroy particles that
    /// crossed the exit boundary. Returns how many were destroyed.
    pub fn update(&mut self, dt: f32, bounds: &SimBounds, forces: &ForceFieldRegistry) -> usize {
        let before = self.particles.len();
        self.particles.retain_mut(|p| {
            let on_screen = bounds.contains(p.pos);
            let inbound = p.is_closing_on(bounds.center());
            p.age_by(dt, on_screen, inbound, FRESH_SPAWN_GRACE);
            forces.apply_all_forces(p.pos, &mut p.vel, dt);
            p.vel = p.vel.clamp_length_max(MAX_PARTICLE_SPEED);
            p.pos += p.vel * dt;
            p.freshly_spawned || !bounds.is_beyond(p.pos, EXIT_MARGIN)
        });
        before - self.particles.len()
    }
}

/// Ring of particles around the viewport center, all aimed inward
#[derive(Debug, Clone)]
pub struct CircularBurst {
    settings: WaveSettings,
    swarm: WaveSwarm,
    active: bool,
}

impl CircularBurst {
    pub fn new(settings: WaveSettings) -> Self {
        Self {
            settings,
            swarm: WaveSwarm::default(),
            active: false,
        }
    }

    /// Ring radius for the given bounds
    pub fn radius(&self, bounds: &SimBounds) -> f32 {
        self.settings
            .radius
            .unwrap_or(bounds.half_extent() + SPAWN_MARGIN)
    }
}

impl WaveMechanic for CircularBurst {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn activation_level(&self) -> u32 {
        self.settings.activation_level
    }

    fn particle_budget(&self) -> usize {
        self.settings.budget
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn activate(&mut self, bounds: &SimBounds) {
        if self.active {
            self.stop();
        }
        let n = self.settings.budget;
        let center = bounds.center();
        let radius = self.radius(bounds);
        for k in 0..n {
            let angle = TAU * k as f32 / n as f32;
            let offset = polar_to_cartesian(radius, angle);
            let vel = (-offset).normalize_or_zero() * self.settings.speed;
            self.swarm.launch(center + offset, vel);
        }
        self.active = true;
    }

    fn stop(&mut self) {
        self.swarm.clear();
        self.active = false;
    }

    fn update(&mut self, dt: f32, bounds: &SimBounds, forces: &ForceFieldRegistry) {
        if !self.active {
            return;
        }
        self.swarm.update(dt, bounds, forces);
        if self.swarm.is_empty() {
            log::debug!("Wave '{}' finished", self.settings.name);
            self.active = false;
        }
    }

    fn particles(&self) -> &[Particle] {
        self.swarm.particles()
    }
}

/// Particles dropped one at a time from evenly spaced columns on the top edge
#[derive(Debug, Clone)]
pub struct TimedSweep {
    settings: WaveSettings,
    swarm: WaveSwarm,
    active: bool,
    /// x coordinate of each launch column
    columns: Vec<f32>,
    elapsed: f32,
    launched: usize,
}

impl TimedSweep {
    pub fn new(settings: WaveSettings) -> Self {
        Self {
            settings,
            swarm: WaveSwarm::default(),
            active: false,
            columns: Vec::new(),
            elapsed: 0.0,
            launched: 0,
        }
    }

    /// Evenly spaced launch columns across the top edge
    pub fn launch_columns(&self, bounds: &SimBounds) -> Vec<f32> {
        let n = self.settings.budget.max(1);
        match self.settings.spacing {
            Some(spacing) => {
                let spacing = spacing.min(bounds.width / n as f32);
                let start = bounds.center().x - spacing * (n - 1) as f32 * 0.5;
                (0..n).map(|k| start + spacing * k as f32).collect()
            }
            None => {
                let step = bounds.width / n as f32;
                (0..n).map(|k| step * (k as f32 + 0.5)).collect()
            }
        }
    }

    /// Particles launched so far in this activation
    pub fn launched(&self) -> usize {
        self.launched
    }

    fn launch_next(&mut self) {
        let x = self.columns[self.launched];
        self.swarm.launch(
            Vec2::new(x, -SWEEP_LAUNCH_OFFSET),
            Vec2::new(0.0, self.settings.speed),
        );
        self.launched += 1;
    }
}

impl WaveMechanic for TimedSweep {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn activation_level(&self) -> u32 {
        self.settings.activation_level
    }

    fn particle_budget(&self) -> usize {
        self.settings.budget
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn activate(&mut self, bounds: &SimBounds) {
        if self.active {
            self.stop();
        }
        self.columns = self.launch_columns(bounds);
        self.launched = 0;
        // Primed so the first particle drops on the first update
        self.elapsed = self.settings.interval;
        self.active = true;
    }

    fn stop(&mut self) {
        self.swarm.clear();
        self.elapsed = 0.0;
        self.launched = 0;
        self.active = false;
    }

    fn update(&mut self, dt: f32, bounds: &SimBounds, forces: &ForceFieldRegistry) {
        if !self.active {
            return;
        }
        self.swarm.update(dt, bounds, forces);

        let budget = self.columns.len().min(self.settings.budget);
        self.elapsed += dt;
        while self.elapsed >= self.settings.interval && self.launched < budget {
            self.launch_next();
            self.elapsed -= self.settings.interval;
        }

        if self.launched >= budget && self.swarm.is_empty() {
            log::debug!("Wave '{}' finished", self.settings.name);
            self.active = false;
        }
    }

    fn particles(&self) -> &[Particle] {
        self.swarm.particles()
    }
}

//! Simulation owner
//!
//! `Simulation` holds every piece of round state: the ambient swarm, the
//! force-field registry, wave mechanics, the level timer and the event sink.
//! It is the single writer for all of it; a multi-threaded host must keep it
//! behind one owner.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::bounds::SimBounds;
use super::collision::CollisionProbe;
use super::events::{EventSink, SimEvent, StatusThrottle};
use super::field::{ParticleField, SpawnProfile};
use super::forces::{FieldId, FieldKind, FieldView, ForceFieldRegistry};
use super::level::LevelProgression;
use super::particle::ParticleView;
use super::waves::{WaveMechanic, build_wave};
use crate::settings::Settings;

/// Complete round state plus the injected event sink
pub struct Simulation<S: EventSink> {
    pub(super) settings: Settings,
    pub(super) bounds: SimBounds,
    pub(super) seed: u64,
    pub(super) rng: Pcg32,
    pub(super) avatar: Vec2,
    pub(super) field: ParticleField,
    pub(super) forces: ForceFieldRegistry,
    pub(super) waves: Vec<Box<dyn WaveMechanic>>,
    pub(super) level: LevelProgression,
    pub(super) probe: CollisionProbe,
    pub(super) throttle: StatusThrottle,
    pub(super) sink: S,
    /// Simulated seconds this round
    pub(super) time: f32,
    pub(super) ticks: u64,
    /// Ticks on which the avatar was touching a particle
    pub(super) hit_ticks: u64,
}

impl<S: EventSink> Simulation<S> {
    /// Create a simulation and start its first round
    pub fn new(settings: &Settings, bounds: SimBounds, seed: u64, sink: S) -> Self {
        let clean = settings.sanitized();
        let mut sim = Self {
            field: ParticleField::new(SpawnProfile::from_settings(&clean)),
            forces: ForceFieldRegistry::new(clean.gravity, clean.particle_mass),
            level: LevelProgression::new(clean.level_duration),
            throttle: StatusThrottle::new(clean.status_interval, clean.collision_cooldown),
            settings: clean,
            bounds,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            avatar: bounds.center(),
            waves: Vec::new(),
            probe: CollisionProbe::default(),
            sink,
            time: 0.0,
            ticks: 0,
            hit_ticks: 0,
        };
        let settings = sim.settings.clone();
        sim.start_round(&settings);
        sim
    }

    /// Reset all round state from a fresh settings snapshot (clamped first)
    pub fn start_round(&mut self, settings: &Settings) {
        self.end_round();

        self.settings = settings.sanitized();
        let s = &self.settings;
        self.field.set_profile(SpawnProfile::from_settings(s));
        self.forces = ForceFieldRegistry::new(s.gravity, s.particle_mass);
        self.waves = s.waves.iter().map(build_wave).collect();
        self.level = LevelProgression::new(s.level_duration);
        self.throttle = StatusThrottle::new(s.status_interval, s.collision_cooldown);
        self.avatar = self.bounds.center();
        self.time = 0.0;
        self.ticks = 0;
        self.hit_ticks = 0;

        let start = s.starting_particles;
        self.field.grow(start, &mut self.rng, &self.bounds, self.avatar);
        log::info!(
            "Round started: {} particles, {} waves, {:.1}s per level ({})",
            self.field.active_count(),
            self.waves.len(),
            self.level.level_duration(),
            self.settings.difficulty.as_str()
        );

        let level = self.level.current_level();
        self.activate_waves_for_level(level);
    }

    /// Release every particle and field. Safe at any tick boundary.
    pub fn end_round(&mut self) {
        self.field.clear();
        self.forces.clear();
        for wave in &mut self.waves {
            wave.stop();
        }
    }

    /// Viewport changed; subsequent spawns and bounds checks use the new size
    pub fn set_viewport(&mut self, size: Vec2) {
        let bounds = SimBounds::from_size(size);
        if bounds != self.bounds {
            log::debug!("Viewport {}x{}", bounds.width, bounds.height);
            self.bounds = bounds;
        }
    }

    pub fn set_avatar(&mut self, avatar: Vec2) {
        if avatar.is_finite() {
            self.avatar = avatar;
        }
    }

    pub fn activate_attractor(&mut self, at: Vec2) -> Option<FieldId> {
        let params = self.settings.attractor;
        self.forces.activate(FieldKind::Attractor, at, &params, &mut self.sink)
    }

    /// Repulsor centered on (and following) the avatar
    pub fn activate_repulsor(&mut self) -> Option<FieldId> {
        let params = self.settings.repulsor;
        self.forces.activate(FieldKind::Repulsor, self.avatar, &params, &mut self.sink)
    }

    pub fn stop_field(&mut self, id: FieldId) -> bool {
        self.forces.stop(id, &mut self.sink)
    }

    /// Fire every wave with this name, exactly as a level-up would.
    /// Unknown names are a no-op.
    pub fn trigger_wave(&mut self, name: &str) -> bool {
        let matches: Vec<usize> = self
            .waves
            .iter()
            .enumerate()
            .filter(|(_, w)| w.name() == name)
            .map(|(i, _)| i)
            .collect();
        if matches.is_empty() {
            log::warn!("No wave named '{}'", name);
            return false;
        }
        for idx in matches {
            self.activate_wave(idx);
        }
        true
    }

    pub fn stop_wave(&mut self, name: &str) -> bool {
        let mut found = false;
        for wave in self.waves.iter_mut().filter(|w| w.name() == name) {
            found = true;
            if wave.is_active() {
                wave.stop();
                self.sink.emit(SimEvent::WaveStopped {
                    name: name.to_string(),
                });
            }
        }
        if !found {
            log::debug!("No wave named '{}' to stop", name);
        }
        found
    }

    pub fn stop_all_waves(&mut self) {
        for wave in &mut self.waves {
            if wave.is_active() {
                wave.stop();
                self.sink.emit(SimEvent::WaveStopped {
                    name: wave.name().to_string(),
                });
            }
        }
    }

    /// Advance one level immediately with the same side effects as the timer
    pub fn force_level_up(&mut self) -> u32 {
        let level = self.level.level_up();
        self.on_level_up(level);
        level
    }

    /// Growth, notifications and wave activation for a newly reached level
    pub(super) fn on_level_up(&mut self, level: u32) {
        let growth = growth_for(self.field.active_count(), self.settings.growth_pct);
        let added = self.field.grow(growth, &mut self.rng, &self.bounds, self.avatar);
        log::info!("Level {} (+{} particles)", level, added);
        self.sink.emit(SimEvent::LevelChanged { level });
        self.activate_waves_for_level(level);
    }

    fn activate_waves_for_level(&mut self, level: u32) {
        for idx in 0..self.waves.len() {
            if self.waves[idx].activation_level() == level {
                self.activate_wave(idx);
            }
        }
    }

    fn activate_wave(&mut self, idx: usize) {
        let wave = &mut self.waves[idx];
        wave.activate(&self.bounds);
        log::info!("Wave '{}' activated ({} particles)", wave.name(), wave.particle_budget());
        self.sink.emit(SimEvent::WaveActivated {
            name: wave.name().to_string(),
            budget: wave.particle_budget(),
        });
    }

    // === Read access ===

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn bounds(&self) -> &SimBounds {
        &self.bounds
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn avatar(&self) -> Vec2 {
        self.avatar
    }

    pub fn level(&self) -> &LevelProgression {
        &self.level
    }

    pub fn current_level(&self) -> u32 {
        self.level.current_level()
    }

    pub fn ambient(&self) -> &ParticleField {
        &self.field
    }

    pub fn forces(&self) -> &ForceFieldRegistry {
        &self.forces
    }

    pub fn waves(&self) -> &[Box<dyn WaveMechanic>] {
        &self.waves
    }

    pub fn wave(&self, name: &str) -> Option<&dyn WaveMechanic> {
        self.waves.iter().find(|w| w.name() == name).map(|w| w.as_ref())
    }

    /// Ambient plus wave-owned particles
    pub fn particle_count(&self) -> usize {
        self.field.active_count()
            + self.waves.iter().map(|w| w.active_particle_count()).sum::<usize>()
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn hit_ticks(&self) -> u64 {
        self.hit_ticks
    }

    pub fn ambient_views(&self) -> impl Iterator<Item = ParticleView> + '_ {
        self.field.views()
    }

    /// Wave particles grouped by wave name
    pub fn wave_views(&self) -> Vec<(&str, Vec<ParticleView>)> {
        self.waves
            .iter()
            .filter(|w| w.active_particle_count() > 0)
            .map(|w| (w.name(), w.views()))
            .collect()
    }

    pub fn field_views(&self) -> impl Iterator<Item = FieldView> + '_ {
        self.forces.views()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Extra ambient particles for a level-up: `ceil(count * pct / 100)`, at
/// least one whenever growth is enabled
pub fn growth_for(count: usize, growth_pct: f32) -> usize {
    if growth_pct <= 0.0 {
        return 0;
    }
    let extra = (count as f32 * growth_pct / 100.0).ceil() as usize;
    extra.max(1)
}

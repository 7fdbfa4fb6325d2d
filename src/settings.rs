//! Round settings
//!
//! A configuration snapshot read once at round start. Out-of-range values are
//! clamped by [`Settings::sanitized`] rather than rejected.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{ATTRACTION_FALLOFF, MAX_AMBIENT_PARTICLES, MAX_WAVE_BUDGET, REPULSION_FALLOFF};
use crate::error::SettingsError;

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Multiplier on nominal particle speed
    pub fn speed_scale(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.75,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.3,
        }
    }

    /// Multiplier on the starting particle count
    pub fn count_scale(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.6,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.5,
        }
    }

    /// Multiplier on per-level growth
    pub fn growth_scale(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.5,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.5,
        }
    }
}

/// Strength/lifetime of one kind of force field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSettings {
    /// Signed strength (attractors positive, repulsors negative after sanitizing)
    pub strength: f32,
    /// Lifetime in seconds
    pub duration: f32,
    /// Distance exponent of the force law
    pub falloff: f32,
}

impl FieldSettings {
    fn attractor_default() -> Self {
        Self {
            strength: 150_000.0,
            duration: 5.0,
            falloff: ATTRACTION_FALLOFF,
        }
    }

    fn repulsor_default() -> Self {
        Self {
            strength: -4_000_000.0,
            duration: 3.0,
            falloff: REPULSION_FALLOFF,
        }
    }
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self::attractor_default()
    }
}

/// Which spawn pattern a wave uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveKind {
    /// Ring of particles converging on the viewport center
    CircularBurst,
    /// Particles launched one by one down from the top edge
    TimedSweep,
}

/// One level-triggered wave mechanic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveSettings {
    pub name: String,
    pub kind: WaveKind,
    /// Level at which the wave fires
    pub activation_level: u32,
    /// Particles produced per activation
    pub budget: usize,
    /// Launch speed of the wave's particles
    #[serde(default = "default_wave_speed")]
    pub speed: f32,
    /// Horizontal distance between sweep launch columns (None = spread over the edge)
    #[serde(default)]
    pub spacing: Option<f32>,
    /// Seconds between sweep launches
    #[serde(default = "default_wave_interval")]
    pub interval: f32,
    /// Burst ring radius (None = just outside the viewport)
    #[serde(default)]
    pub radius: Option<f32>,
}

fn default_wave_speed() -> f32 {
    220.0
}

fn default_wave_interval() -> f32 {
    0.15
}

impl WaveSettings {
    pub fn circular_burst(name: &str, activation_level: u32, budget: usize) -> Self {
        Self {
            name: name.to_string(),
            kind: WaveKind::CircularBurst,
            activation_level,
            budget,
            speed: default_wave_speed(),
            spacing: None,
            interval: default_wave_interval(),
            radius: None,
        }
    }

    pub fn timed_sweep(name: &str, activation_level: u32, budget: usize, interval: f32) -> Self {
        Self {
            name: name.to_string(),
            kind: WaveKind::TimedSweep,
            activation_level,
            budget,
            speed: default_wave_speed(),
            spacing: None,
            interval,
            radius: None,
        }
    }
}

/// Round configuration snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Difficulty preset. JSON snapshots take the preset's speed, count and
    /// growth for any of those keys they leave out.
    pub difficulty: Difficulty,

    // === Swarm ===
    /// Nominal particle speed (px/s)
    pub particle_speed: f32,
    /// Pursuit turn rate (rad/s)
    pub turn_rate: f32,
    /// Speed variance in percent of nominal
    pub speed_variance_pct: f32,
    /// Chance (percent) that a spawn gets its speed/turn rate randomized
    pub randomizer_pct: f32,
    /// Ambient particles at round start
    pub starting_particles: usize,
    /// Ambient growth per level, percent of the current count
    pub growth_pct: f32,
    /// Seconds per level
    pub level_duration: f32,
    /// Aim new particles at the avatar instead of a random point on screen
    pub spawn_toward_avatar: bool,
    /// Particles steer toward the avatar every tick
    pub chase_enabled: bool,

    // === Force fields ===
    pub attractor: FieldSettings,
    pub repulsor: FieldSettings,
    /// Gravitational constant of the force law
    pub gravity: f32,
    /// Mass of every particle
    pub particle_mass: f32,

    // === Events ===
    /// Minimum seconds between particle-count notifications
    pub status_interval: f32,
    /// Minimum seconds between collision notifications
    pub collision_cooldown: f32,

    // === Waves ===
    pub waves: Vec<WaveSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,

            particle_speed: 160.0,
            turn_rate: 1.5,
            speed_variance_pct: 30.0,
            randomizer_pct: 50.0,
            starting_particles: 30,
            growth_pct: 10.0,
            level_duration: 15.0,
            spawn_toward_avatar: true,
            chase_enabled: false,

            attractor: FieldSettings::attractor_default(),
            repulsor: FieldSettings::repulsor_default(),
            gravity: 1.0,
            particle_mass: 1.0,

            status_interval: 0.25,
            collision_cooldown: 0.5,

            waves: vec![
                WaveSettings::circular_burst("ring", 3, 24),
                WaveSettings::timed_sweep("rain", 5, 20, 0.15),
            ],
        }
    }
}

impl Settings {
    /// Create settings from a difficulty preset
    pub fn from_preset(difficulty: Difficulty) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(difficulty);
        settings
    }

    /// Apply a difficulty preset (rescales speed, count and growth from defaults)
    pub fn apply_preset(&mut self, difficulty: Difficulty) {
        let base = Self::default();
        self.difficulty = difficulty;
        self.particle_speed = base.particle_speed * difficulty.speed_scale();
        self.starting_particles =
            (base.starting_particles as f32 * difficulty.count_scale()).round() as usize;
        self.growth_pct = base.growth_pct * difficulty.growth_scale();
    }

    /// Speed variance as a fraction (0.3 = ±30%)
    pub fn speed_variance(&self) -> f32 {
        self.speed_variance_pct / 100.0
    }

    /// Randomizer chance as a probability
    pub fn randomizer_chance(&self) -> f64 {
        f64::from(self.randomizer_pct / 100.0)
    }

    /// Copy with every parameter clamped to a valid range
    pub fn sanitized(&self) -> Self {
        let mut s = self.clone();
        s.particle_speed = finite_or(s.particle_speed, 160.0).clamp(10.0, 2000.0);
        s.turn_rate = finite_or(s.turn_rate, 1.5).clamp(0.0, 4.0 * std::f32::consts::PI);
        s.speed_variance_pct = finite_or(s.speed_variance_pct, 0.0).clamp(0.0, 100.0);
        s.randomizer_pct = finite_or(s.randomizer_pct, 0.0).clamp(0.0, 100.0);
        s.starting_particles = s.starting_particles.min(MAX_AMBIENT_PARTICLES);
        s.growth_pct = finite_or(s.growth_pct, 0.0).clamp(0.0, 500.0);
        s.level_duration = finite_or(s.level_duration, 15.0).clamp(1.0, 600.0);

        s.attractor.strength = finite_or(s.attractor.strength, 0.0).abs().max(1.0);
        s.attractor.duration = finite_or(s.attractor.duration, 5.0).clamp(0.1, 120.0);
        s.attractor.falloff = finite_or(s.attractor.falloff, ATTRACTION_FALLOFF).clamp(0.5, 3.0);
        s.repulsor.strength = -finite_or(s.repulsor.strength, 0.0).abs().max(1.0);
        s.repulsor.duration = finite_or(s.repulsor.duration, 3.0).clamp(0.1, 120.0);
        s.repulsor.falloff = finite_or(s.repulsor.falloff, REPULSION_FALLOFF).clamp(0.5, 3.0);
        s.gravity = finite_or(s.gravity, 1.0).abs().max(1e-3);
        s.particle_mass = finite_or(s.particle_mass, 1.0).abs().max(1e-3);

        s.status_interval = finite_or(s.status_interval, 0.25).clamp(0.0, 10.0);
        s.collision_cooldown = finite_or(s.collision_cooldown, 0.5).clamp(0.0, 10.0);

        for wave in &mut s.waves {
            wave.activation_level = wave.activation_level.max(1);
            wave.budget = wave.budget.clamp(1, MAX_WAVE_BUDGET);
            wave.speed = finite_or(wave.speed, default_wave_speed()).clamp(10.0, 2000.0);
            wave.interval = finite_or(wave.interval, default_wave_interval()).clamp(0.01, 10.0);
            wave.spacing = wave.spacing.filter(|v| v.is_finite() && *v > 0.0);
            wave.radius = wave.radius.filter(|v| v.is_finite() && *v > 0.0);
        }
        s
    }

    /// Parse a snapshot from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let mut settings: Self = serde_json::from_value(value.clone())?;

        if settings.difficulty != Difficulty::Normal {
            let preset = Self::from_preset(settings.difficulty);
            let unset = |key: &str| value.get(key).is_none();
            if unset("particle_speed") {
                settings.particle_speed = preset.particle_speed;
            }
            if unset("starting_particles") {
                settings.starting_particles = preset.starting_particles;
            }
            if unset("growth_pct") {
                settings.growth_pct = preset.growth_pct;
            }
        }
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a snapshot from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_json(&text)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

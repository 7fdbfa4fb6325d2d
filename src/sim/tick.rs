//! Per-frame simulation tick
//!
//! Fixed ordering every frame:
//! 1. age/expire force fields
//! 2. steer, apply forces and integrate ambient and wave particles
//! 3. recycle (ambient) or destroy (wave) particles that left the play area
//! 4. probe collisions against the avatar
//! 5. level progression plus wave commands, which may activate waves
//!    (they first move next tick, whichever way they were triggered)
//! 6. rate-limited status events

use glam::Vec2;

use super::events::EventSink;
use super::forces::FieldId;
use super::state::Simulation;
use crate::consts::MAX_DT;

/// Host requests. Field commands apply at the start of a tick; wave and
/// level commands apply at the level step, in the order given.
#[derive(Debug, Clone, PartialEq)]
pub enum SimCommand {
    ActivateAttractor { at: Vec2 },
    /// Repulsor on the avatar's current position
    ActivateRepulsor,
    StopField(FieldId),
    TriggerWave(String),
    StopWave(String),
    StopAllWaves,
    ForceLevelUp,
}

impl SimCommand {
    /// Whether the command is deferred to the level step
    pub fn runs_at_level_step(&self) -> bool {
        matches!(
            self,
            Self::TriggerWave(_) | Self::StopWave(_) | Self::StopAllWaves | Self::ForceLevelUp
        )
    }
}

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Avatar position this frame
    pub avatar: Vec2,
    /// New viewport size, if it changed
    pub viewport: Option<Vec2>,
    pub commands: Vec<SimCommand>,
}

impl TickInput {
    pub fn at(avatar: Vec2) -> Self {
        Self {
            avatar,
            ..Self::default()
        }
    }

    pub fn with_command(mut self, command: SimCommand) -> Self {
        self.commands.push(command);
        self
    }
}

/// What happened during a tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickOutcome {
    /// The step actually simulated after clamping
    pub dt: f32,
    /// Avatar touched at least one particle
    pub collided: bool,
    /// Ambient particles retired and replaced
    pub recycled: usize,
    /// Level reached by the timer this tick
    pub level_up: Option<u32>,
}

/// Clamp a frame delta into `[0, MAX_DT]`
#[inline]
pub fn clamp_dt(dt: f32) -> f32 {
    if dt.is_finite() { dt.clamp(0.0, MAX_DT) } else { 0.0 }
}

/// Advance the simulation by one frame
pub fn tick<S: EventSink>(sim: &mut Simulation<S>, input: &TickInput, dt: f32) -> TickOutcome {
    let dt = clamp_dt(dt);

    if let Some(size) = input.viewport {
        sim.set_viewport(size);
    }
    sim.set_avatar(input.avatar);
    for command in input.commands.iter().filter(|c| !c.runs_at_level_step()) {
        apply_command(sim, command);
    }

    // 1. Fields
    sim.forces.update(dt, sim.avatar, &mut sim.sink);

    // 2 + 3. Motion and recycling
    let recycled = sim
        .field
        .update(dt, sim.avatar, &sim.bounds, &sim.forces, &mut sim.rng);
    for wave in sim.waves.iter_mut() {
        wave.update(dt, &sim.bounds, &sim.forces);
    }

    // 4. Collisions
    let collided = sim.probe.check(sim.avatar, sim.field.positions())
        || sim
            .waves
            .iter()
            .any(|w| w.check_collisions(&sim.probe, sim.avatar));
    if collided {
        sim.hit_ticks += 1;
    }

    // 5. Levels
    let level_up = sim.level.update(dt);
    if let Some(level) = level_up {
        sim.on_level_up(level);
    }
    for command in input.commands.iter().filter(|c| c.runs_at_level_step()) {
        apply_command(sim, command);
    }

    // 6. Status
    let count = sim.particle_count();
    sim.throttle.update(dt, count, collided, &mut sim.sink);

    sim.time += dt;
    sim.ticks += 1;

    TickOutcome {
        dt,
        collided,
        recycled,
        level_up,
    }
}

fn apply_command<S: EventSink>(sim: &mut Simulation<S>, command: &SimCommand) {
    match command {
        SimCommand::ActivateAttractor { at } => {
            sim.activate_attractor(*at);
        }
        SimCommand::ActivateRepulsor => {
            sim.activate_repulsor();
        }
        SimCommand::StopField(id) => {
            sim.stop_field(*id);
        }
        SimCommand::TriggerWave(name) => {
            sim.trigger_wave(name);
        }
        SimCommand::StopWave(name) => {
            sim.stop_wave(name);
        }
        SimCommand::StopAllWaves => sim.stop_all_waves(),
        SimCommand::ForceLevelUp => {
            sim.force_level_up();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::MAX_AMBIENT_PARTICLES;
    use crate::settings::{Settings, WaveSettings};
    use crate::sim::bounds::SimBounds;
    use crate::sim::events::{EventLog, SimEvent};
    use crate::sim::forces::FieldKind;

    const DT: f32 = 1.0 / 60.0;

    fn quiet_settings() -> Settings {
        Settings {
            level_duration: 600.0,
            growth_pct: 0.0,
            chase_enabled: false,
            waves: Vec::new(),
            ..Settings::default()
        }
    }

    fn new_sim(settings: &Settings, seed: u64) -> Simulation<EventLog> {
        Simulation::new(settings, SimBounds::new(800.0, 600.0), seed, EventLog::default())
    }

    fn activations(log: &EventLog) -> Vec<String> {
        log.events()
            .iter()
            .filter_map(|e| match e {
                SimEvent::WaveActivated { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn round_start_populates_swarm() {
        let sim = new_sim(&quiet_settings(), 1);
        assert_eq!(sim.ambient().active_count(), 30);
        assert_eq!(sim.current_level(), 1);
        assert_eq!(sim.particle_count(), 30);
    }

    #[test]
    fn dt_is_clamped() {
        let mut sim = new_sim(&quiet_settings(), 1);
        let out = tick(&mut sim, &TickInput::at(Vec2::new(400.0, 300.0)), 10.0);
        assert_eq!(out.dt, MAX_DT);
        assert_eq!(sim.time(), MAX_DT);
        let out = tick(&mut sim, &TickInput::at(Vec2::new(400.0, 300.0)), f32::NAN);
        assert_eq!(out.dt, 0.0);
        assert_eq!(clamp_dt(-1.0), 0.0);
    }

    #[test]
    fn population_is_conserved_without_level_ups() {
        let mut sim = new_sim(&quiet_settings(), 4);
        let mut recycled = 0;
        for _ in 0..(60 * 30) {
            let out = tick(&mut sim, &TickInput::at(Vec2::new(400.0, 300.0)), DT);
            recycled += out.recycled;
            assert_eq!(sim.ambient().active_count(), 30);
        }
        assert!(recycled > 0);
        let field = sim.ambient();
        assert_eq!(field.allocated(), field.active_count() + field.pooled_count());
    }

    #[test]
    fn level_up_grows_swarm() {
        let settings = Settings {
            growth_pct: 10.0,
            ..quiet_settings()
        };
        let mut sim = new_sim(&settings, 2);
        assert_eq!(sim.force_level_up(), 2);
        assert_eq!(sim.ambient().active_count(), 33);
        assert!(sim.sink().events().contains(&SimEvent::LevelChanged { level: 2 }));
    }

    #[test]
    fn timer_levels_up_and_fires_matching_waves() {
        let settings = Settings {
            level_duration: 1.0,
            waves: vec![
                WaveSettings::circular_burst("ring", 2, 8),
                WaveSettings::timed_sweep("rain", 2, 5, 0.1),
                WaveSettings::circular_burst("late", 9, 4),
            ],
            ..quiet_settings()
        };
        let mut sim = new_sim(&settings, 3);
        let avatar = Vec2::new(400.0, 300.0);
        let mut reached = None;
        for _ in 0..120 {
            let out = tick(&mut sim, &TickInput::at(avatar), MAX_DT);
            if out.level_up.is_some() {
                reached = out.level_up;
                break;
            }
        }
        assert_eq!(reached, Some(2));
        assert_eq!(activations(sim.sink()), vec!["ring".to_string(), "rain".to_string()]);
        assert_eq!(sim.wave("ring").map(|w| w.active_particle_count()), Some(8));
        assert!(sim.wave("rain").is_some_and(|w| w.is_active()));
        assert!(sim.wave("late").is_some_and(|w| !w.is_active()));
    }

    #[test]
    fn burst_at_level_five_scenario() {
        let settings = Settings {
            waves: vec![WaveSettings::circular_burst("burst", 5, 8)],
            ..quiet_settings()
        };
        let mut sim = new_sim(&settings, 5);
        for _ in 0..3 {
            sim.force_level_up();
        }
        assert!(activations(sim.sink()).is_empty());
        assert_eq!(sim.force_level_up(), 5);
        assert_eq!(activations(sim.sink()), vec!["burst".to_string()]);

        let wave = sim.wave("burst").unwrap();
        assert_eq!(wave.active_particle_count(), 8);
        let center = sim.bounds().center();
        let mut angles: Vec<f32> = wave
            .particles()
            .iter()
            .map(|p| {
                assert!(p.vel.dot(center - p.pos) > 0.0);
                assert!((p.vel.normalize() - (center - p.pos).normalize()).length() < 1e-4);
                crate::heading_of(p.pos - center).to_degrees().rem_euclid(360.0)
            })
            .collect();
        angles.sort_by(|a, b| a.total_cmp(b));
        for (k, angle) in angles.iter().enumerate() {
            assert!((angle - 45.0 * k as f32).abs() < 1e-2, "{angles:?}");
        }
    }

    #[test]
    fn manual_and_automatic_activation_match() {
        let settings = Settings {
            level_duration: 1.0,
            waves: vec![
                WaveSettings::circular_burst("ring", 2, 6),
                WaveSettings::timed_sweep("rain", 2, 3, 0.5),
            ],
            ..quiet_settings()
        };
        let avatar = Vec2::new(400.0, 300.0);
        let plain = TickInput::at(avatar);

        let mut auto = new_sim(&settings, 9);
        while tick(&mut auto, &plain, MAX_DT).level_up.is_none() {}

        let mut manual = new_sim(&settings, 9);
        tick(&mut manual, &plain.clone().with_command(SimCommand::ForceLevelUp), MAX_DT);

        let mut by_name = new_sim(&settings, 9);
        let triggers = plain
            .clone()
            .with_command(SimCommand::TriggerWave("ring".into()))
            .with_command(SimCommand::TriggerWave("rain".into()));
        tick(&mut by_name, &triggers, MAX_DT);

        // Nothing moves or drops on the activating tick, whichever path fired it
        let center = auto.bounds().center();
        for p in auto.wave("ring").unwrap().particles() {
            assert!(((p.pos - center).length() - 460.0).abs() < 1e-3);
        }
        assert_eq!(auto.wave("rain").unwrap().active_particle_count(), 0);

        for step in 0..3 {
            for name in ["ring", "rain"] {
                let auto_views = auto.wave(name).unwrap().views();
                assert_eq!(auto_views, manual.wave(name).unwrap().views(), "{name} step {step}");
                assert_eq!(auto_views, by_name.wave(name).unwrap().views(), "{name} step {step}");
            }
            for sim in [&mut auto, &mut manual, &mut by_name] {
                tick(sim, &plain, MAX_DT);
            }
        }
        assert_eq!(auto.wave("rain").unwrap().active_particle_count(), 1);
        assert_eq!(activations(auto.sink()), activations(manual.sink()));
        assert_eq!(activations(auto.sink()), activations(by_name.sink()));
    }

    #[test]
    fn repeated_triggers_never_exceed_budget() {
        let settings = Settings {
            waves: vec![
                WaveSettings::circular_burst("ring", 3, 10),
                WaveSettings::timed_sweep("rain", 3, 7, 0.02),
            ],
            ..quiet_settings()
        };
        let mut sim = new_sim(&settings, 6);
        let input = TickInput::at(Vec2::new(400.0, 300.0))
            .with_command(SimCommand::TriggerWave("ring".into()))
            .with_command(SimCommand::TriggerWave("ring".into()))
            .with_command(SimCommand::TriggerWave("rain".into()))
            .with_command(SimCommand::TriggerWave("rain".into()));
        for _ in 0..30 {
            tick(&mut sim, &input, DT);
            assert!(sim.wave("ring").unwrap().active_particle_count() <= 10);
            assert!(sim.wave("rain").unwrap().active_particle_count() <= 7);
        }
    }

    #[test]
    fn unknown_wave_is_a_no_op() {
        let mut sim = new_sim(&quiet_settings(), 1);
        let before = sim.sink().events().len();
        assert!(!sim.trigger_wave("nope"));
        assert!(!sim.stop_wave("nope"));
        assert_eq!(sim.sink().events().len(), before);
    }

    #[test]
    fn level_one_waves_fire_at_round_start() {
        let settings = Settings {
            waves: vec![WaveSettings::circular_burst("opener", 1, 5)],
            ..quiet_settings()
        };
        let sim = new_sim(&settings, 1);
        assert_eq!(activations(sim.sink()), vec!["opener".to_string()]);
        assert_eq!(sim.particle_count(), 35);
    }

    #[test]
    fn collision_with_ambient_particle_is_reported() {
        let mut sim = new_sim(&quiet_settings(), 12);
        let p = sim.ambient().particles().next().unwrap().clone();
        // Where the particle will be after this tick's integration
        let target = p.pos + p.vel * DT;
        let out = tick(&mut sim, &TickInput::at(target), DT);
        assert!(out.collided);
        assert_eq!(sim.hit_ticks(), 1);
        assert!(sim.sink().events().contains(&SimEvent::CollisionDetected));

        let far = tick(&mut sim, &TickInput::at(Vec2::new(-5000.0, -5000.0)), DT);
        assert!(!far.collided);
    }

    #[test]
    fn field_commands_round_trip() {
        let settings = Settings {
            attractor: crate::settings::FieldSettings {
                strength: 1000.0,
                duration: 0.1,
                falloff: 1.5,
            },
            ..quiet_settings()
        };
        let mut sim = new_sim(&settings, 1);
        let input = TickInput::at(Vec2::new(100.0, 100.0))
            .with_command(SimCommand::ActivateAttractor { at: Vec2::new(400.0, 300.0) })
            .with_command(SimCommand::ActivateRepulsor);
        tick(&mut sim, &input, DT);
        assert_eq!(sim.forces().len(), 2);

        // Repulsor follows the avatar
        tick(&mut sim, &TickInput::at(Vec2::new(200.0, 250.0)), DT);
        let rep = sim
            .field_views()
            .find(|f| f.kind == FieldKind::Repulsor)
            .unwrap();
        assert_eq!(rep.position, Vec2::new(200.0, 250.0));

        for _ in 0..10 {
            tick(&mut sim, &TickInput::at(Vec2::new(200.0, 250.0)), DT);
        }
        assert!(sim.field_views().all(|f| f.kind == FieldKind::Repulsor));
        assert!(sim
            .sink()
            .events()
            .contains(&SimEvent::FieldExpired { kind: FieldKind::Attractor }));

        let id = rep.id;
        tick(&mut sim, &TickInput::at(Vec2::ZERO).with_command(SimCommand::StopField(id)), DT);
        assert!(sim.forces().is_empty());
    }

    #[test]
    fn stop_releases_everything_immediately() {
        let settings = Settings {
            waves: vec![WaveSettings::circular_burst("ring", 4, 12)],
            ..quiet_settings()
        };
        let mut sim = new_sim(&settings, 8);
        sim.trigger_wave("ring");
        sim.activate_attractor(Vec2::ZERO);
        tick(&mut sim, &TickInput::default().with_command(SimCommand::StopAllWaves), DT);
        assert_eq!(sim.wave("ring").unwrap().active_particle_count(), 0);
        assert!(sim
            .sink()
            .events()
            .contains(&SimEvent::WaveStopped { name: "ring".into() }));

        sim.end_round();
        assert_eq!(sim.particle_count(), 0);
        assert!(sim.forces().is_empty());
        assert_eq!(sim.ambient().pooled_count(), sim.ambient().allocated());
    }

    #[test]
    fn restart_reuses_pool() {
        let mut sim = new_sim(&quiet_settings(), 8);
        let allocated = sim.ambient().allocated();
        sim.start_round(&quiet_settings());
        assert_eq!(sim.ambient().active_count(), 30);
        assert_eq!(sim.ambient().allocated(), allocated);
        assert_eq!(sim.time(), 0.0);
    }

    #[test]
    fn status_events_are_throttled() {
        let mut sim = new_sim(&quiet_settings(), 3);
        for _ in 0..60 {
            tick(&mut sim, &TickInput::at(Vec2::new(-5000.0, 0.0)), DT);
        }
        let counts = sim
            .sink()
            .count_where(|e| matches!(e, SimEvent::ParticleCountChanged { .. }));
        // Population is constant, so only the initial report goes out
        assert_eq!(counts, 1);
    }

    #[test]
    fn viewport_change_moves_spawn_ring() {
        let mut sim = new_sim(&quiet_settings(), 3);
        let input = TickInput {
            avatar: Vec2::new(100.0, 100.0),
            viewport: Some(Vec2::new(200.0, 200.0)),
            commands: Vec::new(),
        };
        tick(&mut sim, &input, DT);
        assert_eq!(sim.bounds().size(), Vec2::new(200.0, 200.0));
        sim.force_level_up();
        assert!(sim.ambient().active_count() <= MAX_AMBIENT_PARTICLES);
    }

    #[test]
    fn same_seed_same_run() {
        let settings = Settings {
            chase_enabled: true,
            level_duration: 2.0,
            growth_pct: 20.0,
            ..Settings::default()
        };
        let run = |seed| {
            let mut sim = new_sim(&settings, seed);
            for i in 0..300 {
                let t = i as f32 * DT;
                let avatar = Vec2::new(400.0 + 150.0 * t.cos(), 300.0 + 100.0 * t.sin());
                tick(&mut sim, &TickInput::at(avatar), DT);
            }
            sim.ambient_views().collect::<Vec<_>>()
        };
        assert_eq!(run(77), run(77));
        assert_ne!(run(77), run(78));
    }
}

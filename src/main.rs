//! Swarm Dodge headless driver
//!
//! Runs a round with a scripted avatar and logs every simulation event.
//!
//! Usage: `swarm-dodge [settings.json] [seconds] [seed]`

use glam::Vec2;

use swarm_dodge::Settings;
use swarm_dodge::sim::{SimBounds, SimCommand, SimEvent, Simulation, TickInput, tick};

const FRAME_DT: f32 = 1.0 / 60.0;

fn main() {
    env_logger::init();
    log::info!("Swarm Dodge (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => match Settings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        },
        None => Settings::default(),
    };
    let seconds: f32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(60.0);
    let seed: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);

    let bounds = SimBounds::new(1280.0, 720.0);
    let mut hits = 0u32;
    let sink = move |event: SimEvent| match event {
        SimEvent::ParticleCountChanged { count } => log::debug!("particles: {count}"),
        SimEvent::CollisionDetected => log::info!("hit!"),
        other => log::info!("{other:?}"),
    };
    let mut sim = Simulation::new(&settings, bounds, seed, sink);
    log::info!("Simulating {seconds:.0}s with seed {seed}");

    let frames = (seconds / FRAME_DT).ceil() as u64;
    for frame in 0..frames {
        let t = frame as f32 * FRAME_DT;
        let mut input = TickInput::at(avatar_path(&bounds, t));

        // Scripted power-ups: an attractor every 12s, a repulsor every 20s
        if frame % 720 == 360 {
            input.commands.push(SimCommand::ActivateAttractor {
                at: bounds.center() + Vec2::new(200.0 * t.sin(), 0.0),
            });
        }
        if frame % 1200 == 600 {
            input.commands.push(SimCommand::ActivateRepulsor);
        }

        if tick(&mut sim, &input, FRAME_DT).collided {
            hits += 1;
        }
    }

    println!(
        "level {} | {} particles | {} hit ticks | {:.1}s simulated",
        sim.current_level(),
        sim.particle_count(),
        hits,
        sim.time()
    );
}

/// Lissajous path around the viewport center
fn avatar_path(bounds: &SimBounds, t: f32) -> Vec2 {
    let amp = bounds.size() * 0.35;
    bounds.center() + Vec2::new(amp.x * (0.7 * t).sin(), amp.y * (1.1 * t).cos())
}

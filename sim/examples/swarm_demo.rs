//! Demonstration of the swarm simulation.
//!
//! Run with: cargo run --example swarm_demo [config.toml]

use swarm_sim::{Particles, SimulationConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig {
            seed: Some(1),
            ..Default::default()
        },
    };

    println!("=== Swarm Simulation Demo ===\n");
    println!(
        "radius={} population window=[{}, {}] speed={}",
        config.radius,
        config.min_population(),
        config.max_population(),
        config.travel_speed
    );

    let mut sim = Particles::new(config)?;
    sim.profiler_mut().log_interval = 100;

    for _ in 0..300 {
        sim.tick();
        if sim.current_tick() % 50 == 0 {
            print_summary(&sim);
        }
    }

    println!("\nTick timing: {}", sim.profiler().stats());
    println!("\n=== Final State (first 5 particles) ===\n");
    for particle in sim.snapshot().iter().take(5) {
        println!("{}", serde_json::to_string(particle)?);
    }
    Ok(())
}

fn print_summary(sim: &Particles) {
    let (mut left, mut right, mut close) = (0u64, 0u64, 0u64);
    for particle in sim.particles() {
        left += particle.counts.left as u64;
        right += particle.counts.right as u64;
        close += particle.counts.close as u64;
    }
    let report = sim.last_report();
    println!(
        "--- Tick {} --- particles={} escaped={} spawned={} culled={} left={} right={} close={}",
        sim.current_tick(),
        sim.len(),
        report.escaped,
        report.spawned,
        report.culled,
        left,
        right,
        close
    );
}

//! Population regulation - keeps the particle count inside the density window.
//!
//! Runs first in every tick, in two phases:
//!
//! 1. **Prune** particles that left the circular region, then, if the survivors
//!    still exceed the upper bound, cull a random subset down to it.
//! 2. **Respawn** uniformly inside the bounding square until the lower bound is
//!    met. Points landing in the square's corners are outside the circle and
//!    get pruned on the next tick.
//!
//! Both bounds come from [`SimulationConfig::min_population`] and
//! [`SimulationConfig::max_population`]. Since those are validated to be
//! ordered, the respawn phase can never push the count back over the top.

use crate::components::*;
use crate::config::SimulationConfig;
use crate::registry::{despawn_particle, spawn_particle, ParticleRegistry, ParticleRng};
use bevy_ecs::prelude::*;
use rand::seq::SliceRandom;

/// What one regulation pass did. Stored as a resource for inspection.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulationReport {
    /// Removed for leaving the region.
    pub escaped: usize,
    /// Removed to respect the maximum density.
    pub culled: usize,
    /// Spawned to respect the minimum density.
    pub spawned: usize,
    /// Live count after regulation.
    pub population: usize,
}

/// System that prunes and respawns particles.
///
/// ## Data Access
/// - Reads: ParticleId, Position, SimulationConfig
/// - Writes: ParticleRegistry, ParticleRng, PopulationReport (spawns/despawns via Commands)
pub fn population_system(
    mut commands: Commands,
    config: Res<SimulationConfig>,
    mut registry: ResMut<ParticleRegistry>,
    mut rng: ResMut<ParticleRng>,
    mut report: ResMut<PopulationReport>,
    query: Query<(Entity, &ParticleId, &Position)>,
) {
    let radius_sq = config.radius * config.radius;
    let mut outcome = PopulationReport::default();

    // PRUNE PHASE: containment
    let mut survivors = Vec::new();
    for (entity, id, pos) in query.iter() {
        // Written as a negation so non-finite positions are pruned too.
        if !(config.origin.distance_squared(pos) <= radius_sq) {
            despawn_particle(&mut commands, &mut registry, entity, *id);
            outcome.escaped += 1;
        } else {
            survivors.push((entity, *id));
        }
    }

    // PRUNE PHASE: maximum density
    let max_population = config.max_population();
    let mut population = survivors.len();
    if population > max_population {
        let excess = population - max_population;
        let (culled, _) = survivors.partial_shuffle(&mut rng.0, excess);
        for &(entity, id) in culled.iter() {
            despawn_particle(&mut commands, &mut registry, entity, id);
        }
        outcome.culled = excess;
        population = max_population;
    }

    // RESPAWN PHASE: minimum density
    let min_population = config.min_population();
    while population < min_population {
        let position = rng.point_in_square(config.origin, config.radius);
        spawn_particle(&mut commands, &mut registry, &mut rng, position, config.travel_speed);
        population += 1;
        outcome.spawned += 1;
    }
    outcome.population = population;

    if outcome.escaped + outcome.culled + outcome.spawned > 0 {
        tracing::debug!(
            escaped = outcome.escaped,
            culled = outcome.culled,
            spawned = outcome.spawned,
            population = outcome.population,
            "Regulated population"
        );
    }
    *report = outcome;
}

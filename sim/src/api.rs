//! Public API for the simulation.
//!
//! [`Particles`] owns the ECS world holding the particle field together with
//! the schedule that advances it. A caller builds one from a validated
//! [`SimulationConfig`], calls [`Particles::tick`] on its own clock, and reads
//! the field between ticks through [`Particles::particles`] or
//! [`Particles::snapshot`].
//!
//! ## One tick
//!
//! Each tick runs one chained schedule: regulate the population, rebuild the
//! spatial index, steer every particle, then advance positions. A tick always
//! runs to completion; nothing observes the world part-way through.

use crate::components::*;
use crate::config::{ConfigError, SimulationConfig};
use crate::profiler::TickProfiler;
use crate::registry::{ParticleRegistry, ParticleRng};
use crate::spatial::{spatial_index_rebuild_system, SpatialIndex};
use crate::systems::*;
use crate::world::{ExternalParticle, ParticleView, Snapshot};
use bevy_ecs::prelude::*;

type ViewData = (
    &'static ParticleId,
    &'static Position,
    &'static Velocity,
    &'static NeighborCounts,
);

/// The particle simulation engine.
pub struct Particles {
    world: World,
    schedule: Schedule,
    /// Read query, kept current after every mutation so reads only need `&self`.
    view: QueryState<ViewData>,
    tick: u64,
    profiler: TickProfiler,
}

impl Particles {
    /// Build an engine. Fails if the configuration is invalid.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut world = World::new();
        world.insert_resource(SpatialIndex::new(config.effective_cell_size()));
        world.insert_resource(ParticleRegistry::default());
        world.insert_resource(ParticleRng::new(config.seed));
        world.insert_resource(PopulationReport::default());

        tracing::info!(
            radius = config.radius,
            min_population = config.min_population(),
            max_population = config.max_population(),
            seeded = config.seed.is_some(),
            "Created particle simulation"
        );
        world.insert_resource(config);

        // Deferred spawns/despawns from regulation are applied before the
        // rebuild, so the index always matches the regulated set.
        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                population_system,
                spatial_index_rebuild_system,
                steering_system,
                advance_system,
            )
                .chain(),
        );

        let view = world.query::<ViewData>();

        Ok(Self {
            world,
            schedule,
            view,
            tick: 0,
            profiler: TickProfiler::new(),
        })
    }

    /// Run one complete simulation tick.
    pub fn tick(&mut self) {
        let Self {
            world,
            schedule,
            profiler,
            ..
        } = self;
        profiler.time_tick(|| schedule.run(world));
        self.tick += 1;
        self.refresh_view();

        let population = self.len();
        self.profiler.record_population(population);
        tracing::trace!(tick = self.tick, population = population, "Tick complete");
    }

    /// Add a particle at `position`, heading along +x at travel speed.
    pub fn spawn(&mut self, position: Position) -> ParticleId {
        let travel_speed = self.config().travel_speed;
        let id = self
            .world
            .resource_scope(|world, mut rng: Mut<ParticleRng>| {
                world.resource::<ParticleRegistry>().fresh_id(&mut rng)
            });
        let entity = self
            .world
            .spawn(ParticleBundle::new(id, position, travel_speed))
            .id();
        self.world.resource_mut::<ParticleRegistry>().insert(id, entity);
        self.refresh_view();
        id
    }

    /// Remove every particle matching `predicate`. Returns how many were removed.
    pub fn prune<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&ParticleView) -> bool,
    {
        let doomed: Vec<(Entity, ParticleId)> = self
            .world
            .query::<(Entity, &ParticleId, &Position, &Velocity, &NeighborCounts)>()
            .iter(&self.world)
            .filter_map(|(entity, id, position, velocity, counts)| {
                let view = ParticleView {
                    id: *id,
                    position: *position,
                    velocity: *velocity,
                    counts: *counts,
                };
                predicate(&view).then_some((entity, *id))
            })
            .collect();

        for &(entity, id) in &doomed {
            self.world.despawn(entity);
            self.world.resource_mut::<ParticleRegistry>().remove(id);
        }
        self.refresh_view();
        doomed.len()
    }

    /// Merge particles owned elsewhere into the field.
    ///
    /// Known ids have their position and velocity overwritten; unknown ids are
    /// inserted with zeroed neighbor counts. Returns the number inserted.
    pub fn merge_external<I>(&mut self, particles: I) -> usize
    where
        I: IntoIterator<Item = ExternalParticle>,
    {
        let mut inserted = 0;
        for external in particles {
            let id = external.id();
            let existing = self
                .world
                .resource::<ParticleRegistry>()
                .get(id)
                .filter(|&entity| self.world.get::<ParticleId>(entity).is_some());
            match existing {
                Some(entity) => {
                    if let Some(mut position) = self.world.get_mut::<Position>(entity) {
                        *position = external.position();
                    }
                    if let Some(mut velocity) = self.world.get_mut::<Velocity>(entity) {
                        *velocity = external.velocity();
                    }
                }
                None => {
                    let entity = self
                        .world
                        .spawn(ParticleBundle::with_velocity(
                            id,
                            external.position(),
                            external.velocity(),
                        ))
                        .id();
                    self.world.resource_mut::<ParticleRegistry>().insert(id, entity);
                    inserted += 1;
                }
            }
        }
        self.refresh_view();
        if inserted > 0 {
            tracing::debug!(inserted = inserted, "Merged external particles");
        }
        inserted
    }

    /// Iterate the live particles. Order is unspecified.
    pub fn particles(&self) -> impl Iterator<Item = ParticleView> + '_ {
        self.view
            .iter_manual(&self.world)
            .map(|(id, position, velocity, counts)| ParticleView {
                id: *id,
                position: *position,
                velocity: *velocity,
                counts: *counts,
            })
    }

    /// Look up one particle by id.
    pub fn get(&self, id: ParticleId) -> Option<ParticleView> {
        let entity = self.world.resource::<ParticleRegistry>().get(id)?;
        Some(ParticleView {
            id,
            position: *self.world.get::<Position>(entity)?,
            velocity: *self.world.get::<Velocity>(entity)?,
            counts: *self.world.get::<NeighborCounts>(entity)?,
        })
    }

    /// Get an owned snapshot of the current particle field.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick,
            particles: self.particles().map(Into::into).collect(),
        }
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    /// Number of live particles.
    pub fn len(&self) -> usize {
        self.world.resource::<ParticleRegistry>().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> &SimulationConfig {
        self.world.resource::<SimulationConfig>()
    }

    /// Get the number of completed ticks.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// What population regulation did during the last tick.
    pub fn last_report(&self) -> PopulationReport {
        *self.world.resource::<PopulationReport>()
    }

    /// The spatial index as built during the last tick.
    pub fn spatial_index(&self) -> &SpatialIndex {
        self.world.resource::<SpatialIndex>()
    }

    pub fn profiler(&self) -> &TickProfiler {
        &self.profiler
    }

    pub fn profiler_mut(&mut self) -> &mut TickProfiler {
        &mut self.profiler
    }

    fn refresh_view(&mut self) {
        self.view.update_archetypes(&self.world);
    }
}

//! Particle identity and lifecycle bookkeeping.
//!
//! Particles live as ECS entities; the registry maps their stable
//! [`ParticleId`] to the entity so that spawns can reject id collisions and
//! external merges can find existing particles without a full scan. The
//! random source used for identifiers and spawn positions is owned here too,
//! so a seeded engine replays exactly.

use crate::components::{ParticleBundle, ParticleId, Position};
use bevy_ecs::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

/// Lookup from particle id to its entity.
#[derive(Resource, Debug, Default)]
pub struct ParticleRegistry {
    entities: HashMap<ParticleId, Entity>,
}

impl ParticleRegistry {
    /// Draw identifiers until one is not in use.
    pub fn fresh_id(&self, rng: &mut ParticleRng) -> ParticleId {
        loop {
            let id = rng.next_id();
            if !self.entities.contains_key(&id) {
                return id;
            }
        }
    }

    pub fn insert(&mut self, id: ParticleId, entity: Entity) {
        self.entities.insert(id, entity);
    }

    pub fn remove(&mut self, id: ParticleId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn get(&self, id: ParticleId) -> Option<Entity> {
        self.entities.get(&id).copied()
    }

    pub fn contains(&self, id: ParticleId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Random source for identifiers and spawn positions.
#[derive(Resource, Debug, Clone)]
pub struct ParticleRng(pub ChaCha8Rng);

impl ParticleRng {
    /// Seeded when `seed` is given, otherwise from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self(ChaCha8Rng::seed_from_u64(seed)),
            None => Self(ChaCha8Rng::from_entropy()),
        }
    }

    pub fn next_id(&mut self) -> ParticleId {
        ParticleId(self.0.gen())
    }

    /// Uniform point in the square of half-side `radius` around `origin`.
    pub fn point_in_square(&mut self, origin: Position, radius: f32) -> Position {
        Position::new(
            origin.x + self.0.gen_range(-radius..=radius),
            origin.y + self.0.gen_range(-radius..=radius),
        )
    }
}

/// Spawn a fresh particle through `commands`, registering its id.
pub fn spawn_particle(
    commands: &mut Commands,
    registry: &mut ParticleRegistry,
    rng: &mut ParticleRng,
    position: Position,
    travel_speed: f32,
) -> ParticleId {
    let id = registry.fresh_id(rng);
    let entity = commands
        .spawn(ParticleBundle::new(id, position, travel_speed))
        .id();
    registry.insert(id, entity);
    id
}

/// Despawn a particle through `commands` and forget its id.
pub fn despawn_particle(
    commands: &mut Commands,
    registry: &mut ParticleRegistry,
    entity: Entity,
    id: ParticleId,
) {
    commands.entity(entity).despawn();
    registry.remove(id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_rng_replays() {
        let mut a = ParticleRng::new(Some(5));
        let mut b = ParticleRng::new(Some(5));
        for _ in 0..10 {
            assert_eq!(a.next_id(), b.next_id());
        }
    }

    #[test]
    fn test_fresh_id_skips_taken() {
        let mut world = World::new();
        let mut registry = ParticleRegistry::default();

        // Predict the first draw and occupy it.
        let taken = ParticleRng::new(Some(9)).next_id();
        registry.insert(taken, world.spawn_empty().id());

        let mut rng = ParticleRng::new(Some(9));
        let id = registry.fresh_id(&mut rng);
        assert_ne!(id, taken);
    }

    #[test]
    fn test_point_in_square_bounds() {
        let mut rng = ParticleRng::new(Some(1));
        let origin = Position::new(4.0, -6.0);
        for _ in 0..1000 {
            let p = rng.point_in_square(origin, 2.5);
            assert!((p.x - origin.x).abs() <= 2.5);
            assert!((p.y - origin.y).abs() <= 2.5);
        }
    }

    #[test]
    fn test_registry_tracks_entities() {
        let mut world = World::new();
        let mut registry = ParticleRegistry::default();
        let entity = world.spawn_empty().id();

        registry.insert(ParticleId(3), entity);
        assert!(registry.contains(ParticleId(3)));
        assert_eq!(registry.get(ParticleId(3)), Some(entity));
        assert_eq!(registry.remove(ParticleId(3)), Some(entity));
        assert!(registry.is_empty());
    }
}

//! Steering system - neighbor classification and the heading rule.
//!
//! For every particle the system walks the spatial index outward from the
//! particle's position and tallies the neighbors inside `neighbor_radius`:
//!
//! - a neighbor is **left** when `cross(offset, velocity) > 0`, where `offset`
//!   points from the particle to the neighbor, and **right** otherwise (an exact
//!   zero counts as right);
//! - a neighbor inside `close_radius` additionally counts as **close**.
//!
//! The heading is then rotated by
//!
//! ```text
//! rotation = alpha + beta * (left + right) * sign(left - right)
//! ```
//!
//! with `sign(0) = 0`. Rotation never changes speed.
//!
//! ## Phases
//!
//! 1. **Gather** - classify every particle against the index built this tick.
//!    Only index positions and each particle's own velocity are read, so the
//!    result does not depend on iteration order.
//! 2. **Apply** - write counts and rotated velocities back.
//!
//! With `--features parallel` the gather phase runs on rayon.

use crate::components::*;
use crate::config::SimulationConfig;
use crate::spatial::SpatialIndex;
use bevy_ecs::prelude::*;
use std::cmp::Ordering;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Count left, right and close neighbors of one particle.
///
/// Iteration stops at the first candidate beyond `neighbor_radius`, which is
/// only correct because [`SpatialIndex::nearest`] is distance-ordered.
pub fn classify_neighbors(
    index: &SpatialIndex,
    config: &SimulationConfig,
    id: ParticleId,
    position: Position,
    velocity: Velocity,
) -> NeighborCounts {
    let neighbor_sq = config.neighbor_radius * config.neighbor_radius;
    let close_sq = config.close_radius * config.close_radius;
    let mut counts = NeighborCounts::default();

    for candidate in index.nearest(position.x, position.y) {
        if candidate.id == id {
            continue;
        }
        let dx = candidate.x - position.x;
        let dy = candidate.y - position.y;
        let distance_sq = dx * dx + dy * dy;
        if !(distance_sq <= neighbor_sq) {
            break;
        }
        if distance_sq < close_sq {
            counts.close += 1;
        }
        if cross(dx, dy, velocity.vx, velocity.vy) > 0.0 {
            counts.left += 1;
        } else {
            counts.right += 1;
        }
    }
    counts
}

/// Heading change for one tick given this tick's neighbor counts.
pub fn rotation_angle(counts: &NeighborCounts, alpha: f32, beta: f32) -> f32 {
    let bias = match counts.left.cmp(&counts.right) {
        Ordering::Greater => 1.0,
        Ordering::Less => -1.0,
        Ordering::Equal => 0.0,
    };
    alpha + beta * counts.total() as f32 * bias
}

/// Classify one particle and return its counts with the steered velocity.
#[inline]
pub fn steer(
    index: &SpatialIndex,
    config: &SimulationConfig,
    id: ParticleId,
    position: Position,
    velocity: Velocity,
) -> (NeighborCounts, Velocity) {
    let counts = classify_neighbors(index, config, id, position, velocity);
    let angle = rotation_angle(&counts, config.alpha, config.beta);
    (counts, velocity.rotated(angle))
}

/// System that updates neighbor counts and rotates every heading.
///
/// ## Data Access
/// - Reads: SpatialIndex, SimulationConfig, ParticleId, Position
/// - Writes: Velocity, NeighborCounts
pub fn steering_system(
    config: Res<SimulationConfig>,
    index: Res<SpatialIndex>,
    mut query: Query<(Entity, &ParticleId, &Position, &mut Velocity, &mut NeighborCounts)>,
) {
    let config: &SimulationConfig = &config;
    let index: &SpatialIndex = &index;

    // GATHER PHASE
    let observers: Vec<(Entity, ParticleId, Position, Velocity)> = query
        .iter()
        .map(|(entity, id, pos, vel, _)| (entity, *id, *pos, *vel))
        .collect();

    #[cfg(feature = "parallel")]
    let updates: Vec<(Entity, NeighborCounts, Velocity)> = observers
        .par_iter()
        .map(|&(entity, id, pos, vel)| {
            let (counts, vel) = steer(index, config, id, pos, vel);
            (entity, counts, vel)
        })
        .collect();

    #[cfg(not(feature = "parallel"))]
    let updates: Vec<(Entity, NeighborCounts, Velocity)> = observers
        .iter()
        .map(|&(entity, id, pos, vel)| {
            let (counts, vel) = steer(index, config, id, pos, vel);
            (entity, counts, vel)
        })
        .collect();

    // APPLY PHASE
    for (entity, new_counts, new_vel) in updates {
        if let Ok((_, _, _, mut vel, mut counts)) = query.get_mut(entity) {
            *vel = new_vel;
            *counts = new_counts;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::SpatialEntry;
    use std::f32::consts::PI;

    fn config() -> SimulationConfig {
        SimulationConfig {
            neighbor_radius: 5.0,
            close_radius: 1.0,
            alpha: PI,
            beta: 17.0 * PI / 180.0,
            ..Default::default()
        }
    }

    fn index_of(points: &[(u32, f32, f32)]) -> SpatialIndex {
        let mut index = SpatialIndex::new(5.0);
        index.rebuild(points.iter().map(|&(id, x, y)| SpatialEntry {
            id: ParticleId(id),
            x,
            y,
        }));
        index
    }

    #[test]
    fn test_lone_particle_has_no_neighbors() {
        let index = index_of(&[(1, 0.0, 0.0)]);
        let counts = classify_neighbors(
            &index,
            &config(),
            ParticleId(1),
            Position::new(0.0, 0.0),
            Velocity::new(1.0, 0.0),
        );
        assert_eq!(counts, NeighborCounts::default());
    }

    #[test]
    fn test_lone_particle_rotates_by_alpha() {
        let config = SimulationConfig {
            alpha: 0.4,
            ..config()
        };
        let index = index_of(&[(1, 2.0, 2.0)]);
        let before = Velocity::new(1.0, 0.0);
        let (counts, after) = steer(&index, &config, ParticleId(1), Position::new(2.0, 2.0), before);

        assert_eq!(counts, NeighborCounts::default());
        assert_eq!(rotation_angle(&counts, config.alpha, config.beta), 0.4);
        assert!((after.heading() - before.heading() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_classifies_sides_and_close() {
        // Heading +x. Offset (0, -2): cross = 0*0 - (-2)*1 = 2 > 0 -> left.
        // Offset (0, 3): cross = -3 -> right. Offset (0.5, 0.5) is close.
        let index = index_of(&[
            (1, 0.0, 0.0),
            (2, 0.0, -2.0),
            (3, 0.0, 3.0),
            (4, 0.5, 0.5),
            (5, 6.0, 0.0),
        ]);
        let counts = classify_neighbors(
            &index,
            &config(),
            ParticleId(1),
            Position::new(0.0, 0.0),
            Velocity::new(1.0, 0.0),
        );
        assert_eq!(counts.left, 1);
        assert_eq!(counts.right, 2);
        assert_eq!(counts.close, 1);
    }

    #[test]
    fn test_zero_cross_product_counts_as_right() {
        // Neighbor straight ahead on the heading line.
        let index = index_of(&[(1, 0.0, 0.0), (2, 3.0, 0.0)]);
        let counts = classify_neighbors(
            &index,
            &config(),
            ParticleId(1),
            Position::new(0.0, 0.0),
            Velocity::new(1.0, 0.0),
        );
        assert_eq!(counts, NeighborCounts { left: 0, right: 1, close: 0 });
    }

    #[test]
    fn test_neighbor_symmetry() {
        let index = index_of(&[(1, 0.0, 0.0), (2, 2.0, 1.0)]);
        let vel = Velocity::new(0.6, 0.8);
        let a = classify_neighbors(&index, &config(), ParticleId(1), Position::new(0.0, 0.0), vel);
        let b = classify_neighbors(&index, &config(), ParticleId(2), Position::new(2.0, 1.0), vel);

        assert_eq!(a.total(), 1);
        assert_eq!(b.total(), 1);
        assert_eq!(a.left == 1, b.right == 1);
        assert_eq!(a.right == 1, b.left == 1);
    }

    #[test]
    fn test_neighbor_radius_cutoff_is_inclusive() {
        let index = index_of(&[(1, 0.0, 0.0), (2, 0.0, 5.0), (3, 0.0, -5.01)]);
        let counts = classify_neighbors(
            &index,
            &config(),
            ParticleId(1),
            Position::new(0.0, 0.0),
            Velocity::new(1.0, 0.0),
        );
        assert_eq!(counts.total(), 1);
    }

    #[test]
    fn test_non_finite_observer_counts_nothing() {
        let index = index_of(&[(1, f32::NAN, 0.0), (2, 1.0, 0.0), (3, -1.0, 0.5)]);
        let counts = classify_neighbors(
            &index,
            &config(),
            ParticleId(1),
            Position::new(f32::NAN, 0.0),
            Velocity::new(1.0, 0.0),
        );
        assert_eq!(counts, NeighborCounts::default());
    }

    #[test]
    fn test_rotation_angle() {
        let (alpha, beta) = (PI, 0.1);
        let balanced = NeighborCounts { left: 3, right: 3, close: 0 };
        assert_eq!(rotation_angle(&balanced, alpha, beta), alpha);

        let left_heavy = NeighborCounts { left: 3, right: 1, close: 2 };
        assert!((rotation_angle(&left_heavy, alpha, beta) - (alpha + 0.4)).abs() < 1e-6);

        let right_heavy = NeighborCounts { left: 0, right: 2, close: 0 };
        assert!((rotation_angle(&right_heavy, alpha, beta) - (alpha - 0.2)).abs() < 1e-6);
    }

    #[test]
    fn test_steering_system_updates_components() {
        let mut world = World::new();
        world.insert_resource(config());
        world.insert_resource(index_of(&[(1, 0.0, 0.0), (2, 0.0, -2.0)]));
        let a = world
            .spawn(ParticleBundle::new(ParticleId(1), Position::new(0.0, 0.0), 1.0))
            .id();
        let b = world
            .spawn(ParticleBundle::new(ParticleId(2), Position::new(0.0, -2.0), 1.0))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(steering_system);
        schedule.run(&mut world);

        let counts_a = *world.get::<NeighborCounts>(a).unwrap();
        let counts_b = *world.get::<NeighborCounts>(b).unwrap();
        assert_eq!(counts_a, NeighborCounts { left: 1, right: 0, close: 0 });
        assert_eq!(counts_b, NeighborCounts { left: 0, right: 1, close: 0 });

        let expected = Velocity::new(1.0, 0.0).rotated(PI + 17.0 * PI / 180.0);
        let vel_a = *world.get::<Velocity>(a).unwrap();
        assert!((vel_a.vx - expected.vx).abs() < 1e-6);
        assert!((vel_a.vy - expected.vy).abs() < 1e-6);
        assert!((vel_a.magnitude() - 1.0).abs() < 1e-6);
    }
}

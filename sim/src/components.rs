//! ECS components for the swarm simulation.
//!
//! Components are pure data containers attached to particle entities.
//! All behavior lives in the systems that query them.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// 2D position in simulation space.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Advance this position by one tick of `velocity`.
    #[inline]
    pub fn advance(&mut self, velocity: &Velocity) {
        self.x += velocity.vx;
        self.y += velocity.vy;
    }
}

/// 2D velocity vector. Its magnitude is the particle's travel speed.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: f32,
    pub vy: f32,
}

impl Velocity {
    pub fn new(vx: f32, vy: f32) -> Self {
        Self { vx, vy }
    }

    pub fn magnitude(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }

    /// Heading angle in radians, measured counter-clockwise from +x.
    pub fn heading(&self) -> f32 {
        self.vy.atan2(self.vx)
    }

    /// Rotate counter-clockwise by `angle` radians. Magnitude is unchanged.
    #[inline]
    pub fn rotated(&self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            vx: self.vx * cos - self.vy * sin,
            vy: self.vx * sin + self.vy * cos,
        }
    }
}

/// 2D cross product `a × b` of two vectors given as components.
#[inline]
pub fn cross(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    ax * by - ay * bx
}

// ============================================================================
// IDENTITY COMPONENTS
// ============================================================================

/// Unique identifier of a live particle, stable for its lifetime.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleId(pub u32);

// ============================================================================
// NEIGHBORHOOD COMPONENTS
// ============================================================================

/// Neighbor tallies from the most recent steering pass.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborCounts {
    pub left: u32,
    pub right: u32,
    pub close: u32,
}

impl NeighborCounts {
    /// Neighbors within the neighbor radius on either side.
    pub fn total(&self) -> u32 {
        self.left + self.right
    }
}

// ============================================================================
// BUNDLES
// ============================================================================

/// Everything a particle entity carries.
#[derive(Bundle, Debug, Clone, Copy)]
pub struct ParticleBundle {
    pub id: ParticleId,
    pub position: Position,
    pub velocity: Velocity,
    pub counts: NeighborCounts,
}

impl ParticleBundle {
    /// A fresh particle heading along +x at `travel_speed`.
    pub fn new(id: ParticleId, position: Position, travel_speed: f32) -> Self {
        Self::with_velocity(id, position, Velocity::new(travel_speed, 0.0))
    }

    pub fn with_velocity(id: ParticleId, position: Position, velocity: Velocity) -> Self {
        Self {
            id,
            position,
            velocity,
            counts: NeighborCounts::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_rotation_preserves_magnitude() {
        let mut vel = Velocity::new(0.67, 0.0);
        for i in 0..1000 {
            vel = vel.rotated(0.3 + i as f32 * 0.01);
        }
        assert!((vel.magnitude() - 0.67).abs() < 1e-4);
    }

    #[test]
    fn test_rotation_is_counter_clockwise() {
        let vel = Velocity::new(1.0, 0.0).rotated(FRAC_PI_2);
        assert!(vel.vx.abs() < 1e-6);
        assert!((vel.vy - 1.0).abs() < 1e-6);

        let flipped = Velocity::new(1.0, 0.0).rotated(PI);
        assert!((flipped.vx + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cross_sign() {
        // +y offset against a +x heading
        assert_eq!(cross(0.0, 1.0, 1.0, 0.0), -1.0);
        assert_eq!(cross(0.0, -1.0, 1.0, 0.0), 1.0);
        assert_eq!(cross(2.0, 0.0, 1.0, 0.0), 0.0);
    }

    #[test]
    fn test_advance() {
        let mut pos = Position::new(1.0, 2.0);
        pos.advance(&Velocity::new(0.5, -1.0));
        assert_eq!(pos, Position::new(1.5, 1.0));
    }
}

//! Snapshot and exchange types.
//!
//! `Snapshot` is the serializable, owned view of the particle field between
//! ticks; renderers and exporters consume it. `ExternalParticle` is the
//! inbound record a synchronization layer hands to
//! [`Particles::merge_external`](crate::api::Particles::merge_external).

use crate::components::*;
use serde::{Deserialize, Serialize};

/// Borrowed view of one particle, yielded by the engine's read iterator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleView {
    pub id: ParticleId,
    pub position: Position,
    pub velocity: Velocity,
    pub counts: NeighborCounts,
}

/// Snapshot of a single particle's state for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleSnapshot {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub left: u32,
    pub right: u32,
    pub close: u32,
}

impl From<ParticleView> for ParticleSnapshot {
    fn from(view: ParticleView) -> Self {
        Self {
            id: view.id.0,
            x: view.position.x,
            y: view.position.y,
            vx: view.velocity.vx,
            vy: view.velocity.vy,
            left: view.counts.left,
            right: view.counts.right,
            close: view.counts.close,
        }
    }
}

/// Complete particle field at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Ticks completed when the snapshot was taken.
    pub tick: u64,
    /// All live particles, in no particular order.
    pub particles: Vec<ParticleSnapshot>,
}

impl Snapshot {
    pub fn iter(&self) -> impl Iterator<Item = &ParticleSnapshot> {
        self.particles.iter()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Particle state received from outside the engine.
///
/// Neighbor counts are not carried; they are recomputed on the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExternalParticle {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

impl ExternalParticle {
    pub fn id(&self) -> ParticleId {
        ParticleId(self.id)
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn velocity(&self) -> Velocity {
        Velocity::new(self.vx, self.vy)
    }
}

impl From<&ParticleSnapshot> for ExternalParticle {
    fn from(snapshot: &ParticleSnapshot) -> Self {
        Self {
            id: snapshot.id,
            x: snapshot.x,
            y: snapshot.y,
            vx: snapshot.vx,
            vy: snapshot.vy,
        }
    }
}

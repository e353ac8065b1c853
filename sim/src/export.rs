//! Flat buffer export for renderers.
//!
//! Converts a [`Snapshot`] into a contiguous `Vec<f32>` so a renderer on the
//! other side of an FFI or IPC boundary can read particles with a fixed
//! stride and no parsing.
//!
//! # Buffer Layout (Version 1.0)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ HEADER (1 element)                                              │
//! │ [0] particle_count (as f32)                                     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ For each particle i (offset = 1 + i * PARTICLE_STRIDE):         │
//! │   [+0] id     - Particle ID (u32 as f32, lossy above 2^24)      │
//! │   [+1] x      - X position                                      │
//! │   [+2] y      - Y position                                      │
//! │   [+3] vx     - X velocity (units/tick)                         │
//! │   [+4] vy     - Y velocity (units/tick)                         │
//! │   [+5] left   - Left neighbor count                             │
//! │   [+6] right  - Right neighbor count                            │
//! │   [+7] close  - Close neighbor count                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Particles are written in snapshot order; the same snapshot always yields
//! the same buffer.

use crate::world::Snapshot;

/// Number of f32 values per particle in the flat buffer.
///
/// **Part of the export contract. Do not change without versioning.**
pub const PARTICLE_STRIDE: usize = 8;

/// Number of f32 values in the buffer header.
pub const HEADER_SIZE: usize = 1;

/// Convert a snapshot to a flat buffer. See module docs for the layout.
pub fn snapshot_to_flatbuffer(snapshot: &Snapshot) -> Vec<f32> {
    let particle_count = snapshot.particles.len();
    let buffer_size = HEADER_SIZE + particle_count * PARTICLE_STRIDE;

    let mut buffer = Vec::with_capacity(buffer_size);
    buffer.push(particle_count as f32);

    for particle in &snapshot.particles {
        buffer.extend_from_slice(&[
            particle.id as f32,
            particle.x,
            particle.y,
            particle.vx,
            particle.vy,
            particle.left as f32,
            particle.right as f32,
            particle.close as f32,
        ]);
    }

    debug_assert_eq!(buffer.len(), buffer_size, "Buffer size mismatch");
    buffer
}

/// Number of particles described by a flat buffer, if its length is consistent.
pub fn flatbuffer_particle_count(buffer: &[f32]) -> Option<usize> {
    let count = *buffer.first()? as usize;
    (buffer.len() == HEADER_SIZE + count * PARTICLE_STRIDE).then_some(count)
}

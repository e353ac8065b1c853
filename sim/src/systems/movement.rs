//! Movement system - advances every particle by its velocity.

use crate::components::*;
use bevy_ecs::prelude::*;

/// System that applies velocity to position, one tick's worth.
///
/// Runs last, after steering has settled every heading for this tick.
pub fn advance_system(mut query: Query<(&mut Position, &Velocity)>) {
    for (mut pos, vel) in query.iter_mut() {
        pos.advance(vel);
    }
}

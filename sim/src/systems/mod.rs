//! ECS systems for the swarm simulation.
//!
//! Systems contain the per-tick logic that operates on particle components.
//! One tick runs them strictly in this order:
//!
//! 1. `population_system` - prunes escaped/excess particles, respawns to the minimum
//! 2. `spatial_index_rebuild_system` - bulk rebuild over the regulated set
//!    (lives in `crate::spatial`)
//! 3. `steering_system` - neighbor classification and heading rotation
//! 4. `advance_system` - moves every particle by its velocity
//!
//! Deferred spawns and despawns from step 1 are applied before step 2.

pub mod movement;
pub mod population;
pub mod serialization;
pub mod steering;

pub use movement::*;
pub use population::*;
pub use serialization::*;
pub use steering::*;

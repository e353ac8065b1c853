//! Swarm Simulation Core
//!
//! A 2D field of self-propelled particles whose headings turn according to
//! how many neighbors sit on their left versus their right, producing
//! rotating, milling flocks inside a density-regulated circular region.
//! Uses `bevy_ecs` for the entity-component-system architecture.

pub mod api;
pub mod components;
pub mod config;
pub mod export;
pub mod profiler;
pub mod registry;
pub mod shared;
pub mod spatial;
pub mod systems;
pub mod world;

pub use api::Particles;
pub use components::*;
pub use config::{ConfigError, SimulationConfig};
pub use registry::{ParticleRegistry, ParticleRng};
pub use shared::SharedParticles;
pub use spatial::{NearestIter, SpatialEntry, SpatialIndex};
pub use systems::*;
pub use world::{ExternalParticle, ParticleSnapshot, ParticleView, Snapshot};

//! Simulation configuration.
//!
//! `SimulationConfig` is supplied once when an engine is built and never changes
//! afterwards. It can be built in code or read from a TOML document; every field
//! has a default, so a partial document only overrides what it names.
//!
//! ```toml
//! radius = 10.0
//! min_density = 0.1
//! max_density = 0.2
//! travel_speed = 1.0
//! seed = 7
//!
//! [origin]
//! x = 0.0
//! y = 0.0
//! ```
//!
//! ## Population bounds
//!
//! Density bounds are applied over the bounding square of the region (`4r²`),
//! not the circle's area. The square admits slightly more particles than the
//! circle would; this is the established behavior and callers rely on it.

use crate::components::Position;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while building or loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} must be finite (got {value})")]
    NonFinite { field: &'static str, value: f32 },
    #[error("min_density {min} exceeds max_density {max}")]
    InvertedDensity { min: f32, max: f32 },
    #[error("close_radius {close} exceeds neighbor_radius {neighbor}")]
    InvertedRadius { close: f32, neighbor: f32 },
    #[error("no whole particle count lies between {min} and {max}")]
    EmptyPopulationRange { min: f32, max: f32 },
    #[error("invalid configuration document: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Immutable per-run parameters.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Center of the circular simulation region.
    pub origin: Position,
    /// Extent of the region.
    pub radius: f32,
    /// Lower density bound (particles per unit area).
    pub min_density: f32,
    /// Upper density bound (particles per unit area).
    pub max_density: f32,
    /// Constant speed of every particle, in units per tick.
    pub travel_speed: f32,
    /// Cutoff for counting a particle as a neighbor.
    pub neighbor_radius: f32,
    /// Inner cutoff for close neighbors. Must not exceed `neighbor_radius`.
    pub close_radius: f32,
    /// Base rotation applied every tick (radians).
    pub alpha: f32,
    /// Rotation gain per neighbor (radians).
    pub beta: f32,
    /// Seed for identifier and spawn-position draws; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Spatial grid bucket size; defaults to `neighbor_radius`.
    pub cell_size: Option<f32>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            origin: Position::new(0.0, 0.0),
            radius: 25.0,
            min_density: 0.08,
            max_density: 0.15,
            travel_speed: 0.67,
            neighbor_radius: 5.0,
            close_radius: 1.3,
            alpha: PI,
            beta: 17.0 * PI / 180.0,
            seed: None,
            cell_size: None,
        }
    }
}

impl SimulationConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("origin.x", self.origin.x),
            ("origin.y", self.origin.y),
            ("alpha", self.alpha),
            ("beta", self.beta),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }

        let mut positive = vec![
            ("radius", self.radius),
            ("min_density", self.min_density),
            ("max_density", self.max_density),
            ("travel_speed", self.travel_speed),
            ("neighbor_radius", self.neighbor_radius),
            ("close_radius", self.close_radius),
        ];
        if let Some(cell_size) = self.cell_size {
            positive.push(("cell_size", cell_size));
        }
        for (field, value) in positive {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        if self.min_density > self.max_density {
            return Err(ConfigError::InvertedDensity {
                min: self.min_density,
                max: self.max_density,
            });
        }
        if self.close_radius > self.neighbor_radius {
            return Err(ConfigError::InvertedRadius {
                close: self.close_radius,
                neighbor: self.neighbor_radius,
            });
        }
        if self.min_population() > self.max_population() {
            return Err(ConfigError::EmptyPopulationRange {
                min: self.bounding_area() * self.min_density,
                max: self.bounding_area() * self.max_density,
            });
        }
        Ok(())
    }

    /// Area of the square of side `2r` that bounds the region.
    #[inline]
    pub fn bounding_area(&self) -> f32 {
        4.0 * self.radius * self.radius
    }

    /// Fewest particles the regulator leaves alive.
    pub fn min_population(&self) -> usize {
        (self.bounding_area() * self.min_density).ceil() as usize
    }

    /// Most particles the regulator leaves alive.
    pub fn max_population(&self) -> usize {
        (self.bounding_area() * self.max_density).floor() as usize
    }

    pub fn effective_cell_size(&self) -> f32 {
        self.cell_size.unwrap_or(self.neighbor_radius)
    }
}

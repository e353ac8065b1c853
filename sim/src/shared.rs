//! Thread-safe handle around an engine.
//!
//! A host typically ticks the simulation from a timer thread while request
//! handlers read the field to render or export it. `SharedParticles` serializes
//! the two: a tick holds the write lock for its whole duration, and a read
//! holds the read lock for the whole closure, so readers only ever see the
//! field between ticks.

use crate::api::Particles;
use crate::config::{ConfigError, SimulationConfig};
use crate::world::{ExternalParticle, Snapshot};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable, lock-guarded handle to one [`Particles`] engine.
#[derive(Clone)]
pub struct SharedParticles {
    inner: Arc<RwLock<Particles>>,
}

impl SharedParticles {
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_engine(Particles::new(config)?))
    }

    pub fn from_engine(engine: Particles) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    /// Run one tick under the write lock.
    pub fn tick(&self) {
        self.write_guard().tick();
    }

    /// Read the engine under the read lock. No tick can start until `f` returns.
    pub fn read<R>(&self, f: impl FnOnce(&Particles) -> R) -> R {
        f(&self.read_guard())
    }

    /// Mutate the engine under the write lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut Particles) -> R) -> R {
        f(&mut self.write_guard())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.read(Particles::snapshot)
    }

    pub fn merge_external(&self, particles: Vec<ExternalParticle>) -> usize {
        self.write(|engine| engine.merge_external(particles))
    }

    // A panic mid-tick cannot leave a torn field (ticks only publish through
    // the schedule), so a poisoned lock is still safe to use.
    fn read_guard(&self) -> RwLockReadGuard<'_, Particles> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, Particles> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Position;
    use std::thread;

    fn config() -> SimulationConfig {
        SimulationConfig {
            radius: 10.0,
            min_density: 0.1,
            max_density: 0.2,
            travel_speed: 1.0,
            close_radius: 1.0,
            seed: Some(8),
            ..Default::default()
        }
    }

    #[test]
    fn test_reads_never_see_partial_ticks() {
        let shared = SharedParticles::new(config()).unwrap();
        let (min, max) = (40, 80);

        let ticker = {
            let shared = shared.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    shared.tick();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        shared.read(|engine| {
                            let count = engine.particles().count();
                            assert_eq!(count, engine.len());
                            if engine.current_tick() > 0 {
                                assert!(count >= min && count <= max);
                                assert_eq!(engine.spatial_index().len(), count);
                            }
                        });
                    }
                })
            })
            .collect();

        ticker.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(shared.read(|engine| engine.current_tick()), 100);
    }

    #[test]
    fn test_write_and_snapshot() {
        let shared = SharedParticles::new(config()).unwrap();
        let id = shared.write(|engine| engine.spawn(Position::new(1.0, 1.0)));

        let snapshot = shared.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.particles[0].id, id.0);

        let inserted = shared.merge_external(vec![ExternalParticle {
            id: id.0.wrapping_add(1),
            x: 0.0,
            y: 0.0,
            vx: 1.0,
            vy: 0.0,
        }]);
        assert_eq!(inserted, 1);
        assert_eq!(shared.read(|engine| engine.len()), 2);
    }

    #[test]
    fn test_invalid_config() {
        let bad = SimulationConfig {
            radius: -1.0,
            ..config()
        };
        assert!(SharedParticles::new(bad).is_err());
    }
}

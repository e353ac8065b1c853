//! Lightweight tick timing.
//!
//! Every engine owns a `TickProfiler` that records how long each tick took and
//! how many particles were alive afterwards. A summary is emitted through
//! `tracing` every `log_interval` ticks.

use std::fmt;
use std::time::{Duration, Instant};

/// Accumulated timing statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SectionStats {
    pub total_time: Duration,
    pub call_count: u64,
    pub min_time: Option<Duration>,
    pub max_time: Option<Duration>,
}

impl SectionStats {
    pub fn avg_time(&self) -> Duration {
        if self.call_count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos((self.total_time.as_nanos() / self.call_count as u128) as u64)
        }
    }

    fn record(&mut self, elapsed: Duration) {
        self.total_time += elapsed;
        self.call_count += 1;
        self.min_time = Some(self.min_time.map_or(elapsed, |m| m.min(elapsed)));
        self.max_time = Some(self.max_time.map_or(elapsed, |m| m.max(elapsed)));
    }
}

impl fmt::Display for SectionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks, total {:.2?}, avg {:.2?}, min {:.2?}, max {:.2?}",
            self.call_count,
            self.total_time,
            self.avg_time(),
            self.min_time.unwrap_or(Duration::ZERO),
            self.max_time.unwrap_or(Duration::ZERO),
        )
    }
}

/// Per-engine tick profiler.
#[derive(Debug, Clone)]
pub struct TickProfiler {
    stats: SectionStats,
    last_population: usize,
    /// Emit an info summary every this many ticks; 0 disables.
    pub log_interval: u64,
}

impl Default for TickProfiler {
    fn default() -> Self {
        Self {
            stats: SectionStats::default(),
            last_population: 0,
            log_interval: 1000,
        }
    }
}

impl TickProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time `f` as one tick.
    pub fn time_tick<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        self.stats.record(start.elapsed());
        result
    }

    /// Note the population after a tick and log a summary when due.
    pub fn record_population(&mut self, population: usize) {
        self.last_population = population;
        let ticks = self.stats.call_count;
        if self.log_interval > 0 && ticks > 0 && ticks % self.log_interval == 0 {
            tracing::info!(
                ticks = ticks,
                population = population,
                avg_us = self.stats.avg_time().as_micros() as u64,
                max_us = self.stats.max_time.unwrap_or(Duration::ZERO).as_micros() as u64,
                "Simulation tick summary"
            );
        }
    }

    pub fn stats(&self) -> &SectionStats {
        &self.stats
    }

    pub fn tick_count(&self) -> u64 {
        self.stats.call_count
    }

    pub fn last_population(&self) -> usize {
        self.last_population
    }

    /// Reset all profiling data.
    pub fn reset(&mut self) {
        self.stats = SectionStats::default();
        self.last_population = 0;
    }
}

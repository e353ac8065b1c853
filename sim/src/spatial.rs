//! Spatial partitioning for neighbor queries.
//!
//! The index is a sparse grid of buckets keyed by cell coordinates. It is
//! rebuilt in bulk once per tick and then only read. Queries walk outward in
//! square rings of cells, so the nearest-ordered iterator touches only the
//! cells it needs before the caller stops consuming it. When the rings grow
//! larger than the number of occupied cells (a sparse field over a wide
//! region), the walk switches to visiting occupied buckets directly, ordered
//! by their distance from the query point.

use crate::components::{ParticleId, Position};
use bevy_ecs::prelude::*;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

type Cell = (i64, i64);

/// Grid-bucket index over particle positions.
#[derive(Resource, Debug)]
pub struct SpatialIndex {
    /// Cell size in world units.
    pub cell_size: f32,
    /// Map from cell coordinates to the entries bucketed there.
    cells: HashMap<Cell, Bucket>,
    /// Inclusive min/max occupied cell coordinates.
    bounds: Option<(Cell, Cell)>,
    len: usize,
}

/// Entry in a spatial cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntry {
    pub id: ParticleId,
    pub x: f32,
    pub y: f32,
}

impl SpatialEntry {
    pub fn new(id: ParticleId, position: Position) -> Self {
        Self {
            id,
            x: position.x,
            y: position.y,
        }
    }

    #[inline]
    fn distance_squared(&self, x: f32, y: f32) -> f32 {
        (self.x - x).powi(2) + (self.y - y).powi(2)
    }
}

/// Entries of one cell plus the box they actually occupy.
#[derive(Debug, Default)]
struct Bucket {
    entries: Vec<SpatialEntry>,
    min: (f32, f32),
    max: (f32, f32),
}

impl Bucket {
    fn clear(&mut self) {
        self.entries.clear();
        self.min = (f32::INFINITY, f32::INFINITY);
        self.max = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    }

    fn push(&mut self, entry: SpatialEntry) {
        if self.entries.is_empty() {
            self.min = (entry.x, entry.y);
            self.max = (entry.x, entry.y);
        } else {
            self.min = (self.min.0.min(entry.x), self.min.1.min(entry.y));
            self.max = (self.max.0.max(entry.x), self.max.1.max(entry.y));
        }
        self.entries.push(entry);
    }

    /// Lower bound on the squared distance from `(x, y)` to any entry.
    fn distance_squared(&self, x: f32, y: f32) -> f32 {
        let dx = (self.min.0 - x).max(x - self.max.0).max(0.0);
        let dy = (self.min.1 - y).max(y - self.max.1).max(0.0);
        dx * dx + dy * dy
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(5.0)
    }
}

impl SpatialIndex {
    /// Create an empty index with the given cell size.
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            bounds: None,
            len: 0,
        }
    }

    /// Convert world coordinates to cell coordinates.
    #[inline]
    pub fn world_to_cell(&self, x: f32, y: f32) -> (i64, i64) {
        (
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        )
    }

    /// Replace the whole content of the index with `entries`.
    pub fn rebuild<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = SpatialEntry>,
    {
        // Keep bucket allocations around between ticks.
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
        self.bounds = None;
        self.len = 0;

        for entry in entries {
            let cell = self.world_to_cell(entry.x, entry.y);
            self.cells.entry(cell).or_default().push(entry);
            self.len += 1;
            self.bounds = Some(match self.bounds {
                None => (cell, cell),
                Some((lo, hi)) => (
                    (lo.0.min(cell.0), lo.1.min(cell.1)),
                    (hi.0.max(cell.0), hi.1.max(cell.1)),
                ),
            });
        }

        self.cells.retain(|_, bucket| !bucket.entries.is_empty());
    }

    /// Iterate every indexed entry in non-decreasing distance from `(x, y)`.
    ///
    /// The iterator is lazy: cells are scanned only as far as needed to prove
    /// that the next yielded entry is the closest one left. Dropping it early
    /// (for example once entries fall outside a cutoff) skips the rest.
    /// Work per query is bounded by the number of occupied cells, never by
    /// the size of the region they span.
    pub fn nearest(&self, x: f32, y: f32) -> NearestIter<'_> {
        NearestIter::new(self, x, y)
    }

    /// Entries within `radius` of `(x, y)`, closest first.
    pub fn query_radius(&self, x: f32, y: f32, radius: f32) -> Vec<SpatialEntry> {
        let radius_sq = radius * radius;
        self.nearest(x, y)
            .take_while(|entry| entry.distance_squared(x, y) <= radius_sq)
            .collect()
    }

    /// Get count of entries in a cell.
    pub fn cell_count(&self, cell: (i64, i64)) -> usize {
        self.cells.get(&cell).map(|b| b.entries.len()).unwrap_or(0)
    }

    /// Number of occupied cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Heap item ordered so the std max-heap pops the smallest distance first.
#[derive(Debug, Clone, Copy)]
struct Ranked<T> {
    distance_sq: f32,
    item: T,
}

impl<T> PartialEq for Ranked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Ranked<T> {}

impl<T> PartialOrd for Ranked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Ranked<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.distance_sq.total_cmp(&self.distance_sq)
    }
}

/// Lazy nearest-first traversal over a [`SpatialIndex`].
///
/// Yields each entry exactly once. Not restartable; call
/// [`SpatialIndex::nearest`] again for a fresh traversal.
pub struct NearestIter<'a> {
    index: &'a SpatialIndex,
    x: f32,
    y: f32,
    center: Cell,
    /// Next ring (Chebyshev distance in cells) to scan.
    ring: i64,
    /// Last ring that can still contain occupied cells.
    last_ring: i64,
    /// Cells the ring walk may still visit before switching to `pending`.
    ring_budget: u64,
    /// Occupied cells not yet scanned, once the ring walk has been abandoned.
    pending: Option<BinaryHeap<Ranked<Cell>>>,
    heap: BinaryHeap<Ranked<SpatialEntry>>,
    /// Entries not yet moved into the heap.
    unscanned: usize,
}

impl<'a> NearestIter<'a> {
    fn new(index: &'a SpatialIndex, x: f32, y: f32) -> Self {
        let center = index.world_to_cell(x, y);
        let (ring, last_ring) = match index.bounds {
            Some((lo, hi)) => {
                let first = lo
                    .0
                    .saturating_sub(center.0)
                    .max(center.0.saturating_sub(hi.0))
                    .max(lo.1.saturating_sub(center.1))
                    .max(center.1.saturating_sub(hi.1))
                    .max(0);
                let last = center
                    .0
                    .saturating_sub(lo.0)
                    .max(hi.0.saturating_sub(center.0))
                    .max(center.1.saturating_sub(lo.1))
                    .max(hi.1.saturating_sub(center.1))
                    .max(0);
                (first, last)
            }
            None => (0, -1),
        };
        Self {
            index,
            x,
            y,
            center,
            ring,
            last_ring,
            ring_budget: index.cells.len() as u64,
            pending: None,
            heap: BinaryHeap::new(),
            unscanned: index.len,
        }
    }

    /// Squared distance below which no unscanned entry can lie.
    fn settled_distance_sq(&self) -> f32 {
        match &self.pending {
            Some(pending) => pending.peek().map_or(f32::INFINITY, |cell| cell.distance_sq),
            None => {
                // The query point sits inside the center cell, so any cell on
                // ring `k` is at least `k - 1` whole cells away from it.
                let gap = (self.ring - 1).max(0) as f32 * self.index.cell_size;
                gap * gap
            }
        }
    }

    fn scan_cell(&mut self, cell: Cell) {
        if let Some(bucket) = self.index.cells.get(&cell) {
            for entry in &bucket.entries {
                self.heap.push(Ranked {
                    distance_sq: entry.distance_squared(self.x, self.y),
                    item: *entry,
                });
            }
            self.unscanned = self.unscanned.saturating_sub(bucket.entries.len());
        }
    }

    fn scan_cell_at(&mut self, dx: i64, dy: i64) {
        if let (Some(cx), Some(cy)) = (self.center.0.checked_add(dx), self.center.1.checked_add(dy)) {
            self.scan_cell((cx, cy));
        }
    }

    /// Move more entries into the candidate heap.
    fn scan_more(&mut self) {
        if let Some(pending) = self.pending.as_mut() {
            match pending.pop() {
                Some(cell) => self.scan_cell(cell.item),
                None => self.unscanned = 0,
            }
            return;
        }

        if self.ring > self.last_ring {
            self.unscanned = 0;
            return;
        }
        let k = self.ring;
        let ring_cells = if k == 0 { 1 } else { 8 * k.unsigned_abs() };
        if ring_cells > self.ring_budget {
            self.switch_to_pending();
            return;
        }
        self.ring_budget -= ring_cells;

        if k == 0 {
            self.scan_cell_at(0, 0);
        } else {
            for dx in -k..=k {
                self.scan_cell_at(dx, -k);
                self.scan_cell_at(dx, k);
            }
            for dy in (-k + 1)..k {
                self.scan_cell_at(-k, dy);
                self.scan_cell_at(k, dy);
            }
        }
        self.ring += 1;
    }

    /// Queue every occupied cell the ring walk has not reached yet.
    fn switch_to_pending(&mut self) {
        let scanned = self.ring.unsigned_abs();
        let (x, y, center) = (self.x, self.y, self.center);
        let pending: BinaryHeap<_> = self
            .index
            .cells
            .iter()
            .filter(|(cell, _)| {
                cell.0.abs_diff(center.0).max(cell.1.abs_diff(center.1)) >= scanned
            })
            .map(|(cell, bucket)| Ranked {
                distance_sq: bucket.distance_squared(x, y),
                item: *cell,
            })
            .collect();
        self.pending = Some(pending);
    }
}

impl Iterator for NearestIter<'_> {
    type Item = SpatialEntry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let settled = match self.heap.peek() {
                Some(top) => self.unscanned == 0 || top.distance_sq <= self.settled_distance_sq(),
                None if self.unscanned == 0 => return None,
                None => false,
            };
            if settled {
                return self.heap.pop().map(|candidate| candidate.item);
            }
            self.scan_more();
        }
    }
}

/// System that rebuilds the spatial index from the current particle set.
pub fn spatial_index_rebuild_system(
    mut index: ResMut<SpatialIndex>,
    query: Query<(&ParticleId, &Position)>,
) {
    index.rebuild(query.iter().map(|(id, pos)| SpatialEntry::new(*id, *pos)));
}

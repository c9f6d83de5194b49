//! Per-vehicle activity memory.
//!
//! Each tracked vehicle leaves an entry that is refreshed to full
//! intensity while the vehicle is observed and decays exponentially once
//! it disappears. Entries below the eviction threshold are dropped, so the
//! map is bounded by the number of vehicles seen within a few
//! `tau_source_decay` of the present.

use indexmap::IndexMap;
use log::debug;
use riskfield_core::VehicleId;
use riskfield_space::Grid;

use crate::kernel::GaussianKernel;

/// One remembered vehicle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MemoryEntry {
    /// Current intensity in `(0, 1]`.
    pub intensity: f64,
    /// Simulation time the vehicle was last observed.
    pub last_seen: f64,
    /// Kernel at the last observed position.
    pub kernel: GaussianKernel,
    stamp: u64,
}

/// Keyed, decaying record of recent vehicle activity.
///
/// Iteration follows insertion order, so the activity field is
/// reproducible for a given observation sequence.
#[derive(Clone, Debug)]
pub struct ActivityMemory {
    entries: IndexMap<VehicleId, MemoryEntry>,
    generation: u64,
    tau: f64,
    eviction_threshold: f64,
}

impl ActivityMemory {
    /// Empty memory with time constant `tau` and eviction level `eviction_threshold`.
    pub fn new(tau: f64, eviction_threshold: f64) -> Self {
        Self {
            entries: IndexMap::new(),
            generation: 0,
            tau,
            eviction_threshold,
        }
    }

    /// Change the decay constants without dropping entries.
    pub fn set_params(&mut self, tau: f64, eviction_threshold: f64) {
        self.tau = tau;
        self.eviction_threshold = eviction_threshold;
    }

    /// Open a new update round. Vehicles not [`touch`](Self::touch)ed before
    /// the next [`decay_absent`](Self::decay_absent) are treated as absent.
    pub fn begin(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Whether `id` was already touched in the current round.
    pub fn seen_this_round(&self, id: VehicleId) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|e| e.stamp == self.generation)
    }

    /// Record `id` as present at full intensity with `kernel` at time `now`.
    pub fn touch(&mut self, id: VehicleId, kernel: GaussianKernel, now: f64) {
        let entry = MemoryEntry {
            intensity: 1.0,
            last_seen: now,
            kernel,
            stamp: self.generation,
        };
        self.entries.insert(id, entry);
    }

    /// Decay every entry not touched this round by `exp(-dt / tau)` and
    /// evict those that fall below the threshold. Returns the eviction count.
    pub fn decay_absent(&mut self, dt: f64) -> usize {
        let factor = if dt > 0.0 {
            (-dt / self.tau).exp()
        } else {
            1.0
        };
        let generation = self.generation;
        let threshold = self.eviction_threshold;
        let before = self.entries.len();
        self.entries.retain(|_, e| {
            if e.stamp != generation {
                e.intensity *= factor;
            }
            e.intensity >= threshold
        });
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(
                "evicted {evicted} activity memory entries, {} remain",
                self.entries.len()
            );
        }
        evicted
    }

    /// Rasterise `max_e intensity_e * kernel_e` into `out`.
    pub fn rasterise(&self, grid: &Grid, out: &mut [f64]) {
        out.fill(0.0);
        for entry in self.entries.values() {
            entry.kernel.splat_max(grid, entry.intensity, out);
        }
    }

    /// Entry for `id`, if remembered.
    pub fn get(&self, id: VehicleId) -> Option<&MemoryEntry> {
        self.entries.get(&id)
    }

    /// Remembered vehicles in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (VehicleId, &MemoryEntry)> {
        self.entries.iter().map(|(id, e)| (*id, e))
    }

    /// Number of remembered vehicles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is remembered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

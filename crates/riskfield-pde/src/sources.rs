//! Source-term synthesis from vehicle observations and road topology.
//!
//! Each tick produces three per-cell arrays in a [`SourceField`]:
//!
//! - `intensity`: the source term `S`, a non-negative sum of the ambient
//!   merge term, the vehicle kernels, and (when the occlusion shadow is
//!   empty) the ambient occlusion term;
//! - `activity`: the activity memory rasterised as a max over kernels;
//! - `activity_boost`: extra decay applied where activity is negligible.
//!
//! A vehicle is *in shadow* when its footprint overlaps the occlusion
//! rectangle. Such a vehicle suppresses the ambient occlusion term for
//! the tick and carries a gated amplitude `a (1 - k_occ) + k_occ`.

use log::warn;
use riskfield_core::{
    PdeParams, Result, RiskConfig, RiskError, RoadGeometry, SourceParams, VehicleDimensions,
    VehicleObservation,
};
use riskfield_space::{soft_interval, Grid, Rect};

use crate::coefficients::occlusion_indicator;
use crate::kernel::GaussianKernel;
use crate::memory::ActivityMemory;

/// Whether the footprint of `obs` overlaps the occlusion `zone`.
pub fn in_shadow(obs: &VehicleObservation, dims: &VehicleDimensions, zone: &Rect) -> bool {
    let (length, width) = obs.class.extent(dims);
    Rect::centred(obs.x, obs.y, length, width).overlaps(zone)
}

/// Per-tick source outputs, reused across ticks to avoid reallocation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceField {
    /// Source term `S` per cell.
    pub intensity: Vec<f64>,
    /// Additional decay per cell from stale activity.
    pub activity_boost: Vec<f64>,
    /// Rasterised activity memory per cell.
    pub activity: Vec<f64>,
}

impl SourceField {
    /// Zeroed arrays sized for `grid`.
    pub fn zeros(grid: &Grid) -> Self {
        let n = grid.cell_count();
        Self {
            intensity: vec![0.0; n],
            activity_boost: vec![0.0; n],
            activity: vec![0.0; n],
        }
    }
}

/// Outcome of one synthesis pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SynthesisReport {
    /// Observations that contributed a kernel.
    pub accepted: usize,
    /// Observations dropped this tick, with the reason.
    pub rejected: Vec<RiskError>,
    /// Accepted vehicles found in the occlusion shadow.
    pub shadowed: usize,
    /// Memory entries evicted this tick.
    pub evicted: usize,
    /// Memory entries remaining after the tick.
    pub active_memories: usize,
}

/// Builds the source field and owns the activity memory.
#[derive(Clone, Debug)]
pub struct SourceSynthesizer {
    params: SourceParams,
    geometry: RoadGeometry,
    dims: VehicleDimensions,
    lambda_activity_boost: f64,
    zone: Rect,
    merge_ambient: Vec<f64>,
    occlusion_ambient: Vec<f64>,
    memory: ActivityMemory,
}

impl SourceSynthesizer {
    /// Create a synthesizer for `grid` from the full configuration.
    ///
    /// # Errors
    ///
    /// [`RiskError::StaleConfiguration`] if the source, PDE, geometry or
    /// vehicle sections are invalid.
    pub fn new(grid: &Grid, config: &RiskConfig) -> Result<Self> {
        config.vehicles.validate()?;
        let mut synth = Self {
            params: config.source.clone(),
            geometry: config.geometry.clone(),
            dims: config.vehicles.clone(),
            lambda_activity_boost: config.pde.lambda_activity_boost,
            zone: Rect::from(&config.geometry.occlusion),
            merge_ambient: Vec::new(),
            occlusion_ambient: Vec::new(),
            memory: ActivityMemory::new(
                config.pde.tau_source_decay,
                config.source.memory_eviction_threshold,
            ),
        };
        synth.reconfigure(grid, &config.geometry, &config.pde, &config.source)?;
        Ok(synth)
    }

    /// Replace geometry and gains, rebuilding the ambient arrays.
    ///
    /// Activity memory survives; the new kernel widths take effect as
    /// each vehicle is next observed. On error nothing changes.
    ///
    /// # Errors
    ///
    /// [`RiskError::StaleConfiguration`] if any section fails validation.
    pub fn reconfigure(
        &mut self,
        grid: &Grid,
        geometry: &RoadGeometry,
        pde: &PdeParams,
        source: &SourceParams,
    ) -> Result<()> {
        source.validate()?;
        pde.validate()?;
        geometry.validate(&grid.domain())?;

        let zone = Rect::from(&geometry.occlusion);
        let n = grid.cell_count();
        let mut merge_ambient = Vec::with_capacity(n);
        let mut occlusion_ambient = Vec::with_capacity(n);
        let inv_2sy2 = 1.0 / (2.0 * source.sigma_y * source.sigma_y);
        for &y in grid.y() {
            let dy = y - geometry.merge_y_ramp;
            let lateral = (-dy * dy * inv_2sy2).exp();
            for &x in grid.x() {
                let along = soft_interval(
                    x,
                    geometry.merge_x_start,
                    geometry.merge_x_end,
                    geometry.lane_width,
                );
                merge_ambient.push(source.k_merge_ambient * along * lateral);
                occlusion_ambient.push(source.k_occ_ambient * occlusion_indicator(&zone, x, y));
            }
        }

        self.params = source.clone();
        self.geometry = geometry.clone();
        self.lambda_activity_boost = pde.lambda_activity_boost;
        self.zone = zone;
        self.merge_ambient = merge_ambient;
        self.occlusion_ambient = occlusion_ambient;
        self.memory
            .set_params(pde.tau_source_decay, source.memory_eviction_threshold);
        Ok(())
    }

    /// Kernel amplitude for a vehicle at `(x, y)`, before shadow gating.
    pub fn base_amplitude(&self, x: f64, y: f64) -> f64 {
        if self.geometry.in_merge_zone(x, y) {
            self.params.k_merge_vehicle
        } else {
            self.params.k_vehicle_base
        }
    }

    /// Produce this tick's source field into `out` and update memory.
    ///
    /// Invalid or duplicate observations are dropped, logged, and listed
    /// in the report; they never fail the tick.
    pub fn synthesize(
        &mut self,
        grid: &Grid,
        observations: &[VehicleObservation],
        dt: f64,
        now: f64,
        out: &mut SourceField,
    ) -> SynthesisReport {
        let n = grid.cell_count();
        if out.intensity.len() != n {
            *out = SourceField::zeros(grid);
        }
        out.intensity.copy_from_slice(&self.merge_ambient);

        let mut report = SynthesisReport::default();
        self.memory.begin();

        for obs in observations {
            if let Err(err) = obs.validate() {
                warn!("dropping observation: {err}");
                report.rejected.push(err);
                continue;
            }
            if self.memory.seen_this_round(obs.id) {
                let err = RiskError::observation(obs.id, "duplicate id within one tick");
                warn!("dropping observation: {err}");
                report.rejected.push(err);
                continue;
            }

            let kernel = GaussianKernel::for_vehicle(obs, &self.params);
            let mut amplitude = self.base_amplitude(obs.x, obs.y);
            if in_shadow(obs, &self.dims, &self.zone) {
                let k = self.params.k_occ_ambient;
                amplitude = amplitude * (1.0 - k) + k;
                report.shadowed += 1;
            }
            kernel.splat_add(grid, amplitude, &mut out.intensity);
            self.memory.touch(obs.id, kernel, now);
            report.accepted += 1;
        }

        if report.shadowed == 0 {
            for (s, occ) in out.intensity.iter_mut().zip(&self.occlusion_ambient) {
                *s += occ;
            }
        }

        report.evicted = self.memory.decay_absent(dt);
        report.active_memories = self.memory.len();

        self.memory.rasterise(grid, &mut out.activity);
        let threshold = self.params.activity_threshold;
        let boost = self.lambda_activity_boost;
        for (b, &a) in out.activity_boost.iter_mut().zip(&out.activity) {
            *b = if a < threshold { boost } else { 0.0 };
        }

        report
    }

    /// Read-only view of the activity memory.
    pub fn memory(&self) -> &ActivityMemory {
        &self.memory
    }

    /// Put back a memory taken earlier with `memory().clone()`.
    pub fn restore_memory(&mut self, memory: ActivityMemory) {
        self.memory = memory;
    }

    /// Forget all remembered vehicles.
    pub fn clear_memory(&mut self) {
        self.memory.clear();
    }

    /// Persistent merge-topology source per cell.
    pub fn merge_ambient(&self) -> &[f64] {
        &self.merge_ambient
    }

    /// Ambient occlusion source per cell, applied when the shadow is empty.
    pub fn occlusion_ambient(&self) -> &[f64] {
        &self.occlusion_ambient
    }
}

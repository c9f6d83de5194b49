//! Tick orchestration.
//!
//! [`RiskFieldSolver`] owns the grid, the cached coefficients, the source
//! synthesizer with its activity memory, and the risk state. Each
//! [`step`](RiskFieldSolver::step) runs one ordered tick:
//!
//! 1. synthesize the source field from this tick's observations;
//! 2. integrate the field by `dt`, sub-stepping as needed;
//! 3. compute the derivative and commit time and tick counters;
//! 4. publish a post-processed snapshot if anyone is subscribed.
//!
//! # Rollback
//!
//! If integration produces a non-finite cell the tick is abandoned: the
//! field, flux, source field, activity memory, time and tick counter are
//! exactly as they were before the call, and the error is returned
//! unchanged.
//! Retrying with the same `dt` reproduces the failure.
//!
//! # Ownership model
//!
//! The solver is `Send` but all mutation goes through `&mut self`. Other
//! threads read results through [`SharedSnapshot`] and
//! [`SharedCoefficients`], which only ever hand out complete values.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, error};
use riskfield_core::{
    PdeParams, Result, RiskConfig, RoadGeometry, SourceParams, TickId, VehicleObservation,
};
use riskfield_pde::{
    CoefficientFields, FieldIntegrator, PostProcessor, RiskState, SourceField, SourceSynthesizer,
};
use riskfield_space::Grid;

use crate::metrics::StepMetrics;
use crate::shared::{SharedCoefficients, SharedSnapshot};
use crate::snapshot::RiskSnapshot;

// Compile-time assertion: the solver can be moved to a worker thread.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<RiskFieldSolver>();
    }
};

/// Time-stepping risk field solver for one road scene.
pub struct RiskFieldSolver {
    config: RiskConfig,
    grid: Arc<Grid>,
    coefficients: Arc<CoefficientFields>,
    synthesizer: SourceSynthesizer,
    integrator: FieldIntegrator,
    post: PostProcessor,
    state: RiskState,
    sources: SourceField,
    pending_sources: SourceField,
    previous: Vec<f64>,
    derivative: Vec<f64>,
    time: f64,
    tick: TickId,
    shared_snapshot: Arc<SharedSnapshot>,
    shared_coefficients: Arc<SharedCoefficients>,
    last_metrics: StepMetrics,
}

impl RiskFieldSolver {
    /// Build a solver with an all-zero field at time 0.
    ///
    /// # Errors
    ///
    /// [`RiskError::InvalidDomain`](riskfield_core::RiskError::InvalidDomain)
    /// for a bad grid, otherwise
    /// [`RiskError::StaleConfiguration`](riskfield_core::RiskError::StaleConfiguration).
    pub fn new(config: RiskConfig) -> Result<Self> {
        config.validate()?;
        let grid = Arc::new(Grid::from_domain(&config.domain)?);
        let coefficients = Arc::new(CoefficientFields::build(
            &grid,
            &config.geometry,
            &config.pde,
        )?);
        let synthesizer = SourceSynthesizer::new(&grid, &config)?;
        let integrator = FieldIntegrator::new(&grid, config.pde.tau);
        let post = PostProcessor::new(config.pde.post_smooth_sigma);
        let state = RiskState::zeros(&grid, config.pde.has_inertia());
        let n = grid.cell_count();

        let initial = RiskSnapshot::new(
            Arc::clone(&grid),
            vec![0.0; n],
            vec![0.0; n],
            0.0,
            TickId(0),
        );

        Ok(Self {
            sources: SourceField::zeros(&grid),
            pending_sources: SourceField::zeros(&grid),
            previous: vec![0.0; n],
            derivative: vec![0.0; n],
            shared_snapshot: Arc::new(SharedSnapshot::new(Arc::new(initial))),
            shared_coefficients: Arc::new(SharedCoefficients::new(Arc::clone(&coefficients))),
            config,
            grid,
            coefficients,
            synthesizer,
            integrator,
            post,
            state,
            time: 0.0,
            tick: TickId(0),
            last_metrics: StepMetrics::default(),
        })
    }

    /// Advance by `dt` seconds with this tick's `observations`.
    ///
    /// Invalid or duplicated observations are dropped, logged and counted
    /// in the returned metrics. A non-positive or non-finite `dt` is a
    /// no-op that still reports zeroed metrics.
    ///
    /// # Errors
    ///
    /// [`RiskError::NumericalInstability`](riskfield_core::RiskError::NumericalInstability)
    /// if the field turns non-finite. The solver is rolled back to its
    /// pre-tick state.
    pub fn step(&mut self, observations: &[VehicleObservation], dt: f64) -> Result<StepMetrics> {
        if !(dt > 0.0) || !dt.is_finite() {
            debug!("ignoring tick with dt={dt}");
            return Ok(StepMetrics::default());
        }
        let tick_start = Instant::now();
        let now = self.time + dt;
        let checkpoint = self.synthesizer.memory().clone();

        let source_start = Instant::now();
        let report = self.synthesizer.synthesize(
            &self.grid,
            observations,
            dt,
            now,
            &mut self.pending_sources,
        );
        let source_us = source_start.elapsed().as_micros() as u64;

        let inertial = self.integrator.is_inertial();
        if !inertial {
            self.previous.copy_from_slice(&self.state.risk);
        }

        let integrate_start = Instant::now();
        let stats = match self.integrator.advance(
            &self.grid,
            &self.coefficients,
            &self.pending_sources,
            &mut self.state,
            dt,
        ) {
            Ok(stats) => stats,
            Err(err) => {
                error!("tick {} rolled back: {err}", self.tick.0 + 1);
                self.synthesizer.restore_memory(checkpoint);
                return Err(err);
            }
        };
        let integrate_us = integrate_start.elapsed().as_micros() as u64;
        std::mem::swap(&mut self.sources, &mut self.pending_sources);

        match (&self.state.flux, inertial) {
            (Some(q), true) => self.derivative.copy_from_slice(q),
            _ => {
                let inv_dt = 1.0 / dt;
                for ((d, &r), &p) in self
                    .derivative
                    .iter_mut()
                    .zip(&self.state.risk)
                    .zip(&self.previous)
                {
                    *d = (r - p) * inv_dt;
                }
            }
        }
        self.time = now;
        self.tick = TickId(self.tick.0 + 1);

        let mut postprocess_us = 0;
        if Arc::strong_count(&self.shared_snapshot) > 1 {
            let publish_start = Instant::now();
            self.publish();
            postprocess_us = publish_start.elapsed().as_micros() as u64;
        }

        let metrics = StepMetrics {
            total_us: tick_start.elapsed().as_micros() as u64,
            source_us,
            integrate_us,
            postprocess_us,
            substeps: stats.substeps,
            accepted_observations: report.accepted as u32,
            dropped_observations: report.rejected.len() as u32,
            active_memories: report.active_memories as u32,
            evicted_memories: report.evicted as u32,
        };
        self.last_metrics = metrics.clone();
        Ok(metrics)
    }

    /// Advance to absolute simulation `time`.
    ///
    /// The step length is `time - self.time()`; a non-positive difference
    /// is a no-op tick.
    ///
    /// # Errors
    ///
    /// Same as [`step`](Self::step).
    pub fn step_to(&mut self, observations: &[VehicleObservation], time: f64) -> Result<StepMetrics> {
        self.step(observations, time - self.time)
    }

    /// Zero the field and flux, forget all activity and rewind the clock.
    ///
    /// Coefficients and configuration are kept.
    pub fn reset(&mut self) {
        self.state = RiskState::zeros(&self.grid, self.integrator.is_inertial());
        self.derivative.fill(0.0);
        self.previous.fill(0.0);
        self.synthesizer.clear_memory();
        self.time = 0.0;
        self.tick = TickId(0);
        self.last_metrics = StepMetrics::default();
    }

    /// Replace geometry and physical parameters.
    ///
    /// Everything is validated before anything changes. New coefficients
    /// are built into a fresh allocation and swapped in, so readers of
    /// [`SharedCoefficients`] see either the old or the new fields. The
    /// risk field is kept; switching inertia on starts from zero flux.
    ///
    /// # Errors
    ///
    /// [`RiskError::StaleConfiguration`](riskfield_core::RiskError::StaleConfiguration)
    /// if any section is inconsistent. The solver is unchanged.
    pub fn reconfigure(
        &mut self,
        geometry: RoadGeometry,
        pde: PdeParams,
        source: SourceParams,
    ) -> Result<()> {
        pde.validate_for(&self.config.domain)?;
        source.validate()?;
        geometry.validate(&self.config.domain)?;

        let coefficients = Arc::new(CoefficientFields::build(&self.grid, &geometry, &pde)?);
        self.synthesizer
            .reconfigure(&self.grid, &geometry, &pde, &source)?;

        self.integrator.set_tau(pde.tau);
        self.post = PostProcessor::new(pde.post_smooth_sigma);
        self.coefficients = Arc::clone(&coefficients);
        self.shared_coefficients.store(coefficients);
        self.config.geometry = geometry;
        self.config.pde = pde;
        self.config.source = source;
        Ok(())
    }

    /// Post-processed copy of the current field.
    pub fn snapshot(&self) -> RiskSnapshot {
        RiskSnapshot::new(
            Arc::clone(&self.grid),
            self.post.apply(&self.grid, &self.state.risk),
            self.derivative.clone(),
            self.time,
            self.tick,
        )
    }

    /// Store a fresh snapshot into the shared cell and return it.
    pub fn publish(&self) -> Arc<RiskSnapshot> {
        let snap = Arc::new(self.snapshot());
        self.shared_snapshot.store(Arc::clone(&snap));
        snap
    }

    /// Handle to the shared snapshot cell.
    ///
    /// While any handle is alive, every successful tick publishes into it.
    pub fn subscribe(&self) -> Arc<SharedSnapshot> {
        Arc::clone(&self.shared_snapshot)
    }

    /// Handle to the shared coefficient cell, updated on reconfiguration.
    pub fn shared_coefficients(&self) -> Arc<SharedCoefficients> {
        Arc::clone(&self.shared_coefficients)
    }

    /// Coefficients currently in use.
    pub fn coefficients(&self) -> Arc<CoefficientFields> {
        Arc::clone(&self.coefficients)
    }

    /// Raw, unsmoothed risk field.
    pub fn field(&self) -> &[f64] {
        &self.state.risk
    }

    /// Flux companion, present when inertia is enabled.
    pub fn flux(&self) -> Option<&[f64]> {
        self.state.flux.as_deref()
    }

    /// Source field of the last tick.
    pub fn sources(&self) -> &SourceField {
        &self.sources
    }

    /// Source synthesizer and its activity memory.
    pub fn synthesizer(&self) -> &SourceSynthesizer {
        &self.synthesizer
    }

    /// Simulation grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Active configuration.
    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Simulation time of the last committed tick.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of committed ticks.
    pub fn tick(&self) -> TickId {
        self.tick
    }

    /// Metrics from the last successful tick.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }
}

//! Explicit time integration of the risk field.
//!
//! Each sub-step evaluates `F(R) = div(D grad R) - (lambda + boost + sigma) R + S`
//! and then either
//!
//! ```text
//! R' = R + h F(R)                          (tau = 0)
//! q' = (q + (h / tau) F(R)) / (1 + h / tau)
//! R' = R + h q'                            (tau > 0)
//! ```
//!
//! The telegrapher form relaxes the flux implicitly, so any `tau > 0` is
//! stable under the diffusion bound alone and `tau -> 0` recovers the
//! plain scheme. The field then moves with the new flux. A requested `dt`
//! is split into [`stable_substeps`] equal sub-steps. Work happens in
//! scratch buffers; the caller's state is only replaced once every
//! sub-step came out finite.

use log::debug;
use riskfield_core::{Result, RiskError};
use riskfield_space::Grid;

use crate::coefficients::CoefficientFields;
use crate::sources::SourceField;
use crate::stencil::{apply_operator, first_non_finite};

/// Fraction of the stability limit used per sub-step.
pub const CFL_SAFETY: f64 = 0.9;

/// Upper bound on sub-steps per call.
pub const MAX_SUBSTEPS: u32 = 1 << 20;

/// Number of equal sub-steps needed to advance by `dt` stably.
///
/// `h_max = CFL_SAFETY / (2 d_max (1/dx² + 1/dy²) + k_max)`. The result
/// is `max(1, ceil(dt / h_max))`, clamped to [`MAX_SUBSTEPS`]. The
/// relaxation time does not enter.
///
/// ```
/// use riskfield_pde::stable_substeps;
///
/// assert_eq!(stable_substeps(0.05, 1.0, 1.0, 0.0, 0.0), 1);
/// assert_eq!(stable_substeps(1.0, 1.0, 1.0, 1.0, 0.0), 5);
/// ```
pub fn stable_substeps(dt: f64, dx: f64, dy: f64, d_max: f64, k_max: f64) -> u32 {
    if !(dt > 0.0) || !dt.is_finite() {
        return 1;
    }
    let rate = 2.0 * d_max * (1.0 / (dx * dx) + 1.0 / (dy * dy)) + k_max;
    if !(rate > 0.0) {
        return 1;
    }
    let h_max = CFL_SAFETY / rate;
    let n = (dt / h_max).ceil();
    if n >= MAX_SUBSTEPS as f64 {
        MAX_SUBSTEPS
    } else {
        (n as u32).max(1)
    }
}

/// Risk field and, in the telegrapher form, its flux companion.
#[derive(Clone, Debug, PartialEq)]
pub struct RiskState {
    /// Risk value per cell.
    pub risk: Vec<f64>,
    /// `dR/dt` per cell; present only when inertia is enabled.
    pub flux: Option<Vec<f64>>,
}

impl RiskState {
    /// All-zero state for `grid`.
    pub fn zeros(grid: &Grid, inertial: bool) -> Self {
        let n = grid.cell_count();
        Self {
            risk: vec![0.0; n],
            flux: inertial.then(|| vec![0.0; n]),
        }
    }

    fn match_inertia(&mut self, inertial: bool) {
        match (&self.flux, inertial) {
            (None, true) => self.flux = Some(vec![0.0; self.risk.len()]),
            (Some(_), false) => self.flux = None,
            _ => {}
        }
    }
}

/// What one [`FieldIntegrator::advance`] call did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AdvanceStats {
    /// Sub-steps taken.
    pub substeps: u32,
    /// Length of each sub-step.
    pub h: f64,
    /// Largest total linear decay seen by the stability bound.
    pub k_max: f64,
}

/// Advances a [`RiskState`] with precomputed coefficients and sources.
#[derive(Clone, Debug)]
pub struct FieldIntegrator {
    tau: f64,
    decay: Vec<f64>,
    rhs: Vec<f64>,
    risk: Vec<f64>,
    flux: Vec<f64>,
}

impl FieldIntegrator {
    /// Integrator for `grid` with relaxation time `tau`.
    pub fn new(grid: &Grid, tau: f64) -> Self {
        let n = grid.cell_count();
        Self {
            tau,
            decay: vec![0.0; n],
            rhs: vec![0.0; n],
            risk: vec![0.0; n],
            flux: vec![0.0; n],
        }
    }

    /// Relaxation time of the telegrapher form; 0 when disabled.
    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Change the relaxation time.
    pub fn set_tau(&mut self, tau: f64) {
        self.tau = tau;
    }

    /// Whether the flux companion is evolved.
    pub fn is_inertial(&self) -> bool {
        self.tau > 0.0
    }

    /// Combine static damping and the activity boost; returns the maximum.
    fn prepare(&mut self, coeffs: &CoefficientFields, sources: &SourceField) -> f64 {
        let mut k_max = 0.0f64;
        for ((k, &static_k), &boost) in self
            .decay
            .iter_mut()
            .zip(coeffs.damping())
            .zip(&sources.activity_boost)
        {
            *k = static_k + boost;
            k_max = k_max.max(*k);
        }
        k_max
    }

    /// Number of sub-steps [`advance`](Self::advance) would take for `dt`.
    pub fn substeps_for(
        &mut self,
        grid: &Grid,
        coeffs: &CoefficientFields,
        sources: &SourceField,
        dt: f64,
    ) -> u32 {
        let k_max = self.prepare(coeffs, sources);
        stable_substeps(dt, grid.dx(), grid.dy(), coeffs.d_max(), k_max)
    }

    /// Advance `state` by `dt`, sub-stepping as needed.
    ///
    /// A non-positive `dt` leaves the state untouched.
    ///
    /// # Errors
    ///
    /// [`RiskError::NumericalInstability`] if a cell turns non-finite. The
    /// state is left exactly as it was before the call, flux companion
    /// included.
    pub fn advance(
        &mut self,
        grid: &Grid,
        coeffs: &CoefficientFields,
        sources: &SourceField,
        state: &mut RiskState,
        dt: f64,
    ) -> Result<AdvanceStats> {
        if !(dt > 0.0) {
            return Ok(AdvanceStats::default());
        }
        let inertial = self.is_inertial();
        let k_max = self.prepare(coeffs, sources);
        let substeps = stable_substeps(dt, grid.dx(), grid.dy(), coeffs.d_max(), k_max);
        let h = dt / substeps as f64;
        if substeps > 1 {
            debug!("dt={dt} split into {substeps} sub-steps of h={h:.3e}");
        }

        self.risk.copy_from_slice(&state.risk);
        match (&state.flux, inertial) {
            (Some(q), true) => self.flux.copy_from_slice(q),
            _ => self.flux.fill(0.0),
        }

        for substep in 0..substeps {
            euler_step(
                grid,
                coeffs.diffusion(),
                &self.decay,
                &sources.intensity,
                &mut self.risk,
                inertial.then_some(self.flux.as_mut_slice()),
                &mut self.rhs,
                h,
                self.tau,
            );
            check_finite(grid, &self.risk, substep)?;
            if inertial {
                check_finite(grid, &self.flux, substep)?;
            }
        }

        std::mem::swap(&mut state.risk, &mut self.risk);
        state.match_inertia(inertial);
        if let Some(q) = state.flux.as_mut() {
            std::mem::swap(q, &mut self.flux);
        }

        Ok(AdvanceStats {
            substeps,
            h,
            k_max,
        })
    }

    /// Apply exactly one explicit step of length `h` to `state`, without
    /// sub-dividing.
    ///
    /// # Errors
    ///
    /// [`RiskError::NumericalInstability`] if a cell turns non-finite; the
    /// state is then left partially updated.
    pub fn substep(
        &mut self,
        grid: &Grid,
        coeffs: &CoefficientFields,
        sources: &SourceField,
        state: &mut RiskState,
        h: f64,
    ) -> Result<()> {
        state.match_inertia(self.is_inertial());
        self.prepare(coeffs, sources);
        euler_step(
            grid,
            coeffs.diffusion(),
            &self.decay,
            &sources.intensity,
            &mut state.risk,
            state.flux.as_deref_mut(),
            &mut self.rhs,
            h,
            self.tau,
        );
        check_finite(grid, &state.risk, 0)?;
        if let Some(q) = &state.flux {
            check_finite(grid, q, 0)?;
        }
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn euler_step(
    grid: &Grid,
    diffusion: &[f64],
    decay: &[f64],
    source: &[f64],
    risk: &mut [f64],
    flux: Option<&mut [f64]>,
    rhs: &mut [f64],
    h: f64,
    tau: f64,
) {
    apply_operator(grid, diffusion, decay, source, risk, rhs);
    match flux {
        Some(q) => {
            let w = tau + h;
            for ((r, q), &f) in risk.iter_mut().zip(q.iter_mut()).zip(rhs.iter()) {
                *q = (tau * *q + h * f) / w;
                *r += h * *q;
            }
        }
        None => {
            for (r, &f) in risk.iter_mut().zip(rhs.iter()) {
                *r += h * f;
            }
        }
    }
}

fn check_finite(grid: &Grid, values: &[f64], substep: u32) -> Result<()> {
    match first_non_finite(values) {
        None => Ok(()),
        Some(cell_index) => {
            let (row, col) = grid.row_col(cell_index);
            Err(RiskError::NumericalInstability {
                cell_index,
                row,
                col,
                substep,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskfield_core::{DomainConfig, PdeParams, RoadGeometry};

    fn setup(pde: &PdeParams) -> (Grid, CoefficientFields, SourceField) {
        let grid = Grid::from_domain(&DomainConfig::default()).unwrap();
        let coeffs = CoefficientFields::build(&grid, &RoadGeometry::default(), pde).unwrap();
        let sources = SourceField::zeros(&grid);
        (grid, coeffs, sources)
    }

    #[test]
    fn substep_count_is_deterministic_and_monotone() {
        let a = stable_substeps(0.05, 230.0 / 149.0, 30.0 / 69.0, 4.0, 1.95);
        assert_eq!(a, 3);
        let mut prev = 0;
        for i in 1..50 {
            let n = stable_substeps(i as f64 * 0.01, 1.0, 0.5, 2.0, 0.5);
            assert!(n >= prev);
            prev = n;
        }
        assert_eq!(stable_substeps(0.0, 1.0, 1.0, 1.0, 1.0), 1);
        assert_eq!(stable_substeps(f64::NAN, 1.0, 1.0, 1.0, 1.0), 1);
        assert_eq!(stable_substeps(1e12, 1e-3, 1e-3, 1e3, 0.0), MAX_SUBSTEPS);
    }

    #[test]
    fn tiny_tau_matches_plain_scheme() {
        let pde = PdeParams::default();
        let (grid, coeffs, mut sources) = setup(&pde);
        let c = grid.flat_index_of(80.0, 0.0);
        sources.intensity[c] = 1.0;

        let mut plain = FieldIntegrator::new(&grid, 0.0);
        let mut stiff = FieldIntegrator::new(&grid, 1e-9);
        let mut a = RiskState::zeros(&grid, false);
        let mut b = RiskState::zeros(&grid, true);
        for _ in 0..10 {
            let pa = plain.advance(&grid, &coeffs, &sources, &mut a, 0.05).unwrap();
            let pb = stiff.advance(&grid, &coeffs, &sources, &mut b, 0.05).unwrap();
            assert_eq!(pa.substeps, pb.substeps);
        }
        assert!(b.risk.iter().chain(b.flux.as_ref().unwrap()).all(|v| v.is_finite()));
        let diff = a
            .risk
            .iter()
            .zip(&b.risk)
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max);
        assert!(diff < 1e-6 * a.risk[c], "diff {diff}");
    }

    #[test]
    fn failed_advance_keeps_flux_layout() {
        let (grid, coeffs, mut sources) = setup(&PdeParams::default());
        sources.intensity[5] = f64::INFINITY;
        let mut integ = FieldIntegrator::new(&grid, 0.3);
        let mut state = RiskState::zeros(&grid, false);
        let before = state.clone();
        integ
            .advance(&grid, &coeffs, &sources, &mut state, 0.05)
            .unwrap_err();
        assert!(state.flux.is_none());
        assert_eq!(state, before);
    }

    #[test]
    fn zero_dt_is_noop() {
        let (grid, coeffs, sources) = setup(&PdeParams::default());
        let mut integ = FieldIntegrator::new(&grid, 0.0);
        let mut state = RiskState::zeros(&grid, false);
        state.risk[100] = 1.0;
        let before = state.clone();
        let stats = integ.advance(&grid, &coeffs, &sources, &mut state, 0.0).unwrap();
        assert_eq!(stats.substeps, 0);
        assert_eq!(state, before);
    }

    #[test]
    fn source_grows_field_from_rest() {
        let (grid, coeffs, mut sources) = setup(&PdeParams::default());
        let centre = grid.flat_index_of(80.0, 0.0);
        sources.intensity[centre] = 1.0;
        let mut integ = FieldIntegrator::new(&grid, 0.0);
        let mut state = RiskState::zeros(&grid, false);
        let stats = integ
            .advance(&grid, &coeffs, &sources, &mut state, 0.05)
            .unwrap();
        assert!(stats.substeps >= 1);
        assert!(state.risk[centre] > 0.0);
        assert!(state.risk.iter().all(|&r| r >= 0.0));
    }

    #[test]
    fn instability_rolls_back() {
        let (grid, coeffs, mut sources) = setup(&PdeParams::default());
        sources.intensity[5] = f64::INFINITY;
        let mut integ = FieldIntegrator::new(&grid, 0.0);
        let mut state = RiskState::zeros(&grid, false);
        state.risk[7] = 0.5;
        let before = state.clone();
        let err = integ
            .advance(&grid, &coeffs, &sources, &mut state, 0.05)
            .unwrap_err();
        assert!(matches!(
            err,
            RiskError::NumericalInstability {
                cell_index: 5,
                row: 0,
                col: 5,
                substep: 0
            }
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn inertial_state_gains_flux_companion() {
        let pde = PdeParams {
            tau: 0.3,
            ..PdeParams::default()
        };
        let (grid, coeffs, mut sources) = setup(&pde);
        sources.intensity[grid.flat_index_of(80.0, 0.0)] = 1.0;
        let mut integ = FieldIntegrator::new(&grid, pde.tau);
        let mut state = RiskState::zeros(&grid, false);
        integ
            .advance(&grid, &coeffs, &sources, &mut state, 0.05)
            .unwrap();
        let q = state.flux.as_ref().unwrap();
        assert!(q[grid.flat_index_of(80.0, 0.0)] > 0.0);

        integ.set_tau(0.0);
        integ
            .advance(&grid, &coeffs, &sources, &mut state, 0.05)
            .unwrap();
        assert!(state.flux.is_none());
    }

    #[test]
    fn inertia_slows_the_initial_response() {
        let pde = PdeParams::default();
        let (grid, coeffs, mut sources) = setup(&pde);
        let c = grid.flat_index_of(80.0, 0.0);
        sources.intensity[c] = 1.0;

        let mut plain = FieldIntegrator::new(&grid, 0.0);
        let mut inertial = FieldIntegrator::new(&grid, 0.5);
        let mut a = RiskState::zeros(&grid, false);
        let mut b = RiskState::zeros(&grid, true);
        for _ in 0..4 {
            plain.advance(&grid, &coeffs, &sources, &mut a, 0.05).unwrap();
            inertial
                .advance(&grid, &coeffs, &sources, &mut b, 0.05)
                .unwrap();
        }
        assert!(b.risk[c] < a.risk[c], "{} vs {}", b.risk[c], a.risk[c]);
    }
}

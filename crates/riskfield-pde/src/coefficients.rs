//! Spatially varying PDE coefficients.
//!
//! [`CoefficientFields`] holds the static per-cell diffusion, decay and
//! sponge arrays. They depend only on the grid, the road geometry and the
//! PDE scalars, so they are built once and shared read-only across ticks.
//! The per-tick activity boost is not stored here; the integrator adds it
//! from the source synthesizer's output.

use log::info;
use riskfield_core::{PdeParams, Result, RiskError, RoadGeometry};
use riskfield_space::{cosine_falloff, Grid, Rect, Segment};

/// Width of the raised-cosine band softening the occlusion edge [m].
pub const OCCLUSION_TRANSITION_WIDTH: f64 = 2.0;

/// Occlusion indicator at `(x, y)`: 1 inside `zone`, falling to 0 over
/// [`OCCLUSION_TRANSITION_WIDTH`] outside it.
pub fn occlusion_indicator(zone: &Rect, x: f64, y: f64) -> f64 {
    cosine_falloff(zone.distance(x, y), OCCLUSION_TRANSITION_WIDTH)
}

/// Sponge damping at distance `d_boundary` from the nearest domain edge.
///
/// Quadratic ramp from 0 at `length` inside the edge to `peak` on it.
/// A zero `length` disables the sponge.
pub fn sponge_profile(d_boundary: f64, length: f64, peak: f64) -> f64 {
    if length <= 0.0 || d_boundary >= length {
        return 0.0;
    }
    let s = (length - d_boundary.max(0.0)) / length;
    peak * s * s
}

/// Baseline decay at distance `d_anchor` from the nearest source anchor.
pub fn decay_profile(d_anchor: f64, lambda_decay: f64, l_decay: f64) -> f64 {
    lambda_decay * (-d_anchor / l_decay).exp()
}

/// Static coefficient arrays for one grid and geometry.
///
/// All arrays are row-major with `grid.cell_count()` entries.
#[derive(Clone, Debug, PartialEq)]
pub struct CoefficientFields {
    nx: usize,
    ny: usize,
    occlusion: Vec<f64>,
    diffusion: Vec<f64>,
    decay: Vec<f64>,
    sponge: Vec<f64>,
    damping: Vec<f64>,
    d_max: f64,
    damping_max: f64,
}

impl CoefficientFields {
    /// Rasterise the coefficients for `grid`.
    ///
    /// # Errors
    ///
    /// [`RiskError::StaleConfiguration`] if the parameters or geometry do
    /// not validate against the grid rectangle.
    pub fn build(grid: &Grid, geometry: &RoadGeometry, pde: &PdeParams) -> Result<Self> {
        pde.validate()?;
        geometry.validate(&grid.domain())?;

        let zone = Rect::from(&geometry.occlusion);
        let merge = Segment::new(
            (geometry.merge_x_start, geometry.merge_y_ramp),
            (geometry.merge_x_end, geometry.merge_y_ramp),
        );

        let n = grid.cell_count();
        let mut occlusion = Vec::with_capacity(n);
        let mut diffusion = Vec::with_capacity(n);
        let mut decay = Vec::with_capacity(n);
        let mut sponge = Vec::with_capacity(n);

        for &y in grid.y() {
            for &x in grid.x() {
                let occ = occlusion_indicator(&zone, x, y);
                let anchor = merge.distance(x, y).min(zone.distance(x, y));
                occlusion.push(occ);
                diffusion.push(pde.d0 + pde.d_occ * occ);
                decay.push(decay_profile(anchor, pde.lambda_decay, pde.l_decay));
                sponge.push(sponge_profile(
                    grid.distance_to_boundary(x, y),
                    pde.sponge_length,
                    pde.lambda_sponge,
                ));
            }
        }

        let damping: Vec<f64> = decay.iter().zip(&sponge).map(|(l, s)| l + s).collect();
        let d_max = diffusion.iter().copied().fold(0.0, f64::max);
        let damping_max = damping.iter().copied().fold(0.0, f64::max);
        if !d_max.is_finite() || !damping_max.is_finite() {
            return Err(RiskError::stale(format!(
                "coefficients are not finite: d_max={d_max}, damping_max={damping_max}"
            )));
        }

        info!(
            "built coefficient fields for {}x{} grid: d_max={d_max:.3}, damping_max={damping_max:.3}",
            grid.nx(),
            grid.ny()
        );

        Ok(Self {
            nx: grid.nx(),
            ny: grid.ny(),
            occlusion,
            diffusion,
            decay,
            sponge,
            damping,
            d_max,
            damping_max,
        })
    }

    /// Grid shape `(nx, ny)` these fields were built for.
    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Occlusion indicator per cell, in `[0, 1]`.
    pub fn occlusion(&self) -> &[f64] {
        &self.occlusion
    }

    /// Diffusion coefficient `D` per cell.
    pub fn diffusion(&self) -> &[f64] {
        &self.diffusion
    }

    /// Baseline decay `lambda` per cell.
    pub fn decay(&self) -> &[f64] {
        &self.decay
    }

    /// Sponge damping `sigma` per cell.
    pub fn sponge(&self) -> &[f64] {
        &self.sponge
    }

    /// Static linear damping `lambda + sigma` per cell.
    pub fn damping(&self) -> &[f64] {
        &self.damping
    }

    /// Largest diffusion coefficient.
    pub fn d_max(&self) -> f64 {
        self.d_max
    }

    /// Largest static damping.
    pub fn damping_max(&self) -> f64 {
        self.damping_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskfield_core::{DomainConfig, OcclusionZone};

    fn reference() -> (Grid, CoefficientFields) {
        let grid = Grid::from_domain(&DomainConfig::default()).unwrap();
        let coeffs =
            CoefficientFields::build(&grid, &RoadGeometry::default(), &PdeParams::default())
                .unwrap();
        (grid, coeffs)
    }

    #[test]
    fn diffusion_is_elevated_inside_occlusion() {
        let (grid, c) = reference();
        let inside = grid.flat_index_of(20.0, 7.0);
        let outside = grid.flat_index_of(120.0, -10.0);
        assert!((c.diffusion()[inside] - 4.0).abs() < 1e-12);
        assert!((c.diffusion()[outside] - 1.0).abs() < 1e-12);
        assert_eq!(c.occlusion()[inside], 1.0);
        assert_eq!(c.occlusion()[outside], 0.0);
        assert!((c.d_max() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn occlusion_edge_is_softened() {
        let zone = Rect::from(&OcclusionZone::default());
        assert_eq!(occlusion_indicator(&zone, 20.0, 7.0), 1.0);
        assert!((occlusion_indicator(&zone, 31.0, 7.0) - 0.5).abs() < 1e-12);
        assert_eq!(occlusion_indicator(&zone, 32.5, 7.0), 0.0);
    }

    #[test]
    fn decay_falls_off_with_anchor_distance() {
        let (grid, c) = reference();
        let on_merge = c.decay()[grid.flat_index_of(50.0, 6.0)];
        let far = c.decay()[grid.flat_index_of(150.0, 6.0)];
        assert!((on_merge - 0.15).abs() < 1e-3);
        assert!(far < 0.15 * (-2.5f64).exp());
        assert!((decay_profile(30.0, 0.15, 30.0) - 0.15 / std::f64::consts::E).abs() < 1e-12);
    }

    #[test]
    fn sponge_profile_is_monotone_and_hits_peak() {
        assert_eq!(sponge_profile(0.0, 15.0, 1.5), 1.5);
        assert_eq!(sponge_profile(15.0, 15.0, 1.5), 0.0);
        assert_eq!(sponge_profile(40.0, 15.0, 1.5), 0.0);
        assert_eq!(sponge_profile(0.0, 0.0, 1.5), 0.0);
        let mut prev = f64::INFINITY;
        for i in 0..=30 {
            let v = sponge_profile(i as f64 * 0.5, 15.0, 1.5);
            assert!(v <= prev);
            prev = v;
        }
    }

    #[test]
    fn sponge_is_zero_in_interior_and_peaks_on_edges() {
        let (grid, c) = reference();
        assert_eq!(c.sponge()[grid.flat_index_of(80.0, 0.0)], 0.0);
        assert!((c.sponge()[grid.flat(0, 0)] - 1.5).abs() < 1e-12);
        assert!((c.sponge()[grid.flat(grid.ny() - 1, 75)] - 1.5).abs() < 1e-9);
        let damping = c.damping()[grid.flat(0, 0)];
        assert!((damping - c.decay()[0] - c.sponge()[0]).abs() < 1e-15);
        assert!(c.damping_max() >= 1.5);
    }

    #[test]
    fn occlusion_outside_grid_is_stale() {
        let grid = Grid::from_domain(&DomainConfig::default()).unwrap();
        let geometry = RoadGeometry {
            occlusion: OcclusionZone {
                x_min: 300.0,
                x_max: 320.0,
                y_min: 0.0,
                y_max: 4.0,
            },
            ..RoadGeometry::default()
        };
        let err = CoefficientFields::build(&grid, &geometry, &PdeParams::default()).unwrap_err();
        assert!(matches!(err, RiskError::StaleConfiguration { .. }));
    }

    #[test]
    fn build_is_deterministic() {
        let (_, a) = reference();
        let (_, b) = reference();
        assert_eq!(a, b);
        assert_eq!(a.shape(), (150, 70));
    }
}

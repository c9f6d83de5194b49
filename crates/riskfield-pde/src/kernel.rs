//! Gaussian kernels: 2D anisotropic splats for sources and 1D taps for smoothing.

use riskfield_core::{SourceParams, VehicleObservation};
use riskfield_space::Grid;
use smallvec::SmallVec;

/// Kernels are truncated at this many standard deviations on each axis.
pub const KERNEL_CUTOFF_SIGMAS: f64 = 4.0;

/// Unit-peak anisotropic Gaussian centred on a world position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaussianKernel {
    /// Centre x.
    pub cx: f64,
    /// Centre y.
    pub cy: f64,
    /// Longitudinal standard deviation.
    pub sx: f64,
    /// Lateral standard deviation.
    pub sy: f64,
}

impl GaussianKernel {
    /// Kernel for a vehicle, with the configured spreads for every class.
    pub fn for_vehicle(obs: &VehicleObservation, params: &SourceParams) -> Self {
        Self {
            cx: obs.x,
            cy: obs.y,
            sx: params.sigma_x,
            sy: params.sigma_y,
        }
    }

    /// Kernel value at `(x, y)`; zero outside the truncation box.
    pub fn weight(&self, x: f64, y: f64) -> f64 {
        let u = (x - self.cx) / self.sx;
        let v = (y - self.cy) / self.sy;
        if u.abs() > KERNEL_CUTOFF_SIGMAS || v.abs() > KERNEL_CUTOFF_SIGMAS {
            return 0.0;
        }
        (-0.5 * (u * u + v * v)).exp()
    }

    /// Row and column ranges of the truncation box on `grid`.
    fn window(&self, grid: &Grid) -> Option<((usize, usize), (usize, usize))> {
        let hx = KERNEL_CUTOFF_SIGMAS * self.sx;
        let hy = KERNEL_CUTOFF_SIGMAS * self.sy;
        let cols = grid.col_span(self.cx - hx, self.cx + hx)?;
        let rows = grid.row_span(self.cy - hy, self.cy + hy)?;
        Some((rows, cols))
    }

    /// Add `amplitude * weight` to every cell in the truncation box.
    pub fn splat_add(&self, grid: &Grid, amplitude: f64, field: &mut [f64]) {
        self.splat_with(grid, field, |cell, w| *cell += amplitude * w);
    }

    /// Raise every cell in the truncation box to at least `amplitude * weight`.
    pub fn splat_max(&self, grid: &Grid, amplitude: f64, field: &mut [f64]) {
        self.splat_with(grid, field, |cell, w| *cell = cell.max(amplitude * w));
    }

    fn splat_with(&self, grid: &Grid, field: &mut [f64], mut apply: impl FnMut(&mut f64, f64)) {
        let Some(((r0, r1), (c0, c1))) = self.window(grid) else {
            return;
        };
        let xs = grid.x();
        let ys = grid.y();
        let nx = grid.nx();
        for row in r0..=r1 {
            let v = (ys[row] - self.cy) / self.sy;
            let gy = -0.5 * v * v;
            for col in c0..=c1 {
                let u = (xs[col] - self.cx) / self.sx;
                let w = (gy - 0.5 * u * u).exp();
                apply(&mut field[row * nx + col], w);
            }
        }
    }
}

/// Normalised 1D Gaussian taps for a standard deviation of `sigma` cells.
///
/// The radius is `ceil(4 * sigma)` cells, so the returned slice has odd
/// length `2 * radius + 1` and sums to one. A non-positive sigma yields
/// the single identity tap.
pub fn gaussian_taps(sigma: f64) -> SmallVec<[f64; 16]> {
    let mut taps = SmallVec::new();
    if !(sigma > 0.0) {
        taps.push(1.0);
        return taps;
    }
    let radius = (KERNEL_CUTOFF_SIGMAS * sigma).ceil().max(1.0) as i64;
    let inv = 1.0 / (2.0 * sigma * sigma);
    for k in -radius..=radius {
        let kf = k as f64;
        taps.push((-kf * kf * inv).exp());
    }
    let total: f64 = taps.iter().sum();
    for t in taps.iter_mut() {
        *t /= total;
    }
    taps
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskfield_core::VehicleClass;

    #[test]
    fn vehicle_kernel_uses_configured_spreads() {
        let params = SourceParams {
            sigma_x: 9.0,
            sigma_y: 2.0,
            ..SourceParams::default()
        };
        let car = GaussianKernel::for_vehicle(
            &VehicleObservation::new(1u64, 4.0, -1.0, VehicleClass::Car),
            &params,
        );
        let truck = GaussianKernel::for_vehicle(
            &VehicleObservation::new(2u64, 4.0, -1.0, VehicleClass::Truck),
            &params,
        );
        assert_eq!((car.cx, car.cy, car.sx, car.sy), (4.0, -1.0, 9.0, 2.0));
        assert_eq!(truck, car);
    }

    #[test]
    fn weight_peaks_at_centre_and_truncates() {
        let k = GaussianKernel {
            cx: 10.0,
            cy: 0.0,
            sx: 2.0,
            sy: 1.0,
        };
        assert_eq!(k.weight(10.0, 0.0), 1.0);
        assert!((k.weight(12.0, 0.0) - (-0.5f64).exp()).abs() < 1e-12);
        assert_eq!(k.weight(18.5, 0.0), 0.0);
        assert_eq!(k.weight(10.0, -4.5), 0.0);
    }

    #[test]
    fn splat_matches_weight_on_cells() {
        let grid = Grid::new(0.0, 20.0, -5.0, 5.0, 21, 11).unwrap();
        let k = GaussianKernel {
            cx: 10.0,
            cy: 0.0,
            sx: 2.0,
            sy: 1.0,
        };
        let mut field = vec![0.0; grid.cell_count()];
        k.splat_add(&grid, 0.5, &mut field);
        for row in 0..grid.ny() {
            for col in 0..grid.nx() {
                let (x, y) = grid.position(row, col);
                let expected = 0.5 * k.weight(x, y);
                assert!((field[grid.flat(row, col)] - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn splat_max_keeps_larger_value() {
        let grid = Grid::new(0.0, 4.0, 0.0, 4.0, 5, 5).unwrap();
        let k = GaussianKernel {
            cx: 2.0,
            cy: 2.0,
            sx: 1.0,
            sy: 1.0,
        };
        let mut field = vec![0.3; grid.cell_count()];
        k.splat_max(&grid, 1.0, &mut field);
        assert_eq!(field[grid.flat(2, 2)], 1.0);
        assert_eq!(field[grid.flat(0, 0)], 0.3);
    }

    #[test]
    fn splat_outside_grid_is_noop() {
        let grid = Grid::new(0.0, 4.0, 0.0, 4.0, 5, 5).unwrap();
        let k = GaussianKernel {
            cx: 100.0,
            cy: 2.0,
            sx: 1.0,
            sy: 1.0,
        };
        let mut field = vec![0.0; grid.cell_count()];
        k.splat_add(&grid, 1.0, &mut field);
        assert!(field.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn taps_are_normalised_and_symmetric() {
        let taps = gaussian_taps(1.5);
        assert_eq!(taps.len(), 2 * 6 + 1);
        let total: f64 = taps.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        for k in 0..taps.len() / 2 {
            assert!((taps[k] - taps[taps.len() - 1 - k]).abs() < 1e-15);
        }
        assert_eq!(gaussian_taps(0.0).as_slice(), &[1.0]);
    }
}

//! Output smoothing.
//!
//! A separable Gaussian blur applied to snapshot copies. Edges reflect
//! symmetrically (the edge cell is repeated), which keeps the total of the
//! field unchanged.

use riskfield_space::Grid;
use smallvec::SmallVec;

use crate::kernel::gaussian_taps;

/// Map an out-of-range index onto `[0, n)` by mirror reflection.
#[inline]
fn reflect(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period) as usize;
    if m < n {
        m
    } else {
        2 * n - 1 - m
    }
}

/// Separable Gaussian smoother with a fixed sigma in grid cells.
#[derive(Clone, Debug, PartialEq)]
pub struct PostProcessor {
    sigma: f64,
    taps: SmallVec<[f64; 16]>,
}

impl PostProcessor {
    /// Smoother with standard deviation `sigma` cells; 0 disables it.
    pub fn new(sigma: f64) -> Self {
        Self {
            sigma,
            taps: gaussian_taps(sigma),
        }
    }

    /// Configured sigma in cells.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Whether smoothing changes anything.
    pub fn is_identity(&self) -> bool {
        self.taps.len() == 1
    }

    /// Normalised 1D taps, length `2 * radius + 1`.
    pub fn taps(&self) -> &[f64] {
        &self.taps
    }

    /// Smoothed copy of `field`. The input is never modified.
    pub fn apply(&self, grid: &Grid, field: &[f64]) -> Vec<f64> {
        if self.is_identity() {
            return field.to_vec();
        }
        let nx = grid.nx();
        let ny = grid.ny();
        let radius = (self.taps.len() / 2) as isize;

        let mut tmp = vec![0.0; field.len()];
        for row in 0..ny {
            let line = &field[row * nx..(row + 1) * nx];
            let out = &mut tmp[row * nx..(row + 1) * nx];
            for (col, o) in out.iter_mut().enumerate() {
                let mut acc = 0.0;
                for (k, &w) in self.taps.iter().enumerate() {
                    let src = col as isize + k as isize - radius;
                    acc += w * line[reflect(src, nx)];
                }
                *o = acc;
            }
        }

        let mut out = vec![0.0; field.len()];
        for row in 0..ny {
            for (k, &w) in self.taps.iter().enumerate() {
                let src = reflect(row as isize + k as isize - radius, ny);
                let from = &tmp[src * nx..(src + 1) * nx];
                let to = &mut out[row * nx..(row + 1) * nx];
                for (o, &v) in to.iter_mut().zip(from) {
                    *o += w * v;
                }
            }
        }
        out
    }
}

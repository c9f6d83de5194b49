//! Finite-difference stencils on the row-major world grid.
//!
//! The spatial operator is written in conservative flux form so that the
//! diffusion term neither creates nor destroys mass. Face diffusivities
//! are arithmetic means of the two adjacent cells. Faces on the outer
//! boundary carry zero flux (homogeneous Neumann); absorption at the
//! edges is left to the sponge term.

use riskfield_space::Grid;

/// Evaluate `F(R) = div(D grad R) - k R + S` into `out`.
///
/// All slices are row-major with `grid.cell_count()` entries.
pub(crate) fn apply_operator(
    grid: &Grid,
    diffusion: &[f64],
    decay: &[f64],
    source: &[f64],
    risk: &[f64],
    out: &mut [f64],
) {
    let nx = grid.nx();
    let ny = grid.ny();
    let inv_dx2 = 1.0 / (grid.dx() * grid.dx());
    let inv_dy2 = 1.0 / (grid.dy() * grid.dy());

    for row in 0..ny {
        let base = row * nx;
        for col in 0..nx {
            let i = base + col;
            let c = risk[i];
            let d = diffusion[i];
            let mut flux = 0.0;

            if col + 1 < nx {
                let face = 0.5 * (d + diffusion[i + 1]);
                flux += face * (risk[i + 1] - c) * inv_dx2;
            }
            if col > 0 {
                let face = 0.5 * (d + diffusion[i - 1]);
                flux += face * (risk[i - 1] - c) * inv_dx2;
            }
            if row + 1 < ny {
                let face = 0.5 * (d + diffusion[i + nx]);
                flux += face * (risk[i + nx] - c) * inv_dy2;
            }
            if row > 0 {
                let face = 0.5 * (d + diffusion[i - nx]);
                flux += face * (risk[i - nx] - c) * inv_dy2;
            }

            out[i] = flux - decay[i] * c + source[i];
        }
    }
}

/// Index of the first non-finite value, if any.
pub(crate) fn first_non_finite(values: &[f64]) -> Option<usize> {
    values.iter().position(|v| !v.is_finite())
}

//! Summary statistics over row-major field arrays.

use riskfield_space::Grid;

/// Integral of `values` over the grid, `sum * dx * dy`.
pub fn field_mass(grid: &Grid, values: &[f64]) -> f64 {
    values.iter().sum::<f64>() * grid.cell_area()
}

/// Largest value, or `-inf` for an empty slice.
pub fn field_max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Flat index of the largest value.
pub fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Largest value on the outermost ring of cells.
pub fn edge_max(grid: &Grid, values: &[f64]) -> f64 {
    let (nx, ny) = (grid.nx(), grid.ny());
    let mut m = f64::NEG_INFINITY;
    for col in 0..nx {
        m = m.max(values[grid.flat(0, col)]);
        m = m.max(values[grid.flat(ny - 1, col)]);
    }
    for row in 0..ny {
        m = m.max(values[grid.flat(row, 0)]);
        m = m.max(values[grid.flat(row, nx - 1)]);
    }
    m
}

/// Largest elementwise absolute difference.
pub fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "field length mismatch");
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

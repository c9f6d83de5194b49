//! World-frame 2D grid.

use riskfield_core::{DomainConfig, Result, RiskError};

/// An immutable rectangular grid in the world frame.
///
/// Cell `(row, col)` sits at `(x[col], y[row])`, where
/// `x[i] = x_min + i * dx` and `y[j] = y_min + j * dy`. Field arrays are
/// stored row-major with `ny` rows of `nx` columns, so the flat index of
/// `(row, col)` is `row * nx + col`.
///
/// Coordinate arrays are computed once at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    nx: usize,
    ny: usize,
    dx: f64,
    dy: f64,
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Grid {
    /// Build a grid from its six defining scalars.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::InvalidDomain`] if `nx < 2`, `ny < 2`,
    /// `x_max <= x_min`, `y_max <= y_min`, or a bound is not finite.
    ///
    /// # Examples
    ///
    /// ```
    /// use riskfield_space::Grid;
    ///
    /// let grid = Grid::new(0.0, 10.0, -1.0, 1.0, 11, 3).unwrap();
    /// assert_eq!(grid.dx(), 1.0);
    /// assert_eq!(grid.cell_count(), 33);
    /// assert_eq!(grid.index_of(3.4, 0.9), (2, 3));
    /// ```
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64, nx: usize, ny: usize) -> Result<Self> {
        DomainConfig {
            x_min,
            x_max,
            y_min,
            y_max,
            nx,
            ny,
        }
        .validate()?;

        let dx = (x_max - x_min) / (nx - 1) as f64;
        let dy = (y_max - y_min) / (ny - 1) as f64;
        if !(dx > 0.0 && dy > 0.0) {
            return Err(RiskError::domain(format!(
                "cell spacing underflows: dx={dx}, dy={dy}"
            )));
        }
        let x = (0..nx).map(|i| x_min + i as f64 * dx).collect();
        let y = (0..ny).map(|j| y_min + j as f64 * dy).collect();

        Ok(Self {
            x_min,
            x_max,
            y_min,
            y_max,
            nx,
            ny,
            dx,
            dy,
            x,
            y,
        })
    }

    /// Build a grid from a [`DomainConfig`].
    ///
    /// # Errors
    ///
    /// Same as [`Grid::new`].
    pub fn from_domain(domain: &DomainConfig) -> Result<Self> {
        Self::new(
            domain.x_min,
            domain.x_max,
            domain.y_min,
            domain.y_max,
            domain.nx,
            domain.ny,
        )
    }

    /// The six defining scalars as a [`DomainConfig`].
    pub fn domain(&self) -> DomainConfig {
        DomainConfig {
            x_min: self.x_min,
            x_max: self.x_max,
            y_min: self.y_min,
            y_max: self.y_max,
            nx: self.nx,
            ny: self.ny,
        }
    }

    /// Number of columns (cells along x).
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// Number of rows (cells along y).
    pub fn ny(&self) -> usize {
        self.ny
    }

    /// Longitudinal spacing.
    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// Lateral spacing.
    pub fn dy(&self) -> f64 {
        self.dy
    }

    /// Area represented by one cell, `dx * dy`.
    pub fn cell_area(&self) -> f64 {
        self.dx * self.dy
    }

    /// Total number of cells, `nx * ny`.
    pub fn cell_count(&self) -> usize {
        self.nx * self.ny
    }

    /// Lower x bound.
    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    /// Upper x bound.
    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    /// Lower y bound.
    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    /// Upper y bound.
    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    /// Column coordinates, length `nx`.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Row coordinates, length `ny`.
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Flat row-major index of `(row, col)`.
    #[inline]
    pub fn flat(&self, row: usize, col: usize) -> usize {
        row * self.nx + col
    }

    /// Inverse of [`flat`](Grid::flat).
    #[inline]
    pub fn row_col(&self, idx: usize) -> (usize, usize) {
        (idx / self.nx, idx % self.nx)
    }

    /// World position of `(row, col)`.
    #[inline]
    pub fn position(&self, row: usize, col: usize) -> (f64, f64) {
        (self.x[col], self.y[row])
    }

    /// Nearest cell `(row, col)` to the world position `(x, y)`.
    ///
    /// Never fails: positions outside the domain saturate to the nearest
    /// edge cell, since tracked vehicles may sit just outside the visible
    /// area. A NaN coordinate saturates to index 0 on that axis.
    pub fn index_of(&self, x: f64, y: f64) -> (usize, usize) {
        let col = Self::nearest(x, self.x_min, self.dx, self.nx);
        let row = Self::nearest(y, self.y_min, self.dy, self.ny);
        (row, col)
    }

    /// Flat index of the nearest cell to `(x, y)`; see [`index_of`](Grid::index_of).
    pub fn flat_index_of(&self, x: f64, y: f64) -> usize {
        let (row, col) = self.index_of(x, y);
        self.flat(row, col)
    }

    /// Inclusive column range covering `[x0, x1]`, clipped to the grid.
    ///
    /// Returns `None` when the interval misses the grid entirely.
    pub fn col_span(&self, x0: f64, x1: f64) -> Option<(usize, usize)> {
        Self::span(x0, x1, self.x_min, self.x_max, self.dx, self.nx)
    }

    /// Inclusive row range covering `[y0, y1]`, clipped to the grid.
    pub fn row_span(&self, y0: f64, y1: f64) -> Option<(usize, usize)> {
        Self::span(y0, y1, self.y_min, self.y_max, self.dy, self.ny)
    }

    /// Distance from `(x, y)` to the nearest domain edge (0 on the boundary).
    pub fn distance_to_boundary(&self, x: f64, y: f64) -> f64 {
        let dx = (x - self.x_min).min(self.x_max - x);
        let dy = (y - self.y_min).min(self.y_max - y);
        dx.min(dy).max(0.0)
    }

    fn nearest(v: f64, origin: f64, step: f64, n: usize) -> usize {
        let t = ((v - origin) / step).round();
        if t.is_nan() || t <= 0.0 {
            0
        } else if t >= (n - 1) as f64 {
            n - 1
        } else {
            t as usize
        }
    }

    fn span(lo: f64, hi: f64, min: f64, max: f64, step: f64, n: usize) -> Option<(usize, usize)> {
        if !(lo <= hi) || hi < min || lo > max {
            return None;
        }
        let a = ((lo - min) / step).ceil().max(0.0) as usize;
        let b = (((hi - min) / step).floor().max(0.0) as usize).min(n - 1);
        if a > b {
            return None;
        }
        Some((a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> Grid {
        Grid::from_domain(&DomainConfig::default()).unwrap()
    }

    #[test]
    fn spacing_matches_linspace() {
        let g = reference();
        assert!((g.dx() - 230.0 / 149.0).abs() < 1e-12);
        assert!((g.dy() - 30.0 / 69.0).abs() < 1e-12);
        assert_eq!(g.x().len(), 150);
        assert_eq!(g.y().len(), 70);
        assert_eq!(g.x()[0], -30.0);
        assert!((g.x()[149] - 200.0).abs() < 1e-9);
        assert!((g.y()[69] - 15.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_degenerate_domains() {
        assert!(matches!(
            Grid::new(0.0, 1.0, 0.0, 1.0, 1, 5),
            Err(RiskError::InvalidDomain { .. })
        ));
        assert!(matches!(
            Grid::new(0.0, 1.0, 0.0, 1.0, 5, 1),
            Err(RiskError::InvalidDomain { .. })
        ));
        assert!(Grid::new(1.0, 1.0, 0.0, 1.0, 5, 5).is_err());
        assert!(Grid::new(0.0, 1.0, 2.0, 1.0, 5, 5).is_err());
    }

    #[test]
    fn index_of_saturates_outside() {
        let g = reference();
        assert_eq!(g.index_of(-1000.0, -1000.0), (0, 0));
        assert_eq!(g.index_of(1000.0, 1000.0), (69, 149));
        assert_eq!(g.index_of(f64::NAN, 0.0).1, 0);
    }

    #[test]
    fn index_of_round_trips_cell_centres() {
        let g = reference();
        for &(row, col) in &[(0, 0), (10, 37), (69, 149), (35, 75)] {
            let (x, y) = g.position(row, col);
            assert_eq!(g.index_of(x, y), (row, col));
            assert_eq!(g.flat_index_of(x, y), g.flat(row, col));
        }
    }

    #[test]
    fn domain_round_trips() {
        let d = DomainConfig::default();
        assert_eq!(Grid::from_domain(&d).unwrap().domain(), d);
    }

    #[test]
    fn flat_and_row_col_are_inverse() {
        let g = reference();
        let idx = g.flat(12, 34);
        assert_eq!(idx, 12 * 150 + 34);
        assert_eq!(g.row_col(idx), (12, 34));
    }

    #[test]
    fn spans_clip_to_grid() {
        let g = Grid::new(0.0, 10.0, 0.0, 4.0, 11, 5).unwrap();
        assert_eq!(g.col_span(2.5, 6.0), Some((3, 6)));
        assert_eq!(g.col_span(-5.0, 1.0), Some((0, 1)));
        assert_eq!(g.col_span(8.5, 50.0), Some((9, 10)));
        assert_eq!(g.col_span(11.0, 12.0), None);
        assert_eq!(g.col_span(3.2, 3.8), None);
        assert_eq!(g.row_span(0.0, 4.0), Some((0, 4)));
    }

    #[test]
    fn distance_to_boundary_is_min_over_edges() {
        let g = Grid::new(0.0, 10.0, 0.0, 4.0, 11, 5).unwrap();
        assert_eq!(g.distance_to_boundary(5.0, 2.0), 2.0);
        assert_eq!(g.distance_to_boundary(1.0, 2.0), 1.0);
        assert_eq!(g.distance_to_boundary(0.0, 0.0), 0.0);
        assert_eq!(g.distance_to_boundary(-3.0, 2.0), 0.0);
    }
}

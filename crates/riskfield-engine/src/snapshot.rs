//! Owned, immutable views of the risk field.

use std::sync::Arc;

use riskfield_core::TickId;
use riskfield_space::Grid;

/// The risk field and its time derivative after a completed tick.
///
/// Values are post-processed when smoothing is configured; the derivative
/// is always the raw one. A snapshot owns its arrays, so it can be handed
/// to another thread while the solver keeps stepping.
#[derive(Clone, Debug, PartialEq)]
pub struct RiskSnapshot {
    grid: Arc<Grid>,
    values: Vec<f64>,
    derivative: Vec<f64>,
    time: f64,
    tick: TickId,
}

impl RiskSnapshot {
    /// Assemble a snapshot. Both arrays must have `grid.cell_count()` entries.
    pub fn new(
        grid: Arc<Grid>,
        values: Vec<f64>,
        derivative: Vec<f64>,
        time: f64,
        tick: TickId,
    ) -> Self {
        debug_assert_eq!(values.len(), grid.cell_count());
        debug_assert_eq!(derivative.len(), grid.cell_count());
        Self {
            grid,
            values,
            derivative,
            time,
            tick,
        }
    }

    /// Grid the arrays are aligned to.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Row-major risk values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Row-major `dR/dt`.
    pub fn derivative(&self) -> &[f64] {
        &self.derivative
    }

    /// Simulation time of the snapshot.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Tick that produced the snapshot.
    pub fn tick(&self) -> TickId {
        self.tick
    }

    /// Risk at the cell nearest to `(x, y)`.
    pub fn value_at(&self, x: f64, y: f64) -> f64 {
        self.values[self.grid.flat_index_of(x, y)]
    }

    /// Position and value of the maximum, `(x, y, value)`.
    pub fn peak(&self) -> (f64, f64, f64) {
        let (idx, value) = self
            .values
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, v)| {
                if v > best.1 {
                    (i, v)
                } else {
                    best
                }
            });
        let (row, col) = self.grid.row_col(idx);
        let (x, y) = self.grid.position(row, col);
        (x, y, value)
    }

    /// Integral of the field, `sum * dx * dy`.
    pub fn total_mass(&self) -> f64 {
        self.values.iter().sum::<f64>() * self.grid.cell_area()
    }

    /// The row nearest to `y` as a longitudinal profile along `grid().x()`.
    pub fn lane_profile(&self, y: f64) -> &[f64] {
        let (row, _) = self.grid.index_of(self.grid.x_min(), y);
        let nx = self.grid.nx();
        &self.values[row * nx..(row + 1) * nx]
    }
}

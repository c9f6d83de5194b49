//! Error type for the riskfield solver.
//!
//! One enum covers the four failure kinds the solver can report. Only
//! [`RiskError::InvalidVehicleObservation`] is recoverable within a tick:
//! the offending observation is dropped and the tick continues. The other
//! kinds abort the operation that raised them and are surfaced to the
//! caller unchanged.

use thiserror::Error;

use crate::id::VehicleId;

/// Errors raised by grid construction, configuration, source ingestion
/// and field integration.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RiskError {
    /// Grid parameters do not describe a usable rectangle.
    ///
    /// Fatal at construction time.
    #[error("invalid domain: {reason}")]
    InvalidDomain {
        /// What is wrong with the domain.
        reason: String,
    },

    /// A single vehicle observation could not be used this tick.
    ///
    /// The solver drops the observation and logs it; the tick proceeds.
    #[error("invalid observation for vehicle {id}: {reason}")]
    InvalidVehicleObservation {
        /// Identifier of the rejected vehicle.
        id: VehicleId,
        /// Why the observation was rejected.
        reason: String,
    },

    /// A cell became NaN or infinite after an integration sub-step.
    ///
    /// The tick is rolled back. Retrying with the same `dt` and
    /// configuration reproduces the failure.
    #[error("non-finite risk at cell {cell_index} (row {row}, col {col}) after sub-step {substep}")]
    NumericalInstability {
        /// Flat row-major index of the first non-finite cell.
        cell_index: usize,
        /// Row (y index) of the cell.
        row: usize,
        /// Column (x index) of the cell.
        col: usize,
        /// Zero-based sub-step within the tick that produced it.
        substep: u32,
    },

    /// Coefficient recomputation was requested with geometry or
    /// parameters that are inconsistent with the grid.
    #[error("stale configuration: {reason}")]
    StaleConfiguration {
        /// What makes the configuration unusable.
        reason: String,
    },
}

impl RiskError {
    /// Shorthand for [`RiskError::InvalidDomain`].
    pub fn domain(reason: impl Into<String>) -> Self {
        Self::InvalidDomain {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`RiskError::StaleConfiguration`].
    pub fn stale(reason: impl Into<String>) -> Self {
        Self::StaleConfiguration {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`RiskError::InvalidVehicleObservation`].
    pub fn observation(id: VehicleId, reason: impl Into<String>) -> Self {
        Self::InvalidVehicleObservation {
            id,
            reason: reason.into(),
        }
    }

    /// Whether the error only invalidates a single observation.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidVehicleObservation { .. })
    }
}

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, RiskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_reason() {
        let e = RiskError::domain("nx must be >= 2, got 1");
        assert_eq!(e.to_string(), "invalid domain: nx must be >= 2, got 1");

        let e = RiskError::stale("occlusion zone outside grid");
        assert!(e.to_string().contains("occlusion zone outside grid"));
    }

    #[test]
    fn instability_display_names_cell() {
        let e = RiskError::NumericalInstability {
            cell_index: 151,
            row: 1,
            col: 1,
            substep: 2,
        };
        let msg = e.to_string();
        assert!(msg.contains("151"), "got: {msg}");
        assert!(msg.contains("sub-step 2"), "got: {msg}");
    }

    #[test]
    fn only_observation_errors_are_recoverable() {
        assert!(RiskError::observation(VehicleId(3), "NaN x").is_recoverable());
        assert!(!RiskError::domain("bad").is_recoverable());
        assert!(!RiskError::stale("bad").is_recoverable());
        assert!(!RiskError::NumericalInstability {
            cell_index: 0,
            row: 0,
            col: 0,
            substep: 0
        }
        .is_recoverable());
    }
}

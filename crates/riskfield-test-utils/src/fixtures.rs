//! Reusable configurations and observations.

use riskfield_core::{DomainConfig, PdeParams, RiskConfig, VehicleClass, VehicleObservation};
use riskfield_space::Grid;

/// The reference merge scenario: 150x70 cells over `[-30, 200] x [-15, 15]`.
pub fn reference_config() -> RiskConfig {
    RiskConfig::default()
}

/// Grid of [`reference_config`].
pub fn reference_grid() -> Grid {
    Grid::from_domain(&DomainConfig::default()).expect("reference domain is valid")
}

/// Same rectangle and physics on a 60x30 grid, for long-running tests.
pub fn coarse_config() -> RiskConfig {
    RiskConfig {
        domain: DomainConfig {
            nx: 60,
            ny: 30,
            ..DomainConfig::default()
        },
        ..RiskConfig::default()
    }
}

/// `config` with the telegrapher relaxation time set to `tau`.
pub fn with_tau(config: RiskConfig, tau: f64) -> RiskConfig {
    RiskConfig {
        pde: PdeParams { tau, ..config.pde },
        ..config
    }
}

/// A single truck observation.
pub fn truck_at(id: u64, x: f64, y: f64) -> VehicleObservation {
    VehicleObservation::new(id, x, y, VehicleClass::Truck)
}

//! Benchmark profiles for the riskfield solver.
//!
//! - [`reference_profile`]: the 150x70 merge scenario.
//! - [`stress_profile`]: same rectangle at 600x280 (~168K cells).
//! - [`inertial_profile`]: reference grid with the telegrapher term on.
//! - [`busy_fleet`]: deterministic traffic over the whole road.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use riskfield_core::{DomainConfig, RiskConfig};
use riskfield_test_utils::{reference_config, with_tau, FleetGenerator};

/// The reference merge configuration (10.5K cells).
pub fn reference_profile() -> RiskConfig {
    reference_config()
}

/// The reference rectangle at 16x the cell count.
pub fn stress_profile() -> RiskConfig {
    RiskConfig {
        domain: DomainConfig {
            nx: 600,
            ny: 280,
            ..DomainConfig::default()
        },
        ..RiskConfig::default()
    }
}

/// Reference grid with `tau = 0.3` s.
pub fn inertial_profile() -> RiskConfig {
    with_tau(reference_config(), 0.3)
}

/// A fleet of `count` vehicles spread over the road, seeded.
pub fn busy_fleet(config: &RiskConfig, count: usize, seed: u64) -> FleetGenerator {
    let mut fleet = FleetGenerator::new(
        seed,
        &config.geometry,
        config.domain.x_min,
        config.domain.x_max,
        2.0,
    );
    fleet.populate(count);
    fleet
}

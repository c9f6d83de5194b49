//! Riskfield: a time-evolving traffic risk field over a highway merge.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! riskfield sub-crates. For most users, adding `riskfield` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use riskfield::prelude::*;
//!
//! let mut solver = RiskFieldSolver::new(RiskConfig::default()).unwrap();
//! let truck = VehicleObservation::new(1u64, 50.0, 6.0, VehicleClass::Truck);
//! for _ in 0..20 {
//!     let metrics = solver.step(&[truck], 0.05).unwrap();
//!     assert_eq!(metrics.accepted_observations, 1);
//! }
//!
//! let snapshot = solver.snapshot();
//! let (x, _, peak) = snapshot.peak();
//! assert!(peak > 0.0);
//! assert!((x - 50.0).abs() < 5.0);
//! assert_eq!(snapshot.tick(), TickId(20));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `riskfield-core` | IDs, observations, configuration, errors |
//! | [`space`] | `riskfield-space` | Grid and zone primitives |
//! | [`pde`] | `riskfield-pde` | Coefficients, sources, memory, integrator, smoothing |
//! | [`engine`] | `riskfield-engine` | Solver, snapshots, metrics, shared cells |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, configuration and errors (`riskfield-core`).
pub use riskfield_core as types;

/// Computational grid and geometric zones (`riskfield-space`).
///
/// [`space::Grid`] is shared by every stage of the pipeline.
pub use riskfield_space as space;

/// Numerical core (`riskfield-pde`).
///
/// Coefficient rasterisation, source synthesis, activity memory, the
/// explicit integrator and output smoothing.
pub use riskfield_pde as pde;

/// Tick orchestration (`riskfield-engine`).
///
/// [`engine::RiskFieldSolver`] owns all mutable state and produces
/// [`engine::RiskSnapshot`]s.
pub use riskfield_engine as engine;

/// Common imports for typical riskfield usage.
///
/// ```rust
/// use riskfield::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use riskfield_core::{
        DomainConfig, OcclusionZone, PdeParams, RiskConfig, RoadGeometry, SourceParams, TickId,
        VehicleClass, VehicleDimensions, VehicleId, VehicleObservation,
    };

    // Errors
    pub use riskfield_core::{Result, RiskError};

    // Space
    pub use riskfield_space::{Grid, Rect, Segment};

    // Engine
    pub use riskfield_engine::{RiskFieldSolver, RiskSnapshot, SharedSnapshot, StepMetrics};
}

//! Tick orchestration for the riskfield solver.
//!
//! [`RiskFieldSolver`] runs the synchronous per-tick pipeline (sources,
//! integration, derivative, publication) and owns all mutable state.
//! Results leave the solver as owned [`RiskSnapshot`]s, optionally through
//! the [`SharedSnapshot`] swap cell for readers on other threads.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod metrics;
pub mod shared;
pub mod snapshot;
pub mod solver;

pub use metrics::StepMetrics;
pub use shared::{SharedCoefficients, SharedSnapshot, SwapCell};
pub use snapshot::RiskSnapshot;
pub use solver::RiskFieldSolver;

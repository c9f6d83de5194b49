//! Numerical core of the riskfield solver.
//!
//! # Pipeline (each tick)
//!
//! 1. [`SourceSynthesizer`] turns vehicle observations into a
//!    [`SourceField`] and updates the [`ActivityMemory`].
//! 2. [`FieldIntegrator`] advances the [`RiskState`] using the cached
//!    [`CoefficientFields`] and the source field.
//! 3. [`PostProcessor`] smooths a copy of the result for display.
//!
//! [`CoefficientFields`] is rebuilt only when geometry or PDE parameters
//! change.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod coefficients;
pub mod integrator;
pub mod kernel;
pub mod memory;
pub mod postprocess;
pub mod sources;
mod stencil;

pub use coefficients::{
    decay_profile, occlusion_indicator, sponge_profile, CoefficientFields,
    OCCLUSION_TRANSITION_WIDTH,
};
pub use integrator::{
    stable_substeps, AdvanceStats, FieldIntegrator, RiskState, CFL_SAFETY, MAX_SUBSTEPS,
};
pub use kernel::{gaussian_taps, GaussianKernel, KERNEL_CUTOFF_SIGMAS};
pub use memory::{ActivityMemory, MemoryEntry};
pub use postprocess::PostProcessor;
pub use sources::{in_shadow, SourceField, SourceSynthesizer, SynthesisReport};

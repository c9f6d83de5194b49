//! Test fixtures and helpers for riskfield development.
//!
//! - [`fixtures`]: reference and reduced configurations, single-vehicle
//!   scenarios.
//! - [`fleet`]: deterministic random traffic seeded through `rand_chacha`.
//! - [`field`]: summary statistics over row-major field arrays.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod field;
pub mod fixtures;
pub mod fleet;

pub use field::{argmax, edge_max, field_max, field_mass, max_abs_diff};
pub use fixtures::{coarse_config, reference_config, reference_grid, truck_at, with_tau};
pub use fleet::FleetGenerator;

//! Core types for the riskfield merge-risk solver.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! identifiers, vehicle observation types, configuration values and the
//! error type shared by every other crate in the workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod id;
pub mod vehicle;

pub use config::{
    DomainConfig, OcclusionZone, PdeParams, RiskConfig, RoadGeometry, SourceParams,
    VehicleDimensions,
};
pub use error::{Result, RiskError};
pub use id::{TickId, VehicleId};
pub use vehicle::{VehicleClass, VehicleObservation};

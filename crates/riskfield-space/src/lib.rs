//! Spatial types for riskfield simulations.
//!
//! - [`Grid`]: immutable world-frame lattice with precomputed coordinate
//!   arrays and nearest-cell lookup.
//! - [`Rect`] and [`Segment`]: axis-aligned zone primitives used to
//!   rasterise merge and occlusion geometry, with distance queries and
//!   soft-edged indicators.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod grid;
pub mod zone;

pub use grid::Grid;
pub use zone::{cosine_falloff, soft_interval, Rect, Segment};

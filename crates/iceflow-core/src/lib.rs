//! Boundary-forcing pipeline of an ice-sheet simulator: composable chains
//! of climate/ocean/interface components, buffered time-dependent forcing,
//! restartable model state, and the geometry/mask classification.

pub mod common;
pub mod coupler;
pub mod dataset;
pub mod domain;
pub mod forcing;
pub mod geometry;
pub mod grid;

//! Default physical constants and forcing parameters. All of these are
//! overridable through the run configuration.

/// Ice density, kg m-3.
pub const DEFAULT_ICE_DENSITY: f64 = 910.0;

/// Sea water density, kg m-3.
pub const DEFAULT_SEA_WATER_DENSITY: f64 = 1028.0;

/// Columns thinner than this are treated as ice-free, m.
pub const DEFAULT_ICE_FREE_THICKNESS: f64 = 0.01;

/// Gridded forcing records kept resident per variable.
pub const DEFAULT_FORCING_BUFFER_SIZE: usize = 60;

/// Interpolation samples per simulated year when averaging forcing.
pub const DEFAULT_EVALUATIONS_PER_YEAR: usize = 52;

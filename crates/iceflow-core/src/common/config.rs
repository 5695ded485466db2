//! Run configuration: physical constants, forcing buffer parameters, and
//! per-family chain selection with the options each component reads.

use super::constants::{
    DEFAULT_EVALUATIONS_PER_YEAR, DEFAULT_FORCING_BUFFER_SIZE, DEFAULT_ICE_DENSITY,
    DEFAULT_ICE_FREE_THICKNESS, DEFAULT_SEA_WATER_DENSITY,
};
use crate::domain::{CoreResult, IceflowError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub constants: ConstantsConfig,
    pub forcing: ForcingConfig,
    pub interface: InterfaceConfig,
    pub ocean: OceanConfig,
    pub surface: SurfaceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstantsConfig {
    pub ice_density: f64,
    pub sea_water_density: f64,
    pub ice_free_thickness: f64,
}

impl Default for ConstantsConfig {
    fn default() -> Self {
        Self {
            ice_density: DEFAULT_ICE_DENSITY,
            sea_water_density: DEFAULT_SEA_WATER_DENSITY,
            ice_free_thickness: DEFAULT_ICE_FREE_THICKNESS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForcingConfig {
    pub buffer_size: usize,
    pub evaluations_per_year: usize,
}

impl Default for ForcingConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_FORCING_BUFFER_SIZE,
            evaluations_per_year: DEFAULT_EVALUATIONS_PER_YEAR,
        }
    }
}

/// Dataset-backed forcing source: file plus an optional period (years;
/// zero means aperiodic) with its reference time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForcingSourceOptions {
    pub file: PathBuf,
    pub period: f64,
    pub reference_year: f64,
}

impl Default for ForcingSourceOptions {
    fn default() -> Self {
        Self {
            file: PathBuf::new(),
            period: 0.0,
            reference_year: 0.0,
        }
    }
}

/// Scalar-offset forcing source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffsetOptions {
    pub file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceConfig {
    /// Chain selection: model name followed by modifier names.
    pub models: String,
    pub given: Option<ForcingSourceOptions>,
    pub delta: Option<OffsetOptions>,
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            models: "given".to_string(),
            given: None,
            delta: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OceanConfig {
    pub models: String,
    pub constant_sea_level: f64,
    pub delta_sl: Option<OffsetOptions>,
}

impl Default for OceanConfig {
    fn default() -> Self {
        Self {
            models: "constant".to_string(),
            constant_sea_level: 0.0,
            delta_sl: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub models: String,
    pub given: Option<ForcingSourceOptions>,
    pub anomaly: Option<ForcingSourceOptions>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            models: "given".to_string(),
            given: None,
            anomaly: None,
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|error| {
            IceflowError::io_system(format!("cannot read '{}': {error}", path.display()))
        })?;
        serde_json::from_str(&contents).map_err(|error| {
            IceflowError::configuration(format!("'{}': {error}", path.display()))
        })
    }

    pub fn interface_given(&self) -> CoreResult<&ForcingSourceOptions> {
        self.interface
            .given
            .as_ref()
            .ok_or_else(|| IceflowError::configuration("interface.given.file is not set"))
    }

    pub fn interface_delta(&self) -> CoreResult<&OffsetOptions> {
        self.interface
            .delta
            .as_ref()
            .ok_or_else(|| IceflowError::configuration("interface.delta.file is not set"))
    }

    pub fn ocean_delta_sl(&self) -> CoreResult<&OffsetOptions> {
        self.ocean
            .delta_sl
            .as_ref()
            .ok_or_else(|| IceflowError::configuration("ocean.delta_sl.file is not set"))
    }

    pub fn surface_given(&self) -> CoreResult<&ForcingSourceOptions> {
        self.surface
            .given
            .as_ref()
            .ok_or_else(|| IceflowError::configuration("surface.given.file is not set"))
    }

    pub fn surface_anomaly(&self) -> CoreResult<&ForcingSourceOptions> {
        self.surface
            .anomaly
            .as_ref()
            .ok_or_else(|| IceflowError::configuration("surface.anomaly.file is not set"))
    }
}

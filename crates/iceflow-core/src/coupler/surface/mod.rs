//! Surface models and modifiers: provide the climatic mass balance and ice
//! surface temperature pair to the dynamics core.

mod anomaly;
mod given;

pub use anomaly::Anomaly;
pub use given::Given;

use super::diagnostics::{Diagnostic, DiagnosticList, FieldDiagnosticList, TsDiagnosticList};
use super::factory::ComponentFactory;
use crate::dataset::Dataset;
use crate::domain::{CoreResult, IceflowError, MaxTimestep, RunContext};
use crate::geometry::Geometry;
use crate::grid::{Field2, FieldMetadata, Grid};

pub const MASS_FLUX_VARIABLE: &str = "climatic_mass_balance";
pub const TEMPERATURE_VARIABLE: &str = "ice_surface_temp";

pub fn mass_flux_metadata() -> FieldMetadata {
    FieldMetadata::new(MASS_FLUX_VARIABLE, "kg m-2 year-1")
        .with_long_name("surface mass balance (accumulation/ablation) rate")
}

pub fn temperature_metadata() -> FieldMetadata {
    FieldMetadata::new(TEMPERATURE_VARIABLE, "K")
        .with_long_name("ice temperature at the top ice surface")
        .with_valid_range(0.0, 373.15)
}

pub(crate) fn allocate_mass_flux(grid: &Grid) -> Field2 {
    Field2::new(grid, mass_flux_metadata())
}

pub(crate) fn allocate_temperature(grid: &Grid) -> Field2 {
    Field2::new(grid, temperature_metadata())
}

/// One stage of the surface forcing chain; same pass-through contract as
/// the interface family, with two gridded outputs.
pub trait SurfaceModel {
    fn input(&self) -> Option<&dyn SurfaceModel>;

    fn input_mut(&mut self) -> Option<&mut dyn SurfaceModel>;

    fn init(&mut self, ctx: &RunContext, geometry: &Geometry) -> CoreResult<()> {
        match self.input_mut() {
            Some(input) => input.init(ctx, geometry),
            None => Ok(()),
        }
    }

    fn update(&mut self, geometry: &Geometry, t: f64, dt: f64) -> CoreResult<()> {
        match self.input_mut() {
            Some(input) => input.update(geometry, t, dt),
            None => Err(IceflowError::missing_input("update")),
        }
    }

    fn max_timestep(&self, t: f64) -> MaxTimestep {
        match self.input() {
            Some(input) => input.max_timestep(t),
            None => MaxTimestep::unlimited(),
        }
    }

    fn mass_flux(&self) -> CoreResult<&Field2> {
        match self.input() {
            Some(input) => input.mass_flux(),
            None => Err(IceflowError::missing_input("mass_flux")),
        }
    }

    fn temperature(&self) -> CoreResult<&Field2> {
        match self.input() {
            Some(input) => input.temperature(),
            None => Err(IceflowError::missing_input("temperature")),
        }
    }

    fn define_model_state(&self, output: &mut dyn Dataset) -> CoreResult<()> {
        match self.input() {
            Some(input) => input.define_model_state(output),
            None => Ok(()),
        }
    }

    fn write_model_state(&self, time: f64, output: &mut dyn Dataset) -> CoreResult<()> {
        match self.input() {
            Some(input) => input.write_model_state(time, output),
            None => Ok(()),
        }
    }

    fn diagnostics(&self) -> FieldDiagnosticList<'_> {
        let own = self.own_diagnostics();
        match self.input() {
            Some(input) => DiagnosticList::combine(input.diagnostics(), own),
            None => own,
        }
    }

    /// Every surface component reports both output fields; the merge keeps
    /// the outermost of each.
    fn own_diagnostics(&self) -> FieldDiagnosticList<'_> {
        let mut list = FieldDiagnosticList::new();
        list.push(
            MASS_FLUX_VARIABLE,
            Diagnostic::new(mass_flux_metadata(), move || self.mass_flux().cloned()),
        );
        list.push(
            TEMPERATURE_VARIABLE,
            Diagnostic::new(temperature_metadata(), move || self.temperature().cloned()),
        );
        list
    }

    fn ts_diagnostics(&self) -> TsDiagnosticList<'_> {
        let own = self.own_ts_diagnostics();
        match self.input() {
            Some(input) => DiagnosticList::combine(input.ts_diagnostics(), own),
            None => own,
        }
    }

    fn own_ts_diagnostics(&self) -> TsDiagnosticList<'_> {
        TsDiagnosticList::new()
    }
}

pub fn factory() -> ComponentFactory<dyn SurfaceModel> {
    let mut factory = ComponentFactory::<dyn SurfaceModel>::new("surface");
    factory.add_model("given", |grid, config| {
        Ok(Box::new(Given::new(grid, config)?))
    });
    factory.set_default("given");
    factory.add_modifier("anomaly", |grid, config, input| {
        Ok(Box::new(Anomaly::new(grid, config, input)?))
    });
    factory
}

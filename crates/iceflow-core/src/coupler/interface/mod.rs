//! Ice/bed interface models and modifiers: provide the till effective
//! fraction overburden ("delta") field to the basal strength code.
//!
//! Terminal models compute delta themselves; modifiers wrap exactly one
//! inner component and override a subset of operations, inheriting
//! pass-through behavior for the rest. The chain is an owning tree: outer
//! components own their inner component and aggregation always recurses
//! inward from the outermost one.

mod delta;
mod given;
mod initialization;

pub use delta::DeltaOffset;
pub use given::Given;
pub use initialization::{InitializationHelper, STATE_VARIABLE};

use super::diagnostics::{Diagnostic, DiagnosticList, FieldDiagnosticList, TsDiagnosticList};
use super::factory::ComponentFactory;
use crate::dataset::Dataset;
use crate::domain::{CoreResult, IceflowError, MaxTimestep, RunContext};
use crate::geometry::Geometry;
use crate::grid::{Field2, FieldMetadata, Grid};

pub const DELTA_VARIABLE: &str = "interface_delta";

pub fn delta_metadata() -> FieldMetadata {
    FieldMetadata::new(DELTA_VARIABLE, "1")
        .with_long_name("till effective fraction overburden at the ice/bed interface")
        .with_valid_range(0.0, 1.0)
}

pub(crate) fn allocate_delta(grid: &Grid) -> Field2 {
    Field2::new(grid, delta_metadata())
}

/// One stage of the interface forcing chain.
///
/// Every provided method implements the pass-through behavior for
/// modifiers: delegate to the input component when present, otherwise
/// perform the terminal default (fail for operations a terminal component
/// must implement itself, succeed trivially for state persistence).
pub trait InterfaceModel {
    fn input(&self) -> Option<&dyn InterfaceModel>;

    fn input_mut(&mut self) -> Option<&mut dyn InterfaceModel>;

    fn init(&mut self, ctx: &RunContext, geometry: &Geometry) -> CoreResult<()> {
        match self.input_mut() {
            Some(input) => input.init(ctx, geometry),
            None => Ok(()),
        }
    }

    /// Sets the component's state to represent `[t, t + dt]`. Calls need
    /// not be monotonic in `t`, and `update(t, 0)` must behave as "compute
    /// the value at instant t".
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

    /// The component's current authoritative delta field.
    fn delta(&self) -> CoreResult<&Field2> {
        match self.input() {
            Some(input) => input.delta(),
            None => Err(IceflowError::missing_input("delta")),
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

    /// Diagnostics introduced at this stage. Every interface component
    /// reports its current delta; the merge keeps the outermost one.
    fn own_diagnostics(&self) -> FieldDiagnosticList<'_> {
        let mut list = FieldDiagnosticList::new();
        list.push(
            DELTA_VARIABLE,
            Diagnostic::new(delta_metadata(), move || self.delta().cloned()),
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

pub fn factory() -> ComponentFactory<dyn InterfaceModel> {
    let mut factory = ComponentFactory::<dyn InterfaceModel>::new("interface");
    factory.add_model("given", |grid, config| {
        Ok(Box::new(Given::new(grid, config)?))
    });
    factory.set_default("given");
    factory.add_modifier("delta", |_grid, config, input| {
        Ok(Box::new(DeltaOffset::new(config, input)?))
    });
    factory
}

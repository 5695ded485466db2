//! Ocean models and modifiers: provide the sea level elevation consumed by
//! the geometry classification and the dynamics core.

use super::diagnostics::{Diagnostic, DiagnosticList, FieldDiagnosticList, TsDiagnosticList};
use super::factory::ComponentFactory;
use crate::common::config::Config;
use crate::dataset::Dataset;
use crate::domain::{CoreResult, IceflowError, MaxTimestep, RunContext};
use crate::forcing::ScalarForcing;
use crate::geometry::Geometry;
use crate::grid::FieldMetadata;
use tracing::info;

pub const SEA_LEVEL_DIAGNOSTIC: &str = "sea_level";

fn sea_level_metadata() -> FieldMetadata {
    FieldMetadata::new(SEA_LEVEL_DIAGNOSTIC, "m").with_long_name("sea level elevation")
}

/// One stage of the ocean forcing chain. Same pass-through contract as the
/// interface family, with a scalar output instead of a gridded one.
pub trait OceanModel {
    fn input(&self) -> Option<&dyn OceanModel>;

    fn input_mut(&mut self) -> Option<&mut dyn OceanModel>;

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

    fn sea_level_elevation(&self) -> CoreResult<f64> {
        match self.input() {
            Some(input) => input.sea_level_elevation(),
            None => Err(IceflowError::missing_input("sea_level_elevation")),
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

    fn own_diagnostics(&self) -> FieldDiagnosticList<'_> {
        FieldDiagnosticList::new()
    }

    fn ts_diagnostics(&self) -> TsDiagnosticList<'_> {
        let own = self.own_ts_diagnostics();
        match self.input() {
            Some(input) => DiagnosticList::combine(input.ts_diagnostics(), own),
            None => own,
        }
    }

    /// Every ocean component reports its current sea level; the merge
    /// keeps the outermost one.
    fn own_ts_diagnostics(&self) -> TsDiagnosticList<'_> {
        let mut list = TsDiagnosticList::new();
        list.push(
            SEA_LEVEL_DIAGNOSTIC,
            Diagnostic::new(sea_level_metadata(), move || self.sea_level_elevation()),
        );
        list
    }
}

/// Terminal ocean model holding a constant sea level from the run
/// configuration.
pub struct Constant {
    sea_level: f64,
}

impl Constant {
    pub fn new(config: &Config) -> Self {
        Self {
            sea_level: config.ocean.constant_sea_level,
        }
    }
}

impl OceanModel for Constant {
    fn input(&self) -> Option<&dyn OceanModel> {
        None
    }

    fn input_mut(&mut self) -> Option<&mut dyn OceanModel> {
        None
    }

    fn init(&mut self, _ctx: &RunContext, _geometry: &Geometry) -> CoreResult<()> {
        info!(sea_level = self.sea_level, "initializing the constant ocean model");
        Ok(())
    }

    fn update(&mut self, _geometry: &Geometry, _t: f64, _dt: f64) -> CoreResult<()> {
        Ok(())
    }

    fn sea_level_elevation(&self) -> CoreResult<f64> {
        Ok(self.sea_level)
    }
}

/// Scalar-offset modifier shifting the input's sea level by an
/// interpolated offset series.
pub struct DeltaSl {
    input: Box<dyn OceanModel>,
    forcing: ScalarForcing,
}

impl DeltaSl {
    pub fn new(config: &Config, input: Box<dyn OceanModel>) -> CoreResult<Self> {
        let options = config.ocean_delta_sl()?;
        let forcing =
            ScalarForcing::from_file(&options.file, "delta_sl", "m", "sea level elevation offsets");
        Ok(Self::with_forcing(forcing, input))
    }

    pub fn with_forcing(forcing: ScalarForcing, input: Box<dyn OceanModel>) -> Self {
        Self { input, forcing }
    }
}

impl OceanModel for DeltaSl {
    fn input(&self) -> Option<&dyn OceanModel> {
        Some(self.input.as_ref())
    }

    fn input_mut(&mut self) -> Option<&mut dyn OceanModel> {
        Some(self.input.as_mut())
    }

    fn init(&mut self, ctx: &RunContext, geometry: &Geometry) -> CoreResult<()> {
        self.input.init(ctx, geometry)?;

        info!("initializing sea level forcing");

        self.forcing.init()
    }

    fn update(&mut self, geometry: &Geometry, t: f64, dt: f64) -> CoreResult<()> {
        self.input.update(geometry, t, dt)?;
        self.forcing.update(t, dt)
    }

    fn sea_level_elevation(&self) -> CoreResult<f64> {
        Ok(self.input.sea_level_elevation()? + self.forcing.value())
    }
}

pub fn factory() -> ComponentFactory<dyn OceanModel> {
    let mut factory = ComponentFactory::<dyn OceanModel>::new("ocean");
    factory.add_model("constant", |_grid, config| Ok(Box::new(Constant::new(config))));
    factory.set_default("constant");
    factory.add_modifier("delta_sl", |_grid, config, input| {
        Ok(Box::new(DeltaSl::new(config, input)?))
    });
    factory
}

#[cfg(test)]
mod tests {
    use super::{Constant, DeltaSl, OceanModel, SEA_LEVEL_DIAGNOSTIC};
    use crate::common::config::Config;
    use crate::domain::RunContext;
    use crate::forcing::ScalarForcing;
    use crate::geometry::Geometry;
    use crate::grid::Grid;

    fn geometry() -> Geometry {
        Geometry::new(&Grid::new(2, 2).expect("grid extents should be accepted"))
    }

    fn constant_at(sea_level: f64) -> Constant {
        let mut config = Config::default();
        config.ocean.constant_sea_level = sea_level;
        Constant::new(&config)
    }

    fn offsets(values: &[(f64, f64)]) -> ScalarForcing {
        let (times, samples): (Vec<f64>, Vec<f64>) = values.iter().copied().unzip();
        ScalarForcing::from_series("delta_sl", "m", "sea level elevation offsets", times, samples)
            .expect("series should validate")
    }

    #[test]
    fn constant_model_reports_the_configured_sea_level() {
        let geometry = geometry();
        let mut model = constant_at(-2.5);
        model
            .init(&RunContext::bootstrap(0.0), &geometry)
            .expect("init should succeed");
        model
            .update(&geometry, 0.0, 1.0)
            .expect("update should succeed");

        assert_eq!(
            model
                .sea_level_elevation()
                .expect("sea level should be available"),
            -2.5
        );
        assert!(!model.max_timestep(0.0).is_limited());
    }

    #[test]
    fn delta_sl_offsets_the_inner_sea_level() {
        let geometry = geometry();
        let mut chain = DeltaSl::with_forcing(
            offsets(&[(0.0, -120.0), (20.0, 0.0)]),
            Box::new(constant_at(0.0)),
        );
        chain
            .init(&RunContext::bootstrap(0.0), &geometry)
            .expect("init should succeed");

        chain
            .update(&geometry, 0.0, 0.0)
            .expect("update should succeed");
        assert_eq!(
            chain
                .sea_level_elevation()
                .expect("sea level should be available"),
            -120.0
        );

        chain
            .update(&geometry, 10.0, 0.0)
            .expect("update should succeed");
        assert_eq!(
            chain
                .sea_level_elevation()
                .expect("sea level should be available"),
            -60.0
        );
    }

    #[test]
    fn the_outermost_sea_level_diagnostic_shadows_the_inner_one() {
        let geometry = geometry();
        let mut chain = DeltaSl::with_forcing(offsets(&[(0.0, -50.0)]), Box::new(constant_at(10.0)));
        chain
            .init(&RunContext::bootstrap(0.0), &geometry)
            .expect("init should succeed");
        chain
            .update(&geometry, 0.0, 0.0)
            .expect("update should succeed");

        let diagnostics = chain.ts_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        let value = diagnostics
            .get(SEA_LEVEL_DIAGNOSTIC)
            .expect("sea level diagnostic should exist")
            .compute()
            .expect("diagnostic should compute");
        assert_eq!(value, -40.0);
    }
}

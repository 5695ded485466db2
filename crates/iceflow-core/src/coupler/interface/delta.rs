use super::{allocate_delta, InterfaceModel};
use crate::common::config::Config;
use crate::domain::{CoreResult, RunContext};
use crate::forcing::ScalarForcing;
use crate::geometry::Geometry;
use crate::grid::{Field2, Grid};
use tracing::info;

/// Scalar-offset modifier: shifts the input's delta field uniformly by an
/// interpolated offset series.
pub struct DeltaOffset {
    input: Box<dyn InterfaceModel>,
    forcing: ScalarForcing,
    delta: Field2,
}

impl DeltaOffset {
    pub fn new(config: &Config, input: Box<dyn InterfaceModel>) -> CoreResult<Self> {
        let options = config.interface_delta()?;
        let forcing = ScalarForcing::from_file(
            &options.file,
            "delta",
            "1",
            "till effective fraction overburden offsets",
        );
        Ok(Self::with_forcing(grid_of(input.as_ref())?, forcing, input))
    }

    /// Assembly from parts, used by `new` and by tests that supply the
    /// series directly.
    pub fn with_forcing(grid: Grid, forcing: ScalarForcing, input: Box<dyn InterfaceModel>) -> Self {
        Self {
            input,
            forcing,
            delta: allocate_delta(&grid),
        }
    }
}

fn grid_of(input: &dyn InterfaceModel) -> CoreResult<Grid> {
    let delta = input.delta()?;
    Grid::new(delta.mx(), delta.my())
}

impl InterfaceModel for DeltaOffset {
    fn input(&self) -> Option<&dyn InterfaceModel> {
        Some(self.input.as_ref())
    }

    fn input_mut(&mut self) -> Option<&mut dyn InterfaceModel> {
        Some(self.input.as_mut())
    }

    fn init(&mut self, ctx: &RunContext, geometry: &Geometry) -> CoreResult<()> {
        self.input.init(ctx, geometry)?;

        info!("initializing scalar interface forcing");

        self.forcing.init()
    }

    fn update(&mut self, geometry: &Geometry, t: f64, dt: f64) -> CoreResult<()> {
        self.input.update(geometry, t, dt)?;
        self.forcing.update(t, dt)?;

        self.delta.copy_from(self.input.delta()?)?;
        self.delta.shift(self.forcing.value());
        Ok(())
    }

    fn delta(&self) -> CoreResult<&Field2> {
        Ok(&self.delta)
    }
}

use super::{allocate_mass_flux, allocate_temperature, SurfaceModel};
use crate::common::config::Config;
use crate::dataset::{Dataset, JsonDataset};
use crate::domain::{CoreResult, MaxTimestep, RunContext};
use crate::forcing::ForcingField;
use crate::geometry::Geometry;
use crate::grid::{Field2, FieldMetadata, Grid};
use tracing::info;

pub const MASS_FLUX_ANOMALY_VARIABLE: &str = "climatic_mass_balance_anomaly";
pub const TEMPERATURE_ANOMALY_VARIABLE: &str = "ice_surface_temp_anomaly";

/// Gridded-offset modifier adding mass balance and temperature anomalies
/// read from a file onto the input's fields.
pub struct Anomaly {
    input: Box<dyn SurfaceModel>,
    mass_flux_anomaly: ForcingField,
    temperature_anomaly: ForcingField,
    mass_flux: Field2,
    temperature: Field2,
}

impl Anomaly {
    pub fn new(grid: &Grid, config: &Config, input: Box<dyn SurfaceModel>) -> CoreResult<Self> {
        let options = config.surface_anomaly()?;
        let mass_flux_dataset = JsonDataset::open(&options.file)?;
        let temperature_dataset = JsonDataset::open(&options.file)?;
        Self::from_datasets(
            grid,
            config,
            Box::new(mass_flux_dataset),
            Box::new(temperature_dataset),
            options.period,
            options.reference_year,
            input,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_datasets(
        grid: &Grid,
        config: &Config,
        mass_flux_dataset: Box<dyn Dataset>,
        temperature_dataset: Box<dyn Dataset>,
        period: f64,
        reference_time: f64,
        input: Box<dyn SurfaceModel>,
    ) -> CoreResult<Self> {
        // anomalies are signed, so neither inherits its base field's range
        let mass_flux_anomaly = ForcingField::new(
            grid,
            mass_flux_dataset,
            FieldMetadata::new(MASS_FLUX_ANOMALY_VARIABLE, "kg m-2 year-1")
                .with_long_name("anomaly of the surface mass balance rate"),
            config.forcing.buffer_size,
            config.forcing.evaluations_per_year,
            period,
            reference_time,
        )?;
        let temperature_anomaly = ForcingField::new(
            grid,
            temperature_dataset,
            FieldMetadata::new(TEMPERATURE_ANOMALY_VARIABLE, "K")
                .with_long_name("anomaly of the ice surface temperature"),
            config.forcing.buffer_size,
            config.forcing.evaluations_per_year,
            period,
            reference_time,
        )?;
        Ok(Self {
            input,
            mass_flux_anomaly,
            temperature_anomaly,
            mass_flux: allocate_mass_flux(grid),
            temperature: allocate_temperature(grid),
        })
    }
}

impl SurfaceModel for Anomaly {
    fn input(&self) -> Option<&dyn SurfaceModel> {
        Some(self.input.as_ref())
    }

    fn input_mut(&mut self) -> Option<&mut dyn SurfaceModel> {
        Some(self.input.as_mut())
    }

    fn init(&mut self, ctx: &RunContext, geometry: &Geometry) -> CoreResult<()> {
        self.input.init(ctx, geometry)?;

        info!("initializing surface mass balance and temperature anomalies");

        self.mass_flux_anomaly.init()?;
        self.temperature_anomaly.init()
    }

    fn update(&mut self, geometry: &Geometry, t: f64, dt: f64) -> CoreResult<()> {
        self.input.update(geometry, t, dt)?;

        self.mass_flux_anomaly.update(t, dt)?;
        self.mass_flux_anomaly.average(t, dt)?;
        self.temperature_anomaly.update(t, dt)?;
        self.temperature_anomaly.average(t, dt)?;

        self.mass_flux.copy_from(self.input.mass_flux()?)?;
        self.mass_flux.add(self.mass_flux_anomaly.current())?;
        self.temperature.copy_from(self.input.temperature()?)?;
        self.temperature.add(self.temperature_anomaly.current())
    }

    fn max_timestep(&self, t: f64) -> MaxTimestep {
        self.input
            .max_timestep(t)
            .min(self.mass_flux_anomaly.max_timestep(t))
            .min(self.temperature_anomaly.max_timestep(t))
    }

    fn mass_flux(&self) -> CoreResult<&Field2> {
        Ok(&self.mass_flux)
    }

    fn temperature(&self) -> CoreResult<&Field2> {
        Ok(&self.temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::{Anomaly, MASS_FLUX_ANOMALY_VARIABLE, TEMPERATURE_ANOMALY_VARIABLE};
    use crate::common::config::Config;
    use crate::coupler::surface::testing::UniformSurface;
    use crate::coupler::surface::{mass_flux_metadata, temperature_metadata, SurfaceModel};
    use crate::dataset::{Dataset, MemoryDataset};
    use crate::domain::RunContext;
    use crate::geometry::Geometry;
    use crate::grid::Grid;

    fn grid() -> Grid {
        Grid::new(2, 2).expect("grid extents should be accepted")
    }

    fn anomaly_dataset(records: &[(f64, f64, f64)]) -> MemoryDataset {
        let mut dataset = MemoryDataset::new("anomalies");
        dataset
            .define_variable(
                &mass_flux_metadata().with_name(MASS_FLUX_ANOMALY_VARIABLE),
                (2, 2),
            )
            .expect("define should succeed");
        dataset
            .define_variable(
                &temperature_metadata()
                    .with_name(TEMPERATURE_ANOMALY_VARIABLE)
                    .with_valid_range(-50.0, 50.0),
                (2, 2),
            )
            .expect("define should succeed");
        for &(time, mass_flux, temperature) in records {
            dataset
                .append_record(MASS_FLUX_ANOMALY_VARIABLE, time, &[mass_flux; 4])
                .expect("append should succeed");
            dataset
                .append_record(TEMPERATURE_ANOMALY_VARIABLE, time, &[temperature; 4])
                .expect("append should succeed");
        }
        dataset
    }

    #[test]
    fn anomalies_are_added_onto_the_inner_fields() {
        let grid = grid();
        let geometry = Geometry::new(&grid);
        let records = [(0.0, 0.5, 2.0)];
        let mut modifier = Anomaly::from_datasets(
            &grid,
            &Config::default(),
            Box::new(anomaly_dataset(&records)),
            Box::new(anomaly_dataset(&records)),
            0.0,
            0.0,
            Box::new(UniformSurface::new(&grid, 1.0, 260.0)),
        )
        .expect("construction should succeed");

        modifier
            .init(&RunContext::bootstrap(0.0), &geometry)
            .expect("init should succeed");
        modifier
            .update(&geometry, 0.0, 0.0)
            .expect("update should succeed");

        let mass_flux = modifier.mass_flux().expect("mass flux should exist");
        assert!(mass_flux.values().iter().all(|&v| (v - 1.5).abs() < 1e-12));

        let temperature = modifier.temperature().expect("temperature should exist");
        assert!(temperature.values().iter().all(|&v| (v - 262.0).abs() < 1e-12));

        // the inner model's fields stay unmodified
        let inner = modifier.input().expect("modifier should wrap an input");
        assert!(inner
            .mass_flux()
            .expect("inner mass flux should exist")
            .values()
            .iter()
            .all(|&v| v == 1.0));
    }
}

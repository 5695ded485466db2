use super::{mass_flux_metadata, temperature_metadata, SurfaceModel};
use crate::common::config::Config;
use crate::dataset::{Dataset, JsonDataset};
use crate::domain::{CoreResult, MaxTimestep, RunContext};
use crate::forcing::ForcingField;
use crate::geometry::Geometry;
use crate::grid::{Field2, Grid};
use tracing::info;

/// Terminal surface model reading both output fields from a forcing
/// dataset.
pub struct Given {
    mass_flux: ForcingField,
    temperature: ForcingField,
}

impl Given {
    pub fn new(grid: &Grid, config: &Config) -> CoreResult<Self> {
        let options = config.surface_given()?;
        let mass_flux_dataset = JsonDataset::open(&options.file)?;
        let temperature_dataset = JsonDataset::open(&options.file)?;
        Self::from_datasets(
            grid,
            config,
            Box::new(mass_flux_dataset),
            Box::new(temperature_dataset),
            options.period,
            options.reference_year,
        )
    }

    pub fn from_datasets(
        grid: &Grid,
        config: &Config,
        mass_flux_dataset: Box<dyn Dataset>,
        temperature_dataset: Box<dyn Dataset>,
        period: f64,
        reference_time: f64,
    ) -> CoreResult<Self> {
        let mass_flux = ForcingField::new(
            grid,
            mass_flux_dataset,
            mass_flux_metadata(),
            config.forcing.buffer_size,
            config.forcing.evaluations_per_year,
            period,
            reference_time,
        )?;
        let temperature = ForcingField::new(
            grid,
            temperature_dataset,
            temperature_metadata(),
            config.forcing.buffer_size,
            config.forcing.evaluations_per_year,
            period,
            reference_time,
        )?;
        Ok(Self {
            mass_flux,
            temperature,
        })
    }
}

impl SurfaceModel for Given {
    fn input(&self) -> Option<&dyn SurfaceModel> {
        None
    }

    fn input_mut(&mut self) -> Option<&mut dyn SurfaceModel> {
        None
    }

    fn init(&mut self, ctx: &RunContext, geometry: &Geometry) -> CoreResult<()> {
        info!("initializing the surface model reading mass balance and temperature from a file");

        self.mass_flux.init()?;
        self.temperature.init()?;

        // time-independent data is read right away
        if self.mass_flux.n_records() == 1 && self.temperature.n_records() == 1 {
            self.update(geometry, ctx.start_time, 0.0)?;
        }
        Ok(())
    }

    fn update(&mut self, _geometry: &Geometry, t: f64, dt: f64) -> CoreResult<()> {
        self.mass_flux.update(t, dt)?;
        self.mass_flux.average(t, dt)?;
        self.temperature.update(t, dt)?;
        self.temperature.average(t, dt)
    }

    fn max_timestep(&self, t: f64) -> MaxTimestep {
        self.mass_flux
            .max_timestep(t)
            .min(self.temperature.max_timestep(t))
    }

    fn mass_flux(&self) -> CoreResult<&Field2> {
        Ok(self.mass_flux.current())
    }

    fn temperature(&self) -> CoreResult<&Field2> {
        Ok(self.temperature.current())
    }

    fn define_model_state(&self, output: &mut dyn Dataset) -> CoreResult<()> {
        for current in [self.mass_flux.current(), self.temperature.current()] {
            output.define_variable(current.metadata(), (current.mx(), current.my()))?;
        }
        Ok(())
    }

    fn write_model_state(&self, time: f64, output: &mut dyn Dataset) -> CoreResult<()> {
        for current in [self.mass_flux.current(), self.temperature.current()] {
            output.define_variable(current.metadata(), (current.mx(), current.my()))?;
            output.append_record(&current.metadata().name, time, current.values())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Given;
    use crate::common::config::Config;
    use crate::coupler::surface::{
        mass_flux_metadata, temperature_metadata, SurfaceModel, MASS_FLUX_VARIABLE,
        TEMPERATURE_VARIABLE,
    };
    use crate::dataset::{Dataset, MemoryDataset};
    use crate::domain::RunContext;
    use crate::geometry::Geometry;
    use crate::grid::Grid;

    fn grid() -> Grid {
        Grid::new(2, 2).expect("grid extents should be accepted")
    }

    fn forcing_dataset(records: &[(f64, f64, f64)]) -> MemoryDataset {
        let mut dataset = MemoryDataset::new("surface-forcing");
        dataset
            .define_variable(&mass_flux_metadata(), (2, 2))
            .expect("define should succeed");
        dataset
            .define_variable(&temperature_metadata(), (2, 2))
            .expect("define should succeed");
        for &(time, mass_flux, temperature) in records {
            dataset
                .append_record(MASS_FLUX_VARIABLE, time, &[mass_flux; 4])
                .expect("append should succeed");
            dataset
                .append_record(TEMPERATURE_VARIABLE, time, &[temperature; 4])
                .expect("append should succeed");
        }
        dataset
    }

    fn given_over(records: &[(f64, f64, f64)]) -> Given {
        Given::from_datasets(
            &grid(),
            &Config::default(),
            Box::new(forcing_dataset(records)),
            Box::new(forcing_dataset(records)),
            0.0,
            0.0,
        )
        .expect("construction should succeed")
    }

    #[test]
    fn single_record_data_is_available_right_after_init() {
        let grid = grid();
        let geometry = Geometry::new(&grid);
        let mut model = given_over(&[(0.0, 2.0, 255.0)]);

        model
            .init(&RunContext::bootstrap(0.0), &geometry)
            .expect("init should succeed");

        let mass_flux = model.mass_flux().expect("mass flux should be populated");
        assert!(mass_flux.values().iter().all(|&v| v == 2.0));
        let temperature = model.temperature().expect("temperature should be populated");
        assert!(temperature.values().iter().all(|&v| v == 255.0));
    }

    #[test]
    fn updates_track_the_forcing_in_time() {
        let grid = grid();
        let geometry = Geometry::new(&grid);
        let mut model = given_over(&[(0.0, 0.0, 250.0), (10.0, 4.0, 270.0)]);
        model
            .init(&RunContext::bootstrap(0.0), &geometry)
            .expect("init should succeed");

        model
            .update(&geometry, 5.0, 0.0)
            .expect("update should succeed");
        let mass_flux = model.mass_flux().expect("mass flux should exist");
        assert!(mass_flux.values().iter().all(|&v| (v - 2.0).abs() < 1e-12));
        let temperature = model.temperature().expect("temperature should exist");
        assert!(temperature.values().iter().all(|&v| (v - 260.0).abs() < 1e-12));
    }
}

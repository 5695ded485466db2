use super::{delta_metadata, InterfaceModel};
use crate::common::config::Config;
use crate::dataset::{Dataset, JsonDataset};
use crate::domain::{CoreResult, MaxTimestep, RunContext};
use crate::forcing::ForcingField;
use crate::geometry::Geometry;
use crate::grid::{Field2, Grid};
use tracing::info;

/// Terminal interface model reading delta from a forcing dataset.
pub struct Given {
    delta: ForcingField,
}

impl Given {
    pub fn new(grid: &Grid, config: &Config) -> CoreResult<Self> {
        let options = config.interface_given()?;
        let dataset = JsonDataset::open(&options.file)?;
        Self::from_dataset(
            grid,
            config,
            Box::new(dataset),
            options.period,
            options.reference_year,
        )
    }

    /// Construction over an already-open dataset; the file-backed `new` and
    /// the tests both funnel through here.
    pub fn from_dataset(
        grid: &Grid,
        config: &Config,
        dataset: Box<dyn Dataset>,
        period: f64,
        reference_time: f64,
    ) -> CoreResult<Self> {
        let delta = ForcingField::new(
            grid,
            dataset,
            delta_metadata(),
            config.forcing.buffer_size,
            config.forcing.evaluations_per_year,
            period,
            reference_time,
        )?;
        Ok(Self { delta })
    }
}

impl InterfaceModel for Given {
    fn input(&self) -> Option<&dyn InterfaceModel> {
        None
    }

    fn input_mut(&mut self) -> Option<&mut dyn InterfaceModel> {
        None
    }

    fn init(&mut self, ctx: &RunContext, geometry: &Geometry) -> CoreResult<()> {
        info!("initializing the interface model reading delta at the ice/bed interface from a file");

        self.delta.init()?;

        // time-independent data is read right away
        if self.delta.n_records() == 1 {
            self.update(geometry, ctx.start_time, 0.0)?;
        }
        Ok(())
    }

    fn update(&mut self, _geometry: &Geometry, t: f64, dt: f64) -> CoreResult<()> {
        self.delta.update(t, dt)?;
        self.delta.average(t, dt)
    }

    fn max_timestep(&self, t: f64) -> MaxTimestep {
        self.delta.max_timestep(t)
    }

    fn delta(&self) -> CoreResult<&Field2> {
        Ok(self.delta.current())
    }

    fn define_model_state(&self, output: &mut dyn Dataset) -> CoreResult<()> {
        let current = self.delta.current();
        output.define_variable(current.metadata(), (current.mx(), current.my()))
    }

    fn write_model_state(&self, time: f64, output: &mut dyn Dataset) -> CoreResult<()> {
        let current = self.delta.current();
        output.define_variable(current.metadata(), (current.mx(), current.my()))?;
        output.append_record(&current.metadata().name, time, current.values())
    }
}

#[cfg(test)]
mod tests {
    use super::Given;
    use crate::common::config::Config;
    use crate::coupler::interface::{delta_metadata, InterfaceModel, DELTA_VARIABLE};
    use crate::dataset::{Dataset, MemoryDataset};
    use crate::domain::RunContext;
    use crate::geometry::Geometry;
    use crate::grid::Grid;

    fn grid() -> Grid {
        Grid::new(2, 2).expect("grid extents should be accepted")
    }

    fn forcing_dataset(records: &[(f64, f64)]) -> MemoryDataset {
        let mut dataset = MemoryDataset::new("interface-forcing");
        dataset
            .define_variable(&delta_metadata(), (2, 2))
            .expect("define should succeed");
        for &(time, value) in records {
            dataset
                .append_record(DELTA_VARIABLE, time, &[value; 4])
                .expect("append should succeed");
        }
        dataset
    }

    fn given_over(records: &[(f64, f64)]) -> Given {
        Given::from_dataset(
            &grid(),
            &Config::default(),
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
        let mut model = given_over(&[(0.0, 0.5)]);

        model
            .init(&RunContext::bootstrap(0.0), &geometry)
            .expect("init should succeed");
        let delta = model.delta().expect("delta should be populated");
        assert!(delta.values().iter().all(|&v| v == 0.5));
    }

    #[test]
    fn zero_length_bootstrap_update_matches_the_interval_start() {
        let grid = grid();
        let geometry = Geometry::new(&grid);
        // piecewise-constant over [0, 10]: a single record
        let mut model = given_over(&[(0.0, 0.3)]);
        model
            .init(&RunContext::bootstrap(0.0), &geometry)
            .expect("init should succeed");

        model
            .update(&geometry, 2.0, 0.0)
            .expect("zero-length update should succeed");
        let bootstrap = model.delta().expect("delta should exist").values().to_vec();

        model
            .update(&geometry, 2.0, 5.0)
            .expect("interval update should succeed");
        let averaged = model.delta().expect("delta should exist").values().to_vec();

        for (a, b) in bootstrap.iter().zip(&averaged) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn interval_updates_average_the_forcing_records() {
        let grid = grid();
        let geometry = Geometry::new(&grid);
        let mut model = given_over(&[(0.0, 0.0), (10.0, 1.0)]);
        model
            .init(&RunContext::bootstrap(0.0), &geometry)
            .expect("init should succeed");

        // the ramp's mean over [0, 10] is 0.5
        model
            .update(&geometry, 0.0, 10.0)
            .expect("update should succeed");
        for &value in model.delta().expect("delta should exist").values() {
            assert!((value - 0.5).abs() < 1e-3, "expected ~0.5, got {value}");
        }
    }

    #[test]
    fn model_state_round_trips_through_a_dataset() {
        let grid = grid();
        let geometry = Geometry::new(&grid);
        let mut model = given_over(&[(0.0, 0.4)]);
        model
            .init(&RunContext::bootstrap(0.0), &geometry)
            .expect("init should succeed");

        let mut output = MemoryDataset::new("state");
        model
            .define_model_state(&mut output)
            .expect("define should succeed");
        model
            .write_model_state(0.0, &mut output)
            .expect("write should succeed");

        let (_, values) = output
            .read_last_record(DELTA_VARIABLE)
            .expect("state should be readable");
        assert_eq!(values, model.delta().expect("delta should exist").values());
    }
}

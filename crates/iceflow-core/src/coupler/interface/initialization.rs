use super::{allocate_delta, InterfaceModel};
use crate::dataset::{Dataset, JsonDataset};
use crate::domain::{CoreResult, InputOptions, RunContext};
use crate::geometry::Geometry;
use crate::grid::{Field2, Grid};
use tracing::info;

/// Name under which the captured delta is persisted and restarted.
pub const STATE_VARIABLE: &str = "till_effective_fraction_overburden";

/// State-capture modifier making the chain's delta available before the
/// first simulated step of a restarted run.
///
/// On restart the previously persisted field is read back from the restart
/// dataset's last time record; on a cold start a zero-length update at the
/// run start time forces the chain to produce a value, which is then
/// captured. Either way the buffer can afterwards be overwritten from an
/// explicitly named regridding dataset.
pub struct InitializationHelper {
    input: Box<dyn InterfaceModel>,
    delta: Field2,
}

impl InitializationHelper {
    pub fn new(grid: &Grid, input: Box<dyn InterfaceModel>) -> Self {
        let mut delta = allocate_delta(grid);
        delta.metadata_mut().name = STATE_VARIABLE.to_string();
        Self { input, delta }
    }
}

impl InterfaceModel for InitializationHelper {
    fn input(&self) -> Option<&dyn InterfaceModel> {
        Some(self.input.as_ref())
    }

    fn input_mut(&mut self) -> Option<&mut dyn InterfaceModel> {
        Some(self.input.as_mut())
    }

    fn init(&mut self, ctx: &RunContext, geometry: &Geometry) -> CoreResult<()> {
        self.input.init(ctx, geometry)?;

        match &ctx.input {
            InputOptions::Restart { file } => {
                info!(
                    file = %file.display(),
                    "reading till effective fraction overburden forcing for re-starting"
                );
                let dataset = JsonDataset::open(file)?;
                let (_, values) = dataset.read_last_record(STATE_VARIABLE)?;
                self.delta.set_values(&values)?;
            }
            InputOptions::Bootstrap => {
                info!(
                    "performing a fake till effective fraction overburden time-step for bootstrapping"
                );
                self.update(geometry, ctx.start_time, 0.0)?;
            }
        }

        // one-time correction from an explicitly named source, so that
        // restarting and restarting-with-regrid stay interchangeable
        if let Some(regrid) = &ctx.regrid {
            let dataset = JsonDataset::open(&regrid.file)?;
            if dataset.has_variable(STATE_VARIABLE) {
                info!(
                    file = %regrid.file.display(),
                    "regridding till effective fraction overburden"
                );
                let (_, values) = dataset.read_last_record(STATE_VARIABLE)?;
                self.delta.set_values(&values)?;
            }
        }

        Ok(())
    }

    fn update(&mut self, geometry: &Geometry, t: f64, dt: f64) -> CoreResult<()> {
        self.input.update(geometry, t, dt)?;

        self.delta.copy_from(self.input.delta()?)
    }

    fn delta(&self) -> CoreResult<&Field2> {
        Ok(&self.delta)
    }

    fn define_model_state(&self, output: &mut dyn Dataset) -> CoreResult<()> {
        output.define_variable(self.delta.metadata(), (self.delta.mx(), self.delta.my()))?;

        self.input.define_model_state(output)
    }

    fn write_model_state(&self, time: f64, output: &mut dyn Dataset) -> CoreResult<()> {
        output.define_variable(self.delta.metadata(), (self.delta.mx(), self.delta.my()))?;
        output.append_record(STATE_VARIABLE, time, self.delta.values())?;

        self.input.write_model_state(time, output)
    }
}

#[cfg(test)]
mod tests {
    use super::{InitializationHelper, STATE_VARIABLE};
    use crate::coupler::interface::testing::UniformDelta;
    use crate::coupler::interface::InterfaceModel;
    use crate::dataset::{Dataset, JsonDataset};
    use crate::domain::RunContext;
    use crate::geometry::Geometry;
    use crate::grid::Grid;
    use tempfile::TempDir;

    fn grid() -> Grid {
        Grid::new(2, 2).expect("grid extents should be accepted")
    }

    #[test]
    fn bootstrap_init_captures_the_chain_value_via_a_zero_length_update() {
        let grid = grid();
        let geometry = Geometry::new(&grid);
        let mut helper = InitializationHelper::new(&grid, Box::new(UniformDelta::new(&grid, 0.7)));

        helper
            .init(&RunContext::bootstrap(0.0), &geometry)
            .expect("bootstrap init should succeed");

        let delta = helper.delta().expect("delta should be captured");
        assert!(delta.values().iter().all(|&v| v == 0.7));
    }

    #[test]
    fn restart_init_reads_the_last_persisted_record() {
        let temp = TempDir::new().expect("tempdir should be created");
        let state_path = temp.path().join("run.json");

        let grid = grid();
        let geometry = Geometry::new(&grid);

        // first run: capture and persist two snapshots
        {
            let mut helper =
                InitializationHelper::new(&grid, Box::new(UniformDelta::new(&grid, 0.3)));
            helper
                .init(&RunContext::bootstrap(0.0), &geometry)
                .expect("bootstrap init should succeed");

            let mut output = JsonDataset::create(&state_path);
            helper
                .write_model_state(0.0, &mut output)
                .expect("first snapshot should be written");
            helper
                .update(&geometry, 1.0, 0.0)
                .expect("update should succeed");
            helper
                .write_model_state(1.0, &mut output)
                .expect("second snapshot should be written");
            output.save().expect("state file should save");
        }

        // restarted run: a different synthetic input, but restart wins
        let mut restarted =
            InitializationHelper::new(&grid, Box::new(UniformDelta::new(&grid, 0.9)));
        restarted
            .init(&RunContext::restart(&state_path, 1.0), &geometry)
            .expect("restart init should succeed");

        let delta = restarted.delta().expect("delta should be restored");
        assert!(delta.values().iter().all(|&v| v == 0.3));
    }

    #[test]
    fn regridding_overwrites_the_captured_state_when_the_variable_exists() {
        let temp = TempDir::new().expect("tempdir should be created");
        let regrid_path = temp.path().join("regrid.json");

        let grid = grid();
        let geometry = Geometry::new(&grid);

        let mut source = JsonDataset::create(&regrid_path);
        let mut helper = InitializationHelper::new(&grid, Box::new(UniformDelta::new(&grid, 0.2)));
        helper
            .init(&RunContext::bootstrap(0.0), &geometry)
            .expect("bootstrap init should succeed");
        source
            .define_variable(helper.delta().expect("delta").metadata(), (2, 2))
            .expect("define should succeed");
        source
            .append_record(STATE_VARIABLE, 0.0, &[0.55; 4])
            .expect("append should succeed");
        source.save().expect("regrid file should save");

        let mut regridded =
            InitializationHelper::new(&grid, Box::new(UniformDelta::new(&grid, 0.2)));
        regridded
            .init(
                &RunContext::bootstrap(0.0).with_regrid(&regrid_path),
                &geometry,
            )
            .expect("init with regridding should succeed");

        let delta = regridded.delta().expect("delta should be overwritten");
        assert!(delta.values().iter().all(|&v| v == 0.55));
    }

    #[test]
    fn missing_regrid_variable_leaves_the_captured_state_alone() {
        let temp = TempDir::new().expect("tempdir should be created");
        let regrid_path = temp.path().join("unrelated.json");
        JsonDataset::create(&regrid_path)
            .save()
            .expect("empty dataset should save");

        let grid = grid();
        let geometry = Geometry::new(&grid);
        let mut helper = InitializationHelper::new(&grid, Box::new(UniformDelta::new(&grid, 0.4)));
        helper
            .init(
                &RunContext::bootstrap(0.0).with_regrid(&regrid_path),
                &geometry,
            )
            .expect("init should succeed");

        let delta = helper.delta().expect("delta should be captured");
        assert!(delta.values().iter().all(|&v| v == 0.4));
    }
}

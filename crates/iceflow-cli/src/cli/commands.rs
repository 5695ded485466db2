use super::helpers::{load_geometry, write_derived_geometry};
use super::CliError;
use iceflow_core::common::config::Config;
use iceflow_core::coupler::interface::{self, InitializationHelper, InterfaceModel};
use iceflow_core::coupler::ocean::{self, OceanModel};
use iceflow_core::coupler::surface::{self, SurfaceModel};
use iceflow_core::dataset::{Dataset, JsonDataset};
use iceflow_core::domain::{IceflowError, RunContext};
use iceflow_core::geometry::GeometryCalculator;
use std::path::PathBuf;
use tracing::info;

#[derive(clap::Args)]
pub(super) struct RunArgs {
    /// Run configuration path
    #[arg(long)]
    config: PathBuf,

    /// Dataset holding bed_elevation and ice_thickness
    #[arg(long)]
    geometry: PathBuf,

    /// Output/restart dataset path
    #[arg(long)]
    output: PathBuf,

    /// Restart from this dataset instead of bootstrapping
    #[arg(long)]
    restart: Option<PathBuf>,

    /// One-time state correction source applied after init
    #[arg(long)]
    regrid: Option<PathBuf>,

    /// Optional dataset receiving aggregated field diagnostics
    #[arg(long)]
    diagnostics: Option<PathBuf>,

    /// Run start time, years
    #[arg(long, default_value_t = 0.0)]
    start: f64,

    /// Run end time, years
    #[arg(long)]
    end: f64,

    /// Coupling interval, years
    #[arg(long, default_value_t = 1.0)]
    dt: f64,
}

#[derive(clap::Args)]
pub(super) struct MaskArgs {
    /// Dataset holding bed_elevation and ice_thickness
    #[arg(long)]
    input: PathBuf,

    /// Output dataset path
    #[arg(long)]
    output: PathBuf,

    /// Optional run configuration (densities, thresholds)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sea level elevation, m
    #[arg(long, default_value_t = 0.0)]
    sea_level: f64,
}

pub(super) fn run_run_command(args: RunArgs) -> Result<i32, CliError> {
    if args.dt <= 0.0 {
        return Err(CliError::Usage(format!(
            "--dt must be positive, got {}",
            args.dt
        )));
    }
    if args.end < args.start {
        return Err(CliError::Usage(format!(
            "--end ({}) must not precede --start ({})",
            args.end, args.start
        )));
    }

    let config = Config::from_file(&args.config)?;
    let calculator = GeometryCalculator::new(&config);
    let (grid, mut geometry) = load_geometry(&args.geometry)?;

    let mut ctx = match &args.restart {
        Some(file) => RunContext::restart(file, args.start),
        None => RunContext::bootstrap(args.start),
    };
    if let Some(file) = &args.regrid {
        ctx = ctx.with_regrid(file);
    }

    let mut ocean_chain = ocean::factory().create(&grid, &config, &config.ocean.models)?;
    let mut surface_chain = surface::factory().create(&grid, &config, &config.surface.models)?;
    let interface_inner =
        interface::factory().create(&grid, &config, &config.interface.models)?;
    let mut interface_chain: Box<dyn InterfaceModel> =
        Box::new(InitializationHelper::new(&grid, interface_inner));

    geometry.ensure_consistency(&calculator)?;

    ocean_chain.init(&ctx, &geometry)?;
    geometry.sea_level_elevation = ocean_chain.sea_level_elevation()?;
    geometry.ensure_consistency(&calculator)?;

    surface_chain.init(&ctx, &geometry)?;
    interface_chain.init(&ctx, &geometry)?;

    let mut t = args.start;
    let mut steps = 0_u64;
    while t < args.end {
        let mut dt = args.dt.min(args.end - t);
        for limit in [
            ocean_chain.max_timestep(t),
            surface_chain.max_timestep(t),
            interface_chain.max_timestep(t),
        ] {
            if let Some(limit) = limit.value() {
                dt = dt.min(limit);
            }
        }
        if dt <= 0.0 {
            return Err(IceflowError::dataset(
                &args.geometry,
                format!("forcing cannot advance past t = {t}"),
            )
            .into());
        }

        ocean_chain.update(&geometry, t, dt)?;
        geometry.sea_level_elevation = ocean_chain.sea_level_elevation()?;
        geometry.ensure_consistency(&calculator)?;

        surface_chain.update(&geometry, t, dt)?;
        interface_chain.update(&geometry, t, dt)?;

        t += dt;
        steps += 1;
    }
    info!(steps, end = t, "forcing chains stepped to the end of the run");

    let mut output = JsonDataset::create(&args.output);
    ocean_chain.define_model_state(&mut output)?;
    surface_chain.define_model_state(&mut output)?;
    interface_chain.define_model_state(&mut output)?;
    ocean_chain.write_model_state(t, &mut output)?;
    surface_chain.write_model_state(t, &mut output)?;
    interface_chain.write_model_state(t, &mut output)?;

    for (name, diagnostic) in ocean_chain.ts_diagnostics().iter() {
        let metadata = diagnostic.metadata().clone().with_name(name);
        output.define_variable(&metadata, (1, 1))?;
        output.append_record(name, t, &[diagnostic.compute()?])?;
    }

    write_derived_geometry(&mut output, &geometry, t)?;
    output.save()?;

    if let Some(path) = &args.diagnostics {
        let mut diagnostics_output = JsonDataset::create(path);
        let lists = [interface_chain.diagnostics(), surface_chain.diagnostics()];
        for list in &lists {
            for (name, diagnostic) in list.iter() {
                let field = diagnostic.compute()?;
                let metadata = field.metadata().clone().with_name(name);
                diagnostics_output.define_variable(&metadata, (field.mx(), field.my()))?;
                diagnostics_output.append_record(name, t, field.values())?;
            }
        }
        diagnostics_output.save()?;
    }

    info!(output = %args.output.display(), "model state written");
    Ok(0)
}

pub(super) fn run_mask_command(args: MaskArgs) -> Result<i32, CliError> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let calculator = GeometryCalculator::new(&config);

    let (_grid, mut geometry) = load_geometry(&args.input)?;
    geometry.sea_level_elevation = args.sea_level;
    geometry.ensure_consistency(&calculator)?;

    let mut output = JsonDataset::create(&args.output);
    write_derived_geometry(&mut output, &geometry, 0.0)?;
    output.save()?;

    info!(output = %args.output.display(), "classification written");
    Ok(0)
}

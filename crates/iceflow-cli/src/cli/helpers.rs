use iceflow_core::dataset::{Dataset, JsonDataset};
use iceflow_core::domain::CoreResult;
use iceflow_core::geometry::Geometry;
use iceflow_core::grid::{FieldMetadata, Grid};
use std::path::Path;

/// Reads the prescribed geometry (bed elevation and ice thickness) from a
/// dataset, sizing the grid from the bed variable's shape.
pub(super) fn load_geometry(path: &Path) -> CoreResult<(Grid, Geometry)> {
    let dataset = JsonDataset::open(path)?;

    let shape = dataset.variable_shape("bed_elevation")?;
    let grid = Grid::new(shape.0, shape.1)?;
    let mut geometry = Geometry::new(&grid);

    let (_, bed) = dataset.read_last_record("bed_elevation")?;
    geometry.bed_elevation.set_values(&bed)?;

    let (_, thickness) = dataset.read_last_record("ice_thickness")?;
    geometry.ice_thickness.set_values(&thickness)?;

    Ok((grid, geometry))
}

/// Writes the derived geometry fields into an output dataset.
pub(super) fn write_derived_geometry(
    output: &mut JsonDataset,
    geometry: &Geometry,
    time: f64,
) -> CoreResult<()> {
    let surface = &geometry.surface_elevation;
    output.define_variable(surface.metadata(), (surface.mx(), surface.my()))?;
    output.append_record(&surface.metadata().name, time, surface.values())?;

    let cell_type = &geometry.cell_type;
    let metadata = FieldMetadata::new(cell_type.name(), "1")
        .with_long_name("ice/ocean/land classification of grid columns");
    output.define_variable(&metadata, (cell_type.mx(), cell_type.my()))?;
    let values: Vec<f64> = cell_type.values().iter().map(|&v| f64::from(v)).collect();
    output.append_record(cell_type.name(), time, &values)
}

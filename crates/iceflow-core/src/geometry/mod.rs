//! Ice geometry and the per-point mask/surface classification.
//!
//! The classification is a pure function of sea level, bed elevation, and
//! ice thickness at each point; iteration order carries no meaning. The
//! scalar-sea-level and field-sea-level variants agree whenever the field
//! is uniform.

use crate::common::config::Config;
use crate::domain::CoreResult;
use crate::grid::{Field2, FieldMetadata, Grid, IntField2};

/// Per-point classification of a grid column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskValue {
    IceFreeLand = 0,
    GroundedIce = 2,
    FloatingIce = 3,
    IceFreeOcean = 4,
}

impl MaskValue {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_icy(self) -> bool {
        matches!(self, Self::GroundedIce | Self::FloatingIce)
    }

    pub fn is_ocean(self) -> bool {
        matches!(self, Self::FloatingIce | Self::IceFreeOcean)
    }
}

/// Applies the flotation criterion point by point.
#[derive(Debug, Clone, Copy)]
pub struct GeometryCalculator {
    /// Ice to sea water density ratio.
    alpha: f64,
    icefree_thickness: f64,
}

impl GeometryCalculator {
    pub fn new(config: &Config) -> Self {
        Self {
            alpha: config.constants.ice_density / config.constants.sea_water_density,
            icefree_thickness: config.constants.ice_free_thickness,
        }
    }

    /// Classifies one column. A column floats when the flotation-adjusted
    /// surface exceeds the grounded surface (Archimedes criterion).
    pub fn mask(&self, sea_level: f64, bed: f64, thickness: f64) -> MaskValue {
        let grounded_surface = bed + thickness;
        let floating_surface = sea_level + (1.0 - self.alpha) * thickness;
        let ice_free = thickness < self.icefree_thickness;

        if grounded_surface >= floating_surface {
            if ice_free {
                MaskValue::IceFreeLand
            } else {
                MaskValue::GroundedIce
            }
        } else if ice_free {
            MaskValue::IceFreeOcean
        } else {
            MaskValue::FloatingIce
        }
    }

    /// Surface elevation of one column: the greater of the grounded and
    /// flotation-adjusted surfaces.
    pub fn surface(&self, sea_level: f64, bed: f64, thickness: f64) -> f64 {
        let grounded_surface = bed + thickness;
        let floating_surface = sea_level + (1.0 - self.alpha) * thickness;
        grounded_surface.max(floating_surface)
    }

    pub fn compute_mask_uniform(
        &self,
        sea_level: f64,
        bed: &Field2,
        thickness: &Field2,
        result: &mut IntField2,
    ) {
        let stencil = result.stencil_width();
        debug_assert!(bed.stencil_width() >= stencil);
        debug_assert!(thickness.stencil_width() >= stencil);

        for j in 0..result.my() {
            for i in 0..result.mx() {
                let value = self.mask(sea_level, bed.get(i, j), thickness.get(i, j));
                result.set(i, j, value.as_i32());
            }
        }
    }

    pub fn compute_mask(
        &self,
        sea_level: &Field2,
        bed: &Field2,
        thickness: &Field2,
        result: &mut IntField2,
    ) {
        let stencil = result.stencil_width();
        debug_assert!(sea_level.stencil_width() >= stencil);
        debug_assert!(bed.stencil_width() >= stencil);
        debug_assert!(thickness.stencil_width() >= stencil);

        for j in 0..result.my() {
            for i in 0..result.mx() {
                let value = self.mask(sea_level.get(i, j), bed.get(i, j), thickness.get(i, j));
                result.set(i, j, value.as_i32());
            }
        }
    }

    pub fn compute_surface_uniform(
        &self,
        sea_level: f64,
        bed: &Field2,
        thickness: &Field2,
        result: &mut Field2,
    ) {
        let stencil = result.stencil_width();
        debug_assert!(bed.stencil_width() >= stencil);
        debug_assert!(thickness.stencil_width() >= stencil);

        for j in 0..result.my() {
            for i in 0..result.mx() {
                let value = self.surface(sea_level, bed.get(i, j), thickness.get(i, j));
                result.set(i, j, value);
            }
        }
    }

    pub fn compute_surface(
        &self,
        sea_level: &Field2,
        bed: &Field2,
        thickness: &Field2,
        result: &mut Field2,
    ) {
        let stencil = result.stencil_width();
        debug_assert!(sea_level.stencil_width() >= stencil);
        debug_assert!(bed.stencil_width() >= stencil);
        debug_assert!(thickness.stencil_width() >= stencil);

        for j in 0..result.my() {
            for i in 0..result.mx() {
                let value = self.surface(sea_level.get(i, j), bed.get(i, j), thickness.get(i, j));
                result.set(i, j, value);
            }
        }
    }

    pub fn compute_uniform(
        &self,
        sea_level: f64,
        bed: &Field2,
        thickness: &Field2,
        out_mask: &mut IntField2,
        out_surface: &mut Field2,
    ) {
        self.compute_mask_uniform(sea_level, bed, thickness, out_mask);
        self.compute_surface_uniform(sea_level, bed, thickness, out_surface);
    }

    pub fn compute(
        &self,
        sea_level: &Field2,
        bed: &Field2,
        thickness: &Field2,
        out_mask: &mut IntField2,
        out_surface: &mut Field2,
    ) {
        self.compute_mask(sea_level, bed, thickness, out_mask);
        self.compute_surface(sea_level, bed, thickness, out_surface);
    }
}

/// The geometry state shared with every component: prescribed bed and
/// thickness plus the derived cell classification and surface elevation.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub bed_elevation: Field2,
    pub ice_thickness: Field2,
    /// Spatially uniform sea level supplied by the ocean chain, m.
    pub sea_level_elevation: f64,
    pub cell_type: IntField2,
    pub surface_elevation: Field2,
}

impl Geometry {
    pub fn new(grid: &Grid) -> Self {
        Self {
            bed_elevation: Field2::new(
                grid,
                FieldMetadata::new("bed_elevation", "m").with_long_name("bedrock elevation"),
            ),
            ice_thickness: Field2::new(
                grid,
                FieldMetadata::new("ice_thickness", "m")
                    .with_long_name("land ice thickness")
                    .with_valid_range(0.0, 1.0e4),
            ),
            sea_level_elevation: 0.0,
            cell_type: IntField2::new(grid, "cell_type"),
            surface_elevation: Field2::new(
                grid,
                FieldMetadata::new("surface_elevation", "m")
                    .with_long_name("ice upper surface elevation"),
            ),
        }
    }

    /// Recomputes the derived mask and surface from the prescribed fields.
    pub fn ensure_consistency(&mut self, calculator: &GeometryCalculator) -> CoreResult<()> {
        calculator.compute_uniform(
            self.sea_level_elevation,
            &self.bed_elevation,
            &self.ice_thickness,
            &mut self.cell_type,
            &mut self.surface_elevation,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Geometry, GeometryCalculator, MaskValue};
    use crate::common::config::Config;
    use crate::grid::{Field2, FieldMetadata, Grid, IntField2};

    fn calculator() -> GeometryCalculator {
        GeometryCalculator::new(&Config::default())
    }

    #[test]
    fn thin_ice_over_deep_bed_floats() {
        let calc = calculator();
        let mask = calc.mask(0.0, -500.0, 200.0);
        assert_eq!(mask, MaskValue::FloatingIce);

        let surface = calc.surface(0.0, -500.0, 200.0);
        let expected = 200.0 * (1.0 - 910.0 / 1028.0);
        assert!((surface - expected).abs() < 1e-9);
        assert!((surface - 22.96).abs() < 0.01);
    }

    #[test]
    fn bare_high_bed_is_ice_free_land() {
        let calc = calculator();
        assert_eq!(calc.mask(0.0, 300.0, 0.0), MaskValue::IceFreeLand);
        assert_eq!(calc.surface(0.0, 300.0, 0.0), 300.0);
    }

    #[test]
    fn thick_ice_over_shallow_bed_is_grounded() {
        let calc = calculator();
        // flotation thickness over a 100 m deep bed is ~113 m
        assert_eq!(calc.mask(0.0, -100.0, 500.0), MaskValue::GroundedIce);
        assert_eq!(calc.surface(0.0, -100.0, 500.0), 400.0);
    }

    #[test]
    fn open_water_is_ice_free_ocean() {
        let calc = calculator();
        let mask = calc.mask(0.0, -500.0, 0.0);
        assert_eq!(mask, MaskValue::IceFreeOcean);
        assert!(mask.is_ocean());
        assert!(!mask.is_icy());
        assert_eq!(calc.surface(0.0, -500.0, 0.0), 0.0);
    }

    #[test]
    fn uniform_sea_level_field_matches_the_scalar_variant() {
        let grid = Grid::new(4, 3).expect("grid extents should be accepted");
        let calc = calculator();

        let mut bed = Field2::new(&grid, FieldMetadata::new("bed_elevation", "m"));
        let mut thickness = Field2::new(&grid, FieldMetadata::new("ice_thickness", "m"));
        for (index, (i, j)) in grid.points().enumerate() {
            bed.set(i, j, -600.0 + 100.0 * index as f64);
            thickness.set(i, j, (50.0 * index as f64) % 700.0);
        }

        let mut sea_level = Field2::new(&grid, FieldMetadata::new("sea_level", "m"));
        sea_level.fill(-5.0);

        let mut mask_scalar = IntField2::new(&grid, "cell_type");
        let mut mask_field = IntField2::new(&grid, "cell_type");
        let mut surface_scalar = Field2::new(&grid, FieldMetadata::new("surface_elevation", "m"));
        let mut surface_field = Field2::new(&grid, FieldMetadata::new("surface_elevation", "m"));

        calc.compute_uniform(-5.0, &bed, &thickness, &mut mask_scalar, &mut surface_scalar);
        calc.compute(&sea_level, &bed, &thickness, &mut mask_field, &mut surface_field);

        assert_eq!(mask_scalar.values(), mask_field.values());
        assert_eq!(surface_scalar.values(), surface_field.values());
    }

    #[test]
    fn ensure_consistency_fills_the_derived_fields() {
        let grid = Grid::new(2, 2).expect("grid extents should be accepted");
        let mut geometry = Geometry::new(&grid);
        geometry.bed_elevation.fill(-500.0);
        geometry.ice_thickness.fill(200.0);
        geometry
            .ensure_consistency(&calculator())
            .expect("consistency pass should succeed");

        assert!(geometry
            .cell_type
            .values()
            .iter()
            .all(|&v| v == MaskValue::FloatingIce.as_i32()));
        assert!(geometry
            .surface_elevation
            .values()
            .iter()
            .all(|&v| (v - 22.96).abs() < 0.01));
    }
}

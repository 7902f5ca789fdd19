//! ElevationRaster: regular elevation grid with world-space georeferencing.
//!
//! Row 0 is the northern edge (top), matching loader output for
//! north-up rasters; the world origin is the lower-left corner and
//! cells are square.

use serde::{Deserialize, Serialize};

/// Raster header metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterHeader {
    /// Number of columns (west to east).
    pub width: u32,
    /// Number of rows (north to south).
    pub height: u32,
    /// World units per grid cell (square cells).
    pub cell_size: f64,
    /// World x of the raster's lower-left corner.
    pub origin_x: f64,
    /// World y of the raster's lower-left corner.
    pub origin_y: f64,
    /// Sentinel elevation marking an invalid sample.
    pub no_data: f64,
}

/// A regular elevation grid. Immutable during triangulation; the
/// driver borrows it and never writes through it.
#[derive(Debug, Clone)]
pub struct ElevationRaster {
    pub header: RasterHeader,
    /// Elevations, row-major (north-to-south, west-to-east).
    elevations: Vec<f64>,
}

impl ElevationRaster {
    /// Create a raster from a header and pre-loaded elevation data.
    pub fn new(header: RasterHeader, elevations: Vec<f64>) -> Self {
        assert!(
            header.width > 0 && header.height > 0,
            "raster dimensions must be positive, got {}×{}",
            header.width,
            header.height
        );
        assert_eq!(
            elevations.len(),
            header.width as usize * header.height as usize,
            "elevation data length does not match {}×{} header",
            header.width,
            header.height
        );
        Self { header, elevations }
    }

    /// Number of columns.
    pub fn width(&self) -> u32 {
        self.header.width
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// The no-data sentinel.
    pub fn no_data(&self) -> f64 {
        self.header.no_data
    }

    /// Elevation at integer grid coordinates.
    pub fn value(&self, x: u32, y: u32) -> f64 {
        let h = &self.header;
        assert!(
            x < h.width && y < h.height,
            "raster access out of bounds: ({x}, {y}) in {}×{}",
            h.width,
            h.height
        );
        self.elevations[y as usize * h.width as usize + x as usize]
    }

    /// Whether `z` is the no-data sentinel. Exact comparison; a NaN
    /// sentinel matches any NaN sample.
    pub fn is_no_data(&self, z: f64) -> bool {
        if self.header.no_data.is_nan() {
            z.is_nan()
        } else {
            z == self.header.no_data
        }
    }

    /// World x of the center of column `col`.
    pub fn col2x(&self, col: u32) -> f64 {
        self.header.origin_x + (col as f64 + 0.5) * self.header.cell_size
    }

    /// World y of the center of row `row` (row 0 is the top edge).
    pub fn row2y(&self, row: u32) -> f64 {
        let h = &self.header;
        h.origin_y + (h.height as f64 - row as f64 - 0.5) * h.cell_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_raster(width: u32, height: u32, values: Vec<f64>) -> ElevationRaster {
        ElevationRaster::new(
            RasterHeader {
                width,
                height,
                cell_size: 10.0,
                origin_x: 100.0,
                origin_y: 200.0,
                no_data: -9999.0,
            },
            values,
        )
    }

    #[test]
    fn test_value_lookup() {
        let raster = make_raster(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(raster.value(0, 0), 1.0);
        assert_eq!(raster.value(2, 0), 3.0);
        assert_eq!(raster.value(0, 1), 4.0);
        assert_eq!(raster.value(2, 1), 6.0);
    }

    #[test]
    fn test_no_data_exact() {
        let raster = make_raster(2, 2, vec![0.0, -9999.0, 5.0, 0.0]);
        assert!(raster.is_no_data(-9999.0));
        assert!(!raster.is_no_data(-9998.999));
        assert!(!raster.is_no_data(0.0));
    }

    #[test]
    fn test_no_data_nan_sentinel() {
        let raster = ElevationRaster::new(
            RasterHeader {
                width: 2,
                height: 1,
                cell_size: 1.0,
                origin_x: 0.0,
                origin_y: 0.0,
                no_data: f64::NAN,
            },
            vec![f64::NAN, 3.0],
        );
        assert!(raster.is_no_data(raster.value(0, 0)));
        assert!(!raster.is_no_data(raster.value(1, 0)));
    }

    #[test]
    fn test_world_mapping() {
        let raster = make_raster(4, 3, vec![0.0; 12]);
        // Column 0 center sits half a cell east of the origin.
        assert!((raster.col2x(0) - 105.0).abs() < 1e-12);
        assert!((raster.col2x(3) - 135.0).abs() < 1e-12);
        // Row 0 is the top: highest world y.
        assert!((raster.row2y(0) - 225.0).abs() < 1e-12);
        assert!((raster.row2y(2) - 205.0).abs() < 1e-12);
    }
}

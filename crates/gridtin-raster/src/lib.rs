//! Raster containers for TIN generation.
//!
//! Fixed-size 2-D grids and the georeferenced elevation raster
//! that the triangulation engine refines.

pub mod grid;
pub mod raster;

// Re-export key types for convenience.
pub use grid::Grid;
pub use raster::{ElevationRaster, RasterHeader};

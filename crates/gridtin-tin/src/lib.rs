//! Greedy-insertion TIN generation.
//!
//! Refines a regular elevation grid into a triangulated irregular
//! network whose triangle density follows terrain roughness, subject to
//! a caller-supplied maximum vertical error, then extracts flat
//! vertex/face arrays for downstream serialization.

pub use gridtin_raster as raster;

pub mod candidate;
pub mod extract;
pub mod greedy;
pub mod mesh;
pub mod plane;

// Re-export the core entry points.
pub use extract::{convert_to_mesh, SurfaceMesh};
pub use greedy::{greedy_insert, Tin, EDGE_ERROR_FACTOR};

//! Flat vertex/face extraction from a finished TIN.
//!
//! Walks the usage grid to assign dense vertex indices, then walks the
//! live triangle list, normalizing every face to a single winding so a
//! downstream tile writer can consume the arrays as-is.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use gridtin_raster::{ElevationRaster, Grid};

use crate::greedy::Tin;
use crate::mesh::orient;

/// Extracted surface mesh: world-space vertices and index triplets with
/// uniform winding (counter-clockwise in world coordinates).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurfaceMesh {
    /// (world-x, world-y, elevation) per vertex.
    pub vertices: Vec<DVec3>,
    /// Vertex index triplets.
    pub faces: Vec<[u32; 3]>,
}

/// Convert the internal TIN into flat vertex and face lists.
///
/// Every used cell with a valid elevation becomes exactly one vertex,
/// assigned in row-major order. A face referencing a cell that was
/// never marked used indicates a broken invariant and is fatal.
pub fn convert_to_mesh(tin: &Tin, raster: &ElevationRaster) -> SurfaceMesh {
    let w = raster.width();
    let h = raster.height();

    let mut vertex_id: Grid<i32> = Grid::new(w, h, -1);
    let mut vertices = Vec::new();

    for y in 0..h {
        for x in 0..w {
            if !tin.used().get(x, y) {
                continue;
            }
            let z = tin.sample(raster, x, y);
            if raster.is_no_data(z) {
                continue;
            }
            vertex_id.set(x, y, vertices.len() as i32);
            vertices.push(DVec3::new(raster.col2x(x), raster.row2y(y), z));
        }
    }

    let mut faces = Vec::new();
    for t in tin.mesh().traverse() {
        let [a, b, c] = tin.mesh().verts(t);
        // Grid rows run north to south, so negative grid orientation is
        // counter-clockwise in world coordinates.
        let (a, b, c) = if orient(a, b, c) > 0 { (c, b, a) } else { (a, b, c) };
        let face = [a, b, c].map(|v| {
            let id = vertex_id.get(v.x as u32, v.y as u32);
            assert!(
                id >= 0,
                "face references cell ({}, {}) that is not a vertex",
                v.x,
                v.y
            );
            id as u32
        });
        faces.push(face);
    }

    SurfaceMesh { vertices, faces }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::greedy::greedy_insert;
    use gridtin_raster::RasterHeader;

    fn make_raster(width: u32, height: u32, values: Vec<f64>) -> ElevationRaster {
        ElevationRaster::new(
            RasterHeader {
                width,
                height,
                cell_size: 2.0,
                origin_x: 50.0,
                origin_y: -10.0,
                no_data: -9999.0,
            },
            values,
        )
    }

    fn rugged_raster(n: u32, seed: u64) -> ElevationRaster {
        use rand::{Rng, SeedableRng};
        use rand_chacha::ChaCha8Rng;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let values: Vec<f64> = (0..n * n).map(|_| rng.gen_range(0.0..40.0)).collect();
        make_raster(n, n, values)
    }

    /// Doubled signed area of a face in world xy; positive means
    /// counter-clockwise.
    fn signed_area2(mesh: &SurfaceMesh, face: [u32; 3]) -> f64 {
        let [a, b, c] = face.map(|i| mesh.vertices[i as usize]);
        (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
    }

    #[test]
    fn test_vertices_in_world_coordinates() {
        let raster = make_raster(3, 3, vec![7.0; 9]);
        let tin = greedy_insert(&raster, 0.1);
        let mesh = convert_to_mesh(&tin, &raster);
        // Corner (0, 0) is the top-left cell: west edge, north edge.
        assert!(mesh
            .vertices
            .iter()
            .any(|v| v.x == 51.0 && v.y == -5.0 && v.z == 7.0));
        // Corner (2, 2) is the bottom-right cell.
        assert!(mesh.vertices.iter().any(|v| v.x == 55.0 && v.y == -9.0));
    }

    #[test]
    fn test_faces_reference_distinct_valid_indices() {
        let raster = rugged_raster(10, 3);
        let tin = greedy_insert(&raster, 4.0);
        let mesh = convert_to_mesh(&tin, &raster);
        assert!(!mesh.faces.is_empty());
        for face in &mesh.faces {
            for &i in face {
                assert!((i as usize) < mesh.vertices.len(), "index out of range");
            }
            assert!(
                face[0] != face[1] && face[1] != face[2] && face[0] != face[2],
                "degenerate face {face:?}"
            );
        }
    }

    #[test]
    fn test_uniform_winding() {
        let raster = rugged_raster(10, 11);
        let tin = greedy_insert(&raster, 4.0);
        let mesh = convert_to_mesh(&tin, &raster);
        for face in &mesh.faces {
            assert!(
                signed_area2(&mesh, *face) > 0.0,
                "face {face:?} is not counter-clockwise in world space"
            );
        }
    }

    #[test]
    fn test_face_count_matches_live_triangles() {
        let raster = rugged_raster(8, 5);
        let tin = greedy_insert(&raster, 6.0);
        let mesh = convert_to_mesh(&tin, &raster);
        assert_eq!(mesh.faces.len(), tin.mesh().live_count());
    }

    #[test]
    fn test_surface_mesh_serializes() {
        // Downstream tile writers consume the extraction as JSON-able data.
        let raster = make_raster(3, 3, vec![1.0; 9]);
        let tin = greedy_insert(&raster, 0.1);
        let mesh = convert_to_mesh(&tin, &raster);
        let json = serde_json::to_string(&mesh).expect("serialize");
        let back: SurfaceMesh = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.vertices.len(), mesh.vertices.len());
        assert_eq!(back.faces, mesh.faces);
    }
}

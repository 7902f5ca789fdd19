//! Greedy-insertion driver.
//!
//! Seeds a two-triangle mesh over the raster's bounding rectangle, then
//! repeatedly inserts the raster point whose vertical deviation from the
//! current triangulated surface is largest, until no remaining point
//! exceeds the error budget. Terra-style refinement: one candidate per
//! scanned triangle, lazy invalidation through the token grid.

use glam::{DVec3, IVec2};

use gridtin_raster::{ElevationRaster, Grid};

use crate::candidate::{Candidate, CandidateQueue};
use crate::mesh::{TriMesh, TriRef};
use crate::plane::Plane;

/// Boundary candidates are held to this fraction of `max_error`.
/// Boundary vertices are shared with adjacent tiles, so they are kept
/// more faithful to avoid visible seams.
pub const EDGE_ERROR_FACTOR: f64 = 0.5;

/// Result of a greedy-insertion run: the refined mesh plus the
/// bookkeeping needed to extract vertices from it.
#[derive(Debug)]
pub struct Tin {
    mesh: TriMesh,
    used: Grid<bool>,
    /// Corner cells whose no-data samples were replaced at seeding.
    repairs: Vec<(IVec2, f64)>,
}

impl Tin {
    /// The triangle mesh over grid coordinates.
    pub fn mesh(&self) -> &TriMesh {
        &self.mesh
    }

    /// Per-cell flags: true iff the cell became a mesh vertex.
    pub fn used(&self) -> &Grid<bool> {
        &self.used
    }

    /// Elevation at a grid cell, with corner repairs applied.
    pub fn sample(&self, raster: &ElevationRaster, x: u32, y: u32) -> f64 {
        patched_sample(raster, &self.repairs, x as i32, y as i32)
    }
}

/// Elevation lookup that prefers a repaired corner value over the
/// raster sample.
fn patched_sample(raster: &ElevationRaster, repairs: &[(IVec2, f64)], x: i32, y: i32) -> f64 {
    for (cell, z) in repairs {
        if cell.x == x && cell.y == y {
            return *z;
        }
    }
    raster.value(x as u32, y as u32)
}

/// Triangulate `raster` by greedy insertion until every remaining
/// sample deviates from the surface by less than `max_error`
/// (`max_error * EDGE_ERROR_FACTOR` on the raster boundary).
///
/// `max_error` is in the same vertical units as the elevations and must
/// be non-negative; the raster must be at least 2×2.
pub fn greedy_insert(raster: &ElevationRaster, max_error: f64) -> Tin {
    assert!(
        max_error >= 0.0,
        "max_error must be non-negative, got {max_error}"
    );
    assert!(
        raster.width() >= 2 && raster.height() >= 2,
        "raster must be at least 2×2 to triangulate, got {}×{}",
        raster.width(),
        raster.height()
    );

    let mut driver = GreedyInserter::new(raster, max_error);
    driver.run();
    Tin {
        mesh: driver.mesh,
        used: driver.used,
        repairs: driver.repairs,
    }
}

/// One triangulation run. Owns the usage/token grids, the candidate
/// queue, and the mesh for the duration of the run; borrows the raster.
struct GreedyInserter<'a> {
    raster: &'a ElevationRaster,
    max_error: f64,
    mesh: TriMesh,
    used: Grid<bool>,
    token: Grid<u64>,
    /// Driver-local candidate generation counter, strictly increasing
    /// across the whole run.
    counter: u64,
    candidates: CandidateQueue,
    repairs: Vec<(IVec2, f64)>,
}

impl<'a> GreedyInserter<'a> {
    fn new(raster: &'a ElevationRaster, max_error: f64) -> Self {
        let w = raster.width();
        let h = raster.height();
        Self {
            raster,
            max_error,
            mesh: TriMesh::covering(w, h),
            used: Grid::new(w, h, false),
            token: Grid::new(w, h, 0),
            counter: 0,
            candidates: CandidateQueue::new(),
            repairs: Vec::new(),
        }
    }

    fn run(&mut self) {
        let w = self.raster.width() as i32;
        let h = self.raster.height() as i32;

        // The four seed corners must carry usable elevations.
        self.repair_corner(0, 0);
        self.repair_corner(0, h - 1);
        self.repair_corner(w - 1, h - 1);
        self.repair_corner(w - 1, 0);

        self.used.set(0, 0, true);
        self.used.set(0, h as u32 - 1, true);
        self.used.set(w as u32 - 1, h as u32 - 1, true);
        self.used.set(w as u32 - 1, 0, true);

        // Scan the two seed triangles to prime the queue.
        let seeds: Vec<TriRef> = self.mesh.traverse().collect();
        for t in seeds {
            self.scan_triangle(t);
        }

        // Pop, validate, insert, re-scan.
        while let Some(candidate) = self.candidates.pop_max() {
            let factor = if candidate.edge { EDGE_ERROR_FACTOR } else { 1.0 };
            if candidate.importance < self.max_error * factor {
                continue;
            }
            // A later scan has claimed this cell.
            if self.token.get(candidate.x as u32, candidate.y as u32) != candidate.token {
                continue;
            }
            // An edge split consumed the owning triangle; the live
            // triangle covering this cell accounted for it in its own scan.
            if !self.mesh.is_live(candidate.triangle) {
                continue;
            }

            self.used.set(candidate.x as u32, candidate.y as u32, true);
            let point = IVec2::new(candidate.x, candidate.y);
            let created = self.mesh.insert(point, candidate.triangle);
            for t in created {
                self.scan_triangle(t);
            }
        }
    }

    /// If the corner holds no-data, substitute the nearest valid sample,
    /// searching outward ring by ring.
    fn repair_corner(&mut self, x: i32, y: i32) {
        if !self.raster.is_no_data(self.raster.value(x as u32, y as u32)) {
            return;
        }
        let w = self.raster.width() as i32;
        let h = self.raster.height() as i32;

        for radius in 1..w.max(h) {
            let mut best: Option<(i64, f64)> = None;
            for ny in (y - radius)..=(y + radius) {
                for nx in (x - radius)..=(x + radius) {
                    if nx < 0 || ny < 0 || nx >= w || ny >= h {
                        continue;
                    }
                    if (nx - x).abs().max((ny - y).abs()) != radius {
                        continue;
                    }
                    let z = self.raster.value(nx as u32, ny as u32);
                    if self.raster.is_no_data(z) {
                        continue;
                    }
                    let dx = (nx - x) as i64;
                    let dy = (ny - y) as i64;
                    let dist = dx * dx + dy * dy;
                    if best.is_none_or(|(d, _)| dist < d) {
                        best = Some((dist, z));
                    }
                }
            }
            if let Some((_, z)) = best {
                self.repairs.push((IVec2::new(x, y), z));
                return;
            }
        }
        panic!("cannot repair corner ({x}, {y}): raster has no valid samples");
    }

    fn next_token(&mut self) -> u64 {
        let token = self.counter;
        self.counter += 1;
        token
    }

    fn sample(&self, x: i32, y: i32) -> f64 {
        patched_sample(self.raster, &self.repairs, x, y)
    }

    /// Stamp the candidate's cell in the token grid and queue it. The
    /// stamp is what lets the pop loop detect staleness later.
    fn claim_and_push(&mut self, candidate: Candidate) {
        self.token
            .set(candidate.x as u32, candidate.y as u32, candidate.token);
        self.candidates.push(candidate);
    }

    /// Find the triangle's best unused sample(s) and queue them: one
    /// interior candidate from full scan-conversion, plus up to one
    /// vertical and one horizontal boundary candidate where the triangle
    /// has edges on the raster's outer rectangle. The interior candidate
    /// is claimed first, so a boundary candidate at the same cell
    /// supersedes it and keeps the stricter edge threshold.
    fn scan_triangle(&mut self, t: TriRef) {
        let verts = self.mesh.verts(t);
        let points = verts.map(|v| DVec3::new(v.x as f64, v.y as f64, self.sample(v.x, v.y)));
        let plane = Plane::through(points[0], points[1], points[2]);

        let mut by_y = verts;
        by_y.sort_by_key(|v| (v.y, v.x));
        let [v0, v1, v2] = by_y;

        let max_x = self.raster.width() as i32 - 1;
        let max_y = self.raster.height() as i32 - 1;

        // Interior: classic two-slope rasterization, sweeping the upper
        // then the lower sub-triangle, carrying the long-edge intercept.
        let mut interior = Candidate::unset(self.next_token(), t);
        let dx2 = (v2.x - v0.x) as f64 / (v2.y - v0.y) as f64;
        let mut x2 = v0.x as f64;
        if v1.y != v0.y {
            let dx1 = (v1.x - v0.x) as f64 / (v1.y - v0.y) as f64;
            let mut x1 = v0.x as f64;
            for y in v0.y..v1.y {
                self.scan_row(&plane, y, x1, x2, &mut interior);
                x1 += dx1;
                x2 += dx2;
            }
        }
        if v2.y != v1.y {
            let dx1 = (v2.x - v1.x) as f64 / (v2.y - v1.y) as f64;
            let mut x1 = v1.x as f64;
            for y in v1.y..=v2.y {
                self.scan_row(&plane, y, x1, x2, &mut interior);
                x1 += dx1;
                x2 += dx2;
            }
        }
        if interior.found() {
            self.claim_and_push(interior);
        }

        // Boundary edges: scanned separately and flagged, because seam
        // fidelity holds them to the tighter threshold.
        let mut vertical = Candidate::unset(self.next_token(), t);
        let mut horizontal = Candidate::unset(self.next_token(), t);
        for i in 0..3 {
            let a = by_y[i];
            let b = by_y[(i + 1) % 3];
            if (a.x == 0 && b.x == 0) || (a.x == max_x && b.x == max_x) {
                self.scan_column(&plane, a.x, a.y as f64, b.y as f64, &mut vertical);
            } else if (a.y == 0 && b.y == 0) || (a.y == max_y && b.y == max_y) {
                self.scan_row(&plane, a.y, a.x as f64, b.x as f64, &mut horizontal);
            }
        }
        if vertical.found() {
            vertical.edge = true;
            self.claim_and_push(vertical);
        }
        if horizontal.found() {
            horizontal.edge = true;
            self.claim_and_push(horizontal);
        }
    }

    /// Consider every unused, valid sample at integer x in
    /// [ceil(min(x1, x2)), floor(max(x1, x2))] on row `y`, stepping the
    /// plane prediction incrementally.
    fn scan_row(&self, plane: &Plane, y: i32, x1: f64, x2: f64, candidate: &mut Candidate) {
        let start = (x1.min(x2).ceil() as i32).max(0);
        let end = (x1.max(x2).floor() as i32).min(self.raster.width() as i32 - 1);
        if start > end {
            return;
        }
        let mut z0 = plane.eval(start as f64, y as f64);
        let dz = plane.a;
        for x in start..=end {
            if !self.used.get(x as u32, y as u32) {
                let z = self.raster.value(x as u32, y as u32);
                if !self.raster.is_no_data(z) {
                    candidate.consider(x, y, z, (z - z0).abs());
                }
            }
            z0 += dz;
        }
    }

    /// Vertical counterpart of `scan_row`: a span of rows at fixed x.
    fn scan_column(&self, plane: &Plane, x: i32, y1: f64, y2: f64, candidate: &mut Candidate) {
        let start = (y1.min(y2).ceil() as i32).max(0);
        let end = (y1.max(y2).floor() as i32).min(self.raster.height() as i32 - 1);
        if start > end {
            return;
        }
        let mut z0 = plane.eval(x as f64, start as f64);
        let dz = plane.b;
        for y in start..=end {
            if !self.used.get(x as u32, y as u32) {
                let z = self.raster.value(x as u32, y as u32);
                if !self.raster.is_no_data(z) {
                    candidate.consider(x, y, z, (z - z0).abs());
                }
            }
            z0 += dz;
        }
    }
}

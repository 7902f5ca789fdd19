//! Best-fit plane through a triangle's three elevation samples.

use glam::DVec3;

/// Plane of the form z = a·x + b·y + c.
///
/// `a` and `b` are the constant partial derivatives in x and y, so a
/// scan can step one cell for the cost of a single addition.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Plane {
    /// The unique plane through three non-collinear points.
    pub fn through(p0: DVec3, p1: DVec3, p2: DVec3) -> Self {
        let normal = (p1 - p0).cross(p2 - p0);
        debug_assert!(
            normal.z != 0.0,
            "plane through a degenerate (xy-collinear) triangle"
        );
        let a = -normal.x / normal.z;
        let b = -normal.y / normal.z;
        let c = p0.z - a * p0.x - b * p0.y;
        Self { a, b, c }
    }

    /// Predicted elevation at (x, y).
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        self.a * x + self.b * y + self.c
    }
}

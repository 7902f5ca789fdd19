//! Candidate points and the max-importance queue.
//!
//! Each scanned triangle contributes the raster cell with the largest
//! deviation from its fitted plane. Candidates are never deleted from
//! the queue; the token grid invalidates stale entries lazily at pop
//! time.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::mesh::TriRef;

/// A raster cell proposed for insertion into the mesh.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    /// Grid column.
    pub x: i32,
    /// Grid row.
    pub y: i32,
    /// Raster elevation at (x, y).
    pub z: f64,
    /// Absolute deviation between the sample and the fitted plane;
    /// negative infinity until a sample has been considered.
    pub importance: f64,
    /// Generation stamp; valid only while it matches the token grid
    /// at (x, y).
    pub token: u64,
    /// The triangle whose scan produced this candidate.
    pub triangle: TriRef,
    /// True when the candidate lies on the raster's outer boundary.
    pub edge: bool,
}

impl Candidate {
    /// A fresh candidate that has not seen any sample yet.
    pub fn unset(token: u64, triangle: TriRef) -> Self {
        Self {
            x: 0,
            y: 0,
            z: 0.0,
            importance: f64::NEG_INFINITY,
            token,
            triangle,
            edge: false,
        }
    }

    /// Keep the higher-deviation sample. Strictly greater replaces, so
    /// ties are broken in favor of the first sample seen.
    pub fn consider(&mut self, x: i32, y: i32, z: f64, deviation: f64) {
        if deviation > self.importance {
            self.x = x;
            self.y = y;
            self.z = z;
            self.importance = deviation;
        }
    }

    /// Whether any sample was considered.
    pub fn found(&self) -> bool {
        self.importance > f64::NEG_INFINITY
    }
}

// Ordering is by importance alone; importance is never NaN (deviations
// come from valid samples), so total_cmp gives a total order that
// matches the usual f64 comparison.
impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.importance.total_cmp(&other.importance) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.importance.total_cmp(&other.importance)
    }
}

/// Max-importance priority queue of candidates.
#[derive(Debug, Default)]
pub struct CandidateQueue {
    heap: BinaryHeap<Candidate>,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// O(log n) insert keyed by importance.
    pub fn push(&mut self, candidate: Candidate) {
        self.heap.push(candidate);
    }

    /// Remove and return the candidate with the greatest importance.
    pub fn pop_max(&mut self) -> Option<Candidate> {
        self.heap.pop()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::TriMesh;

    fn any_triangle() -> TriRef {
        TriMesh::covering(2, 2).traverse().next().unwrap()
    }

    #[test]
    fn test_consider_keeps_maximum() {
        let mut c = Candidate::unset(1, any_triangle());
        assert!(!c.found());
        c.consider(1, 1, 5.0, 2.0);
        c.consider(2, 2, 9.0, 7.0);
        c.consider(3, 3, 1.0, 4.0);
        assert!(c.found());
        assert_eq!((c.x, c.y), (2, 2));
        assert_eq!(c.importance, 7.0);
    }

    #[test]
    fn test_consider_tie_keeps_first_seen() {
        let mut c = Candidate::unset(1, any_triangle());
        c.consider(1, 0, 5.0, 3.0);
        c.consider(2, 0, 6.0, 3.0);
        assert_eq!((c.x, c.y), (1, 0), "equal deviation must not replace");
    }

    #[test]
    fn test_zero_deviation_is_found() {
        // A flat triangle still yields a candidate (importance 0).
        let mut c = Candidate::unset(1, any_triangle());
        c.consider(1, 1, 0.0, 0.0);
        assert!(c.found());
        assert_eq!(c.importance, 0.0);
    }

    #[test]
    fn test_queue_pops_by_importance() {
        let t = any_triangle();
        let mut queue = CandidateQueue::new();
        for (token, importance) in [(1u64, 2.5), (2, 9.0), (3, 0.1), (4, 4.0)] {
            let mut c = Candidate::unset(token, t);
            c.consider(token as i32, 0, 0.0, importance);
            queue.push(c);
        }
        let order: Vec<f64> = std::iter::from_fn(|| queue.pop_max())
            .map(|c| c.importance)
            .collect();
        assert_eq!(order, vec![9.0, 4.0, 2.5, 0.1]);
        assert!(queue.is_empty());
    }
}

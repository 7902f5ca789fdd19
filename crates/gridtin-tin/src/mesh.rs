//! Triangulated mesh over grid coordinates with split-on-insert refinement.
//!
//! Triangles live in an arena of slots addressed by stable indices; a
//! free list reclaims the slots of triangles destroyed by a split, and
//! per-slot generations make stale handles detectable after reuse.
//! Live triangles are threaded on a linked chain for traversal.

use glam::IVec2;

/// Stable handle to a triangle: arena slot index plus the slot's
/// generation at allocation time. A handle is live only while both match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriRef {
    index: u32,
    gen: u32,
}

#[derive(Debug, Clone)]
struct TriSlot {
    gen: u32,
    live: bool,
    verts: [IVec2; 3],
    /// neighbors[i] is the triangle across edge (verts[i], verts[(i+1)%3]),
    /// or None on a hull edge.
    neighbors: [Option<TriRef>; 3],
    /// Live-chain links (slot indices).
    next: Option<u32>,
    prev: Option<u32>,
}

/// Orientation of the triple (a, b, c): positive for counter-clockwise,
/// zero for collinear. Exact in integer arithmetic.
pub fn orient(a: IVec2, b: IVec2, c: IVec2) -> i64 {
    let abx = b.x as i64 - a.x as i64;
    let aby = b.y as i64 - a.y as i64;
    let acx = c.x as i64 - a.x as i64;
    let acy = c.y as i64 - a.y as i64;
    abx * acy - aby * acx
}

/// The evolving planar mesh. Owns all triangles exclusively.
#[derive(Debug)]
pub struct TriMesh {
    slots: Vec<TriSlot>,
    free: Vec<u32>,
    first_live: Option<u32>,
    live_count: usize,
}

impl TriMesh {
    /// Two triangles covering [0, width-1] × [0, height-1], sharing the
    /// (0,0)–(width-1, height-1) diagonal.
    pub fn covering(width: u32, height: u32) -> Self {
        assert!(
            width >= 2 && height >= 2,
            "mesh needs at least a 2×2 grid, got {width}×{height}"
        );
        let w = width as i32 - 1;
        let h = height as i32 - 1;
        let a = IVec2::new(0, 0);
        let b = IVec2::new(0, h);
        let c = IVec2::new(w, h);
        let d = IVec2::new(w, 0);

        let mut mesh = Self {
            slots: Vec::new(),
            free: Vec::new(),
            first_live: None,
            live_count: 0,
        };
        // Both counter-clockwise, shared edge (a, c) at slot index 1.
        let t0 = mesh.alloc([b, a, c]);
        let t1 = mesh.alloc([d, c, a]);
        mesh.slot_mut(t0.index).neighbors = [None, Some(t1), None];
        mesh.slot_mut(t1.index).neighbors = [None, Some(t0), None];
        mesh
    }

    /// Number of live triangles.
    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Whether `t` still refers to a live triangle.
    pub fn is_live(&self, t: TriRef) -> bool {
        let slot = &self.slots[t.index as usize];
        slot.live && slot.gen == t.gen
    }

    /// The three vertices of a live triangle, in stored
    /// (counter-clockwise) order.
    pub fn verts(&self, t: TriRef) -> [IVec2; 3] {
        assert!(self.is_live(t), "triangle handle is stale");
        self.slots[t.index as usize].verts
    }

    /// Lazy traversal of all live triangles via the linked chain.
    pub fn traverse(&self) -> impl Iterator<Item = TriRef> + '_ {
        let mut cursor = self.first_live;
        std::iter::from_fn(move || {
            let index = cursor?;
            let slot = &self.slots[index as usize];
            cursor = slot.next;
            Some(TriRef {
                index,
                gen: slot.gen,
            })
        })
    }

    /// Insert a new vertex at `point`, locating the containing triangle
    /// from the `hint` handle. A point strictly inside a triangle splits
    /// it into three; a point on an edge splits the edge's one or two
    /// incident triangles into two each. Returns the created triangles.
    ///
    /// Inserting a point that coincides with an existing vertex or lies
    /// outside the triangulation is a programming error.
    pub fn insert(&mut self, point: IVec2, hint: TriRef) -> Vec<TriRef> {
        let t = self.locate(point, hint);
        let verts = self.slots[t as usize].verts;
        let orients = [
            orient(verts[0], verts[1], point),
            orient(verts[1], verts[2], point),
            orient(verts[2], verts[0], point),
        ];
        debug_assert!(
            orients.iter().all(|&o| o >= 0),
            "locate returned a triangle not containing ({}, {})",
            point.x,
            point.y
        );
        let zeros = orients.iter().filter(|&&o| o == 0).count();
        assert!(
            zeros < 2,
            "insert point ({}, {}) coincides with a mesh vertex",
            point.x,
            point.y
        );
        if zeros == 1 {
            let edge = orients
                .iter()
                .position(|&o| o == 0)
                .unwrap_or(0);
            self.split_edge(t, edge, point)
        } else {
            self.split_interior(t, point)
        }
    }

    /// Walk from `hint` toward `point`, crossing edges the point lies
    /// beyond, until reaching the containing triangle.
    fn locate(&self, point: IVec2, hint: TriRef) -> u32 {
        assert!(self.is_live(hint), "insert hint references a dead triangle");
        let mut current = hint.index;
        let mut steps = 0usize;
        loop {
            let slot = &self.slots[current as usize];
            let mut crossed = false;
            for i in 0..3 {
                if orient(slot.verts[i], slot.verts[(i + 1) % 3], point) < 0 {
                    match slot.neighbors[i] {
                        Some(n) => {
                            current = n.index;
                            crossed = true;
                        }
                        None => panic!(
                            "point ({}, {}) lies outside the triangulation",
                            point.x, point.y
                        ),
                    }
                    break;
                }
            }
            if !crossed {
                return current;
            }
            steps += 1;
            assert!(
                steps <= self.live_count + 1,
                "point location did not terminate at ({}, {})",
                point.x,
                point.y
            );
        }
    }

    /// 1→3 split of a triangle by a strictly interior point.
    fn split_interior(&mut self, t: u32, p: IVec2) -> Vec<TriRef> {
        let old = self.handle(t);
        let [v0, v1, v2] = self.slots[t as usize].verts;
        let n = self.slots[t as usize].neighbors;
        self.destroy(t);

        let a = self.alloc([v0, v1, p]);
        let b = self.alloc([v1, v2, p]);
        let c = self.alloc([v2, v0, p]);

        self.slot_mut(a.index).neighbors = [n[0], Some(b), Some(c)];
        self.slot_mut(b.index).neighbors = [n[1], Some(c), Some(a)];
        self.slot_mut(c.index).neighbors = [n[2], Some(a), Some(b)];

        self.relink(n[0], old, a);
        self.relink(n[1], old, b);
        self.relink(n[2], old, c);

        vec![a, b, c]
    }

    /// Split the edge `(verts[edge], verts[edge+1])` of triangle `t` at
    /// point `p` on that edge. The triangle across the edge, if any, is
    /// split as well: 2→4 on an interior edge, 1→2 on a hull edge.
    fn split_edge(&mut self, t: u32, edge: usize, p: IVec2) -> Vec<TriRef> {
        let old_t = self.handle(t);
        let tv = self.slots[t as usize].verts;
        let tn = self.slots[t as usize].neighbors;
        let a = tv[edge];
        let b = tv[(edge + 1) % 3];
        let c = tv[(edge + 2) % 3];

        // Capture the neighbor's state before destroying anything.
        let across = tn[edge].map(|u_ref| {
            assert!(self.is_live(u_ref), "adjacency references a dead triangle");
            let uv = self.slots[u_ref.index as usize].verts;
            let un = self.slots[u_ref.index as usize].neighbors;
            let j = (0..3)
                .find(|&j| uv[j] == b && uv[(j + 1) % 3] == a)
                .unwrap_or_else(|| {
                    panic!(
                        "neighbor does not share edge ({}, {})-({}, {})",
                        a.x, a.y, b.x, b.y
                    )
                });
            (u_ref, uv[(j + 2) % 3], un, j)
        });

        self.destroy(t);
        if let Some((u_ref, _, _, _)) = across {
            self.destroy(u_ref.index);
        }

        let t1 = self.alloc([a, p, c]);
        let t2 = self.alloc([p, b, c]);
        let mut created = vec![t1, t2];

        let (u_side_t1, u_side_t2) = match across {
            Some((old_u, d, un, j)) => {
                let u1 = self.alloc([b, p, d]);
                let u2 = self.alloc([p, a, d]);
                self.slot_mut(u1.index).neighbors = [Some(t2), Some(u2), un[(j + 2) % 3]];
                self.slot_mut(u2.index).neighbors = [Some(t1), un[(j + 1) % 3], Some(u1)];
                self.relink(un[(j + 1) % 3], old_u, u2);
                self.relink(un[(j + 2) % 3], old_u, u1);
                created.push(u1);
                created.push(u2);
                (Some(u2), Some(u1))
            }
            None => (None, None),
        };

        self.slot_mut(t1.index).neighbors = [u_side_t1, Some(t2), tn[(edge + 2) % 3]];
        self.slot_mut(t2.index).neighbors = [u_side_t2, tn[(edge + 1) % 3], Some(t1)];
        self.relink(tn[(edge + 1) % 3], old_t, t2);
        self.relink(tn[(edge + 2) % 3], old_t, t1);

        created
    }

    /// Replace `old` with `new` in `target`'s neighbor links.
    fn relink(&mut self, target: Option<TriRef>, old: TriRef, new: TriRef) {
        let Some(target) = target else { return };
        let slot = self.slot_mut(target.index);
        for entry in slot.neighbors.iter_mut() {
            if *entry == Some(old) {
                *entry = Some(new);
                return;
            }
        }
        panic!(
            "triangle slot {} has no back-link to replaced slot {}",
            target.index, old.index
        );
    }

    fn handle(&self, index: u32) -> TriRef {
        TriRef {
            index,
            gen: self.slots[index as usize].gen,
        }
    }

    fn slot_mut(&mut self, index: u32) -> &mut TriSlot {
        &mut self.slots[index as usize]
    }

    /// Allocate a slot (reusing the free list) and link it into the
    /// live chain. Triangles must be supplied counter-clockwise.
    fn alloc(&mut self, verts: [IVec2; 3]) -> TriRef {
        debug_assert!(
            orient(verts[0], verts[1], verts[2]) > 0,
            "triangle must be counter-clockwise and non-degenerate"
        );
        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.live = true;
                slot.verts = verts;
                slot.neighbors = [None; 3];
                index
            }
            None => {
                self.slots.push(TriSlot {
                    gen: 0,
                    live: true,
                    verts,
                    neighbors: [None; 3],
                    next: None,
                    prev: None,
                });
                (self.slots.len() - 1) as u32
            }
        };

        // Link at the head of the live chain.
        let old_head = self.first_live;
        {
            let slot = &mut self.slots[index as usize];
            slot.next = old_head;
            slot.prev = None;
        }
        if let Some(head) = old_head {
            self.slots[head as usize].prev = Some(index);
        }
        self.first_live = Some(index);
        self.live_count += 1;
        self.handle(index)
    }

    /// Unlink a triangle from the live chain and retire its slot. The
    /// generation bump invalidates outstanding handles before reuse.
    fn destroy(&mut self, index: u32) {
        let (prev, next) = {
            let slot = &mut self.slots[index as usize];
            assert!(slot.live, "destroying an already-dead triangle");
            slot.live = false;
            slot.gen += 1;
            (slot.prev, slot.next)
        };
        match prev {
            Some(p) => self.slots[p as usize].next = next,
            None => self.first_live = next,
        }
        if let Some(n) = next {
            self.slots[n as usize].prev = prev;
        }
        self.live_count -= 1;
        self.free.push(index);
    }
}

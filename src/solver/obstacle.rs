//! Neighbour-weight tables for cells on the surface of obstacles.
//!
//! A blocked cell that touches open fluid acts as a ghost cell: after every
//! solver pass its value is rewritten as a weighted sum of its open
//! neighbours. The weights encode the wall behaviour per field kind:
//! velocity normal to a wall bounces back scaled by `-wall_reflectivity`,
//! tangential velocity slides, scalars take the neighbour average.

use super::boundary::FieldType;

/// Target weight sum for a straight wall.
pub const VEL_WALL: f64 = 1.0;
/// Target weight sum for velocity at an outside (convex) corner.
pub const VEL_OUTSIDECORNER: f64 = 0.5;
/// Target weight sum for velocity at an inside (concave) corner.
pub const VEL_INSIDECORNER: f64 = 0.25;

/// One ghost cell and the open neighbours its value is rebuilt from.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeEntry {
    pub cell: usize,
    pub neighbors: Vec<(usize, f64)>,
}

impl EdgeEntry {
    fn split(cell: usize, open: &[usize], total: f64) -> Self {
        let neighbors = if open.is_empty() {
            Vec::new()
        } else {
            let w = total / open.len() as f64;
            open.iter().map(|&n| (n, w)).collect()
        };
        Self { cell, neighbors }
    }

    pub fn weight_sum(&self) -> f64 {
        self.neighbors.iter().map(|&(_, w)| w).sum()
    }

    #[inline]
    fn evaluate(&self, x: &[f64]) -> f64 {
        self.neighbors.iter().map(|&(n, w)| x[n] * w).sum()
    }
}

/// Cached obstacle analysis, rebuilt whenever obstacle geometry or wall
/// reflectivity changes.
#[derive(Clone, Debug, Default)]
pub struct ObstacleIndex {
    blocked_total: Vec<bool>,
    edges_x: Vec<EdgeEntry>,
    edges_y: Vec<EdgeEntry>,
    edges_other: Vec<EdgeEntry>,
    has_obstacles: bool,
}

impl ObstacleIndex {
    pub fn new(size: usize) -> Self {
        Self {
            blocked_total: vec![false; size],
            ..Self::default()
        }
    }

    /// Classify every blocked interior cell and rebuild the edge tables.
    /// Border cells are left to the boundary policy.
    pub fn rebuild(&mut self, blocked: &[bool], width: usize, height: usize, wall_reflectivity: f64) {
        self.blocked_total.clear();
        self.blocked_total.resize(blocked.len(), false);
        self.edges_x.clear();
        self.edges_y.clear();
        self.edges_other.clear();
        self.has_obstacles = false;

        let reflect = -wall_reflectivity;
        let open = |n: usize| !blocked[n];

        for y in 1..(height - 1) {
            for x in 1..(width - 1) {
                let k = y * width + x;
                if !blocked[k] {
                    continue;
                }
                self.has_obstacles = true;

                let n = k + width;
                let s = k - width;
                let e = k + 1;
                let w = k - 1;
                let (ne, nw, se, sw) = (n + 1, n - 1, s + 1, s - 1);

                if [n, s, e, w, ne, nw, se, sw].iter().all(|&c| blocked[c]) {
                    self.blocked_total[k] = true;
                    continue;
                }

                let (bn, bs, be, bw) = (blocked[n], blocked[s], blocked[e], blocked[w]);

                if bn && bs && !(be && bw) {
                    // Vertical wall: x is normal, y slides
                    let sides: Vec<usize> = [e, w].into_iter().filter(|&c| open(c)).collect();
                    self.edges_x.push(EdgeEntry::split(k, &sides, reflect * VEL_WALL));
                    self.edges_y.push(EdgeEntry::split(k, &sides, VEL_WALL));
                    self.edges_other.push(EdgeEntry::split(k, &sides, 1.0));
                } else if be && bw && !(bn && bs) {
                    // Horizontal wall: x slides, y is pinned to zero
                    let sides: Vec<usize> = [n, s].into_iter().filter(|&c| open(c)).collect();
                    self.edges_x.push(EdgeEntry::split(k, &sides, VEL_WALL));
                    self.edges_y.push(EdgeEntry { cell: k, neighbors: Vec::new() });
                    self.edges_other.push(EdgeEntry::split(k, &sides, 1.0));
                } else if bn && bs && be && bw {
                    // Inside corner: only diagonals can be open
                    let diags: Vec<usize> = [ne, nw, se, sw].into_iter().filter(|&c| open(c)).collect();
                    self.edges_x.push(EdgeEntry::split(k, &diags, reflect * VEL_INSIDECORNER));
                    self.edges_y.push(EdgeEntry::split(k, &diags, reflect * VEL_INSIDECORNER));
                    self.edges_other.push(EdgeEntry::split(k, &diags, 1.0));
                } else {
                    // Outside corner. A diagonal counts only when both of its
                    // orthogonals are open, otherwise the wall shadows it.
                    let mut near: Vec<usize> = [n, s, e, w].into_iter().filter(|&c| open(c)).collect();
                    for (d, a, b) in [(ne, n, e), (nw, n, w), (se, s, e), (sw, s, w)] {
                        if open(d) && open(a) && open(b) {
                            near.push(d);
                        }
                    }
                    self.edges_x.push(EdgeEntry::split(k, &near, reflect * VEL_OUTSIDECORNER));
                    self.edges_y.push(EdgeEntry::split(k, &near, reflect * VEL_OUTSIDECORNER));
                    self.edges_other.push(EdgeEntry::split(k, &near, 1.0));
                }
            }
        }

        log::debug!(
            "obstacle index rebuilt: {} edge cells, {} fully enclosed",
            self.edges_other.len(),
            self.blocked_total.iter().filter(|&&b| b).count()
        );
    }

    /// Rewrite every ghost cell of `x` from its open neighbours.
    pub fn apply(&self, field_type: FieldType, x: &mut [f64]) {
        let table = match field_type {
            FieldType::Vx => &self.edges_x,
            FieldType::Vy => &self.edges_y,
            FieldType::Layer | FieldType::Other => &self.edges_other,
        };
        for entry in table {
            x[entry.cell] = entry.evaluate(x);
        }
    }

    pub fn has_obstacles(&self) -> bool {
        self.has_obstacles
    }

    pub fn blocked_total(&self) -> &[bool] {
        &self.blocked_total
    }

    pub fn edges_x(&self) -> &[EdgeEntry] {
        &self.edges_x
    }

    pub fn edges_y(&self) -> &[EdgeEntry] {
        &self.edges_y
    }

    pub fn edges_other(&self) -> &[EdgeEntry] {
        &self.edges_other
    }
}

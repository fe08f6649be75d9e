//! External influence queued between updates.
//!
//! Callers record *deltas* here; `GridField::update()` flushes them once at
//! the start of the step and zeroes the buffers, so a burst of edits between
//! two frames lands as a single dose.

#[derive(Clone, Debug)]
pub(crate) struct PendingSources {
    layers: Vec<Vec<f64>>,
    vx: Vec<f64>,
    vy: Vec<f64>,
    touched: bool,
}

impl PendingSources {
    pub fn new(size: usize, num_layers: usize) -> Self {
        Self {
            layers: vec![vec![0.0; size]; num_layers],
            vx: vec![0.0; size],
            vy: vec![0.0; size],
            touched: false,
        }
    }

    /// Make `layer[k]` land on `target` after the flush. Overwrites any
    /// earlier request for the same cell.
    pub fn set_ink(&mut self, layer: usize, k: usize, target: f64, current: f64) {
        self.layers[layer][k] = target - current;
        self.touched = true;
    }

    /// Accumulate a velocity change; repeated calls sum.
    pub fn add_vel(&mut self, k: usize, dx: f64, dy: f64) {
        self.vx[k] += dx;
        self.vy[k] += dy;
        self.touched = true;
    }

    /// Make the velocity at `k` land on `(x, y)` after the flush. Overwrites
    /// anything queued for the cell so far.
    pub fn set_vel(&mut self, k: usize, x: f64, y: f64, current: (f64, f64)) {
        self.vx[k] = x - current.0;
        self.vy[k] = y - current.1;
        self.touched = true;
    }

    pub fn is_empty(&self) -> bool {
        !self.touched
    }

    /// Add queued ink deltas into the layers and clear them.
    pub fn flush_layers(&mut self, layers: &mut [Vec<f64>]) {
        for (layer, pending) in layers.iter_mut().zip(self.layers.iter_mut()) {
            for (v, d) in layer.iter_mut().zip(pending.iter_mut()) {
                *v += *d;
                *d = 0.0;
            }
        }
    }

    /// Add queued velocity deltas and clear them. Cells buried inside an
    /// obstacle are forced to rest instead.
    pub fn flush_velocity(&mut self, vx: &mut [f64], vy: &mut [f64], blocked_total: &[bool]) {
        for k in 0..vx.len() {
            if blocked_total[k] {
                vx[k] = 0.0;
                vy[k] = 0.0;
            } else {
                vx[k] += self.vx[k];
                vy[k] += self.vy[k];
            }
            self.vx[k] = 0.0;
            self.vy[k] = 0.0;
        }
        self.touched = false;
    }
}

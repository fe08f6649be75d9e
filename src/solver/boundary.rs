use std::str::FromStr;

use serde::Deserialize;

use super::obstacle::ObstacleIndex;
use crate::error::FieldError;

/// Inbound normal velocity at an open border is scaled by this instead of
/// being zeroed, which keeps inflow from feeding on itself.
pub const OPEN_INFLOW_DAMPING: f64 = 0.75;

/// Field type for boundary condition dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Vx,
    Vy,
    /// Passive ink layer.
    Layer,
    /// Pressure and divergence scratch fields.
    Other,
}

/// How the outer one-cell border of the grid behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    /// Reflective walls.
    #[default]
    Closed,
    /// Outflow passes freely, inflow is damped.
    Open,
    /// Toroidal topology: each edge continues at the opposite one.
    WrapAround,
}

impl TryFrom<u8> for BoundaryMode {
    type Error = FieldError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BoundaryMode::Closed),
            1 => Ok(BoundaryMode::Open),
            2 => Ok(BoundaryMode::WrapAround),
            other => Err(FieldError::InvalidState(format!("Unknown boundary mode: {}", other))),
        }
    }
}

impl FromStr for BoundaryMode {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "closed" => Ok(BoundaryMode::Closed),
            "open" => Ok(BoundaryMode::Open),
            "wrap_around" | "wraparound" | "wrap" => Ok(BoundaryMode::WrapAround),
            other => Err(FieldError::InvalidState(format!("Unknown boundary mode: {}", other))),
        }
    }
}

/// Everything a solver pass needs to know about the domain edges.
pub struct BoundaryConfig<'a> {
    pub mode: BoundaryMode,
    pub wall_reflectivity: f64,
    pub width: usize,
    pub height: usize,
    pub blocked: &'a [bool],
    pub obstacles: &'a ObstacleIndex,
}

impl BoundaryConfig<'_> {
    #[inline(always)]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }
}

type BorderFn = fn(&mut [f64], &BoundaryConfig);

/// Border handlers indexed by `[BoundaryMode][FieldType]`.
const BORDER_HANDLERS: [[BorderFn; 4]; 3] = [
    // Closed: Vx, Vy, Layer, Other
    [closed_vx, closed_vy, copy_scalar, copy_scalar],
    // Open
    [open_vx, open_vy, copy_scalar, copy_scalar],
    // WrapAround
    [wrap_velocity, wrap_velocity, wrap_layer, wrap_other],
];

fn border_handler(mode: BoundaryMode, field_type: FieldType) -> BorderFn {
    let m = match mode {
        BoundaryMode::Closed => 0,
        BoundaryMode::Open => 1,
        BoundaryMode::WrapAround => 2,
    };
    let f = match field_type {
        FieldType::Vx => 0,
        FieldType::Vy => 1,
        FieldType::Layer => 2,
        FieldType::Other => 3,
    };
    BORDER_HANDLERS[m][f]
}

/// Boundary condition handler.
/// Fills the one-cell border according to `bc.mode`, then rewrites the ghost
/// cells on obstacle surfaces from the obstacle tables.
pub fn set_bnd(field_type: FieldType, x: &mut [f64], bc: &BoundaryConfig) {
    border_handler(bc.mode, field_type)(x, bc);
    if bc.obstacles.has_obstacles() {
        bc.obstacles.apply(field_type, x);
    }
}

/// Fill the border (corners excluded) from the adjacent interior cell.
/// `side_x` maps the inner value for the left/right columns and `side_y` for
/// the bottom/top rows; the flag is true on the high side (right, top).
fn fill_from_inner(
    x: &mut [f64],
    bc: &BoundaryConfig,
    side_x: impl Fn(f64, bool) -> f64,
    side_y: impl Fn(f64, bool) -> f64,
) {
    let (w, h) = (bc.width, bc.height);
    for j in 1..(h - 1) {
        x[bc.idx(0, j)] = side_x(x[bc.idx(1, j)], false);
        x[bc.idx(w - 1, j)] = side_x(x[bc.idx(w - 2, j)], true);
    }
    for i in 1..(w - 1) {
        x[bc.idx(i, 0)] = side_y(x[bc.idx(i, 1)], false);
        x[bc.idx(i, h - 1)] = side_y(x[bc.idx(i, h - 2)], true);
    }
}

/// Each corner becomes the mean of its two border neighbours.
fn average_corners(x: &mut [f64], bc: &BoundaryConfig) {
    let (w, h) = (bc.width, bc.height);
    x[bc.idx(0, 0)] = 0.5 * (x[bc.idx(1, 0)] + x[bc.idx(0, 1)]);
    x[bc.idx(w - 1, 0)] = 0.5 * (x[bc.idx(w - 2, 0)] + x[bc.idx(w - 1, 1)]);
    x[bc.idx(0, h - 1)] = 0.5 * (x[bc.idx(1, h - 1)] + x[bc.idx(0, h - 2)]);
    x[bc.idx(w - 1, h - 1)] = 0.5 * (x[bc.idx(w - 2, h - 1)] + x[bc.idx(w - 1, h - 2)]);
}

fn closed_vx(x: &mut [f64], bc: &BoundaryConfig) {
    let r = bc.wall_reflectivity;
    fill_from_inner(x, bc, |v, _| -r * v, |v, _| v);
    average_corners(x, bc);
}

fn closed_vy(x: &mut [f64], bc: &BoundaryConfig) {
    let r = bc.wall_reflectivity;
    fill_from_inner(x, bc, |v, _| v, |v, _| -r * v);
    average_corners(x, bc);
}

fn copy_scalar(x: &mut [f64], bc: &BoundaryConfig) {
    fill_from_inner(x, bc, |v, _| v, |v, _| v);
    average_corners(x, bc);
}

/// Normal velocity at an open border: outward flow is copied, inward flow damped.
fn open_normal(v: f64, high_side: bool) -> f64 {
    let outward = if high_side { v > 0.0 } else { v < 0.0 };
    if outward {
        v
    } else {
        v * OPEN_INFLOW_DAMPING
    }
}

fn open_vx(x: &mut [f64], bc: &BoundaryConfig) {
    fill_from_inner(x, bc, open_normal, |v, _| v);
    average_corners(x, bc);
}

fn open_vy(x: &mut [f64], bc: &BoundaryConfig) {
    fill_from_inner(x, bc, |v, _| v, open_normal);
    average_corners(x, bc);
}

/// Copy each border cell from the interior cell next to the opposite edge.
fn wrap_edges(x: &mut [f64], bc: &BoundaryConfig) {
    let (w, h) = (bc.width, bc.height);
    for j in 1..(h - 1) {
        x[bc.idx(0, j)] = x[bc.idx(w - 2, j)];
        x[bc.idx(w - 1, j)] = x[bc.idx(1, j)];
    }
    for i in 1..(w - 1) {
        x[bc.idx(i, 0)] = x[bc.idx(i, h - 2)];
        x[bc.idx(i, h - 1)] = x[bc.idx(i, 1)];
    }
}

fn wrap_velocity(x: &mut [f64], bc: &BoundaryConfig) {
    let (w, h) = (bc.width, bc.height);
    wrap_edges(x, bc);
    x[bc.idx(0, 0)] = 0.5 * (x[bc.idx(w - 2, 0)] + x[bc.idx(0, h - 2)]);
    x[bc.idx(w - 1, 0)] = 0.5 * (x[bc.idx(1, 0)] + x[bc.idx(w - 1, h - 2)]);
    x[bc.idx(0, h - 1)] = 0.5 * (x[bc.idx(w - 2, h - 1)] + x[bc.idx(0, 1)]);
    x[bc.idx(w - 1, h - 1)] = 0.5 * (x[bc.idx(1, h - 1)] + x[bc.idx(w - 1, 1)]);
}

fn wrap_layer(x: &mut [f64], bc: &BoundaryConfig) {
    let (w, h) = (bc.width, bc.height);
    wrap_edges(x, bc);
    x[bc.idx(0, 0)] = x[bc.idx(w - 2, h - 2)];
    x[bc.idx(w - 1, 0)] = x[bc.idx(1, h - 2)];
    x[bc.idx(0, h - 1)] = x[bc.idx(w - 2, 1)];
    x[bc.idx(w - 1, h - 1)] = x[bc.idx(1, 1)];
}

// TODO: wrap these corners around as wrap_layer does; they still use the wall average.
fn wrap_other(x: &mut [f64], bc: &BoundaryConfig) {
    wrap_edges(x, bc);
    average_corners(x, bc);
}

use super::boundary::{set_bnd, BoundaryConfig, FieldType};

/// Grid spacing assumed by the pressure projection.
pub const PROJECT_H: f64 = 0.1;

/// SOR relaxation factor for iteration `i`.
/// Ramps linearly from 1.9 down to 1.5 over the first 60 iterations.
pub fn relaxation(i: usize) -> f64 {
    ((1.5 - 1.9) * i as f64 / 60.0 + 1.9).max(1.5)
}

/// Gauss-Seidel solver with successive over-relaxation.
/// Solves: x[i,j] = (x0[i,j] + a * (neighbors)) / c
/// Blocked cells are skipped; their values come from the boundary pass.
pub fn lin_solve(field_type: FieldType, x: &mut [f64], x0: &[f64], a: f64, c: f64, iter: usize, bc: &BoundaryConfig) {
    let c_inv = 1.0 / c;
    let w = bc.width;
    for n in 0..iter {
        let omega = relaxation(n);
        for j in 1..(bc.height - 1) {
            for i in 1..(w - 1) {
                let k = bc.idx(i, j);
                if bc.blocked[k] {
                    continue;
                }
                let neighbors = x[k - 1] + x[k + 1] + x[k - w] + x[k + w];
                let gs = (x0[k] + a * neighbors) * c_inv;
                x[k] += omega * (gs - x[k]);
            }
        }
        set_bnd(field_type, x, bc);
    }
}

/// Diffusion step: spreads the field over time.
/// a = dt * rate, c = 1 + 4a
pub fn diffuse(field_type: FieldType, x: &mut [f64], x0: &[f64], rate: f64, dt: f64, iter: usize, bc: &BoundaryConfig) {
    let a = rate * dt;
    let c = 1.0 + 4.0 * a;
    x.copy_from_slice(x0);
    lin_solve(field_type, x, x0, a, c, iter, bc);
}

/// Single-pass diffusion: one weighted average over the source neighbours.
/// Trades accuracy for speed; with periodic borders it conserves the
/// interior sum exactly.
pub fn diffuse_cheap(field_type: FieldType, x: &mut [f64], x0: &[f64], rate: f64, dt: f64, bc: &BoundaryConfig) {
    let a = rate * dt;
    let c_inv = 1.0 / (1.0 + 4.0 * a);
    let w = bc.width;
    x.copy_from_slice(x0);
    for j in 1..(bc.height - 1) {
        for i in 1..(w - 1) {
            let k = bc.idx(i, j);
            if bc.blocked[k] {
                continue;
            }
            let neighbors = x0[k - 1] + x0[k + 1] + x0[k - w] + x0[k + w];
            x[k] = (x0[k] + a * neighbors) * c_inv;
        }
    }
    set_bnd(field_type, x, bc);
}

/// Semi-Lagrangian advection: traces particles backwards through velocity field.
pub fn advect(field_type: FieldType, d: &mut [f64], d0: &[f64], vx: &[f64], vy: &[f64], dt: f64, bc: &BoundaryConfig) {
    let max_x = bc.width as f64 - 1.5;
    let max_y = bc.height as f64 - 1.5;

    for j in 1..(bc.height - 1) {
        for i in 1..(bc.width - 1) {
            let ii = bc.idx(i, j);
            if bc.blocked[ii] {
                continue;
            }
            // Trace backwards, keeping the 2x2 stencil inside the grid
            let x = (i as f64 - dt * vx[ii]).clamp(0.5, max_x);
            let y = (j as f64 - dt * vy[ii]).clamp(0.5, max_y);

            let i0 = x.floor() as usize;
            let i1 = i0 + 1;
            let j0 = y.floor() as usize;
            let j1 = j0 + 1;
            let s1 = x - i0 as f64;
            let s0 = 1.0 - s1;
            let t1 = y - j0 as f64;
            let t0 = 1.0 - t1;

            d[ii] = s0 * (t0 * d0[bc.idx(i0, j0)] + t1 * d0[bc.idx(i0, j1)])
                + s1 * (t0 * d0[bc.idx(i1, j0)] + t1 * d0[bc.idx(i1, j1)]);
        }
    }
    set_bnd(field_type, d, bc);
}

/// Pressure projection: enforces incompressibility (divergence-free velocity field).
/// `p` and `div` are scratch buffers and are fully overwritten.
pub fn project(vx: &mut [f64], vy: &mut [f64], p: &mut [f64], div: &mut [f64], iter: usize, bc: &BoundaryConfig) {
    let h = PROJECT_H;
    let w = bc.width;

    p.fill(0.0);
    div.fill(0.0);

    // Calculate divergence
    for j in 1..(bc.height - 1) {
        for i in 1..(w - 1) {
            let k = bc.idx(i, j);
            if bc.blocked[k] {
                continue;
            }
            div[k] = -0.5 * h * (vx[k + 1] - vx[k - 1] + vy[k + w] - vy[k - w]);
        }
    }
    set_bnd(FieldType::Other, div, bc);
    set_bnd(FieldType::Other, p, bc);

    // Solve for pressure
    lin_solve(FieldType::Other, p, div, 1.0, 4.0, iter, bc);

    // Subtract pressure gradient from velocity
    for j in 1..(bc.height - 1) {
        for i in 1..(w - 1) {
            let k = bc.idx(i, j);
            if bc.blocked[k] {
                continue;
            }
            vx[k] -= 0.5 * (p[k + 1] - p[k - 1]) / h;
            vy[k] -= 0.5 * (p[k + w] - p[k - w]) / h;
        }
    }
    set_bnd(FieldType::Vx, vx, bc);
    set_bnd(FieldType::Vy, vy, bc);
}

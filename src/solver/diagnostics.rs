/// Iterate interior cell indices (the one-cell border excluded).
fn interior(width: usize, height: usize) -> impl Iterator<Item = usize> {
    (1..height.saturating_sub(1)).flat_map(move |j| (1..width.saturating_sub(1)).map(move |i| j * width + i))
}

/// Total amount of ink in a layer, summed over interior cells.
/// Border cells are ghost copies and are not counted.
pub fn layer_mass(layer: &[f64], width: usize, height: usize) -> f64 {
    interior(width, height).map(|k| layer[k]).sum()
}

/// Compute mean kinetic energy over open interior cells: KE = 0.5 * <vx² + vy²>.
pub fn kinetic_energy(vx: &[f64], vy: &[f64], blocked: &[bool], width: usize, height: usize) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for k in interior(width, height).filter(|&k| !blocked[k]) {
        sum += vx[k] * vx[k] + vy[k] * vy[k];
        count += 1;
    }
    if count > 0 { 0.5 * sum / count as f64 } else { 0.0 }
}

/// Largest absolute central-difference divergence over open interior cells.
pub fn max_divergence(vx: &[f64], vy: &[f64], blocked: &[bool], width: usize, height: usize) -> f64 {
    interior(width, height)
        .filter(|&k| !blocked[k])
        .map(|k| (0.5 * (vx[k + 1] - vx[k - 1] + vy[k + width] - vy[k - width])).abs())
        .fold(0.0_f64, f64::max)
}

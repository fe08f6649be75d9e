use super::boundary::BoundaryMode;

pub const DIFFUSION_RANGE: (f64, f64) = (0.0, 1.0);
pub const VISCOSITY_RANGE: (f64, f64) = (0.0, 1.0);
pub const TIMESTEP_RANGE: (f64, f64) = (0.0, 100.0);
pub const WALL_REFLECTIVITY_RANGE: (f64, f64) = (0.0, 1.0);
pub const MAX_ITERATIONS: usize = 100;

/// Solver parameters for the fluid field.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverParams {
    pub diffusion_rate: f64,
    pub viscosity: f64,
    /// Vorticity confinement strength. Stored but not applied by `update()`.
    pub vorticity: f64,
    pub timestep: f64,
    pub iterations: usize,
    pub wall_reflectivity: f64,
    pub boundary_mode: BoundaryMode,
    pub cheap_diffusion: bool,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            diffusion_rate: 0.0,
            viscosity: 0.0,
            vorticity: 0.0,
            timestep: 1.0,
            iterations: 20,
            wall_reflectivity: 0.95,
            boundary_mode: BoundaryMode::Closed,
            cheap_diffusion: false,
        }
    }
}

fn clamp_range(v: f64, (lo, hi): (f64, f64)) -> f64 {
    if v.is_nan() {
        lo
    } else {
        v.clamp(lo, hi)
    }
}

impl SolverParams {
    /// Copy of these parameters with every tunable pulled into its valid range.
    /// NaN collapses to the lower bound.
    pub fn clamped(&self) -> Self {
        Self {
            diffusion_rate: clamp_range(self.diffusion_rate, DIFFUSION_RANGE),
            viscosity: clamp_range(self.viscosity, VISCOSITY_RANGE),
            vorticity: if self.vorticity.is_nan() { 0.0 } else { self.vorticity.max(0.0) },
            timestep: clamp_range(self.timestep, TIMESTEP_RANGE),
            iterations: self.iterations.min(MAX_ITERATIONS),
            wall_reflectivity: clamp_range(self.wall_reflectivity, WALL_REFLECTIVITY_RANGE),
            boundary_mode: self.boundary_mode,
            cheap_diffusion: self.cheap_diffusion,
        }
    }

    /// Velocity damping multiplier applied once per step: 1 / (visc*dt/20 + 1).
    pub fn damping_factor(&self) -> f64 {
        1.0 / (self.viscosity * self.timestep / 20.0 + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let p = SolverParams::default();
        assert_eq!(p.wall_reflectivity, 0.95);
        assert_eq!(p.boundary_mode, BoundaryMode::Closed);
        assert_eq!(p.iterations, 20);
        assert_eq!(p.timestep, 1.0);
        assert!(!p.cheap_diffusion);
        assert_eq!(p.vorticity, 0.0);
    }

    #[test]
    fn test_clamped_pulls_into_range() {
        let p = SolverParams {
            diffusion_rate: 2.0,
            viscosity: -1.0,
            vorticity: -3.0,
            timestep: 500.0,
            iterations: 1000,
            wall_reflectivity: f64::NAN,
            ..SolverParams::default()
        }
        .clamped();
        assert_eq!(p.diffusion_rate, 1.0);
        assert_eq!(p.viscosity, 0.0);
        assert_eq!(p.vorticity, 0.0);
        assert_eq!(p.timestep, 100.0);
        assert_eq!(p.iterations, MAX_ITERATIONS);
        assert_eq!(p.wall_reflectivity, 0.0);
    }

    #[test]
    fn test_damping_factor() {
        let p = SolverParams { viscosity: 0.5, timestep: 4.0, ..SolverParams::default() };
        // 1 / (0.5 * 4 / 20 + 1) = 1 / 1.1
        assert!((p.damping_factor() - 1.0 / 1.1).abs() < 1e-12);
        assert_eq!(SolverParams::default().damping_factor(), 1.0);
    }
}

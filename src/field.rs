use crate::error::{check_index, FieldError};
use crate::solver::{self, BoundaryMode, ObstacleIndex, SolverParams};
use crate::sources::PendingSources;

/// Smallest accepted width/height: one interior row or column plus the border.
pub const MIN_DIM: usize = 3;

/// Linear cell index for grid coordinates. Row `y = 0` is the bottom border.
#[inline(always)]
pub const fn cell_index(x: usize, y: usize, width: usize) -> usize {
    y * width + x
}

/// A fixed-size 2D fluid field with passive ink layers and obstacle cells.
///
/// Per-cell state is held as parallel flat arrays indexed by
/// [`cell_index`]. External edits (`set_ink`, `add_vel`, `set_vel`) are
/// queued and land at the start of the next [`update`](Self::update);
/// obstacle edits are picked up lazily by the same call.
pub struct GridField {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) vx: Vec<f64>,
    pub(crate) vy: Vec<f64>,
    pub(crate) vx_temp: Vec<f64>,
    pub(crate) vy_temp: Vec<f64>,
    pub(crate) layers: Vec<Vec<f64>>,
    pub(crate) layers_prev: Vec<Vec<f64>>,
    pub(crate) blocked: Vec<bool>,
    pub(crate) sources: PendingSources,
    pub(crate) obstacles: ObstacleIndex,
    obstacles_dirty: bool,
    pub(crate) params: SolverParams,
}

impl GridField {
    pub fn new(width: usize, height: usize, num_layers: usize) -> Result<Self, FieldError> {
        Self::new_with_params(width, height, num_layers, SolverParams::default())
    }

    pub fn new_with_params(
        width: usize,
        height: usize,
        num_layers: usize,
        params: SolverParams,
    ) -> Result<Self, FieldError> {
        if width < MIN_DIM || height < MIN_DIM {
            return Err(FieldError::InvalidArgument(format!(
                "grid must be at least {}x{}, got {}x{}",
                MIN_DIM, MIN_DIM, width, height
            )));
        }
        let size = width * height;
        Ok(Self {
            width,
            height,
            vx: vec![0.0; size],
            vy: vec![0.0; size],
            vx_temp: vec![0.0; size],
            vy_temp: vec![0.0; size],
            layers: vec![vec![0.0; size]; num_layers],
            layers_prev: vec![vec![0.0; size]; num_layers],
            blocked: vec![false; size],
            sources: PendingSources::new(size, num_layers),
            obstacles: ObstacleIndex::new(size),
            obstacles_dirty: true,
            params: params.clamped(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn cell_index(&self, x: usize, y: usize) -> usize {
        cell_index(x, y, self.width)
    }

    pub fn cell_coords(&self, k: usize) -> (usize, usize) {
        (k % self.width, k / self.width)
    }

    /// Queue ink so that `layer[k]` equals `value` once the next update
    /// applies its sources. The last call before the update wins.
    pub fn set_ink(&mut self, layer: usize, k: usize, value: f64) -> Result<(), FieldError> {
        check_index("layer", layer, self.layers.len())?;
        check_index("cell", k, self.cell_count())?;
        let current = self.layers[layer][k];
        self.sources.set_ink(layer, k, value, current);
        Ok(())
    }

    /// Queue a velocity change at `k`. Calls between updates add up.
    pub fn add_vel(&mut self, k: usize, dx: f64, dy: f64) -> Result<(), FieldError> {
        check_index("cell", k, self.cell_count())?;
        self.sources.add_vel(k, dx, dy);
        Ok(())
    }

    /// Queue the velocity at `k` to become `(x, y)`, replacing anything
    /// queued for the cell so far.
    pub fn set_vel(&mut self, k: usize, x: f64, y: f64) -> Result<(), FieldError> {
        check_index("cell", k, self.cell_count())?;
        let current = (self.vx[k], self.vy[k]);
        self.sources.set_vel(k, x, y, current);
        Ok(())
    }

    pub fn set_blocked_cell(&mut self, k: usize, is_blocked: bool) -> Result<(), FieldError> {
        check_index("cell", k, self.cell_count())?;
        self.blocked[k] = is_blocked;
        self.obstacles_dirty = true;
        Ok(())
    }

    /// Block or clear every cell in the inclusive rectangle `(x0, y0)..=(x1, y1)`.
    pub fn set_blocked_rect(
        &mut self,
        x0: usize,
        y0: usize,
        x1: usize,
        y1: usize,
        is_blocked: bool,
    ) -> Result<(), FieldError> {
        check_index("x", x0.max(x1), self.width)?;
        check_index("y", y0.max(y1), self.height)?;
        for y in y0.min(y1)..=y0.max(y1) {
            for x in x0.min(x1)..=x0.max(x1) {
                self.blocked[cell_index(x, y, self.width)] = is_blocked;
            }
        }
        self.obstacles_dirty = true;
        Ok(())
    }

    /// Advance the simulation by one timestep.
    pub fn update(&mut self) {
        solver::fluid_step(self);
    }

    /// Rebuild the obstacle tables if geometry or reflectivity changed.
    pub(crate) fn refresh_obstacles(&mut self) {
        if self.obstacles_dirty {
            self.obstacles
                .rebuild(&self.blocked, self.width, self.height, self.params.wall_reflectivity);
            self.obstacles_dirty = false;
        }
    }

    /// Current obstacle analysis, rebuilt first if it is stale.
    pub fn obstacle_index(&mut self) -> &ObstacleIndex {
        self.refresh_obstacles();
        &self.obstacles
    }

    pub fn is_obstacle_index_dirty(&self) -> bool {
        self.obstacles_dirty
    }

    pub fn velocity_x(&self) -> &[f64] {
        &self.vx
    }

    pub fn velocity_y(&self) -> &[f64] {
        &self.vy
    }

    pub fn layer(&self, i: usize) -> Result<&[f64], FieldError> {
        check_index("layer", i, self.layers.len())?;
        Ok(&self.layers[i])
    }

    pub fn blocked(&self) -> &[bool] {
        &self.blocked
    }

    /// Blocked cells with no open 8-neighbour.
    pub fn blocked_total(&mut self) -> &[bool] {
        self.obstacle_index().blocked_total()
    }

    pub fn has_obstacles(&self) -> bool {
        self.blocked.iter().any(|&b| b)
    }

    pub fn has_pending_sources(&self) -> bool {
        !self.sources.is_empty()
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    /// Replace all tunables at once. Values are clamped into range.
    pub fn set_params(&mut self, params: SolverParams) {
        let params = params.clamped();
        if params.wall_reflectivity != self.params.wall_reflectivity {
            self.obstacles_dirty = true;
        }
        self.params = params;
    }

    pub fn diffusion_rate(&self) -> f64 {
        self.params.diffusion_rate
    }

    pub fn set_diffusion_rate(&mut self, v: f64) {
        self.set_params(SolverParams { diffusion_rate: v, ..self.params.clone() });
    }

    pub fn viscosity(&self) -> f64 {
        self.params.viscosity
    }

    pub fn set_viscosity(&mut self, v: f64) {
        self.set_params(SolverParams { viscosity: v, ..self.params.clone() });
    }

    /// Stored for API compatibility; the update pipeline does not use it.
    pub fn vorticity(&self) -> f64 {
        self.params.vorticity
    }

    pub fn set_vorticity(&mut self, v: f64) {
        self.set_params(SolverParams { vorticity: v, ..self.params.clone() });
    }

    pub fn timestep(&self) -> f64 {
        self.params.timestep
    }

    pub fn set_timestep(&mut self, v: f64) {
        self.set_params(SolverParams { timestep: v, ..self.params.clone() });
    }

    pub fn iterations(&self) -> usize {
        self.params.iterations
    }

    pub fn set_iterations(&mut self, v: usize) {
        self.set_params(SolverParams { iterations: v, ..self.params.clone() });
    }

    pub fn wall_reflectivity(&self) -> f64 {
        self.params.wall_reflectivity
    }

    pub fn set_wall_reflectivity(&mut self, v: f64) {
        self.set_params(SolverParams { wall_reflectivity: v, ..self.params.clone() });
    }

    pub fn boundary_mode(&self) -> BoundaryMode {
        self.params.boundary_mode
    }

    pub fn set_boundary_mode(&mut self, mode: BoundaryMode) {
        self.params.boundary_mode = mode;
    }

    pub fn cheap_diffusion(&self) -> bool {
        self.params.cheap_diffusion
    }

    pub fn set_cheap_diffusion(&mut self, on: bool) {
        self.params.cheap_diffusion = on;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn still_field(w: usize, h: usize, layers: usize) -> GridField {
        GridField::new(w, h, layers).unwrap()
    }

    #[test]
    fn test_new_rejects_tiny_grid() {
        assert!(matches!(GridField::new(2, 10, 1), Err(FieldError::InvalidArgument(_))));
        assert!(matches!(GridField::new(10, 2, 1), Err(FieldError::InvalidArgument(_))));
        assert!(GridField::new(3, 3, 0).is_ok());
    }

    #[test]
    fn test_new_allocates_zeroed_arrays() {
        let f = still_field(8, 5, 3);
        assert_eq!(f.cell_count(), 40);
        assert_eq!(f.layer_count(), 3);
        assert_eq!(f.velocity_x().len(), 40);
        assert_eq!(f.velocity_y().len(), 40);
        assert_eq!(f.blocked().len(), 40);
        for i in 0..3 {
            let layer = f.layer(i).unwrap();
            assert_eq!(layer.len(), 40);
            assert!(layer.iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_cell_index_roundtrip() {
        let f = still_field(7, 4, 0);
        assert_eq!(f.cell_index(3, 2), 17);
        assert_eq!(f.cell_coords(17), (3, 2));
        assert_eq!(cell_index(6, 3, 7), f.cell_count() - 1);
    }

    #[test]
    fn test_out_of_range_indices() {
        let mut f = still_field(4, 4, 1);
        assert_eq!(
            f.set_ink(1, 0, 1.0),
            Err(FieldError::IndexOutOfRange { what: "layer", index: 1, len: 1 })
        );
        assert_eq!(
            f.set_ink(0, 16, 1.0),
            Err(FieldError::IndexOutOfRange { what: "cell", index: 16, len: 16 })
        );
        assert!(f.add_vel(16, 1.0, 0.0).is_err());
        assert!(f.set_vel(99, 1.0, 0.0).is_err());
        assert!(f.set_blocked_cell(16, true).is_err());
        assert!(f.layer(2).is_err());
        assert!(f.set_blocked_rect(0, 0, 4, 1, true).is_err());
    }

    #[test]
    fn test_set_ink_lands_exactly_without_motion() {
        let mut f = still_field(6, 6, 2);
        let k = f.cell_index(3, 3);
        f.set_ink(1, k, 0.75).unwrap();
        assert!(f.has_pending_sources());
        f.update();
        assert!(!f.has_pending_sources());
        assert_eq!(f.layer(1).unwrap()[k], 0.75);
        assert_eq!(f.layer(0).unwrap()[k], 0.0);

        // Absolute target, not an increment
        f.set_ink(1, k, 0.25).unwrap();
        f.update();
        assert_eq!(f.layer(1).unwrap()[k], 0.25);
    }

    #[test]
    fn test_blocked_cell_marks_index_dirty() {
        let mut f = still_field(6, 6, 0);
        f.update();
        assert!(!f.is_obstacle_index_dirty());
        f.set_blocked_cell(f.cell_index(2, 2), true).unwrap();
        assert!(f.is_obstacle_index_dirty());
        assert!(f.has_obstacles());
        f.update();
        assert!(!f.is_obstacle_index_dirty());
        assert!(f.obstacle_index().has_obstacles());
    }

    #[test]
    fn test_wall_reflectivity_change_marks_dirty() {
        let mut f = still_field(6, 6, 0);
        f.obstacle_index();
        f.set_wall_reflectivity(0.95);
        assert!(!f.is_obstacle_index_dirty(), "unchanged value keeps the cache");
        f.set_wall_reflectivity(0.5);
        assert!(f.is_obstacle_index_dirty());
        assert_eq!(f.wall_reflectivity(), 0.5);
    }

    #[test]
    fn test_setters_clamp() {
        let mut f = still_field(4, 4, 0);
        f.set_diffusion_rate(3.0);
        f.set_viscosity(-1.0);
        f.set_timestep(1000.0);
        f.set_iterations(5000);
        f.set_wall_reflectivity(7.0);
        assert_eq!(f.diffusion_rate(), 1.0);
        assert_eq!(f.viscosity(), 0.0);
        assert_eq!(f.timestep(), 100.0);
        assert_eq!(f.iterations(), 100);
        assert_eq!(f.wall_reflectivity(), 1.0);
        f.set_vorticity(2.5);
        assert_eq!(f.vorticity(), 2.5);
        f.set_boundary_mode(BoundaryMode::Open);
        assert_eq!(f.boundary_mode(), BoundaryMode::Open);
        f.set_cheap_diffusion(true);
        assert!(f.cheap_diffusion());
    }

    #[test]
    fn test_blocked_rect_and_total() {
        let mut f = still_field(9, 9, 1);
        f.set_blocked_rect(6, 6, 2, 2, true).unwrap();
        assert_eq!(f.blocked().iter().filter(|&&b| b).count(), 25);
        let total = f.blocked_total().iter().filter(|&&b| b).count();
        // 5x5 block leaves a 3x3 core with no open neighbour
        assert_eq!(total, 9);
        f.set_blocked_rect(2, 2, 6, 6, false).unwrap();
        assert!(!f.has_obstacles());
        assert_eq!(f.blocked_total().iter().filter(|&&b| b).count(), 0);
    }

    #[test]
    fn test_enclosed_obstacle_velocity_forced_to_rest() {
        let mut f = still_field(9, 9, 0);
        f.set_blocked_rect(2, 2, 6, 6, true).unwrap();
        let k = f.cell_index(4, 4);
        f.add_vel(k, 3.0, 3.0).unwrap();
        f.update();
        assert_eq!(f.velocity_x()[k], 0.0);
        assert_eq!(f.velocity_y()[k], 0.0);
    }
}

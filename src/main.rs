use std::path::PathBuf;

use fluidfield2d::config::{self, Config};
use fluidfield2d::solver::diagnostics::{kinetic_energy, layer_mass, max_divergence};
use fluidfield2d::{FieldError, GridField, SolverParams};

struct Defaults;

impl Defaults {
    /// Horizontal speed of the inflow jet, in cells per unit time.
    const JET_SPEED: f64 = 0.8;
    const INK_VALUE: f64 = 1.0;
}

/// `--config <path>` overrides the default `fluidfield.yaml` lookup.
fn config_path() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

/// Grid with a block obstacle in the middle of the right half.
fn build_scene(cfg: &Config) -> Result<GridField, FieldError> {
    let params = SolverParams::from(&cfg.physics);
    let mut field = GridField::new_with_params(cfg.grid.width, cfg.grid.height, cfg.grid.layers, params)?;

    let (w, h) = (field.width(), field.height());
    if w >= 12 && h >= 12 {
        let cx = w * 3 / 5;
        let cy = h / 2;
        let half = (w.min(h) / 8).max(1);
        field.set_blocked_rect(cx - half, cy - half, cx + half, cy + half, true)?;
    }
    Ok(field)
}

/// Feed the jet and paint each ink layer into its own band of rows.
fn stir(field: &mut GridField) -> Result<(), FieldError> {
    let (w, h) = (field.width(), field.height());
    let x = (w / 6).max(1);
    let layers = field.layer_count();
    let band = ((h - 2) / layers.max(1)).max(1);
    for y in 1..(h - 1) {
        let k = field.cell_index(x, y);
        field.set_vel(k, Defaults::JET_SPEED, 0.0)?;
        if layers > 0 {
            let layer = ((y - 1) / band).min(layers - 1);
            field.set_ink(layer, k, Defaults::INK_VALUE)?;
        }
    }
    Ok(())
}

fn run(cfg: &Config) -> Result<(), FieldError> {
    let mut field = build_scene(cfg)?;
    log::info!(
        "fluidfield2d: {}x{} grid, {} layers, {:?} boundary, {} steps",
        field.width(),
        field.height(),
        field.layer_count(),
        field.boundary_mode(),
        cfg.run.steps
    );

    let interval = cfg.run.log_interval.max(1);
    for step in 1..=cfg.run.steps {
        stir(&mut field)?;
        field.update();

        if step % interval == 0 || step == cfg.run.steps {
            let (w, h) = (field.width(), field.height());
            let ke = kinetic_energy(field.velocity_x(), field.velocity_y(), field.blocked(), w, h);
            let div = max_divergence(field.velocity_x(), field.velocity_y(), field.blocked(), w, h);
            let mut masses = Vec::with_capacity(field.layer_count());
            for i in 0..field.layer_count() {
                masses.push(layer_mass(field.layer(i)?, w, h));
            }
            log::info!("step {:>5}: KE={:.6e} max|div|={:.3e} ink={:.3?}", step, ke, div, masses);
            if !ke.is_finite() {
                log::warn!("velocity field blew up at step {}; try a smaller timestep", step);
                break;
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = match config_path() {
        Some(path) => config::load_from(&path),
        None => config::load(),
    };

    if let Err(e) = run(&cfg) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> Config {
        let mut cfg = Config::default();
        cfg.grid.width = 24;
        cfg.grid.height = 16;
        cfg.grid.layers = 2;
        cfg.run.steps = 5;
        cfg
    }

    #[test]
    fn test_build_scene_places_obstacle() {
        let field = build_scene(&small_config()).unwrap();
        assert!(field.has_obstacles());
        assert_eq!(field.layer_count(), 2);
    }

    #[test]
    fn test_build_scene_rejects_tiny_grid() {
        let mut cfg = small_config();
        cfg.grid.width = 2;
        assert!(matches!(build_scene(&cfg), Err(FieldError::InvalidArgument(_))));
    }

    #[test]
    fn test_pipeline_no_panic() {
        assert!(run(&small_config()).is_ok());
    }

    #[test]
    fn test_stir_feeds_every_layer() {
        let mut field = build_scene(&small_config()).unwrap();
        stir(&mut field).unwrap();
        field.update();
        let (w, h) = (field.width(), field.height());
        for i in 0..field.layer_count() {
            assert!(layer_mass(field.layer(i).unwrap(), w, h) > 0.0, "layer {} should receive ink", i);
        }
    }
}

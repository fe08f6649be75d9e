use std::path::Path;

use serde::Deserialize;

use crate::solver::{BoundaryMode, SolverParams};

pub const CONFIG_FILE: &str = "fluidfield.yaml";

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub grid: GridConfig,
    pub physics: PhysicsConfig,
    pub run: RunConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
    pub layers: usize,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    pub diffusion_rate: f64,
    pub viscosity: f64,
    pub vorticity: f64,
    pub timestep: f64,
    pub iterations: usize,
    pub wall_reflectivity: f64,
    pub boundary_mode: BoundaryMode,
    pub cheap_diffusion: bool,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    pub steps: usize,
    pub log_interval: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            physics: PhysicsConfig::default(),
            run: RunConfig::default(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 96,
            height: 64,
            layers: 3,
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        let p = SolverParams::default();
        Self {
            diffusion_rate: p.diffusion_rate,
            viscosity: p.viscosity,
            vorticity: p.vorticity,
            timestep: p.timestep,
            iterations: p.iterations,
            wall_reflectivity: p.wall_reflectivity,
            boundary_mode: p.boundary_mode,
            cheap_diffusion: p.cheap_diffusion,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: 200,
            log_interval: 20,
        }
    }
}

impl From<&PhysicsConfig> for SolverParams {
    fn from(p: &PhysicsConfig) -> Self {
        SolverParams {
            diffusion_rate: p.diffusion_rate,
            viscosity: p.viscosity,
            vorticity: p.vorticity,
            timestep: p.timestep,
            iterations: p.iterations,
            wall_reflectivity: p.wall_reflectivity,
            boundary_mode: p.boundary_mode,
            cheap_diffusion: p.cheap_diffusion,
        }
        .clamped()
    }
}

/// Load `fluidfield.yaml` from the working directory, falling back to defaults.
pub fn load() -> Config {
    load_from(Path::new(CONFIG_FILE))
}

/// Load a config file. A missing file yields defaults; an unreadable or
/// malformed one yields defaults with a warning.
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str(&contents) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("failed to parse {}: {e}; using defaults", path.display());
                Config::default()
            }
        },
        Err(e) => {
            log::warn!("failed to read {}: {e}; using defaults", path.display());
            Config::default()
        }
    }
}

//! Grid-based 2D incompressible fluid solver in the "stable fluids" family.
//!
//! A [`GridField`] owns velocity, any number of passive ink layers, and an
//! obstacle mask on a fixed `width x height` grid. Each call to
//! [`GridField::update`] applies queued edits, then diffuses, damps,
//! projects and advects the velocity, and finally diffuses and advects every
//! ink layer along the result.

pub mod config;
pub mod error;
pub mod field;
pub mod solver;
mod sources;

pub use error::FieldError;
pub use field::{cell_index, GridField, MIN_DIM};
pub use solver::{BoundaryMode, EdgeEntry, FieldType, ObstacleIndex, SolverParams};

//! Porosity fields from closed triangle meshes.
//!
//! This crate samples the signed distance of a mesh on a regular grid and
//! maps it to the material fields used for density-based design:
//!
//! - **porosity**: `0.5 * tanh(d / t) + 0.5`, a smooth step across the surface
//! - **multigrayscale**: `0` inside, `1` outside, a linear band near the surface
//! - **binary**: hard occupancy, `1` outside and `0` inside
//!
//! Distances are negative inside the mesh.
//!
//! # Overview
//!
//! 1. [`plan_grid`] derives grid geometry from the mesh bounds, per-face
//!    bounds factors and a cell count along one axis
//! 2. [`evaluate_distance_field`] samples the distance at every node
//! 3. [`FieldTransform`]s map the distances to material fields
//! 4. The fields are attached to a [`Grid`] and handed to [`GridSink`]s
//!
//! [`run_pipeline`] runs steps 1 to 3 and returns the assembled grid.
//!
//! # Example
//!
//! ```
//! use mesh_porosity::{CsvWriter, GridSink, PipelineParams, run_pipeline};
//! use mesh_sdf::SignedDistanceField;
//! use mesh_types::unit_cube;
//!
//! let sdf = SignedDistanceField::new(unit_cube())?;
//! let params = PipelineParams::default()
//!     .with_bounds_factor(mesh_porosity::BoundsFactor([1.5, 1.5, 1.5, 1.5, 1.5, 1.5]))
//!     .with_target_cells(8)
//!     .with_thickness(0.1);
//!
//! let grid = run_pipeline(&sdf, &params)?;
//! assert_eq!(grid.fields().len(), 4);
//!
//! let mut csv = CsvWriter::new(Vec::new());
//! csv.write_grid(&grid)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Execution
//!
//! Per-node work runs under an [`Execution`] strategy. Results are identical
//! for every strategy; only the wall time changes.

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
mod distance;
mod error;
mod exec;
mod field;
mod grid;
pub mod output;
mod pipeline;
mod transforms;

pub use config::PorosityConfig;
pub use distance::{SIGNED_DISTANCE, evaluate_distance_field};
pub use error::{
    ConfigError, ConfigResult, OutputError, OutputResult, PorosityError, PorosityResult,
};
pub use exec::Execution;
pub use field::{Grid, ScalarField};
pub use grid::{Axis, BoundsFactor, GridSpec, plan_grid, plan_grid_from_bounds};
pub use output::{CsvWriter, GridSink, VtiWriter};
pub use pipeline::{
    FieldKind, PipelineError, PipelineParams, PipelineStage, StageFailure, ThicknessUnits,
    run_pipeline, run_to_sinks, write_grid,
};
pub use transforms::{
    BINARY, BINARY_EPSILON, FieldTransform, MULTIGRAYSCALE, POROSITY, binary, binary_value,
    multigrayscale, multigrayscale_value, porosity, porosity_value,
};

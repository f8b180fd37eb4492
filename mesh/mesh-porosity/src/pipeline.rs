//! End-to-end field synthesis: plan, sample, transform, assemble.
//!
//! ```text
//! mesh bounds ─▶ plan_grid ─▶ evaluate_distance_field ─▶ transforms ─▶ Grid ─▶ sinks
//! ```
//!
//! Every stage either succeeds completely or aborts the run. Sinks only see a
//! grid once all requested fields exist.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use mesh_sdf::DistanceQuery;
use thiserror::Error;
use tracing::{info, warn};

use crate::distance::{SIGNED_DISTANCE, evaluate_distance_field};
use crate::error::{OutputError, PorosityError, PorosityResult};
use crate::exec::Execution;
use crate::field::Grid;
use crate::grid::{Axis, BoundsFactor, GridSpec, plan_grid};
use crate::output::GridSink;
use crate::transforms::{BINARY, FieldTransform, MULTIGRAYSCALE, POROSITY};

/// Unit the porosity thickness is given in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThicknessUnits {
    /// Mesh units.
    #[default]
    Absolute,
    /// Multiples of the grid spacing along x.
    Cells,
}

impl FromStr for ThicknessUnits {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "absolute" => Ok(Self::Absolute),
            "cells" => Ok(Self::Cells),
            other => Err(format!("expected `absolute` or `cells`, got `{other}`")),
        }
    }
}

/// A field the pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Sampled signed distance.
    SignedDistance,
    /// Smoothed porosity.
    Porosity,
    /// Three-band grayscale.
    Multigrayscale,
    /// Hard occupancy.
    Binary,
}

impl FieldKind {
    /// Default output: every field, porosity first.
    pub const DEFAULT_SET: [Self; 4] = [
        Self::Porosity,
        Self::SignedDistance,
        Self::Multigrayscale,
        Self::Binary,
    ];

    /// Name of the field on the grid.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SignedDistance => SIGNED_DISTANCE,
            Self::Porosity => POROSITY,
            Self::Multigrayscale => MULTIGRAYSCALE,
            Self::Binary => BINARY,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        [
            Self::SignedDistance,
            Self::Porosity,
            Self::Multigrayscale,
            Self::Binary,
        ]
        .into_iter()
        .find(|kind| kind.name().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unknown field `{s}`"))
    }
}

/// Parameters of one pipeline run.
///
/// # Example
///
/// ```
/// use mesh_porosity::{Axis, Execution, FieldKind, PipelineParams};
///
/// let params = PipelineParams::default()
///     .with_target_cells(32)
///     .with_axis(Axis::Z)
///     .with_thickness(0.05)
///     .with_fields(vec![FieldKind::Porosity])
///     .with_execution(Execution::Sequential);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineParams {
    /// Per-face bounding box multipliers.
    pub bounds_factor: BoundsFactor,
    /// Cells along the pitch axis.
    pub target_cells: usize,
    /// Axis the pitch is derived from.
    pub axis: Axis,
    /// Porosity transition thickness.
    pub thickness: f64,
    /// Unit of `thickness`.
    pub thickness_units: ThicknessUnits,
    /// Multigrayscale band half-width.
    pub delta: f64,
    /// Fields to attach, in output order.
    pub fields: Vec<FieldKind>,
    /// Scheduling of per-node work.
    pub execution: Execution,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            bounds_factor: BoundsFactor::default(),
            target_cells: 64,
            axis: Axis::X,
            thickness: 1.0,
            thickness_units: ThicknessUnits::Absolute,
            delta: 1.0,
            fields: FieldKind::DEFAULT_SET.to_vec(),
            execution: Execution::default(),
        }
    }
}

impl PipelineParams {
    /// Set the bounds factors.
    #[must_use]
    pub fn with_bounds_factor(mut self, bounds_factor: BoundsFactor) -> Self {
        self.bounds_factor = bounds_factor;
        self
    }

    /// Set the cell count along the pitch axis.
    #[must_use]
    pub fn with_target_cells(mut self, target_cells: usize) -> Self {
        self.target_cells = target_cells;
        self
    }

    /// Set the pitch axis.
    #[must_use]
    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }

    /// Set the porosity thickness in mesh units.
    #[must_use]
    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = thickness;
        self
    }

    /// Set the unit of the thickness.
    #[must_use]
    pub fn with_thickness_units(mut self, units: ThicknessUnits) -> Self {
        self.thickness_units = units;
        self
    }

    /// Set the multigrayscale band half-width.
    #[must_use]
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    /// Set the output fields.
    #[must_use]
    pub fn with_fields(mut self, fields: Vec<FieldKind>) -> Self {
        self.fields = fields;
        self
    }

    /// Set the execution strategy.
    #[must_use]
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    /// Thickness in mesh units for a planned grid.
    #[must_use]
    pub fn effective_thickness(&self, spec: &GridSpec) -> f64 {
        match self.thickness_units {
            ThicknessUnits::Absolute => self.thickness,
            ThicknessUnits::Cells => self.thickness * spec.spacing().x,
        }
    }

    /// Check everything that can be checked before planning the grid.
    ///
    /// # Errors
    ///
    /// [`PorosityError::InvalidParameter`] for an empty or repeated field
    /// list, or a bad thickness or delta for a requested transform.
    pub fn validate(&self) -> PorosityResult<()> {
        if self.fields.is_empty() {
            return Err(PorosityError::invalid_parameter(
                "fields",
                "at least one field must be requested",
            ));
        }
        for (i, kind) in self.fields.iter().enumerate() {
            if self.fields[..i].contains(kind) {
                return Err(PorosityError::invalid_parameter(
                    "fields",
                    format!("`{kind}` is requested twice"),
                ));
            }
        }
        if self.fields.contains(&FieldKind::Porosity) {
            FieldTransform::Porosity {
                thickness: self.thickness,
            }
            .validate()?;
        }
        if self.fields.contains(&FieldKind::Multigrayscale) {
            FieldTransform::Multigrayscale { delta: self.delta }.validate()?;
        }
        Ok(())
    }

    fn transform_for(&self, kind: FieldKind, spec: &GridSpec) -> Option<FieldTransform> {
        match kind {
            FieldKind::SignedDistance => None,
            FieldKind::Porosity => Some(FieldTransform::Porosity {
                thickness: self.effective_thickness(spec),
            }),
            FieldKind::Multigrayscale => Some(FieldTransform::Multigrayscale { delta: self.delta }),
            FieldKind::Binary => Some(FieldTransform::Binary),
        }
    }
}

/// The stage a pipeline run failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Parameter checks before any work.
    Parameters,
    /// Grid geometry derivation.
    GridPlanning,
    /// Signed distance sampling.
    DistanceField,
    /// One of the distance transforms.
    Transform(FieldKind),
    /// Attaching fields to the grid.
    Assembly,
    /// Handing the grid to a sink.
    Output,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameters => f.write_str("parameter validation"),
            Self::GridPlanning => f.write_str("grid planning"),
            Self::DistanceField => f.write_str("distance field"),
            Self::Transform(kind) => write!(f, "{kind} transform"),
            Self::Assembly => f.write_str("grid assembly"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Why a stage failed.
#[derive(Debug, Error)]
pub enum StageFailure {
    /// Planning, sampling or transform error.
    #[error(transparent)]
    Porosity(#[from] PorosityError),
    /// Sink error.
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// A failed pipeline run.
#[derive(Debug, Error)]
#[error("{stage} failed")]
pub struct PipelineError {
    /// Stage that failed.
    pub stage: PipelineStage,
    /// Underlying error.
    #[source]
    pub source: StageFailure,
}

impl PipelineError {
    fn at(stage: PipelineStage) -> impl FnOnce(PorosityError) -> Self {
        move |e| Self {
            stage,
            source: e.into(),
        }
    }
}

/// Build the grid and every requested field for `query`.
///
/// # Errors
///
/// A [`PipelineError`] naming the stage that failed. Nothing is returned on
/// failure, so no partial grid can reach a sink.
///
/// # Example
///
/// ```
/// use mesh_porosity::{FieldKind, PipelineParams, run_pipeline};
/// use mesh_sdf::SignedDistanceField;
/// use mesh_types::unit_cube;
///
/// let sdf = SignedDistanceField::new(unit_cube())?;
/// let params = PipelineParams::default()
///     .with_target_cells(4)
///     .with_fields(vec![FieldKind::Binary]);
///
/// let grid = run_pipeline(&sdf, &params)?;
/// assert_eq!(grid.spec().node_count(), 64);
/// // Every node lies inside the cube.
/// let binary = grid.field("binary").map(|f| f.values().to_vec());
/// assert_eq!(binary, Some(vec![0.0; 64]));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn run_pipeline<Q>(query: &Q, params: &PipelineParams) -> Result<Grid, PipelineError>
where
    Q: DistanceQuery + Sync + ?Sized,
{
    let run_start = Instant::now();
    params
        .validate()
        .map_err(PipelineError::at(PipelineStage::Parameters))?;

    let bounds = query.bounds();
    let spec = plan_grid(query, &params.bounds_factor, params.target_cells, params.axis)
        .map_err(PipelineError::at(PipelineStage::GridPlanning))?;
    log_grid_plan(&bounds.to_interleaved(), &spec);

    // One worker pool serves sampling and every transform.
    let grid = params
        .execution
        .install(|execution| build_fields(query, spec, params, execution))
        .map_err(PipelineError::at(PipelineStage::DistanceField))??;

    log_grid_details(grid.spec());
    info!(
        fields = ?grid.field_names().collect::<Vec<_>>(),
        elapsed_ms = run_start.elapsed().as_secs_f64() * 1000.0,
        "pipeline complete"
    );
    Ok(grid)
}

fn build_fields<Q>(
    query: &Q,
    spec: GridSpec,
    params: &PipelineParams,
    execution: Execution,
) -> Result<Grid, PipelineError>
where
    Q: DistanceQuery + Sync + ?Sized,
{
    let stage_start = Instant::now();
    let sdf = evaluate_distance_field(query, &spec, execution)
        .map_err(PipelineError::at(PipelineStage::DistanceField))?;
    info!(
        elapsed_ms = stage_start.elapsed().as_secs_f64() * 1000.0,
        "distance field complete"
    );

    let mut grid = Grid::new(spec);
    for &kind in &params.fields {
        let field = match params.transform_for(kind, grid.spec()) {
            Some(transform) => {
                let stage_start = Instant::now();
                let field = transform
                    .apply(grid.spec(), &sdf, execution)
                    .map_err(PipelineError::at(PipelineStage::Transform(kind)))?;
                info!(
                    %transform,
                    elapsed_ms = stage_start.elapsed().as_secs_f64() * 1000.0,
                    "transform complete"
                );
                field
            }
            // Later transforms still read the distances.
            None => sdf.clone(),
        };
        grid.attach(field)
            .map_err(PipelineError::at(PipelineStage::Assembly))?;
    }

    Ok(grid)
}

/// Hand a finished grid to each sink in turn.
///
/// # Errors
///
/// A [`PipelineError`] at [`PipelineStage::Output`] for the first sink that
/// fails; later sinks are not called.
pub fn write_grid(grid: &Grid, sinks: &mut [&mut dyn GridSink]) -> Result<(), PipelineError> {
    for sink in sinks.iter_mut() {
        sink.write_grid(grid).map_err(|e| PipelineError {
            stage: PipelineStage::Output,
            source: e.into(),
        })?;
    }
    Ok(())
}

/// Run the pipeline, then write the grid to every sink.
///
/// # Errors
///
/// See [`run_pipeline`] and [`write_grid`].
pub fn run_to_sinks<Q>(
    query: &Q,
    params: &PipelineParams,
    sinks: &mut [&mut dyn GridSink],
) -> Result<Grid, PipelineError>
where
    Q: DistanceQuery + Sync + ?Sized,
{
    let grid = run_pipeline(query, params)?;
    write_grid(&grid, sinks)?;
    Ok(grid)
}

fn log_grid_plan(bounds: &[f64; 6], spec: &GridSpec) {
    info!(
        original_bounds = ?bounds,
        expanded_bounds = ?spec.expanded_bounds(),
        mesh_pitch = spec.pitch(),
        "grid planned"
    );
    let [nx, ny, nz] = spec.dimensions();
    if nx.min(ny).min(nz) == 1 {
        warn!(dimensions = ?spec.dimensions(), "grid is a single node thick along one axis");
    }
}

fn log_grid_details(spec: &GridSpec) {
    let origin = spec.origin();
    let spacing = spec.spacing();
    info!(
        dimensions = ?spec.dimensions(),
        extent = ?spec.extent(),
        origin = ?[origin.x, origin.y, origin.z],
        spacing = ?[spacing.x, spacing.y, spacing.z],
        "output grid"
    );
}

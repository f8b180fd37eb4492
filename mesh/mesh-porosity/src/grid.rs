//! Grid planning: regular sampling grids derived from mesh bounds.
//!
//! The grid is laid out the way `stl2poro` has always done it:
//!
//! 1. Each face of the bounding box is scaled by its own factor
//!    (`expanded[i] = bounds[i] * factor[i]`). The scaling is
//!    multiplicative, so a factor of `1.1` on a face at `0.0` does nothing.
//! 2. The pitch is the expanded span along the pitch axis divided by the
//!    target cell count, and is reused for the other axes.
//! 3. The first node sits half a pitch inside the expanded minimum corner.
//! 4. The node count per axis is `round(span / pitch - 1) + 1`.
//! 5. The spacing per axis is `span / (span / pitch)`, without rounding, so
//!    boxes whose spans are not multiples of the pitch get slightly
//!    anisotropic spacing.

use std::fmt;

use mesh_sdf::DistanceQuery;
use nalgebra::{Point3, Vector3};
use tracing::{debug, warn};

use crate::error::{PorosityError, PorosityResult};

/// Per-face multipliers for the bounding box, in
/// `[xmin, xmax, ymin, ymax, zmin, zmax]` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsFactor(pub [f64; 6]);

impl Default for BoundsFactor {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl BoundsFactor {
    /// The same factor on every face.
    #[must_use]
    pub const fn uniform(factor: f64) -> Self {
        Self([factor; 6])
    }

    /// Apply the factors to interleaved bounds.
    #[must_use]
    pub fn apply(&self, bounds: [f64; 6]) -> [f64; 6] {
        std::array::from_fn(|i| bounds[i] * self.0[i])
    }
}

/// Coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    /// The x axis.
    #[default]
    X,
    /// The y axis.
    Y,
    /// The z axis.
    Z,
}

impl Axis {
    /// All axes in order.
    pub const ALL: [Self; 3] = [Self::X, Self::Y, Self::Z];

    /// Zero-based index of the axis.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

impl TryFrom<usize> for Axis {
    type Error = PorosityError;

    fn try_from(value: usize) -> PorosityResult<Self> {
        match value {
            0 => Ok(Self::X),
            1 => Ok(Self::Y),
            2 => Ok(Self::Z),
            other => Err(PorosityError::InvalidGridParameters(format!(
                "pitch axis must be 0, 1 or 2, got {other}"
            ))),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        };
        f.write_str(name)
    }
}

/// Geometry of a regular sampling grid.
///
/// Nodes are linearized with x varying fastest, then y, then z.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    origin: Point3<f64>,
    spacing: Vector3<f64>,
    dimensions: [usize; 3],
    pitch: f64,
    expanded_bounds: [f64; 6],
}

impl GridSpec {
    /// Position of the first node.
    #[must_use]
    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    /// Distance between neighbouring nodes along each axis.
    #[must_use]
    pub fn spacing(&self) -> Vector3<f64> {
        self.spacing
    }

    /// Node counts `[nx, ny, nz]`.
    #[must_use]
    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    /// Inclusive index extent `[0, nx-1, 0, ny-1, 0, nz-1]`.
    #[must_use]
    pub fn extent(&self) -> [usize; 6] {
        let [nx, ny, nz] = self.dimensions;
        [0, nx - 1, 0, ny - 1, 0, nz - 1]
    }

    /// Total number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.dimensions.iter().product()
    }

    /// Pitch derived from the pitch axis.
    #[must_use]
    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    /// Bounds after the per-face factors were applied, interleaved.
    #[must_use]
    pub fn expanded_bounds(&self) -> [f64; 6] {
        self.expanded_bounds
    }

    /// Linear index of node `(i, j, k)`.
    #[must_use]
    pub fn node_index(&self, i: usize, j: usize, k: usize) -> usize {
        let [nx, ny, _] = self.dimensions;
        i + nx * (j + ny * k)
    }

    /// Grid indices `(i, j, k)` of linear node `n`.
    #[must_use]
    pub fn node_coords(&self, n: usize) -> [usize; 3] {
        let [nx, ny, _] = self.dimensions;
        [n % nx, (n / nx) % ny, n / (nx * ny)]
    }

    /// World position of linear node `n`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn node_position(&self, n: usize) -> Point3<f64> {
        let [i, j, k] = self.node_coords(n);
        Point3::new(
            self.origin.x + i as f64 * self.spacing.x,
            self.origin.y + j as f64 * self.spacing.y,
            self.origin.z + k as f64 * self.spacing.z,
        )
    }
}

/// Plan the sampling grid for a mesh.
///
/// # Errors
///
/// Same as [`plan_grid_from_bounds`].
///
/// # Example
///
/// ```
/// use mesh_porosity::{Axis, BoundsFactor, plan_grid};
/// use mesh_sdf::SignedDistanceField;
/// use mesh_types::unit_cube;
///
/// let sdf = SignedDistanceField::new(unit_cube())?;
/// let spec = plan_grid(&sdf, &BoundsFactor::default(), 4, Axis::X)?;
/// assert_eq!(spec.dimensions(), [4, 4, 4]);
/// assert_eq!(spec.pitch(), 0.25);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn plan_grid<Q: DistanceQuery + ?Sized>(
    mesh: &Q,
    factor: &BoundsFactor,
    target_cells: usize,
    axis: Axis,
) -> PorosityResult<GridSpec> {
    plan_grid_from_bounds(mesh.bounds().to_interleaved(), factor, target_cells, axis)
}

/// Plan a sampling grid from interleaved bounds
/// `[xmin, xmax, ymin, ymax, zmin, zmax]`.
///
/// # Errors
///
/// [`PorosityError::InvalidGridParameters`] if `target_cells` is zero, any
/// expanded span is not a positive finite number, or the grid would have
/// more nodes than can be addressed.
#[allow(clippy::cast_precision_loss)]
pub fn plan_grid_from_bounds(
    bounds: [f64; 6],
    factor: &BoundsFactor,
    target_cells: usize,
    axis: Axis,
) -> PorosityResult<GridSpec> {
    if target_cells == 0 {
        return Err(PorosityError::InvalidGridParameters(
            "target cell count must be positive".into(),
        ));
    }

    let expanded = factor.apply(bounds);
    let mut spans = [0.0; 3];
    for a in Axis::ALL {
        let i = a.index();
        let before = bounds[2 * i + 1] - bounds[2 * i];
        let span = expanded[2 * i + 1] - expanded[2 * i];
        if !(span.is_finite() && span > 0.0) {
            return Err(PorosityError::InvalidGridParameters(format!(
                "expanded {a} span must be positive and finite, got {span} \
                 (bounds {} .. {}, factors {} {})",
                bounds[2 * i],
                bounds[2 * i + 1],
                factor.0[2 * i],
                factor.0[2 * i + 1],
            )));
        }
        if span < before {
            warn!(axis = %a, before, after = span, "bounds factors shrink the box");
        }
        spans[i] = span;
    }

    let pitch = spans[axis.index()] / target_cells as f64;
    let mut dimensions = [1usize; 3];
    let mut spacing = [0.0; 3];
    for i in 0..3 {
        let cell_dims = spans[i] / pitch;
        dimensions[i] = node_count(cell_dims)?;
        spacing[i] = spans[i] / cell_dims;
    }

    let total = dimensions
        .iter()
        .try_fold(1usize, |acc, &n| acc.checked_mul(n))
        .ok_or_else(|| {
            PorosityError::InvalidGridParameters(format!(
                "grid {dimensions:?} has too many nodes to address"
            ))
        })?;

    let half = pitch / 2.0;
    let spec = GridSpec {
        origin: Point3::new(expanded[0] + half, expanded[2] + half, expanded[4] + half),
        spacing: Vector3::from(spacing),
        dimensions,
        pitch,
        expanded_bounds: expanded,
    };
    debug!(?dimensions, nodes = total, pitch, "planned grid");
    Ok(spec)
}

/// `round(cell_dims - 1) + 1`, at least one node.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn node_count(cell_dims: f64) -> PorosityResult<usize> {
    let last = (cell_dims - 1.0).round();
    if last < 0.0 {
        return Ok(1);
    }
    // Truncation: checked against usize::MAX before the cast
    if !last.is_finite() || last >= usize::MAX as f64 {
        return Err(PorosityError::InvalidGridParameters(format!(
            "{cell_dims} cells along one axis is too many"
        )));
    }
    Ok(last as usize + 1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const CUBE: [f64; 6] = [-1.0, 1.0, -1.0, 1.0, -1.0, 1.0];

    #[test]
    fn symmetric_cube_ten_cells() {
        let spec = plan_grid_from_bounds(CUBE, &BoundsFactor::default(), 10, Axis::X).unwrap();
        assert_relative_eq!(spec.pitch(), 0.2, epsilon = 1e-12);
        let origin = spec.origin();
        assert_relative_eq!(origin.x, -0.9, epsilon = 1e-12);
        assert_relative_eq!(origin.y, -0.9, epsilon = 1e-12);
        assert_relative_eq!(origin.z, -0.9, epsilon = 1e-12);
        assert_eq!(spec.dimensions(), [10, 10, 10]);
        assert_eq!(spec.extent(), [0, 9, 0, 9, 0, 9]);
        assert_eq!(spec.node_count(), 1000);
    }

    #[test]
    fn offset_cube_pitch_from_z() {
        let bounds = [0.0, 2.0, 0.0, 2.0, 0.0, 2.0];
        let spec = plan_grid_from_bounds(bounds, &BoundsFactor::default(), 4, Axis::Z).unwrap();
        assert_eq!(spec.pitch(), 0.5);
        assert_eq!(spec.origin(), Point3::new(0.25, 0.25, 0.25));
        assert_eq!(spec.dimensions(), [4, 4, 4]);
        assert_eq!(spec.spacing(), Vector3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn factors_scale_each_face() {
        let factor = BoundsFactor([2.0, 2.0, 1.0, 1.0, 1.0, 1.0]);
        let spec = plan_grid_from_bounds(CUBE, &factor, 8, Axis::X).unwrap();
        assert_eq!(spec.expanded_bounds(), [-2.0, 2.0, -1.0, 1.0, -1.0, 1.0]);
        assert_eq!(spec.pitch(), 0.5);
        assert_eq!(spec.dimensions(), [8, 4, 4]);
    }

    #[test]
    fn non_multiple_span_gives_anisotropic_spacing() {
        // y span 1.3 with pitch 0.5 -> 2.6 cells -> round(1.6) + 1 = 3 nodes
        let bounds = [0.0, 2.0, 0.0, 1.3, 0.0, 2.0];
        let spec = plan_grid_from_bounds(bounds, &BoundsFactor::default(), 4, Axis::X).unwrap();
        assert_eq!(spec.dimensions(), [4, 3, 4]);
        assert_relative_eq!(spec.spacing().y, 0.5, epsilon = 1e-12);
        // spacing * unrounded cell count reproduces the span
        assert_relative_eq!(spec.spacing().y * (1.3 / spec.pitch()), 1.3, epsilon = 1e-12);
    }

    #[test]
    fn thin_axis_keeps_one_node() {
        let bounds = [0.0, 10.0, 0.0, 10.0, 0.0, 0.1];
        let spec = plan_grid_from_bounds(bounds, &BoundsFactor::default(), 10, Axis::X).unwrap();
        assert_eq!(spec.dimensions(), [10, 10, 1]);
    }

    #[test]
    fn rejects_bad_parameters() {
        let unit = BoundsFactor::default();
        assert!(matches!(
            plan_grid_from_bounds(CUBE, &unit, 0, Axis::X),
            Err(PorosityError::InvalidGridParameters(_))
        ));

        let flat = [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        assert!(matches!(
            plan_grid_from_bounds(flat, &unit, 4, Axis::X),
            Err(PorosityError::InvalidGridParameters(_))
        ));

        let inverted = BoundsFactor([1.0, -1.0, 1.0, 1.0, 1.0, 1.0]);
        assert!(matches!(
            plan_grid_from_bounds([0.0, 1.0, 0.0, 1.0, 0.0, 1.0], &inverted, 4, Axis::X),
            Err(PorosityError::InvalidGridParameters(_))
        ));

        let infinite = [0.0, f64::INFINITY, 0.0, 1.0, 0.0, 1.0];
        assert!(plan_grid_from_bounds(infinite, &unit, 4, Axis::Y).is_err());

        // Empty bounds (min > max) are rejected as well
        let empty = mesh_types::Aabb::empty().to_interleaved();
        assert!(plan_grid_from_bounds(empty, &unit, 4, Axis::X).is_err());
    }

    #[test]
    fn axis_from_index() {
        assert_eq!(Axis::try_from(2).unwrap(), Axis::Z);
        assert!(matches!(
            Axis::try_from(3),
            Err(PorosityError::InvalidGridParameters(_))
        ));
        assert_eq!(Axis::Y.to_string(), "y");
    }

    #[test]
    fn node_indexing_roundtrip() {
        let bounds = [0.0, 3.0, 0.0, 2.0, 0.0, 1.0];
        let spec = plan_grid_from_bounds(bounds, &BoundsFactor::default(), 3, Axis::X).unwrap();
        assert_eq!(spec.dimensions(), [3, 2, 1]);

        for n in 0..spec.node_count() {
            let [i, j, k] = spec.node_coords(n);
            assert_eq!(spec.node_index(i, j, k), n);
        }
        assert_eq!(spec.node_coords(4), [1, 1, 0]);
        assert_eq!(spec.node_position(4), Point3::new(1.5, 1.5, 0.5));
    }
}

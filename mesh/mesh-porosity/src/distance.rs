//! Signed distance sampling over a grid.

use std::time::Instant;

use mesh_sdf::DistanceQuery;
use tracing::{debug, info};

use crate::error::{PorosityError, PorosityResult};
use crate::exec::Execution;
use crate::field::ScalarField;
use crate::grid::GridSpec;

/// Name of the sampled distance field.
pub const SIGNED_DISTANCE: &str = "signedDistance";

/// Sample the signed distance at every node of `spec`.
///
/// Node `(i, j, k)` is evaluated at `origin + (i*dx, j*dy, k*dz)`. Values
/// are stored in node order and are identical for every [`Execution`].
///
/// The query runs on several threads at once under parallel execution,
/// which is what the `Sync` bound expresses. Wrap a query that cannot be
/// shared in [`SerializedQuery`](mesh_sdf::SerializedQuery).
///
/// # Errors
///
/// [`PorosityError::MeshQueryFailure`] naming the failing node, or
/// [`PorosityError::ThreadPool`].
///
/// # Example
///
/// ```
/// use mesh_porosity::{Axis, BoundsFactor, Execution, evaluate_distance_field, plan_grid};
/// use mesh_sdf::SignedDistanceField;
/// use mesh_types::unit_cube;
///
/// let sdf = SignedDistanceField::new(unit_cube())?;
/// let spec = plan_grid(&sdf, &BoundsFactor::uniform(1.0), 2, Axis::X)?;
/// let field = evaluate_distance_field(&sdf, &spec, Execution::Sequential)?;
///
/// // Every node of a 2x2x2 grid sits a quarter unit inside the cube.
/// assert!(field.values().iter().all(|d| (d + 0.25).abs() < 1e-12));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn evaluate_distance_field<Q>(
    query: &Q,
    spec: &GridSpec,
    execution: Execution,
) -> PorosityResult<ScalarField>
where
    Q: DistanceQuery + Sync + ?Sized,
{
    let nodes = spec.node_count();
    info!(
        nodes,
        workers = execution.worker_count(),
        "sampling signed distance"
    );
    let start = Instant::now();

    let values = execution.map_nodes(nodes, |n| {
        query
            .closest_signed_distance(spec.node_position(n))
            .map_err(|source| PorosityError::MeshQueryFailure { node: n, source })
    })?;

    debug!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "distance sampling finished"
    );
    Ok(ScalarField::new(SIGNED_DISTANCE, values))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::grid::{Axis, BoundsFactor, plan_grid_from_bounds};
    use mesh_sdf::{SdfError, SdfResult, SerializedQuery};
    use mesh_types::Aabb;
    use nalgebra::Point3;
    use std::cell::Cell;

    /// Half-space `x < 0` with a hole at one node.
    struct HalfSpace {
        broken_at: Option<Point3<f64>>,
    }

    impl DistanceQuery for HalfSpace {
        fn bounds(&self) -> Aabb {
            Aabb::from_interleaved([-1.0, 1.0, -1.0, 1.0, -1.0, 1.0])
        }

        fn closest_signed_distance(&self, point: Point3<f64>) -> SdfResult<f64> {
            if self.broken_at == Some(point) {
                return Err(SdfError::query_failed(&point, "no surface here"));
            }
            Ok(point.x)
        }
    }

    /// Counts its calls, so it is not `Sync`.
    struct Counting {
        calls: Cell<usize>,
    }

    impl DistanceQuery for Counting {
        fn bounds(&self) -> Aabb {
            Aabb::from_interleaved([-1.0, 1.0, -1.0, 1.0, -1.0, 1.0])
        }

        fn closest_signed_distance(&self, point: Point3<f64>) -> SdfResult<f64> {
            self.calls.set(self.calls.get() + 1);
            Ok(point.y)
        }
    }

    fn spec() -> GridSpec {
        let bounds = [-1.0, 1.0, -1.0, 1.0, -1.0, 1.0];
        plan_grid_from_bounds(bounds, &BoundsFactor::default(), 4, Axis::X).unwrap()
    }

    #[test]
    fn values_follow_node_order() {
        let spec = spec();
        let field =
            evaluate_distance_field(&HalfSpace { broken_at: None }, &spec, Execution::Sequential)
                .unwrap();
        assert_eq!(field.name(), SIGNED_DISTANCE);
        assert_eq!(field.len(), 64);
        // x varies fastest
        assert_eq!(&field.values()[..4], &[-0.75, -0.25, 0.25, 0.75]);
        assert_eq!(&field.values()[4..8], &[-0.75, -0.25, 0.25, 0.75]);
    }

    #[test]
    fn failure_names_the_node() {
        let spec = spec();
        let query = HalfSpace {
            broken_at: Some(spec.node_position(17)),
        };
        for exec in [Execution::Sequential, Execution::Parallel { threads: 2 }] {
            match evaluate_distance_field(&query, &spec, exec) {
                Err(PorosityError::MeshQueryFailure { node, source }) => {
                    assert_eq!(node, 17);
                    assert!(matches!(source, SdfError::QueryFailed { .. }));
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[test]
    fn serialized_query_runs_in_parallel_executor() {
        let spec = spec();
        let query = SerializedQuery::new(Counting {
            calls: Cell::new(0),
        });
        let parallel =
            evaluate_distance_field(&query, &spec, Execution::Parallel { threads: 4 }).unwrap();
        assert_eq!(query.into_inner().calls.get(), 64);

        let sequential = evaluate_distance_field(
            &SerializedQuery::new(Counting {
                calls: Cell::new(0),
            }),
            &spec,
            Execution::Sequential,
        )
        .unwrap();
        assert_eq!(parallel, sequential);
    }
}

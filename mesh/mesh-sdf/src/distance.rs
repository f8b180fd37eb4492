//! The signed distance interface grid samplers evaluate.
//!
//! Anything that can report a bounding box and a closest signed distance can
//! be voxelized. Implementors that are `Sync` may be queried from many
//! threads at once; a query that keeps mutable state internally (a cache, a
//! foreign handle) wraps itself in [`SerializedQuery`] instead, which makes
//! it `Sync` by running one query at a time.

use std::sync::Arc;

use mesh_types::Aabb;
use nalgebra::Point3;
use parking_lot::Mutex;

use crate::error::{SdfError, SdfResult};
use crate::sdf::SignedDistanceField;

/// A surface that answers closest signed distance queries.
///
/// Distances are negative inside, positive outside.
pub trait DistanceQuery {
    /// Axis-aligned bounds of the surface.
    fn bounds(&self) -> Aabb;

    /// Signed distance from `point` to the closest point of the surface.
    ///
    /// # Errors
    ///
    /// Implementations return [`SdfError::QueryFailed`] when no finite
    /// distance can be produced.
    fn closest_signed_distance(&self, point: Point3<f64>) -> SdfResult<f64>;
}

impl DistanceQuery for SignedDistanceField {
    fn bounds(&self) -> Aabb {
        SignedDistanceField::bounds(self)
    }

    fn closest_signed_distance(&self, point: Point3<f64>) -> SdfResult<f64> {
        if !(point.x.is_finite() && point.y.is_finite() && point.z.is_finite()) {
            return Err(SdfError::query_failed(&point, "query point is not finite"));
        }
        let distance = self.distance(point);
        if distance.is_finite() {
            Ok(distance)
        } else {
            Err(SdfError::query_failed(&point, "distance is not finite"))
        }
    }
}

impl<Q: DistanceQuery + ?Sized> DistanceQuery for &Q {
    fn bounds(&self) -> Aabb {
        (**self).bounds()
    }

    fn closest_signed_distance(&self, point: Point3<f64>) -> SdfResult<f64> {
        (**self).closest_signed_distance(point)
    }
}

impl<Q: DistanceQuery + ?Sized> DistanceQuery for Arc<Q> {
    fn bounds(&self) -> Aabb {
        (**self).bounds()
    }

    fn closest_signed_distance(&self, point: Point3<f64>) -> SdfResult<f64> {
        (**self).closest_signed_distance(point)
    }
}

/// Serializes every call into a query that is not safe to share.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
///
/// use mesh_sdf::{DistanceQuery, SdfResult, SerializedQuery};
/// use mesh_types::Aabb;
/// use nalgebra::Point3;
///
/// /// A plane at z = 0 that counts its queries.
/// struct CountingPlane {
///     calls: Cell<usize>,
/// }
///
/// impl DistanceQuery for CountingPlane {
///     fn bounds(&self) -> Aabb {
///         Aabb::from_interleaved([-1.0, 1.0, -1.0, 1.0, 0.0, 0.0])
///     }
///
///     fn closest_signed_distance(&self, point: Point3<f64>) -> SdfResult<f64> {
///         self.calls.set(self.calls.get() + 1);
///         Ok(point.z)
///     }
/// }
///
/// let shared = SerializedQuery::new(CountingPlane { calls: Cell::new(0) });
/// assert_eq!(shared.closest_signed_distance(Point3::new(0.0, 0.0, 2.0))?, 2.0);
/// assert_eq!(shared.into_inner().calls.get(), 1);
/// # Ok::<(), mesh_sdf::SdfError>(())
/// ```
#[derive(Debug)]
pub struct SerializedQuery<Q> {
    inner: Mutex<Q>,
    bounds: Aabb,
}

impl<Q: DistanceQuery> SerializedQuery<Q> {
    /// Wrap `query`, caching its bounds.
    pub fn new(query: Q) -> Self {
        let bounds = query.bounds();
        Self {
            inner: Mutex::new(query),
            bounds,
        }
    }

    /// Unwrap the inner query.
    pub fn into_inner(self) -> Q {
        self.inner.into_inner()
    }
}

impl<Q: DistanceQuery> DistanceQuery for SerializedQuery<Q> {
    fn bounds(&self) -> Aabb {
        self.bounds
    }

    fn closest_signed_distance(&self, point: Point3<f64>) -> SdfResult<f64> {
        self.inner.lock().closest_signed_distance(point)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use mesh_types::unit_cube;
    use std::cell::RefCell;

    /// Records every point it is asked about.
    struct Recorder {
        seen: RefCell<Vec<Point3<f64>>>,
    }

    impl DistanceQuery for Recorder {
        fn bounds(&self) -> Aabb {
            Aabb::from_interleaved([0.0, 1.0, 0.0, 1.0, 0.0, 1.0])
        }

        fn closest_signed_distance(&self, point: Point3<f64>) -> SdfResult<f64> {
            self.seen.borrow_mut().push(point);
            Ok(point.x)
        }
    }

    fn assert_sync<T: Sync>(_: &T) {}

    #[test]
    fn field_rejects_non_finite_point() {
        let sdf = SignedDistanceField::new(unit_cube()).unwrap();
        let err = sdf
            .closest_signed_distance(Point3::new(f64::NAN, 0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, SdfError::QueryFailed { .. }));
        assert!(err.to_string().contains("not finite"));
    }

    #[test]
    fn field_query_matches_distance() {
        let sdf = SignedDistanceField::new(unit_cube()).unwrap();
        let p = Point3::new(0.5, 0.5, 2.0);
        assert_eq!(sdf.closest_signed_distance(p).unwrap(), sdf.distance(p));
        assert_eq!(DistanceQuery::bounds(&sdf), unit_cube_bounds());
    }

    #[test]
    fn serialized_query_is_sync_and_forwards() {
        let serialized = SerializedQuery::new(Recorder {
            seen: RefCell::new(Vec::new()),
        });
        assert_sync(&serialized);

        std::thread::scope(|scope| {
            for i in 0..4 {
                let serialized = &serialized;
                scope.spawn(move || {
                    let x = f64::from(i);
                    assert_eq!(
                        serialized
                            .closest_signed_distance(Point3::new(x, 0.0, 0.0))
                            .unwrap(),
                        x
                    );
                });
            }
        });

        assert_eq!(serialized.bounds(), unit_cube_bounds());
        assert_eq!(serialized.into_inner().seen.into_inner().len(), 4);
    }

    #[test]
    fn shared_references_are_queries() {
        let sdf = Arc::new(SignedDistanceField::new(unit_cube()).unwrap());
        let by_arc = sdf.closest_signed_distance(Point3::new(0.5, 0.5, 0.5));
        let by_ref = (&*sdf).closest_signed_distance(Point3::new(0.5, 0.5, 0.5));
        assert_eq!(by_arc.unwrap(), by_ref.unwrap());
    }

    fn unit_cube_bounds() -> Aabb {
        Aabb::from_interleaved([0.0, 1.0, 0.0, 1.0, 0.0, 1.0])
    }
}

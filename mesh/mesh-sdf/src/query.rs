//! Point-triangle closest point queries.

use nalgebra::Point3;

/// The part of a triangle a closest point lies on.
///
/// Corners and edges are numbered after the triangle's vertex order:
/// edge `i` runs from corner `i` to corner `(i + 1) % 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriangleFeature {
    /// Strictly inside the face.
    Face,
    /// On edge `i`, excluding its end points.
    Edge(u8),
    /// Exactly at corner `i`.
    Vertex(u8),
}

/// Compute the closest point on a triangle to a query point.
///
/// This implements the Voronoi-region walk from "Real-Time Collision
/// Detection" by Christer Ericson.
///
/// # Example
///
/// ```
/// use mesh_sdf::closest_point_on_triangle;
/// use nalgebra::Point3;
///
/// let closest = closest_point_on_triangle(
///     Point3::new(0.25, 0.25, 3.0),
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// );
/// assert_eq!(closest, Point3::new(0.25, 0.25, 0.0));
/// ```
#[must_use]
pub fn closest_point_on_triangle(
    point: Point3<f64>,
    v0: Point3<f64>,
    v1: Point3<f64>,
    v2: Point3<f64>,
) -> Point3<f64> {
    closest_point_on_triangle_with_feature(point, v0, v1, v2).0
}

/// Closest point on a triangle, together with the feature it lies on.
///
/// The feature decides which pseudo-normal gives the inside/outside sign.
/// The triangle must not be degenerate.
#[must_use]
pub fn closest_point_on_triangle_with_feature(
    point: Point3<f64>,
    v0: Point3<f64>,
    v1: Point3<f64>,
    v2: Point3<f64>,
) -> (Point3<f64>, TriangleFeature) {
    let ab = v1 - v0;
    let ac = v2 - v0;
    let ap = point - v0;

    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (v0, TriangleFeature::Vertex(0));
    }

    let bp = point - v1;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return (v1, TriangleFeature::Vertex(1));
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let t = d1 / (d1 - d3);
        return (v0 + ab * t, TriangleFeature::Edge(0));
    }

    let cp = point - v2;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return (v2, TriangleFeature::Vertex(2));
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let t = d2 / (d2 - d6);
        return (v0 + ac * t, TriangleFeature::Edge(2));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let t = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return (v1 + (v2 - v1) * t, TriangleFeature::Edge(1));
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    (v0 + ab * v + ac * w, TriangleFeature::Face)
}

//! Signed distance to a triangle mesh.
//!
//! The magnitude is the exact Euclidean distance to the closest triangle.
//! The sign comes from the angle-weighted pseudo-normal of the feature the
//! closest point lies on (Bærentzen & Aanæs, 2005): the face normal for a
//! face interior, the sum of the adjacent face normals for an edge, and the
//! incident-angle-weighted sum for a vertex. On a closed, consistently wound
//! mesh this classifies every point correctly, including points whose
//! closest feature is a sharp edge or corner.

use std::collections::HashMap;

use mesh_types::{Aabb, IndexedMesh, MeshBounds};
use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::error::{SdfError, SdfResult};
use crate::query::{TriangleFeature, closest_point_on_triangle_with_feature};

/// A non-degenerate face with its sign normals.
#[derive(Debug, Clone)]
struct Triangle {
    corners: [Point3<f64>; 3],
    indices: [u32; 3],
    normal: Vector3<f64>,
    /// Edge `i` joins corner `i` and corner `(i + 1) % 3`.
    edge_normals: [Vector3<f64>; 3],
}

/// Closest-feature hit for one query point.
#[derive(Debug, Clone, Copy)]
struct Nearest {
    triangle: usize,
    point: Point3<f64>,
    feature: TriangleFeature,
    distance_sq: f64,
}

/// A signed distance field for a mesh.
///
/// Building the field welds the mesh and precomputes every pseudo-normal, so
/// each query is a single linear scan over the triangles. The field is
/// immutable afterwards and can be queried from many threads at once.
#[derive(Debug, Clone)]
pub struct SignedDistanceField {
    mesh: IndexedMesh,
    triangles: Vec<Triangle>,
    vertex_normals: Vec<Vector3<f64>>,
    bounds: Aabb,
}

impl SignedDistanceField {
    /// Create a new signed distance field from a mesh.
    ///
    /// Exactly coincident vertices are merged first so that STL triangle
    /// soup gets proper edge and vertex normals. Zero-area faces are skipped.
    ///
    /// # Errors
    ///
    /// - [`SdfError::EmptyMesh`] if the mesh has no faces.
    /// - [`SdfError::InvalidFaceIndex`] if a face references a missing vertex.
    /// - [`SdfError::DegenerateMesh`] if every face has zero area.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_sdf::SignedDistanceField;
    /// use mesh_types::unit_cube;
    ///
    /// let sdf = SignedDistanceField::new(unit_cube())?;
    /// assert_eq!(sdf.triangle_count(), 12);
    /// # Ok::<(), mesh_sdf::SdfError>(())
    /// ```
    pub fn new(mesh: IndexedMesh) -> SdfResult<Self> {
        if mesh.faces.is_empty() {
            return Err(SdfError::EmptyMesh);
        }
        let vertex_count = mesh.vertices.len();
        if let Some((face, index)) = mesh.faces.iter().enumerate().find_map(|(face, indices)| {
            indices
                .iter()
                .find(|&&i| i as usize >= vertex_count)
                .map(|&i| (face, i))
        }) {
            return Err(SdfError::InvalidFaceIndex {
                face,
                index,
                vertex_count,
            });
        }

        let mesh = mesh.welded();
        let mut triangles = Vec::with_capacity(mesh.faces.len());
        let mut vertex_normals = vec![Vector3::zeros(); mesh.vertices.len()];
        let mut edge_sums: HashMap<(u32, u32), Vector3<f64>> = HashMap::new();

        for face_index in 0..mesh.faces.len() {
            let Some(corners) = mesh.face_positions(face_index) else {
                continue;
            };
            let Some(normal) = unit_normal(&corners) else {
                continue;
            };
            let indices = mesh.faces[face_index];

            for corner in 0..3 {
                let here = corners[corner];
                let next = corners[(corner + 1) % 3];
                let prev = corners[(corner + 2) % 3];
                let angle = (next - here).angle(&(prev - here));
                vertex_normals[indices[corner] as usize] += normal * angle;

                *edge_sums
                    .entry(edge_key(indices[corner], indices[(corner + 1) % 3]))
                    .or_insert_with(Vector3::zeros) += normal;
            }

            triangles.push(Triangle {
                corners,
                indices,
                normal,
                edge_normals: [Vector3::zeros(); 3],
            });
        }

        if triangles.is_empty() {
            return Err(SdfError::DegenerateMesh {
                faces: mesh.faces.len(),
            });
        }

        for triangle in &mut triangles {
            for edge in 0..3 {
                let key = edge_key(triangle.indices[edge], triangle.indices[(edge + 1) % 3]);
                if let Some(sum) = edge_sums.get(&key) {
                    triangle.edge_normals[edge] = *sum;
                }
            }
        }

        debug!(
            faces = mesh.faces.len(),
            triangles = triangles.len(),
            skipped = mesh.faces.len() - triangles.len(),
            welded_vertices = mesh.vertices.len(),
            "built signed distance field"
        );

        let bounds = mesh.bounds();
        Ok(Self {
            mesh,
            triangles,
            vertex_normals,
            bounds,
        })
    }

    /// Query the signed distance at a point.
    ///
    /// Negative inside the mesh, positive outside, zero on the surface.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_sdf::SignedDistanceField;
    /// use mesh_types::unit_cube;
    /// use nalgebra::Point3;
    ///
    /// let sdf = SignedDistanceField::new(unit_cube())?;
    /// assert!((sdf.distance(Point3::new(0.5, 0.5, 0.5)) + 0.5).abs() < 1e-12);
    /// assert!((sdf.distance(Point3::new(0.5, 0.5, 3.0)) - 2.0).abs() < 1e-12);
    /// # Ok::<(), mesh_sdf::SdfError>(())
    /// ```
    #[must_use]
    pub fn distance(&self, point: Point3<f64>) -> f64 {
        let nearest = self.nearest(point);
        if nearest.distance_sq <= 0.0 {
            return 0.0;
        }
        let distance = nearest.distance_sq.sqrt();

        let pseudo_normal = self.pseudo_normal(&nearest);
        if (point - nearest.point).dot(&pseudo_normal) < 0.0 {
            -distance
        } else {
            distance
        }
    }

    /// Query the unsigned distance at a point.
    #[must_use]
    pub fn unsigned_distance(&self, point: Point3<f64>) -> f64 {
        self.nearest(point).distance_sq.sqrt()
    }

    /// Closest point on the mesh surface.
    #[must_use]
    pub fn closest_point(&self, point: Point3<f64>) -> Point3<f64> {
        self.nearest(point).point
    }

    /// Check whether a point lies strictly inside the mesh.
    #[must_use]
    pub fn is_inside(&self, point: Point3<f64>) -> bool {
        self.distance(point) < 0.0
    }

    /// The welded mesh the field was built from.
    #[must_use]
    pub fn mesh(&self) -> &IndexedMesh {
        &self.mesh
    }

    /// Bounding box of the mesh.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Number of non-degenerate triangles taking part in queries.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    fn nearest(&self, point: Point3<f64>) -> Nearest {
        let mut best = Nearest {
            triangle: 0,
            point,
            feature: TriangleFeature::Face,
            distance_sq: f64::INFINITY,
        };

        for (index, triangle) in self.triangles.iter().enumerate() {
            let [a, b, c] = triangle.corners;
            let (candidate, feature) = closest_point_on_triangle_with_feature(point, a, b, c);
            let distance_sq = (candidate - point).norm_squared();
            // Strict comparison keeps the first of equally close triangles.
            if distance_sq < best.distance_sq {
                best = Nearest {
                    triangle: index,
                    point: candidate,
                    feature,
                    distance_sq,
                };
            }
        }

        best
    }

    fn pseudo_normal(&self, nearest: &Nearest) -> Vector3<f64> {
        let triangle = &self.triangles[nearest.triangle];
        match nearest.feature {
            TriangleFeature::Face => triangle.normal,
            TriangleFeature::Edge(edge) => triangle.edge_normals[usize::from(edge)],
            TriangleFeature::Vertex(corner) => {
                let vertex = triangle.indices[usize::from(corner)] as usize;
                self.vertex_normals
                    .get(vertex)
                    .copied()
                    .unwrap_or(triangle.normal)
            }
        }
    }
}

fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a < b { (a, b) } else { (b, a) }
}

/// Unit normal by the right-hand rule, or `None` for a zero-area face.
fn unit_normal([a, b, c]: &[Point3<f64>; 3]) -> Option<Vector3<f64>> {
    let ab = b - a;
    let ac = c - a;
    let scale = ab.norm_squared().max(ac.norm_squared());
    ab.cross(&ac).try_normalize(f64::EPSILON * scale)
}

/// Compute the signed distance from a point to a mesh without keeping the
/// field around.
///
/// For many queries, build a [`SignedDistanceField`] once and reuse it.
///
/// # Errors
///
/// Same as [`SignedDistanceField::new`].
pub fn signed_distance(point: Point3<f64>, mesh: &IndexedMesh) -> SdfResult<f64> {
    Ok(SignedDistanceField::new(mesh.clone())?.distance(point))
}

/// Compute the unsigned distance from a point to a mesh.
///
/// # Errors
///
/// Same as [`SignedDistanceField::new`].
pub fn unsigned_distance(point: Point3<f64>, mesh: &IndexedMesh) -> SdfResult<f64> {
    Ok(SignedDistanceField::new(mesh.clone())?.unsigned_distance(point))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::{Vertex, icosphere, unit_cube};

    fn simple_triangle() -> IndexedMesh {
        let mut mesh = IndexedMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(10.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(5.0, 10.0, 0.0));
        mesh.faces.push([0, 1, 2]);
        mesh
    }

    /// Unit cube as STL-style soup: three private vertices per face.
    fn cube_soup() -> IndexedMesh {
        let cube = unit_cube();
        let mut soup = IndexedMesh::new();
        for face in 0..cube.faces.len() {
            let base = u32::try_from(soup.vertices.len()).unwrap();
            soup.vertices
                .extend(cube.face_positions(face).unwrap().map(Vertex::new));
            soup.faces.push([base, base + 1, base + 2]);
        }
        soup
    }

    #[test]
    fn empty_mesh_is_rejected() {
        assert!(matches!(
            SignedDistanceField::new(IndexedMesh::new()),
            Err(SdfError::EmptyMesh)
        ));
    }

    #[test]
    fn dangling_index_is_rejected() {
        let mut mesh = simple_triangle();
        mesh.faces.push([0, 1, 9]);
        match SignedDistanceField::new(mesh) {
            Err(SdfError::InvalidFaceIndex { face, index, .. }) => {
                assert_eq!(face, 1);
                assert_eq!(index, 9);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn all_degenerate_faces_are_rejected() {
        let mut mesh = IndexedMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(2.0, 0.0, 0.0));
        mesh.faces.push([0, 1, 2]);
        mesh.faces.push([0, 0, 1]);

        assert!(matches!(
            SignedDistanceField::new(mesh),
            Err(SdfError::DegenerateMesh { faces: 2 })
        ));
    }

    #[test]
    fn degenerate_faces_are_skipped() {
        let mut mesh = unit_cube();
        mesh.faces.push([0, 0, 1]);
        let sdf = SignedDistanceField::new(mesh).unwrap();
        assert_eq!(sdf.triangle_count(), 12);
    }

    #[test]
    fn open_triangle_sign_follows_winding() {
        let sdf = SignedDistanceField::new(simple_triangle()).unwrap();
        assert_relative_eq!(sdf.distance(Point3::new(5.0, 3.0, 5.0)), 5.0, epsilon = 1e-12);
        assert_relative_eq!(sdf.distance(Point3::new(5.0, 3.0, -5.0)), -5.0, epsilon = 1e-12);
    }

    #[test]
    fn surface_point_is_zero() {
        let sdf = SignedDistanceField::new(simple_triangle()).unwrap();
        assert_relative_eq!(sdf.distance(Point3::new(5.0, 3.0, 0.0)), 0.0, epsilon = 1e-12);
        assert_eq!(sdf.distance(Point3::new(0.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn cube_face_edge_and_corner_regions() {
        let sdf = SignedDistanceField::new(unit_cube()).unwrap();

        // Face region
        assert_relative_eq!(sdf.distance(Point3::new(0.5, 0.5, 0.5)), -0.5, epsilon = 1e-12);
        assert_relative_eq!(sdf.distance(Point3::new(0.5, 0.5, 1.25)), 0.25, epsilon = 1e-12);
        assert_relative_eq!(sdf.distance(Point3::new(0.5, 0.9, 0.5)), -0.1, epsilon = 1e-12);

        // Edge region: closest feature is the edge x = 1, z = 1
        let expected = 2.0_f64.sqrt();
        assert_relative_eq!(sdf.distance(Point3::new(2.0, 0.5, 2.0)), expected, epsilon = 1e-12);

        // Corner region
        let expected = 3.0_f64.sqrt();
        assert_relative_eq!(sdf.distance(Point3::new(2.0, 2.0, 2.0)), expected, epsilon = 1e-12);
        assert_relative_eq!(
            sdf.distance(Point3::new(-1.0, -1.0, -1.0)),
            expected,
            epsilon = 1e-12
        );
    }

    #[test]
    fn soup_and_indexed_cube_agree() {
        let indexed = SignedDistanceField::new(unit_cube()).unwrap();
        let soup = SignedDistanceField::new(cube_soup()).unwrap();
        assert_eq!(soup.mesh().vertices.len(), 8);

        for p in [
            Point3::new(1.5, 1.5, 0.5),
            Point3::new(-0.3, 0.5, -0.3),
            Point3::new(1.2, -0.4, 1.7),
            Point3::new(0.1, 0.2, 0.3),
        ] {
            assert_eq!(indexed.distance(p), soup.distance(p));
        }
    }

    #[test]
    fn sphere_distance_is_close_to_analytic() {
        let sdf = SignedDistanceField::new(icosphere(1.0, 3)).unwrap();
        for (p, expected) in [
            (Point3::new(0.0, 0.0, 0.0), -1.0),
            (Point3::new(0.0, 2.0, 0.0), 1.0),
            (Point3::new(0.3, -0.2, 0.1), -0.6258),
        ] {
            assert_relative_eq!(sdf.distance(p), expected, epsilon = 0.02);
        }
        assert!(sdf.is_inside(Point3::new(0.5, 0.5, 0.5)));
        assert!(!sdf.is_inside(Point3::new(0.8, 0.8, 0.8)));
    }

    #[test]
    fn closest_point_and_unsigned_distance() {
        let sdf = SignedDistanceField::new(unit_cube()).unwrap();
        let query = Point3::new(0.5, 0.25, -2.0);
        let closest = sdf.closest_point(query);
        assert_relative_eq!(closest.x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(closest.y, 0.25, epsilon = 1e-12);
        assert_relative_eq!(closest.z, 0.0, epsilon = 1e-12);
        assert_relative_eq!(sdf.unsigned_distance(query), 2.0);
        assert_relative_eq!(sdf.unsigned_distance(Point3::new(0.5, 0.5, 0.5)), 0.5);
    }

    #[test]
    fn standalone_helpers() {
        let cube = unit_cube();
        let inside = Point3::new(0.5, 0.5, 0.25);
        assert_relative_eq!(signed_distance(inside, &cube).unwrap(), -0.25, epsilon = 1e-12);
        assert_relative_eq!(unsigned_distance(inside, &cube).unwrap(), 0.25, epsilon = 1e-12);
        assert!(signed_distance(inside, &IndexedMesh::new()).is_err());
    }
}

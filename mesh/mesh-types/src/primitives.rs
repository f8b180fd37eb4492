//! Closed test shapes.
//!
//! Small watertight meshes with known signed distance fields, used as
//! fixtures across the workspace.

use std::collections::HashMap;

use crate::{Aabb, IndexedMesh, Vertex};
use nalgebra::Point3;

/// Create an axis-aligned box mesh spanning `bounds`.
///
/// Eight shared vertices, twelve triangles, outward-facing normals.
///
/// # Example
///
/// ```
/// use mesh_types::{cuboid, Aabb, MeshBounds, Point3};
///
/// let bounds = Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
/// let cube = cuboid(&bounds);
/// assert_eq!(cube.bounds(), bounds);
/// ```
#[must_use]
pub fn cuboid(bounds: &Aabb) -> IndexedMesh {
    let (lo, hi) = (bounds.min, bounds.max);
    let mut mesh = IndexedMesh::with_capacity(8, 12);

    mesh.vertices.push(Vertex::from_coords(lo.x, lo.y, lo.z)); // 0
    mesh.vertices.push(Vertex::from_coords(hi.x, lo.y, lo.z)); // 1
    mesh.vertices.push(Vertex::from_coords(hi.x, hi.y, lo.z)); // 2
    mesh.vertices.push(Vertex::from_coords(lo.x, hi.y, lo.z)); // 3
    mesh.vertices.push(Vertex::from_coords(lo.x, lo.y, hi.z)); // 4
    mesh.vertices.push(Vertex::from_coords(hi.x, lo.y, hi.z)); // 5
    mesh.vertices.push(Vertex::from_coords(hi.x, hi.y, hi.z)); // 6
    mesh.vertices.push(Vertex::from_coords(lo.x, hi.y, hi.z)); // 7

    // Bottom (-Z)
    mesh.faces.push([0, 2, 1]);
    mesh.faces.push([0, 3, 2]);
    // Top (+Z)
    mesh.faces.push([4, 5, 6]);
    mesh.faces.push([4, 6, 7]);
    // Front (-Y)
    mesh.faces.push([0, 1, 5]);
    mesh.faces.push([0, 5, 4]);
    // Back (+Y)
    mesh.faces.push([3, 7, 6]);
    mesh.faces.push([3, 6, 2]);
    // Left (-X)
    mesh.faces.push([0, 4, 7]);
    mesh.faces.push([0, 7, 3]);
    // Right (+X)
    mesh.faces.push([1, 2, 6]);
    mesh.faces.push([1, 6, 5]);

    mesh
}

/// Create a unit cube mesh from (0,0,0) to (1,1,1).
///
/// # Example
///
/// ```
/// use mesh_types::{unit_cube, MeshTopology};
///
/// let cube = unit_cube();
/// assert_eq!(cube.vertex_count(), 8);
/// assert_eq!(cube.face_count(), 12);
/// ```
#[must_use]
pub fn unit_cube() -> IndexedMesh {
    cuboid(&Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)))
}

/// Create a sphere of `radius` centered at the origin by subdividing an
/// icosahedron `subdivisions` times.
///
/// Every vertex lies exactly on the sphere, so the mesh is a slightly
/// smaller inscribed polyhedron: the signed distance of a point `p` is close
/// to `|p| - radius` and converges as `subdivisions` grows.
///
/// # Example
///
/// ```
/// use mesh_types::{icosphere, MeshTopology};
///
/// let sphere = icosphere(1.0, 2);
/// assert_eq!(sphere.face_count(), 20 * 16);
/// ```
#[must_use]
pub fn icosphere(radius: f64, subdivisions: u32) -> IndexedMesh {
    let phi = f64::midpoint(1.0, 5.0_f64.sqrt());
    let (a, b) = (1.0, 1.0 / phi);

    let corners = [
        [0.0, b, -a],
        [b, a, 0.0],
        [-b, a, 0.0],
        [0.0, b, a],
        [0.0, -b, a],
        [-a, 0.0, b],
        [0.0, -b, -a],
        [a, 0.0, -b],
        [a, 0.0, b],
        [-a, 0.0, -b],
        [b, -a, 0.0],
        [-b, -a, 0.0],
    ];

    let mut mesh = IndexedMesh::with_capacity(12, 20);
    for [x, y, z] in corners {
        mesh.vertices.push(project(Point3::new(x, y, z), radius));
    }
    mesh.faces.extend_from_slice(&[
        [0, 2, 1],
        [3, 1, 2],
        [3, 5, 4],
        [3, 4, 8],
        [0, 7, 6],
        [0, 6, 9],
        [4, 11, 10],
        [6, 10, 11],
        [2, 9, 5],
        [11, 5, 9],
        [1, 8, 7],
        [10, 7, 8],
        [3, 2, 5],
        [3, 8, 1],
        [0, 9, 2],
        [0, 1, 7],
        [6, 11, 9],
        [6, 7, 10],
        [4, 5, 11],
        [4, 10, 8],
    ]);

    for _ in 0..subdivisions {
        mesh = subdivide(&mesh, radius);
    }

    mesh
}

fn project(point: Point3<f64>, radius: f64) -> Vertex {
    Vertex::new(Point3::from(point.coords.normalize() * radius))
}

fn subdivide(mesh: &IndexedMesh, radius: f64) -> IndexedMesh {
    let mut out = IndexedMesh::with_capacity(mesh.vertices.len() * 4, mesh.faces.len() * 4);
    out.vertices.clone_from(&mesh.vertices);

    let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();

    for &[v0, v1, v2] in &mesh.faces {
        let m01 = midpoint(v0, v1, &mut out.vertices, &mut midpoints, radius);
        let m12 = midpoint(v1, v2, &mut out.vertices, &mut midpoints, radius);
        let m20 = midpoint(v2, v0, &mut out.vertices, &mut midpoints, radius);

        out.faces.push([v0, m01, m20]);
        out.faces.push([v1, m12, m01]);
        out.faces.push([v2, m20, m12]);
        out.faces.push([m01, m12, m20]);
    }

    out
}

#[allow(clippy::cast_possible_truncation)]
// Truncation: fixture meshes stay far below u32::MAX vertices
fn midpoint(
    a: u32,
    b: u32,
    vertices: &mut Vec<Vertex>,
    midpoints: &mut HashMap<(u32, u32), u32>,
    radius: f64,
) -> u32 {
    let key = if a < b { (a, b) } else { (b, a) };
    if let Some(&index) = midpoints.get(&key) {
        return index;
    }

    let pa = vertices[a as usize].position;
    let pb = vertices[b as usize].position;
    let index = vertices.len() as u32;
    vertices.push(project(nalgebra::center(&pa, &pb), radius));
    midpoints.insert(key, index);
    index
}

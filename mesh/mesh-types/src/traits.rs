//! Size and extent queries shared by mesh representations.

use crate::Aabb;

/// Element counts of a triangle mesh.
pub trait MeshTopology {
    /// Number of vertices.
    fn vertex_count(&self) -> usize;

    /// Number of triangles.
    fn face_count(&self) -> usize;

    /// `true` when there is nothing to sample: no vertices or no triangles.
    fn is_empty(&self) -> bool {
        self.vertex_count() == 0 || self.face_count() == 0
    }
}

/// Axis-aligned extent of a mesh.
pub trait MeshBounds {
    /// Box enclosing every vertex; [`Aabb::empty`] for a mesh without vertices.
    fn bounds(&self) -> Aabb;

    /// Like [`bounds`](Self::bounds), but `None` instead of an empty box.
    fn bounds_opt(&self) -> Option<Aabb> {
        Some(self.bounds()).filter(|b| !b.is_empty())
    }
}

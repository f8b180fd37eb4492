//! Error types for SDF operations.

use thiserror::Error;

/// Result type for SDF operations.
pub type SdfResult<T> = Result<T, SdfError>;

/// Errors that can occur during SDF construction or queries.
#[derive(Debug, Error)]
pub enum SdfError {
    /// Mesh is empty (no faces).
    #[error("mesh is empty")]
    EmptyMesh,

    /// Every face of the mesh has zero area.
    #[error("mesh is degenerate: all {faces} faces have zero area")]
    DegenerateMesh {
        /// Number of faces in the mesh.
        faces: usize,
    },

    /// A face references a vertex that does not exist.
    #[error("face {face} references vertex {index}, mesh has {vertex_count} vertices")]
    InvalidFaceIndex {
        /// Offending face.
        face: usize,
        /// Out-of-range vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// A distance query could not produce a finite value.
    #[error("distance query failed at ({x}, {y}, {z}): {reason}")]
    QueryFailed {
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
        /// Z coordinate.
        z: f64,
        /// What went wrong.
        reason: String,
    },
}

impl SdfError {
    /// Create a `QueryFailed` error for `point`.
    #[must_use]
    pub fn query_failed(point: &nalgebra::Point3<f64>, reason: impl Into<String>) -> Self {
        Self::QueryFailed {
            x: point.x,
            y: point.y,
            z: point.z,
            reason: reason.into(),
        }
    }
}

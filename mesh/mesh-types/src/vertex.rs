//! Mesh vertex.

use nalgebra::Point3;

/// A mesh vertex.
///
/// Only the position is stored: STL input carries no per-vertex attributes
/// and the distance queries never look at anything else.
///
/// # Example
///
/// ```
/// use mesh_types::{Point3, Vertex};
///
/// let v1 = Vertex::new(Point3::new(1.0, 2.0, 3.0));
/// let v2 = Vertex::from_coords(1.0, 2.0, 3.0);
///
/// assert_eq!(v1, v2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// 3D position.
    pub position: Point3<f64>,
}

impl Vertex {
    /// Create a new vertex at `position`.
    #[inline]
    #[must_use]
    pub const fn new(position: Point3<f64>) -> Self {
        Self { position }
    }

    /// Create a vertex from raw coordinates.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::Vertex;
    ///
    /// let v = Vertex::from_coords(1.0, 2.0, 3.0);
    /// assert_eq!(v.position.y, 2.0);
    /// ```
    #[inline]
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Point3::new is not const in nalgebra
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Exact bit pattern of the position, with `-0.0` folded onto `0.0`.
    ///
    /// Two vertices share a key exactly when their coordinates compare equal,
    /// which is how STL triangle soup is stitched back together.
    #[must_use]
    pub fn position_key(&self) -> [u64; 3] {
        let p = &self.position;
        [
            (p.x + 0.0).to_bits(),
            (p.y + 0.0).to_bits(),
            (p.z + 0.0).to_bits(),
        ]
    }
}

impl From<Point3<f64>> for Vertex {
    fn from(position: Point3<f64>) -> Self {
        Self::new(position)
    }
}

impl From<[f64; 3]> for Vertex {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::from_coords(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_array() {
        let v = Vertex::from([1.0, 2.0, 3.0]);
        assert_eq!(v.position, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn position_key_folds_negative_zero() {
        let a = Vertex::from_coords(0.0, 1.0, 2.0);
        let b = Vertex::from_coords(-0.0, 1.0, 2.0);
        assert_eq!(a.position_key(), b.position_key());
    }

    #[test]
    fn position_key_distinguishes_nearby_points() {
        let a = Vertex::from_coords(1.0, 1.0, 1.0);
        let b = Vertex::from_coords(1.0 + f64::EPSILON, 1.0, 1.0);
        assert_ne!(a.position_key(), b.position_key());
    }
}

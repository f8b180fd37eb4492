//! Signed distance queries against triangle meshes.
//!
//! [`SignedDistanceField`] answers exact closest-point distance queries for
//! an [`IndexedMesh`](mesh_types::IndexedMesh), signed with angle-weighted
//! pseudo-normals so that points near sharp edges and corners are classified
//! correctly. Distances are negative inside and positive outside.
//!
//! Grid samplers consume the [`DistanceQuery`] trait rather than the concrete
//! field, so any surface with bounds and a signed distance can be voxelized.
//!
//! # Example
//!
//! ```
//! use mesh_sdf::{DistanceQuery, SignedDistanceField};
//! use mesh_types::unit_cube;
//! use nalgebra::Point3;
//!
//! let sdf = SignedDistanceField::new(unit_cube())?;
//!
//! let inside = sdf.closest_signed_distance(Point3::new(0.5, 0.5, 0.25))?;
//! let outside = sdf.closest_signed_distance(Point3::new(0.5, 0.5, 1.5))?;
//! assert!(inside < 0.0);
//! assert!(outside > 0.0);
//! # Ok::<(), mesh_sdf::SdfError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod distance;
mod error;
mod query;
mod sdf;

pub use distance::{DistanceQuery, SerializedQuery};
pub use error::{SdfError, SdfResult};
pub use query::{TriangleFeature, closest_point_on_triangle, closest_point_on_triangle_with_feature};
pub use sdf::{SignedDistanceField, signed_distance, unsigned_distance};

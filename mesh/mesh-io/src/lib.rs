//! Mesh file I/O for the porosity toolchain.
//!
//! Only STL is supported, in both ASCII and binary encodings. That is the
//! format surface meshes reach the voxelizer in.
//!
//! # Example
//!
//! ```no_run
//! use mesh_io::{load_mesh, save_stl, StlEncoding};
//!
//! let mesh = load_mesh("bracket.stl")?;
//! save_stl(&mesh, "bracket_ascii.stl", StlEncoding::Ascii)?;
//! # Ok::<(), mesh_io::IoError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod stl;

pub use error::{IoError, IoResult};
pub use stl::{StlEncoding, load_stl, parse_stl, save_stl};

use std::path::Path;

use mesh_types::IndexedMesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshFormat {
    /// STL (Stereolithography), ASCII or binary.
    Stl,
}

impl MeshFormat {
    /// Detect format from file extension (case-insensitive).
    ///
    /// Returns `None` if the extension is missing or not recognized.
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?;
        ext.eq_ignore_ascii_case("stl").then_some(Self::Stl)
    }

    /// Canonical file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Stl => "stl",
        }
    }
}

fn format_of(path: &Path) -> IoResult<MeshFormat> {
    MeshFormat::from_path(path).ok_or_else(|| IoError::UnknownFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load a mesh, choosing the reader from the file extension.
///
/// # Errors
///
/// [`IoError::UnknownFormat`] for unsupported extensions, otherwise whatever
/// the format reader reports.
pub fn load_mesh<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let path = path.as_ref();
    match format_of(path)? {
        MeshFormat::Stl => load_stl(path),
    }
}

/// Save a mesh, choosing the writer from the file extension.
///
/// STL is written in binary.
///
/// # Errors
///
/// [`IoError::UnknownFormat`] for unsupported extensions, otherwise whatever
/// the format writer reports.
pub fn save_mesh<P: AsRef<Path>>(mesh: &IndexedMesh, path: P) -> IoResult<()> {
    let path = path.as_ref();
    match format_of(path)? {
        MeshFormat::Stl => save_stl(mesh, path, StlEncoding::Binary),
    }
}

//! Errors raised while reading and writing mesh files.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for mesh file operations.
pub type IoResult<T> = Result<T, IoError>;

/// Failure to load or save a mesh file.
#[derive(Debug, Error)]
pub enum IoError {
    /// The input path does not exist.
    #[error("mesh file not found: {path}")]
    FileNotFound {
        /// Requested path.
        path: PathBuf,
    },

    /// The extension does not name a supported mesh format.
    #[error("unsupported mesh format: .{extension}")]
    UnknownFormat {
        /// Extension as given, without the dot.
        extension: String,
    },

    /// Malformed ASCII STL, or a mesh that cannot be written.
    #[error("invalid STL: {message}")]
    InvalidContent {
        /// What was wrong, with the line number when reading.
        message: String,
    },

    /// Binary STL too short to hold its header and face count.
    #[error("invalid STL header: expected {expected} bytes, got {got}")]
    InvalidHeader {
        /// Minimum size of a binary STL.
        expected: usize,
        /// File size.
        got: usize,
    },

    /// Binary STL ended before the declared number of facets.
    #[error("truncated STL: header declares {expected} facets, found {got}")]
    InvalidFaceCount {
        /// Facet count from the header.
        expected: u32,
        /// Complete facets present.
        got: u32,
    },

    /// Reading or writing the file failed.
    #[error("mesh file I/O: {0}")]
    Io(#[from] std::io::Error),

    /// A vertex or normal coordinate in an ASCII STL is not a number.
    #[error("bad coordinate in ASCII STL: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),
}

impl IoError {
    /// Shorthand for [`IoError::InvalidContent`].
    #[must_use]
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent {
            message: message.into(),
        }
    }
}

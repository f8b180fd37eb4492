//! Error types for porosity field synthesis.

use std::path::PathBuf;

use mesh_sdf::SdfError;
use thiserror::Error;

/// Result type for grid planning, sampling and transforms.
pub type PorosityResult<T> = Result<T, PorosityError>;

/// Result type for configuration parsing.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for grid sinks.
pub type OutputResult<T> = Result<T, OutputError>;

/// Errors raised while building or transforming a grid.
#[derive(Debug, Error)]
pub enum PorosityError {
    /// Grid geometry cannot be derived from the bounds and parameters.
    #[error("invalid grid parameters: {0}")]
    InvalidGridParameters(String),

    /// A transform or pipeline parameter is out of range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A field does not have one value per grid node.
    #[error("field `{field}` has {actual} values, grid has {expected} nodes")]
    DimensionMismatch {
        /// Field name.
        field: String,
        /// Grid node count.
        expected: usize,
        /// Field length.
        actual: usize,
    },

    /// The mesh distance query failed for a node.
    #[error("mesh distance query failed at node {node}")]
    MeshQueryFailure {
        /// Linear node index.
        node: usize,
        /// Underlying query error.
        #[source]
        source: SdfError,
    },

    /// A field with this name is already attached.
    #[error("field `{0}` is already attached to the grid")]
    DuplicateField(String),

    /// The dedicated worker pool could not be started.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl PorosityError {
    /// Create an `InvalidParameter` error.
    #[must_use]
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Errors raised while reading a `key=value` configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}")]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A non-comment line has no `=` separator.
    #[error("line {line}: expected `key=value`, got `{content}`")]
    Syntax {
        /// 1-based line number.
        line: usize,
        /// Offending line.
        content: String,
    },

    /// A value could not be parsed or is out of range.
    #[error("line {line}: invalid value `{value}` for `{key}`: {reason}")]
    InvalidValue {
        /// Key being set.
        key: String,
        /// 1-based line number.
        line: usize,
        /// Raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A required key never appeared.
    #[error("missing required key `{0}`")]
    MissingKey(&'static str),
}

/// Errors raised by grid sinks.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The grid carries no fields to write.
    #[error("grid has no fields to write")]
    NoFields,

    /// The output file could not be created.
    #[error("failed to create {path}")]
    Create {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing to the destination failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An XML event could not be written.
    #[error("failed to write {element}: {message}")]
    Xml {
        /// Element or section being written.
        element: &'static str,
        /// Writer error message.
        message: String,
    },
}

impl OutputError {
    /// Create an `Xml` error from a writer failure.
    pub(crate) fn xml(element: &'static str, error: impl std::fmt::Display) -> Self {
        Self::Xml {
            element,
            message: error.to_string(),
        }
    }
}

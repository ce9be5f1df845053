//! Error types for the MetaCSV library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for MetaCSV operations.
#[derive(Debug, Error)]
pub enum MetaCsvError {
    /// A coordinate depends, directly or transitively, on itself.
    #[error("Coordinate graph is cyclic: '{coordinate}' depends on itself")]
    CyclicGraph { coordinate: String },

    /// A dependency named in a coordinate mapping is never declared as a coordinate.
    #[error("Coordinate '{coordinate}' depends on '{dependency}', which is not declared as a coordinate")]
    UnresolvedDependency {
        coordinate: String,
        dependency: String,
    },

    /// Declared coordinates and the table's index levels are not in bijection.
    #[error("Coordinates {declared:?} do not match index levels {index:?}")]
    CoordinateMismatch {
        declared: Vec<String>,
        index: Vec<String>,
    },

    /// A value is not constant within a group of base coordinates.
    #[error("Data not uniquely indexed for base coordinates ({key}) in '{name}'")]
    UniquenessViolation { name: String, key: String },

    /// Materialization requested for a table with more than two axes.
    #[error("Materialization is not implemented for {0}-dimensional tables")]
    UnsupportedArity(usize),

    /// A caller-supplied assertion about decoded metadata did not hold.
    #[error("Assertion failed at '{path}': {message}")]
    AssertionFailed { path: String, message: String },

    /// A coordinate declaration has an unsupported shape.
    #[error("Invalid coordinate declaration: {0}")]
    InvalidDeclaration(String),

    /// The metadata block could not be split from the body.
    #[error("Malformed metadata header: {0}")]
    MalformedHeader(String),

    /// Table dimensions or index names are inconsistent.
    #[error("Shape error: {0}")]
    Shape(String),

    /// A referenced column does not exist.
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Empty file or no data to parse.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Error reading or accessing a file.
    #[error("IO error for '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error on a stream with no associated path.
    #[error("Stream error: {0}")]
    Stream(#[from] std::io::Error),

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error loading or dumping the YAML metadata block.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error constructing a dimensional array.
    #[error("Array error: {0}")]
    Array(#[from] ndarray::ShapeError),
}

impl MetaCsvError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MetaCsvError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for MetaCSV operations.
pub type Result<T> = std::result::Result<T, MetaCsvError>;

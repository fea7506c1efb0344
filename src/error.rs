//! Error types for geocell operations.

use thiserror::Error;

/// Result type for geocell operations.
pub type Result<T> = std::result::Result<T, GeocellError>;

/// Errors that can occur while building values or running queries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeocellError {
    /// A latitude or longitude was outside its valid range.
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// A bounding-box mutation would have left south above north.
    #[error("Invalid box edit: {0}")]
    InvalidBoxEdit(String),

    /// A cell string was empty or contained non-alphabet characters.
    #[error("Invalid geocell: {0}")]
    InvalidCell(String),

    /// The caller-supplied query runner failed.
    #[error("Datastore query failed: {0}")]
    Datastore(String),
}

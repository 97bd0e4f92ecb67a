//! Error types for the column model.

use thiserror::Error;

/// Column model errors.
///
/// Both variants describe a mistake in the admin configuration, not a
/// condition a request can recover from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColumnError {
    /// A field specification matched none of the accepted shapes.
    #[error("Invalid field definition at position {index}: {spec}")]
    InvalidFieldSpec { index: usize, spec: String },

    /// A row lacks a key the column reads.
    #[error("Column '{column}' references missing field '{key}'")]
    MissingField { column: String, key: String },
}

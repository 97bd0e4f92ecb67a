//! # Error Types
//!
//! Parse errors for the wire forms of filters and sorts.

use thiserror::Error;

/// Errors raised while parsing query parameters into typed values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryParseError {
    /// Filter string did not have the `ref;op;val` shape.
    #[error("Malformed filter '{0}': expected ref;op;val")]
    MalformedFilter(String),

    /// Sort string did not have the `ref;dir` shape.
    #[error("Malformed sort '{0}': expected ref;asc|desc")]
    MalformedSort(String),

    /// Operator name is empty or contains illegal characters.
    #[error("Invalid filter operator: '{0}'")]
    InvalidOperator(String),

    /// Sort direction is neither `asc` nor `desc`.
    #[error("Invalid sort direction: '{0}'")]
    InvalidDirection(String),
}

//! Resolver error types.

use thiserror::Error;

/// Errors returned by a `Resolver`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    /// Filter or sort references a column the resource does not have.
    #[error("Unknown column '{column}' on resource '{resource}'")]
    UnknownColumn { resource: String, column: String },

    /// Operator not understood by this adapter.
    #[error("Unsupported operator '{op}' on column '{column}'")]
    UnsupportedOperator { column: String, op: String },

    /// Filter value cannot be coerced to the column's type.
    #[error("Invalid value '{value}' for column '{column}': {reason}")]
    InvalidValue {
        column: String,
        value: String,
        reason: String,
    },

    /// Page or page size out of range.
    #[error("Invalid pagination: page={page}, per_page={per_page}")]
    InvalidPagination { page: u64, per_page: u64 },

    /// The backing store failed.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl ResolverError {
    /// True when the request, not the backend, is at fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ResolverError::Backend(_))
    }
}

//! Pipeline error types and their client-facing classification.

use at_01_column_model::ColumnError;
use at_02_resolver::ResolverError;
use shared_types::QueryParseError;
use thiserror::Error;

/// How an error is reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 400
    BadRequest,
    /// 401
    Unauthorized,
    /// 404
    NotFound,
    /// 200 with `failed: true`; the UI shows the message inline.
    Rejected,
    /// 500
    Internal,
}

impl ErrorClass {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorClass::BadRequest => 400,
            ErrorClass::Unauthorized => 401,
            ErrorClass::NotFound => 404,
            ErrorClass::Rejected => 200,
            ErrorClass::Internal => 500,
        }
    }
}

/// Errors produced while serving a view.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The admin configuration is inconsistent.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    NotFound(String),

    /// Malformed query parameters.
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// Submitted data failed schema validation or the create callback
    /// rejected it.
    #[error("Invalid data: {0}")]
    Validation(String),

    /// An action callback failed.
    #[error("Failed calling action: {0}")]
    Callback(String),

    /// A graph, dashboard or form callback failed.
    #[error("Internal server error: {0}")]
    Upstream(String),

    #[error(transparent)]
    Resolver(#[from] ResolverError),

    /// A column could not be rendered from a resolved row.
    #[error(transparent)]
    Column(#[from] ColumnError),

    /// A callback returned a value that maps to no response.
    #[error("Invalid handler response: {0}")]
    ContractViolation(String),
}

impl PipelineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PipelineError::NotFound(_) => ErrorClass::NotFound,
            PipelineError::BadRequest(_) => ErrorClass::BadRequest,
            PipelineError::Unauthorized => ErrorClass::Unauthorized,
            PipelineError::Validation(_) | PipelineError::Callback(_) => ErrorClass::Rejected,
            PipelineError::Resolver(e) if e.is_client_error() => ErrorClass::BadRequest,
            PipelineError::Configuration(_)
            | PipelineError::Upstream(_)
            | PipelineError::Resolver(_)
            | PipelineError::Column(_)
            | PipelineError::ContractViolation(_) => ErrorClass::Internal,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.class().status_code()
    }

    pub(crate) fn resource_not_found(id: &str) -> Self {
        PipelineError::NotFound(format!("Resource not found: {id}"))
    }
}

impl From<QueryParseError> for PipelineError {
    fn from(e: QueryParseError) -> Self {
        PipelineError::BadRequest(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classes() {
        assert_eq!(PipelineError::NotFound("x".into()).status_code(), 404);
        assert_eq!(PipelineError::BadRequest("x".into()).status_code(), 400);
        assert_eq!(PipelineError::Validation("x".into()).class(), ErrorClass::Rejected);
        assert_eq!(PipelineError::Callback("x".into()).status_code(), 200);
        assert_eq!(PipelineError::Configuration("x".into()).status_code(), 500);
        assert_eq!(PipelineError::ContractViolation("x".into()).status_code(), 500);
        assert_eq!(PipelineError::Unauthorized.status_code(), 401);
    }

    #[test]
    fn test_resolver_errors_split_by_cause() {
        let client = PipelineError::from(ResolverError::UnknownColumn {
            resource: "Users".into(),
            column: "x".into(),
        });
        assert_eq!(client.class(), ErrorClass::BadRequest);

        let backend = PipelineError::from(ResolverError::Backend("down".into()));
        assert_eq!(backend.class(), ErrorClass::Internal);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            PipelineError::Validation("missing field 'name'".into()).to_string(),
            "Invalid data: missing field 'name'"
        );
        assert_eq!(
            PipelineError::resource_not_found("7").to_string(),
            "Resource not found: 7"
        );
    }
}

//! Gateway error types and their HTTP rendering.
//!
//! Every error body is a JSON object with a `message`. Rejected requests
//! (validation and action failures) keep status 200 and add `failed: true`
//! so the client shows them inline.

use at_03_view_pipeline::{ErrorClass, PipelineError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Error returned by a route handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    /// Rendered with `failed: true`.
    pub failed: bool,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            failed: false,
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        let status = match e.class() {
            ErrorClass::BadRequest => StatusCode::BAD_REQUEST,
            ErrorClass::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorClass::NotFound => StatusCode::NOT_FOUND,
            ErrorClass::Rejected => StatusCode::OK,
            ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
            failed: e.class() == ErrorClass::Rejected,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = if self.failed {
            json!({ "message": self.message, "failed": true })
        } else {
            json!({ "message": self.message })
        };
        (self.status, Json(body)).into_response()
    }
}

/// Gateway lifecycle errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// The HTTP server stopped with an error
    #[error("server error: {0}")]
    Server(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_mapping() {
        let e = ApiError::from(PipelineError::NotFound("Unknown resource: X".into()));
        assert_eq!(e.status, StatusCode::NOT_FOUND);
        assert!(!e.failed);

        let e = ApiError::from(PipelineError::Validation("missing field 'title'".into()));
        assert_eq!(e.status, StatusCode::OK);
        assert!(e.failed);
        assert_eq!(e.message, "Invalid data: missing field 'title'");

        let e = ApiError::from(PipelineError::Upstream("down".into()));
        assert!(e.is_server_error());

        assert_eq!(
            ApiError::from(PipelineError::Unauthorized),
            ApiError::unauthorized()
        );
    }

    #[test]
    fn test_rejected_response_keeps_ok_status() {
        let response = ApiError::from(PipelineError::Callback("boom".into())).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let response = ApiError::bad_request("Invalid page: 0").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how each
//! variant is turned into an HTTP response.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rango_core::catalog::CatalogError;
use rango_core::forms::FormErrors;
use rango_core::ports::PortError;
use rango_core::visits::VisitError;
use serde_json::json;
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// The stored visit state of a session could not be read.
    #[error("Session state error: {0}")]
    Visit(#[from] VisitError),

    /// Submitted form data failed validation.
    #[error("Validation failed: {0}")]
    Validation(FormErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Invalid(errors) => ApiError::Validation(errors),
            CatalogError::CategoryNotFound(slug) => {
                ApiError::NotFound(format!("Category '{}' not found", slug))
            }
            CatalogError::Port(e) => ApiError::Port(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "errors": errors.into_map() })),
            )
                .into_response(),
            ApiError::NotFound(_) | ApiError::Port(PortError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, self.to_string()).into_response()
            }
            ApiError::Port(PortError::Conflict(_)) => {
                (StatusCode::CONFLICT, self.to_string()).into_response()
            }
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()).into_response(),
            other => {
                error!("Request failed: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        ApiError::from(CatalogError::Invalid(FormErrors::single("name", "taken"))),
        StatusCode::UNPROCESSABLE_ENTITY
    )]
    #[case(
        ApiError::from(CatalogError::CategoryNotFound("rust".to_string())),
        StatusCode::NOT_FOUND
    )]
    #[case(
        ApiError::from(CatalogError::Port(PortError::Conflict("dup".to_string()))),
        StatusCode::CONFLICT
    )]
    #[case(
        ApiError::from(PortError::OutOfRange("views".to_string())),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    #[case(
        ApiError::from(VisitError::MalformedTimestamp("x".to_string())),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    #[case(ApiError::Unauthorized, StatusCode::UNAUTHORIZED)]
    fn errors_map_to_http_statuses(#[case] err: ApiError, #[case] status: StatusCode) {
        assert_eq!(err.into_response().status(), status);
    }
}

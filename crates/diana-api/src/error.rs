//! Diana Bot: API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use diana_content::domain::catalog::CatalogError;
use diana_core::error::DomainError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The startup catalog could not be read.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The startup catalog could not be published.
    #[error("publish error: {0}")]
    Publish(#[from] DomainError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            DomainError::FragmentNotFound(_) => (StatusCode::NOT_FOUND, "fragment_not_found"),
            DomainError::UserStateNotFound(_) => {
                (StatusCode::NOT_FOUND, "user_state_not_found")
            }
            DomainError::InvalidChoice { .. } => (StatusCode::BAD_REQUEST, "invalid_choice"),
            DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            DomainError::DanglingReference { .. } | DomainError::NoContentAvailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "content_unavailable")
            }
            DomainError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
        };

        // Content defects are operator problems; the caller gets a generic message.
        let message = if self.0.is_content_defect() {
            warn!(error = %self.0, "content defect surfaced to caller");
            "narrative content is temporarily unavailable".to_owned()
        } else {
            if status.is_server_error() {
                error!(error = %self.0, "request failed");
            }
            self.0.to_string()
        };

        let body = ErrorBody {
            error: error_code,
            message,
        };

        (status, Json(body)).into_response()
    }
}

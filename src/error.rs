//! Application error types and result alias.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application result type alias
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Missing, expired, wrong-scope, or wrong-owner API key
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Conflict (e.g. republishing an existing package version)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid request input (name, version, file, mime type)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed upload archive
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Missing or malformed package manifest
    #[error("Manifest parse error: {0}")]
    ManifestParse(String),

    /// Upstream identity provider failure
    #[error("Identity lookup error: {0}")]
    IdentityLookup(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR", msg.clone()),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Database operation failed".to_string(),
            ),
            AppError::Migration(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "MIGRATION_ERROR",
                "Database migration failed".to_string(),
            ),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            // Malformed uploads surface as a generic bad-request; the detail
            // is logged below rather than echoed back to the client.
            AppError::Extraction(_) => (
                StatusCode::BAD_REQUEST,
                "EXTRACTION_ERROR",
                "Uploaded archive could not be extracted".to_string(),
            ),
            AppError::ManifestParse(_) => (
                StatusCode::BAD_REQUEST,
                "MANIFEST_ERROR",
                "Package manifest is missing or malformed".to_string(),
            ),
            AppError::IdentityLookup(_) => (
                StatusCode::BAD_GATEWAY,
                "IDENTITY_LOOKUP_ERROR",
                "Identity provider lookup failed".to_string(),
            ),
            AppError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                "IO operation failed".to_string(),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        // Log the error
        tracing::error!(error = %self, code = code, "Request error");

        let body = Json(json!({
            "code": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            status_of(AppError::Validation("bad name".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Unauthorized("no scope".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Conflict("duplicate".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::NotFound("missing".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::IdentityLookup("github down".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_malformed_upload_errors_are_bad_requests() {
        assert_eq!(
            status_of(AppError::Extraction("truncated gzip".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::ManifestParse("missing Forge.toml".into())),
            StatusCode::BAD_REQUEST
        );
    }
}

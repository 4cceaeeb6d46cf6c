//! Application error types for robust error handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Email is already in use")]
    DuplicateEmail,

    #[error("Phone number is already in use")]
    DuplicatePhone,

    /// The default role is missing from the roles table. This is a server
    /// misconfiguration (bootstrap did not run or failed), not a client fault.
    #[error("Default role is not present")]
    RoleMissing,

    /// Covers both unknown email and wrong password. The two cases must stay
    /// indistinguishable to the caller to avoid user enumeration.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Db(e) => {
                tracing::error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::DuplicateEmail | AppError::DuplicatePhone => {
                (StatusCode::CONFLICT, self.to_string())
            }
            AppError::RoleMissing => {
                // Misconfiguration: keep the caller-visible message generic,
                // but record the real cause at error level.
                tracing::error!("default role missing; was role bootstrap skipped?");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Jwt(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn duplicate_errors_map_to_conflict() {
        assert_eq!(status_of(AppError::DuplicateEmail), StatusCode::CONFLICT);
        assert_eq!(status_of(AppError::DuplicatePhone), StatusCode::CONFLICT);
    }

    #[test]
    fn invalid_credentials_maps_to_unauthorized() {
        assert_eq!(
            status_of(AppError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn role_missing_is_a_generic_server_error() {
        let res = AppError::RoleMissing.into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_maps_to_bad_request() {
        assert_eq!(
            status_of(AppError::Validation("bad".into())),
            StatusCode::BAD_REQUEST
        );
    }
}

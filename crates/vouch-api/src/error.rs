//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps validation, credential, directory, and hashing errors to HTTP status
//! codes and a JSON body with error code, message, and optional details.
//! Internal error details are never exposed to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use vouch_token::TokenError;
use vouch_validate::{FieldViolations, ValidationError};

use crate::password::PasswordError;
use crate::service::AuthError;
use crate::users::DirectoryError;

/// Structured JSON error response body.
///
/// The `details` field carries the four violation lists for 422 validation
/// errors and is omitted everywhere else.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "UNAUTHORIZED", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Violation lists, present only for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("{0}")]
    NotFound(String),

    /// Payload parsed but violated its constraints (422).
    #[error("{0}")]
    Validation(FieldViolations),

    /// Request body could not be parsed (400).
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Conflict with existing state (409).
    #[error("{0}")]
    Conflict(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation(violations) => serde_json::to_value(violations).ok(),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Malformed(reason) => {
                tracing::debug!(%reason, "request body rejected");
                Self::BadRequest("invalid request body".into())
            }
            ValidationError::Invalid(violations) => Self::Validation(violations),
        }
    }
}

/// Default mapping for credential errors. Handlers override it where an
/// endpoint needs a different status for the same kind.
impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidInput(msg) => Self::BadRequest(msg),
            TokenError::NotFound => Self::NotFound(err.to_string()),
            TokenError::Expired | TokenError::BadSignature | TokenError::Malformed => {
                Self::Unauthorized(err.to_string())
            }
            TokenError::Signing(_) | TokenError::RotationFailed(_) | TokenError::Store(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Duplicate => Self::Conflict(err.to_string()),
            DirectoryError::Backend(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::InvalidRefresh
            | AuthError::RefreshExpired => Self::Unauthorized(err.to_string()),
            AuthError::UserExists => Self::Conflict(err.to_string()),
            AuthError::Token(inner) => inner.into(),
            AuthError::Directory(inner) => inner.into(),
            AuthError::Password(inner) => inner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use vouch_validate::Constraint;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT, "CONFLICT"),
            (
                AppError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code));
        }
    }

    #[tokio::test]
    async fn validation_error_carries_violation_lists() {
        let violations = FieldViolations::new(Constraint::Required, ["username", "email"]);
        let (status, body) = body_json(AppError::Validation(violations)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "username, email required");
        assert_eq!(
            body["error"]["details"]["missing_fields"],
            serde_json::json!(["username", "email"])
        );
        assert_eq!(
            body["error"]["details"]["invalid_email_fields"],
            serde_json::json!([])
        );
    }

    #[tokio::test]
    async fn internal_error_hides_message() {
        let (status, body) = body_json(AppError::Internal("db password=hunter2".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "An internal error occurred");
        assert!(body["error"].get("details").is_none());
    }

    #[test]
    fn malformed_body_is_bad_request() {
        let err = AppError::from(ValidationError::Malformed("EOF while parsing".into()));
        assert_eq!(err.status_and_code().0, StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "invalid request body");
    }

    #[test]
    fn token_errors_map_by_kind() {
        assert_eq!(
            AppError::from(TokenError::Expired).status_and_code().0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(TokenError::NotFound).status_and_code().0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(TokenError::RotationFailed("down".into())).status_and_code().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn duplicate_user_is_conflict() {
        assert_eq!(
            AppError::from(DirectoryError::Duplicate).status_and_code().0,
            StatusCode::CONFLICT
        );
    }
}

//! # Authentication Endpoints
//!
//! Registration, login, logout, and refresh rotation for end users. Request
//! bodies are validated by the gate before the handlers run; the handlers only
//! delegate to [`crate::service::AuthService`] and shape the response.

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use vouch_validate::{Constraint, FieldRule, Schema};

use super::{MessageResponse, TokenPairResponse, TOKEN_TYPE};
use crate::error::AppError;
use crate::extractors::{validate_body, Validated};
use crate::state::AppState;

// ── Request shapes ──────────────────────────────────────────────────

/// New account.
#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    /// At least 8 characters.
    #[serde(default)]
    pub password: String,
}

impl Schema for RegisterRequest {
    const RULES: &'static [FieldRule<Self>] = &[
        FieldRule {
            field: "username",
            accessor: |r| r.username.as_str(),
            constraints: &[Constraint::Required],
        },
        FieldRule {
            field: "email",
            accessor: |r| r.email.as_str(),
            constraints: &[Constraint::Required, Constraint::Email],
        },
        FieldRule {
            field: "password",
            accessor: |r| r.password.as_str(),
            constraints: &[Constraint::Required, Constraint::PasswordStrength],
        },
    ];
}

/// Username/password login.
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Schema for LoginRequest {
    const RULES: &'static [FieldRule<Self>] = &[
        FieldRule {
            field: "username",
            accessor: |r| r.username.as_str(),
            constraints: &[Constraint::Required],
        },
        FieldRule {
            field: "password",
            accessor: |r| r.password.as_str(),
            constraints: &[Constraint::Required],
        },
    ];
}

/// Body shared by logout and refresh.
#[derive(Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    #[serde(default)]
    pub refresh_token: String,
}

impl Schema for RefreshTokenRequest {
    const RULES: &'static [FieldRule<Self>] = &[FieldRule {
        field: "refresh_token",
        accessor: |r| r.refresh_token.as_str(),
        constraints: &[Constraint::Required],
    }];
}

// ── Responses ───────────────────────────────────────────────────────

/// Registration result: the new user id plus a ready-to-use pair.
#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the authentication router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/auth/register",
            post(register).layer(from_fn(validate_body::<RegisterRequest>)),
        )
        .route(
            "/auth/login",
            post(login).layer(from_fn(validate_body::<LoginRequest>)),
        )
        .route(
            "/auth/logout",
            post(logout).layer(from_fn(validate_body::<RefreshTokenRequest>)),
        )
        .route(
            "/auth/refresh",
            post(refresh).layer(from_fn(validate_body::<RefreshTokenRequest>)),
        )
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /auth/register: Create an account and issue a credential pair.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = RegisterResponse),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
        (status = 409, description = "Username or email taken", body = crate::error::ErrorBody),
        (status = 422, description = "Constraint violations", body = crate::error::ErrorBody),
    ),
    tag = "auth"
)]
async fn register(
    State(state): State<AppState>,
    body: Validated<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let (user_id, pair) = state
        .auth
        .register(&body.username, &body.email, &body.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id,
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: state.tokens.access_ttl().as_secs(),
        }),
    ))
}

/// POST /auth/login: Exchange a username and password for a credential pair.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = TokenPairResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorBody),
        (status = 422, description = "Constraint violations", body = crate::error::ErrorBody),
    ),
    tag = "auth"
)]
async fn login(
    State(state): State<AppState>,
    body: Validated<LoginRequest>,
) -> Result<Json<TokenPairResponse>, AppError> {
    let pair = state.auth.login(&body.username, &body.password).await?;
    Ok(Json(TokenPairResponse::new(
        pair,
        state.tokens.access_ttl().as_secs(),
    )))
}

/// POST /auth/logout: Revoke a live refresh credential.
#[utoipa::path(
    post,
    path = "/auth/logout",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Unknown or expired refresh token", body = crate::error::ErrorBody),
    ),
    tag = "auth"
)]
async fn logout(
    State(state): State<AppState>,
    body: Validated<RefreshTokenRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.auth.logout(&body.refresh_token).await?;
    Ok(Json(MessageResponse::new("logged out successfully")))
}

/// POST /auth/refresh: Rotate a refresh credential into a new pair.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Rotated", body = TokenPairResponse),
        (status = 401, description = "Unknown, consumed, or expired refresh token", body = crate::error::ErrorBody),
        (status = 500, description = "Rotation failed", body = crate::error::ErrorBody),
    ),
    tag = "auth"
)]
async fn refresh(
    State(state): State<AppState>,
    body: Validated<RefreshTokenRequest>,
) -> Result<Json<TokenPairResponse>, AppError> {
    let pair = state.auth.refresh(&body.refresh_token).await?;
    Ok(Json(TokenPairResponse::new(
        pair,
        state.tokens.access_ttl().as_secs(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_reports_missing_before_shape() {
        let err = vouch_validate::validate::<RegisterRequest>(
            br#"{"email":"not-an-email","password":"short"}"#,
        )
        .err()
        .unwrap();
        assert_eq!(err.to_string(), "username required");
    }

    #[test]
    fn register_reports_bad_email() {
        let err = vouch_validate::validate::<RegisterRequest>(
            br#"{"username":"alice","email":"alice@","password":"long-enough"}"#,
        )
        .err()
        .unwrap();
        assert_eq!(err.to_string(), "email must be valid email address(es)");
    }

    #[test]
    fn register_reports_weak_password() {
        let err = vouch_validate::validate::<RegisterRequest>(
            br#"{"username":"alice","email":"alice@example.com","password":"short"}"#,
        )
        .err()
        .unwrap();
        assert_eq!(err.to_string(), "password must be at least 8 characters");
    }

    #[test]
    fn login_requires_both_fields() {
        let err = vouch_validate::validate::<LoginRequest>(b"{}").err().unwrap();
        assert_eq!(err.to_string(), "username, password required");
    }

    #[test]
    fn refresh_body_accepts_any_non_empty_token() {
        let body = vouch_validate::validate::<RefreshTokenRequest>(br#"{"refresh_token":"abc"}"#)
            .ok()
            .unwrap();
        assert_eq!(body.refresh_token, "abc");
    }
}

//! # Management Token Endpoints
//!
//! Used by trusted services, not end users. Both routes sit behind the
//! `X-API-Key` gate, which runs after the validation gate.

use axum::extract::State;
use axum::middleware::from_fn;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use vouch_token::TokenError;
use vouch_validate::{Constraint, FieldRule, Schema};

use super::MessageResponse;
use crate::auth::require_api_key;
use crate::error::AppError;
use crate::extractors::{validate_body, Validated};
use crate::state::AppState;

/// Access credential to check.
#[derive(Deserialize, ToSchema)]
pub struct ValidateAccessRequest {
    #[serde(default)]
    pub access_token: String,
}

impl Schema for ValidateAccessRequest {
    const RULES: &'static [FieldRule<Self>] = &[FieldRule {
        field: "access_token",
        accessor: |r| r.access_token.as_str(),
        constraints: &[Constraint::Required],
    }];
}

/// Refresh credential to revoke.
#[derive(Deserialize, ToSchema)]
pub struct InvalidateRefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

impl Schema for InvalidateRefreshRequest {
    const RULES: &'static [FieldRule<Self>] = &[FieldRule {
        field: "refresh_token",
        accessor: |r| r.refresh_token.as_str(),
        constraints: &[Constraint::Required],
    }];
}

/// Claims of a verified access credential.
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidateAccessResponse {
    pub valid: bool,
    pub user_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Build the management router.
///
/// Route layers apply outside-in in reverse order of declaration, so the
/// validation gate wraps the API-key gate.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/tokens/validate",
            post(validate_access)
                .layer(from_fn(require_api_key))
                .layer(from_fn(validate_body::<ValidateAccessRequest>)),
        )
        .route(
            "/tokens/invalidate",
            post(invalidate_refresh)
                .layer(from_fn(require_api_key))
                .layer(from_fn(validate_body::<InvalidateRefreshRequest>)),
        )
}

/// POST /tokens/validate: verify an access credential and return its claims.
#[utoipa::path(
    post,
    path = "/tokens/validate",
    request_body = ValidateAccessRequest,
    responses(
        (status = 200, description = "Credential is valid", body = ValidateAccessResponse),
        (status = 401, description = "Invalid access token or API key", body = crate::error::ErrorBody),
    ),
    security(("api_key" = [])),
    tag = "tokens"
)]
async fn validate_access(
    State(state): State<AppState>,
    body: Validated<ValidateAccessRequest>,
) -> Result<Json<ValidateAccessResponse>, AppError> {
    let claims = state
        .tokens
        .verify_access(&body.access_token)
        .map_err(|err| {
            tracing::debug!(reason = %err, "access credential rejected");
            AppError::Unauthorized("invalid access token".into())
        })?;

    Ok(Json(ValidateAccessResponse {
        valid: true,
        issued_at: claims.issued_at(),
        expires_at: claims.expires_at(),
        user_id: claims.sub,
    }))
}

/// POST /tokens/invalidate: revoke a refresh credential out-of-band.
#[utoipa::path(
    post,
    path = "/tokens/invalidate",
    request_body = InvalidateRefreshRequest,
    responses(
        (status = 200, description = "Revoked", body = MessageResponse),
        (status = 401, description = "Invalid API key", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown or expired refresh token", body = crate::error::ErrorBody),
    ),
    security(("api_key" = [])),
    tag = "tokens"
)]
async fn invalidate_refresh(
    State(state): State<AppState>,
    body: Validated<InvalidateRefreshRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let record = state
        .tokens
        .revoke_live(&body.refresh_token)
        .await
        .map_err(|err| match err {
            TokenError::NotFound | TokenError::Expired => {
                AppError::NotFound("refresh token not found".into())
            }
            other => AppError::from(other),
        })?;

    tracing::info!(subject = %record.subject, "refresh credential revoked by management call");

    Ok(Json(MessageResponse::new("token invalidated")))
}

//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI document
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "vouch credential service",
        version = "0.1.0",
        description = "Registration, login, refresh rotation, and management endpoints for JWT access credentials backed by opaque refresh credentials.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Auth
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::refresh,
        // Management
        crate::routes::tokens::validate_access,
        crate::routes::tokens::invalidate_refresh,
        // Health
        crate::health::health,
        crate::health::liveness,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::TokenPairResponse,
        crate::routes::MessageResponse,
        crate::routes::auth::RegisterRequest,
        crate::routes::auth::RegisterResponse,
        crate::routes::auth::LoginRequest,
        crate::routes::auth::RefreshTokenRequest,
        crate::routes::tokens::ValidateAccessRequest,
        crate::routes::tokens::ValidateAccessResponse,
        crate::routes::tokens::InvalidateRefreshRequest,
        crate::health::HealthReport,
        crate::health::ComponentHealth,
    )),
    modifiers(&ApiKeyScheme),
    tags(
        (name = "auth", description = "End-user credential flows"),
        (name = "tokens", description = "Management endpoints, require X-API-Key"),
        (name = "health", description = "Liveness and dependency health"),
    )
)]
pub struct ApiDoc;

/// Registers the `api_key` security scheme referenced by management routes.
struct ApiKeyScheme;

impl Modify for ApiKeyScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
        }
    }
}

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

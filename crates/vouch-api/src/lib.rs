//! # vouch-api: Credential Service over Axum
//!
//! Issues short-lived signed access credentials and long-lived opaque
//! refresh credentials, rotates them on refresh, and exposes management
//! endpoints that let trusted services validate access credentials and revoke
//! refresh credentials out-of-band.
//!
//! ## API Surface
//!
//! | Route                     | Module              | Gates              |
//! |---------------------------|---------------------|--------------------|
//! | `POST /auth/register`     | [`routes::auth`]    | validate           |
//! | `POST /auth/login`        | [`routes::auth`]    | validate           |
//! | `POST /auth/logout`       | [`routes::auth`]    | validate           |
//! | `POST /auth/refresh`      | [`routes::auth`]    | validate           |
//! | `POST /tokens/validate`   | [`routes::tokens`]  | validate, API key  |
//! | `POST /tokens/invalidate` | [`routes::tokens`]  | validate, API key  |
//! | `GET /health[/liveness]`  | [`health`]          |                    |
//! | `GET /openapi.json`       | [`openapi`]         |                    |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! SetRequestId → PropagateRequestId → TraceLayer → CatchPanic
//!     → [route] ValidationGate → [route] ApiKeyGate → Handler
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod health;
pub mod openapi;
pub mod password;
pub mod routes;
pub mod service;
pub mod state;
pub mod users;

use axum::body::Body;
use axum::http::{HeaderName, Request};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let api = Router::new()
        .merge(routes::auth::router())
        .merge(routes::tokens::router())
        .merge(openapi::router())
        .layer(axum::Extension(state.api_key.clone()))
        .with_state(state.clone());

    let health = health::router().with_state(state);

    Router::new()
        .merge(health)
        .merge(api)
        .layer(CatchPanicLayer::new())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

//! # Management API Key Gate
//!
//! Endpoints that validate access credentials or revoke refresh credentials
//! out-of-band are reserved for trusted services. Callers present a shared
//! key in the `X-API-Key` header; end-user credentials are never accepted
//! here.
//!
//! The expected key is injected into request extensions as an
//! [`ApiKey`] by the router.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::config::ApiKey;
use crate::error::AppError;

/// Header carrying the management API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Constant-time comparison of API keys.
///
/// When lengths differ, performs a dummy comparison so the rejection takes
/// about as long as a same-length mismatch.
fn constant_time_key_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Reject requests whose `X-API-Key` does not match the configured key.
pub async fn require_api_key(request: Request, next: Next) -> Response {
    let Some(expected) = request.extensions().get::<ApiKey>().cloned() else {
        return AppError::Internal("management API key not configured".into()).into_response();
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if constant_time_key_eq(key, expected.expose()) => next.run(request).await,
        Some(_) => {
            tracing::warn!(reason = "mismatch", "management request rejected");
            AppError::Unauthorized("invalid or missing API key".into()).into_response()
        }
        None => {
            tracing::warn!(reason = "missing header", "management request rejected");
            AppError::Unauthorized("invalid or missing API key".into()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::middleware::from_fn;
    use axum::routing::post;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app(key: &str) -> Router {
        Router::new()
            .route("/test", post(|| async { "ok" }))
            .layer(from_fn(require_api_key))
            .layer(axum::Extension(ApiKey::new(key)))
    }

    fn request(key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/test");
        if let Some(key) = key {
            builder = builder.header("X-API-Key", key);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn matching_key_passes() {
        let response = test_app("mgmt-key").oneshot(request(Some("mgmt-key"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn wrong_key_is_unauthorized() {
        let response = test_app("mgmt-key").oneshot(request(Some("mgmt-kez"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(err["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn missing_key_is_unauthorized() {
        let response = test_app("mgmt-key").oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_configuration_is_internal_error() {
        let app = Router::new()
            .route("/test", post(|| async { "ok" }))
            .layer(from_fn(require_api_key));
        let response = app.oneshot(request(Some("anything"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn key_comparison() {
        assert!(constant_time_key_eq("abc", "abc"));
        assert!(!constant_time_key_eq("abc", "abd"));
        assert!(!constant_time_key_eq("abc", "abcd"));
        assert!(!constant_time_key_eq("", "abc"));
    }
}

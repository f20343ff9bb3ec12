//! # Validation Gate
//!
//! [`validate_body`] is a per-route middleware that buffers the request
//! body, runs it through the payload shape's constraint table, and either
//! rejects the request or stores the typed payload in the request
//! extensions. Handlers receive it through the [`Validated`] extractor.
//!
//! ```ignore
//! .route(
//!     "/auth/login",
//!     post(login).layer(from_fn(validate_body::<LoginRequest>)),
//! )
//! ```
//!
//! A handler asking for a shape other than the one validated gets "absent"
//! from [`validated`] and a 500 from the extractor, never a type confusion.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::Extensions;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use vouch_validate::Schema;

use crate::error::AppError;

/// Largest request body the gate will buffer.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// A payload that passed the validation gate.
pub struct Validated<T>(Arc<T>);

impl<T> Clone for Validated<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> std::ops::Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// Look up a validated payload of shape `T`. `None` if the gate did not run
/// or validated a different shape.
pub fn validated<T: Schema>(extensions: &Extensions) -> Option<Validated<T>> {
    extensions.get::<Validated<T>>().cloned()
}

/// Parse and validate the body as `T` before any other gate or handler.
pub async fn validate_body<T: Schema>(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(error = %err, "request body could not be read");
            return AppError::BadRequest("invalid request body".into()).into_response();
        }
    };

    match vouch_validate::validate::<T>(&bytes) {
        Ok(payload) => {
            let mut request = Request::from_parts(parts, Body::from(bytes));
            request
                .extensions_mut()
                .insert(Validated(Arc::new(payload)));
            next.run(request).await
        }
        Err(err) => {
            tracing::debug!(error = %err, "request failed validation");
            AppError::from(err).into_response()
        }
    }
}

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for Validated<T>
where
    S: Send + Sync,
    T: Schema,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        validated::<T>(&parts.extensions)
            .ok_or_else(|| AppError::Internal("no validated body in request context".into()))
    }
}

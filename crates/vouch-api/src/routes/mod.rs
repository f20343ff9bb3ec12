//! # API Route Modules
//!
//! - `auth`: End-user flows: register, login, logout, refresh.
//! - `tokens`: Management endpoints behind the API key: access credential
//!   validation and out-of-band refresh revocation.
//!
//! Every route with a body runs [`crate::extractors::validate_body`] as its
//! outermost route layer, so malformed or invalid payloads are rejected
//! before the API-key gate or the handler sees them.

pub mod auth;
pub mod tokens;

use serde::Serialize;
use utoipa::ToSchema;
use vouch_token::CredentialPair;

/// Token type advertised alongside every issued pair.
pub const TOKEN_TYPE: &str = "Bearer";

/// A freshly issued credential pair.
#[derive(Serialize, ToSchema)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Always `"Bearer"`.
    pub token_type: String,
    /// Access credential lifetime in seconds.
    pub expires_in: u64,
}

impl TokenPairResponse {
    pub fn new(pair: CredentialPair, expires_in: u64) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in,
        }
    }
}

/// Plain acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

//! # Credential Errors
//!
//! [`StoreError`] is what a backend reports. [`TokenError`] is what the
//! lifecycle manager reports to its caller; it always carries the most
//! specific kind available so the boundary layer can pick a response code.

use thiserror::Error;

/// Failure of a [`crate::CredentialStore`] operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No entry under the key.
    #[error("refresh credential not found")]
    NotFound,

    /// The entry existed but its expiry has passed.
    #[error("refresh credential expired")]
    Expired,

    /// A save was attempted with `expires_at <= now`.
    #[error("expiry must be in the future")]
    InvalidExpiry,

    /// The backend could not be reached or returned garbage.
    #[error("credential store backend error: {0}")]
    Backend(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Backend(format!("corrupt refresh record: {err}"))
    }
}

/// Failure of a [`crate::TokenManager`] operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Caller-supplied data is unusable (empty subject, non-positive TTL).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The access credential could not be signed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The access credential's signature or algorithm does not match.
    #[error("access credential signature is invalid")]
    BadSignature,

    /// The access credential could not be decoded.
    #[error("access credential is malformed")]
    Malformed,

    /// The credential existed but has lapsed.
    #[error("credential expired")]
    Expired,

    /// The refresh credential is unknown or already consumed.
    #[error("refresh credential not found")]
    NotFound,

    /// The old refresh credential could not be removed, so no new pair was
    /// issued.
    #[error("refresh credential rotation failed: {0}")]
    RotationFailed(String),

    /// The credential store failed.
    #[error("credential store error: {0}")]
    Store(String),
}

impl From<StoreError> for TokenError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::Expired => Self::Expired,
            StoreError::InvalidExpiry => {
                Self::InvalidInput("refresh expiry must be in the future".into())
            }
            StoreError::Backend(msg) => Self::Store(msg),
        }
    }
}

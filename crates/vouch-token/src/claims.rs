//! Access credential claims and the credential pair handed to clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Claims carried by a signed access credential. Timestamps are Unix
/// seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user) id.
    pub sub: String,
    /// Issued at.
    pub iat: i64,
    /// Expires at. Always `iat + access_ttl`.
    pub exp: i64,
}

impl AccessClaims {
    /// `iat` as a timestamp.
    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or_default()
    }

    /// `exp` as a timestamp.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }
}

/// A single issued credential and the instant it lapses.
///
/// Custom `Debug` redacts the token.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// The credential as handed to the client.
    pub token: String,
    /// When the credential lapses.
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A freshly issued access + refresh credential pair.
///
/// Custom `Debug` redacts both tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
    /// Signed access credential.
    pub access_token: String,
    /// Opaque refresh credential.
    pub refresh_token: String,
    /// When the access credential lapses.
    pub access_expires_at: DateTime<Utc>,
    /// When the refresh credential lapses.
    pub refresh_expires_at: DateTime<Utc>,
}

impl CredentialPair {
    /// Assemble a pair from its two halves.
    pub fn new(access: IssuedToken, refresh: IssuedToken) -> Self {
        Self {
            access_token: access.token,
            refresh_token: refresh.token,
            access_expires_at: access.expires_at,
            refresh_expires_at: refresh.expires_at,
        }
    }
}

impl std::fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("access_expires_at", &self.access_expires_at)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .finish()
    }
}

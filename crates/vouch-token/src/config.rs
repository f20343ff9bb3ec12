//! Signing secret and credential lifetimes, fixed for the process lifetime.

use std::time::Duration;

use zeroize::Zeroizing;

/// Minimum HS256 key length accepted at startup, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Immutable credential configuration.
///
/// The secret is wiped from memory on drop. Custom `Debug` redacts it.
#[derive(Clone)]
pub struct TokenConfig {
    access_secret: Zeroizing<Vec<u8>>,
    /// Lifetime of an access credential.
    pub access_ttl: Duration,
    /// Lifetime of a refresh credential.
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    /// Build a configuration. Length and TTL checks belong to the caller
    /// that loads configuration; this constructor accepts anything.
    pub fn new(access_secret: impl Into<Vec<u8>>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            access_secret: Zeroizing::new(access_secret.into()),
            access_ttl,
            refresh_ttl,
        }
    }

    /// The HS256 signing key.
    pub fn access_secret(&self) -> &[u8] {
        &self.access_secret
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

//! # Credential Store
//!
//! Maps an opaque refresh credential to the subject it was issued for and
//! the instant it lapses. Backends must never yield an entry past its
//! expiry, and `delete` followed by `get` on one key must report
//! [`StoreError::NotFound`].
//!
//! | Backend            | Use                                   |
//! |--------------------|---------------------------------------|
//! | [`redis::RedisStore`]  | production; native key TTL, `GETDEL`  |
//! | [`memory::MemoryStore`] | tests and development fallback       |

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::health::HealthCheck;

/// What a refresh credential resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRecord {
    /// Subject the credential was issued for.
    pub subject: String,
    /// Instant after which the credential is dead.
    pub expires_at: DateTime<Utc>,
}

/// TTL key-value storage for refresh credentials.
#[async_trait]
pub trait CredentialStore: HealthCheck {
    /// Store `record` under `token`. Fails with
    /// [`StoreError::InvalidExpiry`] when `record.expires_at <= now`.
    async fn save(&self, token: &str, record: &RefreshRecord) -> Result<(), StoreError>;

    /// Look up `token` without consuming it.
    async fn get(&self, token: &str) -> Result<RefreshRecord, StoreError>;

    /// Remove `token` and return what it mapped to, atomically. Of two
    /// concurrent calls on one key, at most one sees the record.
    async fn take(&self, token: &str) -> Result<RefreshRecord, StoreError>;

    /// Remove `token`. Deleting an absent key succeeds.
    async fn delete(&self, token: &str) -> Result<(), StoreError>;
}

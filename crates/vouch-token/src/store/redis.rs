//! Redis credential store.
//!
//! Each refresh credential lives under `refresh:<token>` as a JSON
//! [`RefreshRecord`], with the residual lifetime set as the key's native
//! expiry (`PSETEX`). `take` is a single `GETDEL`.

use std::sync::Arc;

use ::redis::aio::ConnectionManager;
use ::redis::AsyncCommands;
use async_trait::async_trait;

use super::{CredentialStore, RefreshRecord};
use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;
use crate::health::HealthCheck;

/// Key namespace for refresh credentials.
pub const KEY_PREFIX: &str = "refresh:";

fn key_for(token: &str) -> String {
    format!("{KEY_PREFIX}{token}")
}

/// Credential store backed by a multiplexed, auto-reconnecting Redis
/// connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    clock: Arc<dyn Clock>,
}

impl RedisStore {
    /// Connect to `url` (e.g. `redis://localhost:6379/0`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = ::redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        tracing::info!("Connected to Redis");
        Ok(Self::from_manager(conn, Arc::new(SystemClock)))
    }

    /// Wrap an existing connection.
    pub fn from_manager(conn: ConnectionManager, clock: Arc<dyn Clock>) -> Self {
        Self { conn, clock }
    }

    fn decode(&self, raw: Option<String>) -> Result<RefreshRecord, StoreError> {
        let raw = raw.ok_or(StoreError::NotFound)?;
        let record: RefreshRecord = serde_json::from_str(&raw)?;
        if record.expires_at <= self.clock.now() {
            return Err(StoreError::Expired);
        }
        Ok(record)
    }
}

/// A lapsed record stays `Expired` whether or not its removal succeeded.
fn keep_expired(cleanup: ::redis::RedisResult<i64>) -> Result<RefreshRecord, StoreError> {
    if let Err(err) = cleanup {
        tracing::warn!(error = %err, "failed to remove lapsed refresh credential");
    }
    Err(StoreError::Expired)
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialStore for RedisStore {
    async fn save(&self, token: &str, record: &RefreshRecord) -> Result<(), StoreError> {
        let remaining_ms = (record.expires_at - self.clock.now()).num_milliseconds();
        if remaining_ms <= 0 {
            return Err(StoreError::InvalidExpiry);
        }
        let ttl_ms = remaining_ms
            .try_into()
            .map_err(|_| StoreError::InvalidExpiry)?;
        let payload = serde_json::to_string(record)?;

        let mut conn = self.conn.clone();
        let _: () = conn.pset_ex(key_for(token), payload, ttl_ms).await?;
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<RefreshRecord, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key_for(token)).await?;
        let result = self.decode(raw);
        if matches!(result, Err(StoreError::Expired)) {
            let cleanup = conn.del(key_for(token)).await;
            return keep_expired(cleanup);
        }
        result
    }

    async fn take(&self, token: &str) -> Result<RefreshRecord, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get_del(key_for(token)).await?;
        self.decode(raw)
    }

    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(key_for(token)).await?;
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for RedisStore {
    fn component(&self) -> &'static str {
        "cache"
    }

    async fn check(&self) -> Result<(), String> {
        let mut conn = self.conn.clone();
        let pong: String = ::redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| e.to_string())?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(format!("unexpected PING reply: {pong}"))
        }
    }
}

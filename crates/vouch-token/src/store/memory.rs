//! In-memory credential store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use super::{CredentialStore, RefreshRecord};
use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;
use crate::health::HealthCheck;

/// Minimum spacing between the sweeps `save` runs over the whole map.
pub const SWEEP_INTERVAL_SECS: i64 = 60;

/// Thread-safe, cloneable in-memory credential store.
///
/// The locks are `parking_lot` and are never held across an `.await`.
/// Expired entries are evicted on lookup, swept from the whole map by `save`
/// at most once per [`SWEEP_INTERVAL_SECS`], and on demand by
/// [`MemoryStore::purge_expired`].
#[derive(Clone)]
pub struct MemoryStore {
    data: Arc<RwLock<HashMap<String, RefreshRecord>>>,
    next_sweep: Arc<Mutex<DateTime<Utc>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Create an empty store on the wall clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store that reads time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            next_sweep: Arc::new(Mutex::new(DateTime::<Utc>::MIN_UTC)),
            clock,
        }
    }

    /// Number of stored entries, live or not yet evicted.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry whose expiry has passed. Returns how many went.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut guard = self.data.write();
        let before = guard.len();
        guard.retain(|_, record| record.expires_at > now);
        before - guard.len()
    }

    fn sweep_if_due(&self, data: &mut HashMap<String, RefreshRecord>, now: DateTime<Utc>) {
        let mut next = self.next_sweep.lock();
        if now < *next {
            return;
        }
        let before = data.len();
        data.retain(|_, record| record.expires_at > now);
        *next = now
            .checked_add_signed(chrono::Duration::seconds(SWEEP_INTERVAL_SECS))
            .unwrap_or(now);

        let swept = before - data.len();
        if swept > 0 {
            tracing::debug!(swept, "evicted lapsed refresh credentials");
        }
    }

    fn live(&self, record: RefreshRecord) -> Result<RefreshRecord, StoreError> {
        if record.expires_at <= self.clock.now() {
            Err(StoreError::Expired)
        } else {
            Ok(record)
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.len())
            .finish()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn save(&self, token: &str, record: &RefreshRecord) -> Result<(), StoreError> {
        let now = self.clock.now();
        if record.expires_at <= now {
            return Err(StoreError::InvalidExpiry);
        }
        let mut data = self.data.write();
        self.sweep_if_due(&mut data, now);
        data.insert(token.to_owned(), record.clone());
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<RefreshRecord, StoreError> {
        let record = self
            .data
            .read()
            .get(token)
            .cloned()
            .ok_or(StoreError::NotFound)?;

        let result = self.live(record);
        if result.is_err() {
            self.data.write().remove(token);
        }
        result
    }

    async fn take(&self, token: &str) -> Result<RefreshRecord, StoreError> {
        let record = self
            .data
            .write()
            .remove(token)
            .ok_or(StoreError::NotFound)?;
        self.live(record)
    }

    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        self.data.write().remove(token);
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    fn component(&self) -> &'static str {
        "cache"
    }

    async fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, Utc};

    fn store() -> (MemoryStore, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        (MemoryStore::with_clock(Arc::new(clock.clone())), clock)
    }

    fn record(clock: &ManualClock, ttl_secs: i64) -> RefreshRecord {
        RefreshRecord {
            subject: "u1".into(),
            expires_at: clock.now() + Duration::seconds(ttl_secs),
        }
    }

    #[tokio::test]
    async fn save_then_get() {
        let (store, clock) = store();
        let rec = record(&clock, 60);
        store.save("t1", &rec).await.unwrap();
        assert_eq!(store.get("t1").await.unwrap(), rec);
    }

    #[tokio::test]
    async fn save_rejects_past_and_present_expiry() {
        let (store, clock) = store();
        assert_eq!(
            store.save("t1", &record(&clock, 0)).await,
            Err(StoreError::InvalidExpiry)
        );
        assert_eq!(
            store.save("t1", &record(&clock, -1)).await,
            Err(StoreError::InvalidExpiry)
        );
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn get_unknown_is_not_found() {
        let (store, _) = store();
        assert_eq!(store.get("nope").await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn get_after_expiry_reports_expired_and_evicts() {
        let (store, clock) = store();
        store.save("t1", &record(&clock, 60)).await.unwrap();
        clock.advance(Duration::seconds(60));

        assert_eq!(store.get("t1").await, Err(StoreError::Expired));
        assert_eq!(store.get("t1").await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let (store, clock) = store();
        store.save("t1", &record(&clock, 60)).await.unwrap();
        store.delete("t1").await.unwrap();
        assert_eq!(store.get("t1").await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (store, _) = store();
        store.delete("never-existed").await.unwrap();
        store.delete("never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn take_consumes_once() {
        let (store, clock) = store();
        let rec = record(&clock, 60);
        store.save("t1", &rec).await.unwrap();

        assert_eq!(store.take("t1").await.unwrap(), rec);
        assert_eq!(store.take("t1").await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn take_of_lapsed_entry_removes_it() {
        let (store, clock) = store();
        store.save("t1", &record(&clock, 10)).await.unwrap();
        clock.advance(Duration::seconds(11));

        assert_eq!(store.take("t1").await, Err(StoreError::Expired));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn purge_drops_only_lapsed_entries() {
        let (store, clock) = store();
        store.save("short", &record(&clock, 10)).await.unwrap();
        store.save("long", &record(&clock, 100)).await.unwrap();
        clock.advance(Duration::seconds(50));

        assert_eq!(store.purge_expired(), 1);
        assert!(store.get("long").await.is_ok());
    }

    #[tokio::test]
    async fn save_sweeps_lapsed_entries_that_were_never_read() {
        let (store, clock) = store();
        for i in 0..1000 {
            store.save(&format!("t{i}"), &record(&clock, 60)).await.unwrap();
        }
        assert_eq!(store.len(), 1000);

        clock.advance(Duration::hours(1));
        store.save("fresh", &record(&clock, 60)).await.unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.get("fresh").await.is_ok());
    }

    #[tokio::test]
    async fn sweep_keeps_live_entries_and_waits_for_the_interval() {
        let (store, clock) = store();
        store.save("short", &record(&clock, 10)).await.unwrap();
        store.save("long", &record(&clock, 3600)).await.unwrap();

        // Lapsed, but the previous sweep was less than an interval ago.
        clock.advance(Duration::seconds(20));
        store.save("mid", &record(&clock, 3600)).await.unwrap();
        assert_eq!(store.len(), 3);

        clock.advance(Duration::seconds(SWEEP_INTERVAL_SECS));
        store.save("late", &record(&clock, 3600)).await.unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.get("short").await, Err(StoreError::NotFound));
        assert!(store.get("long").await.is_ok());
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        let (store, _) = store();
        assert_eq!(store.component(), "cache");
        assert!(store.check().await.is_ok());
    }
}

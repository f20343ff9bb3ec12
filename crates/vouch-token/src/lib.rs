//! # vouch-token: Credential Lifecycle
//!
//! Issues, verifies, rotates, and revokes the two credential kinds handed to
//! end users:
//!
//! - **Access credentials**: HS256-signed, self-contained, never persisted.
//!   Validity is the signature plus `exp > now`. There is no revocation list.
//! - **Refresh credentials**: 256 random bits, base64url without padding,
//!   correlated server-side to `(subject, expires_at)` in a
//!   [`CredentialStore`]. Each one is consumed at most once.
//!
//! ## Rotation
//!
//! ```text
//! exchange_refresh(old) ─ take(old) ─┬─ NotFound          → NotFound
//!                                    ├─ record, lapsed    → Expired
//!                                    ├─ backend failure   → RotationFailed
//!                                    └─ record, live      → issue_pair(subject)
//! ```
//!
//! `take` removes and returns the entry in one step, so two concurrent
//! exchanges of one token cannot both succeed.
//!
//! ## Crate Policy
//!
//! - Store backends sit behind the [`CredentialStore`] trait; the manager
//!   holds an `Arc<dyn CredentialStore>`.
//! - Time comes from an injected [`Clock`].
//! - Raw tokens and secrets are never logged.

pub mod claims;
pub mod clock;
pub mod config;
pub mod error;
pub mod health;
pub mod manager;
pub mod store;

pub use claims::{AccessClaims, CredentialPair, IssuedToken};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{TokenConfig, MIN_SECRET_LEN};
pub use error::{StoreError, TokenError};
pub use health::HealthCheck;
pub use manager::TokenManager;
pub use store::memory::MemoryStore;
pub use store::redis::RedisStore;
pub use store::{CredentialStore, RefreshRecord};

//! # User Directory
//!
//! Persistence of user records behind the [`UserDirectory`] trait.
//!
//! - [`postgres::PgUserDirectory`]: `users` table via SQLx, used when
//!   `DATABASE_URL` is set.
//! - [`memory::MemoryUserDirectory`]: in-process map for tests and
//!   development. State does not survive restarts.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;
use vouch_token::HealthCheck;

/// A stored user.
///
/// Custom `Debug` redacts the password hash.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// User directory failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// Username or email is already taken.
    #[error("username or email already exists")]
    Duplicate,

    /// The backing store failed.
    #[error("user directory error: {0}")]
    Backend(String),
}

/// Create and look up users.
#[async_trait]
pub trait UserDirectory: HealthCheck {
    /// Insert a user and return its new id. Fails with
    /// [`DirectoryError::Duplicate`] if the username or email is taken.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Uuid, DirectoryError>;

    /// Exact-match lookup by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError>;

    /// Lookup by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DirectoryError>;
}

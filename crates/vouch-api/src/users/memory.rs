//! In-memory user directory.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;
use vouch_token::HealthCheck;

use super::{DirectoryError, User, UserDirectory};

/// Thread-safe, cloneable in-memory user directory. Uniqueness of username
/// and email is checked under the same write lock as the insert.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserDirectory {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users.
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Uuid, DirectoryError> {
        let mut guard = self.users.write();
        if guard
            .values()
            .any(|u| u.username == username || u.email == email)
        {
            return Err(DirectoryError::Duplicate);
        }

        let id = Uuid::new_v4();
        guard.insert(
            id,
            User {
                id,
                username: username.to_owned(),
                email: email.to_owned(),
                password_hash: password_hash.to_owned(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DirectoryError> {
        Ok(self.users.read().get(&id).cloned())
    }
}

#[async_trait]
impl HealthCheck for MemoryUserDirectory {
    fn component(&self) -> &'static str {
        "database"
    }

    async fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor. Everything here is read-only after startup; the
//! mutable state lives behind the credential store and the user directory.

use std::sync::Arc;

use vouch_token::{Clock, CredentialStore, MemoryStore, SystemClock, TokenManager};

use crate::config::{ApiKey, AppConfig};
use crate::password::{PasswordError, PasswordHasher};
use crate::service::AuthService;
use crate::users::memory::MemoryUserDirectory;
use crate::users::UserDirectory;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Credential lifecycle manager.
    pub tokens: TokenManager,
    /// Registration / login / logout / refresh flows.
    pub auth: AuthService,
    /// Key required on management endpoints.
    pub api_key: ApiKey,
    /// Probed by `/health` under `cache`.
    pub store: Arc<dyn CredentialStore>,
    /// Probed by `/health` under `database`.
    pub users: Arc<dyn UserDirectory>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("tokens", &self.tokens)
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire state from loaded configuration and already-connected backends.
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn CredentialStore>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PasswordError> {
        let tokens = TokenManager::new(config.tokens.clone(), Arc::clone(&store), clock);
        let hasher = PasswordHasher::new(config.password_hash_cost)?;
        let auth = AuthService::new(Arc::clone(&users), hasher, tokens.clone());

        Ok(Self {
            tokens,
            auth,
            api_key: config.api_key.clone(),
            store,
            users,
        })
    }

    /// State over in-memory backends on the wall clock.
    pub fn in_memory(config: &AppConfig) -> Result<Self, PasswordError> {
        Self::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryUserDirectory::new()),
            Arc::new(SystemClock),
        )
    }
}

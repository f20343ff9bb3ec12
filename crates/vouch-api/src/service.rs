//! # Authentication Service
//!
//! Identity-bearing flows that combine the user directory, the password
//! hasher, and the credential lifecycle manager.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;
use vouch_token::{CredentialPair, TokenError, TokenManager};
use zeroize::Zeroizing;

use crate::password::{PasswordError, PasswordHasher};
use crate::users::{DirectoryError, UserDirectory};

/// Authentication flow failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown user or wrong password. The two are not distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Username or email already registered.
    #[error("username or email already exists")]
    UserExists,

    /// Refresh credential unknown or already consumed.
    #[error("invalid refresh token")]
    InvalidRefresh,

    /// Refresh credential lapsed.
    #[error("refresh token expired")]
    RefreshExpired,

    /// Credential issuance or storage failed.
    #[error(transparent)]
    Token(TokenError),

    /// The user directory failed.
    #[error(transparent)]
    Directory(DirectoryError),

    /// Password hashing failed.
    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl From<DirectoryError> for AuthError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Duplicate => Self::UserExists,
            other => Self::Directory(other),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::NotFound => Self::InvalidRefresh,
            TokenError::Expired => Self::RefreshExpired,
            other => Self::Token(other),
        }
    }
}

/// Registration, login, logout, and refresh.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserDirectory>,
    hasher: PasswordHasher,
    tokens: TokenManager,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("hasher", &self.hasher)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(users: Arc<dyn UserDirectory>, hasher: PasswordHasher, tokens: TokenManager) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Create a user and hand back a credential pair for immediate use.
    ///
    /// The username is trimmed; the email is trimmed and lower-cased.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(Uuid, CredentialPair), AuthError> {
        let username = username.trim();
        let email = email.trim().to_lowercase();

        let hash = self.hasher.hash(Zeroizing::new(password.to_owned())).await?;
        let user_id = self.users.create_user(username, &email, &hash).await?;
        tracing::info!(subject = %user_id, "user registered");

        let pair = self
            .tokens
            .issue_pair(&user_id.to_string())
            .await
            .map_err(|err| {
                tracing::warn!(
                    subject = %user_id,
                    error = %err,
                    "user created but credential issuance failed"
                );
                AuthError::Token(err)
            })?;

        Ok((user_id, pair))
    }

    /// Check a username/password and issue a credential pair.
    pub async fn login(&self, username: &str, password: &str) -> Result<CredentialPair, AuthError> {
        let username = username.trim();

        let Some(user) = self.users.find_by_username(username).await? else {
            tracing::info!(reason = "unknown user", "login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let ok = self
            .hasher
            .verify(Zeroizing::new(password.to_owned()), user.password_hash)
            .await?;
        if !ok {
            tracing::info!(subject = %user.id, reason = "wrong password", "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        self.tokens
            .issue_pair(&user.id.to_string())
            .await
            .map_err(AuthError::Token)
    }

    /// Revoke a refresh credential after checking that it is live.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let record = self.tokens.revoke_live(refresh_token).await?;
        tracing::info!(subject = %record.subject, "logged out");
        Ok(())
    }

    /// Exchange a refresh credential for a new pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, AuthError> {
        Ok(self.tokens.exchange_refresh(refresh_token).await?)
    }
}

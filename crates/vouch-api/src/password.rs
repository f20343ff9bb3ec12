//! # Password Hashing
//!
//! Argon2id with PHC-string output. The iteration count is the tunable
//! cost; memory and parallelism stay at the library defaults. Hashing is
//! CPU-bound, so the async entry points run it on the blocking pool.

use argon2::password_hash::{self, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand_core::OsRng;
use thiserror::Error;
use zeroize::Zeroizing;

/// Default Argon2id iteration count.
pub const DEFAULT_COST: u32 = 3;

/// Password hashing failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Invalid cost parameters.
    #[error("invalid password hash parameters: {0}")]
    Params(String),

    /// Hashing failed, or a stored hash could not be parsed.
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// The blocking task was cancelled or panicked.
    #[error("password hashing task failed: {0}")]
    Task(String),
}

/// Argon2id hasher with a fixed cost.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("t_cost", &self.params.t_cost())
            .field("m_cost", &self.params.m_cost())
            .finish()
    }
}

impl PasswordHasher {
    /// Build a hasher with `cost` iterations.
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        let params = Params::new(
            Params::DEFAULT_M_COST,
            cost,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| PasswordError::Params(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash `password` on the current thread.
    pub fn hash_blocking(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    /// Check `password` against a stored PHC string on the current thread.
    ///
    /// The parameters embedded in the stored hash are used, so hashes made
    /// under an older cost still verify.
    pub fn verify_blocking(&self, password: &str, stored: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(stored).map_err(|e| PasswordError::Hash(e.to_string()))?;
        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::Hash(e.to_string())),
        }
    }

    /// Hash `password` on the blocking pool.
    pub async fn hash(&self, password: Zeroizing<String>) -> Result<String, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash_blocking(&password))
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))?
    }

    /// Verify `password` against `stored` on the blocking pool.
    pub async fn verify(
        &self,
        password: Zeroizing<String>,
        stored: String,
    ) -> Result<bool, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify_blocking(&password, &stored))
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(1).unwrap()
    }

    #[test]
    fn hash_is_argon2id_phc() {
        let hash = hasher().hash_blocking("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("t=1"));
    }

    #[test]
    fn verify_accepts_right_and_rejects_wrong() {
        let h = hasher();
        let hash = h.hash_blocking("correct horse").unwrap();
        assert!(h.verify_blocking("correct horse", &hash).unwrap());
        assert!(!h.verify_blocking("battery staple", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let h = hasher();
        assert_ne!(
            h.hash_blocking("pw12345678").unwrap(),
            h.hash_blocking("pw12345678").unwrap()
        );
    }

    #[test]
    fn hash_from_another_cost_still_verifies() {
        let old = PasswordHasher::new(2).unwrap().hash_blocking("pw12345678").unwrap();
        assert!(hasher().verify_blocking("pw12345678", &old).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(hasher().verify_blocking("pw", "not-a-phc-string").is_err());
    }

    #[test]
    fn zero_cost_is_rejected() {
        assert!(matches!(PasswordHasher::new(0), Err(PasswordError::Params(_))));
    }

    #[tokio::test]
    async fn async_round_trip() {
        let h = hasher();
        let hash = h.hash(Zeroizing::new("pw12345678".into())).await.unwrap();
        assert!(h.verify(Zeroizing::new("pw12345678".into()), hash).await.unwrap());
    }
}

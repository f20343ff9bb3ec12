//! # Credential Lifecycle Manager
//!
//! The only component that signs access credentials or writes refresh
//! credentials. Every operation returns the most specific [`TokenError`]
//! available and never retries internally.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand_core::{OsRng, RngCore};
use zeroize::Zeroizing;

use crate::claims::{AccessClaims, CredentialPair, IssuedToken};
use crate::clock::Clock;
use crate::config::TokenConfig;
use crate::error::{StoreError, TokenError};
use crate::store::{CredentialStore, RefreshRecord};

/// Random bytes per refresh credential (256 bits).
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// The one algorithm access credentials are signed and verified with.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Issues, verifies, rotates, and revokes credentials.
#[derive(Clone)]
pub struct TokenManager {
    config: TokenConfig,
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Build a manager over `store`, reading time from `clock`.
    pub fn new(config: TokenConfig, store: Arc<dyn CredentialStore>, clock: Arc<dyn Clock>) -> Self {
        let encoding = EncodingKey::from_secret(config.access_secret());
        let decoding = DecodingKey::from_secret(config.access_secret());

        // Expiry is checked against the injected clock, not the library's.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            config,
            store,
            clock,
            encoding,
            decoding,
            validation,
        }
    }

    /// Lifetime of an access credential.
    pub fn access_ttl(&self) -> Duration {
        self.config.access_ttl
    }

    /// Lifetime of a refresh credential.
    pub fn refresh_ttl(&self) -> Duration {
        self.config.refresh_ttl
    }

    /// The backing credential store.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    // ── Issuance ────────────────────────────────────────────────────

    /// Mint a refresh credential for `subject` and record it in the store.
    ///
    /// A non-positive refresh TTL makes the store reject the expiry, which
    /// surfaces as [`TokenError::InvalidInput`].
    pub async fn issue_refresh(&self, subject: &str) -> Result<IssuedToken, TokenError> {
        require_subject(subject)?;

        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(to_chrono(self.config.refresh_ttl)?)
            .ok_or_else(|| TokenError::InvalidInput("refresh TTL out of range".into()))?;
        let token = random_token();

        let record = RefreshRecord {
            subject: subject.to_owned(),
            expires_at,
        };
        self.store.save(&token, &record).await?;

        tracing::debug!(subject, "issued refresh credential");
        Ok(IssuedToken { token, expires_at })
    }

    /// Sign an access credential for `subject`.
    ///
    /// Claims carry whole seconds, so an access TTL with a fractional part
    /// is rejected as [`TokenError::InvalidInput`].
    pub fn issue_access(&self, subject: &str) -> Result<IssuedToken, TokenError> {
        require_subject(subject)?;

        let ttl = self.config.access_ttl;
        if ttl.is_zero() || ttl.subsec_nanos() != 0 {
            return Err(TokenError::InvalidInput(
                "access TTL must be a positive whole number of seconds".into(),
            ));
        }

        let iat = self.clock.now().timestamp();
        let exp = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|ttl| iat.checked_add(ttl))
            .ok_or_else(|| TokenError::InvalidInput("access TTL out of range".into()))?;
        let claims = AccessClaims {
            sub: subject.to_owned(),
            iat,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at(),
        })
    }

    /// Issue a refresh credential and then an access credential.
    ///
    /// If signing fails after the refresh write, the refresh entry is
    /// removed best-effort; a failed removal is logged, not returned.
    pub async fn issue_pair(&self, subject: &str) -> Result<CredentialPair, TokenError> {
        let refresh = self.issue_refresh(subject).await?;

        let access = match self.issue_access(subject) {
            Ok(access) => access,
            Err(err) => {
                if let Err(cleanup) = self.store.delete(&refresh.token).await {
                    tracing::warn!(
                        subject,
                        error = %cleanup,
                        "failed to remove orphaned refresh credential"
                    );
                }
                return Err(err);
            }
        };

        Ok(CredentialPair::new(access, refresh))
    }

    // ── Verification ────────────────────────────────────────────────

    /// Check an access credential's algorithm, signature, and expiry.
    /// Never touches the store.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let data = jsonwebtoken::decode::<AccessClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::BadSignature
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?;

        let claims = data.claims;
        if claims.exp <= self.clock.now().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Read-only lookup of a refresh credential.
    pub async fn inspect_refresh(&self, token: &str) -> Result<RefreshRecord, TokenError> {
        let record = self.store.get(token).await?;
        if record.expires_at <= self.clock.now() {
            self.discard_lapsed(token).await;
            return Err(TokenError::Expired);
        }
        Ok(record)
    }

    // ── Rotation & revocation ───────────────────────────────────────

    /// Consume `old` and issue a fresh pair for its subject.
    ///
    /// The old credential is removed before anything new is issued. If
    /// issuance then fails, the subject holds no refresh credential and must
    /// authenticate again.
    pub async fn exchange_refresh(&self, old: &str) -> Result<CredentialPair, TokenError> {
        let record = match self.store.take(old).await {
            Ok(record) => record,
            Err(StoreError::NotFound) => return Err(TokenError::NotFound),
            Err(StoreError::Expired) => return Err(TokenError::Expired),
            Err(err) => {
                tracing::error!(error = %err, "could not consume refresh credential");
                return Err(TokenError::RotationFailed(err.to_string()));
            }
        };

        if record.expires_at <= self.clock.now() {
            return Err(TokenError::Expired);
        }

        self.issue_pair(&record.subject).await.map_err(|err| {
            tracing::warn!(
                subject = %record.subject,
                error = %err,
                "refresh credential consumed but reissue failed"
            );
            err
        })
    }

    /// Revoke a refresh credential that is still live, returning its record.
    /// Unknown or lapsed credentials fail `NotFound` / `Expired`.
    pub async fn revoke_live(&self, token: &str) -> Result<RefreshRecord, TokenError> {
        let record = self.inspect_refresh(token).await?;
        self.revoke(token).await?;
        Ok(record)
    }

    /// Delete a refresh credential. Idempotent.
    pub async fn revoke(&self, token: &str) -> Result<(), TokenError> {
        self.store.delete(token).await?;
        Ok(())
    }

    async fn discard_lapsed(&self, token: &str) {
        if let Err(err) = self.store.delete(token).await {
            tracing::warn!(error = %err, "failed to remove lapsed refresh credential");
        }
    }
}

fn require_subject(subject: &str) -> Result<(), TokenError> {
    if subject.is_empty() {
        Err(TokenError::InvalidInput("subject must not be empty".into()))
    } else {
        Ok(())
    }
}

fn to_chrono(ttl: Duration) -> Result<chrono::Duration, TokenError> {
    chrono::Duration::from_std(ttl)
        .map_err(|_| TokenError::InvalidInput("refresh TTL out of range".into()))
}

/// 256 bits from the OS RNG, base64url without padding (43 characters).
fn random_token() -> String {
    let mut bytes = Zeroizing::new([0u8; REFRESH_TOKEN_BYTES]);
    OsRng.fill_bytes(bytes.as_mut());
    URL_SAFE_NO_PAD.encode(bytes.as_ref())
}

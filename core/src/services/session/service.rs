//! Session manager implementation

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, warn};

use crate::domain::entities::revocation::RevocationKey;
use crate::domain::entities::token::{AccessToken, Claims, Subject, TokenKind, TokenPair};
use crate::errors::{DomainError, StoreError, TokenError};
use crate::repositories::RevocationStore;
use crate::services::token::{Clock, SystemClock, TokenCodec, TokenServiceConfig};

use super::bearer::extract_bearer_token;

/// Issues, validates and revokes sessions
///
/// A token is live only while its signature and expiry verify AND its entry
/// is present in the revocation store. Every check fails closed.
pub struct SessionManager<S: RevocationStore> {
    store: S,
    codec: TokenCodec,
    config: TokenServiceConfig,
}

impl<S: RevocationStore> std::fmt::Debug for SessionManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("codec", &self.codec)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: RevocationStore> SessionManager<S> {
    /// Creates a new session manager on wall-clock time
    ///
    /// # Arguments
    ///
    /// * `store` - Revocation store handle
    /// * `config` - Token signing configuration
    ///
    /// # Returns
    ///
    /// A new `SessionManager` or a configuration error
    pub fn new(store: S, config: TokenServiceConfig) -> Result<Self, DomainError> {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Creates a new session manager with an explicit clock
    pub fn with_clock(
        store: S,
        config: TokenServiceConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DomainError> {
        let codec = TokenCodec::new(&config, clock)?;
        Ok(Self {
            store,
            codec,
            config,
        })
    }

    /// The underlying revocation store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The codec used to sign and verify tokens
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Mints an access/refresh pair for a subject and records both
    ///
    /// The two store writes run concurrently. If either fails the whole
    /// operation fails, and a write that did succeed is rolled back on a
    /// best-effort basis.
    ///
    /// # Arguments
    ///
    /// * `subject_id` - The user's id
    /// * `email` - The user's email, embedded in the claims when present
    ///
    /// # Returns
    ///
    /// * `Ok(TokenPair)` - Both tokens are live
    /// * `Err(TokenError::IssuanceFailed)` - Signing or a store write failed
    pub async fn issue_session(
        &self,
        subject_id: i64,
        email: Option<&str>,
    ) -> Result<TokenPair, TokenError> {
        let subject = Subject::new(subject_id, email.map(str::to_owned));
        let access_ttl = self.config.access_ttl();
        let refresh_ttl = self.config.refresh_ttl();

        let access_token = self.codec.encode(&subject, access_ttl)?;
        let refresh_token = self.codec.encode(&subject, refresh_ttl)?;

        let (access_recorded, refresh_recorded) = tokio::join!(
            self.store.record(
                subject_id,
                TokenKind::Access,
                &access_token,
                ttl_seconds(access_ttl)
            ),
            self.store.record(
                subject_id,
                TokenKind::Refresh,
                &refresh_token,
                ttl_seconds(refresh_ttl)
            ),
        );

        match (access_recorded, refresh_recorded) {
            (Ok(()), Ok(())) => {}
            (Err(e), Ok(())) => {
                self.roll_back(subject_id, TokenKind::Refresh, &refresh_token)
                    .await;
                return Err(issuance_failed(subject_id, e));
            }
            (Ok(()), Err(e)) => {
                self.roll_back(subject_id, TokenKind::Access, &access_token)
                    .await;
                return Err(issuance_failed(subject_id, e));
            }
            (Err(e), Err(_)) => return Err(issuance_failed(subject_id, e)),
        }

        info!(subject_id, "Issued new session");

        Ok(TokenPair::new(
            access_token,
            refresh_token,
            access_ttl.num_seconds(),
            refresh_ttl.num_seconds(),
        ))
    }

    /// Validates a token of the given kind
    ///
    /// Decodes first (local, catches malformed and expired tokens), then
    /// confirms the entry in the store. A store failure rejects the token.
    ///
    /// # Returns
    ///
    /// * `Ok(Claims)` - Token is live
    /// * `Err(TokenError)` - `Malformed`, `InvalidSignature`, `Expired`,
    ///   `Revoked` or `StoreUnavailable`
    pub async fn validate(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let claims = self.codec.decode(token).map_err(|e| {
            debug!(kind = %kind, error = %e, "Token failed verification");
            e
        })?;

        match self.store.exists(claims.subject_id, kind, token).await {
            Ok(true) => Ok(claims),
            Ok(false) => {
                let key = RevocationKey::new(claims.subject_id, kind, token);
                debug!(
                    subject_id = claims.subject_id,
                    kind = %kind,
                    fingerprint = key.short_fingerprint(),
                    "Token not present in revocation store"
                );
                Err(TokenError::Revoked)
            }
            Err(e) => {
                warn!(
                    subject_id = claims.subject_id,
                    kind = %kind,
                    error = %e,
                    "Revocation store unavailable, rejecting token"
                );
                Err(store_unavailable(e))
            }
        }
    }

    /// Validates the access token carried in an `Authorization` header
    ///
    /// # Arguments
    ///
    /// * `authorization` - Raw header value, if the request had one
    ///
    /// # Returns
    ///
    /// * `Ok(Claims)` - Caller is authenticated as `claims.subject_id`
    /// * `Err(TokenError::Malformed)` - Header missing or not a bearer credential
    /// * `Err(TokenError)` - Any failure from `validate`
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<Claims, TokenError> {
        let token = authorization
            .and_then(extract_bearer_token)
            .ok_or(TokenError::Malformed)?;
        self.validate(token, TokenKind::Access).await
    }

    /// Exchanges a live refresh token for a brand-new access token
    ///
    /// The refresh token itself is not rotated, and previously issued access
    /// tokens stay valid until they expire or are invalidated.
    ///
    /// # Returns
    ///
    /// * `Ok(AccessToken)` - The new, recorded access token
    /// * `Err(TokenError)` - Refresh token rejected, or `IssuanceFailed`
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessToken, TokenError> {
        let claims = self.validate(refresh_token, TokenKind::Refresh).await?;

        let ttl = self.config.access_ttl();
        let access_token = self.codec.encode(&claims.subject(), ttl)?;

        self.store
            .record(
                claims.subject_id,
                TokenKind::Access,
                &access_token,
                ttl_seconds(ttl),
            )
            .await
            .map_err(|e| issuance_failed(claims.subject_id, e))?;

        debug!(subject_id = claims.subject_id, "Issued access token from refresh token");

        Ok(AccessToken::new(access_token, ttl.num_seconds()))
    }

    /// Revokes a single token, e.g. on logout
    ///
    /// The token must still verify; an expired or forged token has nothing
    /// left to revoke and is reported as such.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Entry removed
    /// * `Ok(false)` - Token was already absent from the store
    pub async fn revoke(&self, token: &str, kind: TokenKind) -> Result<bool, TokenError> {
        let claims = self.codec.decode(token)?;

        let removed = self
            .store
            .revoke(claims.subject_id, kind, token)
            .await
            .map_err(store_unavailable)?;

        info!(subject_id = claims.subject_id, kind = %kind, removed, "Revoked token");
        Ok(removed)
    }

    /// Invalidates every token issued to a subject
    ///
    /// Called after a credential change. Tokens whose signature and expiry
    /// still verify are rejected as `Revoked` from then on.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of entries removed
    /// * `Err(TokenError::StoreUnavailable)` - Nothing can be assumed removed
    pub async fn invalidate_subject(&self, subject_id: i64) -> Result<usize, TokenError> {
        let removed = self
            .store
            .invalidate_all(subject_id)
            .await
            .map_err(|e| {
                warn!(subject_id, error = %e, "Failed to invalidate sessions");
                store_unavailable(e)
            })?;

        info!(subject_id, removed, "Invalidated all sessions");
        Ok(removed)
    }

    async fn roll_back(&self, subject_id: i64, kind: TokenKind, token: &str) {
        if let Err(e) = self.store.revoke(subject_id, kind, token).await {
            warn!(
                subject_id,
                kind = %kind,
                error = %e,
                "Could not roll back partially issued session"
            );
        }
    }
}

fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.num_seconds().max(1) as u64
}

fn issuance_failed(subject_id: i64, err: StoreError) -> TokenError {
    warn!(subject_id, error = %err, "Failed to record issued token");
    TokenError::IssuanceFailed {
        message: err.to_string(),
    }
}

fn store_unavailable(err: StoreError) -> TokenError {
    TokenError::StoreUnavailable {
        message: err.to_string(),
    }
}

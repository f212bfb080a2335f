//! Redis-backed revocation store
//!
//! Layout per subject (all keys share the `{<subject_id>}` hash tag):
//! - `session:{<id>}:<kind>:<sha256(token)>` - empty marker, TTL = token lifetime
//! - `session:{<id>}:index` - sorted set of the subject's entry keys, scored
//!   by entry expiry; expired members are pruned on every record
//!
//! Lookups and single deletes use exact keys. Bulk invalidation reads the
//! index and removes everything it lists in one transaction, so no scan over
//! the keyspace is ever needed.

use async_trait::async_trait;
use tracing::{debug, info};

use quill_core::domain::entities::revocation::{index_key, RevocationKey};
use quill_core::domain::entities::token::TokenKind;
use quill_core::errors::StoreError;
use quill_core::repositories::RevocationStore;

use super::redis_client::RedisClient;
use crate::config::CacheConfig;
use crate::InfrastructureError;

/// Revocation store on top of [`RedisClient`]
#[derive(Clone)]
pub struct RedisRevocationStore {
    client: RedisClient,
}

impl RedisRevocationStore {
    /// Create a store over an existing client
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Connect to Redis and create a store
    pub async fn connect(config: CacheConfig) -> Result<Self, InfrastructureError> {
        let client = RedisClient::new(config).await?;
        Ok(Self::new(client))
    }

    /// PING the backing Redis instance
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        self.client.health_check().await
    }

    /// Remaining TTL of a token's entry, in seconds
    pub async fn entry_ttl(
        &self,
        subject_id: i64,
        kind: TokenKind,
        token: &str,
    ) -> Result<Option<i64>, InfrastructureError> {
        let key = RevocationKey::new(subject_id, kind, token);
        self.client.ttl(&self.entry_key(&key)).await
    }

    fn entry_key(&self, key: &RevocationKey) -> String {
        self.client.make_key(&key.entry_key())
    }

    fn index_key(&self, subject_id: i64) -> String {
        self.client.make_key(&index_key(subject_id))
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn record(
        &self,
        subject_id: i64,
        kind: TokenKind,
        token: &str,
        ttl_seconds: u64,
    ) -> Result<(), StoreError> {
        let key = RevocationKey::new(subject_id, kind, token);
        self.client
            .set_indexed(&self.entry_key(&key), &self.index_key(subject_id), ttl_seconds)
            .await?;

        debug!(
            subject_id,
            kind = %kind,
            fingerprint = key.short_fingerprint(),
            ttl_seconds,
            "Recorded token"
        );
        Ok(())
    }

    async fn exists(
        &self,
        subject_id: i64,
        kind: TokenKind,
        token: &str,
    ) -> Result<bool, StoreError> {
        let key = RevocationKey::new(subject_id, kind, token);
        Ok(self.client.exists(&self.entry_key(&key)).await?)
    }

    async fn revoke(
        &self,
        subject_id: i64,
        kind: TokenKind,
        token: &str,
    ) -> Result<bool, StoreError> {
        let key = RevocationKey::new(subject_id, kind, token);
        Ok(self
            .client
            .delete_indexed(&self.entry_key(&key), &self.index_key(subject_id))
            .await?)
    }

    async fn invalidate_all(&self, subject_id: i64) -> Result<usize, StoreError> {
        let index = self.index_key(subject_id);
        let members = self.client.index_members(&index).await?;
        let removed = self.client.delete_index_members(&index, &members).await?;

        info!(
            subject_id,
            listed = members.len(),
            removed,
            "Invalidated subject entries"
        );
        Ok(removed)
    }
}

impl From<InfrastructureError> for StoreError {
    fn from(err: InfrastructureError) -> Self {
        match &err {
            InfrastructureError::Cache(e) if is_unreachable(e) => StoreError::unavailable(err.to_string()),
            InfrastructureError::Cache(_) => StoreError::rejected(err.to_string()),
            _ => StoreError::unavailable(err.to_string()),
        }
    }
}

/// Whether a Redis error means the server could not be reached or is not serving
pub(crate) fn is_unreachable(error: &redis::RedisError) -> bool {
    error.is_io_error()
        || error.is_timeout()
        || error.is_connection_refusal()
        || error.is_connection_dropped()
        || matches!(
            error.kind(),
            redis::ErrorKind::BusyLoadingError
                | redis::ErrorKind::TryAgain
                | redis::ErrorKind::ClusterDown
                | redis::ErrorKind::MasterDown
        )
}

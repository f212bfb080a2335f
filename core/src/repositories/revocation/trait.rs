//! Revocation store trait defining the interface for live-token bookkeeping.

use async_trait::async_trait;

use crate::domain::entities::token::TokenKind;
use crate::errors::StoreError;

/// Store of currently honoured tokens
///
/// An entry's presence means the token is still usable. Its absence means the
/// token was never issued, has expired or was revoked; the store does not
/// distinguish the three.
///
/// # Failure policy
/// Implementations must surface connectivity problems as `StoreError` and
/// never report them as a missing entry.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Record a freshly issued token
    ///
    /// # Arguments
    /// * `subject_id` - Owner of the token
    /// * `kind` - Access or refresh
    /// * `token` - The encoded token
    /// * `ttl_seconds` - Lifetime of the entry, mirroring the token's
    ///
    /// # Returns
    /// * `Ok(())` - Entry visible to `exists` immediately; re-recording the
    ///   same token resets its TTL
    /// * `Err(StoreError)` - Write failed
    ///
    /// # Example
    /// ```no_run
    /// # use quill_core::repositories::RevocationStore;
    /// # use quill_core::domain::entities::token::TokenKind;
    /// # async fn example(store: &impl RevocationStore) -> Result<(), Box<dyn std::error::Error>> {
    /// store.record(42, TokenKind::Access, "eyJhbGciOi...", 900).await?;
    /// # Ok(())
    /// # }
    /// ```
    async fn record(
        &self,
        subject_id: i64,
        kind: TokenKind,
        token: &str,
        ttl_seconds: u64,
    ) -> Result<(), StoreError>;

    /// Check whether a token is still live
    ///
    /// # Returns
    /// * `Ok(true)` - Entry present
    /// * `Ok(false)` - Entry absent
    /// * `Err(StoreError)` - Could not tell
    async fn exists(&self, subject_id: i64, kind: TokenKind, token: &str)
        -> Result<bool, StoreError>;

    /// Delete a single entry
    ///
    /// # Returns
    /// * `Ok(true)` - Entry was present and is now gone
    /// * `Ok(false)` - Nothing to delete
    async fn revoke(&self, subject_id: i64, kind: TokenKind, token: &str)
        -> Result<bool, StoreError>;

    /// Delete every entry of a subject, across both token kinds, in one
    /// uninterruptible submission
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of entries removed
    async fn invalidate_all(&self, subject_id: i64) -> Result<usize, StoreError>;
}

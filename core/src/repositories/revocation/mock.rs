//! Mock implementation of RevocationStore for testing

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::revocation::{subject_prefix, RevocationKey};
use crate::domain::entities::token::TokenKind;
use crate::errors::StoreError;
use crate::services::token::{Clock, SystemClock};

use super::r#trait::RevocationStore;

/// In-memory revocation store
///
/// Clones share state, so a test can keep a handle while the session
/// manager owns another. Entries expire against the injected clock.
#[derive(Clone)]
pub struct MockRevocationStore {
    entries: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
    clock: Arc<dyn Clock>,
    unavailable: Arc<AtomicBool>,
    failing_kind: Arc<std::sync::Mutex<Option<TokenKind>>>,
}

impl MockRevocationStore {
    /// Create a new mock store on wall-clock time
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a new mock store on the given clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            clock,
            unavailable: Arc::new(AtomicBool::new(false)),
            failing_kind: Arc::new(std::sync::Mutex::new(None)),
        }
    }

    /// Make every operation fail as if the store were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make `record` fail for one token kind only
    pub fn fail_records_of(&self, kind: Option<TokenKind>) {
        *self.failing_kind.lock().unwrap() = kind;
    }

    /// Number of unexpired entries
    pub async fn live_entries(&self) -> usize {
        let now = self.clock.now();
        self.entries
            .read()
            .await
            .values()
            .filter(|expires_at| **expires_at > now)
            .count()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("mock store offline"));
        }
        Ok(())
    }
}

impl Default for MockRevocationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RevocationStore for MockRevocationStore {
    async fn record(
        &self,
        subject_id: i64,
        kind: TokenKind,
        token: &str,
        ttl_seconds: u64,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let failing = *self.failing_kind.lock().unwrap();
        if failing == Some(kind) {
            return Err(StoreError::rejected(format!("{} write refused", kind)));
        }

        let key = RevocationKey::new(subject_id, kind, token).entry_key();
        let expires_at = self.clock.now() + Duration::seconds(ttl_seconds as i64);
        self.entries.write().await.insert(key, expires_at);
        Ok(())
    }

    async fn exists(
        &self,
        subject_id: i64,
        kind: TokenKind,
        token: &str,
    ) -> Result<bool, StoreError> {
        self.check_available()?;

        let key = RevocationKey::new(subject_id, kind, token).entry_key();
        let now = self.clock.now();
        Ok(self
            .entries
            .read()
            .await
            .get(&key)
            .map_or(false, |expires_at| *expires_at > now))
    }

    async fn revoke(
        &self,
        subject_id: i64,
        kind: TokenKind,
        token: &str,
    ) -> Result<bool, StoreError> {
        self.check_available()?;

        let key = RevocationKey::new(subject_id, kind, token).entry_key();
        let now = self.clock.now();
        Ok(self
            .entries
            .write()
            .await
            .remove(&key)
            .map_or(false, |expires_at| expires_at > now))
    }

    async fn invalidate_all(&self, subject_id: i64) -> Result<usize, StoreError> {
        self.check_available()?;

        let prefix = format!("{}:", subject_prefix(subject_id));
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let mut live_removed = 0;
        entries.retain(|key, expires_at| {
            let owned = key.starts_with(&prefix);
            if owned && *expires_at > now {
                live_removed += 1;
            }
            !owned
        });
        Ok(live_removed)
    }
}

//! Redis cache client implementation
//!
//! This module provides a Redis client with a self-reconnecting connection,
//! retry logic, and the indexed-key operations the revocation store is built
//! on. An index is a sorted set of entry keys scored by their expiry (unix
//! seconds). Writes that touch an entry and its index are submitted as one
//! `MULTI/EXEC` transaction.

use chrono::Utc;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError, RedisResult};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::CacheConfig;
use crate::InfrastructureError;

/// Upper bound for the exponential backoff between attempts
const MAX_BACKOFF_MS: u64 = 5000;

/// Redis cache client with retry logic
///
/// Cheap to clone; clones share the underlying connection, which is
/// re-established after the server drops it.
#[derive(Clone)]
pub struct RedisClient {
    /// Multiplexed connection that reconnects on failure
    connection: ConnectionManager,
    /// Configuration used to create this client
    config: CacheConfig,
    /// Maximum number of attempts for operations
    max_retries: u32,
    /// Base delay between retries (exponential backoff)
    retry_delay_ms: u64,
}

impl RedisClient {
    /// Create a new Redis client
    ///
    /// # Arguments
    /// * `config` - Connection settings and retry policy
    ///
    /// # Returns
    /// * `Result<Self, InfrastructureError>` - Redis client or error
    ///
    /// # Example
    /// ```no_run
    /// use quill_infra::config::CacheConfig;
    /// use quill_infra::cache::RedisClient;
    ///
    /// async fn create_client() -> Result<RedisClient, Box<dyn std::error::Error>> {
    ///     let config = CacheConfig::new("localhost", 6379).with_password("secret");
    ///     let client = RedisClient::new(config).await?;
    ///     Ok(client)
    /// }
    /// ```
    pub async fn new(config: CacheConfig) -> Result<Self, InfrastructureError> {
        let url = config.connection_url();
        let max_retries = config.max_retries.max(1);
        let retry_delay_ms = config.retry_delay_ms;

        info!("Creating Redis client with URL: {}", mask_url(&url));

        let client = Client::open(url.as_str()).map_err(|e| {
            error!("Failed to parse Redis URL: {}", e);
            InfrastructureError::Config(format!("Invalid Redis URL: {}", e))
        })?;

        let connection =
            Self::create_connection_with_retry(client, max_retries, retry_delay_ms).await?;

        info!("Redis client created successfully");

        Ok(Self {
            connection,
            config,
            max_retries,
            retry_delay_ms,
        })
    }

    /// Create the managed connection with retry logic
    async fn create_connection_with_retry(
        client: Client,
        max_retries: u32,
        retry_delay_ms: u64,
    ) -> Result<ConnectionManager, InfrastructureError> {
        let mut attempts = 0;
        let mut delay = retry_delay_ms;

        loop {
            attempts += 1;
            debug!("Attempting to connect to Redis (attempt {})", attempts);

            match ConnectionManager::new(client.clone()).await {
                Ok(connection) => {
                    info!("Successfully connected to Redis");
                    return Ok(connection);
                }
                Err(e) if attempts < max_retries => {
                    warn!(
                        "Failed to connect to Redis (attempt {}/{}): {}. Retrying in {}ms...",
                        attempts, max_retries, e, delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    delay = next_delay(delay);
                }
                Err(e) => {
                    error!(
                        "Failed to connect to Redis after {} attempts: {}",
                        attempts, e
                    );
                    return Err(InfrastructureError::Cache(e));
                }
            }
        }
    }

    /// Apply the configured key prefix
    pub fn make_key(&self, key: &str) -> String {
        self.config.make_key(key)
    }

    /// Write a marker entry and list it in an index, atomically
    ///
    /// The entry gets `ttl_seconds` and is scored in the index by its expiry.
    /// Members whose expiry has passed are pruned in the same transaction,
    /// so the index only ever lists entries that may still be live. The
    /// index TTL is set if missing and only ever extended (`EXPIRE NX` then
    /// `EXPIRE GT`, Redis 7+), so it outlives the longest entry it lists.
    ///
    /// # Arguments
    /// * `key` - Entry key
    /// * `index_key` - Sorted set the entry key is added to
    /// * `ttl_seconds` - Time to live in seconds
    pub async fn set_indexed(
        &self,
        key: &str,
        index_key: &str,
        ttl_seconds: u64,
    ) -> Result<(), InfrastructureError> {
        debug!("Setting indexed key '{}' with expiry {}s", key, ttl_seconds);

        let now = Utc::now().timestamp();
        let expires_at = now.saturating_add(i64::try_from(ttl_seconds).unwrap_or(i64::MAX));

        let result = self
            .execute_with_retry(|mut conn| {
                let key = key.to_string();
                let index_key = index_key.to_string();

                Box::pin(async move {
                    redis::pipe()
                        .atomic()
                        .cmd("SET").arg(&key).arg("").arg("EX").arg(ttl_seconds).ignore()
                        .cmd("ZADD").arg(&index_key).arg(expires_at).arg(&key).ignore()
                        .cmd("ZREMRANGEBYSCORE").arg(&index_key).arg("-inf").arg(now).ignore()
                        .cmd("EXPIRE").arg(&index_key).arg(ttl_seconds).arg("NX").ignore()
                        .cmd("EXPIRE").arg(&index_key).arg(ttl_seconds).arg("GT").ignore()
                        .query_async::<_, ()>(&mut conn)
                        .await
                })
            })
            .await;

        result.map_err(|e| {
            error!("Failed to set indexed key '{}': {}", key, e);
            InfrastructureError::Cache(e)
        })
    }

    /// Check if a key exists in cache
    ///
    /// # Arguments
    /// * `key` - Cache key
    ///
    /// # Returns
    /// * `Result<bool, InfrastructureError>` - True if key exists
    pub async fn exists(&self, key: &str) -> Result<bool, InfrastructureError> {
        debug!("Checking if key '{}' exists", key);

        let result = self
            .execute_with_retry(|mut conn| {
                let key = key.to_string();

                Box::pin(async move { conn.exists::<_, bool>(key).await })
            })
            .await;

        match result {
            Ok(exists) => {
                debug!("Key '{}' exists: {}", key, exists);
                Ok(exists)
            }
            Err(e) => {
                error!("Failed to check key '{}' existence: {}", key, e);
                Err(InfrastructureError::Cache(e))
            }
        }
    }

    /// Delete one entry and drop it from its index, atomically
    ///
    /// # Returns
    /// * `Result<bool, InfrastructureError>` - True if the entry existed
    pub async fn delete_indexed(
        &self,
        key: &str,
        index_key: &str,
    ) -> Result<bool, InfrastructureError> {
        debug!("Deleting indexed key '{}'", key);

        let result = self
            .execute_with_retry(|mut conn| {
                let key = key.to_string();
                let index_key = index_key.to_string();

                Box::pin(async move {
                    redis::pipe()
                        .atomic()
                        .cmd("DEL").arg(&key)
                        .cmd("ZREM").arg(&index_key).arg(&key).ignore()
                        .query_async::<_, (u32,)>(&mut conn)
                        .await
                })
            })
            .await;

        match result {
            Ok((deleted,)) => {
                debug!("Key '{}' deleted: {}", key, deleted > 0);
                Ok(deleted > 0)
            }
            Err(e) => {
                error!("Failed to delete key '{}': {}", key, e);
                Err(InfrastructureError::Cache(e))
            }
        }
    }

    /// Read every member of an index, expired or not
    pub async fn index_members(&self, index_key: &str) -> Result<Vec<String>, InfrastructureError> {
        debug!("Reading members of index '{}'", index_key);

        let result = self
            .execute_with_retry(|mut conn| {
                let index_key = index_key.to_string();

                Box::pin(async move { conn.zrange::<_, Vec<String>>(index_key, 0, -1).await })
            })
            .await;

        result.map_err(|e| {
            error!("Failed to read index '{}': {}", index_key, e);
            InfrastructureError::Cache(e)
        })
    }

    /// Delete the given entries and remove them from their index in one
    /// `MULTI/EXEC` transaction
    ///
    /// # Returns
    /// * `Result<usize, InfrastructureError>` - Number of entries that still existed
    pub async fn delete_index_members(
        &self,
        index_key: &str,
        members: &[String],
    ) -> Result<usize, InfrastructureError> {
        if members.is_empty() {
            return Ok(0);
        }
        debug!("Deleting {} members of index '{}'", members.len(), index_key);

        let result = self
            .execute_with_retry(|mut conn| {
                let index_key = index_key.to_string();
                let members = members.to_vec();

                Box::pin(async move {
                    redis::pipe()
                        .atomic()
                        .cmd("DEL").arg(&members)
                        .cmd("ZREM").arg(&index_key).arg(&members).ignore()
                        .query_async::<_, (usize,)>(&mut conn)
                        .await
                })
            })
            .await;

        match result {
            Ok((deleted,)) => {
                debug!("Deleted {} live entries of index '{}'", deleted, index_key);
                Ok(deleted)
            }
            Err(e) => {
                error!("Failed to delete members of index '{}': {}", index_key, e);
                Err(InfrastructureError::Cache(e))
            }
        }
    }

    /// Get time-to-live for a key
    ///
    /// # Returns
    /// * `Result<Option<i64>, InfrastructureError>` - TTL in seconds, None if key doesn't exist or has no expiry
    pub async fn ttl(&self, key: &str) -> Result<Option<i64>, InfrastructureError> {
        debug!("Getting TTL for key '{}'", key);

        let result = self
            .execute_with_retry(|mut conn| {
                let key = key.to_string();

                Box::pin(async move { conn.ttl::<_, i64>(key).await })
            })
            .await;

        match result {
            Ok(ttl) if ttl >= 0 => Ok(Some(ttl)),
            Ok(_) => Ok(None),
            Err(e) => {
                error!("Failed to get TTL for key '{}': {}", key, e);
                Err(InfrastructureError::Cache(e))
            }
        }
    }

    /// Check if the Redis connection is healthy
    ///
    /// Performs a PING command to verify connectivity.
    ///
    /// # Returns
    /// * `Result<bool, InfrastructureError>` - True if healthy, error otherwise
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        debug!("Performing Redis health check");

        let result = self
            .execute_with_retry(|mut conn| {
                Box::pin(async move { redis::cmd("PING").query_async::<_, String>(&mut conn).await })
            })
            .await;

        match result {
            Ok(response) if response == "PONG" => {
                debug!("Redis health check passed");
                Ok(true)
            }
            Ok(response) => {
                warn!("Redis health check returned unexpected response: {}", response);
                Ok(false)
            }
            Err(e) => {
                error!("Redis health check failed: {}", e);
                Err(InfrastructureError::Cache(e))
            }
        }
    }

    /// Execute a Redis operation with automatic retry logic
    ///
    /// Only transient errors are retried, and every operation routed through
    /// here is idempotent. After a dropped connection the manager reconnects
    /// in the background, so a later attempt runs on a fresh connection.
    async fn execute_with_retry<F, T>(&self, operation: F) -> RedisResult<T>
    where
        F: Fn(
            ConnectionManager,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = RedisResult<T>> + Send>>,
    {
        let mut attempts = 0;
        let mut delay = self.retry_delay_ms;

        loop {
            attempts += 1;
            let conn = self.connection.clone();

            match operation(conn).await {
                Ok(result) => return Ok(result),
                Err(e) if attempts < self.max_retries && is_retriable_error(&e) => {
                    warn!(
                        "Redis operation failed (attempt {}/{}): {}. Retrying in {}ms...",
                        attempts, self.max_retries, e, delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    delay = next_delay(delay);
                }
                Err(e) => {
                    error!("Redis operation failed after {} attempts: {}", attempts, e);
                    return Err(e);
                }
            }
        }
    }
}

/// Doubles the delay, capped at five seconds
pub(crate) fn next_delay(delay_ms: u64) -> u64 {
    delay_ms.saturating_mul(2).min(MAX_BACKOFF_MS)
}

/// Check if a Redis error is retriable
///
/// Determines if an error is transient and the operation should be retried.
pub(crate) fn is_retriable_error(error: &RedisError) -> bool {
    matches!(
        error.kind(),
        redis::ErrorKind::IoError
            | redis::ErrorKind::BusyLoadingError
            | redis::ErrorKind::TryAgain
    )
}

/// Mask sensitive parts of Redis URL for logging
pub(crate) fn mask_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(proto_end) = url.find("://") {
            let proto = &url[..proto_end + 3];
            let host_part = &url[at_pos..];
            return format!("{}****{}", proto, host_part);
        }
    }
    url.to_string()
}

//! Cache module for the Redis-backed revocation store
//!
//! This module provides the Redis client with retry logic and the
//! `RevocationStore` implementation built on it.

pub mod redis_client;
pub mod revocation_store;


pub use redis_client::RedisClient;
pub use revocation_store::RedisRevocationStore;

// Re-export commonly used types
pub use quill_shared::config::cache::CacheConfig;

//! # Infrastructure Layer
//!
//! This crate implements the infrastructure layer for the Quill session
//! core. It provides the concrete pieces `quill_core` only describes:
//!
//! - **Cache**: Redis client and the Redis-backed `RevocationStore`
//! - **Config**: `.env` and environment loading
//! - **Telemetry**: tracing subscriber installation
//!
//! [`initialize`] wires all of it into a ready [`SessionManager`].

use quill_core::errors::DomainError;
use quill_core::services::{SessionManager, TokenServiceConfig};
use tracing::{info, warn};

/// Cache module - Redis client and revocation store
pub mod cache;

/// Telemetry module - tracing subscriber setup
pub mod telemetry;

/// Configuration module for infrastructure services
pub mod config {
    //! Configuration loading for infrastructure services
    //!
    //! Handles:
    //! - Loading a `.env` file when present
    //! - Reading the application configuration from the environment

    pub use quill_shared::config::{AppConfig, CacheConfig, JwtConfig, LoggingConfig};

    use crate::InfrastructureError;

    /// Load application configuration from environment
    pub fn load_config() -> Result<AppConfig, InfrastructureError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let config = AppConfig::from_env();
        validate(&config)?;
        Ok(config)
    }

    /// Reject configurations that must never run
    pub fn validate(config: &AppConfig) -> Result<(), InfrastructureError> {
        if config.auth.is_using_default_secret() && config.environment.is_production() {
            return Err(InfrastructureError::Config(
                "SECRET_KEY must be set in production".to_string(),
            ));
        }
        Ok(())
    }
}

pub use cache::{RedisClient, RedisRevocationStore};

/// Session manager backed by Redis
pub type RedisSessionManager = SessionManager<RedisRevocationStore>;

/// Initialize infrastructure services
///
/// This function sets up:
/// - Configuration from `.env` and the environment
/// - The global tracing subscriber
/// - The Redis connection and the session manager on top of it
pub async fn initialize() -> Result<RedisSessionManager, InfrastructureError> {
    let config = config::load_config()?;
    telemetry::init_tracing(&config.logging)?;

    info!(environment = %config.environment, "Initializing infrastructure services...");
    let manager = build_session_manager(&config).await?;
    info!("Infrastructure services initialized successfully");

    Ok(manager)
}

/// Build a session manager from an already loaded configuration
///
/// The signing configuration is checked before any connection is made.
pub async fn build_session_manager(
    config: &config::AppConfig,
) -> Result<RedisSessionManager, InfrastructureError> {
    config::validate(config)?;
    if config.auth.is_using_default_secret() {
        warn!("Using the default signing secret; set SECRET_KEY");
    }

    let token_config = TokenServiceConfig::try_from(&config.auth)?;
    let store = RedisRevocationStore::connect(config.cache.clone()).await?;

    Ok(SessionManager::new(store, token_config)?)
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Domain-level construction error
    #[error(transparent)]
    Domain(#[from] DomainError),
}

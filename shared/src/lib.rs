//! Shared configuration and common types for the Quill server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types loaded from the environment
//! - Error response structures and error codes

pub mod config;
pub mod errors;

// Re-export commonly used items at crate root
pub use config::{AppConfig, CacheConfig, Environment, JwtConfig, LogFormat, LoggingConfig};
pub use errors::{error_codes, ApiResult, ErrorResponse, IntoErrorResponse};

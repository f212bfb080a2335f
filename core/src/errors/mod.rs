//! Domain-specific error types and error handling.

mod types;


pub use types::{StoreError, TokenError};

use thiserror::Error;

/// Core domain errors raised while building services
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Token(#[from] TokenError),
}

pub type DomainResult<T> = Result<T, DomainError>;

//! Error types for token validation, issuance and the revocation store
//!
//! `TokenError` is the complete set of outcomes a caller can see when an
//! operation on a session fails. `StoreError` is what a revocation store
//! reports; the session manager converts it into a `TokenError`.

use quill_shared::errors::{error_codes, ErrorResponse, IntoErrorResponse};
use thiserror::Error;

/// Token-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token could not be parsed at all
    #[error("Malformed token")]
    Malformed,

    /// The token was tampered with or signed with another secret
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    /// Well-formed and unexpired, but no longer present in the store
    #[error("Token revoked")]
    Revoked,

    /// The revocation store could not confirm the token
    #[error("Revocation store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// A store write failed while minting tokens
    #[error("Token issuance failed: {message}")]
    IssuanceFailed { message: String },
}

impl TokenError {
    /// Whether the failure is transient and the caller may retry with backoff
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            TokenError::StoreUnavailable { .. } | TokenError::IssuanceFailed { .. }
        )
    }

    /// Stable error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            TokenError::Malformed => error_codes::TOKEN_MALFORMED,
            TokenError::InvalidSignature => error_codes::TOKEN_INVALID,
            TokenError::Expired => error_codes::TOKEN_EXPIRED,
            TokenError::Revoked => error_codes::TOKEN_REVOKED,
            TokenError::StoreUnavailable { .. } => error_codes::CACHE_ERROR,
            TokenError::IssuanceFailed { .. } => error_codes::TOKEN_ISSUANCE_FAILED,
        }
    }
}

impl IntoErrorResponse for TokenError {
    fn to_error_response(&self) -> ErrorResponse {
        // Infrastructure details stay in the logs
        let message = match self {
            TokenError::StoreUnavailable { .. } => {
                "Session store temporarily unavailable".to_string()
            }
            TokenError::IssuanceFailed { .. } => "Could not issue session tokens".to_string(),
            other => other.to_string(),
        };
        ErrorResponse::new(self.error_code(), message).retriable(self.is_retriable())
    }
}

impl From<TokenError> for ErrorResponse {
    fn from(err: TokenError) -> Self {
        err.to_error_response()
    }
}

/// Errors reported by a revocation store
///
/// Neither variant may be read as "entry not found".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached
    #[error("Store unreachable: {message}")]
    Unavailable { message: String },

    /// The store answered but refused the command
    #[error("Store rejected command: {message}")]
    Rejected { message: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        StoreError::Rejected {
            message: message.into(),
        }
    }
}

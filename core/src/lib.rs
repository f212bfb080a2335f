//! # Quill Core
//!
//! Session core of the Quill blogging backend: signed access and refresh
//! tokens, the revocation store interface, and the session manager that
//! ties them together. Infrastructure (Redis, configuration loading) lives
//! in `quill_infra`.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::entities::{
    AccessToken, Claims, RevocationKey, Subject, TokenKind, TokenPair, TOKEN_TYPE_BEARER,
};
pub use errors::{DomainError, DomainResult, StoreError, TokenError};
pub use repositories::RevocationStore;
pub use services::{
    extract_bearer_token, Clock, ManualClock, SessionManager, SystemClock, TokenCodec,
    TokenServiceConfig,
};

//! Domain entities representing session objects.

pub mod revocation;
pub mod token;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use revocation::{index_key, subject_prefix, token_fingerprint, RevocationKey};
pub use token::{AccessToken, Claims, Subject, TokenKind, TokenPair, TOKEN_TYPE_BEARER};

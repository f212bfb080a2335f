//! Revocation entry keys.
//!
//! Every live token has exactly one entry, addressed by subject, kind and a
//! SHA-256 fingerprint of the token. Keys of one subject share the
//! `session:{<subject_id>}` prefix; the braces are a Redis Cluster hash tag,
//! so a subject's entries and its index always land in the same slot.

use sha2::{Digest, Sha256};

use super::token::TokenKind;

/// Length of the fingerprint prefix written to logs
const LOG_FINGERPRINT_LEN: usize = 12;

/// Hex-encoded SHA-256 digest of a token
pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Prefix shared by every key belonging to `subject_id`
pub fn subject_prefix(subject_id: i64) -> String {
    format!("session:{{{}}}", subject_id)
}

/// Key of the index listing every entry key of `subject_id`
pub fn index_key(subject_id: i64) -> String {
    format!("{}:index", subject_prefix(subject_id))
}

/// Exact address of one revocation entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevocationKey {
    pub subject_id: i64,
    pub kind: TokenKind,
    fingerprint: String,
}

impl RevocationKey {
    /// Builds the key for `token`; the raw token is not retained
    pub fn new(subject_id: i64, kind: TokenKind, token: &str) -> Self {
        Self {
            subject_id,
            kind,
            fingerprint: token_fingerprint(token),
        }
    }

    /// Full hex fingerprint
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Short fingerprint, safe to log
    pub fn short_fingerprint(&self) -> &str {
        &self.fingerprint[..LOG_FINGERPRINT_LEN]
    }

    /// `session:{<subject_id>}:<kind>:<fingerprint>`
    pub fn entry_key(&self) -> String {
        format!(
            "{}:{}:{}",
            subject_prefix(self.subject_id),
            self.kind.as_str(),
            self.fingerprint
        )
    }

    /// Index set this entry is listed in
    pub fn index_key(&self) -> String {
        index_key(self.subject_id)
    }
}

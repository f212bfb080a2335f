//! Token entities for JWT-based session management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Token type reported to clients alongside issued tokens
pub const TOKEN_TYPE_BEARER: &str = "bearer";

/// The two token classes a session is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived token presented on every protected request
    Access,
    /// Long-lived token exchanged for new access tokens
    Refresh,
}

impl TokenKind {
    /// Stable lowercase name, used in store keys and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(TokenKind::Access),
            "refresh" => Ok(TokenKind::Refresh),
            other => Err(format!("Unknown token kind: {}", other)),
        }
    }
}

/// Identity a session is minted for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    /// Numeric user id
    pub id: i64,
    /// Email address, when known at login
    pub email: Option<String>,
}

impl Subject {
    pub fn new(id: i64, email: Option<String>) -> Self {
        Self { id, email }
    }
}

/// Verified claims carried by a token
///
/// Only produced by decoding a token whose signature and expiry checked out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    /// Subject (user ID)
    pub subject_id: i64,

    /// Subject email, if it was embedded at issuance
    pub email: Option<String>,

    /// Issued at timestamp
    pub issued_at: DateTime<Utc>,

    /// Absolute expiry
    pub expires_at: DateTime<Utc>,

    /// JWT ID (unique identifier for the token)
    pub token_id: String,
}

impl Claims {
    /// The subject these claims were issued for
    pub fn subject(&self) -> Subject {
        Subject::new(self.subject_id, self.email.clone())
    }

    /// Whether the claims are expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Seconds of validity left at `now`, zero once expired
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

/// Token pair returned after login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// JWT access token
    pub access_token: String,

    /// Refresh token
    pub refresh_token: String,

    /// Always "bearer"
    pub token_type: String,

    /// Access token lifetime in seconds
    pub access_expires_in: i64,

    /// Refresh token lifetime in seconds
    pub refresh_expires_in: i64,
}

impl TokenPair {
    /// Creates a new bearer token pair
    ///
    /// # Arguments
    ///
    /// * `access_token` - The encoded access token
    /// * `refresh_token` - The encoded refresh token
    /// * `access_expires_in` - Access token lifetime in seconds
    /// * `refresh_expires_in` - Refresh token lifetime in seconds
    pub fn new(
        access_token: String,
        refresh_token: String,
        access_expires_in: i64,
        refresh_expires_in: i64,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            access_expires_in,
            refresh_expires_in,
        }
    }
}

/// Fresh access token returned by a refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl AccessToken {
    pub fn new(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in,
        }
    }
}

//! Configuration for the token codec and session manager

use chrono::Duration;
use jsonwebtoken::Algorithm;
use quill_shared::config::JwtConfig;
use std::str::FromStr;

use crate::domain::entities::token::TokenKind;
use crate::errors::DomainError;

/// Longest lifetime accepted for either token kind (about ten years)
pub const MAX_TOKEN_LIFETIME_DAYS: i64 = 3650;

const MAX_TOKEN_LIFETIME_MINUTES: i64 = MAX_TOKEN_LIFETIME_DAYS * 24 * 60;

/// Configuration for token signing and lifetimes
///
/// Process-wide and fixed once a `SessionManager` is built.
#[derive(Clone)]
pub struct TokenServiceConfig {
    /// Shared signing secret (opaque bytes)
    pub jwt_secret: Vec<u8>,
    /// JWT signing algorithm
    pub algorithm: Algorithm,
    /// Access token expiry in minutes
    pub access_token_expiry_minutes: i64,
    /// Refresh token expiry in days
    pub refresh_token_expiry_days: i64,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        let jwt = JwtConfig::default();
        Self {
            jwt_secret: jwt.secret.into_bytes(),
            algorithm: Algorithm::from_str(&jwt.algorithm).unwrap_or(Algorithm::HS256),
            access_token_expiry_minutes: jwt.access_token_expiry_minutes,
            refresh_token_expiry_days: jwt.refresh_token_expiry_days,
        }
    }
}

impl std::fmt::Debug for TokenServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenServiceConfig")
            .field("jwt_secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_token_expiry_minutes", &self.access_token_expiry_minutes)
            .field("refresh_token_expiry_days", &self.refresh_token_expiry_days)
            .finish()
    }
}

impl TokenServiceConfig {
    /// Creates a configuration with the given secret and default lifetimes
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            jwt_secret: secret.into(),
            ..Default::default()
        }
    }

    /// Lifetime of access tokens, clamped to the accepted range
    pub fn access_ttl(&self) -> Duration {
        Duration::minutes(
            self.access_token_expiry_minutes
                .clamp(0, MAX_TOKEN_LIFETIME_MINUTES),
        )
    }

    /// Lifetime of refresh tokens, clamped to the accepted range
    pub fn refresh_ttl(&self) -> Duration {
        Duration::days(self.refresh_token_expiry_days.clamp(0, MAX_TOKEN_LIFETIME_DAYS))
    }

    /// Lifetime for a token kind
    pub fn ttl_for(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl(),
            TokenKind::Refresh => self.refresh_ttl(),
        }
    }

    /// Checks the configuration can sign and verify tokens
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Configuration is usable
    /// * `Err(DomainError::Configuration)` - Empty secret, a lifetime that is
    ///   not positive or exceeds `MAX_TOKEN_LIFETIME_DAYS`, or an algorithm
    ///   that is not a shared-secret (HMAC) scheme
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.jwt_secret.is_empty() {
            return Err(configuration("signing secret must not be empty"));
        }
        if !matches!(
            self.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(configuration(format!(
                "algorithm {:?} is not a shared-secret scheme",
                self.algorithm
            )));
        }
        if self.access_token_expiry_minutes <= 0 {
            return Err(configuration("access token expiry must be positive"));
        }
        if self.refresh_token_expiry_days <= 0 {
            return Err(configuration("refresh token expiry must be positive"));
        }
        if self.access_token_expiry_minutes > MAX_TOKEN_LIFETIME_MINUTES {
            return Err(configuration(format!(
                "access token expiry must not exceed {} minutes",
                MAX_TOKEN_LIFETIME_MINUTES
            )));
        }
        if self.refresh_token_expiry_days > MAX_TOKEN_LIFETIME_DAYS {
            return Err(configuration(format!(
                "refresh token expiry must not exceed {} days",
                MAX_TOKEN_LIFETIME_DAYS
            )));
        }
        Ok(())
    }
}

impl TryFrom<&JwtConfig> for TokenServiceConfig {
    type Error = DomainError;

    fn try_from(config: &JwtConfig) -> Result<Self, Self::Error> {
        let algorithm = Algorithm::from_str(&config.algorithm)
            .map_err(|_| configuration(format!("unknown algorithm '{}'", config.algorithm)))?;

        let converted = Self {
            jwt_secret: config.secret.as_bytes().to_vec(),
            algorithm,
            access_token_expiry_minutes: config.access_token_expiry_minutes,
            refresh_token_expiry_days: config.refresh_token_expiry_days,
        };
        converted.validate()?;
        Ok(converted)
    }
}

fn configuration(message: impl Into<String>) -> DomainError {
    DomainError::Configuration {
        message: message.into(),
    }
}

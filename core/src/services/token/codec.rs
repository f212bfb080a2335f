//! Signed token encoding and verification

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::token::{Claims, Subject};
use crate::errors::{DomainError, TokenError};

use super::clock::Clock;
use super::config::TokenServiceConfig;

/// Claims as they appear in the JWT payload
#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    /// Subject id, decimal
    sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default)]
    iat: i64,
    exp: i64,
    #[serde(default)]
    jti: String,
}

/// Encodes subjects into signed, expiring bearer strings and back
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenCodec {
    /// Creates a codec for the configured secret and algorithm
    ///
    /// # Arguments
    ///
    /// * `config` - Signing configuration
    /// * `clock` - Time source for `iat`/`exp` and the expiry check
    ///
    /// # Returns
    ///
    /// A new `TokenCodec` or a configuration error
    pub fn new(config: &TokenServiceConfig, clock: Arc<dyn Clock>) -> Result<Self, DomainError> {
        config.validate()?;

        let mut validation = Validation::new(config.algorithm);
        // Expiry is checked against the injected clock, without leeway
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            algorithm: config.algorithm,
            encoding_key: EncodingKey::from_secret(&config.jwt_secret),
            decoding_key: DecodingKey::from_secret(&config.jwt_secret),
            validation,
            clock,
        })
    }

    /// Current time according to the codec's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Encodes `subject` into a token that expires `ttl` from now
    ///
    /// Every call embeds a fresh random `jti`, so two tokens for the same
    /// subject and lifetime never collide.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The signed token
    /// * `Err(TokenError::IssuanceFailed)` - Non-positive or out-of-range TTL,
    ///   or signing failure
    pub fn encode(&self, subject: &Subject, ttl: Duration) -> Result<String, TokenError> {
        if ttl <= Duration::zero() {
            return Err(TokenError::IssuanceFailed {
                message: "token lifetime must be positive".to_string(),
            });
        }

        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::IssuanceFailed {
                message: "token expiry is out of range".to_string(),
            })?;
        let claims = WireClaims {
            sub: subject.id.to_string(),
            email: subject.email.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key).map_err(|e| {
            TokenError::IssuanceFailed {
                message: format!("failed to sign token: {}", e),
            }
        })
    }

    /// Verifies the signature, then the expiry, and returns the claims
    ///
    /// # Returns
    ///
    /// * `Ok(Claims)` - Signature valid and `expires_at > now`
    /// * `Err(TokenError::InvalidSignature)` - Tampered token, wrong secret or algorithm
    /// * `Err(TokenError::Malformed)` - Not a structurally valid token
    /// * `Err(TokenError::Expired)` - Expiry has passed
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<WireClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| map_jwt_error(e.kind()))?;

        let claims = into_claims(data.claims)?;
        if claims.is_expired_at(self.clock.now()) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

fn map_jwt_error(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}

fn into_claims(wire: WireClaims) -> Result<Claims, TokenError> {
    let subject_id = wire.sub.parse::<i64>().map_err(|_| TokenError::Malformed)?;
    let expires_at = timestamp(wire.exp)?;
    let issued_at = timestamp(wire.iat)?;

    Ok(Claims {
        subject_id,
        email: wire.email,
        issued_at,
        expires_at,
        token_id: wire.jti,
    })
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>, TokenError> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or(TokenError::Malformed)
}

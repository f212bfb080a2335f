//! Token signing configuration

use serde::{Deserialize, Serialize};

const DEFAULT_SECRET: &str = "development-secret-please-change-in-production";

/// JWT signing configuration
///
/// Fixed for the lifetime of the process. Rotating the secret or algorithm
/// invalidates every token issued before the change.
#[derive(Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// Shared secret used to sign and verify tokens
    pub secret: String,

    /// Algorithm identifier for JWT signing (default: HS256)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Access token lifetime in minutes
    #[serde(default = "default_access_minutes")]
    pub access_token_expiry_minutes: i64,

    /// Refresh token lifetime in days
    #[serde(default = "default_refresh_days")]
    pub refresh_token_expiry_days: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::from(DEFAULT_SECRET),
            algorithm: default_algorithm(),
            access_token_expiry_minutes: default_access_minutes(),
            refresh_token_expiry_days: default_refresh_days(),
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_token_expiry_minutes", &self.access_token_expiry_minutes)
            .field("refresh_token_expiry_days", &self.refresh_token_expiry_days)
            .finish()
    }
}

impl JwtConfig {
    /// Create a new JWT configuration with secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Create from environment variables
    ///
    /// Reads `SECRET_KEY`, `ALGORITHM`, `ACCESS_TOKEN_EXPIRE_MINUTES` and
    /// `REFRESH_TOKEN_EXPIRE_DAYS`. Missing or unparseable values fall back
    /// to the defaults.
    pub fn from_env() -> Self {
        let secret = std::env::var("SECRET_KEY").unwrap_or_else(|_| DEFAULT_SECRET.to_string());
        let algorithm = std::env::var("ALGORITHM").unwrap_or_else(|_| default_algorithm());
        let access_token_expiry_minutes = std::env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_access_minutes);
        let refresh_token_expiry_days = std::env::var("REFRESH_TOKEN_EXPIRE_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_refresh_days);

        Self {
            secret,
            algorithm,
            access_token_expiry_minutes,
            refresh_token_expiry_days,
        }
    }

    /// Set access token expiry in minutes
    pub fn with_access_expiry_minutes(mut self, minutes: i64) -> Self {
        self.access_token_expiry_minutes = minutes;
        self
    }

    /// Set refresh token expiry in days
    pub fn with_refresh_expiry_days(mut self, days: i64) -> Self {
        self.refresh_token_expiry_days = days;
        self
    }

    /// Set the signing algorithm identifier
    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = algorithm.into();
        self
    }

    /// Access token lifetime in seconds
    pub fn access_token_expiry_seconds(&self) -> i64 {
        self.access_token_expiry_minutes * 60
    }

    /// Refresh token lifetime in seconds
    pub fn refresh_token_expiry_seconds(&self) -> i64 {
        self.refresh_token_expiry_days * 86400
    }

    /// Check if using default secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }
}

fn default_algorithm() -> String {
    String::from("HS256")
}

fn default_access_minutes() -> i64 {
    15
}

fn default_refresh_days() -> i64 {
    7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_config_default() {
        let config = JwtConfig::default();
        assert_eq!(config.access_token_expiry_minutes, 15);
        assert_eq!(config.refresh_token_expiry_days, 7);
        assert_eq!(config.access_token_expiry_seconds(), 900);
        assert_eq!(config.refresh_token_expiry_seconds(), 604800);
        assert_eq!(config.algorithm, "HS256");
        assert!(config.is_using_default_secret());
    }

    #[test]
    fn test_jwt_config_builder() {
        let config = JwtConfig::new("my-secret")
            .with_access_expiry_minutes(30)
            .with_refresh_expiry_days(14)
            .with_algorithm("HS512");

        assert_eq!(config.access_token_expiry_seconds(), 1800);
        assert_eq!(config.refresh_token_expiry_seconds(), 1209600);
        assert_eq!(config.algorithm, "HS512");
        assert!(!config.is_using_default_secret());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = JwtConfig::new("super-secret-value");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret-value"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: JwtConfig = serde_json::from_str(r#"{"secret":"abc"}"#).unwrap();
        assert_eq!(config.secret, "abc");
        assert_eq!(config.algorithm, "HS256");
        assert_eq!(config.access_token_expiry_minutes, 15);
        assert_eq!(config.refresh_token_expiry_days, 7);
    }
}

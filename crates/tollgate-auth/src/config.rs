//! Authorization server configuration.
//!
//! These types are deserialised from the `[auth]` section of the server
//! configuration and converted into the runtime settings of each component.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::crypto::CipherAlgorithm;
use crate::token::jwt::SigningAlgorithm;

/// Root authorization server configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [auth.oauth]
/// authorization_code_lifetime = "5m"
/// login_signup_endpoint = "https://login.example.com/signin"
/// refresh_token_reuse = "reject"
///
/// [auth.signing]
/// secret = "a-long-random-hmac-secret-of-32-bytes-or-more"
///
/// [auth.session]
/// cookie_name = "user"
/// encryption_key = "Zk3vQp9LmX2tRw7a"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// OAuth 2.0 flow settings.
    pub oauth: OAuthConfig,

    /// Access token signing settings.
    pub signing: SigningConfig,

    /// Login session cookie settings.
    pub session: SessionConfig,
}

/// Upper bound for `authorization_code_lifetime`.
pub const MAX_AUTHORIZATION_CODE_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// OAuth 2.0 flow settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Authorization code lifetime.
    /// Codes should be short-lived for security.
    #[serde(with = "humantime_serde")]
    pub authorization_code_lifetime: Duration,

    /// Where users without a session are sent to log in or sign up.
    /// The original authorization parameters are appended to it.
    pub login_signup_endpoint: String,

    /// What to do when an already-rotated refresh token is presented again.
    pub refresh_token_reuse: RefreshTokenReusePolicy,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            authorization_code_lifetime: Duration::from_millis(300_000),
            login_signup_endpoint: String::new(),
            refresh_token_reuse: RefreshTokenReusePolicy::default(),
        }
    }
}

/// Response to a refresh token that was already consumed by a rotation.
///
/// The presenting request always fails; the policy decides whether the
/// rest of the chain survives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTokenReusePolicy {
    /// Fail the request only.
    #[default]
    Reject,
    /// Fail the request and revoke the chain's live token.
    RevokeChain,
}

/// Access token signing settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// HMAC algorithm name: HS256, HS384, or HS512.
    pub algorithm: String,

    /// Shared HMAC secret. Must be at least 32 bytes.
    pub secret: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            algorithm: "HS256".to_string(),
            secret: String::new(),
        }
    }
}

/// Login session cookie settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the cookie carrying the encrypted user id.
    pub cookie_name: String,

    /// Cookie encryption key; 16 bytes selects AES-128-GCM, 32 bytes AES-256-GCM.
    pub encryption_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "user".to_string(),
            encryption_key: String::new(),
        }
    }
}

impl SessionConfig {
    /// Returns the cipher algorithm implied by the key length.
    #[must_use]
    pub fn algorithm(&self) -> Option<CipherAlgorithm> {
        CipherAlgorithm::for_key_len(self.encryption_key.len())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The login/signup endpoint is missing or not an absolute URL
    /// - The authorization code lifetime is zero or longer than an hour
    /// - The signing algorithm is unsupported or the secret is too short
    /// - The session key is not 16 or 32 bytes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.oauth.login_signup_endpoint.trim().is_empty() {
            return Err(ConfigError::Missing(
                "auth.oauth.login_signup_endpoint".to_string(),
            ));
        }
        if url::Url::parse(&self.oauth.login_signup_endpoint).is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "login_signup_endpoint '{}' is not an absolute URL",
                self.oauth.login_signup_endpoint
            )));
        }

        if self.oauth.authorization_code_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "authorization_code_lifetime must be greater than zero".to_string(),
            ));
        }
        if self.oauth.authorization_code_lifetime > MAX_AUTHORIZATION_CODE_LIFETIME {
            return Err(ConfigError::InvalidValue(
                "authorization_code_lifetime must not exceed 1h".to_string(),
            ));
        }

        if self.signing.algorithm.parse::<SigningAlgorithm>().is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "Invalid signing algorithm: '{}'. Must be HS256, HS384, or HS512",
                self.signing.algorithm
            )));
        }
        if self.signing.secret.len() < 32 {
            return Err(ConfigError::InvalidValue(
                "signing secret must be at least 32 bytes".to_string(),
            ));
        }

        if self.session.cookie_name.trim().is_empty() {
            return Err(ConfigError::Missing("auth.session.cookie_name".to_string()));
        }
        if self.session.algorithm().is_none() {
            return Err(ConfigError::InvalidValue(
                "session encryption_key must be 16 or 32 bytes".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AuthConfig {
        let mut config = AuthConfig::default();
        config.oauth.login_signup_endpoint = "https://login.example.com/signin".to_string();
        config.signing.secret = "x".repeat(32);
        config.session.encryption_key = "Zk3vQp9LmX2tRw7a".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(
            config.oauth.authorization_code_lifetime,
            Duration::from_millis(300_000)
        );
        assert_eq!(config.session.cookie_name, "user");
        assert_eq!(
            config.oauth.refresh_token_reuse,
            RefreshTokenReusePolicy::Reject
        );
    }

    #[test]
    fn test_valid_config() {
        tokio_test::assert_ok!(valid_config().validate());
    }

    #[test]
    fn test_missing_login_endpoint() {
        let mut config = valid_config();
        config.oauth.login_signup_endpoint = " ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_short_signing_secret() {
        let mut config = valid_config();
        config.signing.secret = "short".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_bad_session_key() {
        let mut config = valid_config();
        config.session.encryption_key = "twenty-byte-key-1234".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_code_lifetime_bounds() {
        let mut config = valid_config();
        config.oauth.authorization_code_lifetime = MAX_AUTHORIZATION_CODE_LIFETIME;
        tokio_test::assert_ok!(config.validate());

        config.oauth.authorization_code_lifetime = Duration::from_secs(u64::MAX);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        config.oauth.authorization_code_lifetime = Duration::ZERO;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_deserialize_humantime() {
        let config: OAuthConfig = serde_json::from_str(
            r#"{"authorization_code_lifetime": "90s", "refresh_token_reuse": "revoke_chain"}"#,
        )
        .unwrap();
        assert_eq!(config.authorization_code_lifetime, Duration::from_secs(90));
        assert_eq!(config.refresh_token_reuse, RefreshTokenReusePolicy::RevokeChain);
        assert!(config.login_signup_endpoint.is_empty());
    }
}

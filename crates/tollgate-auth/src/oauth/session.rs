//! Login session lookup.
//!
//! The authorization endpoint only needs to know who, if anyone, is logged
//! in. Session establishment belongs to the login service; this module reads
//! the result.

use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use cookie::Cookie;
use tracing::debug;

use crate::AuthResult;
use crate::config::{ConfigError, SessionConfig};
use crate::crypto::{CipherAlgorithm, SymmetricCipher};

/// Read-only access to the caller's login session.
#[async_trait]
pub trait SessionLookup: Send + Sync {
    /// Returns the logged-in user id, or `None` without a valid session.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session backend itself fails.
    async fn get_user(&self, headers: &HeaderMap) -> AuthResult<Option<String>>;
}

/// Session lookup backed by an encrypted cookie holding the user id.
pub struct CookieSessionLookup {
    cookie_name: String,
    algorithm: CipherAlgorithm,
    key: Vec<u8>,
}

impl std::fmt::Debug for CookieSessionLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieSessionLookup")
            .field("cookie_name", &self.cookie_name)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl CookieSessionLookup {
    /// Creates a lookup from the session configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the cookie name is blank or the key length
    /// selects no cipher.
    pub fn from_config(config: &SessionConfig) -> Result<Self, ConfigError> {
        if config.cookie_name.trim().is_empty() {
            return Err(ConfigError::Missing("auth.session.cookie_name".to_string()));
        }
        let algorithm = config.algorithm().ok_or_else(|| {
            ConfigError::InvalidValue("session encryption_key must be 16 or 32 bytes".to_string())
        })?;
        Ok(Self {
            cookie_name: config.cookie_name.clone(),
            algorithm,
            key: config.encryption_key.as_bytes().to_vec(),
        })
    }

    /// Returns the cookie name.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Produces the cookie value the login service sets for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns a cipher error if encryption fails.
    pub fn seal_user(&self, user_id: &str) -> AuthResult<String> {
        Ok(SymmetricCipher::encrypt(user_id, self.algorithm, &self.key)?)
    }

    fn open(&self, value: &str) -> Option<String> {
        match SymmetricCipher::decrypt(value, self.algorithm, &self.key) {
            Ok(user_id) if !user_id.trim().is_empty() => Some(user_id),
            Ok(_) => None,
            Err(e) => {
                debug!(cookie = %self.cookie_name, error = %e, "Session cookie rejected");
                None
            }
        }
    }
}

#[async_trait]
impl SessionLookup for CookieSessionLookup {
    async fn get_user(&self, headers: &HeaderMap) -> AuthResult<Option<String>> {
        let value = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|c| c.name() == self.cookie_name)
            .map(|c| c.value().to_string());

        Ok(value.and_then(|v| self.open(&v)))
    }
}

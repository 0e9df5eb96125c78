//! Refresh token domain type.
//!
//! Refresh tokens form rotation chains: rotating a token archives the old
//! row with `revoked_at` set and `replaced_by` pointing at the id of the new
//! active row. The chain is an arena keyed by [`Uuid`], never an in-memory
//! reference.
//!
//! # Security
//!
//! - Refresh tokens are stored as SHA-256 hashes, never plaintext
//! - A chain has at most one active token at any time
//! - A historical token with `replaced_by` set was already rotated; seeing it
//!   again signals possible theft

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::AuthResult;
use crate::error::AuthError;
use crate::types::ClientUser;

/// Refresh token record.
///
/// The token itself is never stored. When presenting a refresh token:
///
/// 1. Hash the incoming token
/// 2. Look up by hash in the active set
/// 3. Validate client ownership and expiration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshToken {
    /// Unique identifier for this refresh token record.
    pub id: Uuid,

    /// SHA-256 hash of the bearer value.
    pub token_hash: String,

    /// Internal id of the client the token was issued to.
    pub client_id: Uuid,

    /// Client user the token belongs to.
    pub client_user_id: Uuid,

    /// End-user subject, denormalised from the client user.
    pub user_id: String,

    /// When this token was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When this record last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,

    /// When this token expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// When this token was revoked (None = not revoked).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub revoked_at: Option<OffsetDateTime>,

    /// Id of the token that replaced this one on rotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaced_by: Option<Uuid>,
}

impl RefreshToken {
    /// Creates a new active record for `client_user` from a bearer value.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if `lifetime` runs past the representable
    /// calendar.
    pub fn new(token: &str, client_user: &ClientUser, lifetime: Duration) -> AuthResult<Self> {
        let now = OffsetDateTime::now_utc();
        Ok(Self {
            id: Uuid::new_v4(),
            token_hash: Self::hash_token(token),
            client_id: client_user.client_id,
            client_user_id: client_user.id,
            user_id: client_user.user_id.clone(),
            created_at: now,
            updated_at: now,
            expires_at: expiry(now, lifetime)?,
            revoked_at: None,
            replaced_by: None,
        })
    }

    /// Creates the successor of `self` in its rotation chain.
    ///
    /// # Errors
    ///
    /// Same as [`RefreshToken::new`].
    pub fn successor(&self, token: &str, lifetime: Duration) -> AuthResult<Self> {
        let now = OffsetDateTime::now_utc();
        Ok(Self {
            id: Uuid::new_v4(),
            token_hash: Self::hash_token(token),
            client_id: self.client_id,
            client_user_id: self.client_user_id,
            user_id: self.user_id.clone(),
            created_at: now,
            updated_at: now,
            expires_at: expiry(now, lifetime)?,
            revoked_at: None,
            replaced_by: None,
        })
    }

    /// Returns `true` if this token has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }

    /// Returns `true` if this token has been revoked.
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Returns `true` if this token was consumed by a rotation.
    #[must_use]
    pub fn is_rotated(&self) -> bool {
        self.replaced_by.is_some()
    }

    /// Hash a token value using SHA-256.
    ///
    /// This is used both when storing new tokens and when looking up
    /// tokens for validation.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Generate a cryptographically secure random token.
    ///
    /// Returns a 256-bit random value encoded as base64url (43 characters).
    #[must_use]
    pub fn generate_token() -> String {
        use base64::Engine;
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;

        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

fn expiry(now: OffsetDateTime, lifetime: Duration) -> AuthResult<OffsetDateTime> {
    now.checked_add(lifetime)
        .ok_or_else(|| AuthError::configuration("refresh token lifetime is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_token() -> (String, RefreshToken) {
        let user = ClientUser::new(Uuid::new_v4(), "user-1");
        let token = RefreshToken::generate_token();
        let record = RefreshToken::new(&token, &user, Duration::days(30)).unwrap();
        (token, record)
    }

    #[test]
    fn test_hash_is_stable_and_not_plaintext() {
        let (token, record) = create_test_token();
        assert_eq!(record.token_hash, RefreshToken::hash_token(&token));
        assert_ne!(record.token_hash, token);
        assert_eq!(record.token_hash.len(), 64);
    }

    #[test]
    fn test_successor_keeps_ownership() {
        let (_, record) = create_test_token();
        let next_value = RefreshToken::generate_token();
        let next = record.successor(&next_value, Duration::days(7)).unwrap();

        assert_ne!(next.id, record.id);
        assert_eq!(next.client_id, record.client_id);
        assert_eq!(next.client_user_id, record.client_user_id);
        assert_eq!(next.user_id, record.user_id);
        assert!(!next.is_revoked());
        assert!(!next.is_rotated());
    }

    #[test]
    fn test_expiry() {
        let (_, record) = create_test_token();
        assert!(!record.is_expired_at(OffsetDateTime::now_utc()));
        assert!(record.is_expired_at(record.expires_at));
    }

    #[test]
    fn test_lifetime_past_calendar_end() {
        let (_, record) = create_test_token();
        let user = ClientUser::new(record.client_id, "user-1");
        let forever = Duration::days(i64::from(u32::MAX));

        assert!(matches!(
            RefreshToken::new("t", &user, forever),
            Err(AuthError::Configuration { .. })
        ));
        assert!(matches!(
            record.successor("t", forever),
            Err(AuthError::Configuration { .. })
        ));
    }
}

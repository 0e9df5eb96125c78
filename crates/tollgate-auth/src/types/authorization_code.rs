//! Authorization code domain type.
//!
//! Codes live in an active set while unconsumed and unexpired. Consumption or
//! an observed expiry moves them to history, so "used at most once" is a
//! property of set membership rather than of a mutable flag.
//!
//! # Security
//!
//! - Codes are cryptographically random (256 bits)
//! - Codes are bound to the exact redirect URI supplied at issuance
//! - Never log code values

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::types::ClientUser;

/// One-time authorization code issued at the authorization endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationCode {
    /// Unique identifier for this code record.
    pub id: Uuid,

    /// The opaque code value handed to the client.
    pub code: String,

    /// Redirect URI the code is bound to.
    pub redirect_uri: String,

    /// Internal id of the client the code was issued to.
    pub client_id: Uuid,

    /// Client user the code was issued for.
    pub client_user_id: Uuid,

    /// When the code was issued.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the code stops being exchangeable.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// When the code was moved to history (None while active).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub consumed_at: Option<OffsetDateTime>,
}

impl AuthorizationCode {
    /// Creates a fresh code for the client user, valid until `expires_at`.
    #[must_use]
    pub fn new(
        redirect_uri: impl Into<String>,
        client_user: &ClientUser,
        expires_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: Self::generate_code(),
            redirect_uri: redirect_uri.into(),
            client_id: client_user.client_id,
            client_user_id: client_user.id,
            created_at: OffsetDateTime::now_utc(),
            expires_at,
            consumed_at: None,
        }
    }

    /// Generate a cryptographically secure random code.
    ///
    /// Returns a 256-bit random value encoded as base64url (43 characters).
    #[must_use]
    pub fn generate_code() -> String {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Returns `true` if the code has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }

    /// Returns `true` if the code has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn test_generate_code_is_random() {
        let a = AuthorizationCode::generate_code();
        let b = AuthorizationCode::generate_code();
        assert_eq!(a.len(), 43);
        assert_ne!(a, b);
    }

    #[test]
    fn test_expiry() {
        let user = ClientUser::new(Uuid::new_v4(), "U42");
        let live = AuthorizationCode::new(
            "https://app.example/cb",
            &user,
            OffsetDateTime::now_utc() + Duration::minutes(5),
        );
        assert!(!live.is_expired());
        assert_eq!(live.client_id, user.client_id);
        assert_eq!(live.client_user_id, user.id);

        let stale = AuthorizationCode::new(
            "https://app.example/cb",
            &user,
            OffsetDateTime::now_utc() - Duration::seconds(1),
        );
        assert!(stale.is_expired());
    }
}

//! Refresh token creation and rotation.
//!
//! Every successful refresh replaces the presented token: the old row moves
//! to history with `revoked_at` set and `replaced_by` pointing at the new
//! row. A token found in history with `replaced_by` set has already been
//! rotated, and presenting it again is handled per
//! [`RefreshTokenReusePolicy`].

use std::sync::Arc;

use time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::AuthResult;
use crate::config::RefreshTokenReusePolicy;
use crate::error::AuthError;
use crate::storage::RefreshTokenStorage;
use crate::types::{ClientUser, RefreshToken};

/// A freshly stored refresh token together with its bearer value.
///
/// The bearer value exists only here; storage keeps the hash.
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    /// Bearer value to hand to the client.
    pub token: String,
    /// Stored record.
    pub record: RefreshToken,
}

/// Creates, rotates, and revokes refresh tokens.
pub struct RefreshTokenRotator {
    storage: Arc<dyn RefreshTokenStorage>,
    reuse_policy: RefreshTokenReusePolicy,
}

impl RefreshTokenRotator {
    #[must_use]
    pub fn new(storage: Arc<dyn RefreshTokenStorage>, reuse_policy: RefreshTokenReusePolicy) -> Self {
        Self {
            storage,
            reuse_policy,
        }
    }

    /// Starts a new rotation chain for `client_user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be stored.
    pub async fn create(
        &self,
        client_user: &ClientUser,
        expires_in_days: u32,
    ) -> AuthResult<IssuedRefreshToken> {
        let token = RefreshToken::generate_token();
        let record = RefreshToken::new(&token, client_user, lifetime(expires_in_days))?;
        self.storage.create(&record).await?;

        debug!(token_id = %record.id, client_user_id = %client_user.id, "Refresh token created");
        Ok(IssuedRefreshToken { token, record })
    }

    /// Returns the active, unexpired row for `presented` if it belongs to
    /// `client_id`. Read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn find_rotatable(
        &self,
        client_id: Uuid,
        presented: &str,
    ) -> AuthResult<Option<RefreshToken>> {
        let hash = RefreshToken::hash_token(presented);
        let now = time::OffsetDateTime::now_utc();
        Ok(self
            .storage
            .find_active(&hash)
            .await?
            .filter(|t| t.client_id == client_id && !t.is_expired_at(now)))
    }

    /// Rotates `presented` for `client_id`.
    ///
    /// # Steps
    ///
    /// 1. Look up the presented token in the active set for this client
    /// 2. Build the successor row with `expires_at = now + expires_in_days`
    /// 3. Atomically archive the old row (revoked, linked) and insert the new one
    /// 4. Return the new row and its bearer value
    ///
    /// # Errors
    ///
    /// Returns `UnauthorizedClient` if the token is unknown, expired, owned
    /// by another client, already rotated, or loses a concurrent rotation.
    pub async fn rotate(
        &self,
        client_id: Uuid,
        presented: &str,
        expires_in_days: u32,
    ) -> AuthResult<IssuedRefreshToken> {
        let hash = RefreshToken::hash_token(presented);

        // 1. Look up the active row
        let current = match self.storage.find_active(&hash).await? {
            Some(current) if current.client_id == client_id => current,
            Some(current) => {
                warn!(
                    token_id = %current.id,
                    client_id = %client_id,
                    "Refresh token presented by a client it was not issued to"
                );
                return Err(AuthError::unauthorized_client(
                    "refresh token was not issued to this client",
                ));
            }
            None => return Err(self.rejection(&hash).await),
        };

        // 2. Build the successor
        let token = RefreshToken::generate_token();
        let successor = current.successor(&token, lifetime(expires_in_days))?;

        // 3. Atomic swap; losing a race or an expiry lands here as None
        match self.storage.rotate(&hash, client_id, &successor).await? {
            Some(previous) => {
                info!(
                    previous_id = %previous.id,
                    token_id = %successor.id,
                    client_user_id = %successor.client_user_id,
                    "Refresh token rotated"
                );
                Ok(IssuedRefreshToken {
                    token,
                    record: successor,
                })
            }
            None => Err(self.rejection(&hash).await),
        }
    }

    /// Classifies a token that is not rotatable and applies the reuse policy.
    async fn rejection(&self, token_hash: &str) -> AuthError {
        let archived = match self.storage.find_archived(token_hash).await {
            Ok(archived) => archived,
            Err(e) => return e,
        };

        match archived {
            Some(archived) if archived.is_rotated() => {
                warn!(
                    token_id = %archived.id,
                    client_user_id = %archived.client_user_id,
                    policy = ?self.reuse_policy,
                    "Already-rotated refresh token presented again"
                );
                if self.reuse_policy == RefreshTokenReusePolicy::RevokeChain {
                    match self.storage.revoke_chain(archived.id).await {
                        Ok(revoked) => warn!(
                            token_id = %archived.id,
                            revoked,
                            "Revoked refresh token chain after reuse"
                        ),
                        Err(e) => return e,
                    }
                }
                AuthError::unauthorized_client("refresh token has already been rotated")
            }
            Some(_) => AuthError::unauthorized_client("refresh token is expired or revoked"),
            None => AuthError::unauthorized_client("refresh token not found"),
        }
    }
}

fn lifetime(days: u32) -> Duration {
    Duration::days(i64::from(days))
}

//! Refresh token storage trait.
//!
//! Refresh tokens are partitioned into an active set and a history. Rows are
//! keyed by the SHA-256 hash of the bearer value and linked into rotation
//! chains by id.

use async_trait::async_trait;
use uuid::Uuid;

use crate::AuthResult;
use crate::types::RefreshToken;

/// Storage trait for refresh tokens and their rotation chains.
#[async_trait]
pub trait RefreshTokenStorage: Send + Sync {
    /// Inserts a new token into the active set.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn create(&self, token: &RefreshToken) -> AuthResult<()>;

    /// Finds an active token by hash. Expired rows may still be returned;
    /// callers must check expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_active(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>>;

    /// Finds a historical (rotated, revoked, or expired) token by hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_archived(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>>;

    /// Atomically rotates an active token.
    ///
    /// If `token_hash` is active, unexpired, and owned by `client_id`, the
    /// row is moved to history with `revoked_at = now` and
    /// `replaced_by = replacement.id`, and `replacement` is inserted into the
    /// active set.
    ///
    /// # Returns
    ///
    /// Returns the archived predecessor on success, or `None` when the token
    /// is not rotatable. Two concurrent rotations of the same token yield
    /// exactly one `Some`.
    ///
    /// # Atomicity
    ///
    /// All three steps must happen in a single transaction:
    ///
    /// ```sql
    /// WITH old AS (
    ///     DELETE FROM refresh_tokens__active
    ///     WHERE token_hash = $1 AND client_id = $2 AND expires_at > NOW()
    ///     RETURNING *
    /// )
    /// INSERT INTO refresh_tokens__history SELECT ..., NOW(), $3 FROM old;
    /// ```
    async fn rotate(
        &self,
        token_hash: &str,
        client_id: Uuid,
        replacement: &RefreshToken,
    ) -> AuthResult<Option<RefreshToken>>;

    /// Revokes the live descendant of a rotation chain.
    ///
    /// Starting at the token with id `from`, follows `replaced_by` links
    /// until it reaches an active row, then archives that row with
    /// `revoked_at = now`.
    ///
    /// # Returns
    ///
    /// The number of active tokens revoked (0 or 1).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn revoke_chain(&self, from: Uuid) -> AuthResult<u64>;
}

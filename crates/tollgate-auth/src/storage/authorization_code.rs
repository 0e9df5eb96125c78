//! Authorization code storage trait.
//!
//! # Implementation Notes
//!
//! Implementations should:
//!
//! - Keep active and consumed codes apart so active lookups never see
//!   consumed rows
//! - Make [`AuthorizationCodeStorage::consume`] a single atomic
//!   read-and-remove
//! - Evaluate expiry at read time rather than relying on a sweep
//!
//! # Security Considerations
//!
//! - Never log authorization codes
//! - Ensure consume is atomic to prevent replay under concurrent exchange

use async_trait::async_trait;
use uuid::Uuid;

use crate::AuthResult;
use crate::types::AuthorizationCode;

/// Storage trait for one-time authorization codes.
#[async_trait]
pub trait AuthorizationCodeStorage: Send + Sync {
    /// Inserts a new code into the active set.
    ///
    /// # Errors
    ///
    /// Returns an error if the code cannot be stored (e.g., duplicate code,
    /// storage unavailable).
    async fn create(&self, code: &AuthorizationCode) -> AuthResult<()>;

    /// Atomically removes a code from the active set and archives it.
    ///
    /// The code is removed only when it is unexpired, was issued for
    /// exactly `redirect_uri`, and belongs to `client_id`. When any of these
    /// does not hold the active set is left untouched, except that an
    /// expired code may be archived.
    ///
    /// # Returns
    ///
    /// Returns `Some(code)` with `consumed_at` set for exactly one caller per
    /// code. Every other caller, concurrent or later, receives `None`.
    ///
    /// # Atomicity
    ///
    /// Implementations must ensure this operation is atomic. A common approach
    /// is a conditional delete:
    ///
    /// ```sql
    /// DELETE FROM authorization_codes__active
    /// WHERE code = $1 AND redirect_uri = $2 AND client_id = $3 AND expires_at > NOW()
    /// RETURNING *
    /// ```
    async fn consume(
        &self,
        code: &str,
        redirect_uri: &str,
        client_id: Uuid,
    ) -> AuthResult<Option<AuthorizationCode>>;

    /// Finds an archived (consumed or expired) code.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_archived(&self, code: &str) -> AuthResult<Option<AuthorizationCode>>;
}

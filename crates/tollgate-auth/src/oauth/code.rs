//! One-time authorization codes.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::{AuthorizationCodeStorage, ClientUserStorage};
use crate::types::{AuthorizationCode, Client, ClientUser};

/// Mints authorization codes and exchanges them for their client user.
pub struct AuthorizationCodeIssuer {
    codes: Arc<dyn AuthorizationCodeStorage>,
    client_users: Arc<dyn ClientUserStorage>,
}

impl AuthorizationCodeIssuer {
    #[must_use]
    pub fn new(
        codes: Arc<dyn AuthorizationCodeStorage>,
        client_users: Arc<dyn ClientUserStorage>,
    ) -> Self {
        Self {
            codes,
            client_users,
        }
    }

    /// Stores a fresh code bound to `redirect_uri` and `client_user`, valid
    /// for `lifetime`, and returns its value.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the lifetime is out of range, or a storage
    /// error.
    pub async fn issue(
        &self,
        redirect_uri: &str,
        lifetime: std::time::Duration,
        client_user: &ClientUser,
    ) -> AuthResult<String> {
        let lifetime = time::Duration::try_from(lifetime)
            .map_err(|e| AuthError::configuration(format!("code lifetime out of range: {e}")))?;
        let expires_at = OffsetDateTime::now_utc()
            .checked_add(lifetime)
            .ok_or_else(|| AuthError::configuration("code lifetime out of range"))?;
        let code = AuthorizationCode::new(redirect_uri, client_user, expires_at);
        self.codes.create(&code).await?;

        debug!(
            client_user_id = %client_user.id,
            expires_at = %code.expires_at,
            "Authorization code issued"
        );
        Ok(code.code)
    }

    /// Consumes `code` for `client` and returns the client user it was
    /// issued for.
    ///
    /// Succeeds at most once per code. The code must be unexpired, issued
    /// to `client`, and bound to exactly `redirect_uri`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGrant` if the code cannot be consumed.
    pub async fn consume(
        &self,
        code: &str,
        redirect_uri: &str,
        client: &Client,
    ) -> AuthResult<ClientUser> {
        let Some(consumed) = self.codes.consume(code, redirect_uri, client.id).await? else {
            if self.codes.find_archived(code).await?.is_some() {
                warn!(client_id = %client.client_id, "Consumed or expired authorization code presented");
            } else {
                debug!(client_id = %client.client_id, "Authorization code rejected");
            }
            return Err(AuthError::invalid_grant("authorization code is invalid"));
        };

        self.client_users
            .find_by_id(consumed.client_user_id)
            .await?
            .ok_or_else(|| {
                AuthError::internal(format!(
                    "client user {} referenced by authorization code is missing",
                    consumed.client_user_id
                ))
            })
    }
}

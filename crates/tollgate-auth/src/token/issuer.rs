//! Access token issuance.

use std::sync::Arc;

use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::token::TokenResponse;
use crate::token::jwt::{AccessTokenClaims, JwtService};
use crate::types::Client;

/// Mints the token payload returned from the token endpoint.
///
/// The issuer does not persist anything. Refresh tokens handed to it have
/// already been stored by the rotator.
pub struct TokenIssuer {
    jwt_service: Arc<JwtService>,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(jwt_service: Arc<JwtService>) -> Self {
        Self { jwt_service }
    }

    /// Issues an access token for `client`.
    ///
    /// The subject is `user_id` when present, otherwise the client id. The
    /// expiry comes from the client's configured lifetime, and issuer and
    /// audience from its registration. Extra claims that collide with
    /// registered claim names are dropped.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the client's lifetime overflows the
    /// calendar, or an error if signing fails.
    pub fn issue(
        &self,
        client: &Client,
        user_id: Option<&str>,
        state: Option<&str>,
        extra_claims: Option<Map<String, Value>>,
        refresh_token: Option<String>,
    ) -> AuthResult<TokenResponse> {
        let now = OffsetDateTime::now_utc();
        let lifetime = client.access_token_lifetime();
        let expires_at = now.checked_add(lifetime).ok_or_else(|| {
            AuthError::configuration(format!(
                "access token lifetime of client {} is out of range",
                client.client_id
            ))
        })?;

        let mut extra = extra_claims.unwrap_or_default();
        extra.retain(|name, _| {
            let reserved = AccessTokenClaims::RESERVED.contains(&name.as_str());
            if reserved {
                debug!(claim = %name, client_id = %client.client_id, "Dropping reserved extra claim");
            }
            !reserved
        });

        let claims = AccessTokenClaims {
            iss: client.issuer_uri.clone(),
            sub: user_id.unwrap_or(&client.client_id).to_string(),
            aud: client.audience.clone(),
            exp: expires_at.unix_timestamp(),
            iat: now.unix_timestamp(),
            jti: Uuid::new_v4().to_string(),
            client_id: client.client_id.clone(),
            state: state.map(str::to_string),
            extra,
        };

        let access_token = self.jwt_service.encode(&claims)?;
        let expires_in = u64::try_from(lifetime.whole_seconds()).unwrap_or(0);

        let mut response = TokenResponse::new(access_token, expires_in);
        if let Some(token) = refresh_token {
            response = response.with_refresh_token(token);
        }
        if let Some(state) = state {
            response = response.with_state(state.to_string());
        }
        Ok(response)
    }
}

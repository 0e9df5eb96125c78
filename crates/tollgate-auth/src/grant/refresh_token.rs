//! `refresh_token` grant.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{TokenGrantProvider, authenticate_for_grant, required};
use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::client_auth::CredentialVerifier;
use crate::oauth::token::{TokenRequest, TokenResponse};
use crate::token::{RefreshTokenRotator, TokenIssuer};
use crate::types::{Client, GrantType};

/// Rotates a refresh token and issues a new access token for its user.
pub struct RefreshTokenGrant {
    verifier: Arc<CredentialVerifier>,
    rotator: Arc<RefreshTokenRotator>,
    issuer: Arc<TokenIssuer>,
}

impl RefreshTokenGrant {
    #[must_use]
    pub fn new(
        verifier: Arc<CredentialVerifier>,
        rotator: Arc<RefreshTokenRotator>,
        issuer: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            verifier,
            rotator,
            issuer,
        }
    }

    /// Client and field checks shared by `validate` and `generate_token`.
    async fn check_request(
        &self,
        authorization: Option<&str>,
        request: &TokenRequest,
    ) -> AuthResult<Client> {
        let client = authenticate_for_grant(
            &self.verifier,
            authorization,
            request,
            GrantType::RefreshToken,
        )
        .await?;
        required(request.refresh_token.as_ref(), "refresh_token")?;
        request.parsed_additional_claims()?;
        Ok(client)
    }
}

#[async_trait]
impl TokenGrantProvider for RefreshTokenGrant {
    fn grant_type(&self) -> GrantType {
        GrantType::RefreshToken
    }

    async fn validate(
        &self,
        authorization: Option<&str>,
        request: &TokenRequest,
    ) -> AuthResult<Client> {
        let client = self.check_request(authorization, request).await?;
        let presented = required(request.refresh_token.as_ref(), "refresh_token")?;

        if self
            .rotator
            .find_rotatable(client.id, presented)
            .await?
            .is_none()
        {
            debug!(client_id = %client.client_id, "Refresh token is not rotatable");
            return Err(AuthError::unauthorized_client("refresh token is invalid"));
        }
        Ok(client)
    }

    /// Re-runs the client and field checks, then rotates. The rotatable
    /// check happens inside the rotation itself so a reused token reaches
    /// reuse handling.
    async fn generate_token(
        &self,
        authorization: Option<&str>,
        request: &TokenRequest,
    ) -> AuthResult<TokenResponse> {
        let client = self.check_request(authorization, request).await?;
        let presented = required(request.refresh_token.as_ref(), "refresh_token")?;
        let extra_claims = request.parsed_additional_claims()?;

        let rotated = self
            .rotator
            .rotate(client.id, presented, client.refresh_token_expires_in_days)
            .await?;

        let response = self.issuer.issue(
            &client,
            Some(&rotated.record.user_id),
            request.state(),
            extra_claims,
            Some(rotated.token),
        )?;

        info!(
            client_id = %client.client_id,
            user_id = %rotated.record.user_id,
            "Refresh token exchanged"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::AuthError;
    use crate::grant::fixture::{Harness, basic, harness};
    use crate::oauth::token::TokenRequest;
    use crate::storage::RefreshTokenStorage;
    use crate::testing::REDIRECT_URI;
    use crate::types::RefreshToken;

    fn refresh(token: &str) -> TokenRequest {
        TokenRequest {
            grant_type: "refresh_token".to_string(),
            refresh_token: Some(token.to_string()),
            ..Default::default()
        }
    }

    async fn initial_refresh_token(h: &Harness) -> String {
        let code = h.code_for(&h.web, "U42").await;
        let request = TokenRequest {
            grant_type: "authorization_code".to_string(),
            code: Some(code),
            redirect_uri: Some(REDIRECT_URI.to_string()),
            ..Default::default()
        };
        h.engine
            .exchange(Some(&basic("web-app")), &request)
            .await
            .unwrap()
            .refresh_token
            .unwrap()
    }

    #[tokio::test]
    async fn test_rotation_chain() {
        let h = harness();
        let t0 = initial_refresh_token(&h).await;

        let first = h.engine.exchange(Some(&basic("web-app")), &refresh(&t0)).await.unwrap();
        let t1 = first.refresh_token.clone().unwrap();
        assert_ne!(t0, t1);
        let claims = h
            .jwt
            .decode(&first.access_token, &h.web.issuer_uri, &h.web.audience)
            .unwrap();
        assert_eq!(claims.sub, "U42");

        // T0 cannot be rotated again
        let reuse = h.engine.exchange(Some(&basic("web-app")), &refresh(&t0)).await;
        assert!(matches!(reuse, Err(AuthError::UnauthorizedClient { .. })));

        // T1 still rotates, and T0 links to it
        assert!(h.engine.exchange(Some(&basic("web-app")), &refresh(&t1)).await.is_ok());
        let archived = h
            .refresh_tokens
            .find_archived(&RefreshToken::hash_token(&t0))
            .await
            .unwrap()
            .unwrap();
        let t1_record = h
            .refresh_tokens
            .find_archived(&RefreshToken::hash_token(&t1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(archived.replaced_by, Some(t1_record.id));
    }

    #[tokio::test]
    async fn test_validate_is_read_only() {
        let h = harness();
        let t0 = initial_refresh_token(&h).await;
        let provider = h.engine.provider("refresh_token").unwrap();

        provider.validate(Some(&basic("web-app")), &refresh(&t0)).await.unwrap();
        provider.validate(Some(&basic("web-app")), &refresh(&t0)).await.unwrap();
        assert!(h.engine.exchange(Some(&basic("web-app")), &refresh(&t0)).await.is_ok());
    }

    #[tokio::test]
    async fn test_failure_taxonomy() {
        let h = harness();
        let t0 = initial_refresh_token(&h).await;

        let missing_client = h.engine.exchange(None, &refresh(&t0)).await;
        assert!(matches!(missing_client, Err(AuthError::UnauthorizedClient { .. })));

        let missing_token = h.engine.exchange(Some(&basic("web-app")), &refresh("  ")).await;
        assert!(matches!(missing_token, Err(AuthError::InvalidRequest { .. })));

        let unknown = h.engine.exchange(Some(&basic("web-app")), &refresh("nope")).await;
        assert!(matches!(unknown, Err(AuthError::UnauthorizedClient { .. })));

        // `svc` lacks the refresh_token grant
        let gated = h.engine.exchange(Some(&basic("svc")), &refresh(&t0)).await;
        assert!(matches!(gated, Err(AuthError::UnauthorizedClient { .. })));
    }
}

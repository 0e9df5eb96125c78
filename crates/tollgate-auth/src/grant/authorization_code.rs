//! `authorization_code` grant.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{TokenGrantProvider, authenticate_for_grant, required};
use crate::AuthResult;
use crate::oauth::client_auth::CredentialVerifier;
use crate::oauth::code::AuthorizationCodeIssuer;
use crate::oauth::token::{TokenRequest, TokenResponse};
use crate::token::{RefreshTokenRotator, TokenIssuer};
use crate::types::{Client, GrantType};

/// Exchanges a one-time authorization code for an access token and, when
/// the client issues them, a new refresh token chain.
pub struct AuthorizationCodeGrant {
    verifier: Arc<CredentialVerifier>,
    codes: Arc<AuthorizationCodeIssuer>,
    rotator: Arc<RefreshTokenRotator>,
    issuer: Arc<TokenIssuer>,
}

impl AuthorizationCodeGrant {
    #[must_use]
    pub fn new(
        verifier: Arc<CredentialVerifier>,
        codes: Arc<AuthorizationCodeIssuer>,
        rotator: Arc<RefreshTokenRotator>,
        issuer: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            verifier,
            codes,
            rotator,
            issuer,
        }
    }
}

#[async_trait]
impl TokenGrantProvider for AuthorizationCodeGrant {
    fn grant_type(&self) -> GrantType {
        GrantType::AuthorizationCode
    }

    async fn validate(
        &self,
        authorization: Option<&str>,
        request: &TokenRequest,
    ) -> AuthResult<Client> {
        let client = authenticate_for_grant(
            &self.verifier,
            authorization,
            request,
            GrantType::AuthorizationCode,
        )
        .await?;
        required(request.code.as_ref(), "code")?;
        required(request.redirect_uri.as_ref(), "redirect_uri")?;
        request.parsed_additional_claims()?;
        Ok(client)
    }

    async fn generate_token(
        &self,
        authorization: Option<&str>,
        request: &TokenRequest,
    ) -> AuthResult<TokenResponse> {
        let client = self.validate(authorization, request).await?;
        let code = required(request.code.as_ref(), "code")?;
        let redirect_uri = required(request.redirect_uri.as_ref(), "redirect_uri")?;
        let extra_claims = request.parsed_additional_claims()?;

        // The code is spent from here on; a later failure still burns it.
        let client_user = self.codes.consume(code, redirect_uri, &client).await?;

        let refresh_token = if client.issue_refresh_tokens {
            let issued = self
                .rotator
                .create(&client_user, client.refresh_token_expires_in_days)
                .await?;
            Some(issued.token)
        } else {
            None
        };

        let response = self.issuer.issue(
            &client,
            Some(&client_user.user_id),
            request.state(),
            extra_claims,
            refresh_token,
        )?;

        info!(
            client_id = %client.client_id,
            user_id = %client_user.user_id,
            refresh_token = response.refresh_token.is_some(),
            "Authorization code exchanged"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grant::fixture::{SECRET, basic, harness};
    use crate::error::AuthError;
    use crate::testing::{MockClientStorage, REDIRECT_URI, test_client};
    use crate::token::{JwtService, SigningAlgorithm};
    use crate::types::RefreshToken;

    fn exchange(code: &str) -> TokenRequest {
        TokenRequest {
            grant_type: "authorization_code".to_string(),
            code: Some(code.to_string()),
            redirect_uri: Some(REDIRECT_URI.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_exchange_issues_tokens_once() {
        let h = harness();
        let code = h.code_for(&h.web, "U42").await;
        let mut request = exchange(&code);
        request.state = Some("xyz".to_string());

        let response = h.engine.exchange(Some(&basic("web-app")), &request).await.unwrap();
        let claims = h
            .jwt
            .decode(&response.access_token, &h.web.issuer_uri, &h.web.audience)
            .unwrap();
        assert_eq!(claims.sub, "U42");
        assert_eq!(response.state.as_deref(), Some("xyz"));

        // The refresh token was stored by hash
        let refresh = response.refresh_token.unwrap();
        assert!(
            h.rotator
                .find_rotatable(h.web.id, &refresh)
                .await
                .unwrap()
                .is_some()
        );
        assert_ne!(RefreshToken::hash_token(&refresh), refresh);

        let replay = h.engine.exchange(Some(&basic("web-app")), &request).await;
        assert!(matches!(replay, Err(AuthError::InvalidGrant { .. })));
    }

    #[tokio::test]
    async fn test_no_refresh_token_when_disabled() {
        let h = harness();
        let bare = h
            .engine
            .provider("authorization_code")
            .unwrap()
            .validate(Some(&basic("bare")), &exchange("unused"))
            .await
            .unwrap();
        let code = h.code_for(&bare, "U42").await;

        let response = h
            .engine
            .exchange(Some(&basic("bare")), &exchange(&code))
            .await
            .unwrap();
        assert!(response.refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_redirect_mismatch_is_invalid_grant() {
        let h = harness();
        let code = h.code_for(&h.web, "U42").await;
        let mut request = exchange(&code);
        request.redirect_uri = Some("https://app.example/other".to_string());

        let result = h.engine.exchange(Some(&basic("web-app")), &request).await;
        assert!(matches!(result, Err(AuthError::InvalidGrant { .. })));

        // Still exchangeable with the bound URI
        assert!(
            h.engine
                .exchange(Some(&basic("web-app")), &exchange(&code))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let h = harness();
        let mut request = exchange("abc");
        request.code = Some(String::new());
        let result = h.engine.exchange(Some(&basic("web-app")), &request).await;
        assert!(matches!(result, Err(AuthError::InvalidRequest { .. })));

        let mut request = exchange("abc");
        request.redirect_uri = None;
        let result = h.engine.exchange(Some(&basic("web-app")), &request).await;
        assert!(matches!(result, Err(AuthError::InvalidRequest { .. })));
    }

    #[tokio::test]
    async fn test_client_failures() {
        let h = harness();
        let code = h.code_for(&h.web, "U42").await;

        // No credentials
        let result = h.engine.exchange(None, &exchange(&code)).await;
        assert!(matches!(result, Err(AuthError::UnauthorizedClient { .. })));

        // Client without the grant
        let result = h.engine.exchange(Some(&basic("svc")), &exchange(&code)).await;
        assert!(matches!(result, Err(AuthError::UnauthorizedClient { .. })));

        // Another client holding the grant cannot redeem web-app's code
        let result = h.engine.exchange(Some(&basic("bare")), &exchange(&code)).await;
        assert!(matches!(result, Err(AuthError::InvalidGrant { .. })));
    }

    #[tokio::test]
    async fn test_malformed_claims_do_not_consume() {
        let h = harness();
        let code = h.code_for(&h.web, "U42").await;
        let mut request = exchange(&code);
        request.additional_claims = Some("not json".to_string());

        let result = h.engine.exchange(Some(&basic("web-app")), &request).await;
        assert!(matches!(result, Err(AuthError::InvalidRequest { .. })));
        assert!(
            h.engine
                .exchange(Some(&basic("web-app")), &exchange(&code))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_failure_after_consume_keeps_code_spent() {
        let h = harness();
        let mut client = test_client("long-lived", SECRET, &[GrantType::AuthorizationCode]);
        client.refresh_token_expires_in_days = u32::MAX;

        let grant = AuthorizationCodeGrant::new(
            Arc::new(CredentialVerifier::new(Arc::new(MockClientStorage::with([
                client.clone(),
            ])))),
            h.codes.clone(),
            h.rotator.clone(),
            Arc::new(TokenIssuer::new(Arc::new(JwtService::new(
                b"0123456789abcdef0123456789abcdef",
                SigningAlgorithm::HS256,
            )))),
        );
        let code = h.code_for(&client, "U42").await;
        let request = exchange(&code);

        let result = grant.generate_token(Some(&basic("long-lived")), &request).await;
        assert!(matches!(result, Err(AuthError::Configuration { .. })));

        let replay = grant.generate_token(Some(&basic("long-lived")), &request).await;
        assert!(matches!(replay, Err(AuthError::InvalidGrant { .. })));
    }
}

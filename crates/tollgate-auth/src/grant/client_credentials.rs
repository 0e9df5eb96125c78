//! `client_credentials` grant.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{TokenGrantProvider, authenticate_for_grant};
use crate::AuthResult;
use crate::oauth::client_auth::CredentialVerifier;
use crate::oauth::token::{TokenRequest, TokenResponse};
use crate::token::TokenIssuer;
use crate::types::{Client, GrantType};

/// Issues access tokens to a client acting on its own behalf.
///
/// The token subject is the client itself and no refresh token is issued.
pub struct ClientCredentialsGrant {
    verifier: Arc<CredentialVerifier>,
    issuer: Arc<TokenIssuer>,
}

impl ClientCredentialsGrant {
    #[must_use]
    pub fn new(verifier: Arc<CredentialVerifier>, issuer: Arc<TokenIssuer>) -> Self {
        Self { verifier, issuer }
    }
}

#[async_trait]
impl TokenGrantProvider for ClientCredentialsGrant {
    fn grant_type(&self) -> GrantType {
        GrantType::ClientCredentials
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
            GrantType::ClientCredentials,
        )
        .await?;
        request.parsed_additional_claims()?;
        Ok(client)
    }

    async fn generate_token(
        &self,
        authorization: Option<&str>,
        request: &TokenRequest,
    ) -> AuthResult<TokenResponse> {
        let client = self.validate(authorization, request).await?;
        let extra_claims = request.parsed_additional_claims()?;

        let response = self
            .issuer
            .issue(&client, None, request.state(), extra_claims, None)?;

        info!(client_id = %client.client_id, "Client credentials token issued");
        Ok(response)
    }
}

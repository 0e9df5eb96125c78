//! Token endpoint grant providers.
//!
//! Each `grant_type` has a [`TokenGrantProvider`]. The
//! [`GrantExchangeEngine`] selects the provider for a request and runs it.
//!
//! - [`authorization_code`] - Exchange a one-time code for tokens
//! - [`client_credentials`] - Machine-to-machine access tokens
//! - [`refresh_token`] - Refresh token rotation

pub mod authorization_code;
pub mod client_credentials;
pub mod refresh_token;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::client_auth::CredentialVerifier;
use crate::oauth::code::AuthorizationCodeIssuer;
use crate::oauth::token::{TokenRequest, TokenResponse};
use crate::token::{RefreshTokenRotator, TokenIssuer};
use crate::types::{Client, GrantType};

pub use authorization_code::AuthorizationCodeGrant;
pub use client_credentials::ClientCredentialsGrant;
pub use refresh_token::RefreshTokenGrant;

/// Validates and fulfils token requests for one grant type.
#[async_trait]
pub trait TokenGrantProvider: Send + Sync {
    /// The grant type this provider serves.
    fn grant_type(&self) -> GrantType;

    /// Checks the request without changing any state and returns the
    /// authenticated client.
    ///
    /// # Errors
    ///
    /// Returns the client-class error describing why the request is refused.
    async fn validate(
        &self,
        authorization: Option<&str>,
        request: &TokenRequest,
    ) -> AuthResult<Client>;

    /// Validates the request again and, if it passes, issues tokens.
    ///
    /// # Errors
    ///
    /// Returns a client-class error for refused requests and a server-class
    /// error for infrastructure failures.
    async fn generate_token(
        &self,
        authorization: Option<&str>,
        request: &TokenRequest,
    ) -> AuthResult<TokenResponse>;
}

/// Resolves the client and checks it holds `grant_type`.
pub(crate) async fn authenticate_for_grant(
    verifier: &CredentialVerifier,
    authorization: Option<&str>,
    request: &TokenRequest,
    grant_type: GrantType,
) -> AuthResult<Client> {
    let client = verifier.resolve_client(authorization, request).await?;
    if !client.has_grant(grant_type) {
        warn!(
            client_id = %client.client_id,
            grant_type = %grant_type,
            "Client is not authorized for grant type"
        );
        return Err(AuthError::unauthorized_client(format!(
            "client is not authorized for the {grant_type} grant"
        )));
    }
    Ok(client)
}

/// Returns the non-blank value of a required request field.
pub(crate) fn required<'a>(value: Option<&'a String>, name: &str) -> AuthResult<&'a str> {
    TokenRequest::non_blank(value)
        .ok_or_else(|| AuthError::invalid_request(format!("Missing required parameter: {name}")))
}

/// Maps grant types to their providers.
#[derive(Default)]
pub struct GrantExchangeEngine {
    providers: HashMap<GrantType, Arc<dyn TokenGrantProvider>>,
}

impl GrantExchangeEngine {
    /// Creates an engine with no providers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with the three standard providers.
    #[must_use]
    pub fn with_defaults(
        verifier: Arc<CredentialVerifier>,
        codes: Arc<AuthorizationCodeIssuer>,
        rotator: Arc<RefreshTokenRotator>,
        issuer: Arc<TokenIssuer>,
    ) -> Self {
        let mut engine = Self::new();
        engine.register(Arc::new(AuthorizationCodeGrant::new(
            verifier.clone(),
            codes,
            rotator.clone(),
            issuer.clone(),
        )));
        engine.register(Arc::new(ClientCredentialsGrant::new(
            verifier.clone(),
            issuer.clone(),
        )));
        engine.register(Arc::new(RefreshTokenGrant::new(verifier, rotator, issuer)));
        engine
    }

    /// Registers a provider, replacing any existing one for its grant type.
    pub fn register(&mut self, provider: Arc<dyn TokenGrantProvider>) {
        self.providers.insert(provider.grant_type(), provider);
    }

    /// Selects the provider for a raw `grant_type` value.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if the value is blank
    /// - `UnsupportedGrantType` if it is unknown or has no provider
    pub fn provider(&self, grant_type: &str) -> AuthResult<Arc<dyn TokenGrantProvider>> {
        if grant_type.trim().is_empty() {
            return Err(AuthError::invalid_request(
                "Missing required parameter: grant_type",
            ));
        }
        let parsed: GrantType = grant_type.parse()?;
        self.providers
            .get(&parsed)
            .cloned()
            .ok_or_else(|| AuthError::unsupported_grant_type(grant_type))
    }

    /// Runs a token request through its provider.
    ///
    /// # Errors
    ///
    /// Returns whatever the selected provider reports.
    pub async fn exchange(
        &self,
        authorization: Option<&str>,
        request: &TokenRequest,
    ) -> AuthResult<TokenResponse> {
        self.provider(&request.grant_type)?
            .generate_token(authorization, request)
            .await
    }
}

#[cfg(test)]
pub(crate) mod fixture {
    use super::*;
    use crate::config::RefreshTokenReusePolicy;
    use crate::oauth::client_auth::encode_client_credentials;
    use crate::testing::{
        MockAuthorizationCodeStorage, MockClientStorage, MockClientUserStorage,
        MockRefreshTokenStorage, REDIRECT_URI, test_client,
    };
    use crate::storage::ClientUserStorage;
    use crate::token::{JwtService, SigningAlgorithm};
    use std::time::Duration;

    pub(crate) const SECRET: &str = "s3cret";

    pub(crate) struct Harness {
        pub engine: GrantExchangeEngine,
        pub codes: Arc<AuthorizationCodeIssuer>,
        pub client_users: Arc<MockClientUserStorage>,
        pub refresh_tokens: Arc<MockRefreshTokenStorage>,
        pub rotator: Arc<RefreshTokenRotator>,
        pub jwt: Arc<JwtService>,
        pub web: Client,
    }

    /// Registers `web-app` (authorization_code + refresh_token),
    /// `svc` (client_credentials), and `bare` (authorization_code only,
    /// no refresh tokens).
    pub(crate) fn harness() -> Harness {
        let web = test_client(
            "web-app",
            SECRET,
            &[GrantType::AuthorizationCode, GrantType::RefreshToken],
        );
        let svc = test_client("svc", SECRET, &[GrantType::ClientCredentials]);
        let mut bare = test_client("bare", SECRET, &[GrantType::AuthorizationCode]);
        bare.issue_refresh_tokens = false;

        let clients = Arc::new(MockClientStorage::with([web.clone(), svc, bare]));
        let client_users = Arc::new(MockClientUserStorage::new());
        let refresh_tokens = Arc::new(MockRefreshTokenStorage::new());
        let codes = Arc::new(AuthorizationCodeIssuer::new(
            Arc::new(MockAuthorizationCodeStorage::new()),
            client_users.clone(),
        ));
        let rotator = Arc::new(RefreshTokenRotator::new(
            refresh_tokens.clone(),
            RefreshTokenReusePolicy::Reject,
        ));
        let jwt = Arc::new(JwtService::new(
            b"0123456789abcdef0123456789abcdef",
            SigningAlgorithm::HS256,
        ));
        let engine = GrantExchangeEngine::with_defaults(
            Arc::new(CredentialVerifier::new(clients)),
            codes.clone(),
            rotator.clone(),
            Arc::new(TokenIssuer::new(jwt.clone())),
        );

        Harness {
            engine,
            codes,
            client_users,
            refresh_tokens,
            rotator,
            jwt,
            web,
        }
    }

    pub(crate) fn basic(client_id: &str) -> String {
        format!("Basic {}", encode_client_credentials(client_id, SECRET))
    }

    impl Harness {
        /// Issues a code for `user_id` on the named client.
        pub(crate) async fn code_for(&self, client: &Client, user_id: &str) -> String {
            let client_user = self.client_users.upsert(client.id, user_id).await.unwrap();
            self.codes
                .issue(REDIRECT_URI, Duration::from_secs(300), &client_user)
                .await
                .unwrap()
        }
    }
}

//! Authorization endpoint orchestration.
//!
//! [`AuthorizationService::authorize`] turns an authorization request into
//! a redirect. It never fails: every error becomes an
//! [`AuthorizeOutcome::Error`], and server-side failures are logged here.
//!
//! # Usage
//!
//! ```ignore
//! let service = AuthorizationService::new(clients, client_users, codes, config);
//! match service.authorize(&request, &sessions, &headers).await {
//!     AuthorizeOutcome::Authorized { location } => { /* 302 to location */ }
//!     AuthorizeOutcome::LoginRequired { location } => { /* 302 to login */ }
//!     AuthorizeOutcome::Error { error, location } => { /* 302 or plain body */ }
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::AuthResult;
use crate::config::OAuthConfig;
use crate::error::AuthError;
use crate::oauth::authorize::{
    AuthorizationErrorCode, AuthorizationRequest, AuthorizeOutcome, build_redirect,
};
use crate::oauth::code::AuthorizationCodeIssuer;
use crate::oauth::response_type::ResponseTypeRegistry;
use crate::oauth::session::SessionLookup;
use crate::storage::{ClientStorage, ClientUserStorage};

/// Configuration for the authorization service.
#[derive(Debug, Clone)]
pub struct AuthorizationConfig {
    /// Authorization code lifetime.
    /// Default: 300000 ms.
    pub code_lifetime: Duration,

    /// Login/signup endpoint users without a session are sent to.
    pub login_signup_endpoint: String,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            code_lifetime: Duration::from_millis(300_000),
            login_signup_endpoint: String::new(),
        }
    }
}

impl AuthorizationConfig {
    /// Sets the code lifetime.
    #[must_use]
    pub fn with_code_lifetime(mut self, lifetime: Duration) -> Self {
        self.code_lifetime = lifetime;
        self
    }

    /// Sets the login/signup endpoint.
    #[must_use]
    pub fn with_login_signup_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.login_signup_endpoint = endpoint.into();
        self
    }
}

impl From<&OAuthConfig> for AuthorizationConfig {
    fn from(config: &OAuthConfig) -> Self {
        Self {
            code_lifetime: config.authorization_code_lifetime,
            login_signup_endpoint: config.login_signup_endpoint.clone(),
        }
    }
}

/// Processes authorization requests.
pub struct AuthorizationService {
    clients: Arc<dyn ClientStorage>,
    client_users: Arc<dyn ClientUserStorage>,
    response_types: ResponseTypeRegistry,
    codes: Arc<AuthorizationCodeIssuer>,
    config: AuthorizationConfig,
}

impl AuthorizationService {
    /// Creates a service with the default response type validators.
    #[must_use]
    pub fn new(
        clients: Arc<dyn ClientStorage>,
        client_users: Arc<dyn ClientUserStorage>,
        codes: Arc<AuthorizationCodeIssuer>,
        config: AuthorizationConfig,
    ) -> Self {
        Self {
            response_types: ResponseTypeRegistry::with_defaults(clients.clone()),
            clients,
            client_users,
            codes,
            config,
        }
    }

    /// Replaces the response type registry.
    #[must_use]
    pub fn with_response_types(mut self, response_types: ResponseTypeRegistry) -> Self {
        self.response_types = response_types;
        self
    }

    /// Processes an authorization request.
    ///
    /// # Steps
    ///
    /// 1. Check required parameters
    /// 2. Validate client and redirect URI for the response type
    /// 3. Resolve the logged-in user; without one, redirect to login
    /// 4. Bind the user to the client and issue a code
    /// 5. Redirect to the client with `code` and `user_id`
    ///
    /// # Security
    ///
    /// - Never log the authorization code
    /// - Error redirects go only to a URI registered for the named client
    pub async fn authorize(
        &self,
        request: &AuthorizationRequest,
        sessions: &dyn SessionLookup,
        headers: &HeaderMap,
    ) -> AuthorizeOutcome {
        debug!(
            client_id = %request.client_id,
            response_type = %request.response_type,
            "Authorization request"
        );

        match self.try_authorize(request, sessions, headers).await {
            Ok(outcome) => outcome,
            Err(err) => self.error_outcome(request, &err).await,
        }
    }

    async fn try_authorize(
        &self,
        request: &AuthorizationRequest,
        sessions: &dyn SessionLookup,
        headers: &HeaderMap,
    ) -> AuthResult<AuthorizeOutcome> {
        // 1. Structure
        request.validate_structure()?;

        // 2. Client and redirect URI
        let client = self
            .response_types
            .get(&request.response_type)?
            .validate(&request.client_id, &request.redirect_uri)
            .await?;

        // 3. Session
        let Some(user_id) = sessions.get_user(headers).await? else {
            let location = build_redirect(&self.config.login_signup_endpoint, &request.params, &[])
                .map_err(|e| {
                    AuthError::configuration(format!("invalid login_signup_endpoint: {e}"))
                })?;
            debug!(client_id = %client.client_id, "No session, redirecting to login");
            return Ok(AuthorizeOutcome::LoginRequired { location });
        };

        // 4. Client user and code
        let client_user = self.client_users.upsert(client.id, &user_id).await?;
        let code = self
            .codes
            .issue(&request.redirect_uri, self.config.code_lifetime, &client_user)
            .await?;

        // 5. Redirect
        let location = build_redirect(
            &request.redirect_uri,
            &request.params,
            &[("code", code.as_str()), ("user_id", user_id.as_str())],
        )
        .map_err(|e| AuthError::internal(format!("registered redirect_uri is not a URL: {e}")))?;

        info!(
            client_id = %client.client_id,
            user_id = %user_id,
            "Authorization code granted"
        );
        Ok(AuthorizeOutcome::Authorized { location })
    }

    async fn error_outcome(&self, request: &AuthorizationRequest, err: &AuthError) -> AuthorizeOutcome {
        let error = AuthorizationErrorCode::from_error(err);
        if err.is_server_error() {
            error!(
                client_id = %request.client_id,
                category = %err.category(),
                error = %err,
                "Authorization request failed"
            );
        } else {
            warn!(
                client_id = %request.client_id,
                error = %error,
                reason = %err,
                "Authorization request rejected"
            );
        }

        let location = self.trusted_redirect(request).await.and_then(|_| {
            build_redirect(&request.redirect_uri, &request.params, &[("error", error.as_str())]).ok()
        });
        AuthorizeOutcome::Error { error, location }
    }

    /// Returns the request's redirect URI if it is safe to send an error to.
    async fn trusted_redirect(&self, request: &AuthorizationRequest) -> Option<Url> {
        if request.client_id.trim().is_empty() || request.redirect_uri.trim().is_empty() {
            return None;
        }
        let url = Url::parse(&request.redirect_uri).ok()?;
        match self.clients.find_by_client_id(&request.client_id).await {
            Ok(Some(client)) if client.is_redirect_uri_registered(&request.redirect_uri) => Some(url),
            Ok(_) => None,
            Err(e) => {
                error!(error = %e, "Client lookup failed while building error redirect");
                None
            }
        }
    }
}

//! Authorization request validation per `response_type`.
//!
//! Each response type has a [`ResponseTypeValidator`] selected from a
//! [`ResponseTypeRegistry`]. Validators confirm that the client exists and
//! that the redirect URI is registered for it, and reject response types the
//! server recognises but does not serve.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::ClientStorage;
use crate::types::{Client, ResponseType};

/// Validates an authorization request for one response type.
#[async_trait]
pub trait ResponseTypeValidator: Send + Sync {
    /// The response type this validator serves.
    fn response_type(&self) -> ResponseType;

    /// Validates the client and redirect URI.
    ///
    /// # Errors
    ///
    /// - `UnauthorizedClient` if the client is unknown or lacks a grant
    ///   unlocking this response type
    /// - `InvalidRequest` if the redirect URI is not registered
    /// - `UnsupportedResponseType` if the response type is not served
    async fn validate(&self, client_id: &str, redirect_uri: &str) -> AuthResult<Client>;
}

/// Looks the client up and checks exact redirect URI registration.
async fn registered_client(
    clients: &dyn ClientStorage,
    client_id: &str,
    redirect_uri: &str,
) -> AuthResult<Client> {
    let client = clients
        .find_by_client_id(client_id)
        .await?
        .ok_or_else(|| AuthError::unauthorized_client("unknown client"))?;

    if !client.is_redirect_uri_registered(redirect_uri) {
        debug!(client_id = %client_id, "Redirect URI is not registered");
        return Err(AuthError::invalid_request(
            "redirect_uri is not registered for this client",
        ));
    }

    Ok(client)
}

/// Validator for `response_type=code`.
pub struct CodeResponseType {
    clients: Arc<dyn ClientStorage>,
}

impl CodeResponseType {
    #[must_use]
    pub fn new(clients: Arc<dyn ClientStorage>) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl ResponseTypeValidator for CodeResponseType {
    fn response_type(&self) -> ResponseType {
        ResponseType::Code
    }

    async fn validate(&self, client_id: &str, redirect_uri: &str) -> AuthResult<Client> {
        let client = registered_client(self.clients.as_ref(), client_id, redirect_uri).await?;
        if !client.allows_response_type(ResponseType::Code) {
            return Err(AuthError::unauthorized_client(
                "client is not authorized for the code response type",
            ));
        }
        Ok(client)
    }
}

/// Validator for `response_type=token`.
///
/// Implicit issuance does not exist: after the client and redirect URI
/// check out, the request is rejected as unsupported.
pub struct TokenResponseType {
    clients: Arc<dyn ClientStorage>,
}

impl TokenResponseType {
    #[must_use]
    pub fn new(clients: Arc<dyn ClientStorage>) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl ResponseTypeValidator for TokenResponseType {
    fn response_type(&self) -> ResponseType {
        ResponseType::Token
    }

    async fn validate(&self, client_id: &str, redirect_uri: &str) -> AuthResult<Client> {
        registered_client(self.clients.as_ref(), client_id, redirect_uri).await?;
        Err(AuthError::unsupported_response_type(
            ResponseType::Token.as_str(),
        ))
    }
}

/// Maps response types to their validators.
#[derive(Default)]
pub struct ResponseTypeRegistry {
    validators: HashMap<ResponseType, Arc<dyn ResponseTypeValidator>>,
}

impl ResponseTypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the `code` and `token` validators.
    #[must_use]
    pub fn with_defaults(clients: Arc<dyn ClientStorage>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(CodeResponseType::new(clients.clone())));
        registry.register(Arc::new(TokenResponseType::new(clients)));
        registry
    }

    /// Registers a validator, replacing any existing one for its type.
    pub fn register(&mut self, validator: Arc<dyn ResponseTypeValidator>) {
        self.validators.insert(validator.response_type(), validator);
    }

    /// Selects the validator for a raw `response_type` value.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedResponseType` for unknown or unregistered values.
    pub fn get(&self, response_type: &str) -> AuthResult<Arc<dyn ResponseTypeValidator>> {
        let parsed: ResponseType = response_type.parse()?;
        self.validators
            .get(&parsed)
            .cloned()
            .ok_or_else(|| AuthError::unsupported_response_type(response_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockClientStorage, REDIRECT_URI, test_client};
    use crate::types::GrantType;

    fn registry() -> ResponseTypeRegistry {
        let clients = MockClientStorage::with([
            test_client("web-app", "s3cret", &[GrantType::AuthorizationCode]),
            test_client("svc", "s3cret", &[GrantType::ClientCredentials]),
        ]);
        ResponseTypeRegistry::with_defaults(Arc::new(clients))
    }

    #[tokio::test]
    async fn test_code_valid() {
        let validator = registry().get("code").unwrap();
        let client = validator.validate("web-app", REDIRECT_URI).await.unwrap();
        assert_eq!(client.client_id, "web-app");
    }

    #[tokio::test]
    async fn test_code_unknown_client() {
        let validator = registry().get("code").unwrap();
        let result = validator.validate("nobody", REDIRECT_URI).await;
        assert!(matches!(result, Err(AuthError::UnauthorizedClient { .. })));
    }

    #[tokio::test]
    async fn test_code_redirect_mismatch() {
        let validator = registry().get("code").unwrap();
        for uri in ["https://app.example/cb/", "https://app.example/c", "https://evil.example/cb"] {
            let result = validator.validate("web-app", uri).await;
            assert!(matches!(result, Err(AuthError::InvalidRequest { .. })), "{uri}");
        }
    }

    #[tokio::test]
    async fn test_code_requires_grant() {
        let validator = registry().get("code").unwrap();
        let result = validator.validate("svc", REDIRECT_URI).await;
        assert!(matches!(result, Err(AuthError::UnauthorizedClient { .. })));
    }

    #[tokio::test]
    async fn test_token_is_unsupported_after_validation() {
        let validator = registry().get("token").unwrap();

        let result = validator.validate("web-app", REDIRECT_URI).await;
        assert!(matches!(result, Err(AuthError::UnsupportedResponseType { .. })));

        let result = validator.validate("nobody", REDIRECT_URI).await;
        assert!(matches!(result, Err(AuthError::UnauthorizedClient { .. })));
    }

    #[test]
    fn test_unknown_response_type() {
        let registry = registry();
        assert!(matches!(
            registry.get("id_token"),
            Err(AuthError::UnsupportedResponseType { .. })
        ));
        assert!(matches!(
            ResponseTypeRegistry::new().get("code"),
            Err(AuthError::UnsupportedResponseType { .. })
        ));
    }
}

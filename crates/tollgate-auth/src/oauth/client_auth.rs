//! Client authentication for the token endpoint.
//!
//! # Authentication Methods
//!
//! - `client_secret_basic` - HTTP Basic Auth with client_id:client_secret
//! - `client_secret_post` - client_id and client_secret in request body
//!
//! # Authentication Priority
//!
//! When an `Authorization` header is present it is the only source
//! consulted, even if it cannot be decoded. Body fields are used only when
//! the header is absent or blank.

use std::sync::Arc;

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD_NO_PAD};
use base64::engine::DecodePaddingMode;
use tracing::{debug, warn};

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::token::TokenRequest;
use crate::storage::ClientStorage;
use crate::types::Client;

/// Standard alphabet, padding optional on decode.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes a `base64(client_id:client_secret)` credential.
///
/// Accepts the value with or without a leading `Basic` scheme and with or
/// without padding. Returns `None` on any malformed input.
#[must_use]
pub fn decode_client_credentials(header: &str) -> Option<(String, String)> {
    let header = header.trim();
    let encoded = match header.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("basic") => rest.trim(),
        Some(_) => return None,
        None => header,
    };
    if encoded.is_empty() {
        return None;
    }

    let decoded = LENIENT.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (client_id, client_secret) = decoded.split_once(':')?;
    if client_id.is_empty() {
        return None;
    }
    Some((client_id.to_string(), client_secret.to_string()))
}

/// Encodes a credential pair the way [`decode_client_credentials`] reads it.
#[must_use]
pub fn encode_client_credentials(client_id: &str, client_secret: &str) -> String {
    STANDARD_NO_PAD.encode(format!("{client_id}:{client_secret}"))
}

/// Verifies client credentials against the client directory.
pub struct CredentialVerifier {
    clients: Arc<dyn ClientStorage>,
}

impl CredentialVerifier {
    #[must_use]
    pub fn new(clients: Arc<dyn ClientStorage>) -> Self {
        Self { clients }
    }

    /// Returns the client if `client_id` is registered and `client_secret`
    /// equals its stored secret exactly.
    ///
    /// Unknown client and wrong secret are indistinguishable to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error only if the directory lookup fails.
    pub async fn get_client(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> AuthResult<Option<Client>> {
        let Some(client) = self.clients.find_by_client_id(client_id).await? else {
            debug!(client_id = %client_id, "Unknown client");
            return Ok(None);
        };

        match client.client_secret_decoded() {
            Some(secret) if secret == client_secret => Ok(Some(client)),
            Some(_) => {
                debug!(client_id = %client_id, "Client secret mismatch");
                Ok(None)
            }
            None => {
                warn!(client_id = %client_id, "Stored client secret is not decodable");
                Ok(None)
            }
        }
    }

    /// Resolves the requesting client from the `Authorization` header or,
    /// when it is absent, from the body fields.
    ///
    /// # Errors
    ///
    /// Returns `UnauthorizedClient` if no credentials are supplied, the
    /// header is malformed, or the credentials do not match a client.
    pub async fn resolve_client(
        &self,
        authorization: Option<&str>,
        request: &TokenRequest,
    ) -> AuthResult<Client> {
        let (client_id, client_secret) = match authorization.filter(|h| !h.trim().is_empty()) {
            Some(header) => decode_client_credentials(header).ok_or_else(|| {
                warn!("Malformed Authorization header on token request");
                AuthError::unauthorized_client("malformed client credentials")
            })?,
            None => match (
                TokenRequest::non_blank(request.client_id.as_ref()),
                request.client_secret.as_deref(),
            ) {
                (Some(id), Some(secret)) => (id.to_string(), secret.to_string()),
                _ => {
                    return Err(AuthError::unauthorized_client(
                        "client credentials are required",
                    ));
                }
            },
        };

        match self.get_client(&client_id, &client_secret).await? {
            Some(client) => Ok(client),
            None => {
                warn!(client_id = %client_id, "Client authentication failed");
                Err(AuthError::unauthorized_client("invalid client credentials"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockClientStorage, test_client};
    use crate::types::GrantType;
    use base64::engine::general_purpose::STANDARD;

    fn verifier() -> CredentialVerifier {
        let client = test_client("web-app", "s3cret", &[GrantType::AuthorizationCode]);
        CredentialVerifier::new(Arc::new(MockClientStorage::with([client])))
    }

    #[test]
    fn test_decode_with_and_without_scheme() {
        let padded = STANDARD.encode("web-app:s3cret");
        let expected = Some(("web-app".to_string(), "s3cret".to_string()));

        assert_eq!(decode_client_credentials(&format!("Basic {padded}")), expected);
        assert_eq!(decode_client_credentials(&format!("basic {padded}")), expected);
        assert_eq!(decode_client_credentials(&padded), expected);
        assert_eq!(
            decode_client_credentials(&encode_client_credentials("web-app", "s3cret")),
            expected
        );
    }

    #[test]
    fn test_decode_secret_with_colon() {
        let header = encode_client_credentials("web-app", "a:b:c");
        assert_eq!(
            decode_client_credentials(&header),
            Some(("web-app".to_string(), "a:b:c".to_string()))
        );
    }

    #[test]
    fn test_decode_malformed() {
        assert!(decode_client_credentials("").is_none());
        assert!(decode_client_credentials("Basic").is_none());
        assert!(decode_client_credentials("Basic !!!").is_none());
        assert!(decode_client_credentials("Bearer abc").is_none());
        assert!(decode_client_credentials(&STANDARD.encode("no-colon")).is_none());
        assert!(decode_client_credentials(&STANDARD.encode(":secret")).is_none());
    }

    #[tokio::test]
    async fn test_get_client_exact_secret() {
        let verifier = verifier();
        assert!(verifier.get_client("web-app", "s3cret").await.unwrap().is_some());
        assert!(verifier.get_client("web-app", "s3creT").await.unwrap().is_none());
        assert!(verifier.get_client("web-app", "s3cret ").await.unwrap().is_none());
        assert!(verifier.get_client("web-ap", "s3cret").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_prefers_header() {
        let verifier = verifier();
        let header = format!("Basic {}", encode_client_credentials("web-app", "s3cret"));
        let request = TokenRequest {
            client_id: Some("someone-else".to_string()),
            client_secret: Some("wrong".to_string()),
            ..Default::default()
        };

        let client = verifier.resolve_client(Some(&header), &request).await.unwrap();
        assert_eq!(client.client_id, "web-app");
    }

    #[tokio::test]
    async fn test_resolve_from_body() {
        let verifier = verifier();
        let request = TokenRequest {
            client_id: Some("web-app".to_string()),
            client_secret: Some("s3cret".to_string()),
            ..Default::default()
        };
        let client = verifier.resolve_client(None, &request).await.unwrap();
        assert_eq!(client.client_id, "web-app");
    }

    #[tokio::test]
    async fn test_malformed_header_does_not_fall_back() {
        let verifier = verifier();
        let request = TokenRequest {
            client_id: Some("web-app".to_string()),
            client_secret: Some("s3cret".to_string()),
            ..Default::default()
        };
        let result = verifier.resolve_client(Some("Basic ###"), &request).await;
        assert!(matches!(result, Err(AuthError::UnauthorizedClient { .. })));
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let verifier = verifier();
        let result = verifier.resolve_client(None, &TokenRequest::default()).await;
        assert!(matches!(result, Err(AuthError::UnauthorizedClient { .. })));
    }
}

//! OAuth 2.0 client registration types.
//!
//! A [`Client`] is the joined view of a registration: the client row itself,
//! the [`Grant`]s linked to it through [`ClientGrant`] rows, and its
//! [`RedirectUri`]s.

use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE};
use serde::{Deserialize, Serialize};
use time::Duration;
use uuid::Uuid;

use crate::error::AuthError;

// =============================================================================
// Grant Type
// =============================================================================

/// OAuth 2.0 grant types accepted at the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Authorization Code flow.
    AuthorizationCode,
    /// Client Credentials flow.
    ClientCredentials,
    /// Refresh Token flow.
    RefreshToken,
}

impl GrantType {
    /// Returns the OAuth 2.0 grant_type parameter value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::ClientCredentials => "client_credentials",
            Self::RefreshToken => "refresh_token",
        }
    }
}

impl FromStr for GrantType {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authorization_code" => Ok(Self::AuthorizationCode),
            "client_credentials" => Ok(Self::ClientCredentials),
            "refresh_token" => Ok(Self::RefreshToken),
            other => Err(AuthError::unsupported_grant_type(other)),
        }
    }
}

impl std::fmt::Display for GrantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Response Type
// =============================================================================

/// OAuth 2.0 response types accepted at the authorization endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Authorization code response.
    Code,
    /// Implicit token response. Recognised but not served.
    Token,
}

impl ResponseType {
    /// Returns the OAuth 2.0 response_type parameter value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Token => "token",
        }
    }
}

impl FromStr for ResponseType {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(Self::Code),
            "token" => Ok(Self::Token),
            other => Err(AuthError::unsupported_response_type(other)),
        }
    }
}

impl std::fmt::Display for ResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Grant / ClientGrant / RedirectUri
// =============================================================================

/// A grant capability: one grant type plus the response types it unlocks
/// at the authorization endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    /// Grant row identifier.
    pub id: Uuid,
    /// Grant type this capability covers.
    pub grant_type: GrantType,
    /// Response types usable at `/oauth/authorize` under this grant.
    #[serde(default)]
    pub response_types: Vec<ResponseType>,
}

impl Grant {
    /// Creates a grant with the response types conventionally paired with
    /// its grant type.
    #[must_use]
    pub fn new(grant_type: GrantType) -> Self {
        let response_types = match grant_type {
            GrantType::AuthorizationCode => vec![ResponseType::Code],
            GrantType::ClientCredentials | GrantType::RefreshToken => Vec::new(),
        };
        Self {
            id: Uuid::new_v4(),
            grant_type,
            response_types,
        }
    }
}

/// Join row linking a client to a grant it may use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientGrant {
    /// Join row identifier.
    pub id: Uuid,
    /// Internal id of the client.
    pub client_id: Uuid,
    /// Id of the linked grant.
    pub grant_id: Uuid,
}

/// A redirect URI registered to exactly one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectUri {
    /// Row identifier.
    pub id: Uuid,
    /// Internal id of the owning client.
    pub client_id: Uuid,
    /// The registered URI, compared by exact string equality.
    pub redirect_uri: String,
}

// =============================================================================
// Client
// =============================================================================

/// Registered OAuth 2.0 client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Internal row identifier, referenced by client users and tokens.
    pub id: Uuid,

    /// Public client identifier used in OAuth flows.
    pub client_id: String,

    /// Client secret, base64url-encoded at rest.
    pub client_secret: String,

    /// Audience placed in the `aud` claim of issued access tokens.
    pub audience: String,

    /// Issuer placed in the `iss` claim of issued access tokens.
    pub issuer_uri: String,

    /// Whether the authorization code grant also issues a refresh token.
    pub issue_refresh_tokens: bool,

    /// Access token lifetime in minutes.
    pub token_expires_in_minutes: u32,

    /// Refresh token lifetime in days.
    pub refresh_token_expires_in_days: u32,

    /// Grants linked to this client through `ClientGrant` rows.
    #[serde(default)]
    pub grants: Vec<Grant>,

    /// Redirect URIs registered for this client.
    #[serde(default)]
    pub redirect_uris: Vec<RedirectUri>,
}

impl Client {
    /// Encodes a plain client secret into its at-rest form.
    #[must_use]
    pub fn encode_secret(plain: &str) -> String {
        URL_SAFE.encode(plain.as_bytes())
    }

    /// Returns the plain client secret, or `None` if the stored value is not
    /// valid base64url-encoded UTF-8.
    #[must_use]
    pub fn client_secret_decoded(&self) -> Option<String> {
        let bytes = URL_SAFE.decode(self.client_secret.as_bytes()).ok()?;
        String::from_utf8(bytes).ok()
    }

    /// Returns the unpadded base64 `client_id:client_secret` pair accepted in
    /// a Basic `Authorization` header.
    #[must_use]
    pub fn basic_credentials(&self) -> Option<String> {
        let secret = self.client_secret_decoded()?;
        Some(STANDARD_NO_PAD.encode(format!("{}:{secret}", self.client_id)))
    }

    /// Validates the registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the registration is unusable.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        if self.client_id.trim().is_empty() {
            return Err(ClientValidationError::EmptyClientId);
        }

        if self.client_secret_decoded().is_none() {
            return Err(ClientValidationError::MalformedSecret);
        }

        if self.grants.is_empty() {
            return Err(ClientValidationError::NoGrants);
        }

        if self.has_grant(GrantType::AuthorizationCode) && self.redirect_uris.is_empty() {
            return Err(ClientValidationError::NoRedirectUris);
        }

        if self.token_expires_in_minutes == 0 {
            return Err(ClientValidationError::ZeroTokenLifetime);
        }
        if self.token_expires_in_minutes > MAX_TOKEN_EXPIRES_IN_MINUTES {
            return Err(ClientValidationError::TokenLifetimeTooLong);
        }

        if self.refresh_token_expires_in_days > MAX_REFRESH_TOKEN_EXPIRES_IN_DAYS {
            return Err(ClientValidationError::RefreshLifetimeTooLong);
        }

        Ok(())
    }

    /// Checks if the URI exactly matches one of the registered redirect URIs.
    #[must_use]
    pub fn is_redirect_uri_registered(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|r| r.redirect_uri == uri)
    }

    /// Checks if a `ClientGrant` links this client to the given grant type.
    #[must_use]
    pub fn has_grant(&self, grant_type: GrantType) -> bool {
        self.grants.iter().any(|g| g.grant_type == grant_type)
    }

    /// Checks if any linked grant unlocks the given response type.
    #[must_use]
    pub fn allows_response_type(&self, response_type: ResponseType) -> bool {
        self.grants
            .iter()
            .any(|g| g.response_types.contains(&response_type))
    }

    /// Returns the access token lifetime.
    #[must_use]
    pub fn access_token_lifetime(&self) -> Duration {
        Duration::minutes(i64::from(self.token_expires_in_minutes))
    }

    /// Returns the refresh token lifetime.
    #[must_use]
    pub fn refresh_token_lifetime(&self) -> Duration {
        Duration::days(i64::from(self.refresh_token_expires_in_days))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Longest accepted access token lifetime: one year.
pub const MAX_TOKEN_EXPIRES_IN_MINUTES: u32 = 365 * 24 * 60;

/// Longest accepted refresh token lifetime: ten years.
pub const MAX_REFRESH_TOKEN_EXPIRES_IN_DAYS: u32 = 3650;

/// Errors that can occur during client validation.
#[derive(Debug, thiserror::Error)]
pub enum ClientValidationError {
    /// Client ID cannot be empty.
    #[error("Client ID cannot be empty")]
    EmptyClientId,

    /// The stored secret is not base64url-encoded UTF-8.
    #[error("Client secret is not base64url encoded")]
    MalformedSecret,

    /// At least one grant is required.
    #[error("At least one grant is required")]
    NoGrants,

    /// Authorization code flow requires redirect URIs.
    #[error("Authorization code flow requires redirect URIs")]
    NoRedirectUris,

    /// Access tokens must live for at least one minute.
    #[error("Access token lifetime must be at least one minute")]
    ZeroTokenLifetime,

    /// Access token lifetime is above [`MAX_TOKEN_EXPIRES_IN_MINUTES`].
    #[error("Access token lifetime must not exceed {} minutes", MAX_TOKEN_EXPIRES_IN_MINUTES)]
    TokenLifetimeTooLong,

    /// Refresh token lifetime is above [`MAX_REFRESH_TOKEN_EXPIRES_IN_DAYS`].
    #[error("Refresh token lifetime must not exceed {} days", MAX_REFRESH_TOKEN_EXPIRES_IN_DAYS)]
    RefreshLifetimeTooLong,
}

// =============================================================================
// Tests
// =============================================================================

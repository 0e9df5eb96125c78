//! Token endpoint request, response, and error types.
//!
//! # Supported Grant Types
//!
//! - `authorization_code` - Exchange an authorization code for tokens
//! - `client_credentials` - Machine-to-machine authentication
//! - `refresh_token` - Rotate a refresh token for a new access token

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::AuthResult;
use crate::error::AuthError;

/// Token request parameters.
///
/// This structure handles every grant type. Different fields are required
/// depending on the `grant_type`:
///
/// - `authorization_code`: code, redirect_uri
/// - `refresh_token`: refresh_token
/// - `client_credentials`: nothing beyond client authentication
///
/// # Client Authentication
///
/// Clients authenticate using one of:
/// - HTTP Basic Auth header (not in this struct)
/// - `client_id` + `client_secret` in body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    /// OAuth 2.0 grant type. A missing value is treated as blank.
    #[serde(default)]
    pub grant_type: String,

    /// Authorization code (for authorization_code grant).
    #[serde(default)]
    pub code: Option<String>,

    /// Redirect URI the code was issued for.
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// Refresh token (for refresh_token grant).
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Client ID (for client_secret_post).
    #[serde(default)]
    pub client_id: Option<String>,

    /// Client secret (for client_secret_post).
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Opaque value embedded in the access token and echoed back.
    #[serde(default)]
    pub state: Option<String>,

    /// JSON object of extra claims to embed in the access token.
    #[serde(default)]
    pub additional_claims: Option<String>,
}

impl TokenRequest {
    /// Returns the value of an optional field if it is present and non-blank.
    #[must_use]
    pub fn non_blank(value: Option<&String>) -> Option<&str> {
        value.map(String::as_str).filter(|v| !v.trim().is_empty())
    }

    /// Returns the non-blank `state`, if any.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        Self::non_blank(self.state.as_ref())
    }

    /// Parses `additional_claims` into a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the value is not a JSON object.
    pub fn parsed_additional_claims(&self) -> AuthResult<Option<Map<String, Value>>> {
        let Some(raw) = Self::non_blank(self.additional_claims.as_ref()) else {
            return Ok(None);
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            Ok(_) => Err(AuthError::invalid_request(
                "additional_claims must be a JSON object",
            )),
            Err(e) => Err(AuthError::invalid_request(format!(
                "additional_claims is not valid JSON: {e}"
            ))),
        }
    }
}

/// Successful token response.
///
/// # Example Response
///
/// ```json
/// {
///   "access_token": "eyJhbG...",
///   "token_type": "Bearer",
///   "expires_in": 900,
///   "refresh_token": "abc123..."
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The access token (JWT).
    pub access_token: String,

    /// Token type, always "Bearer".
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: u64,

    /// Rotated or newly created refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// State echoed from the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl TokenResponse {
    /// Creates a new token response with required fields.
    #[must_use]
    pub fn new(access_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            refresh_token: None,
            state: None,
        }
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, token: String) -> Self {
        self.refresh_token = Some(token);
        self
    }

    /// Sets the echoed state.
    #[must_use]
    pub fn with_state(mut self, state: String) -> Self {
        self.state = Some(state);
        self
    }
}

/// Token error response.
///
/// # Example Response
///
/// ```json
/// {
///   "error": "invalid_grant",
///   "error_description": "authorization code is invalid"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenError {
    /// OAuth 2.0 error code.
    pub error: TokenErrorCode,

    /// Human-readable error description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl TokenError {
    /// Creates a new token error.
    #[must_use]
    pub fn new(error: TokenErrorCode) -> Self {
        Self {
            error,
            error_description: None,
        }
    }

    /// Creates a new token error with description.
    #[must_use]
    pub fn with_description(error: TokenErrorCode, description: impl Into<String>) -> Self {
        Self {
            error,
            error_description: Some(description.into()),
        }
    }

    /// Converts a core error into the body returned to the client.
    ///
    /// Server-side failures lose their detail here.
    #[must_use]
    pub fn from_error(err: &AuthError) -> Self {
        let code = TokenErrorCode::from_error(err);
        match (code, err) {
            (TokenErrorCode::ServerError, _) => Self::new(code),
            (_, AuthError::InvalidRequest { message })
            | (_, AuthError::UnauthorizedClient { message })
            | (_, AuthError::InvalidGrant { message }) => Self::with_description(code, message),
            _ => Self::with_description(code, err.to_string()),
        }
    }
}

/// OAuth 2.0 token error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenErrorCode {
    /// The request is missing a required parameter or is otherwise malformed.
    InvalidRequest,

    /// The client is unknown, failed authentication, or is not authorized
    /// to use this grant type.
    UnauthorizedClient,

    /// The authorization code is invalid, expired, consumed, or was issued
    /// for another redirect URI.
    InvalidGrant,

    /// The grant type is not supported by the authorization server.
    UnsupportedGrantType,

    /// The server failed unexpectedly.
    ServerError,
}

impl TokenErrorCode {
    /// Returns the string representation of the error code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::UnauthorizedClient => "unauthorized_client",
            Self::InvalidGrant => "invalid_grant",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::ServerError => "server_error",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ServerError => 500,
            Self::InvalidRequest
            | Self::UnauthorizedClient
            | Self::InvalidGrant
            | Self::UnsupportedGrantType => 400,
        }
    }

    /// Maps a core error onto the token endpoint taxonomy.
    ///
    /// `unsupported_response_type` cannot occur at the token endpoint and
    /// collapses to `invalid_request`.
    #[must_use]
    pub fn from_error(err: &AuthError) -> Self {
        match err {
            AuthError::InvalidRequest { .. } | AuthError::UnsupportedResponseType { .. } => {
                Self::InvalidRequest
            }
            AuthError::UnauthorizedClient { .. } => Self::UnauthorizedClient,
            AuthError::InvalidGrant { .. } => Self::InvalidGrant,
            AuthError::UnsupportedGrantType { .. } => Self::UnsupportedGrantType,
            AuthError::Storage { .. }
            | AuthError::Configuration { .. }
            | AuthError::Cipher { .. }
            | AuthError::Internal { .. } => Self::ServerError,
        }
    }
}

impl fmt::Display for TokenErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

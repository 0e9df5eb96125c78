//! Authorization endpoint types.
//!
//! # OAuth 2.0 Authorization Code Flow
//!
//! 1. Client redirects the user to `/oauth/authorize` with request parameters
//! 2. Without a login session the user is sent to the login/signup endpoint
//!    carrying the same parameters
//! 3. With a session the server redirects back to the client with the
//!    original parameters plus `code` and `user_id`
//! 4. Client exchanges the code at the token endpoint
//!
//! Every outcome echoes the parameters the request arrived with, so the
//! client and the login service see exactly what they sent.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::AuthResult;
use crate::error::AuthError;

/// Authorization request parameters.
///
/// # Example
///
/// ```ignore
/// GET /oauth/authorize?
///   response_type=code
///   &client_id=web-app
///   &redirect_uri=https://app.example/cb
///   &state=xyz
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// Requested response type, `code` or `token`.
    pub response_type: String,

    /// Client identifier issued during registration.
    pub client_id: String,

    /// Where the response is sent. Must exactly match a registered URI.
    pub redirect_uri: String,

    /// Opaque client state, echoed through `params`.
    pub state: Option<String>,

    /// Parameters to echo on every redirect, in order.
    pub params: Vec<(String, String)>,
}

impl AuthorizationRequest {
    /// Builds a request from decoded query pairs.
    ///
    /// The first occurrence of a known parameter wins. Every pair is kept
    /// for echoing.
    #[must_use]
    pub fn from_query(pairs: Vec<(String, String)>) -> Self {
        let first = |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };
        Self {
            response_type: first("response_type").unwrap_or_default(),
            client_id: first("client_id").unwrap_or_default(),
            redirect_uri: first("redirect_uri").unwrap_or_default(),
            state: first("state").filter(|s| !s.trim().is_empty()),
            params: pairs,
        }
    }

    /// Checks that the required parameters are present and non-blank.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` naming the first missing parameter.
    pub fn validate_structure(&self) -> AuthResult<()> {
        for (name, value) in [
            ("client_id", &self.client_id),
            ("redirect_uri", &self.redirect_uri),
            ("response_type", &self.response_type),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::invalid_request(format!(
                    "Missing required parameter: {name}"
                )));
            }
        }
        Ok(())
    }
}

/// JSON body accepted by `POST /oauth/authorize`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizationRequestBody {
    #[serde(default)]
    pub response_type: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl AuthorizationRequestBody {
    /// Converts the body into a request echoing the non-blank fields.
    #[must_use]
    pub fn into_request(self) -> AuthorizationRequest {
        let fields = [
            ("response_type", self.response_type),
            ("redirect_uri", self.redirect_uri),
            ("client_id", self.client_id),
            ("state", self.state),
        ];
        let params = fields
            .into_iter()
            .filter_map(|(name, value)| {
                value
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (name.to_string(), v))
            })
            .collect();
        AuthorizationRequest::from_query(params)
    }
}

/// OAuth 2.0 authorization error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationErrorCode {
    /// The request is missing a required parameter or is otherwise malformed.
    InvalidRequest,

    /// The client is unknown or not authorized for this response type.
    UnauthorizedClient,

    /// The server does not serve this response type.
    UnsupportedResponseType,

    /// The server failed unexpectedly.
    ServerError,
}

impl AuthorizationErrorCode {
    /// Returns the string representation of the error code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::UnauthorizedClient => "unauthorized_client",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::ServerError => "server_error",
        }
    }

    /// Maps a core error onto the authorization endpoint taxonomy.
    #[must_use]
    pub fn from_error(err: &AuthError) -> Self {
        match err {
            AuthError::InvalidRequest { .. }
            | AuthError::InvalidGrant { .. }
            | AuthError::UnsupportedGrantType { .. } => Self::InvalidRequest,
            AuthError::UnauthorizedClient { .. } => Self::UnauthorizedClient,
            AuthError::UnsupportedResponseType { .. } => Self::UnsupportedResponseType,
            AuthError::Storage { .. }
            | AuthError::Configuration { .. }
            | AuthError::Cipher { .. }
            | AuthError::Internal { .. } => Self::ServerError,
        }
    }
}

impl fmt::Display for AuthorizationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of processing an authorization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizeOutcome {
    /// A code was issued; redirect back to the client.
    Authorized {
        /// Client redirect carrying `code` and `user_id`.
        location: Url,
    },

    /// No login session; redirect to the login/signup endpoint.
    LoginRequired {
        /// Login redirect carrying the original parameters.
        location: Url,
    },

    /// The request failed.
    Error {
        /// Error code for the redirect or response body.
        error: AuthorizationErrorCode,
        /// Client redirect carrying `error`, when a trusted target exists.
        location: Option<Url>,
    },
}

/// Parameter names only the server may put on a redirect.
const RESERVED_REDIRECT_PARAMS: [&str; 3] = ["code", "user_id", "error"];

/// Appends `params` then `extra` to the query of `base`.
///
/// Echoed `params` named `code`, `user_id` or `error` are dropped, as is any
/// name that `extra` sets.
///
/// # Errors
///
/// Returns an error if `base` is not an absolute URL.
pub fn build_redirect(
    base: &str,
    params: &[(String, String)],
    extra: &[(&str, &str)],
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    {
        let mut pairs = url.query_pairs_mut();
        let echoed = params.iter().filter(|(name, _)| {
            !RESERVED_REDIRECT_PARAMS.contains(&name.as_str())
                && !extra.iter().any(|(reserved, _)| reserved == name)
        });
        for (name, value) in echoed {
            pairs.append_pair(name, value);
        }
        for (name, value) in extra {
            pairs.append_pair(name, value);
        }
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_query() {
        let request = AuthorizationRequest::from_query(pairs(&[
            ("response_type", "code"),
            ("client_id", "web-app"),
            ("redirect_uri", "https://app.example/cb"),
            ("state", "xyz"),
            ("prompt", "login"),
        ]));
        assert_eq!(request.response_type, "code");
        assert_eq!(request.client_id, "web-app");
        assert_eq!(request.state.as_deref(), Some("xyz"));
        assert_eq!(request.params.len(), 5);
        assert!(request.validate_structure().is_ok());
    }

    #[test]
    fn test_missing_parameters() {
        let request = AuthorizationRequest::from_query(pairs(&[
            ("response_type", "code"),
            ("client_id", " "),
            ("redirect_uri", "https://app.example/cb"),
        ]));
        assert!(matches!(
            request.validate_structure(),
            Err(AuthError::InvalidRequest { .. })
        ));
        assert!(AuthorizationRequest::default().validate_structure().is_err());
    }

    #[test]
    fn test_body_echoes_non_blank_fields() {
        let body: AuthorizationRequestBody = serde_json::from_str(
            r#"{"client_id":"web-app","response_type":"code","redirect_uri":"https://app.example/cb","state":""}"#,
        )
        .unwrap();
        let request = body.into_request();

        assert_eq!(
            request.params,
            pairs(&[
                ("response_type", "code"),
                ("redirect_uri", "https://app.example/cb"),
                ("client_id", "web-app"),
            ])
        );
        assert!(request.state.is_none());
    }

    #[test]
    fn test_build_redirect() {
        let url = build_redirect(
            "https://app.example/cb",
            &pairs(&[("client_id", "web-app"), ("state", "x y")]),
            &[("code", "abc"), ("user_id", "U42")],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://app.example/cb?client_id=web-app&state=x+y&code=abc&user_id=U42"
        );

        assert!(build_redirect("/relative", &[], &[]).is_err());
    }

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(
            AuthorizationErrorCode::from_error(&AuthError::storage("down")),
            AuthorizationErrorCode::ServerError
        );
        assert_eq!(
            AuthorizationErrorCode::from_error(&AuthError::unsupported_response_type("token")),
            AuthorizationErrorCode::UnsupportedResponseType
        );
        assert_eq!(AuthorizationErrorCode::ServerError.to_string(), "server_error");
    }

    #[test]
    fn test_redirect_drops_reserved_params() {
        let params = pairs(&[
            ("response_type", "code"),
            ("code", "EVIL"),
            ("user_id", "X"),
            ("error", "access_denied"),
            ("state", "xyz"),
        ]);
        let url = build_redirect(
            "https://app.example/cb",
            &params,
            &[("code", "real"), ("user_id", "U42")],
        )
        .unwrap();

        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            query,
            pairs(&[
                ("response_type", "code"),
                ("state", "xyz"),
                ("code", "real"),
                ("user_id", "U42"),
            ])
        );
    }
}

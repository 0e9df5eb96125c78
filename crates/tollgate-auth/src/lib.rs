//! # tollgate-auth
//!
//! OAuth 2.0 authorization server core for Tollgate.
//!
//! This crate provides:
//! - The authorization endpoint with pluggable `response_type` validators
//! - The token endpoint with pluggable grant providers
//! - One-time authorization codes bound to client and redirect URI
//! - Refresh token rotation with reuse detection
//! - HS-signed JWT access tokens
//!
//! ## Modules
//!
//! - [`config`] - Authorization server configuration
//! - [`oauth`] - Authorization endpoint flow and token endpoint wire types
//! - [`grant`] - Grant providers and the token exchange engine
//! - [`token`] - Access token signing and refresh token rotation
//! - [`crypto`] - Session cookie encryption
//! - [`storage`] - Storage traits for auth-related data
//! - [`http`] - Axum HTTP handlers for OAuth endpoints

pub mod config;
pub mod crypto;
pub mod error;
pub mod grant;
pub mod http;
pub mod oauth;
pub mod storage;
pub mod token;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::{AuthConfig, ConfigError, RefreshTokenReusePolicy};
pub use error::{AuthError, ErrorCategory};
pub use grant::{GrantExchangeEngine, TokenGrantProvider};
pub use http::{OAuthState, router};
pub use oauth::{
    AuthorizationCodeIssuer, AuthorizationConfig, AuthorizationService, CookieSessionLookup,
    CredentialVerifier, SessionLookup,
};
pub use storage::{
    AuthorizationCodeStorage, ClientStorage, ClientUserStorage, RefreshTokenStorage,
};
pub use token::{JwtService, RefreshTokenRotator, SigningAlgorithm, TokenIssuer};
pub use types::{AuthorizationCode, Client, ClientUser, GrantType, RefreshToken, ResponseType};

/// Type alias for authentication/authorization results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use tollgate_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{AuthConfig, ConfigError, RefreshTokenReusePolicy};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::grant::{GrantExchangeEngine, TokenGrantProvider};
    pub use crate::http::{OAuthState, router};
    pub use crate::oauth::{
        AuthorizationCodeIssuer, AuthorizationConfig, AuthorizationService, AuthorizeOutcome,
        CookieSessionLookup, CredentialVerifier, SessionLookup, TokenRequest, TokenResponse,
    };
    pub use crate::storage::{
        AuthorizationCodeStorage, ClientStorage, ClientUserStorage, RefreshTokenStorage,
    };
    pub use crate::token::{JwtService, RefreshTokenRotator, SigningAlgorithm, TokenIssuer};
    pub use crate::types::{
        AuthorizationCode, Client, ClientUser, GrantType, RefreshToken, ResponseType,
    };
}

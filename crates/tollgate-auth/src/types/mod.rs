//! Domain types shared across the authorization server.
//!
//! ## Domain Types
//!
//! - [`Client`] - OAuth 2.0 client registration with grants and redirect URIs
//! - [`GrantType`] / [`ResponseType`] - Supported protocol modes
//! - [`ClientUser`] - Client to end-user binding
//! - [`AuthorizationCode`] - One-time authorization code
//! - [`RefreshToken`] - Refresh token with rotation chain link

pub mod authorization_code;
pub mod client;
pub mod client_user;
pub mod refresh_token;

pub use authorization_code::AuthorizationCode;
pub use client::{
    Client, ClientGrant, ClientValidationError, Grant, GrantType, MAX_REFRESH_TOKEN_EXPIRES_IN_DAYS,
    MAX_TOKEN_EXPIRES_IN_MINUTES, RedirectUri, ResponseType,
};
pub use client_user::ClientUser;
pub use refresh_token::RefreshToken;

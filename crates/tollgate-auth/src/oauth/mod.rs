//! OAuth 2.0 authorization server flows.
//!
//! - [`authorize`] - Request, outcome, and error types for the authorization endpoint
//! - [`response_type`] - Per `response_type` request validation
//! - [`service`] - Authorization endpoint orchestration
//! - [`session`] - Login session lookup
//! - [`code`] - One-time authorization codes
//! - [`client_auth`] - Client credential verification
//! - [`token`] - Token endpoint request, response, and error types

pub mod authorize;
pub mod client_auth;
pub mod code;
pub mod response_type;
pub mod service;
pub mod session;
pub mod token;

pub use authorize::{
    AuthorizationErrorCode, AuthorizationRequest, AuthorizationRequestBody, AuthorizeOutcome,
};
pub use client_auth::{CredentialVerifier, decode_client_credentials, encode_client_credentials};
pub use code::AuthorizationCodeIssuer;
pub use response_type::{
    CodeResponseType, ResponseTypeRegistry, ResponseTypeValidator, TokenResponseType,
};
pub use service::{AuthorizationConfig, AuthorizationService};
pub use session::{CookieSessionLookup, SessionLookup};
pub use token::{TokenError, TokenErrorCode, TokenRequest, TokenResponse};

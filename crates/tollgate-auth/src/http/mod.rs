//! HTTP handlers for the OAuth 2.0 endpoints.
//!
//! # Usage
//!
//! ```ignore
//! use tollgate_auth::http::{OAuthState, router};
//!
//! let app = router(OAuthState::new(authorization, sessions, grants));
//! ```
//!
//! # Available Handlers
//!
//! - [`authorize`] - `GET`/`POST /oauth/authorize`
//! - [`token`] - `POST /oauth/token`

pub mod authorize;
pub mod token;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::grant::GrantExchangeEngine;
use crate::oauth::service::AuthorizationService;
use crate::oauth::session::SessionLookup;

pub use authorize::{authorize_get, authorize_post};
pub use token::token_handler;

/// Shared state for the OAuth endpoints.
#[derive(Clone)]
pub struct OAuthState {
    /// Authorization endpoint orchestration.
    pub authorization: Arc<AuthorizationService>,
    /// Login session lookup.
    pub sessions: Arc<dyn SessionLookup>,
    /// Token endpoint grant dispatch.
    pub grants: Arc<GrantExchangeEngine>,
}

impl OAuthState {
    #[must_use]
    pub fn new(
        authorization: Arc<AuthorizationService>,
        sessions: Arc<dyn SessionLookup>,
        grants: Arc<GrantExchangeEngine>,
    ) -> Self {
        Self {
            authorization,
            sessions,
            grants,
        }
    }
}

/// Builds the router serving `/oauth/authorize` and `/oauth/token`.
pub fn router(state: OAuthState) -> Router {
    Router::new()
        .route("/oauth/authorize", get(authorize_get).post(authorize_post))
        .route("/oauth/token", post(token_handler))
        .with_state(state)
}

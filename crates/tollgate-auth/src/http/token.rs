//! Token endpoint handler.
//!
//! # Example
//!
//! ```text
//! POST /oauth/token
//! Content-Type: application/x-www-form-urlencoded
//! Authorization: Basic <base64(client_id:client_secret)>
//!
//! grant_type=authorization_code
//! &code=SplxlOBeZQQYbYS6WxSbIA
//! &redirect_uri=https://app.example/cb
//! ```

use axum::{
    Form, Json,
    extract::{State, rejection::FormRejection},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, info, warn};

use super::OAuthState;
use crate::error::AuthError;
use crate::oauth::token::{TokenError, TokenRequest, TokenResponse};

/// `POST /oauth/token`.
///
/// Client credentials come from the `Authorization` header or, when it is
/// absent, from `client_id`/`client_secret` in the form body.
pub async fn token_handler(
    State(state): State<OAuthState>,
    headers: HeaderMap,
    form: Result<Form<TokenRequest>, FormRejection>,
) -> Response {
    let request = match form {
        Ok(Form(request)) => request,
        Err(rejection) => {
            debug!(error = %rejection, "Unreadable token request body");
            return token_error_response(&AuthError::invalid_request(
                "request body must be application/x-www-form-urlencoded",
            ));
        }
    };

    let authorization = match headers.get(AUTHORIZATION).map(|v| v.to_str()) {
        None => None,
        Some(Ok(value)) => Some(value),
        Some(Err(_)) => {
            warn!("Authorization header is not valid UTF-8");
            return token_error_response(&AuthError::unauthorized_client(
                "malformed client credentials",
            ));
        }
    };

    debug!(grant_type = %request.grant_type, "Processing token request");

    match state.grants.exchange(authorization, &request).await {
        Ok(response) => {
            info!(grant_type = %request.grant_type, "Token issued");
            token_success_response(response)
        }
        Err(e) => {
            if e.is_server_error() {
                error!(
                    grant_type = %request.grant_type,
                    category = %e.category(),
                    error = %e,
                    "Token request failed"
                );
            } else {
                warn!(
                    grant_type = %request.grant_type,
                    error = e.oauth_error_code(),
                    reason = %e,
                    "Token request rejected"
                );
            }
            token_error_response(&e)
        }
    }
}

fn token_success_response(response: TokenResponse) -> Response {
    (
        StatusCode::OK,
        [("Cache-Control", "no-store"), ("Pragma", "no-cache")],
        Json(response),
    )
        .into_response()
}

/// Renders an error as the token endpoint's JSON error body.
pub fn token_error_response(error: &AuthError) -> Response {
    let body = TokenError::from_error(error);
    let status = StatusCode::from_u16(body.error.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        [("Cache-Control", "no-store"), ("Pragma", "no-cache")],
        Json(body),
    )
        .into_response()
}

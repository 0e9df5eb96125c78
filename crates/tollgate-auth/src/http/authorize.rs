//! Authorization endpoint handlers.
//!
//! # Request Format
//!
//! ```text
//! GET /oauth/authorize?response_type=code&client_id=C&redirect_uri=https://app.example/cb&state=xyz
//!
//! POST /oauth/authorize
//! Content-Type: application/json
//!
//! {"response_type":"code","client_id":"C","redirect_uri":"https://app.example/cb","state":"xyz"}
//! ```
//!
//! # Response
//!
//! Always `302 Found`. `Location` points at the client, or at the login
//! endpoint when there is no session. An error with no trusted redirect
//! target carries the error code as a plain body and no `Location`.

use axum::{
    Json,
    extract::{RawQuery, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::OAuthState;
use crate::oauth::authorize::{AuthorizationRequest, AuthorizationRequestBody, AuthorizeOutcome};

/// `GET /oauth/authorize`.
pub async fn authorize_get(
    State(state): State<OAuthState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let pairs = query
        .as_deref()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();
    let request = AuthorizationRequest::from_query(pairs);

    let outcome = state
        .authorization
        .authorize(&request, state.sessions.as_ref(), &headers)
        .await;
    outcome_response(outcome)
}

/// `POST /oauth/authorize` with a JSON body.
pub async fn authorize_post(
    State(state): State<OAuthState>,
    headers: HeaderMap,
    body: Result<Json<AuthorizationRequestBody>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            debug!(error = %rejection, "Unreadable authorization request body");
            AuthorizationRequestBody::default()
        }
    };
    let request = body.into_request();

    let outcome = state
        .authorization
        .authorize(&request, state.sessions.as_ref(), &headers)
        .await;
    outcome_response(outcome)
}

/// Renders an outcome as a `302 Found`.
pub fn outcome_response(outcome: AuthorizeOutcome) -> Response {
    match outcome {
        AuthorizeOutcome::Authorized { location }
        | AuthorizeOutcome::LoginRequired { location }
        | AuthorizeOutcome::Error {
            location: Some(location),
            ..
        } => (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response(),
        AuthorizeOutcome::Error {
            error,
            location: None,
        } => (StatusCode::FOUND, error.as_str()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::authorize::AuthorizationErrorCode;
    use url::Url;

    #[test]
    fn test_redirect_outcome() {
        let location = Url::parse("https://app.example/cb?code=abc").unwrap();
        let response = outcome_response(AuthorizeOutcome::Authorized {
            location: location.clone(),
        });
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            location.as_str()
        );
    }

    #[test]
    fn test_error_without_target() {
        let response = outcome_response(AuthorizeOutcome::Error {
            error: AuthorizationErrorCode::InvalidRequest,
            location: None,
        });
        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(response.headers().get(LOCATION).is_none());
    }
}

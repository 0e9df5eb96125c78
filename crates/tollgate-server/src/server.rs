use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use tollgate_auth::oauth::{AuthorizationConfig, AuthorizationService, CookieSessionLookup};
use tollgate_auth::token::{JwtService, RefreshTokenRotator, SigningAlgorithm, TokenIssuer};
use tollgate_auth::{
    AuthError, AuthorizationCodeIssuer, ConfigError, CredentialVerifier, GrantExchangeEngine,
    OAuthState,
};
use tollgate_auth_memory::MemoryAuthStorage;

use crate::config::AppConfig;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("invalid server address: {0}")]
    Address(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub struct TollgateServer {
    addr: SocketAddr,
    app: Router,
}

/// Wires storage, the OAuth components, and the HTTP routes.
pub fn build_app(cfg: &AppConfig) -> Result<Router, ServerError> {
    build_app_with_storage(cfg, MemoryAuthStorage::new())
}

/// Like [`build_app`], but over caller-provided storage.
pub fn build_app_with_storage(
    cfg: &AppConfig,
    storage: MemoryAuthStorage,
) -> Result<Router, ServerError> {
    let clients = storage.clients();
    for registration in &cfg.clients {
        clients.insert(registration.to_client())?;
    }
    tracing::info!(clients = clients.len(), "Client directory seeded");

    let algorithm = cfg
        .auth
        .signing
        .algorithm
        .parse::<SigningAlgorithm>()
        .map_err(AuthError::from)?;
    let jwt = Arc::new(JwtService::new(cfg.auth.signing.secret.as_bytes(), algorithm));
    let issuer = Arc::new(TokenIssuer::new(jwt));

    let codes = Arc::new(AuthorizationCodeIssuer::new(
        storage.authorization_codes(),
        storage.client_users(),
    ));
    let rotator = Arc::new(RefreshTokenRotator::new(
        storage.refresh_tokens(),
        cfg.auth.oauth.refresh_token_reuse,
    ));
    let verifier = Arc::new(CredentialVerifier::new(clients.clone()));

    let authorization = Arc::new(AuthorizationService::new(
        clients,
        storage.client_users(),
        codes.clone(),
        AuthorizationConfig::from(&cfg.auth.oauth),
    ));
    let grants = Arc::new(GrantExchangeEngine::with_defaults(
        verifier, codes, rotator, issuer,
    ));
    let sessions = Arc::new(CookieSessionLookup::from_config(&cfg.auth.session)?);

    let oauth = tollgate_auth::router(OAuthState::new(authorization, sessions, grants));

    Ok(Router::new()
        .route("/healthz", get(healthz))
        .merge(oauth)
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http.request",
                    http.method = %req.method(),
                    http.target = %req.uri().path(),
                )
            }),
        ))
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

impl TollgateServer {
    pub fn new(cfg: &AppConfig) -> Result<Self, ServerError> {
        let addr = cfg.addr().map_err(ServerError::Address)?;
        let app = build_app(cfg)?;
        Ok(Self { addr, app })
    }

    pub async fn run(self) -> Result<(), ServerError> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

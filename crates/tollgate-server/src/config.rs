use std::collections::HashSet;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use tollgate_auth::AuthConfig;
use tollgate_auth::types::{Client, Grant, GrantType, RedirectUri};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    /// Clients seeded into the directory at startup.
    pub clients: Vec<ClientRegistration>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// A client registration as written in the config file.
///
/// The secret is given in plain text and encoded when the client is seeded.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientRegistration {
    pub client_id: String,
    pub client_secret: String,
    pub audience: String,
    pub issuer_uri: String,
    #[serde(default = "default_true")]
    pub issue_refresh_tokens: bool,
    #[serde(default = "default_token_minutes")]
    pub token_expires_in_minutes: u32,
    #[serde(default = "default_refresh_days")]
    pub refresh_token_expires_in_days: u32,
    pub grant_types: Vec<GrantType>,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_token_minutes() -> u32 {
    15
}

fn default_refresh_days() -> u32 {
    30
}

impl ClientRegistration {
    /// Builds the stored client with fresh ids and an encoded secret.
    pub fn to_client(&self) -> Client {
        let id = Uuid::new_v4();
        Client {
            id,
            client_id: self.client_id.clone(),
            client_secret: Client::encode_secret(&self.client_secret),
            audience: self.audience.clone(),
            issuer_uri: self.issuer_uri.clone(),
            issue_refresh_tokens: self.issue_refresh_tokens,
            token_expires_in_minutes: self.token_expires_in_minutes,
            refresh_token_expires_in_days: self.refresh_token_expires_in_days,
            grants: self.grant_types.iter().copied().map(Grant::new).collect(),
            redirect_uris: self
                .redirect_uris
                .iter()
                .map(|uri| RedirectUri {
                    id: Uuid::new_v4(),
                    client_id: id,
                    redirect_uri: uri.clone(),
                })
                .collect(),
        }
    }
}

impl AppConfig {
    pub fn addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("invalid server address: {e}"))
    }

    pub fn validate(&self) -> Result<(), String> {
        self.addr()?;

        if self.logging.level.trim().is_empty() {
            return Err("logging.level must not be empty".into());
        }

        self.auth.validate().map_err(|e| e.to_string())?;

        let mut seen = HashSet::new();
        for registration in &self.clients {
            if !seen.insert(registration.client_id.as_str()) {
                return Err(format!(
                    "client '{}' is registered more than once",
                    registration.client_id
                ));
            }
            registration
                .to_client()
                .validate()
                .map_err(|e| format!("client '{}': {e}", registration.client_id))?;
        }
        Ok(())
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or("tollgate.toml"));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., TOLLGATE__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("TOLLGATE")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

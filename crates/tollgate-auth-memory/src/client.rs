//! Client directory storage.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use tollgate_auth::storage::ClientStorage;
use tollgate_auth::types::Client;
use tollgate_auth::{AuthError, AuthResult};

/// Client directory keyed by public client id.
#[derive(Debug, Default)]
pub struct MemoryClientStorage {
    clients: DashMap<String, Client>,
}

impl MemoryClientStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client, replacing any registration with the same client id.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the registration is invalid.
    pub fn insert(&self, client: Client) -> AuthResult<()> {
        client.validate().map_err(|e| {
            AuthError::configuration(format!("client '{}': {e}", client.client_id))
        })?;
        debug!(client_id = %client.client_id, "Registered client");
        self.clients.insert(client.client_id.clone(), client);
        Ok(())
    }

    /// Number of registered clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[async_trait]
impl ClientStorage for MemoryClientStorage {
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
        Ok(self.clients.get(client_id).map(|c| c.value().clone()))
    }
}

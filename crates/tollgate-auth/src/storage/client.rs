//! Client directory storage trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::Client;

/// Read access to registered clients.
///
/// Implementations return the joined view of a registration: the client row,
/// every grant linked to it through a `ClientGrant` row, and its registered
/// redirect URIs. Registration lifecycle is owned by the directory, not by
/// the authorization core.
#[async_trait]
pub trait ClientStorage: Send + Sync {
    /// Finds a client by its public client identifier.
    ///
    /// # Returns
    ///
    /// Returns `Some(client)` if registered, `None` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>>;
}

//! Client user storage trait.

use async_trait::async_trait;
use uuid::Uuid;

use crate::AuthResult;
use crate::types::ClientUser;

/// Storage for client to end-user bindings.
#[async_trait]
pub trait ClientUserStorage: Send + Sync {
    /// Returns the binding for `(client_id, user_id)`, creating it if absent.
    ///
    /// Concurrent calls for the same pair must all observe the same binding.
    ///
    /// # Arguments
    ///
    /// * `client_id` - Internal id of the client
    /// * `user_id` - End-user subject identifier
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn upsert(&self, client_id: Uuid, user_id: &str) -> AuthResult<ClientUser>;

    /// Finds a binding by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<ClientUser>>;
}

//! Binding between a client and an authenticated end user.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Durable association between a client application and an end-user subject.
///
/// Created the first time a user authorizes a given client and referenced by
/// every authorization code and refresh token issued for that pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientUser {
    /// Unique identifier for this binding.
    pub id: Uuid,

    /// Internal id of the client.
    pub client_id: Uuid,

    /// End-user subject identifier.
    pub user_id: String,

    /// When the binding was first created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ClientUser {
    /// Creates a new binding for the given client and user.
    #[must_use]
    pub fn new(client_id: Uuid, user_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id,
            user_id: user_id.into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

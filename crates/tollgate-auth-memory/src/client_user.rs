//! Client user storage.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use tollgate_auth::AuthResult;
use tollgate_auth::storage::ClientUserStorage;
use tollgate_auth::types::ClientUser;

/// Client user bindings, unique per `(client_id, user_id)`.
#[derive(Debug, Default)]
pub struct MemoryClientUserStorage {
    by_pair: DashMap<(Uuid, String), ClientUser>,
    by_id: DashMap<Uuid, ClientUser>,
}

impl MemoryClientUserStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientUserStorage for MemoryClientUserStorage {
    async fn upsert(&self, client_id: Uuid, user_id: &str) -> AuthResult<ClientUser> {
        // The entry guard holds the shard lock, so concurrent callers for the
        // same pair see one binding.
        let binding = self
            .by_pair
            .entry((client_id, user_id.to_string()))
            .or_insert_with(|| {
                let created = ClientUser::new(client_id, user_id);
                self.by_id.insert(created.id, created.clone());
                created
            })
            .value()
            .clone();
        Ok(binding)
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<ClientUser>> {
        Ok(self.by_id.get(&id).map(|u| u.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let storage = MemoryClientUserStorage::new();
        let client_id = Uuid::new_v4();

        let first = storage.upsert(client_id, "U1").await.unwrap();
        let second = storage.upsert(client_id, "U1").await.unwrap();
        assert_eq!(first.id, second.id);

        let other = storage.upsert(client_id, "U2").await.unwrap();
        assert_ne!(first.id, other.id);

        let found = storage.find_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(found.user_id, "U1");
    }

    #[tokio::test]
    async fn test_concurrent_upsert_single_binding() {
        let storage = Arc::new(MemoryClientUserStorage::new());
        let client_id = Uuid::new_v4();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let storage = storage.clone();
                tokio::spawn(async move { storage.upsert(client_id, "U1").await.unwrap().id })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
    }
}

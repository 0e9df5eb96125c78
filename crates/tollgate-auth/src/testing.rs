//! In-crate test doubles for the storage traits.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::storage::{
    AuthorizationCodeStorage, ClientStorage, ClientUserStorage, RefreshTokenStorage,
};
use crate::types::{AuthorizationCode, Client, ClientUser, Grant, GrantType, RedirectUri, RefreshToken};

pub(crate) const REDIRECT_URI: &str = "https://app.example/cb";

/// Builds a valid client registered with `REDIRECT_URI`.
pub(crate) fn test_client(client_id: &str, secret: &str, grants: &[GrantType]) -> Client {
    let id = Uuid::new_v4();
    Client {
        id,
        client_id: client_id.to_string(),
        client_secret: Client::encode_secret(secret),
        audience: "https://api.example.com".to_string(),
        issuer_uri: "https://auth.example.com".to_string(),
        issue_refresh_tokens: true,
        token_expires_in_minutes: 15,
        refresh_token_expires_in_days: 30,
        grants: grants.iter().copied().map(Grant::new).collect(),
        redirect_uris: vec![RedirectUri {
            id: Uuid::new_v4(),
            client_id: id,
            redirect_uri: REDIRECT_URI.to_string(),
        }],
    }
}

pub(crate) struct MockClientStorage {
    clients: RwLock<HashMap<String, Client>>,
}

impl MockClientStorage {
    pub(crate) fn new() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn with(clients: impl IntoIterator<Item = Client>) -> Self {
        let storage = Self::new();
        for client in clients {
            storage.add(client);
        }
        storage
    }

    pub(crate) fn add(&self, client: Client) {
        self.clients
            .write()
            .unwrap()
            .insert(client.client_id.clone(), client);
    }
}

#[async_trait]
impl ClientStorage for MockClientStorage {
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
        Ok(self.clients.read().unwrap().get(client_id).cloned())
    }
}

pub(crate) struct MockClientUserStorage {
    users: RwLock<HashMap<(Uuid, String), ClientUser>>,
}

impl MockClientUserStorage {
    pub(crate) fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ClientUserStorage for MockClientUserStorage {
    async fn upsert(&self, client_id: Uuid, user_id: &str) -> AuthResult<ClientUser> {
        let mut users = self.users.write().unwrap();
        Ok(users
            .entry((client_id, user_id.to_string()))
            .or_insert_with(|| ClientUser::new(client_id, user_id))
            .clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<ClientUser>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.id == id)
            .cloned())
    }
}

pub(crate) struct MockAuthorizationCodeStorage {
    active: RwLock<HashMap<String, AuthorizationCode>>,
    history: RwLock<HashMap<String, AuthorizationCode>>,
}

impl MockAuthorizationCodeStorage {
    pub(crate) fn new() -> Self {
        Self {
            active: RwLock::new(HashMap::new()),
            history: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn is_active(&self, code: &str) -> bool {
        self.active.read().unwrap().contains_key(code)
    }
}

#[async_trait]
impl AuthorizationCodeStorage for MockAuthorizationCodeStorage {
    async fn create(&self, code: &AuthorizationCode) -> AuthResult<()> {
        self.active
            .write()
            .unwrap()
            .insert(code.code.clone(), code.clone());
        Ok(())
    }

    async fn consume(
        &self,
        code: &str,
        redirect_uri: &str,
        client_id: Uuid,
    ) -> AuthResult<Option<AuthorizationCode>> {
        let mut active = self.active.write().unwrap();
        let matches = active
            .get(code)
            .is_some_and(|c| c.redirect_uri == redirect_uri && c.client_id == client_id);
        if !matches {
            return Ok(None);
        }

        let Some(mut record) = active.remove(code) else {
            return Ok(None);
        };
        record.consumed_at = Some(OffsetDateTime::now_utc());
        self.history
            .write()
            .unwrap()
            .insert(record.code.clone(), record.clone());

        if record.is_expired_at(record.consumed_at.unwrap_or_else(OffsetDateTime::now_utc)) {
            return Ok(None);
        }
        Ok(Some(record))
    }

    async fn find_archived(&self, code: &str) -> AuthResult<Option<AuthorizationCode>> {
        Ok(self.history.read().unwrap().get(code).cloned())
    }
}

#[derive(Default)]
struct TokenTables {
    active: HashMap<String, RefreshToken>,
    history: HashMap<String, RefreshToken>,
}

pub(crate) struct MockRefreshTokenStorage {
    tables: RwLock<TokenTables>,
}

impl MockRefreshTokenStorage {
    pub(crate) fn new() -> Self {
        Self {
            tables: RwLock::new(TokenTables::default()),
        }
    }
}

#[async_trait]
impl RefreshTokenStorage for MockRefreshTokenStorage {
    async fn create(&self, token: &RefreshToken) -> AuthResult<()> {
        self.tables
            .write()
            .unwrap()
            .active
            .insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn find_active(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>> {
        Ok(self.tables.read().unwrap().active.get(token_hash).cloned())
    }

    async fn find_archived(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>> {
        Ok(self.tables.read().unwrap().history.get(token_hash).cloned())
    }

    async fn rotate(
        &self,
        token_hash: &str,
        client_id: Uuid,
        replacement: &RefreshToken,
    ) -> AuthResult<Option<RefreshToken>> {
        let now = OffsetDateTime::now_utc();
        let mut tables = self.tables.write().unwrap();
        let rotatable = tables
            .active
            .get(token_hash)
            .is_some_and(|t| t.client_id == client_id && !t.is_expired_at(now));
        if !rotatable {
            return Ok(None);
        }

        let Some(mut old) = tables.active.remove(token_hash) else {
            return Ok(None);
        };
        old.revoked_at = Some(now);
        old.updated_at = now;
        old.replaced_by = Some(replacement.id);
        tables.history.insert(old.token_hash.clone(), old.clone());
        tables
            .active
            .insert(replacement.token_hash.clone(), replacement.clone());
        Ok(Some(old))
    }

    async fn revoke_chain(&self, from: Uuid) -> AuthResult<u64> {
        let now = OffsetDateTime::now_utc();
        let mut tables = self.tables.write().unwrap();
        let mut next = tables
            .history
            .values()
            .find(|t| t.id == from)
            .and_then(|t| t.replaced_by);

        while let Some(id) = next {
            if let Some(hash) = tables
                .active
                .values()
                .find(|t| t.id == id)
                .map(|t| t.token_hash.clone())
            {
                if let Some(mut live) = tables.active.remove(&hash) {
                    live.revoked_at = Some(now);
                    live.updated_at = now;
                    tables.history.insert(hash, live);
                    return Ok(1);
                }
            }
            next = tables
                .history
                .values()
                .find(|t| t.id == id)
                .and_then(|t| t.replaced_by);
        }
        Ok(0)
    }
}

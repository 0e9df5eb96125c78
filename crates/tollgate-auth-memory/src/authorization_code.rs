//! Authorization code storage.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use time::OffsetDateTime;
use uuid::Uuid;

use tollgate_auth::storage::AuthorizationCodeStorage;
use tollgate_auth::types::AuthorizationCode;
use tollgate_auth::{AuthError, AuthResult};

/// Authorization codes split into active and consumed tables.
#[derive(Debug, Default)]
pub struct MemoryAuthorizationCodeStorage {
    active: DashMap<String, AuthorizationCode>,
    history: DashMap<String, AuthorizationCode>,
}

impl MemoryAuthorizationCodeStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the code is still redeemable.
    #[must_use]
    pub fn is_active(&self, code: &str) -> bool {
        self.active.contains_key(code)
    }
}

#[async_trait]
impl AuthorizationCodeStorage for MemoryAuthorizationCodeStorage {
    async fn create(&self, code: &AuthorizationCode) -> AuthResult<()> {
        match self.active.entry(code.code.clone()) {
            Entry::Occupied(_) => Err(AuthError::storage("duplicate authorization code")),
            Entry::Vacant(slot) => {
                slot.insert(code.clone());
                Ok(())
            }
        }
    }

    async fn consume(
        &self,
        code: &str,
        redirect_uri: &str,
        client_id: Uuid,
    ) -> AuthResult<Option<AuthorizationCode>> {
        let Some((_, mut record)) = self.active.remove_if(code, |_, c| {
            c.redirect_uri == redirect_uri && c.client_id == client_id
        }) else {
            return Ok(None);
        };

        let now = OffsetDateTime::now_utc();
        record.consumed_at = Some(now);
        self.history.insert(record.code.clone(), record.clone());

        // Expired codes leave the active table but are never redeemed.
        if record.is_expired_at(now) {
            return Ok(None);
        }
        Ok(Some(record))
    }

    async fn find_archived(&self, code: &str) -> AuthResult<Option<AuthorizationCode>> {
        Ok(self.history.get(code).map(|c| c.value().clone()))
    }
}

//! Refresh token storage.
//!
//! Both tables sit behind one async mutex so that a rotation (archive the
//! predecessor, insert the successor) is observed as a single step.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use tollgate_auth::AuthResult;
use tollgate_auth::storage::RefreshTokenStorage;
use tollgate_auth::types::RefreshToken;

#[derive(Debug, Default)]
struct Tables {
    active: HashMap<String, RefreshToken>,
    history: HashMap<String, RefreshToken>,
    /// Token id to hash, across both tables.
    hashes: HashMap<Uuid, String>,
}

impl Tables {
    fn archive(&mut self, hash: &str, now: OffsetDateTime) -> Option<RefreshToken> {
        let mut row = self.active.remove(hash)?;
        row.revoked_at = Some(now);
        row.updated_at = now;
        self.history.insert(row.token_hash.clone(), row.clone());
        Some(row)
    }

    fn by_id(&self, id: Uuid) -> Option<&RefreshToken> {
        let hash = self.hashes.get(&id)?;
        self.active.get(hash).or_else(|| self.history.get(hash))
    }
}

/// Refresh tokens split into active and history tables.
#[derive(Debug, Default)]
pub struct MemoryRefreshTokenStorage {
    tables: Mutex<Tables>,
}

impl MemoryRefreshTokenStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStorage for MemoryRefreshTokenStorage {
    async fn create(&self, token: &RefreshToken) -> AuthResult<()> {
        let mut tables = self.tables.lock().await;
        tables.hashes.insert(token.id, token.token_hash.clone());
        tables
            .active
            .insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn find_active(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>> {
        Ok(self.tables.lock().await.active.get(token_hash).cloned())
    }

    async fn find_archived(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>> {
        Ok(self.tables.lock().await.history.get(token_hash).cloned())
    }

    async fn rotate(
        &self,
        token_hash: &str,
        client_id: Uuid,
        replacement: &RefreshToken,
    ) -> AuthResult<Option<RefreshToken>> {
        let now = OffsetDateTime::now_utc();
        let mut tables = self.tables.lock().await;

        let rotatable = tables
            .active
            .get(token_hash)
            .is_some_and(|t| t.client_id == client_id && !t.is_expired_at(now));
        if !rotatable {
            return Ok(None);
        }

        let Some(mut predecessor) = tables.archive(token_hash, now) else {
            return Ok(None);
        };
        predecessor.replaced_by = Some(replacement.id);
        tables
            .history
            .insert(predecessor.token_hash.clone(), predecessor.clone());

        tables
            .hashes
            .insert(replacement.id, replacement.token_hash.clone());
        tables
            .active
            .insert(replacement.token_hash.clone(), replacement.clone());

        Ok(Some(predecessor))
    }

    async fn revoke_chain(&self, from: Uuid) -> AuthResult<u64> {
        let now = OffsetDateTime::now_utc();
        let mut tables = self.tables.lock().await;

        let mut seen = HashSet::new();
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            if !seen.insert(id) {
                debug!(token_id = %id, "Refresh token chain loops; stopping");
                break;
            }
            let Some((hash, live, next)) = tables
                .by_id(id)
                .map(|row| (row.token_hash.clone(), row.revoked_at.is_none(), row.replaced_by))
            else {
                break;
            };
            if live && tables.archive(&hash, now).is_some() {
                debug!(token_id = %id, "Revoked live refresh token in chain");
                return Ok(1);
            }
            cursor = next;
        }
        Ok(0)
    }
}

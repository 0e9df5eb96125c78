//! In-memory storage backend for tollgate-auth.
//!
//! Provides process-local storage for:
//!
//! - OAuth clients (a read-only directory seeded at startup)
//! - Client to end-user bindings
//! - One-time authorization codes
//! - Refresh tokens and their rotation chains
//!
//! Active and historical rows are kept in separate tables, and every
//! consuming operation is a single atomic step.
//!
//! # Example
//!
//! ```ignore
//! use tollgate_auth_memory::MemoryAuthStorage;
//!
//! let storage = MemoryAuthStorage::new();
//! storage.clients().insert(client)?;
//!
//! let client = storage.clients().find_by_client_id("my-app").await?;
//! ```

pub mod authorization_code;
pub mod client;
pub mod client_user;
pub mod refresh_token;

use std::sync::Arc;

pub use authorization_code::MemoryAuthorizationCodeStorage;
pub use client::MemoryClientStorage;
pub use client_user::MemoryClientUserStorage;
pub use refresh_token::MemoryRefreshTokenStorage;

/// All in-memory auth stores behind shared handles.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuthStorage {
    clients: Arc<MemoryClientStorage>,
    client_users: Arc<MemoryClientUserStorage>,
    authorization_codes: Arc<MemoryAuthorizationCodeStorage>,
    refresh_tokens: Arc<MemoryRefreshTokenStorage>,
}

impl MemoryAuthStorage {
    /// Creates empty stores.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn clients(&self) -> Arc<MemoryClientStorage> {
        self.clients.clone()
    }

    #[must_use]
    pub fn client_users(&self) -> Arc<MemoryClientUserStorage> {
        self.client_users.clone()
    }

    #[must_use]
    pub fn authorization_codes(&self) -> Arc<MemoryAuthorizationCodeStorage> {
        self.authorization_codes.clone()
    }

    #[must_use]
    pub fn refresh_tokens(&self) -> Arc<MemoryRefreshTokenStorage> {
        self.refresh_tokens.clone()
    }
}

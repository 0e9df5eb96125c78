//! Storage traits for authorization data.
//!
//! This module defines storage interfaces for:
//!
//! - OAuth client registrations (read-only directory)
//! - Client to end-user bindings
//! - One-time authorization codes
//! - Refresh tokens and their rotation chains
//!
//! # Implementations
//!
//! Storage implementations are provided in separate crates:
//!
//! - `tollgate-auth-memory` - In-memory storage backend

pub mod authorization_code;
pub mod client;
pub mod client_user;
pub mod refresh_token;

pub use authorization_code::AuthorizationCodeStorage;
pub use client::ClientStorage;
pub use client_user::ClientUserStorage;
pub use refresh_token::RefreshTokenStorage;

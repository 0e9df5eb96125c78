//! Tollgate authorization server.
//!
//! Loads configuration, seeds the client directory, and serves the OAuth
//! endpoints over the in-memory storage backend.

pub mod config;
pub mod observability;
pub mod server;

pub use config::AppConfig;
pub use server::{ServerError, TollgateServer, build_app, build_app_with_storage};

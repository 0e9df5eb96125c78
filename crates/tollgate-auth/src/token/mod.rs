//! Token generation and refresh token management.
//!
//! - [`jwt`] - Access token signing and verification
//! - [`issuer`] - Token payload assembly for the token endpoint
//! - [`rotation`] - Refresh token creation, rotation, and reuse handling

pub mod issuer;
pub mod jwt;
pub mod rotation;

pub use issuer::TokenIssuer;
pub use jwt::{AccessTokenClaims, JwtError, JwtService, SigningAlgorithm};
pub use rotation::{IssuedRefreshToken, RefreshTokenRotator};

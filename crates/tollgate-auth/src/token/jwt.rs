//! JWT encoding and decoding for access tokens.
//!
//! Access tokens are HMAC-signed JWTs. Issuer and audience come from the
//! client registration, so one signing key serves every client.
//!
//! # Example
//!
//! ```ignore
//! use tollgate_auth::token::jwt::{JwtService, SigningAlgorithm};
//!
//! let jwt_service = JwtService::new(b"a-long-random-hmac-secret-of-32-bytes", SigningAlgorithm::HS256);
//! let token = jwt_service.encode(&claims)?;
//! let claims = jwt_service.decode(&token, "https://auth.example.com", "https://api.example.com")?;
//! ```

use std::fmt;
use std::str::FromStr;

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AuthError;

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode the JWT.
    #[error("JWT encoding failed: {0}")]
    EncodingError(String),

    /// Failed to decode the JWT.
    #[error("JWT decoding failed: {0}")]
    DecodingError(String),

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The issuer or audience did not match.
    #[error("Invalid claims: {0}")]
    InvalidClaims(String),

    /// The signing algorithm name is not supported.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidIssuer => Self::InvalidClaims("issuer mismatch".to_string()),
            ErrorKind::InvalidAudience => Self::InvalidClaims("audience mismatch".to_string()),
            _ => Self::DecodingError(err.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        AuthError::internal(err.to_string())
    }
}

/// Supported HMAC signing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256.
    HS256,
    /// HMAC with SHA-384.
    HS384,
    /// HMAC with SHA-512.
    HS512,
}

impl SigningAlgorithm {
    /// Converts to the jsonwebtoken algorithm.
    #[must_use]
    pub fn to_jwt_algorithm(self) -> Algorithm {
        match self {
            Self::HS256 => Algorithm::HS256,
            Self::HS384 => Algorithm::HS384,
            Self::HS512 => Algorithm::HS512,
        }
    }

    /// Returns the algorithm name as used in JWT headers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
        }
    }
}

impl FromStr for SigningAlgorithm {
    type Err = JwtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(Self::HS256),
            "HS384" => Ok(Self::HS384),
            "HS512" => Ok(Self::HS512),
            other => Err(JwtError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessTokenClaims {
    /// Issuer, from the client registration.
    pub iss: String,

    /// Subject: the end user, or the client for client credentials.
    pub sub: String,

    /// Audience, from the client registration.
    pub aud: String,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at time (Unix timestamp).
    pub iat: i64,

    /// Unique token identifier.
    pub jti: String,

    /// Client the token was issued to.
    pub client_id: String,

    /// State echoed from the token request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Additional claims supplied by the caller.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccessTokenClaims {
    /// Registered claim names that extra claims may not override.
    pub const RESERVED: &'static [&'static str] = &[
        "iss", "sub", "aud", "exp", "iat", "nbf", "jti", "client_id", "state",
    ];
}

/// Signs and verifies access tokens with a shared HMAC secret.
pub struct JwtService {
    algorithm: SigningAlgorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Creates a service for the given secret and algorithm.
    #[must_use]
    pub fn new(secret: &[u8], algorithm: SigningAlgorithm) -> Self {
        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Returns the signing algorithm.
    #[must_use]
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// Encodes and signs the claims.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or signing fails.
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm.to_jwt_algorithm());
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Decodes and verifies an access token for the expected issuer and audience.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature, expiry, issuer, or audience check fails.
    pub fn decode(
        &self,
        token: &str,
        issuer: &str,
        audience: &str,
    ) -> Result<AccessTokenClaims, JwtError> {
        let mut validation = Validation::new(self.algorithm.to_jwt_algorithm());
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}
